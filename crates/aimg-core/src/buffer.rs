//! Canonical decoded pixel buffer.
//!
//! Every codec decodes into, and encodes from, the same in-memory shape:
//! a row-major, top-left-origin block of samples addressed
//! `[row][column][channel]`, stored flat in a typed vector.
//!
//! # Overview
//!
//! - [`Samples`] - Tagged union over the element vectors (`u8`, `u16`,
//!   [`f16`], `f32`)
//! - [`PixelBuffer`] - Dimensions + [`PixelFormat`] + samples, validated on
//!   construction
//!
//! A buffer is immutable once produced; format coercion builds a fresh
//! buffer rather than mutating in place.
//!
//! # Usage
//!
//! ```rust
//! use aimg_core::{PixelBuffer, PixelFormat, Samples};
//!
//! let buf = PixelBuffer::new(2, 2, PixelFormat::Rgb8U, Samples::U8(vec![0; 12])).unwrap();
//! assert_eq!(buf.channels(), 3);
//! assert_eq!(buf.samples().len(), 12);
//! ```

use crate::error::{Error, Result};
use crate::format::{PixelFormat, SampleType};
use half::f16;

/// Flat sample storage, tagged by element type.
///
/// Keeping the element type explicit (rather than erasing everything to
/// bytes) is what makes float round-trip bit-exactness checkable.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// 8-bit unsigned normalised samples.
    U8(Vec<u8>),
    /// 16-bit unsigned normalised samples.
    U16(Vec<u16>),
    /// Half-precision float samples.
    F16(Vec<f16>),
    /// Single-precision float samples.
    F32(Vec<f32>),
}

impl Samples {
    /// Element type of this storage.
    #[inline]
    pub fn sample_type(&self) -> SampleType {
        match self {
            Self::U8(_) => SampleType::U8,
            Self::U16(_) => SampleType::U16,
            Self::F16(_) => SampleType::F16,
            Self::F32(_) => SampleType::F32,
        }
    }

    /// Number of samples (not bytes).
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::F16(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    /// Whether the storage holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the samples as `u8`, if that is the element type.
    #[inline]
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            Self::U8(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the samples as `u16`, if that is the element type.
    #[inline]
    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            Self::U16(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the samples as [`f16`], if that is the element type.
    #[inline]
    pub fn as_f16(&self) -> Option<&[f16]> {
        match self {
            Self::F16(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the samples as `f32`, if that is the element type.
    #[inline]
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }
}

/// A decoded image: dimensions, pixel format and sample storage.
///
/// # Invariants
///
/// Enforced by [`PixelBuffer::new`], so every constructed buffer is valid:
///
/// - `width > 0` and `height > 0`
/// - the [`Samples`] element type equals `format.sample_type()`
/// - `samples.len() == width * height * format.channels()`
///
/// Rows are stored top to bottom, pixels left to right, channels
/// interleaved. Codecs with other native orders (bottom-up TGA, planar EXR
/// scanlines) reorder during decode/encode.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    samples: Samples,
}

impl PixelBuffer {
    /// Creates a buffer, validating shape and sample type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] if a dimension is zero, the sample count
    /// does not match `width * height * channels`, the element type does
    /// not match the format, or the total size overflows `usize`.
    pub fn new(width: u32, height: u32, format: PixelFormat, samples: Samples) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::shape(width, height, "zero dimension"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.channels()))
            .ok_or_else(|| Error::shape(width, height, "sample count overflows usize"))?;
        if samples.sample_type() != format.sample_type() {
            return Err(Error::shape(
                width,
                height,
                format!(
                    "sample storage is {} but format {} needs {}",
                    samples.sample_type(),
                    format,
                    format.sample_type()
                ),
            ));
        }
        if samples.len() != expected {
            return Err(Error::shape(
                width,
                height,
                format!("expected {} samples for {}, got {}", expected, format, samples.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            format,
            samples,
        })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format of the stored samples.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Channels per pixel (1-4).
    #[inline]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Element type of the stored samples.
    #[inline]
    pub fn sample_type(&self) -> SampleType {
        self.format.sample_type()
    }

    /// Borrows the sample storage.
    #[inline]
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Consumes the buffer, returning the sample storage.
    #[inline]
    pub fn into_samples(self) -> Samples {
        self.samples
    }

    /// Sample index of the first channel of pixel (x, y).
    ///
    /// Callers index `[row][column][channel]` as
    /// `samples[buf.sample_index(x, y) + c]`.
    #[inline]
    pub fn sample_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels()
    }

    /// Borrows the samples as `u8`, if that is the element type.
    #[inline]
    pub fn as_u8(&self) -> Option<&[u8]> {
        self.samples.as_u8()
    }

    /// Borrows the samples as `u16`, if that is the element type.
    #[inline]
    pub fn as_u16(&self) -> Option<&[u16]> {
        self.samples.as_u16()
    }

    /// Borrows the samples as [`f16`], if that is the element type.
    #[inline]
    pub fn as_f16(&self) -> Option<&[f16]> {
        self.samples.as_f16()
    }

    /// Borrows the samples as `f32`, if that is the element type.
    #[inline]
    pub fn as_f32(&self) -> Option<&[f32]> {
        self.samples.as_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_length() {
        let buf = PixelBuffer::new(4, 2, PixelFormat::Rgb8U, Samples::U8(vec![0; 24]));
        assert!(buf.is_ok());

        let err = PixelBuffer::new(4, 2, PixelFormat::Rgb8U, Samples::U8(vec![0; 23])).unwrap_err();
        assert!(err.to_string().contains("expected 24 samples"));
    }

    #[test]
    fn test_new_validates_sample_type() {
        let err =
            PixelBuffer::new(1, 1, PixelFormat::R32F, Samples::U8(vec![0])).unwrap_err();
        assert!(err.to_string().contains("R32F"));
    }

    #[test]
    fn test_new_rejects_zero_dimension() {
        let err = PixelBuffer::new(0, 3, PixelFormat::R8U, Samples::U8(vec![])).unwrap_err();
        assert!(err.to_string().contains("zero dimension"));
    }

    #[test]
    fn test_sample_index() {
        let buf = PixelBuffer::new(3, 2, PixelFormat::Rgba8U, Samples::U8(vec![0; 24])).unwrap();
        assert_eq!(buf.sample_index(0, 0), 0);
        assert_eq!(buf.sample_index(2, 0), 8);
        assert_eq!(buf.sample_index(0, 1), 12);
        assert_eq!(buf.sample_index(2, 1), 20);
    }

    #[test]
    fn test_float_samples_round_trip_bits() {
        let values = vec![0.0f32, -0.0, 1.5, f32::MIN_POSITIVE, 1.0e-40];
        let buf =
            PixelBuffer::new(5, 1, PixelFormat::R32F, Samples::F32(values.clone())).unwrap();
        let stored = buf.as_f32().unwrap();
        for (a, b) in values.iter().zip(stored) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
