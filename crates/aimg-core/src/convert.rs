//! Pixel format coercion.
//!
//! Converts a decoded [`PixelBuffer`] to a caller-requested [`PixelFormat`]
//! by dropping/adding channels and/or changing the numeric representation.
//!
//! # Policy
//!
//! Channel changes are purely positional - never a blend, never synthesized
//! from other channels:
//!
//! - Dropping keeps the first `target.channels()` channels verbatim. In
//!   particular, dropping an alpha channel copies the retained channel
//!   bytes unchanged regardless of the alpha value.
//! - Adding copies source channels positionally, fills missing color
//!   channels with zero, and fills a missing alpha slot (second of 2,
//!   fourth of 4) with the opaque value (255 / 65535 / 1.0).
//!
//! Numeric representation changes go through normalised `f32`: unsigned
//! samples map 0 to 0.0 and their maximum to 1.0; float samples pass
//! through numerically. Float-to-unsigned clamps to [0, 1] and rounds.
//!
//! # Example
//!
//! ```rust
//! use aimg_core::{convert, PixelBuffer, PixelFormat, Samples};
//!
//! let rgba = PixelBuffer::new(
//!     1,
//!     1,
//!     PixelFormat::Rgba8U,
//!     Samples::U8(vec![10, 20, 30, 0]),
//! )
//! .unwrap();
//!
//! // Alpha drop keeps the color bytes even where alpha is zero.
//! let rgb = convert(&rgba, PixelFormat::Rgb8U).unwrap();
//! assert_eq!(rgb.as_u8().unwrap(), &[10, 20, 30]);
//! ```

use crate::buffer::{PixelBuffer, Samples};
use crate::error::Result;
use crate::format::{PixelFormat, SampleType};
use half::f16;

/// Converts a buffer to the target pixel format.
///
/// Converting to the buffer's own format returns a clone. See the module
/// docs for the channel and numeric policies.
///
/// # Errors
///
/// Every conversion inside the sixteen-format grid is implemented;
/// [`crate::Error::UnsupportedCoercion`] is reserved for conversions a
/// future format may request but the layer does not provide.
pub fn convert(src: &PixelBuffer, target: PixelFormat) -> Result<PixelBuffer> {
    if src.format() == target {
        return Ok(src.clone());
    }

    let pixels = src.width() as usize * src.height() as usize;
    let src_ch = src.channels();
    let dst_ch = target.channels();

    let samples = if src.sample_type() == target.sample_type() {
        // Same element type: pure positional selection, bytes untouched.
        match src.samples() {
            Samples::U8(v) => Samples::U8(select(v, pixels, src_ch, dst_ch, 0, u8::MAX)),
            Samples::U16(v) => Samples::U16(select(v, pixels, src_ch, dst_ch, 0, u16::MAX)),
            Samples::F16(v) => Samples::F16(select(
                v,
                pixels,
                src_ch,
                dst_ch,
                f16::from_f32(0.0),
                f16::from_f32(1.0),
            )),
            Samples::F32(v) => Samples::F32(select(v, pixels, src_ch, dst_ch, 0.0, 1.0)),
        }
    } else {
        let normalised = to_f32(src.samples());
        let selected = select(&normalised, pixels, src_ch, dst_ch, 0.0, 1.0);
        from_f32(&selected, target.sample_type())
    };

    PixelBuffer::new(src.width(), src.height(), target, samples)
}

/// Positional channel copy with zero/opaque fill.
fn select<T: Copy>(
    src: &[T],
    pixels: usize,
    src_ch: usize,
    dst_ch: usize,
    zero: T,
    opaque: T,
) -> Vec<T> {
    if src_ch == dst_ch {
        return src.to_vec();
    }
    let mut out = Vec::with_capacity(pixels * dst_ch);
    for px in 0..pixels {
        let base = px * src_ch;
        for c in 0..dst_ch {
            let v = if c < src_ch {
                src[base + c]
            } else if is_alpha_slot(c, dst_ch) {
                opaque
            } else {
                zero
            };
            out.push(v);
        }
    }
    out
}

#[inline]
fn is_alpha_slot(channel: usize, channels: usize) -> bool {
    (channels == 2 && channel == 1) || (channels == 4 && channel == 3)
}

/// Normalises any sample storage to `f32`.
fn to_f32(samples: &Samples) -> Vec<f32> {
    match samples {
        Samples::U8(v) => v.iter().map(|&s| s as f32 / u8::MAX as f32).collect(),
        Samples::U16(v) => v.iter().map(|&s| s as f32 / u16::MAX as f32).collect(),
        Samples::F16(v) => v.iter().map(|s| s.to_f32()).collect(),
        Samples::F32(v) => v.clone(),
    }
}

/// Denormalises `f32` values into the target sample type.
fn from_f32(values: &[f32], target: SampleType) -> Samples {
    match target {
        SampleType::U8 => Samples::U8(
            values
                .iter()
                .map(|&v| (v.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8)
                .collect(),
        ),
        SampleType::U16 => Samples::U16(
            values
                .iter()
                .map(|&v| (v.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16)
                .collect(),
        ),
        SampleType::F16 => Samples::F16(values.iter().map(|&v| f16::from_f32(v)).collect()),
        SampleType::F32 => Samples::F32(values.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rgba8(samples: Vec<u8>) -> PixelBuffer {
        let pixels = samples.len() as u32 / 4;
        PixelBuffer::new(pixels, 1, PixelFormat::Rgba8U, Samples::U8(samples)).unwrap()
    }

    #[test]
    fn test_alpha_drop_is_byte_identical() {
        // Alpha values 255, 128 and 0: the retained bytes never change.
        let src = rgba8(vec![1, 2, 3, 255, 4, 5, 6, 128, 7, 8, 9, 0]);
        let rgb = convert(&src, PixelFormat::Rgb8U).unwrap();
        assert_eq!(rgb.format(), PixelFormat::Rgb8U);
        assert_eq!(rgb.as_u8().unwrap(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_identity_returns_clone() {
        let src = rgba8(vec![9, 8, 7, 6]);
        let out = convert(&src, PixelFormat::Rgba8U).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_added_alpha_is_opaque() {
        let src = PixelBuffer::new(
            2,
            1,
            PixelFormat::Rgb8U,
            Samples::U8(vec![10, 20, 30, 40, 50, 60]),
        )
        .unwrap();
        let rgba = convert(&src, PixelFormat::Rgba8U).unwrap();
        assert_eq!(rgba.as_u8().unwrap(), &[10, 20, 30, 255, 40, 50, 60, 255]);

        let rg = convert(
            &PixelBuffer::new(1, 1, PixelFormat::R16U, Samples::U16(vec![77])).unwrap(),
            PixelFormat::Rg16U,
        )
        .unwrap();
        assert_eq!(rg.as_u16().unwrap(), &[77, u16::MAX]);
    }

    #[test]
    fn test_missing_color_channels_fill_zero() {
        let src = PixelBuffer::new(1, 1, PixelFormat::R8U, Samples::U8(vec![200])).unwrap();
        let rgb = convert(&src, PixelFormat::Rgb8U).unwrap();
        assert_eq!(rgb.as_u8().unwrap(), &[200, 0, 0]);
    }

    #[test]
    fn test_normalisation_endpoints() {
        let src = PixelBuffer::new(
            3,
            1,
            PixelFormat::R8U,
            Samples::U8(vec![0, 128, 255]),
        )
        .unwrap();
        let out = convert(&src, PixelFormat::R32F).unwrap();
        let f = out.as_f32().unwrap();
        assert_eq!(f[0], 0.0);
        assert_abs_diff_eq!(f[1], 128.0 / 255.0, epsilon = 1e-7);
        assert_eq!(f[2], 1.0);
    }

    #[test]
    fn test_float_to_unsigned_clamps_and_rounds() {
        let src = PixelBuffer::new(
            4,
            1,
            PixelFormat::R32F,
            Samples::F32(vec![-0.5, 0.5, 1.0, 2.0]),
        )
        .unwrap();
        let out = convert(&src, PixelFormat::R8U).unwrap();
        assert_eq!(out.as_u8().unwrap(), &[0, 128, 255, 255]);
    }

    #[test]
    fn test_u8_to_u16_endpoints_are_exact() {
        let src = PixelBuffer::new(2, 1, PixelFormat::R8U, Samples::U8(vec![0, 255])).unwrap();
        let out = convert(&src, PixelFormat::R16U).unwrap();
        assert_eq!(out.as_u16().unwrap(), &[0, u16::MAX]);
    }

    #[test]
    fn test_round_trip_through_f32_is_identity_for_u8() {
        let values: Vec<u8> = (0..=255).collect();
        let src =
            PixelBuffer::new(256, 1, PixelFormat::R8U, Samples::U8(values.clone())).unwrap();
        let wide = convert(&src, PixelFormat::R32F).unwrap();
        let back = convert(&wide, PixelFormat::R8U).unwrap();
        assert_eq!(back.as_u8().unwrap(), values.as_slice());
    }

    #[test]
    fn test_f16_precision_loss_is_bounded() {
        let src = PixelBuffer::new(
            2,
            1,
            PixelFormat::R32F,
            Samples::F32(vec![0.1234567, 0.9999]),
        )
        .unwrap();
        let half = convert(&src, PixelFormat::R16F).unwrap();
        let back = convert(&half, PixelFormat::R32F).unwrap();
        let f = back.as_f32().unwrap();
        assert_abs_diff_eq!(f[0], 0.1234567, epsilon = 1e-3);
        assert_abs_diff_eq!(f[1], 0.9999, epsilon = 1e-3);
    }

    #[test]
    fn test_layout_and_type_change_together() {
        let src = PixelBuffer::new(
            1,
            1,
            PixelFormat::Rgba8U,
            Samples::U8(vec![255, 0, 128, 9]),
        )
        .unwrap();
        let out = convert(&src, PixelFormat::Rgb32F).unwrap();
        let f = out.as_f32().unwrap();
        assert_eq!(f.len(), 3);
        assert_eq!(f[0], 1.0);
        assert_eq!(f[1], 0.0);
        assert_abs_diff_eq!(f[2], 128.0 / 255.0, epsilon = 1e-7);
    }
}
