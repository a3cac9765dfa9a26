//! Pixel format matrix.
//!
//! This module provides the canonical definitions for decoded pixel data:
//! the sample (element) type and the combined channel-layout × sample-type
//! pixel format grid.
//!
//! # Types
//!
//! - [`SampleType`] - Numeric element type of a single channel sample
//! - [`PixelFormat`] - Full decoded format (channel count + sample type)
//!
//! # Usage
//!
//! ```rust
//! use aimg_core::format::{PixelFormat, SampleType};
//!
//! let fmt = PixelFormat::Rgb32F;
//! assert_eq!(fmt.channels(), 3);
//! assert_eq!(fmt.sample_type(), SampleType::F32);
//! assert_eq!(fmt.bytes_per_pixel(), 12);
//!
//! // Compose a format from its parts
//! let rgba = PixelFormat::from_parts(4, SampleType::U8).unwrap();
//! assert_eq!(rgba, PixelFormat::Rgba8U);
//! ```

use std::fmt;

/// Numeric element type of one channel sample.
///
/// `U*` types are unsigned normalised: 0 maps to 0.0 and the maximum value
/// maps to 1.0. `F*` types are IEEE floats stored as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// 8-bit unsigned normalised integer.
    U8,
    /// 16-bit unsigned normalised integer.
    U16,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit single-precision float.
    F32,
}

impl SampleType {
    /// Number of bytes per sample.
    #[inline]
    pub const fn bytes(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::F32 => 4,
        }
    }

    /// Number of bits per sample.
    #[inline]
    pub const fn bits(&self) -> u32 {
        (self.bytes() as u32) * 8
    }

    /// Whether this is a floating-point type.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Short name, e.g. `"8U"` or `"32F"`.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "8U",
            Self::U16 => "16U",
            Self::F16 => "16F",
            Self::F32 => "32F",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded in-memory pixel format.
///
/// The full grid of channel layouts (`R`, `RG`, `RGB`, `RGBA`) against
/// sample types (`8U`, `16U`, `16F`, `32F`). Distinct from a container
/// format: one container may natively carry several of these depending on
/// its own header (e.g. PNG bit depth and color type).
///
/// Channel semantics by layout: 1 channel is luminance; 2 channels are
/// luminance + alpha; 3 are R, G, B; 4 are R, G, B, A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 1 channel, 8-bit unsigned.
    R8U,
    /// 2 channels, 8-bit unsigned.
    Rg8U,
    /// 3 channels, 8-bit unsigned.
    Rgb8U,
    /// 4 channels, 8-bit unsigned.
    Rgba8U,
    /// 1 channel, 16-bit unsigned.
    R16U,
    /// 2 channels, 16-bit unsigned.
    Rg16U,
    /// 3 channels, 16-bit unsigned.
    Rgb16U,
    /// 4 channels, 16-bit unsigned.
    Rgba16U,
    /// 1 channel, 16-bit float.
    R16F,
    /// 2 channels, 16-bit float.
    Rg16F,
    /// 3 channels, 16-bit float.
    Rgb16F,
    /// 4 channels, 16-bit float.
    Rgba16F,
    /// 1 channel, 32-bit float.
    R32F,
    /// 2 channels, 32-bit float.
    Rg32F,
    /// 3 channels, 32-bit float.
    Rgb32F,
    /// 4 channels, 32-bit float.
    Rgba32F,
}

impl PixelFormat {
    /// Every format in the grid, layout-major.
    pub const ALL: [PixelFormat; 16] = [
        Self::R8U,
        Self::Rg8U,
        Self::Rgb8U,
        Self::Rgba8U,
        Self::R16U,
        Self::Rg16U,
        Self::Rgb16U,
        Self::Rgba16U,
        Self::R16F,
        Self::Rg16F,
        Self::Rgb16F,
        Self::Rgba16F,
        Self::R32F,
        Self::Rg32F,
        Self::Rgb32F,
        Self::Rgba32F,
    ];

    /// Composes a format from a channel count (1-4) and sample type.
    ///
    /// Returns `None` for channel counts outside 1-4; every count inside
    /// that range exists at every sample type.
    #[inline]
    pub const fn from_parts(channels: usize, sample: SampleType) -> Option<Self> {
        let fmt = match (channels, sample) {
            (1, SampleType::U8) => Self::R8U,
            (2, SampleType::U8) => Self::Rg8U,
            (3, SampleType::U8) => Self::Rgb8U,
            (4, SampleType::U8) => Self::Rgba8U,
            (1, SampleType::U16) => Self::R16U,
            (2, SampleType::U16) => Self::Rg16U,
            (3, SampleType::U16) => Self::Rgb16U,
            (4, SampleType::U16) => Self::Rgba16U,
            (1, SampleType::F16) => Self::R16F,
            (2, SampleType::F16) => Self::Rg16F,
            (3, SampleType::F16) => Self::Rgb16F,
            (4, SampleType::F16) => Self::Rgba16F,
            (1, SampleType::F32) => Self::R32F,
            (2, SampleType::F32) => Self::Rg32F,
            (3, SampleType::F32) => Self::Rgb32F,
            (4, SampleType::F32) => Self::Rgba32F,
            _ => return None,
        };
        Some(fmt)
    }

    /// Number of channels (1-4).
    #[inline]
    pub const fn channels(&self) -> usize {
        match self {
            Self::R8U | Self::R16U | Self::R16F | Self::R32F => 1,
            Self::Rg8U | Self::Rg16U | Self::Rg16F | Self::Rg32F => 2,
            Self::Rgb8U | Self::Rgb16U | Self::Rgb16F | Self::Rgb32F => 3,
            Self::Rgba8U | Self::Rgba16U | Self::Rgba16F | Self::Rgba32F => 4,
        }
    }

    /// Sample type of each channel.
    #[inline]
    pub const fn sample_type(&self) -> SampleType {
        match self {
            Self::R8U | Self::Rg8U | Self::Rgb8U | Self::Rgba8U => SampleType::U8,
            Self::R16U | Self::Rg16U | Self::Rgb16U | Self::Rgba16U => SampleType::U16,
            Self::R16F | Self::Rg16F | Self::Rgb16F | Self::Rgba16F => SampleType::F16,
            Self::R32F | Self::Rg32F | Self::Rgb32F | Self::Rgba32F => SampleType::F32,
        }
    }

    /// Bytes per channel sample.
    #[inline]
    pub const fn bytes_per_channel(&self) -> usize {
        self.sample_type().bytes()
    }

    /// Bytes per whole pixel.
    #[inline]
    pub const fn bytes_per_pixel(&self) -> usize {
        self.channels() * self.bytes_per_channel()
    }

    /// Whether the sample type is floating point.
    #[inline]
    pub const fn is_float(&self) -> bool {
        self.sample_type().is_float()
    }

    /// Whether the layout carries an alpha channel (2 or 4 channels).
    #[inline]
    pub const fn has_alpha(&self) -> bool {
        matches!(self.channels(), 2 | 4)
    }

    /// Same channel layout with a different sample type.
    #[inline]
    pub const fn with_sample_type(self, sample: SampleType) -> Self {
        match Self::from_parts(self.channels(), sample) {
            Some(fmt) => fmt,
            // channels() is always 1-4
            None => unreachable!(),
        }
    }

    /// Same sample type with a different channel count (1-4).
    #[inline]
    pub const fn with_channels(self, channels: usize) -> Option<Self> {
        Self::from_parts(channels, self.sample_type())
    }

    /// Canonical name, e.g. `"RGBA8U"` or `"RGB32F"`.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::R8U => "R8U",
            Self::Rg8U => "RG8U",
            Self::Rgb8U => "RGB8U",
            Self::Rgba8U => "RGBA8U",
            Self::R16U => "R16U",
            Self::Rg16U => "RG16U",
            Self::Rgb16U => "RGB16U",
            Self::Rgba16U => "RGBA16U",
            Self::R16F => "R16F",
            Self::Rg16F => "RG16F",
            Self::Rgb16F => "RGB16F",
            Self::Rgba16F => "RGBA16F",
            Self::R32F => "R32F",
            Self::Rg32F => "RG32F",
            Self::Rgb32F => "RGB32F",
            Self::Rgba32F => "RGBA32F",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_is_complete() {
        for channels in 1..=4 {
            for sample in [SampleType::U8, SampleType::U16, SampleType::F16, SampleType::F32] {
                let fmt = PixelFormat::from_parts(channels, sample).unwrap();
                assert_eq!(fmt.channels(), channels);
                assert_eq!(fmt.sample_type(), sample);
            }
        }
        assert!(PixelFormat::from_parts(0, SampleType::U8).is_none());
        assert!(PixelFormat::from_parts(5, SampleType::F32).is_none());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(PixelFormat::R8U.bytes_per_pixel(), 1);
        assert_eq!(PixelFormat::Rgba8U.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::Rgb16U.bytes_per_pixel(), 6);
        assert_eq!(PixelFormat::Rgba16F.bytes_per_pixel(), 8);
        assert_eq!(PixelFormat::Rgb32F.bytes_per_pixel(), 12);
        assert_eq!(SampleType::F16.bits(), 16);
    }

    #[test]
    fn test_with_sample_type_keeps_layout() {
        assert_eq!(
            PixelFormat::Rgba8U.with_sample_type(SampleType::F32),
            PixelFormat::Rgba32F
        );
        assert_eq!(
            PixelFormat::R32F.with_sample_type(SampleType::U8),
            PixelFormat::R8U
        );
    }

    #[test]
    fn test_names_round_trip_through_display() {
        for fmt in PixelFormat::ALL {
            assert_eq!(format!("{fmt}"), fmt.name());
        }
        assert_eq!(PixelFormat::Rg16F.name(), "RG16F");
    }

    #[test]
    fn test_alpha_layouts() {
        assert!(PixelFormat::Rgba8U.has_alpha());
        assert!(PixelFormat::Rg32F.has_alpha());
        assert!(!PixelFormat::Rgb16U.has_alpha());
        assert!(!PixelFormat::R16F.has_alpha());
    }
}
