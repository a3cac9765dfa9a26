//! Error types for AImg operations.
//!
//! This module provides the unified error taxonomy shared by the core types
//! and every codec in `aimg-io`.
//!
//! # Overview
//!
//! The [`Error`] enum covers all failure modes that can occur during:
//! - Format detection (empty streams, unrecognized signatures)
//! - Decoding (malformed or truncated containers)
//! - Encoding (unrepresentable buffer/options combinations)
//! - Pixel format coercion
//! - Buffer construction (shape/type mismatches)
//!
//! Each entry is a distinct, matchable condition; callers are expected to
//! surface them individually rather than collapse them into one generic
//! failure.
//!
//! # Usage
//!
//! ```rust
//! use aimg_core::{Error, Result};
//!
//! fn require_nonzero(width: u32, height: u32) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(Error::shape(width, height, "zero dimension"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation
//!
//! # Used By
//!
//! - [`crate::buffer::PixelBuffer`] - Construction validation
//! - [`crate::convert`] - Coercion failures
//! - `aimg-io` - Detection, decode and encode failures

use crate::format::PixelFormat;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
///
/// Convenience alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during image decoding, encoding and conversion.
///
/// This enum uses [`thiserror`] for automatic [`std::error::Error`] and
/// [`std::fmt::Display`] implementations.
///
/// # Categories
///
/// - **Detection errors**: [`EmptyInput`](Error::EmptyInput), [`UnsupportedFiletype`](Error::UnsupportedFiletype)
/// - **Codec errors**: [`Decode`](Error::Decode), [`Encode`](Error::Encode)
/// - **Conversion errors**: [`UnsupportedCoercion`](Error::UnsupportedCoercion)
/// - **Buffer errors**: [`Shape`](Error::Shape)
/// - **I/O errors**: [`Io`](Error::Io)
#[derive(Debug, Error)]
pub enum Error {
    /// The input stream produced no bytes.
    ///
    /// Returned by detection when a stream ends before a single signature
    /// byte could be read. Deliberately distinct from
    /// [`UnsupportedFiletype`](Error::UnsupportedFiletype): an empty source
    /// is not a wrong-format source.
    #[error("input stream is empty")]
    EmptyInput,

    /// Bytes were read but matched no registered format signature.
    ///
    /// Detection is signature-based only; a file with a misleading extension
    /// and valid content never produces this error, a file with a pleasing
    /// extension and foreign content always does.
    #[error("input does not match any supported image format")]
    UnsupportedFiletype,

    /// A recognized container is malformed or truncated past its signature.
    ///
    /// Carries the format name and the byte offset at which parsing failed,
    /// so corrupt files can be diagnosed without re-running the decoder.
    #[error("{format} decode failed at byte {offset}: {reason}")]
    Decode {
        /// Codec that reported the failure
        format: String,
        /// Byte offset from the start of the stream
        offset: u64,
        /// What was wrong
        reason: String,
    },

    /// The target format cannot represent the given buffer or options.
    ///
    /// Covers unrecognized per-format encode options as well as out-of-range
    /// option values. Options are never silently ignored.
    #[error("{format} encode failed: {reason}")]
    Encode {
        /// Codec that rejected the request
        format: String,
        /// What was wrong
        reason: String,
    },

    /// The requested pixel format conversion is not implemented.
    #[error("unsupported pixel format coercion: {from} -> {to}")]
    UnsupportedCoercion {
        /// Source pixel format
        from: PixelFormat,
        /// Requested pixel format
        to: PixelFormat,
    },

    /// Buffer dimensions and sample storage disagree.
    ///
    /// Returned when constructing a [`crate::buffer::PixelBuffer`] whose
    /// sample vector length or element type does not match
    /// `width * height * channels` for the declared pixel format.
    #[error("invalid buffer shape {width}x{height}: {reason}")]
    Shape {
        /// Declared width
        width: u32,
        /// Declared height
        height: u32,
        /// Reason the shape is invalid
        reason: String,
    },

    /// I/O error while reading or writing a stream.
    ///
    /// Wraps [`std::io::Error`]. A stream closed mid-operation surfaces
    /// here, never as silent truncation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an [`Error::Decode`] error.
    ///
    /// # Arguments
    ///
    /// * `format` - Codec name (e.g. `"png"`)
    /// * `offset` - Byte offset from the start of the stream
    /// * `reason` - Description of the malformation
    #[inline]
    pub fn decode(format: impl Into<String>, offset: u64, reason: impl Into<String>) -> Self {
        Self::Decode {
            format: format.into(),
            offset,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::Encode`] error.
    #[inline]
    pub fn encode(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::UnsupportedCoercion`] error.
    #[inline]
    pub fn unsupported_coercion(from: PixelFormat, to: PixelFormat) -> Self {
        Self::UnsupportedCoercion { from, to }
    }

    /// Creates an [`Error::Shape`] error.
    #[inline]
    pub fn shape(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::Shape {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is [`Error::EmptyInput`].
    #[inline]
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }

    /// Returns `true` if this is [`Error::UnsupportedFiletype`].
    #[inline]
    pub fn is_unsupported_filetype(&self) -> bool {
        matches!(self, Self::UnsupportedFiletype)
    }

    /// Returns `true` if this is a decode error.
    #[inline]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns `true` if this is an encode error.
    #[inline]
    pub fn is_encode_error(&self) -> bool {
        matches!(self, Self::Encode { .. })
    }

    /// Returns `true` if this is a coercion error.
    #[inline]
    pub fn is_coercion_error(&self) -> bool {
        matches!(self, Self::UnsupportedCoercion { .. })
    }

    /// Returns `true` if this is an I/O error.
    #[inline]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_context() {
        let err = Error::decode("png", 33, "bad chunk length");
        let msg = err.to_string();
        assert!(msg.contains("png"));
        assert!(msg.contains("33"));
        assert!(msg.contains("bad chunk length"));
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_encode_error_context() {
        let err = Error::encode("png", "compression level 12 out of range");
        assert!(err.to_string().contains("compression level 12"));
        assert!(err.is_encode_error());
    }

    #[test]
    fn test_coercion_error_names_formats() {
        let err = Error::unsupported_coercion(PixelFormat::Rgba8U, PixelFormat::Rgb32F);
        let msg = err.to_string();
        assert!(msg.contains("RGBA8U"));
        assert!(msg.contains("RGB32F"));
        assert!(err.is_coercion_error());
    }

    #[test]
    fn test_empty_vs_unsupported_are_distinct() {
        assert!(Error::EmptyInput.is_empty_input());
        assert!(!Error::EmptyInput.is_unsupported_filetype());
        assert!(Error::UnsupportedFiletype.is_unsupported_filetype());
        assert!(!Error::UnsupportedFiletype.is_empty_input());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "stream closed");
        let err: Error = io_err.into();
        assert!(err.is_io_error());
    }
}
