//! Format detection.
//!
//! Detection looks only at the leading bytes of the stream. File names and
//! extensions never participate, so a PNG renamed to `picture.tga` still
//! opens as a PNG.

use std::fmt;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

use aimg_core::{Error, PixelFormat, Result};

use crate::registry;

/// Longest prefix any codec needs to recognize its own data. The TGA
/// heuristic inspects the full 18-byte header; signature formats need less.
pub(crate) const DETECT_PREFIX_LEN: usize = 18;

/// File formats the engine can read and write.
///
/// Every variant exists regardless of enabled features; operations on a
/// format whose codec was compiled out fail with
/// [`Error::UnsupportedFiletype`](aimg_core::Error::UnsupportedFiletype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// OpenEXR scanline images (half and single-precision float).
    Exr,
    /// Portable Network Graphics (8- and 16-bit integer).
    Png,
    /// Truevision TGA (8-bit integer).
    Tga,
}

impl FileFormat {
    /// Short lowercase format name, as used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Exr => "exr",
            FileFormat::Png => "png",
            FileFormat::Tga => "tga",
        }
    }

    /// Conventional file extensions, primary first.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileFormat::Exr => &["exr"],
            FileFormat::Png => &["png"],
            FileFormat::Tga => &["tga", "tpic"],
        }
    }

    /// Whether the format can store `format` without conversion.
    ///
    /// Returns `false` when the codec is compiled out.
    pub fn supports(&self, format: PixelFormat) -> bool {
        registry::codec_for(*self).is_some_and(|c| (c.supports)(format))
    }

    /// The pixel format the container would actually store when asked to
    /// encode `format`, or `None` when the codec is compiled out.
    pub fn storage_format(&self, format: PixelFormat) -> Option<PixelFormat> {
        registry::codec_for(*self).map(|c| (c.storage_format)(format))
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detects the image format at the reader's current position.
///
/// Reads at most [`DETECT_PREFIX_LEN`] bytes, then seeks back so the caller
/// sees an untouched stream. An empty stream is reported as
/// [`Error::EmptyInput`]; data that matches no codec as
/// [`Error::UnsupportedFiletype`].
pub fn detect<R: Read + Seek>(reader: &mut R) -> Result<FileFormat> {
    let start = reader.stream_position()?;
    let mut prefix = [0u8; DETECT_PREFIX_LEN];
    let mut filled = 0;
    while filled < DETECT_PREFIX_LEN {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    reader.seek(SeekFrom::Start(start))?;

    if filled == 0 {
        return Err(Error::EmptyInput);
    }
    registry::detect_bytes(&prefix[..filled]).ok_or(Error::UnsupportedFiletype)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_stream_is_reported_as_empty() {
        let err = detect(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(err.is_empty_input());
    }

    #[test]
    fn unrecognized_bytes_are_unsupported() {
        let mut data = Cursor::new(b"#!/bin/sh\nexit 1\n".to_vec());
        let err = detect(&mut data).unwrap_err();
        assert!(err.is_unsupported_filetype());
        // A single byte is enough to rule out "empty".
        let err = detect(&mut Cursor::new(vec![0xFFu8])).unwrap_err();
        assert!(err.is_unsupported_filetype());
    }

    #[cfg(feature = "exr")]
    #[test]
    fn exr_magic_is_detected() {
        let mut data = Cursor::new(vec![0x76, 0x2f, 0x31, 0x01, 0x02, 0x00, 0x00, 0x00]);
        assert_eq!(detect(&mut data).unwrap(), FileFormat::Exr);
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_signature_is_detected() {
        let mut data = Cursor::new(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        assert_eq!(detect(&mut data).unwrap(), FileFormat::Png);
    }

    #[cfg(feature = "tga")]
    #[test]
    fn plausible_tga_header_is_detected() {
        // Uncompressed truecolor, 2x2, 24-bit.
        let header = [
            0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0, 2, 0, 24, 0,
        ];
        assert_eq!(detect(&mut Cursor::new(header.to_vec())).unwrap(), FileFormat::Tga);
        // One byte short of a full header cannot be TGA.
        let err = detect(&mut Cursor::new(header[..17].to_vec())).unwrap_err();
        assert!(err.is_unsupported_filetype());
    }

    #[test]
    fn stream_position_is_restored() {
        let mut data = Cursor::new(vec![0u8; 64]);
        data.set_position(5);
        let _ = detect(&mut data);
        assert_eq!(data.position(), 5);
    }

    #[test]
    fn format_names_and_extensions_are_stable() {
        assert_eq!(FileFormat::Exr.name(), "exr");
        assert_eq!(FileFormat::Png.to_string(), "png");
        assert_eq!(FileFormat::Tga.extensions(), &["tga", "tpic"]);
    }
}
