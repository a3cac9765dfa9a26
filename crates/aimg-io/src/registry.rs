//! Codec registry.
//!
//! A static table of the compiled-in codecs, scanned linearly during
//! detection. Adding a format means adding one entry here; nothing else in
//! the crate dispatches on format names.

use std::sync::OnceLock;

use aimg_core::PixelFormat;

use crate::detect::FileFormat;

/// Dispatch entries for one codec.
///
/// Everything format-specific the facade needs is reachable through these
/// function pointers, so the registry stays a plain table.
pub(crate) struct Codec {
    pub(crate) format: FileFormat,
    pub(crate) name: &'static str,
    pub(crate) extensions: &'static [&'static str],
    /// Signature probe over the detection prefix.
    pub(crate) matches: fn(&[u8]) -> bool,
    /// Whether the container stores this pixel format as-is.
    pub(crate) supports: fn(PixelFormat) -> bool,
    /// What the container would store the pixel format as.
    pub(crate) storage_format: fn(PixelFormat) -> PixelFormat,
}

/// All compiled-in codecs in probe order.
///
/// Signature formats come first. TGA has no magic number, only a header
/// plausibility check, so it is probed last to keep it from shadowing
/// anything with a real signature.
pub(crate) fn codecs() -> &'static [Codec] {
    static TABLE: OnceLock<Vec<Codec>> = OnceLock::new();
    TABLE.get_or_init(|| {
        #[allow(unused_mut)]
        let mut table = Vec::new();

        #[cfg(feature = "exr")]
        table.push(Codec {
            format: FileFormat::Exr,
            name: crate::exr::NAME,
            extensions: crate::exr::EXTENSIONS,
            matches: crate::exr::matches,
            supports: crate::exr::supports,
            storage_format: crate::exr::storage_format,
        });

        #[cfg(feature = "png")]
        table.push(Codec {
            format: FileFormat::Png,
            name: crate::png::NAME,
            extensions: crate::png::EXTENSIONS,
            matches: crate::png::matches,
            supports: crate::png::supports,
            storage_format: crate::png::storage_format,
        });

        #[cfg(feature = "tga")]
        table.push(Codec {
            format: FileFormat::Tga,
            name: crate::tga::NAME,
            extensions: crate::tga::EXTENSIONS,
            matches: crate::tga::matches,
            supports: crate::tga::supports,
            storage_format: crate::tga::storage_format,
        });

        table
    })
}

/// Finds the first codec whose probe accepts `header`.
pub(crate) fn detect_bytes(header: &[u8]) -> Option<FileFormat> {
    codecs().iter().find(|c| (c.matches)(header)).map(|c| c.format)
}

/// Looks up the codec for `format`, if compiled in.
pub(crate) fn codec_for(format: FileFormat) -> Option<&'static Codec> {
    codecs().iter().find(|c| c.format == format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_one_entry_per_enabled_codec() {
        let mut expected = 0;
        if cfg!(feature = "exr") {
            expected += 1;
        }
        if cfg!(feature = "png") {
            expected += 1;
        }
        if cfg!(feature = "tga") {
            expected += 1;
        }
        assert_eq!(codecs().len(), expected);
    }

    #[cfg(feature = "tga")]
    #[test]
    fn tga_probe_runs_last() {
        let last = codecs().last().unwrap();
        assert_eq!(last.format, FileFormat::Tga);
    }

    #[test]
    fn codec_names_match_their_format() {
        for codec in codecs() {
            assert_eq!(codec.name, codec.format.name());
            assert_eq!(codec.extensions, codec.format.extensions());
        }
    }

    #[cfg(feature = "png")]
    #[test]
    fn lookup_by_format_finds_the_entry() {
        let codec = codec_for(FileFormat::Png).unwrap();
        assert_eq!(codec.name, "png");
        assert!((codec.matches)(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]));
    }

    #[cfg(all(feature = "exr", feature = "png"))]
    #[test]
    fn probes_do_not_overlap() {
        let exr_magic = [0x76, 0x2f, 0x31, 0x01];
        let hits: Vec<_> = codecs().iter().filter(|c| (c.matches)(&exr_magic)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].format, FileFormat::Exr);
    }
}
