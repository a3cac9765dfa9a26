//! Shared zlib helpers for the PNG and EXR codecs.
//!
//! Compression goes through [`miniz_oxide`]; decompression through
//! [`zune_inflate`], which enforces an output size limit so a malformed
//! length field cannot balloon memory.

/// Compresses `data` into a zlib stream.
///
/// `level` follows zlib semantics: 0 stores uncompressed blocks, 9 is the
/// slowest/smallest. Values above 9 are clamped by the deflate backend.
pub(crate) fn deflate(data: &[u8], level: u8) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, level)
}

/// Inflates a zlib stream whose decompressed size is known exactly.
pub(crate) fn inflate_exact(data: &[u8], expected_size: usize) -> Result<Vec<u8>, &'static str> {
    let options = zune_inflate::DeflateOptions::default()
        .set_limit(expected_size)
        .set_size_hint(expected_size);
    let mut decoder = zune_inflate::DeflateDecoder::new_with_options(data, options);
    let out = decoder
        .decode_zlib()
        .map_err(|_| "zlib-compressed data malformed")?;
    if out.len() != expected_size {
        return Err("zlib stream shorter than declared content");
    }
    Ok(out)
}

/// Inflates a zlib stream of unknown decompressed size, up to `max_size`.
pub(crate) fn inflate_limited(data: &[u8], max_size: usize) -> Result<Vec<u8>, &'static str> {
    let options = zune_inflate::DeflateOptions::default()
        .set_limit(max_size)
        .set_size_hint(data.len().saturating_mul(4).min(max_size));
    let mut decoder = zune_inflate::DeflateDecoder::new_with_options(data, options);
    decoder
        .decode_zlib()
        .map_err(|_| "zlib-compressed data malformed")
}
