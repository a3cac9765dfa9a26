//! Failure behavior of the public facade.
//!
//! Decoders either return a complete buffer or an error; there is no
//! partially-open handle and no partially-filled result.

use aimg_io::{encode_to_vec, open_memory, FileFormat, PixelBuffer, PixelFormat, Samples};

fn small_rgb() -> PixelBuffer {
    let data: Vec<u8> = (0..4 * 4 * 3).map(|i| (i * 17 % 256) as u8).collect();
    PixelBuffer::new(4, 4, PixelFormat::Rgb8U, Samples::U8(data)).unwrap()
}

#[test]
fn empty_input_has_its_own_error() {
    let err = open_memory(&[]).unwrap_err();
    assert!(err.is_empty_input());
    assert_eq!(err.to_string(), "input stream is empty");
}

#[test]
fn unrecognized_data_is_unsupported() {
    // A WebP header: real image data, but not a format this engine reads.
    let err = open_memory(b"RIFF\x24\x00\x00\x00WEBPVP8 ").unwrap_err();
    assert!(err.is_unsupported_filetype());
    assert_eq!(
        err.to_string(),
        "input does not match any supported image format"
    );
}

#[cfg(feature = "png")]
#[test]
fn truncated_pixel_data_fails_decode_not_open() {
    let bytes = encode_to_vec(&small_rgb(), FileFormat::Png, None, None).unwrap();
    let cut = &bytes[..bytes.len() - 8];

    // The header chunks are intact, so open succeeds.
    let mut image = open_memory(cut).unwrap();
    assert_eq!((image.width(), image.height()), (4, 4));

    let err = image.decode().unwrap_err();
    assert!(err.is_decode_error());
    let msg = err.to_string();
    assert!(msg.starts_with("png decode failed at byte"), "{msg}");

    // Decoding rewinds before reading, so a retry fails identically
    // instead of compounding.
    let again = image.decode().unwrap_err();
    assert_eq!(again.to_string(), msg);
}

#[cfg(feature = "exr")]
#[test]
fn exr_with_missing_blocks_opens_but_does_not_decode() {
    let mut data = Vec::with_capacity(20 * 20 * 3);
    for i in 0..20 * 20 * 3 {
        data.push(i as f32 * 0.5);
    }
    let buffer = PixelBuffer::new(20, 20, PixelFormat::Rgb32F, Samples::F32(data)).unwrap();
    let bytes = encode_to_vec(&buffer, FileFormat::Exr, None, None).unwrap();
    let cut = &bytes[..bytes.len() - 10];

    let mut image = open_memory(cut).unwrap();
    assert_eq!(image.pixel_format(), PixelFormat::Rgb32F);

    let err = image.decode().unwrap_err();
    assert!(err.is_decode_error());
    assert!(err.to_string().starts_with("exr decode failed at byte"));
}

#[cfg(feature = "png")]
#[test]
fn corrupt_header_fails_open_without_a_handle() {
    let mut bytes = encode_to_vec(&small_rgb(), FileFormat::Png, None, None).unwrap();
    // Flip a bit inside the IHDR payload; the chunk CRC no longer matches.
    bytes[17] ^= 0x01;

    let err = open_memory(&bytes).unwrap_err();
    assert!(err.is_decode_error());
    assert!(err.to_string().contains("CRC"), "{err}");
}

#[cfg(all(feature = "exr", feature = "png"))]
#[test]
fn wrong_magic_is_not_misattributed() {
    // EXR magic followed by garbage detects as EXR and fails as EXR, with
    // the failure offset inside the stream.
    let mut bytes = vec![0x76, 0x2f, 0x31, 0x01];
    bytes.extend_from_slice(&[0u8; 3]);

    let err = open_memory(&bytes).unwrap_err();
    assert!(err.is_decode_error());
    assert!(err.to_string().starts_with("exr decode failed"), "{err}");
}
