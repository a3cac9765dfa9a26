//! TGA (Truevision Targa) codec.
//!
//! # Supported subset
//!
//! Reading: image types 1/2/3 and their RLE variants 9/10/11; pixel depths
//! 8 (gray or palette index), 15/16 (A1R5G5B5), 24 (BGR) and 32 (BGRA);
//! color-map entry sizes 15/16/24/32; both row orders and both column
//! orders.
//!
//! Writing: uncompressed type 2 (color) or type 3 (gray), top-to-bottom,
//! 8-bit samples. Two-channel buffers are written as 16-bit gray with
//! 8 attribute bits. Width and height are limited to 65535 by the header.
//!
//! TGA has no signature; [`matches`] is a structural plausibility check
//! over the 18-byte header and the format must be probed last.
//!
//! The container has no color-profile concept: decode reports an absent
//! profile and encode ignores one.

use crate::{ImageInfo, MAX_IMAGE_BYTES};
use aimg_core::{Error, PixelBuffer, PixelFormat, Result, SampleType, Samples};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

pub(crate) const NAME: &str = "tga";
pub(crate) const EXTENSIONS: &[&str] = &["tga", "tpic"];

const HEADER_LEN: usize = 18;

// Image type codes; bit 3 marks the RLE variants (9, 10, 11).
const TYPE_PALETTE: u8 = 1;
const TYPE_TRUECOLOR: u8 = 2;
const TYPE_GRAY: u8 = 3;
const RLE_BIT: u8 = 8;

// Descriptor bits.
const DESC_RIGHT_TO_LEFT: u8 = 0x10;
const DESC_TOP_TO_BOTTOM: u8 = 0x20;

/// The fixed 18-byte file header.
#[derive(Debug, Clone)]
struct Header {
    id_length: u8,
    color_map_type: u8,
    image_type: u8,
    map_length: u16,
    map_entry_bits: u8,
    width: u16,
    height: u16,
    pixel_depth: u8,
    descriptor: u8,
}

impl Header {
    fn read<R: Read>(r: &mut R) -> Result<Self> {
        let id_length = r.read_u8()?;
        let color_map_type = r.read_u8()?;
        let image_type = r.read_u8()?;
        let _map_first = r.read_u16::<LittleEndian>()?;
        let map_length = r.read_u16::<LittleEndian>()?;
        let map_entry_bits = r.read_u8()?;
        let _x_origin = r.read_u16::<LittleEndian>()?;
        let _y_origin = r.read_u16::<LittleEndian>()?;
        let width = r.read_u16::<LittleEndian>()?;
        let height = r.read_u16::<LittleEndian>()?;
        let pixel_depth = r.read_u8()?;
        let descriptor = r.read_u8()?;
        Ok(Self {
            id_length,
            color_map_type,
            image_type,
            map_length,
            map_entry_bits,
            width,
            height,
            pixel_depth,
            descriptor,
        })
    }

    fn base_type(&self) -> u8 {
        self.image_type & !RLE_BIT
    }

    fn is_rle(&self) -> bool {
        self.image_type & RLE_BIT != 0
    }

    fn top_to_bottom(&self) -> bool {
        self.descriptor & DESC_TOP_TO_BOTTOM != 0
    }

    fn right_to_left(&self) -> bool {
        self.descriptor & DESC_RIGHT_TO_LEFT != 0
    }

    fn bytes_per_pixel(&self) -> usize {
        // 15-bit images still occupy two bytes per pixel
        (self.pixel_depth as usize).div_ceil(8)
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::decode(NAME, 12, "zero width or height"));
        }
        match (self.base_type(), self.pixel_depth) {
            (TYPE_PALETTE, 8) => {
                if self.color_map_type != 1 || self.map_length == 0 {
                    return Err(Error::decode(NAME, 1, "palette image without color map"));
                }
                if !matches!(self.map_entry_bits, 15 | 16 | 24 | 32) {
                    return Err(Error::decode(
                        NAME,
                        7,
                        format!("unsupported color map entry size {}", self.map_entry_bits),
                    ));
                }
                Ok(())
            }
            (TYPE_TRUECOLOR, 15 | 16 | 24 | 32) => Ok(()),
            (TYPE_GRAY, 8 | 16) => Ok(()),
            (t, d) => Err(Error::decode(
                NAME,
                2,
                format!("unsupported image type {t} at depth {d}"),
            )),
        }
    }

    /// Decoded pixel format after palette and 5-bit expansion.
    fn pixel_format(&self) -> PixelFormat {
        match self.base_type() {
            TYPE_PALETTE => match self.map_entry_bits {
                32 => PixelFormat::Rgba8U,
                _ => PixelFormat::Rgb8U,
            },
            TYPE_TRUECOLOR => match self.pixel_depth {
                32 => PixelFormat::Rgba8U,
                _ => PixelFormat::Rgb8U,
            },
            _ => match self.pixel_depth {
                16 => PixelFormat::Rg8U,
                _ => PixelFormat::R8U,
            },
        }
    }
}

/// Structural plausibility check over the 18-byte header.
///
/// TGA carries no magic number, so this can only reject impossible field
/// combinations; every format with a real signature must be probed first.
pub(crate) fn matches(header: &[u8]) -> bool {
    if header.len() < HEADER_LEN {
        return false;
    }
    let color_map_type = header[1];
    let image_type = header[2];
    let entry_bits = header[7];
    let width = u16::from_le_bytes([header[12], header[13]]);
    let height = u16::from_le_bytes([header[14], header[15]]);
    let depth = header[16];
    let descriptor = header[17];

    if color_map_type > 1 {
        return false;
    }
    if !matches!(image_type, 1 | 2 | 3 | 9 | 10 | 11) {
        return false;
    }
    if width == 0 || height == 0 {
        return false;
    }
    if !matches!(depth, 8 | 15 | 16 | 24 | 32) {
        return false;
    }
    // bits 6-7 of the descriptor are reserved
    if descriptor & 0xC0 != 0 {
        return false;
    }
    let palette = image_type & !RLE_BIT == TYPE_PALETTE;
    if palette {
        if color_map_type != 1 || depth != 8 || !matches!(entry_bits, 15 | 16 | 24 | 32) {
            return false;
        }
    } else if color_map_type == 1 {
        if !matches!(entry_bits, 15 | 16 | 24 | 32) {
            return false;
        }
    } else if entry_bits != 0 {
        return false;
    }
    if image_type & !RLE_BIT == TYPE_GRAY && !matches!(depth, 8 | 16) {
        return false;
    }
    true
}

/// Reads attributes without touching pixel data.
pub(crate) fn read_header<R: Read + Seek>(r: &mut R) -> Result<ImageInfo> {
    let header = Header::read(r).map_err(|e| truncated(e, 0))?;
    header.validate()?;
    Ok(ImageInfo {
        width: header.width as u32,
        height: header.height as u32,
        pixel_format: header.pixel_format(),
        profile: None,
    })
}

/// Decodes the full image into a top-left-origin buffer.
pub(crate) fn read_pixels<R: Read + Seek>(r: &mut R) -> Result<PixelBuffer> {
    let header = Header::read(r).map_err(|e| truncated(e, 0))?;
    header.validate()?;

    r.seek(SeekFrom::Current(header.id_length as i64))?;

    // A color map may be present even for non-palette types; its bytes
    // always precede the pixel data.
    let entry_bytes = (header.map_entry_bits as usize).div_ceil(8);
    let palette = if header.color_map_type == 1 {
        let mut raw = vec![0u8; header.map_length as usize * entry_bytes];
        let at = r.stream_position()?;
        r.read_exact(&mut raw).map_err(|e| truncated(e.into(), at))?;
        Some(raw)
    } else {
        None
    };

    let width = header.width as usize;
    let height = header.height as usize;
    let bpp = header.bytes_per_pixel();
    let byte_len = width
        .saturating_mul(height)
        .saturating_mul(header.pixel_format().channels());
    if byte_len > MAX_IMAGE_BYTES {
        return Err(Error::decode(NAME, 12, "image exceeds the decode size limit"));
    }
    let data_at = r.stream_position()?;
    let raw = if header.is_rle() {
        read_rle(r, width * height, bpp).map_err(|e| truncated(e, data_at))?
    } else {
        let mut raw = vec![0u8; width * height * bpp];
        r.read_exact(&mut raw).map_err(|e| truncated(e.into(), data_at))?;
        raw
    };

    let format = header.pixel_format();
    let channels = format.channels();
    let mut samples = vec![0u8; width * height * channels];
    for (i, pixel) in raw.chunks_exact(bpp).enumerate() {
        let out = &mut samples[i * channels..(i + 1) * channels];
        match header.base_type() {
            TYPE_PALETTE => {
                let palette = palette.as_deref().unwrap_or(&[]);
                let index = pixel[0] as usize;
                if index >= header.map_length as usize {
                    return Err(Error::decode(
                        NAME,
                        data_at,
                        format!("palette index {index} out of range"),
                    ));
                }
                let entry = &palette[index * entry_bytes..(index + 1) * entry_bytes];
                decode_color(entry, header.map_entry_bits, out);
            }
            TYPE_TRUECOLOR => decode_color(pixel, header.pixel_depth, out),
            _ => {
                out[0] = pixel[0];
                if channels == 2 {
                    out[1] = pixel[1];
                }
            }
        }
    }

    if !header.top_to_bottom() {
        flip_rows(&mut samples, width * channels, height);
    }
    if header.right_to_left() {
        flip_columns(&mut samples, width, height, channels);
    }

    PixelBuffer::new(
        header.width as u32,
        header.height as u32,
        format,
        Samples::U8(samples),
    )
}

/// Writes an uncompressed top-to-bottom TGA.
///
/// The buffer must already be 8-bit; the facade converts via
/// [`storage_format`] beforehand.
pub(crate) fn write<W: Write>(w: &mut W, buf: &PixelBuffer) -> Result<()> {
    let Some(samples) = buf.as_u8() else {
        return Err(Error::encode(
            NAME,
            format!("cannot store {} samples", buf.sample_type()),
        ));
    };
    if buf.width() > u16::MAX as u32 || buf.height() > u16::MAX as u32 {
        return Err(Error::encode(
            NAME,
            format!("{}x{} exceeds the 16-bit header fields", buf.width(), buf.height()),
        ));
    }

    let channels = buf.channels();
    let (image_type, depth, alpha_bits) = match channels {
        1 => (TYPE_GRAY, 8u8, 0u8),
        2 => (TYPE_GRAY, 16, 8),
        3 => (TYPE_TRUECOLOR, 24, 0),
        _ => (TYPE_TRUECOLOR, 32, 8),
    };

    w.write_u8(0)?; // no image id
    w.write_u8(0)?; // no color map
    w.write_u8(image_type)?;
    w.write_u16::<LittleEndian>(0)?;
    w.write_u16::<LittleEndian>(0)?;
    w.write_u8(0)?;
    w.write_u16::<LittleEndian>(0)?;
    w.write_u16::<LittleEndian>(0)?;
    w.write_u16::<LittleEndian>(buf.width() as u16)?;
    w.write_u16::<LittleEndian>(buf.height() as u16)?;
    w.write_u8(depth)?;
    w.write_u8(DESC_TOP_TO_BOTTOM | alpha_bits)?;

    let mut row = Vec::with_capacity(buf.width() as usize * channels);
    for chunk in samples.chunks_exact(buf.width() as usize * channels) {
        row.clear();
        match channels {
            3 | 4 => {
                for px in chunk.chunks_exact(channels) {
                    row.push(px[2]);
                    row.push(px[1]);
                    row.push(px[0]);
                    if channels == 4 {
                        row.push(px[3]);
                    }
                }
            }
            _ => row.extend_from_slice(chunk),
        }
        w.write_all(&row)?;
    }
    Ok(())
}

/// Whether the container stores this format without conversion.
pub(crate) fn supports(format: PixelFormat) -> bool {
    format.sample_type() == SampleType::U8
}

/// The format actually written for a given input format.
pub(crate) fn storage_format(format: PixelFormat) -> PixelFormat {
    format.with_sample_type(SampleType::U8)
}

/// Expands a packed 15/16-bit or BGR(A) pixel into RGB(A) output.
fn decode_color(pixel: &[u8], depth: u8, out: &mut [u8]) {
    match depth {
        15 | 16 => {
            let v = u16::from_le_bytes([pixel[0], pixel[1]]);
            out[0] = expand5((v >> 10) & 0x1F);
            out[1] = expand5((v >> 5) & 0x1F);
            out[2] = expand5(v & 0x1F);
            if out.len() == 4 {
                out[3] = u8::MAX;
            }
        }
        24 => {
            out[0] = pixel[2];
            out[1] = pixel[1];
            out[2] = pixel[0];
            if out.len() == 4 {
                out[3] = u8::MAX;
            }
        }
        _ => {
            out[0] = pixel[2];
            out[1] = pixel[1];
            out[2] = pixel[0];
            if out.len() == 4 {
                out[3] = pixel[3];
            }
        }
    }
}

/// 5-bit to 8-bit channel expansion.
#[inline]
fn expand5(v: u16) -> u8 {
    let v = v as u8;
    (v << 3) | (v >> 2)
}

/// Decodes RLE packets into `pixel_count` raw pixels.
///
/// Packets are pixel-granular: a high bit marks a run of the following
/// pixel value, otherwise the packet holds literal pixels. Runs crossing
/// scanline boundaries are accepted.
fn read_rle<R: Read>(r: &mut R, pixel_count: usize, bpp: usize) -> Result<Vec<u8>> {
    let total = pixel_count * bpp;
    let mut raw = Vec::with_capacity(total);
    let mut pixel = [0u8; 4];
    while raw.len() < total {
        let packet = r.read_u8()?;
        let count = (packet as usize & 0x7F) + 1;
        if raw.len() + count * bpp > total {
            return Err(Error::decode(NAME, 0, "RLE packet overruns image"));
        }
        if packet & 0x80 != 0 {
            r.read_exact(&mut pixel[..bpp])?;
            for _ in 0..count {
                raw.extend_from_slice(&pixel[..bpp]);
            }
        } else {
            let start = raw.len();
            raw.resize(start + count * bpp, 0);
            r.read_exact(&mut raw[start..])?;
        }
    }
    Ok(raw)
}

fn flip_rows(samples: &mut [u8], row_len: usize, height: usize) {
    for y in 0..height / 2 {
        let (top, rest) = samples.split_at_mut((height - 1 - y) * row_len);
        top[y * row_len..(y + 1) * row_len].swap_with_slice(&mut rest[..row_len]);
    }
}

fn flip_columns(samples: &mut [u8], width: usize, height: usize, channels: usize) {
    for y in 0..height {
        let row = &mut samples[y * width * channels..(y + 1) * width * channels];
        for x in 0..width / 2 {
            for c in 0..channels {
                row.swap(x * channels + c, (width - 1 - x) * channels + c);
            }
        }
    }
}

/// Rewrites a truncation as a decode error with position context.
fn truncated(err: Error, at: u64) -> Error {
    match err {
        Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Error::decode(NAME, at, "unexpected end of stream")
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(buf: &PixelBuffer) -> PixelBuffer {
        let mut encoded = Vec::new();
        write(&mut encoded, buf).unwrap();
        assert!(matches(&encoded));
        read_pixels(&mut Cursor::new(encoded)).unwrap()
    }

    #[test]
    fn roundtrip_rgb() {
        let buf = PixelBuffer::new(
            2,
            2,
            PixelFormat::Rgb8U,
            Samples::U8(vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 10, 20, 30]),
        )
        .unwrap();
        assert_eq!(roundtrip(&buf), buf);
    }

    #[test]
    fn roundtrip_rgba_keeps_alpha() {
        let buf = PixelBuffer::new(
            2,
            1,
            PixelFormat::Rgba8U,
            Samples::U8(vec![1, 2, 3, 4, 5, 6, 7, 0]),
        )
        .unwrap();
        assert_eq!(roundtrip(&buf), buf);
    }

    #[test]
    fn roundtrip_gray_and_gray_alpha() {
        let gray = PixelBuffer::new(3, 1, PixelFormat::R8U, Samples::U8(vec![0, 127, 255])).unwrap();
        assert_eq!(roundtrip(&gray), gray);

        let ga = PixelBuffer::new(2, 1, PixelFormat::Rg8U, Samples::U8(vec![9, 200, 10, 0])).unwrap();
        assert_eq!(roundtrip(&ga), ga);
    }

    #[test]
    fn bottom_up_rows_are_flipped() {
        // Hand-built 1x2 gray image, bottom-up (descriptor 0)
        let mut data = vec![
            0, 0, TYPE_GRAY, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 2, 0, 8, 0,
        ];
        data.extend_from_slice(&[11, 22]); // bottom row first
        let buf = read_pixels(&mut Cursor::new(data)).unwrap();
        assert_eq!(buf.as_u8().unwrap(), &[22, 11]);
    }

    #[test]
    fn rle_runs_and_literals() {
        // 4x1 RGB, one run packet of 3 + one literal packet of 1
        let mut data = vec![
            0, 0, TYPE_TRUECOLOR | RLE_BIT, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 1, 0, 24,
            DESC_TOP_TO_BOTTOM,
        ];
        data.extend_from_slice(&[0x82, 1, 2, 3]); // run: 3 pixels of BGR(1,2,3)
        data.extend_from_slice(&[0x00, 9, 8, 7]); // literal: 1 pixel
        let buf = read_pixels(&mut Cursor::new(data)).unwrap();
        assert_eq!(
            buf.as_u8().unwrap(),
            &[3, 2, 1, 3, 2, 1, 3, 2, 1, 7, 8, 9]
        );
    }

    #[test]
    fn palette_expands_to_rgb() {
        let mut data = vec![
            0, 1, TYPE_PALETTE, 0, 0, 2, 0, 24, 0, 0, 0, 0, 3, 0, 1, 0, 8,
            DESC_TOP_TO_BOTTOM,
        ];
        // two BGR entries: red, green
        data.extend_from_slice(&[0, 0, 255, 0, 255, 0]);
        data.extend_from_slice(&[0, 1, 0]); // indices
        let buf = read_pixels(&mut Cursor::new(data)).unwrap();
        assert_eq!(buf.format(), PixelFormat::Rgb8U);
        assert_eq!(
            buf.as_u8().unwrap(),
            &[255, 0, 0, 0, 255, 0, 255, 0, 0]
        );
    }

    #[test]
    fn sixteen_bit_pixels_expand() {
        // 1x1 truecolor, 16bpp, value with r=31 g=0 b=15
        let v: u16 = (31 << 10) | 15;
        let mut data = vec![
            0, 0, TYPE_TRUECOLOR, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0, 16,
            DESC_TOP_TO_BOTTOM,
        ];
        data.extend_from_slice(&v.to_le_bytes());
        let buf = read_pixels(&mut Cursor::new(data)).unwrap();
        assert_eq!(buf.as_u8().unwrap(), &[255, 0, expand5(15)]);
    }

    #[test]
    fn out_of_range_palette_index_is_decode_error() {
        let mut data = vec![
            0, 1, TYPE_PALETTE, 0, 0, 1, 0, 24, 0, 0, 0, 0, 1, 0, 1, 0, 8,
            DESC_TOP_TO_BOTTOM,
        ];
        data.extend_from_slice(&[1, 2, 3]); // one palette entry
        data.push(5); // index out of range
        let err = read_pixels(&mut Cursor::new(data)).unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn truncated_file_is_decode_error() {
        let data = vec![0, 0, TYPE_GRAY, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, 0, 4, 0, 8, 0];
        // header promises 16 pixels, none follow
        let err = read_pixels(&mut Cursor::new(data)).unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn matches_rejects_other_formats() {
        assert!(!matches(b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR\x00\x00"));
        assert!(!matches(&[0x76, 0x2f, 0x31, 0x01, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert!(!matches(b"fn main() { todo!() }"));
        assert!(!matches(&[]));
    }

    #[test]
    fn storage_format_is_8bit() {
        assert_eq!(storage_format(PixelFormat::Rgb32F), PixelFormat::Rgb8U);
        assert_eq!(storage_format(PixelFormat::Rgba16U), PixelFormat::Rgba8U);
        assert!(supports(PixelFormat::R8U));
        assert!(!supports(PixelFormat::R16F));
    }
}
