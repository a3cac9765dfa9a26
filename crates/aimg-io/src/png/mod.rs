//! PNG codec.
//!
//! # Supported subset
//!
//! Reading: all five color types at their legal bit depths. Sub-byte
//! gray samples are rescaled to full 8-bit range, palette images are
//! expanded through `PLTE` (plus `tRNS` alpha when present), and 16-bit
//! samples are read big-endian. Adam7 interlacing is supported for
//! whole-byte depths. Embedded ICC profiles arrive via `iCCP`.
//! Gray and truecolor color-key transparency is ignored.
//!
//! Writing: non-interlaced gray, gray-alpha, RGB or RGBA at 8 or 16
//! bits, with a configurable zlib level and filter strategy
//! ([`PngEncodeOptions`]). Level 0 plus [`FilterStrategy::None`] stores
//! scanlines verbatim inside stored deflate blocks.
//!
//! Chunk CRCs are verified for every chunk the decoder consumes.

mod filter;

use crate::{zlib, ImageInfo, MAX_IMAGE_BYTES};
use aimg_core::{ColorProfile, Error, PixelBuffer, PixelFormat, Result, SampleType, Samples};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::OnceLock;

pub(crate) const NAME: &str = "png";
pub(crate) const EXTENSIONS: &[&str] = &["png"];

pub(crate) const MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const COLOR_GRAY: u8 = 0;
const COLOR_RGB: u8 = 2;
const COLOR_PALETTE: u8 = 3;
const COLOR_GRAY_ALPHA: u8 = 4;
const COLOR_RGBA: u8 = 6;

const MAX_CHUNK_LEN: u32 = i32::MAX as u32;
const MAX_PROFILE_LEN: usize = 1 << 24;

const ADAM7: [(usize, usize, usize, usize); 7] = [
    (0, 0, 8, 8),
    (4, 0, 8, 8),
    (0, 4, 4, 8),
    (2, 0, 4, 4),
    (0, 2, 2, 4),
    (1, 0, 2, 2),
    (0, 1, 1, 2),
];

/// Per-row filter selection for [`write`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterStrategy {
    /// Every row gets filter type 0.
    None,
    /// Every row gets the Sub filter (left difference).
    Sub,
    /// Every row gets the Up filter (above difference).
    Up,
    /// Every row gets the Average filter (mean of left and above).
    Average,
    /// Every row gets the Paeth filter (neighbor prediction).
    Paeth,
    /// Pick per row by smallest absolute residual sum.
    #[default]
    Adaptive,
}

impl FilterStrategy {
    fn fixed_code(self) -> Option<u8> {
        match self {
            Self::None => Some(filter::FILTER_NONE),
            Self::Sub => Some(filter::FILTER_SUB),
            Self::Up => Some(filter::FILTER_UP),
            Self::Average => Some(filter::FILTER_AVERAGE),
            Self::Paeth => Some(filter::FILTER_PAETH),
            Self::Adaptive => None,
        }
    }
}

/// Encoder knobs; the defaults match a general-purpose encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngEncodeOptions {
    /// zlib level, 0 (stored) through 9.
    pub compression_level: u8,
    /// Scanline filter selection.
    pub filter: FilterStrategy,
}

impl Default for PngEncodeOptions {
    fn default() -> Self {
        Self {
            compression_level: 6,
            filter: FilterStrategy::Adaptive,
        }
    }
}

impl PngEncodeOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(Error::encode(
                NAME,
                format!("compression level {} out of range", self.compression_level),
            ));
        }
        Ok(())
    }
}

static CRC_TABLE: OnceLock<[u32; 256]> = OnceLock::new();

fn crc_table() -> &'static [u32; 256] {
    CRC_TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        for (n, slot) in table.iter_mut().enumerate() {
            let mut c = n as u32;
            for _ in 0..8 {
                c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            }
            *slot = c;
        }
        table
    })
}

fn crc32(parts: &[&[u8]]) -> u32 {
    let table = crc_table();
    let mut c = u32::MAX;
    for part in parts {
        for &byte in *part {
            c = table[((c ^ byte as u32) & 0xFF) as usize] ^ (c >> 8);
        }
    }
    !c
}

#[derive(Debug, Clone, Copy)]
struct Ihdr {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    interlace: u8,
}

impl Ihdr {
    fn parse(data: &[u8]) -> Result<Self> {
        let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let bit_depth = data[8];
        let color_type = data[9];
        if width == 0 || height == 0 || width > MAX_CHUNK_LEN || height > MAX_CHUNK_LEN {
            return Err(Error::decode(NAME, 16, "invalid image dimensions"));
        }
        let legal: &[u8] = match color_type {
            COLOR_GRAY => &[1, 2, 4, 8, 16],
            COLOR_PALETTE => &[1, 2, 4, 8],
            COLOR_RGB | COLOR_GRAY_ALPHA | COLOR_RGBA => &[8, 16],
            _ => {
                return Err(Error::decode(
                    NAME,
                    16,
                    format!("invalid color type {color_type}"),
                ));
            }
        };
        if !legal.contains(&bit_depth) {
            return Err(Error::decode(
                NAME,
                16,
                format!("invalid bit depth {bit_depth} for color type {color_type}"),
            ));
        }
        if data[10] != 0 {
            return Err(Error::decode(NAME, 16, "unsupported compression method"));
        }
        if data[11] != 0 {
            return Err(Error::decode(NAME, 16, "unsupported filter method"));
        }
        let interlace = data[12];
        if interlace > 1 {
            return Err(Error::decode(NAME, 16, "unsupported interlace method"));
        }
        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
            interlace,
        })
    }

    fn source_channels(&self) -> usize {
        match self.color_type {
            COLOR_GRAY | COLOR_PALETTE => 1,
            COLOR_GRAY_ALPHA => 2,
            COLOR_RGB => 3,
            _ => 4,
        }
    }

    fn bits_per_pixel(&self) -> usize {
        self.source_channels() * self.bit_depth as usize
    }

    fn filter_unit(&self) -> usize {
        (self.bits_per_pixel() / 8).max(1)
    }

    /// Decoded format after palette expansion and sub-byte rescaling.
    fn pixel_format(&self, has_alpha_table: bool) -> PixelFormat {
        let wide = self.bit_depth == 16;
        match self.color_type {
            COLOR_GRAY => {
                if wide {
                    PixelFormat::R16U
                } else {
                    PixelFormat::R8U
                }
            }
            COLOR_PALETTE => {
                if has_alpha_table {
                    PixelFormat::Rgba8U
                } else {
                    PixelFormat::Rgb8U
                }
            }
            COLOR_RGB => {
                if wide {
                    PixelFormat::Rgb16U
                } else {
                    PixelFormat::Rgb8U
                }
            }
            COLOR_GRAY_ALPHA => {
                if wide {
                    PixelFormat::Rg16U
                } else {
                    PixelFormat::Rg8U
                }
            }
            _ => {
                if wide {
                    PixelFormat::Rgba16U
                } else {
                    PixelFormat::Rgba8U
                }
            }
        }
    }
}

#[derive(Debug)]
struct Parsed {
    ihdr: Ihdr,
    profile: Option<ColorProfile>,
    palette: Option<Vec<[u8; 3]>>,
    alpha: Option<Vec<u8>>,
    idat: Vec<u8>,
    idat_at: u64,
}

/// Walks the chunk stream. With `want_pixels` false the walk stops at
/// the first `IDAT`; chunk ordering rules put `iCCP`, `PLTE` and `tRNS`
/// before it, so attributes are complete either way.
fn parse<R: Read + Seek>(r: &mut R, want_pixels: bool) -> Result<Parsed> {
    let mut signature = [0u8; 8];
    r.read_exact(&mut signature)?;
    if signature != MAGIC {
        return Err(Error::decode(NAME, 0, "bad signature"));
    }

    let (len, kind) = read_chunk_header(r, 8)?;
    if &kind != b"IHDR" || len != 13 {
        return Err(Error::decode(NAME, 8, "missing IHDR chunk"));
    }
    let ihdr = Ihdr::parse(&read_chunk_data(r, len as usize, &kind, 8)?)?;

    let mut profile = None;
    let mut palette = None;
    let mut alpha = None;
    let mut idat: Vec<u8> = Vec::new();
    let mut idat_at = 0u64;
    loop {
        let at = r.stream_position()?;
        let (len, kind) = read_chunk_header(r, at)?;
        match &kind {
            b"PLTE" => {
                if len % 3 != 0 || len > 768 {
                    return Err(Error::decode(NAME, at, "malformed PLTE chunk"));
                }
                let data = read_chunk_data(r, len as usize, &kind, at)?;
                palette = Some(data.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect());
            }
            b"tRNS" => {
                if ihdr.color_type == COLOR_PALETTE {
                    if len > 256 {
                        return Err(Error::decode(NAME, at, "malformed tRNS chunk"));
                    }
                    alpha = Some(read_chunk_data(r, len as usize, &kind, at)?);
                } else {
                    tracing::debug!("ignoring color-key transparency");
                    skip_chunk(r, len)?;
                }
            }
            b"iCCP" => {
                if profile.is_some() {
                    return Err(Error::decode(NAME, at, "duplicate iCCP chunk"));
                }
                if len as usize > MAX_PROFILE_LEN {
                    return Err(Error::decode(NAME, at, "oversized iCCP chunk"));
                }
                let data = read_chunk_data(r, len as usize, &kind, at)?;
                profile = Some(parse_iccp(&data, at)?);
            }
            b"IDAT" => {
                if !want_pixels {
                    break;
                }
                if idat.is_empty() {
                    idat_at = at;
                }
                if idat.len() + len as usize > MAX_IMAGE_BYTES {
                    return Err(Error::decode(
                        NAME,
                        at,
                        "compressed image data exceeds the decode size limit",
                    ));
                }
                idat.extend_from_slice(&read_chunk_data(r, len as usize, &kind, at)?);
            }
            b"IEND" => break,
            other => {
                if other[0].is_ascii_uppercase() {
                    return Err(Error::decode(
                        NAME,
                        at,
                        format!("unknown critical chunk {}", String::from_utf8_lossy(other)),
                    ));
                }
                skip_chunk(r, len)?;
            }
        }
    }
    Ok(Parsed {
        ihdr,
        profile,
        palette,
        alpha,
        idat,
        idat_at,
    })
}

fn read_chunk_header<R: Read>(r: &mut R, at: u64) -> Result<(u32, [u8; 4])> {
    let len = r.read_u32::<BigEndian>()?;
    let mut kind = [0u8; 4];
    r.read_exact(&mut kind)?;
    if len > MAX_CHUNK_LEN {
        return Err(Error::decode(NAME, at, "chunk length out of range"));
    }
    if !kind.iter().all(|b| b.is_ascii_alphabetic()) {
        return Err(Error::decode(NAME, at, "corrupt chunk type"));
    }
    Ok((len, kind))
}

fn read_chunk_data<R: Read>(r: &mut R, len: usize, kind: &[u8; 4], at: u64) -> Result<Vec<u8>> {
    let mut data = vec![0u8; len];
    r.read_exact(&mut data)?;
    let stored = r.read_u32::<BigEndian>()?;
    if stored != crc32(&[kind, &data]) {
        return Err(Error::decode(
            NAME,
            at,
            format!("{} chunk CRC mismatch", String::from_utf8_lossy(kind)),
        ));
    }
    Ok(data)
}

fn skip_chunk<R: Read + Seek>(r: &mut R, len: u32) -> Result<()> {
    r.seek(SeekFrom::Current(len as i64 + 4))?;
    Ok(())
}

/// `iCCP` payload: Latin-1 name, NUL, method byte, zlib profile data.
fn parse_iccp(data: &[u8], at: u64) -> Result<ColorProfile> {
    let Some(nul) = data.iter().position(|&b| b == 0) else {
        return Err(Error::decode(NAME, at, "malformed iCCP chunk"));
    };
    if nul == 0 || nul > 79 || data.len() < nul + 2 {
        return Err(Error::decode(NAME, at, "malformed iCCP chunk"));
    }
    if data[nul + 1] != 0 {
        return Err(Error::decode(NAME, at, "unsupported profile compression method"));
    }
    let name: String = data[..nul].iter().map(|&b| b as char).collect();
    let profile = zlib::inflate_limited(&data[nul + 2..], MAX_PROFILE_LEN)
        .map_err(|m| Error::decode(NAME, at, m))?;
    Ok(ColorProfile::new(name, profile))
}

/// Signature check over the first eight bytes.
pub(crate) fn matches(header: &[u8]) -> bool {
    header.len() >= MAGIC.len() && header[..MAGIC.len()] == MAGIC
}

/// Reads attributes and profile, stopping before any pixel data.
pub(crate) fn read_header<R: Read + Seek>(r: &mut R) -> Result<ImageInfo> {
    let parsed = parse(r, false).map_err(|e| rewrap_eof(e, r))?;
    Ok(ImageInfo {
        width: parsed.ihdr.width,
        height: parsed.ihdr.height,
        pixel_format: parsed.ihdr.pixel_format(parsed.alpha.is_some()),
        profile: parsed.profile,
    })
}

/// Decodes the full image into a top-left-origin buffer.
pub(crate) fn read_pixels<R: Read + Seek>(r: &mut R) -> Result<PixelBuffer> {
    read_pixels_impl(r).map_err(|e| rewrap_eof(e, r))
}

#[derive(Debug, Clone, Copy)]
struct Pass {
    x0: usize,
    y0: usize,
    dx: usize,
    dy: usize,
    width: usize,
    height: usize,
}

fn pass_list(ihdr: &Ihdr) -> Vec<Pass> {
    let (w, h) = (ihdr.width as usize, ihdr.height as usize);
    if ihdr.interlace == 0 {
        return vec![Pass {
            x0: 0,
            y0: 0,
            dx: 1,
            dy: 1,
            width: w,
            height: h,
        }];
    }
    ADAM7
        .iter()
        .filter_map(|&(x0, y0, dx, dy)| {
            let width = if w > x0 { (w - x0).div_ceil(dx) } else { 0 };
            let height = if h > y0 { (h - y0).div_ceil(dy) } else { 0 };
            (width > 0 && height > 0).then_some(Pass {
                x0,
                y0,
                dx,
                dy,
                width,
                height,
            })
        })
        .collect()
}

fn row_bytes(pixels: usize, bits_per_pixel: usize) -> usize {
    (pixels * bits_per_pixel).div_ceil(8)
}

fn read_pixels_impl<R: Read + Seek>(r: &mut R) -> Result<PixelBuffer> {
    let parsed = parse(r, true)?;
    let ihdr = &parsed.ihdr;
    if ihdr.interlace == 1 && ihdr.bit_depth < 8 {
        return Err(Error::decode(NAME, 8, "interlaced sub-byte images are not supported"));
    }
    let format = ihdr.pixel_format(parsed.alpha.is_some());
    let width = ihdr.width as usize;
    let height = ihdr.height as usize;
    let nch = format.channels();
    let byte_len = width
        .saturating_mul(height)
        .saturating_mul(nch * format.bytes_per_channel());
    if byte_len > MAX_IMAGE_BYTES {
        return Err(Error::decode(NAME, 16, "image exceeds the decode size limit"));
    }
    if ihdr.color_type == COLOR_PALETTE && parsed.palette.is_none() {
        return Err(Error::decode(NAME, 8, "palette image without PLTE chunk"));
    }
    if parsed.idat.is_empty() {
        return Err(Error::decode(NAME, 8, "no IDAT chunks"));
    }

    let passes = pass_list(ihdr);
    let bpp = ihdr.bits_per_pixel();
    let raw_len: usize = passes
        .iter()
        .map(|p| p.height * (1 + row_bytes(p.width, bpp)))
        .sum();
    let raw = zlib::inflate_exact(&parsed.idat, raw_len)
        .map_err(|m| Error::decode(NAME, parsed.idat_at, m))?;

    let unit = ihdr.filter_unit();
    let total = width * height * nch;
    let mut out8 = Vec::new();
    let mut out16 = Vec::new();
    if ihdr.bit_depth == 16 {
        out16 = vec![0u16; total];
    } else {
        out8 = vec![0u8; total];
    }

    let mut pos = 0;
    for pass in &passes {
        let rb = row_bytes(pass.width, bpp);
        let mut prev = vec![0u8; rb];
        let mut cur = vec![0u8; rb];
        for py in 0..pass.height {
            let kind = raw[pos];
            pos += 1;
            cur.copy_from_slice(&raw[pos..pos + rb]);
            pos += rb;
            filter::unfilter(kind, &mut cur, &prev, unit)
                .map_err(|m| Error::decode(NAME, parsed.idat_at, m))?;
            let y = pass.y0 + py * pass.dy;
            if ihdr.bit_depth == 16 {
                place_row_u16(&cur, ihdr, pass, y, width, nch, &mut out16);
            } else {
                place_row_u8(
                    &cur,
                    ihdr,
                    parsed.palette.as_deref().unwrap_or(&[]),
                    parsed.alpha.as_deref(),
                    pass,
                    y,
                    width,
                    nch,
                    &mut out8,
                    parsed.idat_at,
                )?;
            }
            std::mem::swap(&mut prev, &mut cur);
        }
    }

    let samples = if ihdr.bit_depth == 16 {
        Samples::U16(out16)
    } else {
        Samples::U8(out8)
    };
    PixelBuffer::new(ihdr.width, ihdr.height, format, samples)
}

fn place_row_u16(
    row: &[u8],
    ihdr: &Ihdr,
    pass: &Pass,
    y: usize,
    img_width: usize,
    nch: usize,
    out: &mut [u16],
) {
    let channels = ihdr.source_channels();
    for px in 0..pass.width {
        let x = pass.x0 + px * pass.dx;
        let base = (y * img_width + x) * nch;
        for c in 0..channels {
            let o = (px * channels + c) * 2;
            out[base + c] = u16::from_be_bytes([row[o], row[o + 1]]);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn place_row_u8(
    row: &[u8],
    ihdr: &Ihdr,
    palette: &[[u8; 3]],
    alpha: Option<&[u8]>,
    pass: &Pass,
    y: usize,
    img_width: usize,
    nch: usize,
    out: &mut [u8],
    at: u64,
) -> Result<()> {
    match ihdr.color_type {
        COLOR_PALETTE => {
            for (px, index) in unpack_bits(row, ihdr.bit_depth, pass.width).enumerate() {
                let x = pass.x0 + px * pass.dx;
                let base = (y * img_width + x) * nch;
                let entry = palette.get(index as usize).ok_or_else(|| {
                    Error::decode(NAME, at, format!("palette index {index} out of range"))
                })?;
                out[base..base + 3].copy_from_slice(entry);
                if nch == 4 {
                    // entries past the alpha table are fully opaque
                    out[base + 3] = alpha
                        .and_then(|a| a.get(index as usize))
                        .copied()
                        .unwrap_or(u8::MAX);
                }
            }
        }
        COLOR_GRAY if ihdr.bit_depth < 8 => {
            let scale = match ihdr.bit_depth {
                1 => 255,
                2 => 85,
                _ => 17,
            };
            for (px, value) in unpack_bits(row, ihdr.bit_depth, pass.width).enumerate() {
                let x = pass.x0 + px * pass.dx;
                out[y * img_width + x] = value * scale;
            }
        }
        _ => {
            let channels = ihdr.source_channels();
            for px in 0..pass.width {
                let x = pass.x0 + px * pass.dx;
                let base = (y * img_width + x) * nch;
                out[base..base + channels]
                    .copy_from_slice(&row[px * channels..(px + 1) * channels]);
            }
        }
    }
    Ok(())
}

/// Yields `count` values of `depth` bits, most significant bits first.
fn unpack_bits(row: &[u8], depth: u8, count: usize) -> impl Iterator<Item = u8> + '_ {
    let depth = depth as usize;
    let mask = ((1u16 << depth) - 1) as u8;
    (0..count).map(move |i| {
        let bit = i * depth;
        let shift = 8 - depth - (bit % 8);
        (row[bit / 8] >> shift) & mask
    })
}

/// Writes a non-interlaced PNG, with an `iCCP` chunk when a profile is
/// given.
///
/// The buffer must already be 8U or 16U; the facade converts via
/// [`storage_format`] beforehand.
pub(crate) fn write<W: Write>(
    w: &mut W,
    buf: &PixelBuffer,
    profile: Option<&ColorProfile>,
    options: &PngEncodeOptions,
) -> Result<()> {
    enum IntSamples<'a> {
        Bytes(&'a [u8]),
        Words(&'a [u16]),
    }

    options.validate()?;
    if let Some(profile) = profile {
        validate_profile_name(profile.name())?;
    }
    let source = match buf.samples() {
        Samples::U8(v) => IntSamples::Bytes(v),
        Samples::U16(v) => IntSamples::Words(v),
        _ => {
            return Err(Error::encode(
                NAME,
                format!("cannot store {} samples", buf.sample_type()),
            ));
        }
    };
    let channels = buf.channels();
    let color_type = [COLOR_GRAY, COLOR_GRAY_ALPHA, COLOR_RGB, COLOR_RGBA][channels - 1];
    let sample_bytes = buf.format().bytes_per_channel();

    w.write_all(&MAGIC)?;
    let mut ihdr = [0u8; 13];
    ihdr[0..4].copy_from_slice(&buf.width().to_be_bytes());
    ihdr[4..8].copy_from_slice(&buf.height().to_be_bytes());
    ihdr[8] = (sample_bytes * 8) as u8;
    ihdr[9] = color_type;
    write_chunk(w, b"IHDR", &ihdr)?;
    if let Some(profile) = profile {
        write_chunk(w, b"iCCP", &iccp_bytes(profile, options.compression_level)?)?;
    }

    let width = buf.width() as usize;
    let height = buf.height() as usize;
    let row_len = width * channels * sample_bytes;
    let unit = channels * sample_bytes;
    let mut stream = Vec::with_capacity(height * (row_len + 1));
    let mut prev = vec![0u8; row_len];
    let mut cur = vec![0u8; row_len];
    let mut filtered = Vec::with_capacity(row_len);
    let mut scratch = Vec::new();
    for y in 0..height {
        match source {
            IntSamples::Bytes(v) => cur.copy_from_slice(&v[y * row_len..(y + 1) * row_len]),
            IntSamples::Words(v) => {
                let row = &v[y * width * channels..(y + 1) * width * channels];
                for (i, &sample) in row.iter().enumerate() {
                    cur[i * 2..i * 2 + 2].copy_from_slice(&sample.to_be_bytes());
                }
            }
        }
        let kind = options
            .filter
            .fixed_code()
            .unwrap_or_else(|| filter::choose(&cur, &prev, unit, &mut scratch));
        filter::apply(kind, &cur, &prev, unit, &mut filtered);
        stream.push(kind);
        stream.extend_from_slice(&filtered);
        std::mem::swap(&mut prev, &mut cur);
    }

    write_chunk(w, b"IDAT", &zlib::deflate(&stream, options.compression_level))?;
    write_chunk(w, b"IEND", &[])?;
    Ok(())
}

fn write_chunk<W: Write>(w: &mut W, kind: &[u8; 4], data: &[u8]) -> Result<()> {
    w.write_u32::<BigEndian>(data.len() as u32)?;
    w.write_all(kind)?;
    w.write_all(data)?;
    w.write_u32::<BigEndian>(crc32(&[kind, data]))?;
    Ok(())
}

fn iccp_bytes(profile: &ColorProfile, level: u8) -> Result<Vec<u8>> {
    validate_profile_name(profile.name())?;
    let mut data = Vec::with_capacity(profile.name().len() + 2 + profile.len());
    data.extend(profile.name().chars().map(|c| c as u8));
    data.push(0);
    data.push(0); // zlib method
    data.extend_from_slice(&zlib::deflate(profile.data(), level));
    Ok(data)
}

/// Profile names are 1-79 printable Latin-1 characters, with single
/// interior spaces only.
fn validate_profile_name(name: &str) -> Result<()> {
    let bad = || Error::encode(NAME, format!("invalid ICC profile name {name:?}"));
    if name.is_empty() || name.chars().count() > 79 {
        return Err(bad());
    }
    if name.starts_with(' ') || name.ends_with(' ') || name.contains("  ") {
        return Err(bad());
    }
    for c in name.chars() {
        let v = c as u32;
        if !(v == 32 || (33..=126).contains(&v) || (161..=255).contains(&v)) {
            return Err(bad());
        }
    }
    Ok(())
}

/// Whether the container stores this format without conversion.
pub(crate) fn supports(format: PixelFormat) -> bool {
    !format.is_float()
}

/// The format actually written for a given input format.
pub(crate) fn storage_format(format: PixelFormat) -> PixelFormat {
    if format.is_float() {
        format.with_sample_type(SampleType::U16)
    } else {
        format
    }
}

/// Rewrites a truncation as a decode error with position context.
fn rewrap_eof<S: Seek>(err: Error, r: &mut S) -> Error {
    match err {
        Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Error::decode(NAME, r.stream_position().unwrap_or(0), "unexpected end of stream")
        }
        other => other,
    }
}
