//! OpenEXR codec.
//!
//! # Supported subset
//!
//! Single-part scanline images, version 2, with NONE, RLE, ZIPS or ZIP
//! block compression. Channel sets `R`/`G`/`B`/`A`, `R`/`G`/`B`, `R`/`G`,
//! `Y`/`A`, `Y` or any single channel decode into the matching one- to
//! four-channel buffer. Files where every channel is HALF decode to 16F
//! without any value conversion; mixed HALF/FLOAT files decode to 32F.
//! Tiled, deep, multi-part, subsampled and UINT images are rejected.
//! Reading requires only the `channels`, `compression` and `dataWindow`
//! attributes; `lineOrder` is validated when present, and other
//! attributes (`displayWindow` included) are skipped, since scanline
//! placement uses each block's own y coordinate.
//!
//! Writing always produces ZIP-compressed scanline blocks of FLOAT or
//! HALF channels, increasing line order, with a 16-line block size. A
//! block whose compressed form would be no smaller than its raw form is
//! stored raw, which the reader detects by payload length.
//!
//! The container has no color-profile concept: decode reports an absent
//! profile and encode ignores one.

mod rle;

use crate::{zlib, ImageInfo, MAX_IMAGE_BYTES};
use aimg_core::{Error, PixelBuffer, PixelFormat, Result, SampleType, Samples};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use half::f16;
use smallvec::SmallVec;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

pub(crate) const NAME: &str = "exr";
pub(crate) const EXTENSIONS: &[&str] = &["exr"];

pub(crate) const MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

// Version field flags. The long-names bit 0x400 only widens the name
// limit, which read_text permits anyway; the rest change the file
// layout and are rejected.
const FLAG_TILED: i32 = 0x200;
const FLAG_DEEP: i32 = 0x800;
const FLAG_MULTIPART: i32 = 0x1000;

const MAX_TEXT_LEN: usize = 255;
const MAX_ATTR_LEN: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None = 0,
    Rle = 1,
    ZipSingle = 2,
    Zip = 3,
}

impl Compression {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::None),
            1 => Some(Self::Rle),
            2 => Some(Self::ZipSingle),
            3 => Some(Self::Zip),
            _ => None,
        }
    }

    fn lines_per_block(self) -> usize {
        match self {
            Self::Zip => 16,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelType {
    Uint = 0,
    Half = 1,
    Float = 2,
}

impl PixelType {
    fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Uint),
            1 => Some(Self::Half),
            2 => Some(Self::Float),
            _ => None,
        }
    }

    fn bytes(self) -> usize {
        match self {
            Self::Half => 2,
            _ => 4,
        }
    }
}

#[derive(Debug, Clone)]
struct Channel {
    name: String,
    pixel_type: PixelType,
    x_sampling: i32,
    y_sampling: i32,
}

/// Parsed header attributes the decoder needs.
#[derive(Debug)]
struct Header {
    /// `x_min, y_min, x_max, y_max` of the data window.
    data_window: [i32; 4],
    compression: Compression,
    channels: SmallVec<[Channel; 4]>,
}

impl Header {
    /// Reads magic, version and the attribute list up to the empty-name
    /// terminator. The stream is left at the scanline offset table.
    fn read<R: Read + Seek>(r: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::decode(NAME, 0, "bad magic number"));
        }
        let version = r.read_i32::<LittleEndian>()?;
        if version & 0xFF != 2 {
            return Err(Error::decode(
                NAME,
                4,
                format!("unsupported version {}", version & 0xFF),
            ));
        }
        if version & FLAG_TILED != 0 {
            return Err(Error::decode(NAME, 4, "tiled images are not supported"));
        }
        if version & FLAG_DEEP != 0 {
            return Err(Error::decode(NAME, 4, "deep data is not supported"));
        }
        if version & FLAG_MULTIPART != 0 {
            return Err(Error::decode(NAME, 4, "multi-part files are not supported"));
        }

        let mut channels = None;
        let mut compression = None;
        let mut data_window = None;
        loop {
            let at = r.stream_position()?;
            let name = read_text(r, "attribute name")?;
            if name.is_empty() {
                break;
            }
            let type_name = read_text(r, "attribute type")?;
            let size = r.read_i32::<LittleEndian>()?;
            if size < 0 {
                return Err(Error::decode(NAME, at, "negative attribute size"));
            }
            match name.as_str() {
                "channels" => {
                    expect_type(&name, &type_name, "chlist", at)?;
                    let value = read_value(r, size as usize, at)?;
                    channels = Some(parse_channel_list(&value, at)?);
                }
                "compression" => {
                    expect_type(&name, &type_name, "compression", at)?;
                    let value = read_value(r, size as usize, at)?;
                    if value.len() != 1 {
                        return Err(Error::decode(NAME, at, "malformed compression attribute"));
                    }
                    compression = Some(Compression::from_byte(value[0]).ok_or_else(|| {
                        Error::decode(NAME, at, format!("unsupported compression {}", value[0]))
                    })?);
                }
                "dataWindow" => {
                    expect_type(&name, &type_name, "box2i", at)?;
                    let value = read_value(r, size as usize, at)?;
                    if value.len() != 16 {
                        return Err(Error::decode(NAME, at, "malformed dataWindow attribute"));
                    }
                    let mut window = [0i32; 4];
                    for (part, chunk) in window.iter_mut().zip(value.chunks_exact(4)) {
                        *part = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                    }
                    data_window = Some(window);
                }
                "lineOrder" => {
                    expect_type(&name, &type_name, "lineOrder", at)?;
                    let value = read_value(r, size as usize, at)?;
                    // block coordinates make the order irrelevant here,
                    // but random order (2) only applies to tiles
                    if value.len() != 1 || value[0] > 1 {
                        return Err(Error::decode(NAME, at, "malformed lineOrder attribute"));
                    }
                }
                _ => {
                    tracing::debug!(attribute = %name, size, "skipping header attribute");
                    r.seek(SeekFrom::Current(size as i64))?;
                }
            }
        }

        let missing = |what: &str| Error::decode(NAME, 8, format!("missing {what} attribute"));
        Ok(Self {
            data_window: data_window.ok_or_else(|| missing("dataWindow"))?,
            compression: compression.ok_or_else(|| missing("compression"))?,
            channels: channels.ok_or_else(|| missing("channels"))?,
        })
    }

    fn validate(&self) -> Result<()> {
        for ch in &self.channels {
            if ch.pixel_type == PixelType::Uint {
                return Err(Error::decode(
                    NAME,
                    8,
                    format!("32-bit integer channel \"{}\" is not supported", ch.name),
                ));
            }
            if ch.x_sampling != 1 || ch.y_sampling != 1 {
                return Err(Error::decode(
                    NAME,
                    8,
                    format!("subsampled channel \"{}\" is not supported", ch.name),
                ));
            }
        }
        self.dimensions()?;
        self.layout()?;
        Ok(())
    }

    fn dimensions(&self) -> Result<(u32, u32)> {
        let [x0, y0, x1, y1] = self.data_window;
        let w = x1 as i64 - x0 as i64 + 1;
        let h = y1 as i64 - y0 as i64 + 1;
        if w <= 0 || h <= 0 || w > u32::MAX as i64 || h > u32::MAX as i64 {
            return Err(Error::decode(NAME, 8, "empty or inverted data window"));
        }
        Ok((w as u32, h as u32))
    }

    /// Buffer slot for each stored channel, plus the decoded format.
    fn layout(&self) -> Result<(SmallVec<[usize; 4]>, PixelFormat)> {
        let slots = channel_slots(&self.channels)?;
        let all_half = self
            .channels
            .iter()
            .all(|c| c.pixel_type == PixelType::Half);
        let sample = if all_half { SampleType::F16 } else { SampleType::F32 };
        PixelFormat::from_parts(self.channels.len(), sample)
            .map(|format| (slots, format))
            .ok_or_else(|| Error::decode(NAME, 8, "unsupported channel count"))
    }
}

/// Maps stored channel names onto buffer slots.
///
/// A single channel of any name lands in slot 0. Beyond that only the
/// conventional `R`/`G`/`B`/`A` and `Y`/`A` names are recognized.
fn channel_slots(channels: &[Channel]) -> Result<SmallVec<[usize; 4]>> {
    let count = channels.len();
    let mut slots = SmallVec::new();
    if count == 1 {
        slots.push(0);
        return Ok(slots);
    }
    let unsupported = || {
        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        Error::decode(
            NAME,
            8,
            format!("unsupported channel set: {}", names.join(", ")),
        )
    };
    if count > 4 {
        return Err(unsupported());
    }
    let mut seen = [false; 4];
    for ch in channels {
        let slot = match (count, ch.name.as_str()) {
            (_, "R") => 0,
            (_, "G") => 1,
            (3 | 4, "B") => 2,
            (4, "A") => 3,
            (2, "Y") => 0,
            (2, "A") => 1,
            _ => return Err(unsupported()),
        };
        if seen[slot] {
            return Err(Error::decode(
                NAME,
                8,
                format!("duplicate channel \"{}\"", ch.name),
            ));
        }
        seen[slot] = true;
        slots.push(slot);
    }
    Ok(slots)
}

fn expect_type(name: &str, type_name: &str, wanted: &str, at: u64) -> Result<()> {
    if type_name == wanted {
        Ok(())
    } else {
        Err(Error::decode(
            NAME,
            at,
            format!("attribute {name} has type {type_name}, expected {wanted}"),
        ))
    }
}

/// Reads a NUL-terminated string of at most 255 bytes.
fn read_text<R: Read>(r: &mut R, what: &str) -> Result<String> {
    let mut bytes = Vec::new();
    loop {
        let byte = r.read_u8()?;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
        if bytes.len() > MAX_TEXT_LEN {
            return Err(Error::decode(NAME, 0, format!("{what} exceeds 255 bytes")));
        }
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_value<R: Read>(r: &mut R, size: usize, at: u64) -> Result<Vec<u8>> {
    if size > MAX_ATTR_LEN {
        return Err(Error::decode(NAME, at, "oversized attribute"));
    }
    let mut value = vec![0u8; size];
    r.read_exact(&mut value)?;
    Ok(value)
}

fn parse_channel_list(value: &[u8], at: u64) -> Result<SmallVec<[Channel; 4]>> {
    let mut r = Cursor::new(value);
    let mut channels = SmallVec::new();
    loop {
        let name = read_text(&mut r, "channel name")?;
        if name.is_empty() {
            break;
        }
        let pixel_type = PixelType::from_i32(r.read_i32::<LittleEndian>()?)
            .ok_or_else(|| Error::decode(NAME, at, format!("unknown pixel type in channel \"{name}\"")))?;
        let mut reserved = [0u8; 4]; // pLinear byte plus three reserved
        r.read_exact(&mut reserved)?;
        let x_sampling = r.read_i32::<LittleEndian>()?;
        let y_sampling = r.read_i32::<LittleEndian>()?;
        channels.push(Channel {
            name,
            pixel_type,
            x_sampling,
            y_sampling,
        });
    }
    if channels.is_empty() {
        return Err(Error::decode(NAME, at, "channel list is empty"));
    }
    Ok(channels)
}

/// Signature check over the first four bytes.
pub(crate) fn matches(header: &[u8]) -> bool {
    header.len() >= MAGIC.len() && header[..MAGIC.len()] == MAGIC
}

/// Reads attributes without touching the offset table or pixel data.
pub(crate) fn read_header<R: Read + Seek>(r: &mut R) -> Result<ImageInfo> {
    let header = Header::read(r).map_err(|e| rewrap_eof(e, r))?;
    header.validate()?;
    let (width, height) = header.dimensions()?;
    let (_, pixel_format) = header.layout()?;
    Ok(ImageInfo {
        width,
        height,
        pixel_format,
        profile: None,
    })
}

/// Decodes the full image into a top-left-origin buffer.
pub(crate) fn read_pixels<R: Read + Seek>(r: &mut R) -> Result<PixelBuffer> {
    read_pixels_impl(r).map_err(|e| rewrap_eof(e, r))
}

fn read_pixels_impl<R: Read + Seek>(r: &mut R) -> Result<PixelBuffer> {
    let header = Header::read(r)?;
    header.validate()?;
    let (width, height) = header.dimensions()?;
    let (slots, format) = header.layout()?;
    let width = width as usize;
    let height = height as usize;
    let nch = format.channels();

    let byte_len = width
        .saturating_mul(height)
        .saturating_mul(nch * format.bytes_per_channel());
    if byte_len > MAX_IMAGE_BYTES {
        return Err(Error::decode(NAME, 8, "image exceeds the decode size limit"));
    }

    let lines_per_block = header.compression.lines_per_block();
    let block_count = height.div_ceil(lines_per_block);
    let mut offsets = Vec::with_capacity(block_count);
    for _ in 0..block_count {
        offsets.push(r.read_u64::<LittleEndian>()?);
    }

    let bytes_per_line: usize = header
        .channels
        .iter()
        .map(|c| c.pixel_type.bytes() * width)
        .sum();
    let y_min = header.data_window[1];
    let total = width * height * nch;
    let mut half_data = Vec::new();
    let mut float_data = Vec::new();
    if format.sample_type() == SampleType::F16 {
        half_data = vec![f16::ZERO; total];
    } else {
        float_data = vec![0.0f32; total];
    }

    for &offset in &offsets {
        r.seek(SeekFrom::Start(offset))?;
        let y = r.read_i32::<LittleEndian>()?;
        let size = r.read_i32::<LittleEndian>()?;
        let row = y as i64 - y_min as i64;
        if row < 0 || row >= height as i64 {
            return Err(Error::decode(NAME, offset, "block row outside data window"));
        }
        let row = row as usize;
        if row % lines_per_block != 0 {
            return Err(Error::decode(NAME, offset, "misaligned block row"));
        }
        let lines = lines_per_block.min(height - row);
        let raw_size = bytes_per_line * lines;
        if size <= 0 || size as usize > 2 * raw_size + 512 {
            return Err(Error::decode(
                NAME,
                offset,
                format!("implausible block size {size}"),
            ));
        }
        let mut payload = vec![0u8; size as usize];
        r.read_exact(&mut payload)?;
        let raw = decode_block(header.compression, payload, raw_size, offset)?;

        let mut off = 0;
        for line in 0..lines {
            let row_base = (row + line) * width * nch;
            for (ch, &slot) in header.channels.iter().zip(&slots) {
                let seg = &raw[off..off + ch.pixel_type.bytes() * width];
                off += seg.len();
                if format.sample_type() == SampleType::F16 {
                    for (x, pair) in seg.chunks_exact(2).enumerate() {
                        half_data[row_base + x * nch + slot] =
                            f16::from_bits(u16::from_le_bytes([pair[0], pair[1]]));
                    }
                } else {
                    match ch.pixel_type {
                        PixelType::Half => {
                            for (x, pair) in seg.chunks_exact(2).enumerate() {
                                float_data[row_base + x * nch + slot] =
                                    f16::from_bits(u16::from_le_bytes([pair[0], pair[1]])).to_f32();
                            }
                        }
                        // UINT never reaches here, validate rejects it
                        _ => {
                            for (x, quad) in seg.chunks_exact(4).enumerate() {
                                float_data[row_base + x * nch + slot] =
                                    f32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]);
                            }
                        }
                    }
                }
            }
        }
    }

    let samples = if format.sample_type() == SampleType::F16 {
        Samples::F16(half_data)
    } else {
        Samples::F32(float_data)
    };
    PixelBuffer::new(width as u32, height as u32, format, samples)
}

/// Undoes block compression, yielding `raw_size` bytes of line-major
/// planar samples. A payload already at raw size was stored raw.
fn decode_block(
    compression: Compression,
    payload: Vec<u8>,
    raw_size: usize,
    at: u64,
) -> Result<Vec<u8>> {
    if payload.len() == raw_size {
        return Ok(payload);
    }
    let mut data = match compression {
        Compression::None => {
            return Err(Error::decode(NAME, at, "block size mismatch"));
        }
        Compression::Rle => {
            rle::decompress(&payload, raw_size).map_err(|m| Error::decode(NAME, at, m))?
        }
        Compression::ZipSingle | Compression::Zip => {
            zlib::inflate_exact(&payload, raw_size).map_err(|m| Error::decode(NAME, at, m))?
        }
    };
    decode_deltas(&mut data);
    merge_halves(&mut data);
    Ok(data)
}

/// Writes a ZIP-compressed scanline file at the current stream position.
///
/// The buffer must already be 16F or 32F; the facade converts via
/// [`storage_format`] beforehand.
pub(crate) fn write<W: Write + Seek>(w: &mut W, buf: &PixelBuffer) -> Result<()> {
    enum FloatSamples<'a> {
        Half(&'a [f16]),
        Float(&'a [f32]),
    }

    let (pixel_type, source) = match buf.samples() {
        Samples::F16(v) => (PixelType::Half, FloatSamples::Half(v)),
        Samples::F32(v) => (PixelType::Float, FloatSamples::Float(v)),
        _ => {
            return Err(Error::encode(
                NAME,
                format!("cannot store {} samples", buf.sample_type()),
            ));
        }
    };
    if buf.width() > i32::MAX as u32 || buf.height() > i32::MAX as u32 {
        return Err(Error::encode(NAME, "dimensions exceed the signed 32-bit range"));
    }
    let width = buf.width() as usize;
    let height = buf.height() as usize;
    let nch = buf.channels();
    let names = written_channels(nch);

    let mut header = Vec::new();
    header.extend_from_slice(&MAGIC);
    header.extend_from_slice(&2i32.to_le_bytes());
    write_attr(&mut header, "channels", "chlist", &chlist_bytes(names, pixel_type))?;
    write_attr(&mut header, "compression", "compression", &[Compression::Zip as u8])?;
    let window = box2i_bytes(width, height);
    write_attr(&mut header, "dataWindow", "box2i", &window)?;
    write_attr(&mut header, "displayWindow", "box2i", &window)?;
    write_attr(&mut header, "lineOrder", "lineOrder", &[0])?;
    write_attr(&mut header, "pixelAspectRatio", "float", &1.0f32.to_le_bytes())?;
    write_attr(&mut header, "screenWindowCenter", "v2f", &[0u8; 8])?;
    write_attr(&mut header, "screenWindowWidth", "float", &1.0f32.to_le_bytes())?;
    header.push(0);

    let lines_per_block = Compression::Zip.lines_per_block();
    let mut blocks = Vec::with_capacity(height.div_ceil(lines_per_block));
    let mut row = 0;
    while row < height {
        let lines = lines_per_block.min(height - row);
        let mut raw = Vec::with_capacity(lines * width * nch * pixel_type.bytes());
        for line in 0..lines {
            let row_base = (row + line) * width * nch;
            for &(_, slot) in names {
                match source {
                    FloatSamples::Half(v) => {
                        for x in 0..width {
                            let bits = v[row_base + x * nch + slot].to_bits();
                            raw.extend_from_slice(&bits.to_le_bytes());
                        }
                    }
                    FloatSamples::Float(v) => {
                        for x in 0..width {
                            raw.extend_from_slice(&v[row_base + x * nch + slot].to_le_bytes());
                        }
                    }
                }
            }
        }
        let mut transformed = raw.clone();
        split_halves(&mut transformed);
        encode_deltas(&mut transformed);
        let compressed = zlib::deflate(&transformed, 4);
        let payload = if compressed.len() < raw.len() { compressed } else { raw };
        blocks.push((row as i32, payload));
        row += lines;
    }

    let base = w.stream_position()?;
    let table_len = 8 * blocks.len() as u64;
    let mut offset = base + header.len() as u64 + table_len;
    w.write_all(&header)?;
    for (_, payload) in &blocks {
        w.write_u64::<LittleEndian>(offset)?;
        offset += 8 + payload.len() as u64;
    }
    for (y, payload) in &blocks {
        w.write_i32::<LittleEndian>(*y)?;
        w.write_i32::<LittleEndian>(payload.len() as i32)?;
        w.write_all(payload)?;
    }
    Ok(())
}

/// Whether the container stores this format without conversion.
pub(crate) fn supports(format: PixelFormat) -> bool {
    format.is_float()
}

/// The format actually written for a given input format.
pub(crate) fn storage_format(format: PixelFormat) -> PixelFormat {
    if format.is_float() {
        format
    } else {
        format.with_sample_type(SampleType::F16)
    }
}

/// `(name, buffer slot)` pairs in file order, which is alphabetical.
fn written_channels(count: usize) -> &'static [(&'static str, usize)] {
    match count {
        1 => &[("Y", 0)],
        2 => &[("G", 1), ("R", 0)],
        3 => &[("B", 2), ("G", 1), ("R", 0)],
        _ => &[("A", 3), ("B", 2), ("G", 1), ("R", 0)],
    }
}

fn chlist_bytes(names: &[(&str, usize)], pixel_type: PixelType) -> Vec<u8> {
    let mut value = Vec::new();
    for (name, _) in names {
        value.extend_from_slice(name.as_bytes());
        value.push(0);
        value.extend_from_slice(&(pixel_type as i32).to_le_bytes());
        value.extend_from_slice(&[0; 4]); // pLinear plus reserved
        value.extend_from_slice(&1i32.to_le_bytes());
        value.extend_from_slice(&1i32.to_le_bytes());
    }
    value.push(0);
    value
}

fn box2i_bytes(width: usize, height: usize) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    bytes[8..12].copy_from_slice(&(width as i32 - 1).to_le_bytes());
    bytes[12..16].copy_from_slice(&(height as i32 - 1).to_le_bytes());
    bytes
}

fn write_attr<W: Write>(w: &mut W, name: &str, type_name: &str, value: &[u8]) -> Result<()> {
    w.write_all(name.as_bytes())?;
    w.write_u8(0)?;
    w.write_all(type_name.as_bytes())?;
    w.write_u8(0)?;
    w.write_i32::<LittleEndian>(value.len() as i32)?;
    w.write_all(value)?;
    Ok(())
}

// Compressed blocks hold the two byte planes of each sample stream
// back to back, delta-coded. Raw blocks hold plain little-endian
// samples.

fn split_halves(data: &mut [u8]) {
    let half = data.len().div_ceil(2);
    let mut tmp = vec![0u8; data.len()];
    for (i, &byte) in data.iter().enumerate() {
        let to = if i % 2 == 0 { i / 2 } else { half + i / 2 };
        tmp[to] = byte;
    }
    data.copy_from_slice(&tmp);
}

fn merge_halves(data: &mut [u8]) {
    let half = data.len().div_ceil(2);
    let tmp = data.to_vec();
    for (i, byte) in data.iter_mut().enumerate() {
        let from = if i % 2 == 0 { i / 2 } else { half + i / 2 };
        *byte = tmp[from];
    }
}

fn encode_deltas(data: &mut [u8]) {
    for i in (1..data.len()).rev() {
        data[i] = data[i].wrapping_sub(data[i - 1]).wrapping_add(128);
    }
}

fn decode_deltas(data: &mut [u8]) {
    for i in 1..data.len() {
        data[i] = data[i - 1].wrapping_add(data[i]).wrapping_sub(128);
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

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(buf: &PixelBuffer) -> PixelBuffer {
        let mut encoded = Cursor::new(Vec::new());
        write(&mut encoded, buf).unwrap();
        let bytes = encoded.into_inner();
        assert!(matches(&bytes));
        read_pixels(&mut Cursor::new(bytes)).unwrap()
    }

    fn f32_buffer(width: u32, height: u32, format: PixelFormat) -> PixelBuffer {
        let n = (width * height) as usize * format.channels();
        let data: Vec<f32> = (0..n)
            .map(|i| (i as f32 * 0.37 - 20.0) * if i % 3 == 0 { -1.0 } else { 1.0 })
            .collect();
        PixelBuffer::new(width, height, format, Samples::F32(data)).unwrap()
    }

    #[test]
    fn rgb32f_roundtrip_is_bit_exact() {
        let buf = f32_buffer(5, 3, PixelFormat::Rgb32F);
        let back = roundtrip(&buf);
        let a: Vec<u32> = buf.as_f32().unwrap().iter().map(|v| v.to_bits()).collect();
        let b: Vec<u32> = back.as_f32().unwrap().iter().map(|v| v.to_bits()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn half_buffers_roundtrip() {
        let data: Vec<f16> = (0..4 * 2 * 4).map(|i| f16::from_f32(i as f32 / 7.0)).collect();
        let buf = PixelBuffer::new(4, 2, PixelFormat::Rgba16F, Samples::F16(data)).unwrap();
        assert_eq!(roundtrip(&buf), buf);
    }

    #[test]
    fn one_and_two_channel_layouts_roundtrip() {
        for format in [PixelFormat::R32F, PixelFormat::Rg32F] {
            let buf = f32_buffer(3, 3, format);
            let back = roundtrip(&buf);
            assert_eq!(back.format(), format);
            assert_eq!(back, buf);
        }
    }

    #[test]
    fn tall_images_span_multiple_blocks() {
        // 40 rows at 16 lines per block means three blocks
        let buf = f32_buffer(2, 40, PixelFormat::R32F);
        assert_eq!(roundtrip(&buf), buf);
    }

    #[test]
    fn header_read_reports_attributes_only() {
        let buf = f32_buffer(7, 5, PixelFormat::Rgb32F);
        let mut encoded = Cursor::new(Vec::new());
        write(&mut encoded, &buf).unwrap();
        let mut r = Cursor::new(encoded.into_inner());
        let info = read_header(&mut r).unwrap();
        assert_eq!((info.width, info.height), (7, 5));
        assert_eq!(info.pixel_format, PixelFormat::Rgb32F);
        assert!(info.profile.is_none());
    }

    /// Hand-built single-channel file with a chosen compression.
    fn craft(compression: Compression, payload: &[u8], width: usize, height: usize) -> Vec<u8> {
        let mut file = Vec::new();
        file.extend_from_slice(&MAGIC);
        file.extend_from_slice(&2i32.to_le_bytes());
        write_attr(&mut file, "channels", "chlist", &chlist_bytes(&[("Y", 0)], PixelType::Float))
            .unwrap();
        write_attr(&mut file, "compression", "compression", &[compression as u8]).unwrap();
        write_attr(&mut file, "dataWindow", "box2i", &box2i_bytes(width, height)).unwrap();
        write_attr(&mut file, "lineOrder", "lineOrder", &[0]).unwrap();
        file.push(0);
        // single block
        let offset = (file.len() + 8) as u64;
        file.extend_from_slice(&offset.to_le_bytes());
        file.extend_from_slice(&0i32.to_le_bytes());
        file.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        file.extend_from_slice(payload);
        file
    }

    #[test]
    fn decodes_uncompressed_and_rle_blocks() {
        let samples = [1.5f32, -2.0, 0.25];
        let raw: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();

        let file = craft(Compression::None, &raw, 3, 1);
        let buf = read_pixels(&mut Cursor::new(file)).unwrap();
        assert_eq!(buf.as_f32().unwrap(), &samples);

        // flat regions land as byte runs after the block transforms
        let samples = [0.0f32, 0.0, 0.0, 5.5];
        let raw: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut transformed = raw.clone();
        split_halves(&mut transformed);
        encode_deltas(&mut transformed);
        let packed = rle::compress(&transformed);
        assert!(packed.len() < raw.len());
        let file = craft(Compression::Rle, &packed, 4, 1);
        let buf = read_pixels(&mut Cursor::new(file)).unwrap();
        assert_eq!(buf.as_f32().unwrap(), &samples);
    }

    #[test]
    fn decodes_single_line_zip_blocks() {
        let samples = [0.125f32; 8];
        let raw: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut transformed = raw.clone();
        split_halves(&mut transformed);
        encode_deltas(&mut transformed);
        let packed = zlib::deflate(&transformed, 4);
        assert!(packed.len() < raw.len());
        let file = craft(Compression::ZipSingle, &packed, 8, 1);
        let buf = read_pixels(&mut Cursor::new(file)).unwrap();
        assert_eq!(buf.as_f32().unwrap(), &samples);
    }

    #[test]
    fn display_window_is_written_but_not_required() {
        let buf = f32_buffer(2, 2, PixelFormat::R32F);
        let mut encoded = Cursor::new(Vec::new());
        write(&mut encoded, &buf).unwrap();
        let bytes = encoded.into_inner();
        let needle = b"displayWindow";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));

        // craft() headers carry no displayWindow attribute at all
        let samples = [0.5f32, 1.5];
        let raw: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
        let file = craft(Compression::None, &raw, 2, 1);
        let info = read_header(&mut Cursor::new(file.clone())).unwrap();
        assert_eq!((info.width, info.height), (2, 1));
        let buf = read_pixels(&mut Cursor::new(file)).unwrap();
        assert_eq!(buf.as_f32().unwrap(), &samples);
    }

    #[test]
    fn incompressible_blocks_are_stored_raw() {
        let buf = f32_buffer(1, 1, PixelFormat::R32F);
        let mut encoded = Cursor::new(Vec::new());
        write(&mut encoded, &buf).unwrap();
        let bytes = encoded.into_inner();
        // last block: y, declared size, then four raw sample bytes
        let tail = &bytes[bytes.len() - 12..];
        assert_eq!(&tail[..8], &[0, 0, 0, 0, 4, 0, 0, 0]);
        assert_eq!(
            read_pixels(&mut Cursor::new(bytes)).unwrap().as_f32().unwrap(),
            buf.as_f32().unwrap()
        );
    }

    #[test]
    fn rejects_unsupported_layouts() {
        let buf = f32_buffer(2, 2, PixelFormat::R32F);
        let mut encoded = Cursor::new(Vec::new());
        write(&mut encoded, &buf).unwrap();
        let good = encoded.into_inner();

        // tiled flag
        let mut tiled = good.clone();
        tiled[5] |= (FLAG_TILED >> 8) as u8;
        assert!(read_header(&mut Cursor::new(tiled)).unwrap_err().is_decode_error());

        // unsupported version
        let mut v1 = good.clone();
        v1[4] = 1;
        assert!(read_header(&mut Cursor::new(v1)).unwrap_err().is_decode_error());

        // PIZ compression byte
        let raw = [0u8; 4];
        let mut file = craft(Compression::None, &raw, 1, 1);
        let name_at = file
            .windows(11)
            .position(|w| w == b"compression")
            .unwrap();
        // name NUL, type string with NUL, four size bytes, then the value
        let value_at = name_at + 12 + 12 + 4;
        assert_eq!(file[value_at], Compression::None as u8);
        file[value_at] = 4;
        assert!(read_header(&mut Cursor::new(file)).unwrap_err().is_decode_error());
    }

    #[test]
    fn rejects_unknown_channel_sets() {
        let mut file = Vec::new();
        file.extend_from_slice(&MAGIC);
        file.extend_from_slice(&2i32.to_le_bytes());
        let chlist = chlist_bytes(&[("Q", 0), ("Z", 1)], PixelType::Float);
        write_attr(&mut file, "channels", "chlist", &chlist).unwrap();
        write_attr(&mut file, "compression", "compression", &[0]).unwrap();
        write_attr(&mut file, "dataWindow", "box2i", &box2i_bytes(1, 1)).unwrap();
        file.push(0);
        let err = read_header(&mut Cursor::new(file)).unwrap_err();
        assert!(err.to_string().contains("channel set"));
    }

    #[test]
    fn truncated_stream_is_decode_error() {
        let buf = f32_buffer(4, 4, PixelFormat::Rgb32F);
        let mut encoded = Cursor::new(Vec::new());
        write(&mut encoded, &buf).unwrap();
        let bytes = encoded.into_inner();
        for cut in [10, 60, bytes.len() - 3] {
            let err = read_pixels(&mut Cursor::new(bytes[..cut].to_vec())).unwrap_err();
            assert!(err.is_decode_error(), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn delta_and_half_transforms_invert() {
        let data: Vec<u8> = (0..=255).rev().chain(0..100).collect();
        let mut t = data.clone();
        split_halves(&mut t);
        encode_deltas(&mut t);
        assert_ne!(t, data);
        decode_deltas(&mut t);
        merge_halves(&mut t);
        assert_eq!(t, data);
    }

    #[test]
    fn integer_formats_store_as_half() {
        assert_eq!(storage_format(PixelFormat::Rgb8U), PixelFormat::Rgb16F);
        assert_eq!(storage_format(PixelFormat::Rgba16U), PixelFormat::Rgba16F);
        assert_eq!(storage_format(PixelFormat::R32F), PixelFormat::R32F);
        assert!(supports(PixelFormat::Rg16F));
        assert!(!supports(PixelFormat::Rgb8U));
    }
}
