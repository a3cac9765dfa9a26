//! # aimg-io
//!
//! Image codec engine with content-based format detection.
//!
//! This crate reads and writes still images for asset pipelines:
//!
//! - **EXR** - OpenEXR scanlines for HDR/linear data (16f, 32f)
//! - **PNG** - Lossless integer images with alpha and ICC profiles (8, 16)
//! - **TGA** - Truevision TGA, palette/truecolor/grayscale (8)
//!
//! # Architecture
//!
//! - [`detect`] - Sniffs the format from leading bytes; names never matter
//! - [`Image`] - Open an image, read its attributes, decode pixels lazily
//! - [`encode`] - Write a [`PixelBuffer`] into any supported container
//!
//! Decoded pixels always land in a [`PixelBuffer`]: row-major, top-left
//! origin, channels interleaved per pixel. [`convert`] moves buffers
//! between pixel formats.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use aimg_io::{open_memory, encode_to_vec, FileFormat, PixelFormat};
//!
//! let mut image = open_memory(&bytes)?;
//! println!("{}x{} {}", image.width(), image.height(), image.format());
//!
//! // Decode in the file's native format, or ask for another one.
//! let pixels = image.decode_as(PixelFormat::Rgba8U)?;
//!
//! let out = encode_to_vec(&pixels, FileFormat::Png, None, None)?;
//! ```
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Pixel formats | Profile |
//! |--------|------|-------|---------------|---------|
//! | EXR | Yes | Yes | 16f, 32f | No |
//! | PNG | Yes | Yes | 8, 16 integer | ICC via iCCP |
//! | TGA | Yes | Yes | 8 integer | No |
//!
//! Buffers a container cannot hold are converted on encode; see
//! [`FileFormat::storage_format`].
//!
//! # Dependencies
//!
//! - [`aimg-core`] - Pixel buffers, formats, conversion
//! - [`miniz_oxide`] / [`zune-inflate`] - Deflate for PNG and EXR
//! - [`half`] - 16-bit floats for EXR
//!
//! # Feature Flags
//!
//! - `exr` - OpenEXR support (default)
//! - `png` - PNG support (default)
//! - `tga` - TGA support (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod registry;

#[cfg(any(feature = "exr", feature = "png"))]
mod zlib;

#[cfg(feature = "exr")]
mod exr;

#[cfg(feature = "png")]
mod png;

#[cfg(feature = "tga")]
mod tga;

pub use aimg_core::{
    convert, profile_name, ColorProfile, Error, PixelBuffer, PixelFormat, Result, SampleType,
    Samples, NO_PROFILE,
};
pub use detect::{detect, FileFormat};
#[cfg(feature = "png")]
pub use png::{FilterStrategy, PngEncodeOptions};

use std::borrow::Cow;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

/// Cap on decoded pixel allocations. A corrupt header can claim absurd
/// dimensions; no real asset comes close to this.
pub(crate) const MAX_IMAGE_BYTES: usize = 1 << 30;

/// Attributes read from an image header.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format the stored data decodes to.
    pub pixel_format: PixelFormat,
    /// Embedded color profile, if the container carries one.
    pub profile: Option<ColorProfile>,
}

/// An opened image: format detected, header parsed, pixels not yet decoded.
///
/// Opening only reads the header, so inspecting attributes of a large file
/// stays cheap. [`Image::decode`] reads the pixel data on demand and can be
/// repeated; the image rewinds its reader itself.
#[derive(Debug)]
pub struct Image<R> {
    reader: R,
    start: u64,
    format: FileFormat,
    info: ImageInfo,
}

impl<R: Read + Seek> Image<R> {
    /// Detects the format at the reader's current position and parses the
    /// header attributes.
    pub fn open(mut reader: R) -> Result<Self> {
        let start = reader.stream_position()?;
        let format = detect(&mut reader)?;
        let info = read_header(&mut reader, format)?;
        Ok(Self { reader, start, format, info })
    }

    /// Detected file format.
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Header attributes.
    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.info.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Pixel format the stored data decodes to.
    pub fn pixel_format(&self) -> PixelFormat {
        self.info.pixel_format
    }

    /// Embedded color profile, if any.
    pub fn profile(&self) -> Option<&ColorProfile> {
        self.info.profile.as_ref()
    }

    /// Name of the embedded profile, or [`NO_PROFILE`] when there is none.
    pub fn profile_name(&self) -> &str {
        profile_name(self.info.profile.as_ref())
    }

    /// Decodes the pixel data in the file's native format.
    pub fn decode(&mut self) -> Result<PixelBuffer> {
        self.reader.seek(SeekFrom::Start(self.start))?;
        match self.format {
            #[cfg(feature = "exr")]
            FileFormat::Exr => exr::read_pixels(&mut self.reader),

            #[cfg(feature = "png")]
            FileFormat::Png => png::read_pixels(&mut self.reader),

            #[cfg(feature = "tga")]
            FileFormat::Tga => tga::read_pixels(&mut self.reader),

            #[allow(unreachable_patterns)]
            _ => Err(Error::UnsupportedFiletype),
        }
    }

    /// Decodes the pixel data and converts it to `format`.
    ///
    /// Asking for the native format is a plain decode. Anything else goes
    /// through [`convert`], which fails with an unsupported-coercion error
    /// for pairs it does not define.
    pub fn decode_as(&mut self, format: PixelFormat) -> Result<PixelBuffer> {
        let native = self.decode()?;
        if native.format() == format {
            return Ok(native);
        }
        convert(&native, format)
    }

    /// Consumes the image, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn read_header<R: Read + Seek>(reader: &mut R, format: FileFormat) -> Result<ImageInfo> {
    match format {
        #[cfg(feature = "exr")]
        FileFormat::Exr => exr::read_header(reader),

        #[cfg(feature = "png")]
        FileFormat::Png => png::read_header(reader),

        #[cfg(feature = "tga")]
        FileFormat::Tga => tga::read_header(reader),

        #[allow(unreachable_patterns)]
        _ => Err(Error::UnsupportedFiletype),
    }
}

/// Per-format encoder options.
///
/// [`encode`] is strict: options are accepted only by the format they are
/// for, and anything else fails the encode rather than being ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeOptions {
    /// PNG compression and filtering knobs.
    #[cfg(feature = "png")]
    Png(PngEncodeOptions),
}

/// Encodes `buffer` into `format`, writing at the stream's current position.
///
/// When the container cannot store the buffer's pixel format directly, the
/// buffer is converted to the container's storage format first; see
/// [`FileFormat::storage_format`]. `profile` is embedded where the format
/// supports it (PNG) and dropped otherwise.
pub fn encode<W: Write + Seek>(
    writer: &mut W,
    buffer: &PixelBuffer,
    format: FileFormat,
    profile: Option<&ColorProfile>,
    options: Option<&EncodeOptions>,
) -> Result<()> {
    match format {
        #[cfg(feature = "exr")]
        FileFormat::Exr => {
            reject_options(options, format)?;
            note_dropped_profile(profile, format);
            let staged = stage(buffer, exr::storage_format(buffer.format()))?;
            exr::write(writer, &staged)
        }

        #[cfg(feature = "png")]
        FileFormat::Png => {
            let opts = match options {
                Some(EncodeOptions::Png(o)) => o.clone(),
                None => PngEncodeOptions::default(),
            };
            let staged = stage(buffer, png::storage_format(buffer.format()))?;
            png::write(writer, &staged, profile, &opts)
        }

        #[cfg(feature = "tga")]
        FileFormat::Tga => {
            reject_options(options, format)?;
            note_dropped_profile(profile, format);
            let staged = stage(buffer, tga::storage_format(buffer.format()))?;
            tga::write(writer, &staged)
        }

        #[allow(unreachable_patterns)]
        _ => Err(Error::UnsupportedFiletype),
    }
}

fn stage(buffer: &PixelBuffer, storage: PixelFormat) -> Result<Cow<'_, PixelBuffer>> {
    if buffer.format() == storage {
        Ok(Cow::Borrowed(buffer))
    } else {
        Ok(Cow::Owned(convert(buffer, storage)?))
    }
}

fn reject_options(options: Option<&EncodeOptions>, format: FileFormat) -> Result<()> {
    if options.is_some() {
        return Err(Error::encode(
            format.name(),
            "encoder options are not accepted by this format",
        ));
    }
    Ok(())
}

fn note_dropped_profile(profile: Option<&ColorProfile>, format: FileFormat) {
    if let Some(profile) = profile {
        tracing::debug!(
            format = format.name(),
            profile = profile.name(),
            "container cannot embed a color profile; dropping it"
        );
    }
}

/// Opens an image held in memory.
pub fn open_memory(data: &[u8]) -> Result<Image<Cursor<&[u8]>>> {
    Image::open(Cursor::new(data))
}

/// Decodes an in-memory image straight to pixels.
pub fn decode_memory(data: &[u8]) -> Result<PixelBuffer> {
    let mut image = open_memory(data)?;
    image.decode()
}

/// Encodes `buffer` into a fresh byte vector.
pub fn encode_to_vec(
    buffer: &PixelBuffer,
    format: FileFormat,
    profile: Option<&ColorProfile>,
    options: Option<&EncodeOptions>,
) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    encode(&mut cursor, buffer, format, profile, options)?;
    Ok(cursor.into_inner())
}
