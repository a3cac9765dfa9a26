//! # aimg-core
//!
//! Core types for the AImg multi-format image codec engine.
//!
//! This crate holds everything the codecs in `aimg-io` share and nothing
//! that touches a byte stream:
//!
//! - [`PixelFormat`], [`SampleType`] - the channel-layout × sample-type grid
//! - [`PixelBuffer`], [`Samples`] - the canonical decoded representation
//! - [`ColorProfile`] - opaque embedded-profile container
//! - [`convert`] - the pixel format coercion layer
//! - [`Error`], [`Result`] - the engine-wide error taxonomy
//!
//! ## Design
//!
//! Sample storage is a tagged union over typed vectors rather than a single
//! erased byte array, so float round-trip bit-exactness stays explicit and
//! checkable. Buffers are validated on construction and immutable
//! afterwards; coercion produces fresh buffers.
//!
//! ## Crate structure
//!
//! ```text
//! aimg-core (this crate)
//!    ^
//!    |
//!    +-- aimg-io (detection, EXR/PNG/TGA codecs, facade)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod convert;
pub mod error;
pub mod format;
pub mod profile;

pub use buffer::{PixelBuffer, Samples};
pub use convert::convert;
pub use error::{Error, Result};
pub use format::{PixelFormat, SampleType};
pub use profile::{ColorProfile, NO_PROFILE, profile_name};
