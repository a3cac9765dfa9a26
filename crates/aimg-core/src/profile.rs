//! Embedded color profile container.
//!
//! A profile is an opaque byte payload (typically an ICC profile) plus a
//! human-readable name; the engine never interprets the bytes, it only
//! carries them from the container that declared them to the container
//! being written. Codecs without a profile concept (EXR, TGA) report an
//! absent profile and ignore one on encode.

use std::fmt;

/// Name reported for an image that carries no color profile.
///
/// The absence of a profile is modeled as `Option::None`, never as an empty
/// payload; this sentinel only appears at the name-query boundary. See
/// [`profile_name`].
pub const NO_PROFILE: &str = "no_profile";

/// An embedded color profile: opaque payload plus name.
///
/// # Round-trip invariant
///
/// Encoding an image with a profile and decoding the result yields a
/// byte-identical payload and an identical name.
///
/// # Example
///
/// ```rust
/// use aimg_core::profile::{ColorProfile, profile_name, NO_PROFILE};
///
/// let profile = ColorProfile::new("ICC profile", vec![0u8; 560]);
/// assert_eq!(profile.name(), "ICC profile");
/// assert_eq!(profile.data().len(), 560);
///
/// assert_eq!(profile_name(Some(&profile)), "ICC profile");
/// assert_eq!(profile_name(None), NO_PROFILE);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ColorProfile {
    name: String,
    data: Vec<u8>,
}

impl ColorProfile {
    /// Creates a profile from a name and payload.
    #[inline]
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Profile name as declared by the source container.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw profile payload.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the profile, returning the payload.
    #[inline]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for ColorProfile {
    // Payloads run to hundreds of bytes; show the length instead.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorProfile")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Name to report for an optional profile: the profile's own name, or
/// [`NO_PROFILE`] when absent.
#[inline]
pub fn profile_name(profile: Option<&ColorProfile>) -> &str {
    profile.map_or(NO_PROFILE, |p| p.name())
}
