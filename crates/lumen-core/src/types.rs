//! Core data types returned by pipeline queries.

use serde::{Deserialize, Serialize};

/// Header-level facts about an input image.
///
/// Produced without decoding pixel data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Decoder used ("jpeg", "png", "webp", "raw", ...)
    pub format: String,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Colour space interpretation ("srgb", "b-w", "rgb16", "grey16", ...)
    pub space: String,

    /// Number of bands (3 for sRGB, 4 with alpha)
    pub channels: u8,

    /// Sample format ("uchar", "ushort", "float")
    pub depth: String,

    /// Pixels per inch, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<u32>,

    /// An embedded ICC profile is present
    pub has_profile: bool,

    /// An alpha channel is present
    pub has_alpha: bool,

    /// EXIF orientation (1-8)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u32>,

    /// Raw EXIF block
    #[serde(skip)]
    pub exif: Option<Vec<u8>>,

    /// Raw ICC profile
    #[serde(skip)]
    pub icc: Option<Vec<u8>>,
}

impl ImageMetadata {
    /// Total pixel count.
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
