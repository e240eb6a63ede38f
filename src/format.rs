//! Supported image formats and their identity metadata.
//!
//! The set is fixed: `png`, `jpeg` (alias `jpg`) and `webp`. Adding a format
//! means adding a variant here, a reader/writer pair in [`io`](crate::io), and
//! codec support in at least one driver.

use image::ImageFormat;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Unsupported image format: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Png,
    Jpeg,
    WebP,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Png, Format::Jpeg, Format::WebP];

    /// Lossless baseline used for blank canvases and undeclared blobs.
    pub const BASELINE: Format = Format::Png;

    /// Look a format up by name, case-insensitively. `jpg` is accepted for `jpeg`.
    pub fn from_name(name: &str) -> Result<Self, FormatError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Format::Png),
            "jpeg" | "jpg" => Ok(Format::Jpeg),
            "webp" => Ok(Format::WebP),
            _ => Err(FormatError::Unsupported(name.to_string())),
        }
    }

    pub fn from_mime(mime: &str) -> Result<Self, FormatError> {
        let base = mime.split(';').next().unwrap_or("").trim();
        Self::ALL
            .into_iter()
            .find(|f| base.eq_ignore_ascii_case(f.mime_type()))
            .ok_or_else(|| FormatError::Unsupported(mime.to_string()))
    }

    pub fn from_extension(path: &Path) -> Result<Self, FormatError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_name(ext)
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpeg => "jpeg",
            Format::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Format::Png => "image/png",
            Format::Jpeg => "image/jpeg",
            Format::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpeg => "jpg",
            Format::WebP => "webp",
        }
    }

    pub(crate) fn image_format(self) -> ImageFormat {
        match self {
            Format::Png => ImageFormat::Png,
            Format::Jpeg => ImageFormat::Jpeg,
            Format::WebP => ImageFormat::WebP,
        }
    }

    pub(crate) fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Format::Png),
            ImageFormat::Jpeg => Some(Format::Jpeg),
            ImageFormat::WebP => Some(Format::WebP),
            _ => None,
        }
    }
}

impl FromStr for Format {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
