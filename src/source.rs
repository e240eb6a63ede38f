//! Where image bytes come from.
//!
//! Three variants, all validated at construction so that bad input fails
//! before any driver sees it:
//!
//! - [`FileSource`] — a readable path on disk. Identifier: the path.
//! - [`BlobSource`] — base64 text (plain or `data:` URI) or raw bytes.
//!   Identifier: caller-supplied, or the SHA-256 of the payload.
//! - [`MemorySource`] — a blank canvas description (width, height, optional
//!   fill). Identifier: `memory:{w}x{h}:{color|none}`, so identical
//!   descriptions share a key.
//!
//! Byte production is lazy: base64 is decoded and blank canvases are rendered
//! only when [`Source::stream`] is called. Most drivers build blank canvases
//! natively and never ask for the bytes.

use crate::color::{Color, ColorError};
use crate::drivers::Quality;
use crate::drivers::codec;
use crate::format::Format;
use base64::{Engine as _, engine::general_purpose};
use image::DynamicImage;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source not found or not readable: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("Invalid canvas dimensions {width}x{height}: both must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },
    #[error(transparent)]
    InvalidColor(#[from] ColorError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type tag of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    File,
    Blob,
    Memory,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::File => "file",
            SourceKind::Blob => "blob",
            SourceKind::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Fails fast if the path is missing, not a regular file, or cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let is_file = std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
        if !is_file || File::open(path).is_err() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone)]
enum Payload {
    /// Validated base64 text, decoded on demand.
    Base64(String),
    Raw(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct BlobSource {
    payload: Payload,
    mime_type: String,
    identifier: String,
}

impl BlobSource {
    /// Accepts plain base64 or a `data:<mime>;base64,<data>` URI.
    ///
    /// The mime type is taken from the URI when present, otherwise
    /// `application/octet-stream`. Invalid base64 is rejected here.
    pub fn from_base64(input: &str, identifier: Option<String>) -> Result<Self, SourceError> {
        let normalized = input.trim();
        let (mime_type, data) = match split_data_uri(normalized) {
            Some((mime, data)) => (mime.to_ascii_lowercase(), data),
            None => (OCTET_STREAM.to_string(), normalized),
        };

        general_purpose::STANDARD
            .decode(data)
            .map_err(|e| SourceError::InvalidEncoding(format!("invalid base64: {}", e)))?;

        let identifier = identifier.unwrap_or_else(|| sha256_hex(data.as_bytes()));
        Ok(Self {
            payload: Payload::Base64(data.to_string()),
            mime_type,
            identifier,
        })
    }

    /// Wrap raw encoded bytes. `mime_type` defaults to `application/octet-stream`.
    pub fn from_bytes(bytes: Vec<u8>, mime_type: Option<&str>, identifier: Option<String>) -> Self {
        let identifier = identifier.unwrap_or_else(|| sha256_hex(&bytes));
        Self {
            payload: Payload::Raw(bytes),
            mime_type: mime_type.unwrap_or(OCTET_STREAM).to_ascii_lowercase(),
            identifier,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Format declared by the mime type, if it names one we support.
    pub fn declared_format(&self) -> Option<Format> {
        Format::from_mime(&self.mime_type).ok()
    }

    /// Decoded payload bytes.
    pub fn contents(&self) -> Result<Vec<u8>, SourceError> {
        match &self.payload {
            Payload::Raw(bytes) => Ok(bytes.clone()),
            Payload::Base64(data) => general_purpose::STANDARD
                .decode(data)
                .map_err(|e| SourceError::InvalidEncoding(format!("invalid base64: {}", e))),
        }
    }
}

/// Split `data:<mime>;base64,<data>` into its parts.
fn split_data_uri(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix("data:")?;
    let marker = rest.find(";base64,")?;
    let mime = &rest[..marker];
    if mime.is_empty() {
        return None;
    }
    Some((mime, &rest[marker + ";base64,".len()..]))
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySource {
    width: u32,
    height: u32,
    color_spec: Option<String>,
    color: Option<Color>,
}

impl MemorySource {
    /// Describe a blank canvas. Zero dimensions and bad colors are rejected here.
    pub fn new(width: u32, height: u32, color: Option<&str>) -> Result<Self, SourceError> {
        if width == 0 || height == 0 {
            return Err(SourceError::InvalidDimensions { width, height });
        }
        let parsed = color.map(str::parse::<Color>).transpose()?;
        Ok(Self {
            width,
            height,
            color_spec: color.map(str::to_string),
            color: parsed,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Render the canvas as PNG: opaque black, or the fill color when given.
    fn render_png(&self) -> Result<Vec<u8>, SourceError> {
        let fill = self.color.map_or([0, 0, 0, 255], Color::to_opaque_rgba);
        let canvas = DynamicImage::ImageRgba8(codec::blank_canvas(self.width, self.height, fill));
        codec::encode(&canvas, Format::Png, Quality::default())
            .map_err(|e| SourceError::Io(std::io::Error::other(e.to_string())))
    }
}

/// An origin of image bytes, or a blank canvas description.
#[derive(Debug, Clone)]
pub enum Source {
    File(FileSource),
    Blob(BlobSource),
    Memory(MemorySource),
}

impl Source {
    pub fn file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        FileSource::new(path).map(Source::File)
    }

    pub fn base64(input: &str) -> Result<Self, SourceError> {
        BlobSource::from_base64(input, None).map(Source::Blob)
    }

    pub fn bytes(bytes: Vec<u8>, mime_type: Option<&str>) -> Self {
        Source::Blob(BlobSource::from_bytes(bytes, mime_type, None))
    }

    pub fn memory(width: u32, height: u32, color: Option<&str>) -> Result<Self, SourceError> {
        MemorySource::new(width, height, color).map(Source::Memory)
    }

    /// A readable byte stream over the source's encoded data.
    pub fn stream(&self) -> Result<Box<dyn Read + Send>, SourceError> {
        match self {
            Source::File(f) => {
                let file = File::open(&f.path)?;
                Ok(Box::new(BufReader::new(file)))
            }
            Source::Blob(b) => Ok(Box::new(Cursor::new(b.contents()?))),
            Source::Memory(m) => Ok(Box::new(Cursor::new(m.render_png()?))),
        }
    }

    pub fn identifier(&self) -> String {
        match self {
            Source::File(f) => f.path.display().to_string(),
            Source::Blob(b) => b.identifier.clone(),
            Source::Memory(m) => format!(
                "memory:{}x{}:{}",
                m.width,
                m.height,
                m.color_spec.as_deref().unwrap_or("none")
            ),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Source::File(_) => SourceKind::File,
            Source::Blob(_) => SourceKind::Blob,
            Source::Memory(_) => SourceKind::Memory,
        }
    }
}
