//! Codec glue shared by the built-in drivers.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff | `image::guess_format` |
//! | Decode (PNG, JPEG, WebP) | `image::load_from_memory` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha flattened, quality from [`Quality`]) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder::new_lossless` |
//!
//! Drivers keep their own native resources; this module only turns bytes into
//! a [`DynamicImage`] and back.

use super::DriverError;
use super::params::Quality;
use crate::format::Format;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;

/// Whether the compiled-in codecs can both read and write `format`.
///
/// This is the environment probe behind every driver's `is_available`. It
/// only inspects static feature flags, so it is free of side effects.
pub fn codec_available(format: Format) -> bool {
    let f = format.image_format();
    f.reading_enabled() && f.writing_enabled()
}

/// Decode an encoded image held in memory.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, DriverError> {
    if bytes.is_empty() {
        return Err(DriverError::Decode("empty input".into()));
    }
    image::load_from_memory(bytes).map_err(|e| DriverError::Decode(e.to_string()))
}

/// Detect the format of encoded bytes, if it is one we support.
pub fn sniff(bytes: &[u8]) -> Option<Format> {
    image::guess_format(bytes)
        .ok()
        .and_then(Format::from_image_format)
}

/// Format of a file: extension first, content sniffing second.
pub fn infer_file_format(path: &Path, bytes: &[u8]) -> Result<Format, DriverError> {
    Format::from_extension(path)
        .ok()
        .or_else(|| sniff(bytes))
        .ok_or_else(|| DriverError::UnsupportedFormat {
            driver: "codec".into(),
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string(),
        })
}

/// Encode `img` as `format`.
pub fn encode(img: &DynamicImage, format: Format, quality: Quality) -> Result<Vec<u8>, DriverError> {
    let mut buf = Vec::new();
    let result = match format {
        Format::Png => img.write_with_encoder(PngEncoder::new(&mut buf)),
        Format::Jpeg => {
            // JPEG has no alpha channel; flatten before handing it to the encoder.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(
                &mut buf,
                quality.value() as u8,
            ))
        }
        Format::WebP => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        }
    };
    result.map_err(|e| DriverError::Encode(format!("{} encode failed: {}", format, e)))?;
    Ok(buf)
}

/// Write already-encoded bytes, wrapping the I/O failure with its path.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), DriverError> {
    std::fs::write(path, bytes).map_err(|e| DriverError::SaveFailed {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}

/// A blank RGBA canvas filled with `fill`.
pub fn blank_canvas(width: u32, height: u32, fill: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(fill))
}
