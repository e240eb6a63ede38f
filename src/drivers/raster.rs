//! Raster backend: a plain RGBA pixel buffer with GD-style drawing state.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) | `image` crate via [`codec`](super::codec) |
//! | Encode → PNG, JPEG | `image` crate via [`codec`](super::codec) |
//! | Encode → WebP | not supported, fails with `UnsupportedFormat` |
//! | Line, thickness 1 | Bresenham ([`geometry::bresenham`](super::geometry::bresenham)) |
//! | Line, thickness > 1 | filled stroke footprint ([`StrokeFootprint`]) |
//! | Blending | straight-alpha over ([`compose`](super::compose)) |
//!
//! ## Alpha
//!
//! Hex alpha is read as **transparency**: `#rrggbb00` is opaque, `#rrggbbff`
//! is fully transparent. It is rescaled to the native 7-bit range `0..=127`
//! (`round(127 * a / 255)`, 0 = opaque) by [`RasterColor`], and only turned
//! into 8-bit coverage when a pixel is blended.
//!
//! ## Stroke state
//!
//! Thickness is stored on the [`RasterCanvas`] itself, not passed per call, so
//! every line draw sets it and resets it to 1 afterwards.

use super::codec;
use super::compose::blend_over;
use super::geometry::{StrokeFootprint, bresenham, clip_to_canvas};
use super::params::{LineParams, Point, Quality};
use super::{DriverError, ImageDriver, Resource, mismatch, read_source, unsupported_format};
use crate::color::Color;
use crate::format::Format;
use crate::handle::Image;
use crate::source::Source;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;

pub const NAME: &str = "raster";

/// Formats this backend can encode.
const ENCODES: &[Format] = &[Format::Png, Format::Jpeg];

/// Largest native alpha value (fully transparent).
const ALPHA_MAX: u8 = 127;

/// Color in the backend's native representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0 (opaque) ..= 127 (transparent).
    pub alpha: u8,
}

impl RasterColor {
    /// 8-bit RGBA with alpha as coverage (255 = opaque).
    pub fn to_rgba(self) -> Rgba<u8> {
        let opacity = 255.0 - (self.alpha as f32 * 255.0 / ALPHA_MAX as f32).round();
        Rgba([self.r, self.g, self.b, opacity as u8])
    }
}

impl From<Color> for RasterColor {
    fn from(c: Color) -> Self {
        let alpha = c
            .alpha
            .map(|a| (ALPHA_MAX as f32 * a as f32 / 255.0).round() as u8)
            .unwrap_or(0);
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            alpha,
        }
    }
}

/// Native resource of the raster backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterCanvas {
    pixels: RgbaImage,
    thickness: u32,
}

impl RasterCanvas {
    pub fn blank(width: u32, height: u32, fill: [u8; 4]) -> Self {
        Self {
            pixels: codec::blank_canvas(width, height, fill),
            thickness: 1,
        }
    }

    pub fn from_image(img: DynamicImage) -> Self {
        Self {
            pixels: img.into_rgba8(),
            thickness: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn thickness(&self) -> u32 {
        self.thickness
    }

    pub fn set_thickness(&mut self, thickness: u32) {
        self.thickness = thickness.max(1);
    }

    /// Overwrite every pixel with `color` (no blending).
    pub fn fill(&mut self, color: RasterColor) {
        let rgba = color.to_rgba();
        for px in self.pixels.pixels_mut() {
            *px = rgba;
        }
    }

    /// Draw a line with the canvas' current thickness.
    pub fn line(&mut self, from: Point, to: Point, color: RasterColor) {
        let rgba = color.to_rgba();

        if self.thickness == 1 {
            let Some((from, to)) = clip_to_canvas(from, to, self.width(), self.height()) else {
                return;
            };
            for p in bresenham(from, to) {
                self.plot(p.x, p.y, rgba);
            }
            return;
        }

        let footprint = StrokeFootprint::new(&LineParams::new(from, to, Color::BLACK, self.thickness));
        let (min_x, min_y, max_x, max_y) = footprint.bounds();
        let max_x = max_x.min(self.width() as i32 - 1);
        let max_y = max_y.min(self.height() as i32 - 1);

        for y in min_y.max(0)..=max_y {
            for x in min_x.max(0)..=max_x {
                if footprint.covers(x, y) {
                    self.plot(x, y, rgba);
                }
            }
        }
    }

    fn plot(&mut self, x: i32, y: i32, rgba: Rgba<u8>) {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return;
        }
        blend_over(self.pixels.get_pixel_mut(x as u32, y as u32), rgba);
    }

    fn encode(&self, format: Format, quality: Quality) -> Result<Vec<u8>, DriverError> {
        if !ENCODES.contains(&format) {
            return Err(unsupported_format(NAME, format));
        }
        codec::encode(&DynamicImage::ImageRgba8(self.pixels.clone()), format, quality)
    }
}

/// Raster backend. See the [module docs](self) for the operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDriver {
    quality: Quality,
}

impl RasterDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(quality: Quality) -> Self {
        Self { quality }
    }

    fn canvas<'a>(&self, resource: &'a Resource) -> Result<&'a RasterCanvas, DriverError> {
        match resource {
            Resource::Raster(c) => Ok(c),
            other => Err(mismatch(NAME, other)),
        }
    }

    fn wrap(&self, canvas: RasterCanvas, format: Format) -> Image {
        let (w, h) = (canvas.width(), canvas.height());
        Image::new(Resource::Raster(canvas), w, h, Some(format))
    }
}

impl ImageDriver for RasterDriver {
    fn name(&self) -> &str {
        NAME
    }

    fn is_available(&self) -> bool {
        ENCODES.iter().all(|f| codec::codec_available(*f))
    }

    fn create_resource(&self, bytes: &[u8]) -> Result<Resource, DriverError> {
        Ok(Resource::Raster(RasterCanvas::from_image(codec::decode(bytes)?)))
    }

    fn create_image_from_source(&self, source: &Source) -> Result<Image, DriverError> {
        match source {
            Source::Memory(m) => {
                // Fresh canvases start opaque black.
                let mut canvas = RasterCanvas::blank(m.width(), m.height(), [0, 0, 0, 255]);
                if let Some(color) = m.color() {
                    canvas.fill(color.into());
                }
                Ok(self.wrap(canvas, Format::BASELINE))
            }
            Source::File(f) => {
                let bytes = read_source(source)?;
                let format = codec::infer_file_format(f.path(), &bytes)?;
                Ok(self.wrap(RasterCanvas::from_image(codec::decode(&bytes)?), format))
            }
            Source::Blob(b) => {
                let bytes = read_source(source)?;
                let format = b.declared_format().unwrap_or(Format::BASELINE);
                Ok(self.wrap(RasterCanvas::from_image(codec::decode(&bytes)?), format))
            }
        }
    }

    fn width(&self, resource: &Resource) -> Result<u32, DriverError> {
        Ok(self.canvas(resource)?.width())
    }

    fn height(&self, resource: &Resource) -> Result<u32, DriverError> {
        Ok(self.canvas(resource)?.height())
    }

    fn draw_line(&self, image: &mut Image, line: &LineParams) -> Result<(), DriverError> {
        let resource = image.resource_mut().ok_or(DriverError::ResourceUnavailable)?;
        let canvas = match resource {
            Resource::Raster(c) => c,
            other => return Err(mismatch(NAME, other)),
        };

        canvas.set_thickness(line.effective_thickness());
        canvas.line(line.from, line.to, line.color.into());
        canvas.set_thickness(1);

        let (w, h) = (canvas.width(), canvas.height());
        image.set_dimensions(w, h);
        Ok(())
    }

    fn extract_data(&self, image: &Image) -> Result<Vec<u8>, DriverError> {
        let resource = image.resource().ok_or(DriverError::ResourceUnavailable)?;
        let format = image.format().unwrap_or(Format::BASELINE);
        self.canvas(resource)?.encode(format, self.quality)
    }

    fn save_image(&self, resource: &Resource, path: &Path, format: Format) -> Result<(), DriverError> {
        let bytes = self.canvas(resource)?.encode(format, self.quality)?;
        codec::write_file(path, &bytes)
    }
}
