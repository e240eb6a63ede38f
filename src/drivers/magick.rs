//! General-purpose backend on a premultiplied `tiny-skia` pixmap.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) | `image` crate, then premultiplied into a `tiny_skia::Pixmap` |
//! | Encode → PNG, JPEG, WebP | demultiplied back to `RgbaImage`, then `image` crate |
//! | Line, any thickness | `Pixmap::stroke_path` with an anti-aliased butt-cap `Stroke` |
//!
//! Hex alpha is opacity (`ff` opaque). The stroke width travels with every
//! call, so no drawing state outlives a line.

use super::codec;
use super::geometry::clip_segment;
use super::params::{LineParams, Point, Quality};
use super::{DriverError, ImageDriver, Resource, mismatch, read_source};
use crate::color::Color;
use crate::format::Format;
use crate::handle::Image;
use crate::source::Source;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;
use tiny_skia::{ColorU8, IntSize, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

pub const NAME: &str = "magick";

/// Native resource of the magick backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MagickCanvas {
    pixmap: Pixmap,
}

impl MagickCanvas {
    /// A new canvas, transparent unless `fill` is given.
    pub fn blank(width: u32, height: u32, fill: Option<Color>) -> Result<Self, DriverError> {
        let mut pixmap = Pixmap::new(width, height).ok_or(DriverError::Allocation { width, height })?;
        if let Some(color) = fill {
            pixmap.fill(skia_color(color));
        }
        Ok(Self { pixmap })
    }

    pub fn from_image(img: DynamicImage) -> Result<Self, DriverError> {
        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();

        let mut data = Vec::with_capacity(rgba.as_raw().len());
        for px in rgba.pixels() {
            let [r, g, b, a] = px.0;
            let p = ColorU8::from_rgba(r, g, b, a).premultiply();
            data.extend_from_slice(&[p.red(), p.green(), p.blue(), p.alpha()]);
        }

        let size = IntSize::from_wh(width, height).ok_or(DriverError::Allocation { width, height })?;
        let pixmap = Pixmap::from_vec(data, size).ok_or(DriverError::Allocation { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha RGBA of one pixel, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Demultiplied copy for encoding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width(), self.height());
        for (dst, src) in out.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    /// Stroke a straight line. Endpoints are pixel centers.
    ///
    /// The segment is first clipped to the canvas grown by the stroke width,
    /// so far endpoints never reach the rasterizer.
    pub fn stroke_line(&mut self, line: &LineParams) {
        let mut paint = Paint::default();
        paint.set_color(skia_color(line.color));
        paint.anti_alias = true;

        let thickness = line.effective_thickness();
        let margin = f64::from(thickness) + 1.0;
        let center = |p: Point| (f64::from(p.x) + 0.5, f64::from(p.y) + 0.5);
        let Some(((x0, y0), (x1, y1))) = clip_segment(
            center(line.from),
            center(line.to),
            (-margin, -margin),
            (f64::from(self.width()) + margin, f64::from(self.height()) + margin),
        ) else {
            return;
        };

        let width = thickness as f32;
        let (x0, y0) = (x0 as f32, y0 as f32);
        let (x1, y1) = (x1 as f32, y1 as f32);

        if line.from == line.to {
            // A zero-length path has no direction to stroke; paint a square dot.
            let half = width / 2.0;
            if let Some(rect) = Rect::from_xywh(x0 - half, y0 - half, width, width) {
                self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
            return;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(x0, y0);
        pb.line_to(x1, y1);
        let Some(path) = pb.finish() else {
            return;
        };

        let stroke = Stroke {
            width,
            line_cap: LineCap::Butt,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn encode(&self, format: Format, quality: Quality) -> Result<Vec<u8>, DriverError> {
        codec::encode(&DynamicImage::ImageRgba8(self.to_rgba_image()), format, quality)
    }
}

fn skia_color(c: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.alpha.unwrap_or(255))
}

/// General-purpose backend. Supports every source kind and format.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagickDriver {
    quality: Quality,
}

impl MagickDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(quality: Quality) -> Self {
        Self { quality }
    }

    fn canvas<'a>(&self, resource: &'a Resource) -> Result<&'a MagickCanvas, DriverError> {
        match resource {
            Resource::Magick(c) => Ok(c),
            other => Err(mismatch(NAME, other)),
        }
    }

    fn wrap(&self, canvas: MagickCanvas, format: Format) -> Image {
        let (w, h) = (canvas.width(), canvas.height());
        Image::new(Resource::Magick(canvas), w, h, Some(format))
    }
}

impl ImageDriver for MagickDriver {
    fn name(&self) -> &str {
        NAME
    }

    fn is_available(&self) -> bool {
        Format::ALL.iter().all(|f| codec::codec_available(*f))
    }

    fn create_resource(&self, bytes: &[u8]) -> Result<Resource, DriverError> {
        Ok(Resource::Magick(MagickCanvas::from_image(codec::decode(bytes)?)?))
    }

    fn create_image_from_source(&self, source: &Source) -> Result<Image, DriverError> {
        match source {
            Source::Memory(m) => {
                let canvas = MagickCanvas::blank(m.width(), m.height(), m.color())?;
                Ok(self.wrap(canvas, Format::BASELINE))
            }
            Source::File(f) => {
                let bytes = read_source(source)?;
                let format = codec::infer_file_format(f.path(), &bytes)?;
                Ok(self.wrap(MagickCanvas::from_image(codec::decode(&bytes)?)?, format))
            }
            Source::Blob(b) => {
                let bytes = read_source(source)?;
                let format = b.declared_format().unwrap_or(Format::BASELINE);
                Ok(self.wrap(MagickCanvas::from_image(codec::decode(&bytes)?)?, format))
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
            Resource::Magick(c) => c,
            other => return Err(mismatch(NAME, other)),
        };

        canvas.stroke_line(line);

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{Driver, RasterCanvas};
    use crate::test_helpers::create_test_jpeg;

    fn driver() -> Driver {
        Driver::Magick(MagickDriver::new())
    }

    fn canvas(image: &Image) -> &MagickCanvas {
        match image.resource() {
            Some(Resource::Magick(c)) => c,
            other => panic!("expected magick resource, got {other:?}"),
        }
    }

    #[test]
    fn blank_without_color_is_transparent() {
        let image = driver()
            .create_image_from_source(&Source::memory(6, 4, None).unwrap())
            .unwrap();
        assert_eq!(canvas(&image).pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(image.format(), Some(Format::Png));
    }

    #[test]
    fn blank_with_color_fills() {
        let image = driver()
            .create_image_from_source(&Source::memory(6, 4, Some("#ffcc00")).unwrap())
            .unwrap();
        assert_eq!(canvas(&image).pixel(5, 3), Some([255, 204, 0, 255]));
    }

    #[test]
    fn opaque_pixels_survive_premultiply_roundtrip() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([10, 200, 30, 255])));
        let c = MagickCanvas::from_image(img).unwrap();
        assert_eq!(c.to_rgba_image().get_pixel(1, 1).0, [10, 200, 30, 255]);
    }

    #[test]
    fn loads_jpeg_file_with_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        create_test_jpeg(&path, 100, 50);

        let image = driver()
            .create_image_from_source(&Source::file(&path).unwrap())
            .unwrap();
        assert_eq!((image.width(), image.height()), (100, 50));
        assert_eq!(image.format(), Some(Format::Jpeg));
    }

    #[test]
    fn horizontal_stroke_covers_thickness_rows() {
        let mut image = driver()
            .create_image_from_source(&Source::memory(20, 20, Some("#000000")).unwrap())
            .unwrap();
        image
            .draw_line(&LineParams::with_hex((2, 10), (17, 10), "#ff0000", 3).unwrap())
            .unwrap();

        let c = canvas(&image);
        for y in 9..=11 {
            let [r, g, b, a] = c.pixel(10, y).unwrap();
            assert!(r >= 250 && g == 0 && b == 0 && a == 255, "row {y}");
        }
        assert_eq!(c.pixel(10, 7), Some([0, 0, 0, 255]));
        assert_eq!(c.pixel(10, 13), Some([0, 0, 0, 255]));
    }

    #[test]
    fn hex_alpha_is_opacity() {
        let mut image = driver()
            .create_image_from_source(&Source::memory(10, 10, Some("#000000")).unwrap())
            .unwrap();
        image
            .draw_line(&LineParams::with_hex((0, 5), (9, 5), "#ffffff00", 1).unwrap())
            .unwrap();
        assert_eq!(canvas(&image).pixel(5, 5), Some([0, 0, 0, 255]));
    }

    #[test]
    fn zero_length_line_paints_a_dot() {
        let mut image = driver()
            .create_image_from_source(&Source::memory(5, 5, Some("#000")).unwrap())
            .unwrap();
        image
            .draw_line(&LineParams::with_hex((2, 2), (2, 2), "#fff", 1).unwrap())
            .unwrap();
        let [r, _, _, a] = canvas(&image).pixel(2, 2).unwrap();
        assert!(r >= 250 && a == 255);
        assert_eq!(canvas(&image).pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn encodes_every_format() {
        let mut image = driver()
            .create_image_from_source(&Source::memory(8, 8, Some("#336699")).unwrap())
            .unwrap();
        for f in Format::ALL {
            image.set_format(f);
            let bytes = image.extract_data().unwrap();
            assert_eq!(codec::sniff(&bytes), Some(f));
        }
    }

    #[test]
    fn rejects_foreign_resource() {
        let foreign = Resource::Raster(RasterCanvas::blank(2, 2, [0; 4]));
        let err = MagickDriver::new().width(&foreign).unwrap_err();
        assert!(matches!(
            err,
            DriverError::ResourceMismatch { found: "raster", .. }
        ));
    }

    #[test]
    fn extreme_endpoints_are_clipped_before_stroking() {
        let mut image = driver()
            .create_image_from_source(&Source::memory(4, 4, Some("#000")).unwrap())
            .unwrap();
        for thickness in [1, 5] {
            for (from, to) in [
                ((-2_000_000_000, 1), (2_000_000_000, 1)),
                ((0, i32::MAX), (0, 0)),
                ((i32::MIN, i32::MIN), (i32::MAX, i32::MAX)),
                ((i32::MAX, i32::MAX), (i32::MAX, i32::MAX)),
            ] {
                image
                    .draw_line(&LineParams::with_hex(from, to, "#ffffff", thickness).unwrap())
                    .unwrap();
            }
        }
        assert_eq!((image.width(), image.height()), (4, 4));
        let [r, _, _, a] = canvas(&image).pixel(2, 1).unwrap();
        assert!(r >= 250 && a == 255);
    }

    #[test]
    fn line_missing_the_canvas_leaves_it_untouched() {
        let mut image = driver()
            .create_image_from_source(&Source::memory(4, 4, Some("#000")).unwrap())
            .unwrap();
        image
            .draw_line(&LineParams::with_hex((-1_000_000, -50), (1_000_000, -50), "#fff", 5).unwrap())
            .unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(canvas(&image).pixel(x, y), Some([0, 0, 0, 255]));
            }
        }
    }
}
