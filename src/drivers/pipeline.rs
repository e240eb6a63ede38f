//! Streaming-pipeline backend with immutable images.
//!
//! A [`PipelineImage`] is never mutated after construction. Drawing builds a
//! new image and swaps it into the handle:
//!
//! 1. allocate a fully transparent overlay the size of the base image
//! 2. draw one 1-pixel line per perpendicular offset
//!    ([`parallel_offsets`](super::geometry::parallel_offsets)), all in the
//!    requested color
//! 3. composite the overlay over the base ("over" operator)
//! 4. replace the handle's resource with the composite and refresh its size
//!
//! Only file sources are accepted; blob and memory sources fail with
//! `UnsupportedSource` before anything is allocated. Hex alpha is opacity.

use super::codec;
use super::compose::composite_over;
use super::geometry::{bresenham, clip_to_canvas, parallel_offsets};
use super::params::{LineParams, Quality};
use super::{DriverError, ImageDriver, Resource, mismatch, read_source};
use crate::format::Format;
use crate::handle::Image;
use crate::source::Source;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;
use std::sync::Arc;

pub const NAME: &str = "pipeline";

/// Immutable, cheaply clonable image of the pipeline backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineImage(Arc<RgbaImage>);

impl PipelineImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self(Arc::new(pixels))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.0
    }

    /// New image with `overlay` composited over this one.
    pub fn composite(&self, overlay: &RgbaImage) -> Self {
        Self::new(composite_over(&self.0, overlay))
    }
}

/// Transparent overlay holding every parallel 1-pixel line of `line`.
fn line_overlay(width: u32, height: u32, line: &LineParams) -> RgbaImage {
    let mut overlay = RgbaImage::new(width, height);
    let rgba = Rgba(line.color.to_opaque_rgba());

    for (dx, dy) in parallel_offsets(line) {
        let shifted = line.offset(dx, dy);
        let Some((from, to)) = clip_to_canvas(shifted.from, shifted.to, width, height) else {
            continue;
        };
        for p in bresenham(from, to) {
            overlay.put_pixel(p.x as u32, p.y as u32, rgba);
        }
    }
    overlay
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineDriver {
    quality: Quality,
}

impl PipelineDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(quality: Quality) -> Self {
        Self { quality }
    }

    fn image<'a>(&self, resource: &'a Resource) -> Result<&'a PipelineImage, DriverError> {
        match resource {
            Resource::Pipeline(p) => Ok(p),
            other => Err(mismatch(NAME, other)),
        }
    }

    fn encode(&self, resource: &Resource, format: Format) -> Result<Vec<u8>, DriverError> {
        let pixels = self.image(resource)?.pixels().clone();
        codec::encode(&DynamicImage::ImageRgba8(pixels), format, self.quality)
    }
}

impl ImageDriver for PipelineDriver {
    fn name(&self) -> &str {
        NAME
    }

    fn is_available(&self) -> bool {
        Format::ALL.iter().all(|f| codec::codec_available(*f))
    }

    fn create_resource(&self, bytes: &[u8]) -> Result<Resource, DriverError> {
        Ok(Resource::Pipeline(PipelineImage::new(
            codec::decode(bytes)?.into_rgba8(),
        )))
    }

    fn create_image_from_source(&self, source: &Source) -> Result<Image, DriverError> {
        let Source::File(f) = source else {
            return Err(DriverError::UnsupportedSource {
                driver: NAME.to_string(),
                kind: source.kind(),
            });
        };

        let bytes = read_source(source)?;
        let format = codec::infer_file_format(f.path(), &bytes)?;
        let img = PipelineImage::new(codec::decode(&bytes)?.into_rgba8());
        let (w, h) = (img.width(), img.height());
        Ok(Image::new(Resource::Pipeline(img), w, h, Some(format)))
    }

    fn width(&self, resource: &Resource) -> Result<u32, DriverError> {
        Ok(self.image(resource)?.width())
    }

    fn height(&self, resource: &Resource) -> Result<u32, DriverError> {
        Ok(self.image(resource)?.height())
    }

    fn draw_line(&self, image: &mut Image, line: &LineParams) -> Result<(), DriverError> {
        let resource = image.resource().ok_or(DriverError::ResourceUnavailable)?;
        let base = self.image(resource)?;

        let overlay = line_overlay(base.width(), base.height(), line);
        let composed = base.composite(&overlay);
        let (w, h) = (composed.width(), composed.height());

        image.swap_resource(Resource::Pipeline(composed), w, h);
        Ok(())
    }

    fn extract_data(&self, image: &Image) -> Result<Vec<u8>, DriverError> {
        let resource = image.resource().ok_or(DriverError::ResourceUnavailable)?;
        self.encode(resource, image.format().unwrap_or(Format::BASELINE))
    }

    fn save_image(&self, resource: &Resource, path: &Path, format: Format) -> Result<(), DriverError> {
        let bytes = self.encode(resource, format)?;
        codec::write_file(path, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::Driver;
    use crate::source::SourceKind;
    use crate::test_helpers::create_test_png;

    fn loaded(dir: &Path, w: u32, h: u32) -> Image {
        let path = dir.join("base.png");
        create_test_png(&path, w, h);
        Driver::Pipeline(PipelineDriver::new())
            .create_image_from_source(&Source::file(&path).unwrap())
            .unwrap()
    }

    fn pixels(image: &Image) -> &RgbaImage {
        match image.resource() {
            Some(Resource::Pipeline(p)) => p.pixels(),
            other => panic!("expected pipeline resource, got {other:?}"),
        }
    }

    #[test]
    fn memory_and_blob_sources_are_rejected() {
        let driver = PipelineDriver::new();

        let err = driver
            .create_image_from_source(&Source::memory(10, 10, None).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::UnsupportedSource {
                kind: SourceKind::Memory,
                ..
            }
        ));

        let err = driver
            .create_image_from_source(&Source::bytes(vec![1, 2, 3], Some("image/png")))
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::UnsupportedSource {
                kind: SourceKind::Blob,
                ..
            }
        ));
    }

    #[test]
    fn thin_line_matches_single_line_overlay() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut image = loaded(tmp.path(), 16, 16);
        let before = pixels(&image).clone();

        let line = LineParams::with_hex((1, 1), (14, 9), "#ff0000", 1).unwrap();
        image.draw_line(&line).unwrap();

        let mut expected = before.clone();
        for p in bresenham(line.from, line.to) {
            expected.put_pixel(p.x as u32, p.y as u32, Rgba([255, 0, 0, 255]));
        }
        assert_eq!(pixels(&image), &expected);
    }

    #[test]
    fn thick_horizontal_line_draws_one_row_per_offset() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut image = loaded(tmp.path(), 20, 20);

        image
            .draw_line(&LineParams::with_hex((2, 10), (17, 10), "#00ff00", 5).unwrap())
            .unwrap();

        let green_rows: Vec<u32> = (0..20)
            .filter(|&y| pixels(&image).get_pixel(10, y).0 == [0, 255, 0, 255])
            .collect();
        assert_eq!(green_rows, vec![8, 9, 10, 11, 12]);
        assert_eq!((image.width(), image.height()), (20, 20));
    }

    #[test]
    fn drawing_replaces_the_resource() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut image = loaded(tmp.path(), 8, 8);
        let before = match image.resource() {
            Some(Resource::Pipeline(p)) => p.clone(),
            _ => unreachable!(),
        };

        image
            .draw_line(&LineParams::with_hex((0, 0), (7, 7), "#fff", 1).unwrap())
            .unwrap();

        let after = match image.resource() {
            Some(Resource::Pipeline(p)) => p.clone(),
            _ => unreachable!(),
        };
        assert!(!Arc::ptr_eq(&before.0, &after.0));
        assert_ne!(before, after);
    }

    #[test]
    fn semi_transparent_line_blends_with_base() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut image = loaded(tmp.path(), 10, 10);
        let base = *pixels(&image).get_pixel(5, 5);

        image
            .draw_line(&LineParams::with_hex((0, 5), (9, 5), "#ffffff80", 1).unwrap())
            .unwrap();

        let px = *pixels(&image).get_pixel(5, 5);
        assert_ne!(px, base);
        assert_ne!(px.0, [255, 255, 255, 255]);
    }

    #[test]
    fn far_thick_line_is_clipped_per_offset() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut image = loaded(tmp.path(), 4, 4);
        let before = pixels(&image).clone();

        image
            .draw_line(&LineParams::with_hex((0, i32::MAX), (0, 0), "#ff0000", 5).unwrap())
            .unwrap();

        let after = pixels(&image);
        assert_eq!(after.dimensions(), (4, 4));
        for y in 0..4 {
            assert_eq!(after.get_pixel(0, y).0, [255, 0, 0, 255], "x=0 y={y}");
            assert_eq!(after.get_pixel(2, y).0, [255, 0, 0, 255], "x=2 y={y}");
            assert_eq!(after.get_pixel(3, y), before.get_pixel(3, y));
        }
    }

    #[test]
    fn offsets_at_the_i32_edge_do_not_overflow() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut image = loaded(tmp.path(), 4, 4);
        let before = pixels(&image).clone();

        for (from, to) in [
            ((i32::MAX, 0), (i32::MAX, 10)),
            ((i32::MIN, 0), (i32::MIN, 10)),
            ((-2_000_000_000, 1), (2_000_000_000, 1)),
        ] {
            image
                .draw_line(&LineParams::with_hex(from, to, "#00ff00", 5).unwrap())
                .unwrap();
        }

        let after = pixels(&image);
        for y in 0..4 {
            assert_eq!(after.get_pixel(1, y).0, [0, 255, 0, 255], "y={y}");
        }
        assert_ne!(after, &before);
    }
}
