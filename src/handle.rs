//! The cross-backend image handle.
//!
//! An [`Image`] owns exactly one backend [`Resource`] and remembers which
//! [`Driver`] created it. Width and height are cached on the handle but are
//! refreshed from the resource after every operation that can touch geometry,
//! so they never drift from what the backend reports.
//!
//! Resources are released when the handle is dropped, or earlier through
//! [`Image::release`]. A handle without a resource (released, or never
//! given one) refuses to draw or save with
//! [`DriverError::ResourceUnavailable`].

use crate::drivers::{Driver, DriverError, ImageDriver, LineParams, Resource};
use crate::format::Format;
use std::path::Path;

#[derive(Debug)]
pub struct Image {
    width: u32,
    height: u32,
    format: Option<Format>,
    resource: Option<Resource>,
    driver: Option<Driver>,
}

impl Image {
    /// Wrap a resource whose dimensions the caller has just read from it.
    ///
    /// The handle has no owning driver until one is attached; drivers do that
    /// when the image is created through [`Driver`]. Custom drivers build
    /// handles with [`Image::from_resource`].
    pub(crate) fn new(resource: Resource, width: u32, height: u32, format: Option<Format>) -> Self {
        Self {
            width,
            height,
            format,
            resource: Some(resource),
            driver: None,
        }
    }

    /// Wrap a resource, reading its dimensions through `driver`.
    pub fn from_resource(
        resource: Resource,
        format: Option<Format>,
        driver: Driver,
    ) -> Result<Self, DriverError> {
        let width = driver.width(&resource)?;
        let height = driver.height(&resource)?;
        Ok(Self {
            width,
            height,
            format,
            resource: Some(resource),
            driver: Some(driver),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> Option<Format> {
        self.format
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = Some(format);
    }

    pub(crate) fn restore_format(&mut self, format: Option<Format>) {
        self.format = format;
    }

    pub fn driver(&self) -> Option<&Driver> {
        self.driver.as_ref()
    }

    pub(crate) fn set_driver(&mut self, driver: Driver) {
        self.driver = Some(driver);
    }

    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    pub fn resource_mut(&mut self) -> Option<&mut Resource> {
        self.resource.as_mut()
    }

    /// Swap in a new resource and refresh the dimensions from it.
    ///
    /// The superseded resource is returned so the caller controls when it is
    /// dropped; it is never reachable through this handle again.
    /// Dimensions are read from `resource` before the swap, so on error the
    /// handle is unchanged.
    pub fn replace_resource(&mut self, resource: Resource) -> Result<Option<Resource>, DriverError> {
        let driver = self.driver.as_ref().ok_or(DriverError::NoDriver)?;
        let width = driver.width(&resource)?;
        let height = driver.height(&resource)?;
        Ok(self.swap_resource(resource, width, height))
    }

    /// Re-read width and height from the resource through the owning driver.
    pub fn refresh_dimensions(&mut self) -> Result<(), DriverError> {
        let driver = self.driver.as_ref().ok_or(DriverError::NoDriver)?;
        let resource = self.resource.as_ref().ok_or(DriverError::ResourceUnavailable)?;
        self.width = driver.width(resource)?;
        self.height = driver.height(resource)?;
        Ok(())
    }

    /// Record dimensions a driver has just read from its own resource.
    pub(crate) fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Swap in a resource whose dimensions the caller already knows.
    pub(crate) fn swap_resource(&mut self, resource: Resource, width: u32, height: u32) -> Option<Resource> {
        let old = self.resource.replace(resource);
        self.set_dimensions(width, height);
        old
    }

    /// Release the backend resource now instead of at drop time.
    pub fn release(&mut self) {
        if let Some(resource) = self.resource.take() {
            log::debug!("releasing {} resource", resource.backend());
        }
    }

    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    fn owning_driver(&self) -> Result<Driver, DriverError> {
        self.driver.clone().ok_or(DriverError::NoDriver)
    }

    /// Draw a line through the owning driver.
    pub fn draw_line(&mut self, line: &LineParams) -> Result<(), DriverError> {
        let driver = self.owning_driver()?;
        driver.draw_line(self, line)
    }

    /// Encode in the declared format through the owning driver.
    pub fn extract_data(&self) -> Result<Vec<u8>, DriverError> {
        self.owning_driver()?.extract_data(self)
    }

    /// Save through the owning driver; `format` falls back to the declared one, then PNG.
    pub fn save(&self, path: &Path, format: Option<Format>) -> Result<(), DriverError> {
        let driver = self.owning_driver()?;
        let resource = self.resource.as_ref().ok_or(DriverError::ResourceUnavailable)?;
        let format = format.or(self.format).unwrap_or(Format::BASELINE);
        driver.save_image(resource, path, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::RasterCanvas;
    use crate::drivers::RasterDriver;

    fn raster_image(w: u32, h: u32) -> Image {
        let resource = Resource::Raster(RasterCanvas::blank(w, h, [0, 0, 0, 255]));
        Image::from_resource(resource, Some(Format::Png), Driver::Raster(RasterDriver::new()))
            .unwrap()
    }

    #[test]
    fn from_resource_reads_dimensions() {
        let image = raster_image(30, 20);
        assert_eq!((image.width(), image.height()), (30, 20));
        assert_eq!(image.format(), Some(Format::Png));
        assert_eq!(image.driver().map(|d| d.name()), Some("raster"));
    }

    #[test]
    fn replace_resource_refreshes_dimensions() {
        let mut image = raster_image(30, 20);
        let old = image
            .replace_resource(Resource::Raster(RasterCanvas::blank(5, 6, [0; 4])))
            .unwrap();
        assert!(old.is_some());
        assert_eq!((image.width(), image.height()), (5, 6));
    }

    #[test]
    fn released_image_cannot_draw_or_save() {
        let mut image = raster_image(10, 10);
        image.release();
        assert!(!image.has_resource());

        let line = LineParams::with_hex((0, 0), (5, 5), "#fff", 1).unwrap();
        assert!(matches!(
            image.draw_line(&line),
            Err(DriverError::ResourceUnavailable)
        ));
        assert!(matches!(
            image.save(Path::new("/tmp/never.png"), None),
            Err(DriverError::ResourceUnavailable)
        ));
    }

    #[test]
    fn image_without_driver_cannot_draw() {
        let mut image = Image::new(
            Resource::Raster(RasterCanvas::blank(2, 2, [0; 4])),
            2,
            2,
            None,
        );
        let line = LineParams::with_hex((0, 0), (1, 1), "#fff", 1).unwrap();
        assert!(matches!(image.draw_line(&line), Err(DriverError::NoDriver)));
        assert!(matches!(image.extract_data(), Err(DriverError::NoDriver)));
    }

    #[test]
    fn save_defaults_to_declared_format() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.bin");
        let image = raster_image(4, 4);
        image.save(&path, None).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn replace_without_driver_leaves_handle_unchanged() {
        let mut image = Image::new(
            Resource::Raster(RasterCanvas::blank(2, 2, [0; 4])),
            2,
            2,
            None,
        );
        let err = image
            .replace_resource(Resource::Raster(RasterCanvas::blank(7, 9, [0; 4])))
            .unwrap_err();
        assert!(matches!(err, DriverError::NoDriver));
        assert_eq!((image.width(), image.height()), (2, 2));
        match image.resource() {
            Some(Resource::Raster(c)) => assert_eq!((c.width(), c.height()), (2, 2)),
            other => panic!("unexpected resource {other:?}"),
        }
    }

    #[test]
    fn replace_with_foreign_resource_leaves_handle_unchanged() {
        let mut image = raster_image(4, 3);
        let foreign = Resource::Magick(crate::drivers::MagickCanvas::blank(8, 8, None).unwrap());
        let err = image.replace_resource(foreign).unwrap_err();
        assert!(matches!(err, DriverError::ResourceMismatch { .. }));
        assert_eq!((image.width(), image.height()), (4, 3));
        assert!(matches!(image.resource(), Some(Resource::Raster(_))));
    }
}
