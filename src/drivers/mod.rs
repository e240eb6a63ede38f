//! Driver contract and the built-in backends.
//!
//! The [`ImageDriver`] trait defines the operations every backend must
//! support: availability probing, decoding, construction from a
//! [`Source`], dimension queries, line drawing, encoding and saving. A backend
//! that cannot do something fails with an `Unsupported*` error; nothing is
//! silently skipped or substituted.
//!
//! | Driver | Resource | Sources | Encodes | Line drawing |
//! |---|---|---|---|---|
//! | [`RasterDriver`] (`raster`) | [`RasterCanvas`] | file, blob, memory | png, jpeg | native thick stroke, blended |
//! | [`MagickDriver`] (`magick`) | [`MagickCanvas`] | file, blob, memory | png, jpeg, webp | native anti-aliased stroke |
//! | [`PipelineDriver`] (`pipeline`) | [`PipelineImage`] | file | png, jpeg, webp | 1-px lines + overlay compositing |
//!
//! [`Driver`] is the closed set of the three plus one `Custom` slot for
//! user-supplied implementations of the same trait. [`Resource`] is tagged the
//! same way, and every driver rejects resources carrying another tag.

pub(crate) mod codec;
pub(crate) mod compose;
pub mod geometry;
pub mod magick;
pub mod params;
pub mod pipeline;
pub mod raster;
pub mod registry;

pub use magick::{MagickCanvas, MagickDriver};
pub use params::{LineParams, Point, Quality};
pub use pipeline::{PipelineDriver, PipelineImage};
pub use raster::{RasterCanvas, RasterDriver};
pub use registry::{DriverRegistry, RegistryError};

use crate::format::Format;
use crate::handle::Image;
use crate::source::{Source, SourceError, SourceKind};
use std::any::Any;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Driver '{driver}' does not support {kind} sources")]
    UnsupportedSource { driver: String, kind: SourceKind },
    #[error("Driver '{driver}' does not support format '{format}'")]
    UnsupportedFormat { driver: String, format: String },
    #[error("Driver '{driver}' does not support operation '{operation}'")]
    UnsupportedOperation { driver: String, operation: String },
    #[error("Image has no backend resource")]
    ResourceUnavailable,
    #[error("Resource was not created by driver '{driver}' (found {found})")]
    ResourceMismatch { driver: String, found: &'static str },
    #[error("Image has no owning driver")]
    NoDriver,
    #[error("Could not allocate a {width}x{height} canvas")]
    Allocation { width: u32, height: u32 },
    #[error("Failed to save image to {path:?}: {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A backend-native image, tagged by the backend that created it.
pub enum Resource {
    Raster(RasterCanvas),
    Magick(MagickCanvas),
    Pipeline(PipelineImage),
    /// Resource of a user-registered driver; only that driver may downcast it.
    Custom(Box<dyn Any + Send + Sync>),
}

impl Resource {
    /// Tag of the backend that owns this resource.
    pub fn backend(&self) -> &'static str {
        match self {
            Resource::Raster(_) => raster::NAME,
            Resource::Magick(_) => magick::NAME,
            Resource::Pipeline(_) => pipeline::NAME,
            Resource::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Raster(c) => f.debug_tuple("Raster").field(c).finish(),
            Resource::Magick(c) => f.debug_tuple("Magick").field(c).finish(),
            Resource::Pipeline(c) => f.debug_tuple("Pipeline").field(c).finish(),
            Resource::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Capability set every image backend implements.
///
/// Implementations must be stateless with respect to individual images: all
/// per-image state lives in the [`Resource`] held by the [`Image`].
pub trait ImageDriver: Send + Sync {
    /// Stable driver name, used as the registry key.
    fn name(&self) -> &str;

    /// Probe whether the backend can run here. Must be side-effect free.
    fn is_available(&self) -> bool;

    /// Decode encoded bytes into a native resource.
    fn create_resource(&self, bytes: &[u8]) -> Result<Resource, DriverError>;

    /// Build an image from a source. Unsupported variants fail before anything is allocated.
    fn create_image_from_source(&self, source: &Source) -> Result<Image, DriverError>;

    fn width(&self, resource: &Resource) -> Result<u32, DriverError>;

    fn height(&self, resource: &Resource) -> Result<u32, DriverError>;

    /// Draw a line on the image in place. The resource may be replaced.
    fn draw_line(&self, image: &mut Image, line: &LineParams) -> Result<(), DriverError>;

    /// Encode the image in its declared format (PNG when undeclared).
    fn extract_data(&self, image: &Image) -> Result<Vec<u8>, DriverError>;

    /// Encode `resource` as `format` and write it to `path`.
    fn save_image(&self, resource: &Resource, path: &Path, format: Format) -> Result<(), DriverError>;
}

/// Handle to one backend: the built-in three or a custom implementation.
///
/// Cloning is cheap; images keep a clone as their owning-driver reference.
#[derive(Clone)]
pub enum Driver {
    Raster(RasterDriver),
    Magick(MagickDriver),
    Pipeline(PipelineDriver),
    Custom(Arc<dyn ImageDriver>),
}

impl Driver {
    /// Built-in drivers in detection order.
    pub fn builtin(quality: Quality) -> [Driver; 3] {
        [
            Driver::Raster(RasterDriver::with_quality(quality)),
            Driver::Magick(MagickDriver::with_quality(quality)),
            Driver::Pipeline(PipelineDriver::with_quality(quality)),
        ]
    }

    pub fn custom(driver: impl ImageDriver + 'static) -> Self {
        Driver::Custom(Arc::new(driver))
    }

    fn inner(&self) -> &dyn ImageDriver {
        match self {
            Driver::Raster(d) => d,
            Driver::Magick(d) => d,
            Driver::Pipeline(d) => d,
            Driver::Custom(d) => d.as_ref(),
        }
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Driver({})", self.name())
    }
}

impl ImageDriver for Driver {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn is_available(&self) -> bool {
        self.inner().is_available()
    }

    fn create_resource(&self, bytes: &[u8]) -> Result<Resource, DriverError> {
        self.inner().create_resource(bytes)
    }

    fn create_image_from_source(&self, source: &Source) -> Result<Image, DriverError> {
        log::debug!(
            "{}: creating image from {} source {}",
            self.name(),
            source.kind(),
            source.identifier()
        );
        let mut image = self.inner().create_image_from_source(source)?;
        image.set_driver(self.clone());
        Ok(image)
    }

    fn width(&self, resource: &Resource) -> Result<u32, DriverError> {
        self.inner().width(resource)
    }

    fn height(&self, resource: &Resource) -> Result<u32, DriverError> {
        self.inner().height(resource)
    }

    fn draw_line(&self, image: &mut Image, line: &LineParams) -> Result<(), DriverError> {
        self.inner().draw_line(image, line)
    }

    fn extract_data(&self, image: &Image) -> Result<Vec<u8>, DriverError> {
        self.inner().extract_data(image)
    }

    fn save_image(&self, resource: &Resource, path: &Path, format: Format) -> Result<(), DriverError> {
        self.inner().save_image(resource, path, format)
    }
}

/// Read all bytes of a source, mapping failures into the driver error space.
pub(crate) fn read_source(source: &Source) -> Result<Vec<u8>, DriverError> {
    let mut bytes = Vec::new();
    source
        .stream()?
        .read_to_end(&mut bytes)
        .map_err(|e| DriverError::Source(SourceError::Io(e)))?;
    Ok(bytes)
}

pub(crate) fn mismatch(driver: &str, resource: &Resource) -> DriverError {
    DriverError::ResourceMismatch {
        driver: driver.to_string(),
        found: resource.backend(),
    }
}

pub(crate) fn unsupported_format(driver: &str, format: Format) -> DriverError {
    DriverError::UnsupportedFormat {
        driver: driver.to_string(),
        format: format.name().to_string(),
    }
}


#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory canvas for the recording driver.
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCanvas {
        pub width: u32,
        pub height: u32,
    }

    /// Custom driver that records operations without touching pixels.
    /// Uses Mutex (not RefCell) so it is Sync, as the trait requires.
    #[derive(Default)]
    pub struct RecordingDriver {
        pub unavailable: bool,
        /// Extraction yields no bytes.
        pub empty_output: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        CreateResource(usize),
        FromSource(String),
        DrawLine { from: Point, to: Point, thickness: u32 },
        Extract(Option<Format>),
        Save(PathBuf, Format),
    }

    impl RecordingDriver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }

        pub fn empty_output() -> Self {
            Self {
                empty_output: true,
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }

        fn canvas<'a>(&self, resource: &'a Resource) -> Result<&'a RecordedCanvas, DriverError> {
            match resource {
                Resource::Custom(any) => any
                    .downcast_ref::<RecordedCanvas>()
                    .ok_or_else(|| mismatch("recording", resource)),
                other => Err(mismatch("recording", other)),
            }
        }
    }

    impl ImageDriver for RecordingDriver {
        fn name(&self) -> &str {
            "recording"
        }

        fn is_available(&self) -> bool {
            !self.unavailable
        }

        fn create_resource(&self, bytes: &[u8]) -> Result<Resource, DriverError> {
            self.record(RecordedOp::CreateResource(bytes.len()));
            Ok(Resource::Custom(Box::new(RecordedCanvas {
                width: 7,
                height: 3,
            })))
        }

        fn create_image_from_source(&self, source: &Source) -> Result<Image, DriverError> {
            self.record(RecordedOp::FromSource(source.identifier()));
            match source {
                Source::Memory(m) => Ok(Image::new(
                    Resource::Custom(Box::new(RecordedCanvas {
                        width: m.width(),
                        height: m.height(),
                    })),
                    m.width(),
                    m.height(),
                    Some(Format::Png),
                )),
                other => Err(DriverError::UnsupportedSource {
                    driver: "recording".into(),
                    kind: other.kind(),
                }),
            }
        }

        fn width(&self, resource: &Resource) -> Result<u32, DriverError> {
            Ok(self.canvas(resource)?.width)
        }

        fn height(&self, resource: &Resource) -> Result<u32, DriverError> {
            Ok(self.canvas(resource)?.height)
        }

        fn draw_line(&self, image: &mut Image, line: &LineParams) -> Result<(), DriverError> {
            let resource = image.resource().ok_or(DriverError::ResourceUnavailable)?;
            self.canvas(resource)?;
            self.record(RecordedOp::DrawLine {
                from: line.from,
                to: line.to,
                thickness: line.thickness,
            });
            Ok(())
        }

        fn extract_data(&self, image: &Image) -> Result<Vec<u8>, DriverError> {
            self.record(RecordedOp::Extract(image.format()));
            if self.empty_output {
                return Ok(Vec::new());
            }
            Ok(b"recorded".to_vec())
        }

        fn save_image(
            &self,
            _resource: &Resource,
            path: &Path,
            format: Format,
        ) -> Result<(), DriverError> {
            self.record(RecordedOp::Save(path.to_path_buf(), format));
            Ok(())
        }
    }

    #[test]
    fn builtin_order_is_raster_magick_pipeline() {
        let names: Vec<String> = Driver::builtin(Quality::default())
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, ["raster", "magick", "pipeline"]);
    }

    #[test]
    fn custom_dispatch_attaches_owning_driver() {
        let driver = Driver::custom(RecordingDriver::new());
        let source = Source::memory(12, 9, None).unwrap();

        let image = driver.create_image_from_source(&source).unwrap();
        assert_eq!((image.width(), image.height()), (12, 9));
        assert_eq!(image.driver().map(|d| d.name()), Some("recording"));
    }

    #[test]
    fn custom_driver_receives_draw_calls_through_image() {
        let recording = Arc::new(RecordingDriver::new());
        let driver = Driver::Custom(recording.clone());
        let mut image = driver
            .create_image_from_source(&Source::memory(10, 10, None).unwrap())
            .unwrap();

        image
            .draw_line(&LineParams::with_hex((1, 2), (3, 4), "#fff", 2).unwrap())
            .unwrap();

        let ops = recording.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[1],
            RecordedOp::DrawLine {
                thickness: 2,
                ..
            }
        ));
    }

    #[test]
    fn builtin_rejects_foreign_resource() {
        let resource = Resource::Custom(Box::new(RecordedCanvas {
            width: 1,
            height: 1,
        }));
        let err = RasterDriver::new().width(&resource).unwrap_err();
        assert!(matches!(
            err,
            DriverError::ResourceMismatch {
                found: "custom",
                ..
            }
        ));
    }

    #[test]
    fn resource_backend_tags() {
        let canvas = RasterCanvas::blank(1, 1, [0, 0, 0, 255]);
        assert_eq!(Resource::Raster(canvas).backend(), "raster");
    }
}
