//! Entry point tying the driver registry to the I/O orchestrator.
//!
//! A [`Context`] is an explicit value: create one with [`Context::detect`] or
//! [`Context::from_config`] and pass it where images are loaded and saved.
//!
//! ```no_run
//! use limner::{Context, LineParams};
//!
//! let ctx = Context::detect();
//! let mut image = ctx.image("photo.jpg", "jpeg", Some("magick"))?;
//! image.draw_line(&LineParams::with_hex((0, 0), (99, 49), "#ff0000", 5)?)?;
//! ctx.save(&mut image, "jpeg", "out.jpg")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::{ConfigError, LimnerConfig};
use crate::drivers::{Driver, DriverError, DriverRegistry, RegistryError};
use crate::handle::Image;
use crate::io::{ImageIo, IoError};
use crate::source::{Source, SourceError};
use std::path::Path;
use thiserror::Error;

/// Fill color of [`Context::create_blank`] when none is given.
pub const DEFAULT_BLANK_COLOR: &str = "#ffffff";

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub struct Context {
    registry: DriverRegistry,
    io: ImageIo,
}

impl Context {
    /// Detect the built-in drivers and register the png, jpeg and webp formats.
    pub fn detect() -> Self {
        let mut registry = DriverRegistry::new();
        registry.detect_available();
        Self::with_registry(registry)
    }

    /// Like [`detect`](Self::detect), honoring `[drivers]` and `[encoding]`.
    ///
    /// A preferred driver that was not detected is skipped with a warning.
    pub fn from_config(config: &LimnerConfig) -> Result<Self, Error> {
        config.validate()?;

        let mut registry = DriverRegistry::new();
        registry.detect_with(config.encoding.jpeg_quality, &config.drivers.disabled);

        if let Some(preferred) = &config.drivers.preferred {
            let name = preferred.to_ascii_lowercase();
            if registry.set_current(&name).is_err() {
                log::warn!("preferred driver '{}' is not available", name);
            }
        }
        Ok(Self::with_registry(registry))
    }

    /// Build a context around an existing registry.
    pub fn with_registry(registry: DriverRegistry) -> Self {
        Self {
            registry,
            io: ImageIo::with_default_formats(None),
        }
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DriverRegistry {
        &mut self.registry
    }

    pub fn io(&self) -> &ImageIo {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut ImageIo {
        &mut self.io
    }

    /// Named driver, or the current one when `name` is `None`.
    pub fn driver(&self, name: Option<&str>) -> Result<&Driver, Error> {
        match name {
            Some(n) => self
                .registry
                .get(n)
                .ok_or_else(|| RegistryError::UnknownDriver(n.to_string()).into()),
            None => Ok(self.registry.current()?),
        }
    }

    /// Load a file as `format`.
    pub fn image(&self, path: impl AsRef<Path>, format: &str, driver: Option<&str>) -> Result<Image, Error> {
        let source = Source::file(path)?;
        self.load(&source, format, driver)
    }

    /// Load any source as `format`.
    pub fn load(&self, source: &Source, format: &str, driver: Option<&str>) -> Result<Image, Error> {
        let driver = self.driver(driver)?;
        Ok(self.io.load(source, format, Some(driver))?)
    }

    /// A blank `width` x `height` image filled with `color` (white by default).
    ///
    /// The canvas goes through the regular load path as encoded bytes, so any
    /// driver can create blanks, including ones without memory-source support.
    pub fn create_blank(
        &self,
        width: u32,
        height: u32,
        format: &str,
        color: Option<&str>,
        driver: Option<&str>,
    ) -> Result<Image, Error> {
        let source = Source::memory(width, height, Some(color.unwrap_or(DEFAULT_BLANK_COLOR)))?;
        self.load(&source, format, driver)
    }

    /// Save `image` as `format` to `path`. Returns `false` if nothing was encoded.
    pub fn save(&self, image: &mut Image, format: &str, path: impl AsRef<Path>) -> Result<bool, Error> {
        let fallback = self.registry.current().ok();
        Ok(self.io.save_with(image, format, path.as_ref(), fallback)?)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("drivers", &self.registry.names())
            .field("current", &self.registry.current_name())
            .finish()
    }
}
