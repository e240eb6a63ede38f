//! Format-keyed loading and saving.
//!
//! [`ImageIo`] pairs format names with a [`FormatReader`] (source → encoded
//! bytes) and a [`FormatWriter`] (image → destination). Readers never decode
//! and writers never touch pixels: decoding and encoding belong to the
//! driver. Format names are matched case-insensitively.

use crate::drivers::{Driver, DriverError, ImageDriver};
use crate::format::Format;
use crate::handle::Image;
use crate::source::{Source, SourceError};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("No reader registered for format: {0}")]
    NoReaderForFormat(String),
    #[error("No writer registered for format: {0}")]
    NoWriterForFormat(String),
    #[error("No driver available for this operation")]
    NoDriverAvailable,
    #[error("Failed to read {format} data from {identifier}: {source}")]
    ReadError {
        format: String,
        identifier: String,
        #[source]
        source: SourceError,
    },
    #[error("Failed to write {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Pulls the complete encoded byte stream out of a source.
pub trait FormatReader: Send + Sync {
    fn load(&self, source: &Source) -> Result<Vec<u8>, IoError>;
}

/// Writes an image through `driver` to a destination.
///
/// Returns `Ok(false)` when the driver produced no bytes.
pub trait FormatWriter: Send + Sync {
    fn save(&self, image: &Image, driver: &Driver, destination: &Path) -> Result<bool, IoError>;
}

/// Reader for any format: drains the source stream unchanged.
#[derive(Debug, Clone, Copy)]
pub struct StreamReader {
    format: Format,
}

impl StreamReader {
    pub fn new(format: Format) -> Self {
        Self { format }
    }
}

impl FormatReader for StreamReader {
    fn load(&self, source: &Source) -> Result<Vec<u8>, IoError> {
        let read_error = |e: SourceError| IoError::ReadError {
            format: self.format.name().to_string(),
            identifier: source.identifier(),
            source: e,
        };

        let mut bytes = Vec::new();
        source
            .stream()
            .map_err(read_error)?
            .read_to_end(&mut bytes)
            .map_err(|e| read_error(SourceError::Io(e)))?;
        Ok(bytes)
    }
}

/// Writer for any format: asks the driver to encode, then writes the file.
#[derive(Debug, Clone, Copy)]
pub struct FileWriter {
    format: Format,
}

impl FileWriter {
    pub fn new(format: Format) -> Self {
        Self { format }
    }
}

impl FormatWriter for FileWriter {
    fn save(&self, image: &Image, driver: &Driver, destination: &Path) -> Result<bool, IoError> {
        let bytes = driver.extract_data(image)?;
        if bytes.is_empty() {
            log::warn!(
                "{}: {} encoder produced no data for {:?}",
                driver.name(),
                self.format,
                destination
            );
            return Ok(false);
        }

        std::fs::write(destination, &bytes).map_err(|e| IoError::WriteError {
            path: destination.to_path_buf(),
            source: e,
        })?;
        Ok(true)
    }
}

/// Lowercase registry key; known aliases (`jpg`) map to the canonical name.
fn format_key(format: &str) -> String {
    Format::from_name(format)
        .map(|f| f.name().to_string())
        .unwrap_or_else(|_| format.to_lowercase())
}

/// Loading/saving orchestrator with an optional default driver.
#[derive(Default)]
pub struct ImageIo {
    readers: HashMap<String, Box<dyn FormatReader>>,
    writers: HashMap<String, Box<dyn FormatWriter>>,
    driver: Option<Driver>,
}

impl ImageIo {
    pub fn new(driver: Option<Driver>) -> Self {
        Self {
            driver,
            ..Self::default()
        }
    }

    /// An orchestrator with stream readers and file writers for png, jpeg and webp.
    pub fn with_default_formats(driver: Option<Driver>) -> Self {
        let mut io = Self::new(driver);
        for format in Format::ALL {
            io.register_format(
                format.name(),
                StreamReader::new(format),
                FileWriter::new(format),
            );
        }
        io
    }

    pub fn register_reader(&mut self, format: &str, reader: impl FormatReader + 'static) {
        self.readers.insert(format_key(format), Box::new(reader));
    }

    pub fn register_writer(&mut self, format: &str, writer: impl FormatWriter + 'static) {
        self.writers.insert(format_key(format), Box::new(writer));
    }

    pub fn register_format(
        &mut self,
        format: &str,
        reader: impl FormatReader + 'static,
        writer: impl FormatWriter + 'static,
    ) {
        self.register_reader(format, reader);
        self.register_writer(format, writer);
    }

    pub fn driver(&self) -> Option<&Driver> {
        self.driver.as_ref()
    }

    pub fn set_driver(&mut self, driver: Option<Driver>) {
        self.driver = driver;
    }

    /// Read `source` with the `format` reader and decode it with `driver`
    /// (falling back to the default driver).
    pub fn load(&self, source: &Source, format: &str, driver: Option<&Driver>) -> Result<Image, IoError> {
        let key = format_key(format);
        let reader = self
            .readers
            .get(&key)
            .ok_or_else(|| IoError::NoReaderForFormat(key.clone()))?;

        let bytes = reader.load(source)?;
        let driver = driver
            .or(self.driver.as_ref())
            .ok_or(IoError::NoDriverAvailable)?;

        log::debug!(
            "{}: decoding {} bytes of {} from {}",
            driver.name(),
            bytes.len(),
            key,
            source.identifier()
        );
        let resource = driver.create_resource(&bytes)?;
        Ok(Image::from_resource(
            resource,
            Format::from_name(&key).ok(),
            driver.clone(),
        )?)
    }

    /// Save `image` as `format` to `destination`.
    ///
    /// The image's declared format becomes `format` when the write succeeds
    /// and is left as it was when it fails. Uses the image's own driver, else
    /// the default one.
    pub fn save(&self, image: &mut Image, format: &str, destination: &Path) -> Result<bool, IoError> {
        self.save_with(image, format, destination, None)
    }

    /// Like [`save`](Self::save), trying `fallback` before the default driver
    /// when the image has no driver of its own.
    pub fn save_with(
        &self,
        image: &mut Image,
        format: &str,
        destination: &Path,
        fallback: Option<&Driver>,
    ) -> Result<bool, IoError> {
        let key = format_key(format);
        let writer = self
            .writers
            .get(&key)
            .ok_or_else(|| IoError::NoWriterForFormat(key.clone()))?;

        let driver = image
            .driver()
            .or(fallback)
            .or(self.driver.as_ref())
            .cloned()
            .ok_or(IoError::NoDriverAvailable)?;

        let previous = image.format();
        if let Ok(f) = Format::from_name(&key) {
            image.set_format(f);
        }
        let result = writer.save(image, &driver, destination);
        if result.is_err() {
            image.restore_format(previous);
        }
        result
    }
}
