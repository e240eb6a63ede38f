//! Driver detection and selection.

use super::params::Quality;
use super::{Driver, ImageDriver};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("No available image driver detected")]
    NoDriverAvailable,
    #[error("Driver '{0}' is not registered or available")]
    UnknownDriver(String),
}

/// Named drivers in registration order, plus the current selection.
#[derive(Debug, Default, Clone)]
pub struct DriverRegistry {
    drivers: Vec<(String, Driver)>,
    current: Option<usize>,
}

impl DriverRegistry {
    /// An empty registry. Call [`detect_available`](Self::detect_available)
    /// or [`register`](Self::register) to populate it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, then probe the built-in drivers in fixed order
    /// (`raster`, `magick`, `pipeline`). The first available one becomes current.
    pub fn detect_available(&mut self) {
        self.detect_with(Quality::default(), &[]);
    }

    /// Like [`detect_available`](Self::detect_available), skipping `disabled`
    /// names and building drivers with the given JPEG quality.
    pub fn detect_with(&mut self, quality: Quality, disabled: &[String]) {
        self.drivers.clear();
        self.current = None;

        for driver in Driver::builtin(quality) {
            let name = driver.name().to_string();
            if disabled.iter().any(|d| d.eq_ignore_ascii_case(&name)) {
                log::debug!("driver '{}' disabled by configuration", name);
                continue;
            }
            if !driver.is_available() {
                log::debug!("driver '{}' is not available", name);
                continue;
            }
            self.drivers.push((name, driver));
        }

        if !self.drivers.is_empty() {
            self.current = Some(0);
        }
        log::info!("detected drivers: {}", self.names().join(", "));
    }

    pub fn current(&self) -> Result<&Driver, RegistryError> {
        self.current
            .and_then(|i| self.drivers.get(i))
            .map(|(_, d)| d)
            .ok_or(RegistryError::NoDriverAvailable)
    }

    pub fn get(&self, name: &str) -> Option<&Driver> {
        self.position(name).map(|i| &self.drivers[i].1)
    }

    /// Select `name` as current. On failure the selection is left unchanged.
    pub fn set_current(&mut self, name: &str) -> Result<(), RegistryError> {
        let i = self
            .position(name)
            .ok_or_else(|| RegistryError::UnknownDriver(name.to_string()))?;
        self.current = Some(i);
        Ok(())
    }

    /// Register `driver` under `name` if it is available; an existing entry
    /// with the same name is replaced in place. Becomes current when nothing
    /// is selected yet. Returns whether the driver was stored.
    pub fn register(&mut self, name: &str, driver: Driver) -> bool {
        if !driver.is_available() {
            log::warn!("not registering driver '{}': not available", name);
            return false;
        }

        let index = match self.position(name) {
            Some(i) => {
                self.drivers[i].1 = driver;
                i
            }
            None => {
                self.drivers.push((name.to_string(), driver));
                self.drivers.len() - 1
            }
        };
        if self.current.is_none() {
            self.current = Some(index);
        }
        true
    }

    pub fn names(&self) -> Vec<&str> {
        self.drivers.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// All registered drivers, in registration order.
    pub fn available(&self) -> impl Iterator<Item = (&str, &Driver)> {
        self.drivers.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Name of the current driver, if any.
    pub fn current_name(&self) -> Option<&str> {
        self.current
            .and_then(|i| self.drivers.get(i))
            .map(|(n, _)| n.as_str())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.drivers.iter().position(|(n, _)| n == name)
    }
}
