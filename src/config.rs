//! Configuration module.
//!
//! Handles loading and validating `limner.toml`. Every key is optional; a
//! missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [drivers]
//! # preferred = "magick"   # Driver to select when available (default: first detected)
//! disabled = []            # Built-in drivers to skip during detection
//!
//! [encoding]
//! jpeg_quality = 90        # Lossy encoding quality (1-100, clamped)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::drivers::{Quality, magick, pipeline, raster};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "limner.toml";

const BUILTIN_DRIVERS: [&str; 3] = [raster::NAME, magick::NAME, pipeline::NAME];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `limner.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimnerConfig {
    /// Driver detection and selection.
    pub drivers: DriversConfig,
    /// Encoder settings shared by all drivers.
    pub encoding: EncodingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriversConfig {
    /// Driver to make current after detection, if it was detected.
    pub preferred: Option<String>,
    /// Built-in drivers never registered, even when available.
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub jpeg_quality: Quality,
}

impl LimnerConfig {
    /// Validate driver names against the built-in set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in &self.drivers.disabled {
            if !is_builtin(name) {
                return Err(ConfigError::Validation(format!(
                    "drivers.disabled: unknown driver '{}' (expected one of {})",
                    name,
                    BUILTIN_DRIVERS.join(", ")
                )));
            }
        }
        if let Some(preferred) = &self.drivers.preferred {
            if !is_builtin(preferred) {
                return Err(ConfigError::Validation(format!(
                    "drivers.preferred: unknown driver '{}'",
                    preferred
                )));
            }
            if self.drivers.disabled.iter().any(|d| d.eq_ignore_ascii_case(preferred)) {
                return Err(ConfigError::Validation(format!(
                    "drivers.preferred '{}' is also disabled",
                    preferred
                )));
            }
        }
        Ok(())
    }
}

fn is_builtin(name: &str) -> bool {
    BUILTIN_DRIVERS.iter().any(|b| b.eq_ignore_ascii_case(name))
}

/// Load and validate a config file.
///
/// Returns stock defaults if `path` does not exist; invalid TOML or unknown
/// keys are errors.
pub fn load_config(path: &Path) -> Result<LimnerConfig, ConfigError> {
    if !path.exists() {
        log::debug!("no config at {:?}, using defaults", path);
        return Ok(LimnerConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let config: LimnerConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `limner.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# limner configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Drivers
# ---------------------------------------------------------------------------
[drivers]
# Built-in drivers are probed in this order: raster, magick, pipeline.
# The first available one becomes current unless `preferred` names another.
# preferred = "magick"

# Drivers to skip during detection.
disabled = []

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG quality (1 = worst, 100 = best). Out-of-range values are clamped.
jpeg_quality = 90
"##
}
