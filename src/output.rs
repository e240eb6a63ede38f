//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ## Drivers
//!
//! ```text
//! Drivers
//! * raster     png, jpeg
//!   magick     png, jpeg, webp
//!   pipeline   png, jpeg, webp (file sources only)
//! ```
//!
//! ## Info
//!
//! ```text
//! photo.jpg
//!     Size: 100x50
//!     Format: jpeg
//!     Driver: magick
//! ```

use crate::drivers::{DriverRegistry, ImageDriver, magick, pipeline, raster};
use crate::handle::Image;
use serde::Serialize;
use std::path::Path;

/// Summary of a loaded image, printed by `info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
    pub driver: Option<String>,
}

impl ImageInfo {
    pub fn new(path: &Path, image: &Image) -> Self {
        Self {
            path: path.display().to_string(),
            width: image.width(),
            height: image.height(),
            format: image.format().map(|f| f.name().to_string()),
            driver: image.driver().map(|d| d.name().to_string()),
        }
    }
}

fn capabilities(name: &str) -> &'static str {
    match name {
        raster::NAME => "png, jpeg",
        magick::NAME => "png, jpeg, webp",
        pipeline::NAME => "png, jpeg, webp (file sources only)",
        _ => "custom",
    }
}

pub fn format_driver_list(registry: &DriverRegistry) -> Vec<String> {
    let mut lines = vec!["Drivers".to_string()];
    if registry.names().is_empty() {
        lines.push("    (none available)".to_string());
        return lines;
    }

    let current = registry.current_name();
    for (name, _) in registry.available() {
        let marker = if Some(name) == current { '*' } else { ' ' };
        lines.push(format!("{} {:<10} {}", marker, name, capabilities(name)));
    }
    lines
}

pub fn print_driver_list(registry: &DriverRegistry) {
    for line in format_driver_list(registry) {
        println!("{}", line);
    }
}

pub fn format_image_info(info: &ImageInfo) -> Vec<String> {
    vec![
        info.path.clone(),
        format!("    Size: {}x{}", info.width, info.height),
        format!("    Format: {}", info.format.as_deref().unwrap_or("unknown")),
        format!("    Driver: {}", info.driver.as_deref().unwrap_or("none")),
    ]
}

pub fn print_image_info(info: &ImageInfo) {
    for line in format_image_info(info) {
        println!("{}", line);
    }
}

/// One-line result of a command that wrote a file.
pub fn format_written(path: &Path, image: &Image, written: bool) -> String {
    if written {
        format!(
            "Wrote {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        )
    } else {
        format!("Nothing written to {}: encoder produced no data", path.display())
    }
}
