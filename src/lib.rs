//! # limner
//!
//! Image I/O behind interchangeable drivers. Load an image from a file, a
//! base64 blob, or a blank in-memory canvas; draw straight lines on it; save it
//! as PNG, JPEG or WebP. The same calls work whichever backend does the pixel
//! work.
//!
//! # Architecture
//!
//! ```text
//! Source ──reader──▶ bytes ──driver.create_resource──▶ Image(Resource) ──driver──▶ draw / encode ──writer──▶ file
//! ```
//!
//! - [`Context`] owns a [`DriverRegistry`] and an [`ImageIo`] orchestrator.
//! - [`ImageIo`] maps format names to readers and writers. Readers only move
//!   bytes; writers only ask the driver to encode and then write.
//! - [`Image`] holds one backend-native [`Resource`] and the [`Driver`] that
//!   made it. All pixel work is delegated to that driver.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`color`] | Hex color parsing (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`) |
//! | [`format`] | The supported formats and their names, mime types and extensions |
//! | [`source`] | File, blob and memory sources |
//! | [`handle`] | The [`Image`] handle |
//! | [`drivers`] | Driver contract, the three built-in backends, and the registry |
//! | [`io`] | Format-keyed readers and writers |
//! | [`context`] | The facade used by callers and the CLI |
//! | [`generator`] | Option-driven shape drawing |
//! | [`config`] | `limner.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Drivers
//!
//! | Driver | Strengths | Gaps |
//! |--------|-----------|------|
//! | `raster` | Exact, aliased pixels; any source | Cannot encode WebP |
//! | `magick` | Anti-aliased strokes; every source and format | |
//! | `pipeline` | Images are immutable values | File sources only; thick lines are built from parallel 1-px lines |
//!
//! A backend that cannot do something reports it (`UnsupportedSource`,
//! `UnsupportedFormat`, `UnsupportedOperation`). It never silently picks
//! another backend.
//!
//! # Alpha in Hex Colors
//!
//! The fourth hex channel is interpreted by each backend natively: `raster`
//! reads it as transparency (`00` opaque), `magick` and `pipeline` read it as
//! opacity (`ff` opaque). Callers who need identical output across backends
//! should use opaque colors.

pub mod color;
pub mod config;
pub mod context;
pub mod drivers;
pub mod format;
pub mod generator;
pub mod handle;
pub mod io;
pub mod output;
pub mod source;

pub use color::{Color, ColorError};
pub use context::{Context, Error};
pub use drivers::{
    Driver, DriverError, DriverRegistry, ImageDriver, LineParams, Point, Quality, RegistryError,
    Resource,
};
pub use format::{Format, FormatError};
pub use handle::Image;
pub use io::{ImageIo, IoError};
pub use source::{Source, SourceError};

#[cfg(test)]
pub(crate) mod test_helpers;
