//! Parameter types for driver operations.
//!
//! These structs describe *what* to draw or encode, not *how*. Every driver
//! receives the same values and translates them into its own native calls.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Point`] — Integer pixel coordinate; may lie outside the canvas.
//! - [`LineParams`] — A line segment with a parsed color and a stroke thickness.

use crate::color::{Color, ColorError};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Parameters for a line draw.
///
/// `thickness` below 1 is treated as 1 by every driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineParams {
    pub from: Point,
    pub to: Point,
    pub color: Color,
    pub thickness: u32,
}

impl LineParams {
    pub fn new(from: impl Into<Point>, to: impl Into<Point>, color: Color, thickness: u32) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            color,
            thickness,
        }
    }

    /// Build from a hex color string; the color is validated here, not at draw time.
    pub fn with_hex(
        from: impl Into<Point>,
        to: impl Into<Point>,
        color: &str,
        thickness: u32,
    ) -> Result<Self, ColorError> {
        Ok(Self::new(from, to, color.parse()?, thickness))
    }

    pub fn effective_thickness(&self) -> u32 {
        self.thickness.max(1)
    }

    /// Same line moved by `(dx, dy)`, color and thickness kept.
    ///
    /// Coordinates saturate at the `i32` range.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            from: Point::new(self.from.x.saturating_add(dx), self.from.y.saturating_add(dy)),
            to: Point::new(self.to.x.saturating_add(dx), self.to.y.saturating_add(dy)),
            ..*self
        }
    }
}
