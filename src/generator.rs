//! Option-driven drawing on top of the driver primitives.
//!
//! A [`Generator`] takes an image and a bag of options and draws into it.
//! [`ShapeGenerator`] is the only built-in one. Its options deserialize from
//! TOML or JSON with kebab-case keys:
//!
//! ```toml
//! shape = "line"
//! line-width = 5
//! line-color = "#ff0000"
//! points = [0, 0, 640, 480]
//! ```
//!
//! Only `line` maps to a driver primitive. `rectangle` and `ellipse` are
//! accepted by the option schema but fail with `UnsupportedOperation`.

use crate::color::{Color, ColorError};
use crate::drivers::{DriverError, ImageDriver, LineParams, Point};
use crate::handle::Image;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Points array must contain exactly 4 elements for line shape, got {0}")]
    InvalidPoints(usize),
    #[error(transparent)]
    InvalidColor(#[from] ColorError),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

pub trait Generator {
    type Options;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Describe the accepted options, for editors and scripting front ends.
    fn options_schema(&self) -> Vec<OptionSchema>;

    fn generate(&self, image: &mut Image, options: &Self::Options) -> Result<(), GeneratorError>;
}

/// One entry of a generator's option schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSchema {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub default: serde_json::Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Line,
    Rectangle,
    Ellipse,
}

impl Shape {
    pub fn name(self) -> &'static str {
        match self {
            Shape::Line => "line",
            Shape::Rectangle => "rectangle",
            Shape::Ellipse => "ellipse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ShapeOptions {
    pub shape: Shape,
    pub line_width: u32,
    pub line_color: String,
    pub filled: bool,
    pub fill_color: String,
    /// `[x1, y1, x2, y2]` for lines.
    pub points: Vec<i32>,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            shape: Shape::Line,
            line_width: 1,
            line_color: "#000000".to_string(),
            filled: true,
            fill_color: "#ffffff".to_string(),
            points: Vec::new(),
        }
    }
}

impl ShapeOptions {
    /// A line from `(x1, y1)` to `(x2, y2)`.
    pub fn line(points: [i32; 4], color: &str, width: u32) -> Self {
        Self {
            shape: Shape::Line,
            line_width: width,
            line_color: color.to_string(),
            points: points.to_vec(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeGenerator;

impl ShapeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for ShapeGenerator {
    type Options = ShapeOptions;

    fn name(&self) -> &str {
        "Shape Generator"
    }

    fn options_schema(&self) -> Vec<OptionSchema> {
        let d = ShapeOptions::default();
        vec![
            OptionSchema {
                name: "shape",
                kind: "string",
                default: d.shape.name().into(),
                options: vec!["line", "rectangle", "ellipse"],
            },
            OptionSchema {
                name: "line-width",
                kind: "int",
                default: d.line_width.into(),
                options: vec![],
            },
            OptionSchema {
                name: "line-color",
                kind: "string",
                default: d.line_color.into(),
                options: vec![],
            },
            OptionSchema {
                name: "filled",
                kind: "bool",
                default: d.filled.into(),
                options: vec![],
            },
            OptionSchema {
                name: "fill-color",
                kind: "string",
                default: d.fill_color.into(),
                options: vec![],
            },
            OptionSchema {
                name: "points",
                kind: "array",
                default: serde_json::Value::Array(vec![]),
                options: vec![],
            },
        ]
    }

    fn generate(&self, image: &mut Image, options: &ShapeOptions) -> Result<(), GeneratorError> {
        match options.shape {
            Shape::Line => {
                let &[x1, y1, x2, y2] = options.points.as_slice() else {
                    return Err(GeneratorError::InvalidPoints(options.points.len()));
                };
                let color: Color = options.line_color.parse()?;
                let line = LineParams::new(
                    Point::new(x1, y1),
                    Point::new(x2, y2),
                    color,
                    options.line_width,
                );
                image.draw_line(&line)?;
                Ok(())
            }
            shape @ (Shape::Rectangle | Shape::Ellipse) => {
                let driver = image
                    .driver()
                    .map(|d| d.name().to_string())
                    .unwrap_or_else(|| "none".to_string());
                Err(DriverError::UnsupportedOperation {
                    driver,
                    operation: shape.name().to_string(),
                }
                .into())
            }
        }
    }
}
