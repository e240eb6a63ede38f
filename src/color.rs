//! Hex color parsing shared by every drawing operation.
//!
//! Accepted forms (leading `#` optional):
//!
//! | Digits | Example | Meaning |
//! |---|---|---|
//! | 3 | `#f0a` | short RGB, each nibble doubled → `#ff00aa` |
//! | 4 | `#f0a8` | short RGBA, each nibble doubled |
//! | 6 | `#ff00aa` | RGB |
//! | 8 | `#ff00aa80` | RGBA |
//!
//! The parser returns the alpha byte exactly as written. Whether it means
//! opacity or transparency, and which native range it maps to, is decided by
//! each driver.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("Invalid color format '{0}': expected #RGB, #RGBA, #RRGGBB or #RRGGBBAA")]
    InvalidFormat(String),
}

/// A parsed hex color. `alpha` is `None` for the 3- and 6-digit forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: Option<u8>,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            alpha: None,
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r,
            g,
            b,
            alpha: Some(a),
        }
    }

    /// RGBA with a missing alpha read as fully opaque.
    pub fn to_opaque_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.alpha.unwrap_or(255)]
    }
}

/// Parse a hex color string. See the [module docs](self) for accepted forms.
pub fn parse_hex(input: &str) -> Result<Color, ColorError> {
    let trimmed = input.trim();
    let body = trimmed.strip_prefix('#').unwrap_or(trimmed);

    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidFormat(input.to_string()));
    }

    let expanded: String = match body.len() {
        3 | 4 => body.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => body.to_string(),
        _ => return Err(ColorError::InvalidFormat(input.to_string())),
    };

    // All digits are ASCII hex at this point, so slicing by byte is safe.
    let byte = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .map_err(|_| ColorError::InvalidFormat(input.to_string()))
    };

    let alpha = if expanded.len() == 8 {
        Some(byte(6)?)
    } else {
        None
    };

    Ok(Color {
        r: byte(0)?,
        g: byte(2)?,
        b: byte(4)?,
        alpha,
    })
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if let Some(a) = self.alpha {
            write!(f, "{:02x}", a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_rgb() {
        let c = parse_hex("#ff8000").unwrap();
        assert_eq!(c, Color::rgb(255, 128, 0));
        assert_eq!(c.alpha, None);
    }

    #[test]
    fn parses_eight_digit_rgba() {
        let c = parse_hex("#11223344").unwrap();
        assert_eq!(c, Color::rgba(0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn short_forms_match_long_forms() {
        for (short, long) in [
            ("#abc", "#aabbcc"),
            ("#f0a", "#ff00aa"),
            ("#0000", "#00000000"),
            ("#fA3c", "#ffAA33cc"),
            ("123", "112233"),
        ] {
            assert_eq!(parse_hex(short).unwrap(), parse_hex(long).unwrap(), "{short}");
        }
    }

    #[test]
    fn hash_prefix_is_optional() {
        assert_eq!(parse_hex("ffcc00").unwrap(), parse_hex("#ffcc00").unwrap());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_hex("  #fff \n").unwrap(), Color::WHITE);
    }

    #[test]
    fn invalid_lengths_are_rejected() {
        for bad in ["", "#", "#f", "#ff", "#fffff", "#fffffff", "#fffffffff", "#1234567890"] {
            assert!(
                matches!(parse_hex(bad), Err(ColorError::InvalidFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn non_hex_digits_are_rejected() {
        assert!(parse_hex("#ggg").is_err());
        assert!(parse_hex("#12345z").is_err());
        assert!(parse_hex("#ééé").is_err());
    }

    #[test]
    fn alpha_is_returned_raw() {
        // No rescaling here; drivers own the interpretation.
        assert_eq!(parse_hex("#000000ff").unwrap().alpha, Some(255));
        assert_eq!(parse_hex("#00000000").unwrap().alpha, Some(0));
    }

    #[test]
    fn from_str_and_display() {
        let c: Color = "#AbC".parse().unwrap();
        assert_eq!(c.to_string(), "#aabbcc");
        let c: Color = "#01020304".parse().unwrap();
        assert_eq!(c.to_string(), "#01020304");
    }

    #[test]
    fn opaque_rgba_defaults_alpha() {
        assert_eq!(Color::rgb(1, 2, 3).to_opaque_rgba(), [1, 2, 3, 255]);
        assert_eq!(Color::rgba(1, 2, 3, 4).to_opaque_rgba(), [1, 2, 3, 4]);
    }
}
