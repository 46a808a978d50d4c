//! Unit conversion utilities
//!
//! Handles conversion between the length units that appear in feature style
//! strings and the paper millimeters used by map documents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Millimeters per typographic point (1/72 inch).
pub const MM_PER_POINT: f64 = MM_PER_INCH / 72.0;

/// Length unit of a style parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleUnit {
    /// Ground units (meters in the real world)
    Ground,
    /// Screen pixels
    Pixel,
    /// Typographic points
    Point,
    /// Paper millimeters
    Millimeter,
    /// Paper centimeters
    Centimeter,
    /// Paper inches
    Inch,
}

impl Default for StyleUnit {
    fn default() -> Self {
        Self::Millimeter
    }
}

impl fmt::Display for StyleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ground => write!(f, "g"),
            Self::Pixel => write!(f, "px"),
            Self::Point => write!(f, "pt"),
            Self::Millimeter => write!(f, "mm"),
            Self::Centimeter => write!(f, "cm"),
            Self::Inch => write!(f, "in"),
        }
    }
}

impl FromStr for StyleUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "g" => Ok(Self::Ground),
            "px" => Ok(Self::Pixel),
            "pt" => Ok(Self::Point),
            "mm" => Ok(Self::Millimeter),
            "cm" => Ok(Self::Centimeter),
            "in" => Ok(Self::Inch),
            other => Err(format!("Unknown style unit: {}", other)),
        }
    }
}

impl StyleUnit {
    /// Convert a value in this unit to paper millimeters.
    ///
    /// * `value` - Value in this unit
    /// * `scale_denominator` - Map scale, used for ground units only
    pub fn to_mm(self, value: f64, scale_denominator: f64) -> f64 {
        match self {
            Self::Ground => {
                if scale_denominator > 0.0 {
                    value * 1000.0 / scale_denominator
                } else {
                    value
                }
            }
            // Pixels are treated as points, like the style string convention does.
            Self::Pixel | Self::Point => value * MM_PER_POINT,
            Self::Millimeter => value,
            Self::Centimeter => value * 10.0,
            Self::Inch => value * MM_PER_INCH,
        }
    }
}

/// Split a length token like `"2.5mm"` into its number and unit.
///
/// A token without unit is interpreted in `default_unit`.
pub fn parse_length_token(token: &str, default_unit: StyleUnit) -> Option<(f64, StyleUnit)> {
    let token = token.trim();
    let split = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || c == 'e'))
        .unwrap_or(token.len());
    let (number, unit) = token.split_at(split);
    let value = number.parse::<f64>().ok()?;
    let unit = if unit.is_empty() {
        default_unit
    } else {
        unit.parse().ok()?
    };
    Some((value, unit))
}

/// Format a number the short way: no trailing zeros, at most six decimals.
pub fn format_number(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{:.6}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
