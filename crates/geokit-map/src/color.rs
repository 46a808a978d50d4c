//! Map colors
//!
//! Colors are owned by the map and referenced by index. The index order is
//! the color priority: lower priority values are drawn on top.

use serde::{Deserialize, Serialize};

/// Index of a color in the map's color table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColorId(pub usize);

/// 8 bit RGB value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbbaa` with an opaque alpha byte, the form style strings use.
    pub fn to_style_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}ff", self.r, self.g, self.b)
    }
}

/// CMYK value, each channel in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cmyk {
    pub c: f32,
    pub m: f32,
    pub y: f32,
    pub k: f32,
}

impl Cmyk {
    pub const fn new(c: f32, m: f32, y: f32, k: f32) -> Self {
        Self { c, m, y, k }
    }

    pub fn from_rgb(rgb: Rgb) -> Self {
        let r = f32::from(rgb.r) / 255.0;
        let g = f32::from(rgb.g) / 255.0;
        let b = f32::from(rgb.b) / 255.0;
        let k = 1.0 - r.max(g).max(b);
        if k >= 1.0 {
            return Self::new(0.0, 0.0, 0.0, 1.0);
        }
        Self::new(
            (1.0 - r - k) / (1.0 - k),
            (1.0 - g - k) / (1.0 - k),
            (1.0 - b - k) / (1.0 - k),
            k,
        )
    }

    pub fn to_rgb(&self) -> Rgb {
        let channel = |v: f32| ((1.0 - v) * (1.0 - self.k) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(channel(self.c), channel(self.m), channel(self.y))
    }
}

/// A document color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapColor {
    pub name: String,
    /// Position in the color table; assigned by the map.
    pub priority: i32,
    pub rgb: Rgb,
    pub cmyk: Cmyk,
    pub opacity: f32,
    pub spot_color_name: Option<String>,
}

impl MapColor {
    /// Create a color from RGB, deriving CMYK.
    pub fn from_rgb(name: impl Into<String>, rgb: Rgb) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            rgb,
            cmyk: Cmyk::from_rgb(rgb),
            opacity: 1.0,
            spot_color_name: None,
        }
    }

    /// Create a color from CMYK, deriving RGB.
    pub fn from_cmyk(name: impl Into<String>, cmyk: Cmyk) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            rgb: cmyk.to_rgb(),
            cmyk,
            opacity: 1.0,
            spot_color_name: None,
        }
    }

    /// A tint of another color, as printed on white paper.
    pub fn tint_of(name: impl Into<String>, base: &MapColor, factor: f32) -> Self {
        let cmyk = Cmyk::new(
            base.cmyk.c * factor,
            base.cmyk.m * factor,
            base.cmyk.y * factor,
            base.cmyk.k * factor,
        );
        Self::from_cmyk(name, cmyk)
    }

    pub fn with_spot_color_name(mut self, name: impl Into<String>) -> Self {
        self.spot_color_name = Some(name.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}
