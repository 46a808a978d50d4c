//! Map symbols
//!
//! A symbol belongs to exactly one category. Combined symbols reference other
//! symbols of the same map by id.

use crate::color::ColorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a symbol in the map's symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub usize);

/// Symbol category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolType {
    Point,
    Line,
    Area,
    Text,
    Combined,
}

impl SymbolType {
    fn bit(self) -> u8 {
        match self {
            Self::Point => 1,
            Self::Line => 2,
            Self::Area => 4,
            Self::Text => 8,
            Self::Combined => 16,
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "point"),
            Self::Line => write!(f, "line"),
            Self::Area => write!(f, "area"),
            Self::Text => write!(f, "text"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

/// Set of symbol categories, e.g. the types contained in a combined symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymbolTypes(u8);

impl SymbolTypes {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, ty: SymbolType) -> Self {
        self.0 |= ty.bit();
        self
    }

    pub fn union(self, other: SymbolTypes) -> Self {
        Self(self.0 | other.0)
    }

    pub fn contains(&self, ty: SymbolType) -> bool {
        self.0 & ty.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<SymbolType> for SymbolTypes {
    fn from(ty: SymbolType) -> Self {
        Self::empty().with(ty)
    }
}

/// Point symbol: a filled circle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSymbol {
    pub inner_color: Option<ColorId>,
    pub inner_radius_mm: f64,
}

/// Line end style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapStyle {
    Flat,
    Round,
    Square,
}

/// Line corner style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinStyle {
    Miter,
    Round,
    Bevel,
}

/// One border line running parallel to a line symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineBorder {
    pub color: Option<ColorId>,
    pub width_mm: f64,
    pub shift_mm: f64,
    pub dashed: bool,
}

impl LineBorder {
    pub fn is_visible(&self) -> bool {
        self.color.is_some() && self.width_mm > 0.0
    }
}

/// Left and right borders of a line symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineBorders {
    pub left: LineBorder,
    pub right: LineBorder,
}

/// Line symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSymbol {
    pub color: Option<ColorId>,
    pub line_width_mm: f64,
    pub cap_style: CapStyle,
    pub join_style: JoinStyle,
    pub dashed: bool,
    pub dash_length_mm: f64,
    pub break_length_mm: f64,
    pub borders: Option<LineBorders>,
}

impl Default for LineSymbol {
    fn default() -> Self {
        Self {
            color: None,
            line_width_mm: 0.0,
            cap_style: CapStyle::Flat,
            join_style: JoinStyle::Miter,
            dashed: false,
            dash_length_mm: 4.0,
            break_length_mm: 1.0,
            borders: None,
        }
    }
}

/// Area fill pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillPattern {
    /// Parallel lines
    Lines {
        color: Option<ColorId>,
        line_width_mm: f64,
        spacing_mm: f64,
        angle_rad: f64,
    },
    /// A grid of point symbols
    Points { spacing_mm: f64, angle_rad: f64 },
}

/// Area symbol
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AreaSymbol {
    pub color: Option<ColorId>,
    pub fill_patterns: Vec<FillPattern>,
}

/// Text symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSymbol {
    pub color: Option<ColorId>,
    pub font_family: String,
    pub font_size_mm: f64,
}

impl Default for TextSymbol {
    fn default() -> Self {
        Self {
            color: None,
            font_family: "Arial".to_string(),
            font_size_mm: 4.0,
        }
    }
}

impl TextSymbol {
    /// Scale all dimensions by a factor.
    pub fn scale(&mut self, factor: f64) {
        self.font_size_mm *= factor;
    }
}

/// Combined symbol: a stack of other symbols drawn together
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedSymbol {
    pub parts: Vec<Option<SymbolId>>,
}

/// Category-specific symbol definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SymbolKind {
    Point(PointSymbol),
    Line(LineSymbol),
    Area(AreaSymbol),
    Text(TextSymbol),
    Combined(CombinedSymbol),
}

/// A map symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub number: Vec<u32>,
    pub description: String,
    pub hidden: bool,
    pub helper: bool,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            number: Vec::new(),
            description: String::new(),
            hidden: false,
            helper: false,
            kind,
        }
    }

    pub fn with_number(mut self, number: &[u32]) -> Self {
        self.number = number.to_vec();
        self
    }

    pub fn symbol_type(&self) -> SymbolType {
        match self.kind {
            SymbolKind::Point(_) => SymbolType::Point,
            SymbolKind::Line(_) => SymbolType::Line,
            SymbolKind::Area(_) => SymbolType::Area,
            SymbolKind::Text(_) => SymbolType::Text,
            SymbolKind::Combined(_) => SymbolType::Combined,
        }
    }

    /// Symbol number as text, e.g. `"0.2"`.
    pub fn number_as_string(&self) -> String {
        self.number
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The name without markup.
    pub fn plain_text_name(&self) -> String {
        let mut plain = String::with_capacity(self.name.len());
        let mut in_tag = false;
        for c in self.name.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => plain.push(c),
                _ => {}
            }
        }
        plain
    }

    /// Colors referenced directly by this symbol, in drawing order.
    pub fn direct_colors(&self) -> Vec<ColorId> {
        let mut colors = Vec::new();
        match &self.kind {
            SymbolKind::Point(p) => colors.extend(p.inner_color),
            SymbolKind::Line(l) => {
                colors.extend(l.color);
                if let Some(borders) = &l.borders {
                    colors.extend(borders.left.color);
                    colors.extend(borders.right.color);
                }
            }
            SymbolKind::Area(a) => {
                colors.extend(a.color);
                for pattern in &a.fill_patterns {
                    if let FillPattern::Lines { color: Some(c), .. } = pattern {
                        colors.push(*c);
                    }
                }
            }
            SymbolKind::Text(t) => colors.extend(t.color),
            SymbolKind::Combined(_) => {}
        }
        colors
    }

    pub fn as_point(&self) -> Option<&PointSymbol> {
        match &self.kind {
            SymbolKind::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_line(&self) -> Option<&LineSymbol> {
        match &self.kind {
            SymbolKind::Line(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_area(&self) -> Option<&AreaSymbol> {
        match &self.kind {
            SymbolKind::Area(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextSymbol> {
        match &self.kind {
            SymbolKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_combined(&self) -> Option<&CombinedSymbol> {
        match &self.kind {
            SymbolKind::Combined(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_types_set() {
        let types = SymbolTypes::from(SymbolType::Line).with(SymbolType::Area);
        assert!(types.contains(SymbolType::Line));
        assert!(types.contains(SymbolType::Area));
        assert!(!types.contains(SymbolType::Point));
        assert!(SymbolTypes::empty().is_empty());
    }

    #[test]
    fn test_plain_text_name_strips_markup() {
        let symbol = Symbol::new("Road <b>major</b>", SymbolKind::Line(LineSymbol::default()));
        assert_eq!(symbol.plain_text_name(), "Road major");
    }

    #[test]
    fn test_number_as_string() {
        let symbol =
            Symbol::new("Area", SymbolKind::Area(AreaSymbol::default())).with_number(&[0, 3]);
        assert_eq!(symbol.number_as_string(), "0.3");
        assert_eq!(symbol.symbol_type(), SymbolType::Area);
    }

    #[test]
    fn test_text_symbol_scale() {
        let mut text = TextSymbol::default();
        text.scale(2.5);
        assert_eq!(text.font_size_mm, 10.0);
    }

    #[test]
    fn test_border_visibility() {
        let border = LineBorder {
            color: Some(ColorId(1)),
            width_mm: 0.2,
            shift_mm: 0.1,
            dashed: false,
        };
        assert!(border.is_visible());
        let invisible = LineBorder { color: None, ..border };
        assert!(!invisible.is_visible());
    }
}
