//! Symbol to style string encoding
//!
//! Layer priorities are written as negative color priorities so that colors
//! drawn on top in the map also end up on top in the target.

use super::tool::escape;
use geokit_core::units::format_number;
use geokit_map::{
    AreaSymbol, ColorId, FillPattern, LineBorder, LineSymbol, Map, SymbolId, SymbolKind,
    TextSymbol,
};

/// Placeholder substituted with the object text on export
pub const LABEL_PLACEHOLDER: &str = "{Name}";

/// Maximum nesting followed in combined symbols
const MAX_COMBINED_DEPTH: usize = 8;

/// Builds style strings for the symbols of one map
pub struct StyleEncoder<'a> {
    map: &'a Map,
}

impl<'a> StyleEncoder<'a> {
    pub fn new(map: &'a Map) -> Self {
        Self { map }
    }

    /// Style string for any symbol; empty for unknown ids.
    pub fn style_for(&self, id: SymbolId) -> String {
        self.style_at_depth(id, 0)
    }

    fn style_at_depth(&self, id: SymbolId, depth: usize) -> String {
        let Some(symbol) = self.map.symbol(id) else {
            return String::new();
        };
        match &symbol.kind {
            SymbolKind::Point(_) => self.point_style(id),
            SymbolKind::Line(line) => self.line_style(id, line),
            SymbolKind::Area(area) => self.area_style(area),
            SymbolKind::Text(text) => self.text_style(text),
            SymbolKind::Combined(combined) => {
                let mut style = String::new();
                if depth >= MAX_COMBINED_DEPTH {
                    return style;
                }
                // Parts are written in reverse order.
                for part in combined.parts.iter().rev().flatten() {
                    let Some(part_symbol) = self.map.symbol(*part) else {
                        continue;
                    };
                    match &part_symbol.kind {
                        SymbolKind::Point(_) | SymbolKind::Text(_) => {
                            tracing::warn!(
                                "Cannot export point or text part of combined symbol '{}'",
                                symbol.name
                            );
                        }
                        _ => {
                            let part_style = self.style_at_depth(*part, depth + 1);
                            if !part_style.is_empty() {
                                style.push_str(&part_style);
                                style.push(';');
                            }
                        }
                    }
                }
                chop_separator(style)
            }
        }
    }

    /// `SYMBOL(id:"ogr-sym-0",c:<color>,l:<-priority>)`, or nothing for a
    /// point symbol without any color.
    pub fn point_style(&self, id: SymbolId) -> String {
        match self.map.guess_dominant_color(id) {
            Some(color) => format!(
                "SYMBOL(id:\"ogr-sym-0\",c:{},l:{})",
                self.color(color),
                self.layer(color)
            ),
            None => String::new(),
        }
    }

    pub fn line_style(&self, id: SymbolId, line: &LineSymbol) -> String {
        let mut style = String::new();
        if let Some(color) = line.color.filter(|_| line.line_width_mm > 0.0) {
            style.push_str(&self.pen(color, line.line_width_mm, None, dash_lengths(line)));
            style.push(';');
        }
        if let Some(borders) = &line.borders {
            let offset = |border: &LineBorder| {
                (line.line_width_mm + border.width_mm) / 2.0 + border.shift_mm
            };
            for (border, sign) in [(&borders.left, -1.0), (&borders.right, 1.0)] {
                let Some(color) = border.color.filter(|_| border.is_visible()) else {
                    continue;
                };
                let dashes = border
                    .dashed
                    .then_some((line.dash_length_mm, line.break_length_mm));
                style.push_str(&self.pen(
                    color,
                    border.width_mm,
                    Some(sign * offset(border)),
                    dashes,
                ));
                style.push(';');
            }
        }
        if style.is_empty() {
            if let Some(color) = self.map.guess_dominant_color(id) {
                style = format!("PEN(c:{},w:1pt,l:{})", self.color(color), self.layer(color));
            }
        }
        chop_separator(style)
    }

    pub fn area_style(&self, area: &AreaSymbol) -> String {
        let mut style = String::new();
        if let Some(color) = area.color {
            style.push_str(&format!(
                "BRUSH(fc:{},l:{});",
                self.color(color),
                self.layer(color)
            ));
        }
        for pattern in &area.fill_patterns {
            match pattern {
                FillPattern::Lines {
                    color: Some(color),
                    angle_rad,
                    ..
                } => style.push_str(&format!(
                    "BRUSH(fc:{},id:\"ogr-brush-2\",a:{},l:{});",
                    self.color(*color),
                    format_number(angle_rad.to_degrees()),
                    self.layer(*color)
                )),
                FillPattern::Lines { color: None, .. } => {}
                FillPattern::Points { .. } => {
                    tracing::warn!("Cannot export point fill patterns of area symbols");
                }
            }
        }
        chop_separator(style)
    }

    /// `LABEL(c:<color>,f:"<font>",s:<size>mm,t:"{Name}")`
    pub fn text_style(&self, text: &TextSymbol) -> String {
        let color = text
            .color
            .map(|c| format!("c:{},", self.color(c)))
            .unwrap_or_default();
        format!(
            "LABEL({}f:\"{}\",s:{}mm,t:\"{}\")",
            color,
            escape(&text.font_family),
            format_number(text.font_size_mm),
            LABEL_PLACEHOLDER
        )
    }

    fn pen(
        &self,
        color: ColorId,
        width_mm: f64,
        offset_mm: Option<f64>,
        dashes: Option<(f64, f64)>,
    ) -> String {
        let mut pen = format!("PEN(c:{},w:{}mm", self.color(color), format_number(width_mm));
        if let Some(offset) = offset_mm {
            pen.push_str(&format!(",dp:{}mm", format_number(offset)));
        }
        if let Some((dash, gap)) = dashes {
            pen.push_str(&format!(
                ",p:\"{}mm {}mm\"",
                format_number(dash),
                format_number(gap)
            ));
        }
        pen.push_str(&format!(",l:{})", self.layer(color)));
        pen
    }

    fn color(&self, id: ColorId) -> String {
        self.map
            .color(id)
            .map(|c| c.rgb.to_style_hex())
            .unwrap_or_else(|| "#000000ff".to_string())
    }

    fn layer(&self, id: ColorId) -> i32 {
        -self.map.color(id).map_or(0, |c| c.priority)
    }
}

fn dash_lengths(line: &LineSymbol) -> Option<(f64, f64)> {
    line.dashed
        .then_some((line.dash_length_mm, line.break_length_mm))
}

fn chop_separator(mut style: String) -> String {
    if style.ends_with(';') {
        style.pop();
    }
    style
}

/// Substitute the label placeholder with escaped object text.
pub fn substitute_label(style: &str, text: &str) -> String {
    style.replace(LABEL_PLACEHOLDER, &escape(text))
}
