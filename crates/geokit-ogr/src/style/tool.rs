//! Style tool parsing
//!
//! A style string is a `;`-separated list of tools such as
//! `PEN(c:#ff0000,w:2pt,p:"4px 2px");BRUSH(fc:#00ff00)`. Parameter values may
//! be quoted; inside quotes `\"` and `\\` are escapes.

use geokit_core::units::{parse_length_token, StyleUnit};
use geokit_core::FormatError;
use std::fmt;

/// Kind of a style tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleToolKind {
    Pen,
    Brush,
    Symbol,
    Label,
}

impl StyleToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pen => "PEN",
            Self::Brush => "BRUSH",
            Self::Symbol => "SYMBOL",
            Self::Label => "LABEL",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "PEN" => Some(Self::Pen),
            "BRUSH" => Some(Self::Brush),
            "SYMBOL" => Some(Self::Symbol),
            "LABEL" => Some(Self::Label),
            _ => None,
        }
    }

    /// Name of the parameter holding the tool's main color.
    pub fn color_param(&self) -> &'static str {
        match self {
            Self::Brush => "fc",
            Self::Pen | Self::Symbol | Self::Label => "c",
        }
    }
}

impl fmt::Display for StyleToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `name:value` parameter
#[derive(Debug, Clone, PartialEq)]
pub struct StyleParam {
    pub name: String,
    pub value: String,
    pub quoted: bool,
}

/// A parsed style tool
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTool {
    kind: StyleToolKind,
    params: Vec<StyleParam>,
    unit: StyleUnit,
    scale_denominator: f64,
}

impl StyleTool {
    pub fn new(kind: StyleToolKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
            unit: StyleUnit::Millimeter,
            scale_denominator: 0.0,
        }
    }

    /// Parse every tool of a style string.
    pub fn parse_all(style: &str) -> Result<Vec<StyleTool>, FormatError> {
        let invalid = |reason: String| FormatError::InvalidStyle {
            style: style.to_string(),
            reason,
        };
        if style.trim_start().starts_with('@') {
            return Err(invalid("style table references cannot be resolved here".to_string()));
        }

        let mut tools = Vec::new();
        for part in split_outside_quotes(style, ';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let open = part
                .find('(')
                .ok_or_else(|| invalid(format!("missing '(' in '{}'", part)))?;
            let body = part[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| invalid(format!("missing ')' in '{}'", part)))?;
            let kind = StyleToolKind::from_name(&part[..open])
                .ok_or_else(|| invalid(format!("unknown style tool '{}'", &part[..open])))?;

            let mut tool = StyleTool::new(kind);
            for param in split_outside_quotes(body, ',') {
                let param = param.trim();
                if param.is_empty() {
                    continue;
                }
                let (name, value) = param
                    .split_once(':')
                    .ok_or_else(|| invalid(format!("parameter '{}' has no value", param)))?;
                let (value, quoted) = unquote(value.trim());
                tool.params.push(StyleParam {
                    name: name.trim().to_string(),
                    value,
                    quoted,
                });
            }
            tools.push(tool);
        }
        Ok(tools)
    }

    pub fn kind(&self) -> StyleToolKind {
        self.kind
    }

    pub fn params(&self) -> &[StyleParam] {
        &self.params
    }

    /// Interpret unit-less lengths in `unit`, and ground units at the given
    /// map scale.
    pub fn set_unit(&mut self, unit: StyleUnit, scale_denominator: f64) {
        self.unit = unit;
        self.scale_denominator = scale_denominator;
    }

    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    /// Set a parameter. Values containing separators are quoted when written.
    pub fn set_param(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let quoted = value.contains([',', ';', ' ', '"', '(', ')']) || name == "t" || name == "f";
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(p) => {
                p.value = value;
                p.quoted = quoted;
            }
            None => self.params.push(StyleParam {
                name: name.to_string(),
                value,
                quoted,
            }),
        }
    }

    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn param_num(&self, name: &str) -> Option<f64> {
        self.param_str(name)?.trim().parse().ok()
    }

    /// Integer parameter; fractional values are truncated.
    pub fn param_int(&self, name: &str) -> Option<i64> {
        self.param_num(name).map(|v| v.trunc() as i64)
    }

    /// Length parameter converted to paper millimeters.
    pub fn param_length_mm(&self, name: &str) -> Option<f64> {
        self.length_mm(self.param_str(name)?)
    }

    /// Convert a length token in this tool's unit setting to millimeters.
    pub fn length_mm(&self, token: &str) -> Option<f64> {
        let (value, unit) = parse_length_token(token, self.unit)?;
        Some(unit.to_mm(value, self.scale_denominator))
    }

    /// Canonical text of this single tool.
    pub fn to_style_string(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| {
                if p.quoted {
                    format!("{}:\"{}\"", p.name, escape(&p.value))
                } else {
                    format!("{}:{}", p.name, p.value)
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({})", self.kind.name(), params)
    }
}

impl fmt::Display for StyleTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_style_string())
    }
}

/// Escape `"` and `\` for a quoted style value.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn unquote(value: &str) -> (String, bool) {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return (value.to_string(), false);
    };
    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next @ ('"' | '\\')) => text.push(next),
                Some(next) => {
                    text.push('\\');
                    text.push(next);
                }
                None => text.push('\\'),
            },
            _ => text.push(c),
        }
    }
    (text, true)
}

fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            _ if c == separator && !in_quotes => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Parse `#RRGGBB` or `#RRGGBBAA` into RGBA bytes; alpha defaults to 255.
pub fn get_rgb_from_string(color: &str) -> Option<(u8, u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
    Some((byte(0)?, byte(2)?, byte(4)?, alpha))
}
