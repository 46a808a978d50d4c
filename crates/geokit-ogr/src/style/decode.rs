//! Style tool decoding into symbol attributes

use super::tool::{StyleTool, StyleToolKind};
use geokit_core::units::format_number;
use geokit_map::{CapStyle, HorizontalAlignment, JoinStyle, LineSymbol, VerticalAlignment};
use regex::Regex;
use std::sync::OnceLock;

/// Narrowest pen width taken literally (mm)
const MIN_PEN_WIDTH_MM: f64 = 0.01;
/// Width substituted for hairline pens (mm)
const HAIRLINE_WIDTH_MM: f64 = 0.1;
/// Shortest dash or break (mm)
const MIN_DASH_MM: f64 = 0.1;

pub fn apply_pen_width(tool: &StyleTool, line: &mut LineSymbol) {
    if let Some(mut width) = tool.param_length_mm("w") {
        if width <= MIN_PEN_WIDTH_MM {
            width = HAIRLINE_WIDTH_MM;
        }
        line.line_width_mm = width;
    }
}

pub fn apply_pen_cap(tool: &StyleTool, line: &mut LineSymbol) {
    if let Some(cap) = tool.param_str("cap") {
        line.cap_style = match cap.chars().next() {
            Some('p') => CapStyle::Square,
            Some('r') => CapStyle::Round,
            _ => CapStyle::Flat,
        };
    }
}

pub fn apply_pen_join(tool: &StyleTool, line: &mut LineSymbol) {
    if let Some(join) = tool.param_str("j") {
        line.join_style = match join.chars().next() {
            Some('b') => JoinStyle::Bevel,
            Some('r') => JoinStyle::Round,
            _ => JoinStyle::Miter,
        };
    }
}

/// Apply a `"<dash> <break>"` pattern. Patterns that cannot be read leave
/// the line solid.
pub fn apply_pen_pattern(tool: &StyleTool, line: &mut LineSymbol) {
    static PATTERN_REGEX: OnceLock<Regex> = OnceLock::new();
    let Some(pattern) = tool.param_str("p") else {
        return;
    };
    let regex = PATTERN_REGEX.get_or_init(|| {
        Regex::new(r"([0-9.]+)([a-z]*) *([0-9.]+)([a-z]*)").expect("invalid regex pattern")
    });
    let lengths = regex.captures(pattern).and_then(|caps| {
        let dash = tool.length_mm(&format!("{}{}", &caps[1], &caps[2]))?;
        let gap = tool.length_mm(&format!("{}{}", &caps[3], &caps[4]))?;
        Some((dash, gap))
    });
    match lengths {
        Some((dash, gap)) => {
            line.dashed = true;
            line.dash_length_mm = dash.max(MIN_DASH_MM);
            line.break_length_mm = gap.max(MIN_DASH_MM);
        }
        None => tracing::debug!("Failed to parse dash pattern '{}'", pattern),
    }
}

/// Apply all pen attributes to a line symbol.
pub fn apply_pen(tool: &StyleTool, line: &mut LineSymbol) {
    apply_pen_width(tool, line);
    apply_pen_cap(tool, line);
    apply_pen_join(tool, line);
    apply_pen_pattern(tool, line);
}

/// Rotation of a point marker, rounded to hundredths of a degree.
pub fn symbol_rotation_deg(tool: &StyleTool) -> Option<f64> {
    if tool.kind() != StyleToolKind::Symbol {
        return None;
    }
    tool.param_num("a").map(|a| (a * 100.0).round() / 100.0)
}

/// Alignment for a label anchor code (1..=12).
///
/// Rows are baseline, center, top and bottom; columns left, center, right.
pub fn anchor_alignment(anchor: u8) -> (HorizontalAlignment, VerticalAlignment) {
    let index = anchor.clamp(1, 12) - 1;
    let v_align = match index / 3 {
        0 => VerticalAlignment::Baseline,
        1 => VerticalAlignment::Center,
        2 => VerticalAlignment::Top,
        _ => VerticalAlignment::Bottom,
    };
    let h_align = match index % 3 {
        0 => HorizontalAlignment::Left,
        1 => HorizontalAlignment::Center,
        _ => HorizontalAlignment::Right,
    };
    (h_align, v_align)
}

/// Where and how a label is placed
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub anchor: u8,
    pub angle_deg: f64,
    pub text: String,
}

impl LabelPlacement {
    /// Read placement from a LABEL tool; `None` without a text parameter.
    pub fn from_tool(tool: &StyleTool) -> Option<Self> {
        if tool.kind() != StyleToolKind::Label {
            return None;
        }
        let text = tool.param_str("t")?.to_string();
        let anchor = tool
            .param_int("p")
            .map_or(1, |p| p.clamp(1, 12) as u8);
        let angle_deg = tool.param_num("a").unwrap_or(0.0);
        Some(Self {
            anchor,
            angle_deg,
            text,
        })
    }

    pub fn alignment(&self) -> (HorizontalAlignment, VerticalAlignment) {
        anchor_alignment(self.anchor)
    }

    /// Compact single-string form: `<100+anchor><angle> <text>`.
    pub fn to_packed(&self) -> String {
        format!(
            "{}{} {}",
            100 + u32::from(self.anchor),
            format_number(self.angle_deg),
            self.text
        )
    }

    pub fn from_packed(packed: &str) -> Option<Self> {
        let prefix = packed.get(..3)?;
        let anchor = prefix.parse::<u32>().ok()?.checked_sub(100)?;
        if !(1..=12).contains(&anchor) {
            return None;
        }
        let rest = &packed[3..];
        let (angle, text) = rest.split_once(' ')?;
        Some(Self {
            anchor: anchor as u8,
            angle_deg: angle.parse().ok()?,
            text: text.to_string(),
        })
    }
}

/// Remove embedded formatting runs (`\...;`) and expand `^I` to a tab.
pub fn clean_label_text(text: &str) -> String {
    static FORMAT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex =
        FORMAT_REGEX.get_or_init(|| Regex::new(r"(\\[^;]*;)*").expect("invalid regex pattern"));
    regex.replace_all(text, "").replace("^I", "\t")
}

/// The field name if a label is exactly a `{field}` reference.
pub fn field_reference(label: &str) -> Option<&str> {
    label
        .strip_prefix('{')?
        .strip_suffix('}')
        .filter(|name| !name.is_empty() && !name.contains(['{', '}']))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(style: &str) -> StyleTool {
        StyleTool::parse_all(style).unwrap().remove(0)
    }

    #[test]
    fn test_hairline_width_substituted() {
        let mut line = LineSymbol::default();
        apply_pen_width(&tool("PEN(w:0.005mm)"), &mut line);
        assert_eq!(line.line_width_mm, 0.1);
        apply_pen_width(&tool("PEN(w:0.35mm)"), &mut line);
        assert_eq!(line.line_width_mm, 0.35);
    }

    #[test]
    fn test_cap_and_join() {
        let mut line = LineSymbol::default();
        apply_pen(&tool("PEN(cap:p,j:b)"), &mut line);
        assert_eq!(line.cap_style, CapStyle::Square);
        assert_eq!(line.join_style, JoinStyle::Bevel);
        apply_pen(&tool("PEN(cap:r,j:r)"), &mut line);
        assert_eq!(line.cap_style, CapStyle::Round);
        assert_eq!(line.join_style, JoinStyle::Round);
        apply_pen(&tool("PEN(cap:b,j:m)"), &mut line);
        assert_eq!(line.cap_style, CapStyle::Flat);
        assert_eq!(line.join_style, JoinStyle::Miter);
    }

    #[test]
    fn test_dash_pattern() {
        let mut line = LineSymbol::default();
        apply_pen_pattern(&tool("PEN(p:\"2mm 0.05mm\")"), &mut line);
        assert!(line.dashed);
        assert_eq!(line.dash_length_mm, 2.0);
        assert_eq!(line.break_length_mm, 0.1);
    }

    #[test]
    fn test_malformed_dash_pattern_stays_solid() {
        let mut line = LineSymbol::default();
        apply_pen_pattern(&tool("PEN(p:\"dotted\")"), &mut line);
        assert!(!line.dashed);
    }

    #[test]
    fn test_anchor_table() {
        assert_eq!(
            anchor_alignment(1),
            (HorizontalAlignment::Left, VerticalAlignment::Baseline)
        );
        assert_eq!(
            anchor_alignment(5),
            (HorizontalAlignment::Center, VerticalAlignment::Center)
        );
        assert_eq!(
            anchor_alignment(9),
            (HorizontalAlignment::Right, VerticalAlignment::Top)
        );
        assert_eq!(
            anchor_alignment(10),
            (HorizontalAlignment::Left, VerticalAlignment::Bottom)
        );
    }

    #[test]
    fn test_label_placement_defaults_and_clamping() {
        let placement = LabelPlacement::from_tool(&tool("LABEL(t:\"A\",p:20)")).unwrap();
        assert_eq!(placement.anchor, 12);
        assert_eq!(placement.angle_deg, 0.0);
        let placement = LabelPlacement::from_tool(&tool("LABEL(t:\"A\")")).unwrap();
        assert_eq!(placement.anchor, 1);
        assert!(LabelPlacement::from_tool(&tool("LABEL(c:#000000)")).is_none());
    }

    #[test]
    fn test_packed_placement() {
        let placement = LabelPlacement {
            anchor: 5,
            angle_deg: 12.5,
            text: "Mill Creek".to_string(),
        };
        assert_eq!(placement.to_packed(), "10512.5 Mill Creek");
        assert_eq!(LabelPlacement::from_packed("10512.5 Mill Creek"), Some(placement));
        assert!(LabelPlacement::from_packed("099 x").is_none());
    }

    #[test]
    fn test_clean_label_text() {
        assert_eq!(clean_label_text(r"\fArial;North^IGate"), "North\tGate");
        assert_eq!(clean_label_text("plain"), "plain");
    }

    #[test]
    fn test_field_reference() {
        assert_eq!(field_reference("{name}"), Some("name"));
        assert_eq!(field_reference("{}"), None);
        assert_eq!(field_reference("name"), None);
    }

    #[test]
    fn test_symbol_rotation_rounded() {
        assert_eq!(symbol_rotation_deg(&tool("SYMBOL(a:12.3456)")), Some(12.35));
        assert_eq!(symbol_rotation_deg(&tool("SYMBOL(c:#000000)")), None);
        assert_eq!(symbol_rotation_deg(&tool("PEN(a:10)")), None);
    }
}
