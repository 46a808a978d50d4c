//! Symbol resolution for feature styles
//!
//! Every decoded symbol is a clone of one of the import's default symbols
//! with the decoded attributes applied. Symbols are created once per style
//! key and then shared by all features using that key.

use crate::cache::{ColorCache, StyleCache};
use crate::style::{apply_pen, symbol_rotation_deg, LabelPlacement, StyleTool, StyleToolKind};
use geokit_core::units::StyleUnit;
use geokit_map::{
    AreaSymbol, Cmyk, ColorId, LineSymbol, Map, MapColor, PointSymbol, Symbol, SymbolId,
    SymbolKind, SymbolType, TextSymbol,
};

/// The fallback colors and symbols of one import
#[derive(Debug, Clone)]
pub struct DefaultSymbols {
    pub pen_color: ColorId,
    pub brush_color: ColorId,
    pub point: SymbolId,
    pub line: SymbolId,
    pub area: SymbolId,
    pub text: SymbolId,
    point_template: Symbol,
    line_template: Symbol,
    area_template: Symbol,
    text_template: Symbol,
}

impl DefaultSymbols {
    /// Add the default colors and symbols to the map.
    pub fn create(map: &mut Map) -> Self {
        let purple = MapColor::from_cmyk("Purple", Cmyk::new(0.35, 0.85, 0.0, 0.0))
            .with_spot_color_name("PURPLE");
        let brush = MapColor::tint_of("Purple 40%", &purple, 0.8).with_opacity(0.5);
        let pen_color = map.add_color(purple);
        let brush_color = map.add_color(brush);

        let point_template = Symbol::new(
            "Point",
            SymbolKind::Point(PointSymbol {
                inner_color: Some(pen_color),
                inner_radius_mm: 0.2,
            }),
        )
        .with_number(&[0, 1]);
        let line_template = Symbol::new(
            "Line",
            SymbolKind::Line(LineSymbol {
                color: Some(pen_color),
                line_width_mm: 0.1,
                ..LineSymbol::default()
            }),
        )
        .with_number(&[0, 2]);
        let area_template = Symbol::new(
            "Area",
            SymbolKind::Area(AreaSymbol {
                color: Some(brush_color),
                fill_patterns: Vec::new(),
            }),
        )
        .with_number(&[0, 3]);
        let text_template = Symbol::new(
            "Text",
            SymbolKind::Text(TextSymbol {
                color: Some(pen_color),
                ..TextSymbol::default()
            }),
        )
        .with_number(&[0, 4]);

        Self {
            pen_color,
            brush_color,
            point: map.add_symbol(point_template.clone()),
            line: map.add_symbol(line_template.clone()),
            area: map.add_symbol(area_template.clone()),
            text: map.add_symbol(text_template.clone()),
            point_template,
            line_template,
            area_template,
            text_template,
        }
    }
}

/// A symbol chosen for a feature, with per-feature placement
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSymbol {
    pub id: SymbolId,
    pub kind: SymbolType,
    /// Marker rotation for point symbols, in degrees
    pub point_rotation_deg: Option<f64>,
    /// Label text and placement for text symbols
    pub label: Option<LabelPlacement>,
}

impl ResolvedSymbol {
    pub fn plain(id: SymbolId, kind: SymbolType) -> Self {
        Self {
            id,
            kind,
            point_rotation_deg: None,
            label: None,
        }
    }
}

/// Resolves style strings to map symbols, creating them on demand
pub struct SymbolResolver {
    defaults: DefaultSymbols,
    colors: ColorCache,
    point_symbols: StyleCache<ResolvedSymbol>,
    text_symbols: StyleCache<SymbolId>,
    line_symbols: StyleCache<SymbolId>,
    area_symbols: StyleCache<SymbolId>,
}

impl SymbolResolver {
    pub fn new(defaults: DefaultSymbols) -> Self {
        Self {
            defaults,
            colors: ColorCache::new(),
            point_symbols: StyleCache::new(),
            text_symbols: StyleCache::new(),
            line_symbols: StyleCache::new(),
            area_symbols: StyleCache::new(),
        }
    }

    pub fn defaults(&self) -> &DefaultSymbols {
        &self.defaults
    }

    /// The symbol for a style, for geometry drawn as `kind`.
    ///
    /// Styles that yield nothing usable resolve to the default symbol of the
    /// requested category.
    pub fn resolve(&mut self, map: &mut Map, kind: SymbolType, style: &str) -> ResolvedSymbol {
        match kind {
            SymbolType::Point | SymbolType::Text => {
                if let Some(cached) = self.point_symbols.get(style) {
                    return cached;
                }
                self.resolve_point_geometry(map, style).unwrap_or_else(|| {
                    ResolvedSymbol::plain(self.defaults.point, SymbolType::Point)
                })
            }
            SymbolType::Line | SymbolType::Combined => {
                if let Some(id) = self.line_symbols.get(style) {
                    return ResolvedSymbol::plain(id, SymbolType::Line);
                }
                let pen = Self::tools(map, style)
                    .into_iter()
                    .find(|t| t.kind() == StyleToolKind::Pen);
                let id = match pen {
                    Some(tool) => {
                        let id = self.line_symbol(map, &tool);
                        self.line_symbols.insert(style, id);
                        id
                    }
                    None => self.defaults.line,
                };
                ResolvedSymbol::plain(id, SymbolType::Line)
            }
            SymbolType::Area => {
                if let Some(id) = self.area_symbols.get(style) {
                    return ResolvedSymbol::plain(id, SymbolType::Area);
                }
                let brush = Self::tools(map, style)
                    .into_iter()
                    .find(|t| t.kind() == StyleToolKind::Brush);
                let id = match brush {
                    Some(tool) => {
                        let id = self.area_symbol(map, &tool);
                        self.area_symbols.insert(style, id);
                        id
                    }
                    None => self.defaults.area,
                };
                ResolvedSymbol::plain(id, SymbolType::Area)
            }
        }
    }

    fn tools(map: &Map, style: &str) -> Vec<StyleTool> {
        if style.trim().is_empty() {
            return Vec::new();
        }
        match StyleTool::parse_all(style) {
            Ok(mut tools) => {
                let scale = f64::from(map.georeferencing().scale_denominator());
                for tool in &mut tools {
                    tool.set_unit(StyleUnit::Millimeter, scale);
                }
                tools
            }
            Err(e) => {
                tracing::debug!("Ignoring style: {}", e);
                Vec::new()
            }
        }
    }

    /// First point-like interpretation of the style's tools.
    fn resolve_point_geometry(&mut self, map: &mut Map, style: &str) -> Option<ResolvedSymbol> {
        Self::tools(map, style)
            .iter()
            .find_map(|tool| match tool.kind() {
                StyleToolKind::Pen | StyleToolKind::Brush | StyleToolKind::Symbol => {
                    self.point_symbol(map, tool, style)
                }
                StyleToolKind::Label => self.label_symbol(map, tool),
            })
    }

    fn color(&mut self, map: &mut Map, color_string: &str) -> Option<ColorId> {
        self.colors
            .get_or_create(map, color_string, self.defaults.pen_color)
    }

    fn point_symbol(
        &mut self,
        map: &mut Map,
        tool: &StyleTool,
        style: &str,
    ) -> Option<ResolvedSymbol> {
        let tool_key = tool.to_style_string();
        if let Some(cached) = self.point_symbols.get(&tool_key) {
            if cached.kind != SymbolType::Point {
                return None;
            }
            self.point_symbols.insert(style, cached.clone());
            return Some(cached);
        }

        let color_string = tool.param_str(tool.kind().color_param())?;
        let color = self.color(map, color_string);
        let mut symbol = self.defaults.point_template.clone();
        if let SymbolKind::Point(point) = &mut symbol.kind {
            point.inner_color = color;
        }
        symbol.hidden = color.is_none();
        symbol.description = tool_key.clone();

        let resolved = ResolvedSymbol {
            id: map.add_symbol(symbol),
            kind: SymbolType::Point,
            point_rotation_deg: symbol_rotation_deg(tool),
            label: None,
        };
        self.point_symbols
            .register(style, &tool_key, resolved.clone());
        Some(resolved)
    }

    /// Text symbols are keyed by color and size only; the label text and
    /// placement travel with the result.
    fn label_symbol(&mut self, map: &mut Map, tool: &StyleTool) -> Option<ResolvedSymbol> {
        let placement = LabelPlacement::from_tool(tool)?;
        let color_string = tool.param_str("c").unwrap_or_default().to_string();
        let size_string = tool.param_str("s").unwrap_or_default();
        let key = format!("{}{}", color_string, size_string);

        let id = match self.text_symbols.get(&key) {
            Some(id) => id,
            None => {
                let color = self.color(map, &color_string);
                let mut symbol = self.defaults.text_template.clone();
                if let SymbolKind::Text(text) = &mut symbol.kind {
                    text.color = color;
                    if let Some(size) = tool.param_length_mm("s").filter(|s| *s > 0.0) {
                        let factor = size / text.font_size_mm;
                        text.scale(factor);
                    }
                }
                symbol.hidden = color.is_none();
                let id = map.add_symbol(symbol);
                self.text_symbols.insert(key, id);
                id
            }
        };

        Some(ResolvedSymbol {
            id,
            kind: SymbolType::Text,
            point_rotation_deg: None,
            label: Some(placement),
        })
    }

    fn line_symbol(&mut self, map: &mut Map, tool: &StyleTool) -> SymbolId {
        let tool_key = tool.to_style_string();
        if let Some(id) = self.line_symbols.get(&tool_key) {
            return id;
        }
        let mut symbol = self.defaults.line_template.clone();
        let color = tool.param_str("c").map(|c| c.to_string());
        let color = color.map(|c| self.color(map, &c));
        if let SymbolKind::Line(line) = &mut symbol.kind {
            if let Some(color) = color {
                line.color = color;
            }
            apply_pen(tool, line);
        }
        symbol.hidden = matches!(color, Some(None));
        symbol.description = tool_key.clone();
        let id = map.add_symbol(symbol);
        self.line_symbols.insert(tool_key, id);
        id
    }

    fn area_symbol(&mut self, map: &mut Map, tool: &StyleTool) -> SymbolId {
        let tool_key = tool.to_style_string();
        if let Some(id) = self.area_symbols.get(&tool_key) {
            return id;
        }
        let mut symbol = self.defaults.area_template.clone();
        let color = tool.param_str("fc").map(|c| c.to_string());
        let color = color.map(|c| self.color(map, &c));
        if let (SymbolKind::Area(area), Some(color)) = (&mut symbol.kind, color) {
            area.color = color;
        }
        symbol.hidden = matches!(color, Some(None));
        symbol.description = tool_key.clone();
        let id = map.add_symbol(symbol);
        self.area_symbols.insert(tool_key, id);
        id
    }
}
