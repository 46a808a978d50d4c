//! Map document
//!
//! The document owns colors, symbols and parts. Objects live in parts and
//! reference symbols by [`SymbolId`]; symbols reference colors by
//! [`ColorId`].

use crate::color::{ColorId, MapColor};
use crate::georef::Georeferencing;
use crate::object::MapObject;
use crate::symbol::{Symbol, SymbolId, SymbolKind, SymbolType, SymbolTypes};
use geokit_core::{FormatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named group of objects
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapPart {
    pub name: String,
    pub objects: Vec<MapObject>,
}

impl MapPart {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

/// A map document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    colors: Vec<MapColor>,
    symbols: Vec<Symbol>,
    parts: Vec<MapPart>,
    current_part: usize,
    georeferencing: Georeferencing,
    symbol_set_id: String,
}

impl Default for Map {
    fn default() -> Self {
        Self {
            colors: Vec::new(),
            symbols: Vec::new(),
            parts: vec![MapPart::default()],
            current_part: 0,
            georeferencing: Georeferencing::default(),
            symbol_set_id: String::new(),
        }
    }
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    // Colors

    /// Append a color; its priority becomes its table position.
    pub fn add_color(&mut self, mut color: MapColor) -> ColorId {
        let id = ColorId(self.colors.len());
        color.priority = id.0 as i32;
        self.colors.push(color);
        id
    }

    pub fn color(&self, id: ColorId) -> Option<&MapColor> {
        self.colors.get(id.0)
    }

    pub fn colors(&self) -> &[MapColor] {
        &self.colors
    }

    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    // Symbols

    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(symbol);
        id
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0)
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0)
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate().map(|(i, s)| (SymbolId(i), s))
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Symbols referenced by at least one object.
    pub fn symbols_in_use(&self) -> BTreeSet<SymbolId> {
        self.parts
            .iter()
            .flat_map(|p| p.objects.iter())
            .map(|o| o.symbol)
            .collect()
    }

    /// The categories a symbol draws as; combined symbols report their parts.
    pub fn contained_types(&self, id: SymbolId) -> SymbolTypes {
        self.contained_types_inner(id, 0)
    }

    fn contained_types_inner(&self, id: SymbolId, depth: usize) -> SymbolTypes {
        let Some(symbol) = self.symbol(id) else {
            return SymbolTypes::empty();
        };
        match &symbol.kind {
            SymbolKind::Combined(combined) if depth < 8 => combined
                .parts
                .iter()
                .flatten()
                .fold(SymbolTypes::empty(), |acc, part| {
                    acc.union(self.contained_types_inner(*part, depth + 1))
                }),
            SymbolKind::Combined(_) => SymbolTypes::empty(),
            _ => SymbolTypes::from(symbol.symbol_type()),
        }
    }

    /// Every color used by a symbol, following combined parts.
    pub fn symbol_colors(&self, id: SymbolId) -> Vec<ColorId> {
        let mut colors = Vec::new();
        self.collect_colors(id, &mut colors, 0);
        colors
    }

    fn collect_colors(&self, id: SymbolId, out: &mut Vec<ColorId>, depth: usize) {
        let Some(symbol) = self.symbol(id) else {
            return;
        };
        match &symbol.kind {
            SymbolKind::Combined(combined) => {
                if depth < 8 {
                    for part in combined.parts.iter().flatten() {
                        self.collect_colors(*part, out, depth + 1);
                    }
                }
            }
            _ => out.extend(symbol.direct_colors()),
        }
    }

    /// Lowest priority value among the symbol's colors.
    pub fn lowest_color_priority(&self, id: SymbolId) -> Option<i32> {
        self.symbol_colors(id)
            .into_iter()
            .filter_map(|c| self.color(c))
            .map(|c| c.priority)
            .min()
    }

    /// The color that best represents the symbol in a single-color context.
    pub fn guess_dominant_color(&self, id: SymbolId) -> Option<ColorId> {
        let symbol = self.symbol(id)?;
        match &symbol.kind {
            SymbolKind::Area(area) if area.color.is_some() => area.color,
            SymbolKind::Line(line) if line.color.is_some() && line.line_width_mm > 0.0 => {
                line.color
            }
            _ => {
                let colors = self.symbol_colors(id);
                colors
                    .into_iter()
                    .filter_map(|c| self.color(c).map(|color| (c, color.priority)))
                    .min_by_key(|(_, priority)| *priority)
                    .map(|(c, _)| c)
            }
        }
    }

    // Parts and objects

    pub fn parts(&self) -> &[MapPart] {
        &self.parts
    }

    pub fn part_mut(&mut self, index: usize) -> Option<&mut MapPart> {
        self.parts.get_mut(index)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Append a new part and return its index.
    pub fn add_part(&mut self, name: impl Into<String>) -> usize {
        self.parts.push(MapPart::new(name));
        self.parts.len() - 1
    }

    pub fn current_part_index(&self) -> usize {
        self.current_part
    }

    pub fn current_part(&self) -> &MapPart {
        &self.parts[self.current_part]
    }

    pub fn set_current_part(&mut self, index: usize) -> bool {
        if index < self.parts.len() {
            self.current_part = index;
            true
        } else {
            false
        }
    }

    /// Add an object to the current part.
    pub fn add_object(&mut self, object: MapObject) {
        self.parts[self.current_part].objects.push(object);
    }

    pub fn object_count(&self) -> usize {
        self.parts.iter().map(MapPart::object_count).sum()
    }

    pub fn objects(&self) -> impl Iterator<Item = &MapObject> {
        self.parts.iter().flat_map(|p| p.objects.iter())
    }

    /// Visit every object for which the predicate holds.
    pub fn apply_on_matching_objects<P, F>(&self, predicate: P, mut visitor: F)
    where
        P: Fn(&MapObject) -> bool,
        F: FnMut(&MapObject),
    {
        for object in self.objects().filter(|o| predicate(o)) {
            visitor(object);
        }
    }

    /// Visitor variant that stops at the first error.
    pub fn try_apply_on_matching_objects<P, F, E>(
        &self,
        predicate: P,
        mut visitor: F,
    ) -> std::result::Result<(), E>
    where
        P: Fn(&MapObject) -> bool,
        F: FnMut(&MapObject) -> std::result::Result<(), E>,
    {
        for object in self.objects().filter(|o| predicate(o)) {
            visitor(object)?;
        }
        Ok(())
    }

    // Document properties

    pub fn georeferencing(&self) -> &Georeferencing {
        &self.georeferencing
    }

    pub fn georeferencing_mut(&mut self) -> &mut Georeferencing {
        &mut self.georeferencing
    }

    pub fn set_georeferencing(&mut self, georef: Georeferencing) {
        self.georeferencing = georef;
    }

    pub fn symbol_set_id(&self) -> &str {
        &self.symbol_set_id
    }

    pub fn set_symbol_set_id(&mut self, id: impl Into<String>) {
        self.symbol_set_id = id.into();
    }

    /// Serialize the document as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            FormatError::Other {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load a document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let map: Map = serde_json::from_str(json).map_err(|e| FormatError::Other {
            message: e.to_string(),
        })?;
        if map.parts.is_empty() || map.current_part >= map.parts.len() {
            return Err(FormatError::Other {
                message: "map has no valid current part".to_string(),
            }
            .into());
        }
        Ok(map)
    }

    /// True if any symbol of the given category exists.
    pub fn has_symbol_type(&self, ty: SymbolType) -> bool {
        self.symbols.iter().any(|s| s.symbol_type() == ty)
    }
}
