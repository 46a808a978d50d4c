//! Map objects: points, texts and paths
//!
//! An object references its symbol by id and carries a tag set.

use crate::coord::{MapCoordF, MapRect};
use crate::symbol::SymbolId;
use crate::tags::Tags;
use serde::{Deserialize, Serialize};

/// Object category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectType {
    Point,
    Text,
    Path,
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalAlignment {
    #[default]
    Baseline,
    Center,
    Top,
    Bottom,
}

/// A single point object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointObject {
    pub position: MapCoordF,
    pub rotation_rad: f64,
}

/// A text object anchored at a single point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub anchor: MapCoordF,
    pub text: String,
    pub h_align: HorizontalAlignment,
    pub v_align: VerticalAlignment,
    pub rotation_rad: f64,
}

/// One connected run of coordinates of a path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathPart {
    pub coords: Vec<MapCoordF>,
    pub closed: bool,
}

impl PathPart {
    pub fn new(coords: Vec<MapCoordF>) -> Self {
        Self {
            coords,
            closed: false,
        }
    }

    /// Mark as closed, repeating the first coordinate at the end if needed.
    pub fn close(&mut self) {
        if let (Some(first), Some(last)) = (self.coords.first().copied(), self.coords.last()) {
            if first != *last {
                self.coords.push(first);
            }
        }
        self.closed = true;
    }
}

/// A line or area object made of one or more parts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathObject {
    pub parts: Vec<PathPart>,
}

impl PathObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(parts: Vec<PathPart>) -> Self {
        Self { parts }
    }

    /// Append a coordinate, optionally starting a new part with it.
    pub fn add_coordinate(&mut self, coord: MapCoordF, start_new_part: bool) {
        if start_new_part || self.parts.is_empty() {
            self.parts.push(PathPart::default());
        }
        if let Some(part) = self.parts.last_mut() {
            part.coords.push(coord);
        }
    }

    pub fn close_all_parts(&mut self) {
        for part in &mut self.parts {
            part.close();
        }
    }

    pub fn coordinate_count(&self) -> usize {
        self.parts.iter().map(|p| p.coords.len()).sum()
    }

    pub fn coords(&self) -> impl Iterator<Item = &MapCoordF> {
        self.parts.iter().flat_map(|p| p.coords.iter())
    }
}

/// Category-specific object data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Point(PointObject),
    Text(TextObject),
    Path(PathObject),
}

/// A map object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub symbol: SymbolId,
    pub kind: ObjectKind,
    pub tags: Tags,
}

impl MapObject {
    pub fn point(symbol: SymbolId, position: MapCoordF) -> Self {
        Self {
            symbol,
            kind: ObjectKind::Point(PointObject {
                position,
                rotation_rad: 0.0,
            }),
            tags: Tags::new(),
        }
    }

    pub fn text(symbol: SymbolId, anchor: MapCoordF, text: impl Into<String>) -> Self {
        Self {
            symbol,
            kind: ObjectKind::Text(TextObject {
                anchor,
                text: text.into(),
                h_align: HorizontalAlignment::default(),
                v_align: VerticalAlignment::default(),
                rotation_rad: 0.0,
            }),
            tags: Tags::new(),
        }
    }

    pub fn path(symbol: SymbolId, path: PathObject) -> Self {
        Self {
            symbol,
            kind: ObjectKind::Path(path),
            tags: Tags::new(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self.kind {
            ObjectKind::Point(_) => ObjectType::Point,
            ObjectKind::Text(_) => ObjectType::Text,
            ObjectKind::Path(_) => ObjectType::Path,
        }
    }

    /// The first coordinate: position, anchor or first path vertex.
    pub fn primary_coord(&self) -> Option<MapCoordF> {
        match &self.kind {
            ObjectKind::Point(p) => Some(p.position),
            ObjectKind::Text(t) => Some(t.anchor),
            ObjectKind::Path(p) => p.coords().next().copied(),
        }
    }

    pub fn extent(&self) -> Option<MapRect> {
        match &self.kind {
            ObjectKind::Point(p) => Some(MapRect::from_point(p.position)),
            ObjectKind::Text(t) => Some(MapRect::from_point(t.anchor)),
            ObjectKind::Path(p) => MapRect::from_coords(p.coords()),
        }
    }

    pub fn rotation_rad(&self) -> f64 {
        match &self.kind {
            ObjectKind::Point(p) => p.rotation_rad,
            ObjectKind::Text(t) => t.rotation_rad,
            ObjectKind::Path(_) => 0.0,
        }
    }

    pub fn set_rotation_rad(&mut self, rotation: f64) {
        match &mut self.kind {
            ObjectKind::Point(p) => p.rotation_rad = rotation,
            ObjectKind::Text(t) => t.rotation_rad = rotation,
            ObjectKind::Path(_) => {}
        }
    }

    pub fn as_path(&self) -> Option<&PathObject> {
        match &self.kind {
            ObjectKind::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_path_mut(&mut self) -> Option<&mut PathObject> {
        match &mut self.kind {
            ObjectKind::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match &self.kind {
            ObjectKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<&PointObject> {
        match &self.kind {
            ObjectKind::Point(p) => Some(p),
            _ => None,
        }
    }
}
