//! Map coordinates
//!
//! Map coordinates are paper millimeters, x to the right and y downwards.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Largest coordinate magnitude (mm) the document stores without an offset.
///
/// Documents keep coordinates in micrometer resolution within a 32 bit range.
pub const COORD_LIMIT_MM: f64 = 1_073_741.0;

/// A point in map coordinates (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapCoordF {
    pub x: f64,
    pub y: f64,
}

impl MapCoordF {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &MapCoordF) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// True if the coordinate fits the document's storage range.
    pub fn is_in_bounds(&self) -> bool {
        self.x.abs() <= COORD_LIMIT_MM && self.y.abs() <= COORD_LIMIT_MM
    }
}

impl Add for MapCoordF {
    type Output = MapCoordF;

    fn add(self, rhs: MapCoordF) -> MapCoordF {
        MapCoordF::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for MapCoordF {
    type Output = MapCoordF;

    fn sub(self, rhs: MapCoordF) -> MapCoordF {
        MapCoordF::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A point in projected (grid) coordinates, usually meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectedCoord {
    pub x: f64,
    pub y: f64,
}

impl ProjectedCoord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in map coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRect {
    pub min: MapCoordF,
    pub max: MapCoordF,
}

impl MapRect {
    pub fn from_point(p: MapCoordF) -> Self {
        Self { min: p, max: p }
    }

    /// Bounding rectangle of a set of coordinates.
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a MapCoordF>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut rect = Self::from_point(*first);
        for c in iter {
            rect.extend(*c);
        }
        Some(rect)
    }

    pub fn extend(&mut self, p: MapCoordF) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn unite(&mut self, other: &MapRect) {
        self.extend(other.min);
        self.extend(other.max);
    }

    /// Closed intersection test, touching rectangles intersect.
    pub fn intersects(&self, other: &MapRect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn contains(&self, p: MapCoordF) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Offset compensation for coordinates outside the storage range.
///
/// When enabled, the first out-of-range coordinate fixes an offset (rounded to
/// whole millimeters) which is subtracted from every coordinate loaded after
/// it. The owner adjusts the georeferencing afterwards so that the shifted
/// coordinates keep their real-world meaning.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundsOffset {
    enabled: bool,
    offset: MapCoordF,
    determined: bool,
}

impl BoundsOffset {
    /// Create an offset tracker, optionally enabled.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            offset: MapCoordF::default(),
            determined: false,
        }
    }

    /// Reset to zero offset.
    pub fn reset(&mut self, enabled: bool) {
        *self = Self::new(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn offset(&self) -> MapCoordF {
        self.offset
    }

    pub fn is_zero(&self) -> bool {
        self.offset.x == 0.0 && self.offset.y == 0.0
    }

    /// Apply the offset to a freshly loaded coordinate.
    pub fn apply(&mut self, coord: MapCoordF) -> MapCoordF {
        if !self.enabled {
            return coord;
        }
        if !self.determined && !coord.is_in_bounds() {
            self.offset = MapCoordF::new(coord.x.round(), coord.y.round());
            self.determined = true;
            tracing::debug!(
                "Applying bounds offset ({}, {}) mm to imported coordinates",
                self.offset.x,
                self.offset.y
            );
        }
        coord - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_arithmetic() {
        let a = MapCoordF::new(1.0, 2.0);
        let b = MapCoordF::new(0.5, -1.0);
        assert_eq!(a + b, MapCoordF::new(1.5, 1.0));
        assert_eq!(a - b, MapCoordF::new(0.5, 3.0));
        assert_eq!(MapCoordF::new(0.0, 0.0).distance_to(&MapCoordF::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_rect_intersection() {
        let a = MapRect::from_coords(&[MapCoordF::new(0.0, 0.0), MapCoordF::new(10.0, 10.0)])
            .unwrap();
        let b = MapRect::from_coords(&[MapCoordF::new(10.0, 5.0), MapCoordF::new(20.0, 6.0)])
            .unwrap();
        let c = MapRect::from_point(MapCoordF::new(30.0, 30.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(MapCoordF::new(5.0, 5.0)));
        assert!(MapRect::from_coords(&[]).is_none());
    }

    #[test]
    fn test_bounds_offset_disabled_is_identity() {
        let mut offset = BoundsOffset::new(false);
        let far = MapCoordF::new(5_000_000.0, 0.0);
        assert_eq!(offset.apply(far), far);
        assert!(offset.is_zero());
    }

    #[test]
    fn test_bounds_offset_fixed_by_first_far_coordinate() {
        let mut offset = BoundsOffset::new(true);
        let near = MapCoordF::new(10.0, 10.0);
        assert_eq!(offset.apply(near), near);
        assert!(offset.is_zero());

        let far = MapCoordF::new(5_000_000.4, -2_000_000.6);
        let shifted = offset.apply(far);
        assert!(shifted.is_in_bounds());
        assert_eq!(offset.offset(), MapCoordF::new(5_000_000.0, -2_000_001.0));

        // Later coordinates reuse the same offset
        let later = offset.apply(MapCoordF::new(5_000_010.0, -2_000_001.0));
        assert_eq!(later, MapCoordF::new(10.0, 0.0));
    }
}
