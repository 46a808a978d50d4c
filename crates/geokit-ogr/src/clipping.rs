//! Clipping of imported objects against a layer boundary
//!
//! Areas are intersected with the boundary polygon through cavalier_contours.
//! Lines are cut where they cross the boundary and only the inside runs are
//! kept. Points and texts survive if their position is inside.

use cavalier_contours::polyline::{BooleanOp, PlineSource, PlineSourceMut, PlineVertex, Polyline};
use geokit_map::{
    Map, MapCoordF, MapObject, MapRect, ObjectKind, PathObject, PathPart, SymbolType,
};
use std::panic;

/// Coordinates closer than this are treated as equal (mm).
const EPSILON: f64 = 1e-9;

/// A closed boundary in map coordinates, shared by all objects of a layer
#[derive(Debug, Clone)]
pub struct LayerClipping {
    boundary: Vec<MapCoordF>,
    extent: MapRect,
}

impl LayerClipping {
    /// Create a clipping from a ring. A repeated closing point is dropped.
    ///
    /// Returns `None` for rings with less than three distinct points.
    pub fn new(mut boundary: Vec<MapCoordF>) -> Option<Self> {
        if boundary.len() > 1 && boundary.first() == boundary.last() {
            boundary.pop();
        }
        if boundary.len() < 3 {
            return None;
        }
        let extent = MapRect::from_coords(boundary.iter())?;
        Some(Self { boundary, extent })
    }

    pub fn boundary(&self) -> &[MapCoordF] {
        &self.boundary
    }

    pub fn extent(&self) -> MapRect {
        self.extent
    }

    /// True if `p` lies inside the boundary or on its edge.
    pub fn contains(&self, p: MapCoordF) -> bool {
        point_in_ring(&self.boundary, p)
    }

    /// Clip objects, returning what remains of them.
    ///
    /// Objects entirely outside are dropped; clipped pieces keep the symbol
    /// and tags of their original.
    pub fn process(&self, map: &Map, objects: Vec<MapObject>) -> Vec<MapObject> {
        let mut result = Vec::with_capacity(objects.len());
        for object in objects {
            let Some(extent) = object.extent() else {
                continue;
            };
            if !extent.intersects(&self.extent) {
                continue;
            }
            match &object.kind {
                ObjectKind::Point(_) | ObjectKind::Text(_) => {
                    if object.primary_coord().is_some_and(|p| self.contains(p)) {
                        result.push(object);
                    }
                }
                ObjectKind::Path(_) => {
                    if map.contained_types(object.symbol).contains(SymbolType::Area) {
                        self.clip_area(object, &mut result);
                    } else {
                        self.clip_line(object, &mut result);
                    }
                }
            }
        }
        result
    }

    fn clip_area(&self, mut object: MapObject, out: &mut Vec<MapObject>) {
        let Some(path) = object.as_path_mut() else {
            return;
        };
        path.close_all_parts();
        match self.intersect_area(path) {
            Some(paths) => {
                for path in paths {
                    out.push(MapObject {
                        symbol: object.symbol,
                        kind: ObjectKind::Path(path),
                        tags: object.tags.clone(),
                    });
                }
            }
            None => {
                tracing::debug!("Area clipping failed, keeping the unclipped object");
                out.push(object);
            }
        }
    }

    /// Intersect every ring with the boundary. Clipped holes are assigned to
    /// the clipped outer ring containing them.
    fn intersect_area(&self, path: &PathObject) -> Option<Vec<PathObject>> {
        let boundary = to_polyline(&self.boundary)?;
        let mut parts = path.parts.iter();
        let outer = parts.next()?;

        let outers = intersect_ring(&to_polyline(&outer.coords)?, &boundary)?;
        let mut holes = Vec::new();
        for hole in parts {
            let Some(hole) = to_polyline(&hole.coords) else {
                continue;
            };
            holes.extend(intersect_ring(&hole, &boundary)?);
        }

        let mut results: Vec<PathObject> = outers
            .into_iter()
            .map(|ring| PathObject::from_parts(vec![closed_part(ring)]))
            .collect();
        for hole in holes {
            let Some(probe) = hole.first().copied() else {
                continue;
            };
            let owner = results
                .iter_mut()
                .find(|r| r.parts.first().is_some_and(|p| point_in_ring(&p.coords, probe)));
            if let Some(owner) = owner {
                owner.parts.push(closed_part(hole));
            }
        }
        Some(results)
    }

    fn clip_line(&self, object: MapObject, out: &mut Vec<MapObject>) {
        let Some(path) = object.as_path() else {
            return;
        };
        for part in &path.parts {
            for run in self.inside_runs(&part.coords) {
                out.push(MapObject {
                    symbol: object.symbol,
                    kind: ObjectKind::Path(PathObject::from_parts(vec![PathPart::new(run)])),
                    tags: object.tags.clone(),
                });
            }
        }
    }

    /// Split a polyline at the boundary and collect the runs inside it.
    fn inside_runs(&self, coords: &[MapCoordF]) -> Vec<Vec<MapCoordF>> {
        let mut runs = Vec::new();
        let mut current: Vec<MapCoordF> = Vec::new();
        for segment in coords.windows(2) {
            let (a, b) = (segment[0], segment[1]);
            let mut cuts = vec![0.0, 1.0];
            for edge in 0..self.boundary.len() {
                let c = self.boundary[edge];
                let d = self.boundary[(edge + 1) % self.boundary.len()];
                if let Some(t) = segment_intersection(a, b, c, d) {
                    cuts.push(t);
                }
            }
            cuts.sort_by(|x, y| x.total_cmp(y));
            cuts.dedup_by(|x, y| (*x - *y).abs() < EPSILON);

            for piece in cuts.windows(2) {
                let start = lerp(a, b, piece[0]);
                let end = lerp(a, b, piece[1]);
                if self.contains(lerp(a, b, (piece[0] + piece[1]) / 2.0)) {
                    if current.is_empty() {
                        current.push(start);
                    }
                    current.push(end);
                } else if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
        if current.len() > 1 {
            runs.push(current);
        }
        runs
    }
}

fn closed_part(coords: Vec<MapCoordF>) -> PathPart {
    let mut part = PathPart::new(coords);
    part.close();
    part
}

fn signed_area(ring: &[MapCoordF]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

/// A closed counter-clockwise polyline from a ring.
fn to_polyline(ring: &[MapCoordF]) -> Option<Polyline<f64>> {
    let mut coords: Vec<MapCoordF> = Vec::with_capacity(ring.len());
    for c in ring {
        if coords.last().is_some_and(|last| last.distance_to(c) < EPSILON) {
            continue;
        }
        coords.push(*c);
    }
    if coords.len() > 1
        && coords
            .first()
            .zip(coords.last())
            .is_some_and(|(first, last)| first.distance_to(last) < EPSILON)
    {
        coords.pop();
    }
    if coords.len() < 3 {
        return None;
    }
    if signed_area(&coords) < 0.0 {
        coords.reverse();
    }

    let mut pline = Polyline::new();
    for c in &coords {
        pline.add_vertex(PlineVertex::new(c.x, c.y, 0.0));
    }
    pline.set_is_closed(true);
    Some(pline)
}

/// Intersection of two closed polylines as rings of map coordinates.
///
/// `None` if the boolean operation fails.
fn intersect_ring(
    subject: &Polyline<f64>,
    boundary: &Polyline<f64>,
) -> Option<Vec<Vec<MapCoordF>>> {
    let result =
        panic::catch_unwind(panic::AssertUnwindSafe(|| subject.boolean(boundary, BooleanOp::And)))
            .ok()?;
    Some(
        result
            .pos_plines
            .into_iter()
            .filter(|p| p.pline.vertex_count() > 2)
            .map(|p| {
                p.pline
                    .vertex_data
                    .iter()
                    .map(|v| MapCoordF::new(v.x, v.y))
                    .collect()
            })
            .collect(),
    )
}

fn lerp(a: MapCoordF, b: MapCoordF, t: f64) -> MapCoordF {
    MapCoordF::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

fn cross(a: MapCoordF, b: MapCoordF) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Parameter along `a..b` where it crosses `c..d`, if it does.
fn segment_intersection(a: MapCoordF, b: MapCoordF, c: MapCoordF, d: MapCoordF) -> Option<f64> {
    let r = b - a;
    let s = d - c;
    let denominator = cross(r, s);
    if denominator.abs() < EPSILON {
        return None;
    }
    let t = cross(c - a, s) / denominator;
    let u = cross(c - a, r) / denominator;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some(t)
}

fn on_segment(p: MapCoordF, a: MapCoordF, b: MapCoordF) -> bool {
    cross(b - a, p - a).abs() < EPSILON
        && p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Even-odd test, with points on an edge counted as inside.
fn point_in_ring(ring: &[MapCoordF], p: MapCoordF) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        if on_segment(p, a, b) {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}
