//! Source geometries
//!
//! A geometry is a tree of points, line strings, polygons and collections
//! in the coordinates of its spatial reference.

use super::spatial_ref::CoordinateTransform;

/// A planar coordinate in source units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    pub fn from_coord(c: Coord) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    pub fn extend(&mut self, c: Coord) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    pub fn merge(&mut self, other: &Envelope) {
        self.extend(Coord::new(other.min_x, other.min_y));
        self.extend(Coord::new(other.max_x, other.max_y));
    }

    /// The envelope as a closed ring, counter-clockwise from the minimum corner.
    pub fn to_ring(&self) -> Vec<Coord> {
        vec![
            Coord::new(self.min_x, self.min_y),
            Coord::new(self.max_x, self.min_y),
            Coord::new(self.max_x, self.max_y),
            Coord::new(self.min_x, self.max_y),
            Coord::new(self.min_x, self.min_y),
        ]
    }
}

/// Geometry type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Unknown,
    Point,
    LineString,
    LinearRing,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl std::fmt::Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::LinearRing => "LinearRing",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        };
        f.write_str(name)
    }
}

/// A source geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    LinearRing(Vec<Coord>),
    /// Outer ring first, then holes
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    GeometryCollection(Vec<Geometry>),
    /// A geometry kind the translation layer does not handle (curves, TINs...)
    Unsupported { type_name: String },
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Self::Point(Coord::new(x, y))
    }

    pub fn line_string(coords: &[(f64, f64)]) -> Self {
        Self::LineString(coords.iter().copied().map(Coord::from).collect())
    }

    pub fn polygon(rings: &[&[(f64, f64)]]) -> Self {
        Self::Polygon(
            rings
                .iter()
                .map(|ring| ring.iter().copied().map(Coord::from).collect())
                .collect(),
        )
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Point(_) => GeometryType::Point,
            Self::LineString(_) => GeometryType::LineString,
            Self::LinearRing(_) => GeometryType::LinearRing,
            Self::Polygon(_) => GeometryType::Polygon,
            Self::MultiPoint(_) => GeometryType::MultiPoint,
            Self::MultiLineString(_) => GeometryType::MultiLineString,
            Self::MultiPolygon(_) => GeometryType::MultiPolygon,
            Self::GeometryCollection(_) => GeometryType::GeometryCollection,
            Self::Unsupported { .. } => GeometryType::Unknown,
        }
    }

    /// True if the geometry has no vertices. Unsupported geometries are
    /// never empty; they are reported by type instead.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Unsupported { .. } => false,
            Self::GeometryCollection(children) => children.iter().all(Geometry::is_empty),
            _ => self.vertex_count() == 0,
        }
    }

    /// Number of points of a point or curve; zero for other kinds.
    pub fn point_count(&self) -> usize {
        match self {
            Self::Point(_) => 1,
            Self::LineString(c) | Self::LinearRing(c) => c.len(),
            _ => 0,
        }
    }

    /// Total number of vertices in the tree.
    pub fn vertex_count(&self) -> usize {
        let mut count = 0;
        self.for_each_vertex(|_| count += 1);
        count
    }

    /// Visit every vertex in storage order.
    pub fn for_each_vertex<F: FnMut(Coord)>(&self, mut f: F) {
        self.visit_vertices(&mut f);
    }

    fn visit_vertices<F: FnMut(Coord)>(&self, f: &mut F) {
        match self {
            Self::Point(c) => f(*c),
            Self::LineString(cs) | Self::LinearRing(cs) | Self::MultiPoint(cs) => {
                cs.iter().copied().for_each(&mut *f)
            }
            Self::Polygon(rings) | Self::MultiLineString(rings) => {
                rings.iter().flatten().copied().for_each(&mut *f)
            }
            Self::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .flatten()
                .copied()
                .for_each(&mut *f),
            Self::GeometryCollection(children) => {
                for child in children {
                    child.visit_vertices(f);
                }
            }
            Self::Unsupported { .. } => {}
        }
    }

    pub fn envelope(&self) -> Option<Envelope> {
        let mut envelope: Option<Envelope> = None;
        self.for_each_vertex(|c| match envelope.as_mut() {
            Some(e) => e.extend(c),
            None => envelope = Some(Envelope::from_coord(c)),
        });
        envelope
    }

    /// The geometry as a single sequence of points, if it is curve-like.
    ///
    /// Multi line strings are concatenated; polygons yield their outer ring.
    pub fn force_to_line_string(&self) -> Option<Vec<Coord>> {
        match self {
            Self::LineString(c) | Self::LinearRing(c) => Some(c.clone()),
            Self::MultiLineString(lines) => Some(lines.iter().flatten().copied().collect()),
            Self::Polygon(rings) => Some(rings.first().cloned().unwrap_or_default()),
            _ => None,
        }
    }

    /// Close every ring of polygonal geometries.
    pub fn close_rings(&mut self) {
        fn close(ring: &mut Vec<Coord>) {
            if let (Some(first), Some(last)) = (ring.first().copied(), ring.last()) {
                if first != *last {
                    ring.push(first);
                }
            }
        }
        match self {
            Self::LinearRing(ring) => close(ring),
            Self::Polygon(rings) => rings.iter_mut().for_each(close),
            Self::MultiPolygon(polygons) => polygons.iter_mut().flatten().for_each(close),
            Self::GeometryCollection(children) => {
                children.iter_mut().for_each(Geometry::close_rings)
            }
            _ => {}
        }
    }

    /// Transform all vertices in place. On failure the geometry is unchanged.
    pub fn transform(&mut self, transform: &CoordinateTransform) -> bool {
        let mut transformed = self.clone();
        let mut ok = true;
        transformed.map_vertices(&mut |c| match transform.transform(c.x, c.y) {
            Some((x, y)) => Coord::new(x, y),
            None => {
                ok = false;
                c
            }
        });
        if ok {
            *self = transformed;
        }
        ok
    }

    fn map_vertices<F: FnMut(Coord) -> Coord>(&mut self, f: &mut F) {
        match self {
            Self::Point(c) => *c = f(*c),
            Self::LineString(cs) | Self::LinearRing(cs) | Self::MultiPoint(cs) => {
                cs.iter_mut().for_each(|c| *c = f(*c))
            }
            Self::Polygon(rings) | Self::MultiLineString(rings) => {
                rings.iter_mut().flatten().for_each(|c| *c = f(*c))
            }
            Self::MultiPolygon(polygons) => polygons
                .iter_mut()
                .flatten()
                .flatten()
                .for_each(|c| *c = f(*c)),
            Self::GeometryCollection(children) => {
                for child in children {
                    child.map_vertices(f);
                }
            }
            Self::Unsupported { .. } => {}
        }
    }
}
