//! # GeoKit Map
//!
//! The map document model: colors, symbols, objects, parts, tags and
//! georeferencing. The vector translation layer consumes and produces maps
//! exclusively through this public interface.

pub mod color;
pub mod coord;
pub mod georef;
pub mod map;
pub mod object;
pub mod symbol;
pub mod tags;

pub use color::{Cmyk, ColorId, MapColor, Rgb};
pub use coord::{BoundsOffset, MapCoordF, MapRect, ProjectedCoord, COORD_LIMIT_MM};
pub use georef::{Georeferencing, GeoreferencingState};
pub use map::{Map, MapPart};
pub use object::{
    HorizontalAlignment, MapObject, ObjectKind, ObjectType, PathObject, PathPart, PointObject,
    TextObject, VerticalAlignment,
};
pub use symbol::{
    AreaSymbol, CapStyle, CombinedSymbol, FillPattern, JoinStyle, LineBorder, LineBorders,
    LineSymbol, PointSymbol, Symbol, SymbolId, SymbolKind, SymbolType, SymbolTypes, TextSymbol,
};
pub use tags::Tags;
