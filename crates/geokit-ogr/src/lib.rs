//! # GeoKit OGR
//!
//! Translation between vector data sources and GeoKit maps.
//!
//! Importing reads every layer of a data source through the [`driver`]
//! traits, resolves one spatial reference for the whole map, derives symbols
//! from feature style strings and adds the features as map objects.
//! Exporting writes the visible objects of a map back into a new data
//! source, encoding each symbol as a style string.

pub mod cache;
pub mod clipping;
pub mod driver;
pub mod export;
pub mod import;
pub mod quirks;
pub mod srs;
pub mod style;
pub mod symbols;
pub mod transform;

pub use cache::{ColorCache, StyleCache};
pub use clipping::LayerClipping;
pub use driver::{
    DataSource, Driver, DriverCapabilities, DriverHandle, DriverManager, ExportFormat, Feature,
    FieldDefn, Geometry, GeometryType, Layer, MemoryDriver, SpatialReference, SrsRef, StyleTable,
    WritableDataSource,
};
pub use export::{symbols_for_export, ExportOptions, ExportReport, OgrExporter};
pub use import::{ImportOptions, ImportReport, OgrImporter};
pub use quirks::DriverQuirks;
pub use srs::{calc_average_lat_lon, check_georeferencing, resolve_map_srs, srs_from_map};
pub use style::{StyleEncoder, StyleTool, StyleToolKind};
pub use symbols::{DefaultSymbols, ResolvedSymbol, SymbolResolver};
pub use transform::CoordinateTransformer;
