//! # GeoKit
//!
//! Translation between geospatial vector data sources and map documents.
//!
//! ## Architecture
//!
//! GeoKit is organized as a workspace with multiple crates:
//!
//! 1. **geokit-core** - Error taxonomy and style unit helpers
//! 2. **geokit-map** - Map document model: colors, symbols, objects, georeferencing
//! 3. **geokit-ogr** - Vector data import and export, style codec, driver interface
//! 4. **geokit-settings** - Persistent import and export options
//! 5. **geokit** - This crate, re-exporting the others and setting up logging
//!
//! ## Features
//!
//! - **Import**: points, labels, lines and areas with symbols derived from style strings
//! - **Spatial references**: one map reference per import, with coordinate transformation
//! - **Clipping**: optional clipping of imported objects to the layer extent
//! - **Export**: per-symbol style strings, three layer layouts, format quirks

pub use geokit_core as core;
pub use geokit_map as map;
pub use geokit_ogr as ogr;
pub use geokit_settings as settings;

pub use geokit_core::{DriverError, Error, FormatError, GeoreferencingError, Result};
pub use geokit_map::{Georeferencing, Map, MapObject, Symbol, SymbolId};
pub use geokit_ogr::{
    DriverManager, DriverQuirks, ExportOptions, ExportReport, ImportOptions, ImportReport,
    MemoryDriver, OgrExporter, OgrImporter,
};
pub use geokit_settings::{Config, ExportSettings, ImportSettings, SettingsError, UnitType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
///
/// Fails instead of panicking if a global subscriber is already set.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::debug!("GeoKit {} ({})", VERSION, BUILD_DATE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_logging_init_does_not_panic() {
        let _ = init_logging();
        assert!(init_logging().is_err());
    }

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert!(BUILD_DATE.ends_with("UTC"));
    }
}
