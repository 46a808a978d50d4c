//! GeoKit Settings Crate
//!
//! Persistent options for vector data import and export.

pub mod config;
pub mod error;

pub use config::{Config, ExportSettings, ImportSettings, UnitType, MAX_RECENT_FILES};
pub use error::{SettingsError, SettingsResult};
