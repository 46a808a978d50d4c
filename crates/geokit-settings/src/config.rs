//! Import and export configuration for GeoKit
//!
//! Settings are stored as JSON or TOML, chosen by file extension, in the
//! platform configuration directory.

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum number of remembered files
pub const MAX_RECENT_FILES: usize = 10;

/// How coordinates without a spatial reference are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Projected meters, mapped through the map georeferencing
    #[default]
    Projected,
    /// Millimeters on paper, y axis pointing up
    OnPaper,
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Projected => write!(f, "projected"),
            Self::OnPaper => write!(f, "on paper"),
        }
    }
}

/// Import options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Clip imported objects to the extent of their layer
    pub clip_layers: bool,
    /// Put every source layer into its own map part
    pub separate_layers: bool,
    /// Derive the map georeferencing from the data
    pub import_georeferencing: bool,
    /// Interpretation of unreferenced coordinates
    pub unit_type: UnitType,
    /// Stop after setting up georeferencing and symbols
    pub load_symbols_only: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            clip_layers: true,
            separate_layers: false,
            import_georeferencing: true,
            unit_type: UnitType::Projected,
            load_symbols_only: false,
        }
    }
}

/// Export options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Write one layer per symbol instead of points/lines/areas layers
    pub one_layer_per_symbol: bool,
    /// Export format used last time, e.g. `OGR-export-GPX`
    pub last_format: Option<String>,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recently imported files, most recent first
    pub recent_files: Vec<PathBuf>,
    /// Import options
    pub import: ImportSettings,
    /// Export options
    pub export: ExportSettings,
}

/// On-disk representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some(other) => Err(SettingsError::UnsupportedFormat(other.to_string())),
            None => Err(SettingsError::UnsupportedFormat(String::new())),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the settings file.
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("geokit").join("settings.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = FileFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Load config from file, falling back to defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match FileFormat::from_path(path)? {
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| SettingsError::ConfigDirectory(e.to_string()))?;
            }
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if let Some(format) = &self.export.last_format {
            if format.trim().is_empty() {
                return Err(SettingsError::InvalidSetting {
                    key: "export.last_format".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        if self.recent_files.len() > MAX_RECENT_FILES {
            return Err(SettingsError::InvalidSetting {
                key: "recent_files".to_string(),
                reason: format!("at most {} entries", MAX_RECENT_FILES),
            });
        }

        Ok(())
    }

    /// Add file to recent files list
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|f| f != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}
