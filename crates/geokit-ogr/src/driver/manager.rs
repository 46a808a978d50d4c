//! Driver registry
//!
//! Drivers are tried in registration order when opening a dataset.

use super::{DataSource, DriverHandle};
use geokit_core::DriverError;
use std::path::Path;

/// Prefix of the file format ids of export drivers
pub const EXPORT_ID_PREFIX: &str = "OGR-export-";

/// A format offered for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFormat {
    /// `OGR-export-<short name>`
    pub id: String,
    /// Human readable name
    pub name: String,
    pub extensions: Vec<String>,
}

/// Registry of vector drivers
#[derive(Default)]
pub struct DriverManager {
    drivers: Vec<DriverHandle>,
}

impl DriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver; later registrations are tried last.
    pub fn register(&mut self, driver: DriverHandle) -> &mut Self {
        tracing::debug!("Registering vector driver {}", driver.short_name());
        self.drivers.push(driver);
        self
    }

    pub fn drivers(&self) -> &[DriverHandle] {
        &self.drivers
    }

    pub fn driver_by_name(&self, short_name: &str) -> Option<DriverHandle> {
        self.drivers
            .iter()
            .find(|d| d.short_name() == short_name)
            .cloned()
    }

    /// Open a dataset with the first vector driver that accepts it.
    pub fn open(&self, path: &Path) -> Result<Box<dyn DataSource>, DriverError> {
        let mut last_error = None;
        for driver in self.drivers.iter().filter(|d| d.capabilities().vector) {
            match driver.open(path) {
                Ok(source) => {
                    tracing::debug!("Opened {} with {}", path.display(), driver.short_name());
                    return Ok(source);
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| DriverError::OpenFailed {
            path: path.display().to_string(),
            reason: "No vector driver is available".to_string(),
        }))
    }

    /// True if some driver can open the dataset.
    pub fn can_read(&self, path: &Path) -> bool {
        self.open(path).is_ok()
    }

    /// Formats that can be written.
    pub fn export_formats(&self) -> Vec<ExportFormat> {
        self.drivers
            .iter()
            .filter(|d| {
                let caps = d.capabilities();
                caps.vector && caps.create && !d.extensions().is_empty()
            })
            .map(|d| {
                let id = format!("{}{}", EXPORT_ID_PREFIX, d.short_name());
                let name = if d.long_name().is_empty() {
                    id.clone()
                } else {
                    d.long_name().to_string()
                };
                ExportFormat {
                    id,
                    name,
                    extensions: d.extensions().to_vec(),
                }
            })
            .collect()
    }
}
