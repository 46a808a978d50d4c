//! Vector data source capability interface
//!
//! The translation layer reads and writes vector data exclusively through
//! the traits in this module. Data source handles are owned values; dropping
//! one releases the underlying dataset on every exit path.
//!
//! [`memory::MemoryDriver`] is a complete in-memory implementation used as
//! reference backend and test fixture.

pub mod geometry;
pub mod manager;
pub mod memory;
pub mod spatial_ref;

use geokit_core::DriverError;
use std::path::Path;
use std::sync::Arc;

pub use geometry::{Coord, Envelope, Geometry, GeometryType};
pub use manager::{DriverManager, ExportFormat, EXPORT_ID_PREFIX};
pub use memory::{MemoryDataset, MemoryDriver, MemoryLayerData, MemoryStore};
pub use spatial_ref::{CoordinateTransform, Projection, SpatialReference, SrsRef};

/// Attribute field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefn {
    pub name: String,
    /// Maximum string width, if the format limits it
    pub width: Option<usize>,
}

impl FieldDefn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: None,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }
}

/// One record of a layer: geometry, field values and a style string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    pub spatial_ref: Option<SrsRef>,
    pub fields: Vec<(String, String)>,
    pub style: Option<String>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn with_spatial_ref(mut self, srs: SrsRef) -> Self {
        self.spatial_ref = Some(srs);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(field) => field.1 = value,
            None => self.fields.push((name, value)),
        }
    }
}

/// Named styles a data source can refer to by `@name`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleTable {
    entries: Vec<(String, String)>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named style. Returns false if the name is taken.
    pub fn add(&mut self, name: impl Into<String>, style: impl Into<String>) -> bool {
        let name = name.into();
        if self.find(&name).is_some() {
            return false;
        }
        self.entries.push((name, style.into()));
        true
    }

    pub fn find(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }
}

/// What a driver can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverCapabilities {
    /// Handles vector data
    pub vector: bool,
    /// Can create new datasets
    pub create: bool,
}

/// A readable layer of features
pub trait Layer {
    fn name(&self) -> &str;

    /// The layer's spatial reference, if it declares one
    fn spatial_ref(&self) -> Option<SrsRef>;

    /// True if the extent is known without scanning all features
    fn supports_fast_extent(&self) -> bool;

    fn extent(&self) -> Option<Envelope>;

    fn field_definitions(&self) -> &[FieldDefn];

    /// Restart iteration at the first feature
    fn reset_reading(&mut self);

    /// The next feature, or `None` at the end of the layer
    fn next_feature(&mut self) -> Option<Feature>;
}

/// An open dataset
pub trait DataSource {
    /// Short name of the driver that opened this dataset
    fn driver_name(&self) -> &str;

    fn layer_count(&self) -> usize;

    fn layer(&mut self, index: usize) -> Option<&mut dyn Layer>;
}

/// A dataset being written
///
/// Layers are addressed by the index returned from
/// [`create_layer`](WritableDataSource::create_layer).
pub trait WritableDataSource {
    fn driver_name(&self) -> &str;

    fn create_layer(
        &mut self,
        name: &str,
        spatial_ref: Option<SrsRef>,
        geometry_type: GeometryType,
    ) -> Result<usize, DriverError>;

    fn create_field(&mut self, layer: usize, field: FieldDefn) -> Result<(), DriverError>;

    fn create_feature(&mut self, layer: usize, feature: Feature) -> Result<(), DriverError>;

    fn set_style_table(&mut self, table: StyleTable);
}

/// A vector format implementation
pub trait Driver: Send + Sync {
    fn short_name(&self) -> &str;

    fn long_name(&self) -> &str;

    fn capabilities(&self) -> DriverCapabilities;

    /// File extensions without the leading dot
    fn extensions(&self) -> &[String];

    /// Open a dataset read-only
    fn open(&self, path: &Path) -> Result<Box<dyn DataSource>, DriverError>;

    /// Create a new dataset, replacing an existing one
    fn create(&self, path: &Path) -> Result<Box<dyn WritableDataSource>, DriverError>;
}

/// Shared driver handle
pub type DriverHandle = Arc<dyn Driver>;
