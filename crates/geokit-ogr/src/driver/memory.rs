//! In-memory vector driver
//!
//! Datasets live in a [`MemoryStore`] shared between the driver and its
//! owner, keyed by path. Writers collect their output privately and commit it
//! to the store when dropped, so a dataset is always replaced as a whole.

use super::{
    DataSource, Driver, DriverCapabilities, Envelope, Feature, FieldDefn, GeometryType, Layer,
    SrsRef, StyleTable, WritableDataSource,
};
use geokit_core::DriverError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared dataset storage
pub type MemoryStore = Arc<Mutex<HashMap<PathBuf, MemoryDataset>>>;

/// Contents of one layer
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryLayerData {
    pub name: String,
    pub spatial_ref: Option<SrsRef>,
    pub geometry_type: GeometryType,
    pub fields: Vec<FieldDefn>,
    pub features: Vec<Feature>,
    pub fast_extent: bool,
    /// Extent reported instead of the features' bounding box
    pub declared_extent: Option<Envelope>,
}

impl MemoryLayerData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spatial_ref: None,
            geometry_type: GeometryType::Unknown,
            fields: Vec::new(),
            features: Vec::new(),
            fast_extent: true,
            declared_extent: None,
        }
    }

    pub fn with_spatial_ref(mut self, srs: SrsRef) -> Self {
        self.spatial_ref = Some(srs);
        self
    }

    pub fn with_field(mut self, field: FieldDefn) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Pretend the extent is expensive to compute.
    pub fn without_fast_extent(mut self) -> Self {
        self.fast_extent = false;
        self
    }

    pub fn with_extent(mut self, extent: Envelope) -> Self {
        self.declared_extent = Some(extent);
        self
    }

    /// The declared extent, or the bounding box of all feature geometries.
    pub fn extent(&self) -> Option<Envelope> {
        if self.declared_extent.is_some() {
            return self.declared_extent;
        }
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref()?.envelope())
            .reduce(|mut acc, e| {
                acc.merge(&e);
                acc
            })
    }
}

/// Contents of one dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDataset {
    pub layers: Vec<MemoryLayerData>,
    pub style_table: Option<StyleTable>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: MemoryLayerData) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&MemoryLayerData> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(|l| l.features.len()).sum()
    }
}

struct MemoryLayer {
    data: MemoryLayerData,
    cursor: usize,
}

impl Layer for MemoryLayer {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn spatial_ref(&self) -> Option<SrsRef> {
        self.data.spatial_ref.clone()
    }

    fn supports_fast_extent(&self) -> bool {
        self.data.fast_extent
    }

    fn extent(&self) -> Option<Envelope> {
        self.data.extent()
    }

    fn field_definitions(&self) -> &[FieldDefn] {
        &self.data.fields
    }

    fn reset_reading(&mut self) {
        self.cursor = 0;
    }

    fn next_feature(&mut self) -> Option<Feature> {
        let mut feature = self.data.features.get(self.cursor)?.clone();
        self.cursor += 1;
        if feature.spatial_ref.is_none() {
            feature.spatial_ref = self.data.spatial_ref.clone();
        }
        Some(feature)
    }
}

struct MemoryDataSource {
    driver_name: String,
    layers: Vec<MemoryLayer>,
}

impl DataSource for MemoryDataSource {
    fn driver_name(&self) -> &str {
        &self.driver_name
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer(&mut self, index: usize) -> Option<&mut dyn Layer> {
        self.layers
            .get_mut(index)
            .map(|layer| layer as &mut dyn Layer)
    }
}

struct MemoryWriter {
    driver_name: String,
    path: PathBuf,
    store: MemoryStore,
    dataset: MemoryDataset,
}

impl MemoryWriter {
    fn layer_mut(&mut self, index: usize) -> Result<&mut MemoryLayerData, DriverError> {
        self.dataset
            .layers
            .get_mut(index)
            .ok_or_else(|| DriverError::FeatureCreation {
                reason: format!("no layer with index {}", index),
            })
    }
}

impl WritableDataSource for MemoryWriter {
    fn driver_name(&self) -> &str {
        &self.driver_name
    }

    fn create_layer(
        &mut self,
        name: &str,
        spatial_ref: Option<SrsRef>,
        geometry_type: GeometryType,
    ) -> Result<usize, DriverError> {
        if name.is_empty() {
            return Err(DriverError::LayerCreation {
                layer: name.to_string(),
                reason: "empty layer name".to_string(),
            });
        }
        if self.dataset.layer_by_name(name).is_some() {
            return Err(DriverError::LayerCreation {
                layer: name.to_string(),
                reason: "a layer with this name already exists".to_string(),
            });
        }
        let mut layer = MemoryLayerData::new(name);
        layer.spatial_ref = spatial_ref;
        layer.geometry_type = geometry_type;
        self.dataset.layers.push(layer);
        Ok(self.dataset.layers.len() - 1)
    }

    fn create_field(&mut self, layer: usize, field: FieldDefn) -> Result<(), DriverError> {
        let data = self
            .dataset
            .layers
            .get_mut(layer)
            .ok_or_else(|| DriverError::FieldCreation {
                field: field.name.clone(),
                reason: format!("no layer with index {}", layer),
            })?;
        if data.fields.iter().any(|f| f.name == field.name) {
            return Err(DriverError::FieldCreation {
                field: field.name,
                reason: "field exists".to_string(),
            });
        }
        data.fields.push(field);
        Ok(())
    }

    fn create_feature(&mut self, layer: usize, mut feature: Feature) -> Result<(), DriverError> {
        let data = self.layer_mut(layer)?;
        for (name, value) in &mut feature.fields {
            if let Some(width) = data
                .fields
                .iter()
                .find(|f| f.name == *name)
                .and_then(|f| f.width)
            {
                if value.chars().count() > width {
                    *value = value.chars().take(width).collect();
                }
            }
        }
        data.features.push(feature);
        Ok(())
    }

    fn set_style_table(&mut self, table: StyleTable) {
        self.dataset.style_table = Some(table);
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        let dataset = std::mem::take(&mut self.dataset);
        tracing::debug!(
            "Committing {} layer(s) to {}",
            dataset.layers.len(),
            self.path.display()
        );
        self.store.lock().insert(self.path.clone(), dataset);
    }
}

/// In-memory driver
///
/// The short name is configurable so that one store can be served under
/// several format names, e.g. to exercise format-specific export handling.
pub struct MemoryDriver {
    short_name: String,
    long_name: String,
    extensions: Vec<String>,
    capabilities: DriverCapabilities,
    store: MemoryStore,
}

impl MemoryDriver {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            short_name: "Memory".to_string(),
            long_name: "In-memory vector data".to_string(),
            extensions: vec!["mem".to_string()],
            capabilities: DriverCapabilities {
                vector: true,
                create: true,
            },
            store,
        }
    }

    /// Create a fresh store.
    pub fn new_store() -> MemoryStore {
        Arc::new(Mutex::new(HashMap::new()))
    }

    pub fn with_name(
        mut self,
        short_name: impl Into<String>,
        long_name: impl Into<String>,
    ) -> Self {
        self.short_name = short_name.into();
        self.long_name = long_name.into();
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.capabilities.create = false;
        self
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    fn handles_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

impl Driver for MemoryDriver {
    fn short_name(&self) -> &str {
        &self.short_name
    }

    fn long_name(&self) -> &str {
        &self.long_name
    }

    fn capabilities(&self) -> DriverCapabilities {
        self.capabilities
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DataSource>, DriverError> {
        let open_failed = |reason: &str| DriverError::OpenFailed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };
        if !self.handles_extension(path) {
            return Err(open_failed("not recognized as a supported file format"));
        }
        let dataset = self
            .store
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| open_failed("No such file or directory"))?;
        Ok(Box::new(MemoryDataSource {
            driver_name: self.short_name.clone(),
            layers: dataset
                .layers
                .into_iter()
                .map(|data| MemoryLayer { data, cursor: 0 })
                .collect(),
        }))
    }

    fn create(&self, path: &Path) -> Result<Box<dyn WritableDataSource>, DriverError> {
        if !self.capabilities.create {
            return Err(DriverError::MissingCapability {
                driver: self.short_name.clone(),
                capability: "dataset creation".to_string(),
            });
        }
        Ok(Box::new(MemoryWriter {
            driver_name: self.short_name.clone(),
            path: path.to_path_buf(),
            store: Arc::clone(&self.store),
            dataset: MemoryDataset::new(),
        }))
    }
}
