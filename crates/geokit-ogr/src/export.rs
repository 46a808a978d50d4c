//! # Vector Data Export
//!
//! Writes the objects of a map into a new data source.
//!
//! Supports:
//! - Point, text, line and area features with per-symbol style strings
//! - A style table with one entry per exported symbol
//! - Three layer layouts: one shared layer, one layer per symbol, or one
//!   layer per geometry category
//! - Format quirks such as WGS84-only targets and a generic layer field
//!
//! Layer creation failures skip the affected symbols. A feature which the
//! driver refuses aborts the export.

use crate::driver::{
    Coord, CoordinateTransform, DriverManager, Feature, FieldDefn, Geometry, GeometryType,
    SpatialReference, SrsRef, StyleTable, WritableDataSource, EXPORT_ID_PREFIX,
};
use crate::quirks::DriverQuirks;
use crate::srs::LOCAL_SRS_NAME;
use crate::style::{substitute_label, StyleEncoder};
use geokit_core::{DriverError, GeoreferencingError, Result};
use geokit_map::{Map, MapCoordF, MapObject, ObjectKind, Symbol, SymbolId, SymbolType};
use geokit_settings::ExportSettings;
use std::path::Path;

/// Maximum length of the name field and of labels stored in it
pub const NAME_FIELD_WIDTH: usize = 32;

const NAME_FIELD: &str = "Name";
const LAYER_FIELD: &str = "Layer";
const SINGLE_LAYER_NAME: &str = "Layer";

/// Options of one export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    /// Write every symbol into its own layer
    pub one_layer_per_symbol: bool,
}

impl From<&ExportSettings> for ExportOptions {
    fn from(settings: &ExportSettings) -> Self {
        Self {
            one_layer_per_symbol: settings.one_layer_per_symbol,
        }
    }
}

/// Outcome of an export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Short name of the driver that wrote the data
    pub driver: String,
    pub layers_created: usize,
    pub features_written: usize,
    /// Features left out because their coordinates failed to transform
    pub failed_transformation: usize,
    /// Human readable warnings, in order of occurrence
    pub warnings: Vec<String>,
}

impl ExportReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn add_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// One warning for the features left out.
    fn summarize(&mut self) {
        let count = self.failed_transformation;
        if count > 0 {
            let noun = if count == 1 { "feature" } else { "features" };
            self.add_warning(format!(
                "Unable to export {} {}, reason: Failed to transform the coordinates.",
                count, noun
            ));
        }
    }
}

/// Exports maps into vector data sources
#[derive(Debug, Clone, Default)]
pub struct OgrExporter {
    options: ExportOptions,
}

impl OgrExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export `map` to `path` with the driver named by `format_id`.
    ///
    /// `format_id` is a driver short name, optionally with the
    /// `OGR-export-` prefix of [`DriverManager::export_formats`].
    pub fn export(
        &self,
        map: &Map,
        manager: &DriverManager,
        path: &Path,
        format_id: &str,
    ) -> Result<ExportReport> {
        let driver_name = format_id.strip_prefix(EXPORT_ID_PREFIX).unwrap_or(format_id);
        let driver = manager
            .driver_by_name(driver_name)
            .filter(|d| {
                let caps = d.capabilities();
                caps.vector && caps.create
            })
            .ok_or_else(|| DriverError::UnknownDriver {
                name: driver_name.to_string(),
            })?;

        let quirks = DriverQuirks::for_driver(driver.short_name());
        tracing::debug!("Exporting with {} {:?}", driver.short_name(), quirks);

        let mut report = ExportReport {
            driver: driver.short_name().to_string(),
            ..ExportReport::default()
        };
        let georef = setup_georeferencing(map, driver.short_name(), quirks, &mut report)?;

        let data_source = driver.create(path).map_err(|e| match e {
            e @ DriverError::CreateFailed { .. } => e,
            other => DriverError::CreateFailed {
                reason: other.to_string(),
            },
        })?;

        let mut run = ExportRun {
            map,
            data_source,
            quirks,
            georef,
            style_table: StyleTable::new(),
            report,
        };
        let symbols = symbols_for_export(map);
        run.populate_style_table(&symbols);

        let base = base_name(path);
        if quirks.contains(DriverQuirks::SINGLE_LAYER) {
            run.export_single_layer(&symbols)?;
        } else if self.options.one_layer_per_symbol {
            run.export_layer_per_symbol(&symbols, &base)?;
        } else {
            run.export_layer_per_category(&symbols, &base)?;
        }

        let mut report = run.report;
        report.summarize();
        tracing::info!(
            "Exported {} features in {} layers to {}",
            report.features_written,
            report.layers_created,
            path.display()
        );
        Ok(report)
    }
}

/// Spatial reference setup of one export
struct ExportGeoreferencing {
    layer_srs: SrsRef,
    to_wgs84: Option<CoordinateTransform>,
}

fn setup_georeferencing(
    map: &Map,
    driver: &str,
    quirks: DriverQuirks,
    report: &mut ExportReport,
) -> Result<ExportGeoreferencing> {
    let georef = map.georeferencing();
    let map_srs = if georef.is_geospatial() {
        match SpatialReference::from_proj_string(georef.projected_crs_spec()) {
            Ok(srs) => Some(srs.into_ref()),
            Err(e) => {
                tracing::debug!("{}", e);
                report.add_warning(
                    "Failed to properly export the georeferencing info. Local georeferencing only.",
                );
                None
            }
        }
    } else {
        report.add_warning("The map is not georeferenced. Local georeferencing only.");
        None
    };

    let Some(map_srs) = map_srs else {
        if !quirks.contains(DriverQuirks::GEOREF_OPTIONAL) {
            return Err(GeoreferencingError::RequiredByDriver {
                driver: driver.to_string(),
            }
            .into());
        }
        return Ok(ExportGeoreferencing {
            layer_srs: SpatialReference::local(LOCAL_SRS_NAME).into_ref(),
            to_wgs84: None,
        });
    };

    if quirks.contains(DriverQuirks::NEEDS_WGS84) {
        let wgs84 = SpatialReference::wgs84().into_ref();
        let transform = CoordinateTransform::new(&map_srs, &wgs84).ok_or_else(|| {
            GeoreferencingError::NoTransformation {
                from: map_srs.name().to_string(),
                to: wgs84.name().to_string(),
            }
        })?;
        return Ok(ExportGeoreferencing {
            layer_srs: wgs84,
            to_wgs84: Some(transform),
        });
    }

    Ok(ExportGeoreferencing {
        layer_srs: map_srs,
        to_wgs84: None,
    })
}

/// Visible symbols which are used by objects, lowest color priority first.
pub fn symbols_for_export(map: &Map) -> Vec<SymbolId> {
    let mut symbols: Vec<SymbolId> = map
        .symbols_in_use()
        .into_iter()
        .filter(|id| map.symbol(*id).is_some_and(|s| !s.hidden && !s.helper))
        .collect();
    symbols.sort_by_key(|id| map.lowest_color_priority(*id).unwrap_or(i32::MAX));
    symbols
}

fn is_point_symbol(map: &Map, id: SymbolId) -> bool {
    map.contained_types(id).contains(SymbolType::Point)
}

fn is_text_symbol(map: &Map, id: SymbolId) -> bool {
    map.contained_types(id).contains(SymbolType::Text)
}

fn is_line_symbol(map: &Map, id: SymbolId) -> bool {
    match map.symbol(id).map(Symbol::symbol_type) {
        Some(SymbolType::Line) => true,
        Some(SymbolType::Combined) => !map.contained_types(id).contains(SymbolType::Area),
        _ => false,
    }
}

fn is_area_symbol(map: &Map, id: SymbolId) -> bool {
    map.contained_types(id).contains(SymbolType::Area)
}

/// File name up to the first dot.
fn base_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or_default()
        .to_string()
}

fn style_key(id: SymbolId) -> String {
    id.0.to_string()
}

fn truncated(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// A created layer and whether it carries the name field
#[derive(Debug, Clone, Copy)]
struct LayerHandle {
    index: usize,
    has_name_field: bool,
}

struct ExportRun<'a> {
    map: &'a Map,
    data_source: Box<dyn WritableDataSource>,
    quirks: DriverQuirks,
    georef: ExportGeoreferencing,
    style_table: StyleTable,
    report: ExportReport,
}

impl<'a> ExportRun<'a> {
    fn symbol_field(&self) -> &'static str {
        if self.quirks.contains(DriverQuirks::USE_LAYER_FIELD) {
            LAYER_FIELD
        } else {
            NAME_FIELD
        }
    }

    fn populate_style_table(&mut self, symbols: &[SymbolId]) {
        let encoder = StyleEncoder::new(self.map);
        for id in symbols {
            let style = encoder.style_for(*id);
            tracing::trace!("Style of symbol {}: {}", id.0, style);
            self.style_table.add(style_key(*id), style);
        }
        self.data_source.set_style_table(self.style_table.clone());
    }

    /// Create a layer; failures are reported and give `None`.
    fn create_layer(&mut self, name: &str, geometry_type: GeometryType) -> Option<LayerHandle> {
        let index = match self.data_source.create_layer(
            name,
            Some(self.georef.layer_srs.clone()),
            geometry_type,
        ) {
            Ok(index) => index,
            Err(e) => {
                self.report.add_warning(e.to_string());
                return None;
            }
        };
        self.report.layers_created += 1;

        let mut has_name_field = false;
        if !self.quirks.contains(DriverQuirks::USE_LAYER_FIELD) {
            let field = FieldDefn::new(NAME_FIELD).with_width(NAME_FIELD_WIDTH);
            match self.data_source.create_field(index, field) {
                Ok(()) => has_name_field = true,
                Err(e) => self
                    .report
                    .add_warning(format!("Failed to create name field: {}", e)),
            }
        }
        Some(LayerHandle {
            index,
            has_name_field,
        })
    }

    fn export_single_layer(&mut self, symbols: &[SymbolId]) -> Result<()> {
        let index = self
            .data_source
            .create_layer(
                SINGLE_LAYER_NAME,
                Some(self.georef.layer_srs.clone()),
                GeometryType::Unknown,
            )
            .map_err(|e| match e {
                DriverError::LayerCreation { reason, .. } => DriverError::LayerCreation {
                    layer: SINGLE_LAYER_NAME.to_string(),
                    reason,
                },
                other => other,
            })?;
        self.report.layers_created += 1;
        let layer = LayerHandle {
            index,
            has_name_field: false,
        };

        for id in symbols {
            let Some(symbol_type) = self.map.symbol(*id).map(Symbol::symbol_type) else {
                continue;
            };
            match symbol_type {
                SymbolType::Point => self.add_points(layer, *id)?,
                SymbolType::Text => self.add_texts(layer, *id)?,
                SymbolType::Line => self.add_lines(layer, *id)?,
                SymbolType::Combined if !is_area_symbol(self.map, *id) => {
                    self.add_lines(layer, *id)?
                }
                _ => self.add_areas(layer, *id)?,
            }
        }
        Ok(())
    }

    fn export_layer_per_symbol(&mut self, symbols: &[SymbolId], base: &str) -> Result<()> {
        let map = self.map;
        let layer_name = |id: SymbolId| {
            let name = map.symbol(id).map(Symbol::plain_text_name).unwrap_or_default();
            format!("{}_{}", base, name)
        };

        for id in symbols.iter().copied() {
            let point = is_point_symbol(map, id);
            let text = is_text_symbol(map, id);
            if !(point || text) {
                continue;
            }
            if let Some(layer) = self.create_layer(&layer_name(id), GeometryType::Point) {
                if point {
                    self.add_points(layer, id)?;
                }
                if text {
                    self.add_texts(layer, id)?;
                }
            }
        }
        for id in symbols.iter().copied().filter(|id| is_line_symbol(map, *id)) {
            if let Some(layer) = self.create_layer(&layer_name(id), GeometryType::LineString) {
                self.add_lines(layer, id)?;
            }
        }
        for id in symbols.iter().copied().filter(|id| is_area_symbol(map, *id)) {
            if let Some(layer) = self.create_layer(&layer_name(id), GeometryType::Polygon) {
                self.add_areas(layer, id)?;
            }
        }
        Ok(())
    }

    fn export_layer_per_category(&mut self, symbols: &[SymbolId], base: &str) -> Result<()> {
        let map = self.map;
        let select = |pred: fn(&Map, SymbolId) -> bool| -> Vec<SymbolId> {
            symbols.iter().copied().filter(|id| pred(map, *id)).collect()
        };
        let point_symbols = select(is_point_symbol);
        let text_symbols = select(is_text_symbol);
        let line_symbols = select(is_line_symbol);
        let area_symbols = select(is_area_symbol);

        // Created even when empty
        let points = self.create_layer(&format!("{}_points", base), GeometryType::Point);
        let lines = self.create_layer(&format!("{}_lines", base), GeometryType::LineString);
        let areas = self.create_layer(&format!("{}_areas", base), GeometryType::Polygon);

        if let Some(layer) = points {
            for id in &point_symbols {
                self.add_points(layer, *id)?;
            }
            for id in &text_symbols {
                self.add_texts(layer, *id)?;
            }
        }
        if let Some(layer) = lines {
            for id in &line_symbols {
                self.add_lines(layer, *id)?;
            }
        }
        if let Some(layer) = areas {
            for id in &area_symbols {
                self.add_areas(layer, *id)?;
            }
        }
        Ok(())
    }

    fn plain_name(&self, id: SymbolId) -> String {
        self.map
            .symbol(id)
            .map(|s| truncated(&s.plain_text_name(), NAME_FIELD_WIDTH))
            .unwrap_or_default()
    }

    fn projected(&self, coord: MapCoordF) -> Coord {
        let p = self.map.georeferencing().to_projected(coord);
        Coord::new(p.x, p.y)
    }

    /// Write one feature, reprojecting it first if the target needs that.
    fn write(&mut self, layer: LayerHandle, mut feature: Feature) -> Result<()> {
        if let (Some(transform), Some(geometry)) = (&self.georef.to_wgs84, &mut feature.geometry) {
            if !geometry.transform(transform) {
                self.report.failed_transformation += 1;
                tracing::debug!("Skipping a feature which failed to transform to WGS84");
                return Ok(());
            }
        }
        self.data_source.create_feature(layer.index, feature)?;
        self.report.features_written += 1;
        Ok(())
    }

    fn new_feature(&self, id: SymbolId, geometry: Geometry) -> Feature {
        let mut feature =
            Feature::new(geometry).with_field(self.symbol_field(), self.plain_name(id));
        feature.style = self.style_table.find(&style_key(id)).map(str::to_string);
        feature
    }

    fn objects_of(&self, id: SymbolId) -> Vec<&'a MapObject> {
        let map: &'a Map = self.map;
        map.objects().filter(|o| o.symbol == id).collect()
    }

    fn add_points(&mut self, layer: LayerHandle, id: SymbolId) -> Result<()> {
        for object in self.objects_of(id) {
            let ObjectKind::Point(point) = &object.kind else {
                continue;
            };
            let c = self.projected(point.position);
            let feature = self.new_feature(id, Geometry::Point(c));
            self.write(layer, feature)?;
        }
        Ok(())
    }

    fn add_texts(&mut self, layer: LayerHandle, id: SymbolId) -> Result<()> {
        for object in self.objects_of(id) {
            let ObjectKind::Text(text) = &object.kind else {
                continue;
            };
            let c = self.projected(text.anchor);
            let mut feature = self.new_feature(id, Geometry::Point(c));
            if layer.has_name_field {
                feature.set_field(NAME_FIELD, truncated(&text.text, NAME_FIELD_WIDTH));
            }
            if !layer.has_name_field || text.text.chars().count() > NAME_FIELD_WIDTH {
                feature.style = feature
                    .style
                    .as_deref()
                    .map(|style| substitute_label(style, &text.text));
            }
            self.write(layer, feature)?;
        }
        Ok(())
    }

    fn add_lines(&mut self, layer: LayerHandle, id: SymbolId) -> Result<()> {
        for object in self.objects_of(id) {
            let ObjectKind::Path(path) = &object.kind else {
                continue;
            };
            for part in path.parts.iter().filter(|p| !p.coords.is_empty()) {
                let coords = part.coords.iter().map(|c| self.projected(*c)).collect();
                let feature = self.new_feature(id, Geometry::LineString(coords));
                self.write(layer, feature)?;
            }
        }
        Ok(())
    }

    fn add_areas(&mut self, layer: LayerHandle, id: SymbolId) -> Result<()> {
        for object in self.objects_of(id) {
            let ObjectKind::Path(path) = &object.kind else {
                continue;
            };
            let rings: Vec<Vec<Coord>> = path
                .parts
                .iter()
                .filter(|p| !p.coords.is_empty())
                .map(|part| {
                    let mut ring: Vec<Coord> =
                        part.coords.iter().map(|c| self.projected(*c)).collect();
                    if ring.first() != ring.last() {
                        if let Some(first) = ring.first().copied() {
                            ring.push(first);
                        }
                    }
                    ring
                })
                .collect();
            if rings.is_empty() {
                continue;
            }
            let feature = self.new_feature(id, Geometry::Polygon(rings));
            self.write(layer, feature)?;
        }
        Ok(())
    }
}
