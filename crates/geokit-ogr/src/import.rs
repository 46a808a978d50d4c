//! # Vector Data Import
//!
//! Reads the layers of a data source into a map.
//!
//! Supports:
//! - Spatial reference resolution for the whole map
//! - Point, text, line and area objects from simple and multi geometries
//! - Symbols derived from feature style strings
//! - Field values as object tags
//! - Optional clipping to the layer extent
//! - One map part per source layer
//!
//! Features which cannot be imported are counted per reason and reported
//! once at the end.

use crate::clipping::LayerClipping;
use crate::driver::{Coord, DataSource, DriverManager, Feature, Geometry, Layer};
use crate::srs;
use crate::style::{clean_label_text, field_reference};
use crate::symbols::{DefaultSymbols, SymbolResolver};
use crate::transform::CoordinateTransformer;
use geokit_core::units::format_number;
use geokit_core::{FormatError, Result};
use geokit_map::{
    Georeferencing, Map, MapCoordF, MapObject, ObjectKind, PathObject, SymbolType, Tags,
};
use geokit_settings::{ImportSettings, UnitType};
use std::path::Path;

/// Layer name of GPX track points, which duplicate the track lines
pub const TRACK_POINTS_LAYER: &str = "track_points";

/// Tag holding the rotation of imported point objects, in degrees
pub const ROTATION_TAG: &str = "Rotation";

/// Options of one import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub clip_layers: bool,
    pub separate_layers: bool,
    pub import_georeferencing: bool,
    pub unit_type: UnitType,
    pub load_symbols_only: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from(&ImportSettings::default())
    }
}

impl From<&ImportSettings> for ImportOptions {
    fn from(settings: &ImportSettings) -> Self {
        Self {
            clip_layers: settings.clip_layers,
            separate_layers: settings.separate_layers,
            import_georeferencing: settings.import_georeferencing,
            unit_type: settings.unit_type,
            load_symbols_only: settings.load_symbols_only,
        }
    }
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Features without geometry or with an empty one
    pub empty_geometries: usize,
    /// Features whose reference cannot be transformed into the map reference
    pub no_transformation: usize,
    /// Features whose coordinates failed to transform
    pub failed_transformation: usize,
    /// Geometries of an unknown or unsupported type
    pub unsupported_geometry_type: usize,
    /// Lines with less than two points, areas with less than three
    pub too_few_coordinates: usize,
    /// Objects added to the map
    pub imported_objects: usize,
    /// Layers read
    pub imported_layers: usize,
    /// Human readable warnings, in order of occurrence
    pub warnings: Vec<String>,
}

impl ImportReport {
    /// Total number of features or geometries that were dropped.
    pub fn dropped(&self) -> usize {
        self.empty_geometries
            + self.no_transformation
            + self.failed_transformation
            + self.unsupported_geometry_type
            + self.too_few_coordinates
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn add_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// One warning per category with dropped objects.
    fn summarize(&mut self, map_srs_name: &str) {
        let categories = [
            (self.empty_geometries, "Empty geometry.".to_string()),
            (
                self.no_transformation,
                format!(
                    "Can't determine the coordinate transformation: no transformation into {}",
                    map_srs_name
                ),
            ),
            (
                self.failed_transformation,
                "Failed to transform the coordinates.".to_string(),
            ),
            (
                self.unsupported_geometry_type,
                "Unknown or unsupported geometry type.".to_string(),
            ),
            (self.too_few_coordinates, "Not enough coordinates.".to_string()),
        ];
        for (count, reason) in categories {
            if count > 0 {
                let noun = if count == 1 { "object" } else { "objects" };
                self.add_warning(format!(
                    "Unable to load {} {}, reason: {}",
                    count, noun, reason
                ));
            }
        }
    }
}

/// Imports vector data sources into maps
#[derive(Debug, Clone, Default)]
pub struct OgrImporter {
    options: ImportOptions,
}

impl OgrImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Open `path` with the first driver able to read it and import it.
    pub fn import_path(
        &self,
        manager: &DriverManager,
        path: &Path,
        map: &mut Map,
    ) -> Result<ImportReport> {
        let mut data_source = manager.open(path).map_err(|e| {
            tracing::warn!("{}", e);
            e
        })?;
        tracing::info!(
            "Importing {} with the {} driver",
            path.display(),
            data_source.driver_name()
        );
        self.import_data_source(data_source.as_mut(), map)
    }

    /// Import an open data source.
    ///
    /// Fails only if no map reference can be established. Everything else
    /// is counted on the report.
    pub fn import_data_source(
        &self,
        data_source: &mut dyn DataSource,
        map: &mut Map,
    ) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        map.set_symbol_set_id(data_source.driver_name());

        let map_srs = if self.options.import_georeferencing {
            srs::resolve_map_srs(data_source, map, &mut report.warnings)?
        } else {
            srs::srs_from_map(map, &mut report.warnings)
        };
        tracing::debug!("Map reference: {}", map_srs.name());

        let defaults = DefaultSymbols::create(map);
        let mut run = ImportRun {
            options: self.options,
            map,
            resolver: SymbolResolver::new(defaults),
            transformer: CoordinateTransformer::new(map_srs, self.options.unit_type),
            report,
        };

        if !self.options.load_symbols_only {
            run.import_layers(data_source);
            run.apply_bounds_offset();
        }

        let map_srs_name = run.transformer.map_srs().name().to_string();
        let mut report = run.report;
        report.summarize(&map_srs_name);
        tracing::info!(
            "Imported {} objects from {} layers, {} dropped",
            report.imported_objects,
            report.imported_layers,
            report.dropped()
        );
        Ok(report)
    }
}

/// State of one running import
struct ImportRun<'a> {
    options: ImportOptions,
    map: &'a mut Map,
    resolver: SymbolResolver,
    transformer: CoordinateTransformer,
    report: ImportReport,
}

impl ImportRun<'_> {
    fn import_layers(&mut self, data_source: &mut dyn DataSource) {
        self.transformer.reset_bounds_offset(true);
        for index in 0..data_source.layer_count() {
            let Some(layer) = data_source.layer(index) else {
                self.report
                    .add_warning(FormatError::MissingLayer { index }.to_string());
                continue;
            };
            if layer.name() == TRACK_POINTS_LAYER {
                tracing::debug!("Skipping layer {}", TRACK_POINTS_LAYER);
                continue;
            }
            if self.options.separate_layers {
                self.enter_part(layer.name());
            }
            self.import_layer(layer);
            self.report.imported_layers += 1;
        }
    }

    /// Make a part for the layer current. An empty current part is reused.
    fn enter_part(&mut self, layer_name: &str) {
        if self.map.current_part().object_count() == 0 {
            let current = self.map.current_part_index();
            if let Some(part) = self.map.part_mut(current) {
                part.name = layer_name.to_string();
            }
        } else {
            let index = self.map.add_part(layer_name);
            self.map.set_current_part(index);
        }
    }

    fn import_layer(&mut self, layer: &mut dyn Layer) {
        let clipping = if self.options.clip_layers && layer.supports_fast_extent() {
            self.layer_clipping(layer)
        } else {
            None
        };

        layer.reset_reading();
        while let Some(feature) = layer.next_feature() {
            match feature.geometry.as_ref() {
                Some(geometry) if !geometry.is_empty() => {
                    let geometry = geometry.clone();
                    self.import_feature(&feature, geometry, clipping.as_ref());
                }
                _ => self.report.empty_geometries += 1,
            }
        }
    }

    /// The layer extent as clipping boundary in map coordinates.
    fn layer_clipping(&mut self, layer: &dyn Layer) -> Option<LayerClipping> {
        let envelope = layer.extent()?;
        let layer_srs = layer.spatial_ref();
        if !self.transformer.set_reference(layer_srs.as_ref()) {
            self.report.no_transformation += 1;
            return None;
        }
        let mut outline = Geometry::LinearRing(envelope.to_ring());
        if layer_srs.is_some() && !self.transformer.transform_geometry(&mut outline) {
            self.report.failed_transformation += 1;
            return None;
        }
        let Geometry::LinearRing(ring) = outline else {
            return None;
        };
        let boundary = map_coords(&mut self.transformer, self.map.georeferencing(), &ring);
        LayerClipping::new(boundary)
    }

    fn import_feature(
        &mut self,
        feature: &Feature,
        mut geometry: Geometry,
        clipping: Option<&LayerClipping>,
    ) {
        let srs = feature.spatial_ref.as_ref();
        if !self.transformer.set_reference(srs) {
            self.report.no_transformation += 1;
            return;
        }
        if srs.is_some() && !self.transformer.transform_geometry(&mut geometry) {
            self.report.failed_transformation += 1;
            return;
        }

        let style = feature.style.as_deref().unwrap_or_default();
        let mut objects = Vec::new();
        self.import_geometry(feature, style, &geometry, &mut objects);
        let tags = import_fields(feature);

        if let Some(clipping) = clipping {
            objects = clipping.process(self.map, objects);
        }

        for mut object in objects {
            let mut merged = tags.clone();
            merged.merge_from(&object.tags);
            object.tags = merged;
            self.map.add_object(object);
            self.report.imported_objects += 1;
        }
    }

    fn import_geometry(
        &mut self,
        feature: &Feature,
        style: &str,
        geometry: &Geometry,
        out: &mut Vec<MapObject>,
    ) {
        match geometry {
            Geometry::Point(c) => out.extend(self.import_point(feature, style, *c)),
            Geometry::LineString(coords) | Geometry::LinearRing(coords) => {
                out.extend(self.import_line_string(style, coords))
            }
            Geometry::Polygon(rings) => out.extend(self.import_polygon(style, rings)),
            Geometry::MultiPoint(points) => {
                for c in points {
                    out.extend(self.import_point(feature, style, *c));
                }
            }
            Geometry::MultiLineString(lines) => {
                for coords in lines {
                    out.extend(self.import_line_string(style, coords));
                }
            }
            Geometry::MultiPolygon(polygons) => {
                for rings in polygons {
                    out.extend(self.import_polygon(style, rings));
                }
            }
            Geometry::GeometryCollection(children) => {
                for child in children {
                    self.import_geometry(feature, style, child, out);
                }
            }
            Geometry::Unsupported { type_name } => {
                tracing::debug!("Unknown or unsupported geometry type: {}", type_name);
                self.report.unsupported_geometry_type += 1;
            }
        }
    }

    fn map_coord(&mut self, c: Coord) -> MapCoordF {
        self.transformer
            .to_map_coord(c.x, c.y, self.map.georeferencing())
    }

    /// A point object, or a text object if the style resolves to a label.
    fn import_point(&mut self, feature: &Feature, style: &str, c: Coord) -> Option<MapObject> {
        let resolved = self.resolver.resolve(self.map, SymbolType::Point, style);
        if resolved.kind == SymbolType::Text {
            let placement = resolved.label?;
            let label = match field_reference(&placement.text).and_then(|f| feature.field(f)) {
                Some(value) => clean_label_text(value),
                None => clean_label_text(&placement.text),
            };
            if label.is_empty() {
                return None;
            }
            let mut object = MapObject::text(resolved.id, self.map_coord(c), label);
            if let ObjectKind::Text(text) = &mut object.kind {
                (text.h_align, text.v_align) = placement.alignment();
            }
            object.set_rotation_rad(placement.angle_deg.to_radians());
            return Some(object);
        }

        let mut object = MapObject::point(resolved.id, self.map_coord(c));
        if let Some(angle) = resolved.point_rotation_deg {
            object.set_rotation_rad(angle.to_radians());
            object.tags.insert_or_assign(ROTATION_TAG, format_number(angle));
        }
        Some(object)
    }

    fn import_line_string(&mut self, style: &str, coords: &[Coord]) -> Option<MapObject> {
        if coords.len() < 2 {
            self.report.too_few_coordinates += 1;
            return None;
        }
        let symbol = self.resolver.resolve(self.map, SymbolType::Line, style).id;
        let mut path = PathObject::new();
        for c in coords {
            let coord = self.map_coord(*c);
            path.add_coordinate(coord, false);
        }
        Some(MapObject::path(symbol, path))
    }

    /// The first ring is the outline, every further ring a hole.
    fn import_polygon(&mut self, style: &str, rings: &[Vec<Coord>]) -> Option<MapObject> {
        let Some(outline) = rings.first().filter(|ring| ring.len() >= 3) else {
            self.report.too_few_coordinates += 1;
            return None;
        };
        let symbol = self.resolver.resolve(self.map, SymbolType::Area, style).id;
        let mut path = PathObject::new();
        for c in outline {
            let coord = self.map_coord(*c);
            path.add_coordinate(coord, false);
        }
        for hole in &rings[1..] {
            for (i, c) in hole.iter().enumerate() {
                let coord = self.map_coord(*c);
                path.add_coordinate(coord, i == 0);
            }
        }
        path.close_all_parts();
        Some(MapObject::path(symbol, path))
    }

    /// Shift the georeferencing by the offset applied to far coordinates.
    fn apply_bounds_offset(&mut self) {
        let offset = self.transformer.bounds_offset();
        if offset.is_zero() {
            return;
        }
        let georef = self.map.georeferencing();
        let shifted = georef.to_projected(georef.map_ref_point() + offset.offset());
        let mut adjusted = georef.clone();
        adjusted.set_projected_ref_point(shifted);
        tracing::info!(
            "Moved projected reference point to ({}, {})",
            shifted.x,
            shifted.y
        );
        self.map.set_georeferencing(adjusted);
    }
}

/// Non-empty field values as tags.
fn import_fields(feature: &Feature) -> Tags {
    let mut tags = Tags::new();
    for (name, value) in &feature.fields {
        if !value.is_empty() {
            tags.insert_or_assign(name.as_str(), value.as_str());
        }
    }
    tags
}

fn map_coords(
    transformer: &mut CoordinateTransformer,
    georef: &Georeferencing,
    coords: &[Coord],
) -> Vec<MapCoordF> {
    coords
        .iter()
        .map(|c| transformer.to_map_coord(c.x, c.y, georef))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Driver, MemoryDataset, MemoryDriver, MemoryLayerData, SpatialReference};
    use std::path::PathBuf;

    fn open(dataset: MemoryDataset) -> Box<dyn DataSource> {
        let store = MemoryDriver::new_store();
        store.lock().insert(PathBuf::from("data.mem"), dataset);
        MemoryDriver::new(store).open(Path::new("data.mem")).unwrap()
    }

    fn unclipped() -> OgrImporter {
        OgrImporter::new(ImportOptions {
            clip_layers: false,
            ..ImportOptions::default()
        })
    }

    fn import(dataset: MemoryDataset) -> (Map, ImportReport) {
        let mut source = open(dataset);
        let mut map = Map::new();
        let report = unclipped().import_data_source(source.as_mut(), &mut map).unwrap();
        (map, report)
    }

    #[test]
    fn test_options_from_settings() {
        let settings = ImportSettings {
            separate_layers: true,
            unit_type: UnitType::OnPaper,
            ..ImportSettings::default()
        };
        let options = ImportOptions::from(&settings);
        assert!(options.separate_layers);
        assert!(options.clip_layers);
        assert_eq!(options.unit_type, UnitType::OnPaper);
    }

    #[test]
    fn test_symbol_set_id_is_driver_name() {
        let (map, report) = import(MemoryDataset::new());
        assert_eq!(map.symbol_set_id(), "Memory");
        assert_eq!(report, ImportReport::default());
    }

    #[test]
    fn test_empty_geometries_counted() {
        let (map, report) = import(MemoryDataset::new().with_layer(
            MemoryLayerData::new("roads")
                .with_feature(Feature::default())
                .with_feature(Feature::new(Geometry::LineString(Vec::new()))),
        ));
        assert_eq!(map.object_count(), 0);
        assert_eq!(report.empty_geometries, 2);
        assert_eq!(
            report.warnings,
            vec!["Unable to load 2 objects, reason: Empty geometry.".to_string()]
        );
    }

    #[test]
    fn test_unsupported_geometry_counted() {
        let collection = Geometry::GeometryCollection(vec![
            Geometry::Unsupported {
                type_name: "CircularString".to_string(),
            },
            Geometry::point(1.0, 1.0),
        ]);
        let (_, report) = import(MemoryDataset::new().with_layer(
            MemoryLayerData::new("curves").with_feature(Feature::new(collection)),
        ));
        assert_eq!(report.unsupported_geometry_type, 1);
        assert_eq!(report.imported_objects, 1);
        assert_eq!(
            report.warnings,
            vec![
                "Unable to load 1 object, reason: Unknown or unsupported geometry type.".to_string()
            ]
        );
    }

    #[test]
    fn test_fields_become_tags() {
        let (map, _) = import(MemoryDataset::new().with_layer(
            MemoryLayerData::new("pois").with_feature(
                Feature::new(Geometry::point(1.0, 2.0))
                    .with_field("name", "Well")
                    .with_field("note", "")
                    .with_field("kind", "water"),
            ),
        ));
        let object = map.objects().next().unwrap();
        let tags: Vec<_> = object.tags.iter().collect();
        assert_eq!(tags, vec![("name", "Well"), ("kind", "water")]);
    }

    #[test]
    fn test_point_rotation_tag_kept() {
        let (map, _) = import(MemoryDataset::new().with_layer(
            MemoryLayerData::new("pois").with_feature(
                Feature::new(Geometry::point(1.0, 2.0))
                    .with_style("SYMBOL(c:#ff0000,a:30)")
                    .with_field("Rotation", "0")
                    .with_field("name", "Cairn"),
            ),
        ));
        let object = map.objects().next().unwrap();
        assert!((object.rotation_rad() - 30f64.to_radians()).abs() < 1e-12);
        assert_eq!(object.tags.get("Rotation"), Some("30"));
        assert_eq!(object.tags.get("name"), Some("Cairn"));
    }

    #[test]
    fn test_label_from_field_reference() {
        let (map, _) = import(MemoryDataset::new().with_layer(
            MemoryLayerData::new("labels")
                .with_feature(
                    Feature::new(Geometry::point(1.0, 2.0))
                        .with_style("LABEL(t:\"{name}\",c:#000000,s:3mm,p:9,a:15)")
                        .with_field("name", "\\fArial;Mill^IPond"),
                )
                .with_feature(
                    Feature::new(Geometry::point(3.0, 4.0))
                        .with_style("LABEL(t:\"{name}\",c:#000000,s:3mm)")
                        .with_field("name", ""),
                ),
        ));
        assert_eq!(map.object_count(), 1);
        let object = map.objects().next().unwrap();
        let text = object.as_text().unwrap();
        assert_eq!(text.text, "Mill\tPond");
        assert_eq!(text.h_align, geokit_map::HorizontalAlignment::Right);
        assert_eq!(text.v_align, geokit_map::VerticalAlignment::Top);
        assert!((text.rotation_rad - 15f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_holes_start_new_parts() {
        let (map, report) = import(MemoryDataset::new().with_layer(
            MemoryLayerData::new("areas").with_feature(Feature::new(Geometry::MultiPolygon(vec![
                vec![
                    vec![Coord::new(0.0, 0.0), Coord::new(10.0, 0.0), Coord::new(10.0, 10.0)],
                    vec![Coord::new(5.0, 2.0), Coord::new(8.0, 2.0), Coord::new(8.0, 4.0)],
                ],
                vec![vec![Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)]],
            ]))),
        ));
        assert_eq!(report.too_few_coordinates, 1);
        assert_eq!(map.object_count(), 1);
        let path = map.objects().next().unwrap().as_path().unwrap();
        assert_eq!(path.parts.len(), 2);
        assert!(path.parts.iter().all(|p| p.closed && p.coords.len() == 4));
    }

    #[test]
    fn test_load_symbols_only() {
        let mut source = open(MemoryDataset::new().with_layer(
            MemoryLayerData::new("pois").with_feature(Feature::new(Geometry::point(1.0, 2.0))),
        ));
        let mut map = Map::new();
        let importer = OgrImporter::new(ImportOptions {
            load_symbols_only: true,
            ..ImportOptions::default()
        });
        let report = importer.import_data_source(source.as_mut(), &mut map).unwrap();
        assert_eq!(map.object_count(), 0);
        assert_eq!(map.symbol_count(), 4);
        assert_eq!(report.imported_layers, 0);
    }

    #[test]
    fn test_foreign_local_reference_not_transformed() {
        let site = SpatialReference::local("Site grid").into_ref();
        let other = SpatialReference::local("Other grid").into_ref();
        let (map, report) = import(MemoryDataset::new().with_layer(
            MemoryLayerData::new("survey")
                .with_spatial_ref(site)
                .with_feature(Feature::new(Geometry::point(1.0, 1.0)))
                .with_feature(Feature::new(Geometry::point(2.0, 2.0)).with_spatial_ref(other)),
        ));
        assert_eq!(map.object_count(), 1);
        assert_eq!(report.no_transformation, 1);
        assert!(report.warnings[0].starts_with("Unable to load 1 object, reason: Can't determine"));
    }
}
