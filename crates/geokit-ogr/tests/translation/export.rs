use geokit_map::{
    LineSymbol, Map, MapColor, MapCoordF, MapObject, PathObject, PathPart, ProjectedCoord, Rgb,
    Symbol, SymbolKind, TextSymbol,
};
use geokit_ogr::driver::{MemoryDataset, MemoryStore};
use geokit_ogr::{DriverManager, ExportOptions, Geometry, GeometryType, MemoryDriver, OgrExporter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LONG_LABEL: &str = "Keep \"out\" of the old mill yard at night";

fn sample_map() -> Map {
    let mut map = Map::new();
    let brown = map.add_color(MapColor::from_rgb("brown", Rgb::new(160, 80, 0)));
    let road = map.add_symbol(Symbol::new(
        "Road",
        SymbolKind::Line(LineSymbol {
            color: Some(brown),
            line_width_mm: 0.35,
            ..LineSymbol::default()
        }),
    ));
    let label = map.add_symbol(Symbol::new(
        "Name",
        SymbolKind::Text(TextSymbol {
            color: Some(brown),
            ..TextSymbol::default()
        }),
    ));
    map.add_object(MapObject::path(
        road,
        PathObject::from_parts(vec![PathPart::new(vec![
            MapCoordF::new(0.0, 0.0),
            MapCoordF::new(20.0, -5.0),
        ])]),
    ));
    map.add_object(MapObject::text(label, MapCoordF::new(5.0, -5.0), LONG_LABEL));
    map
}

fn georeferenced(mut map: Map) -> Map {
    let georef = map.georeferencing_mut();
    georef.set_projected_crs("PROJ.4", "+proj=utm +zone=32 +datum=WGS84 +units=m +no_defs");
    georef.set_projected_ref_point(ProjectedCoord::new(500_000.0, 5_300_000.0));
    map
}

fn manager_with(driver: MemoryDriver) -> (DriverManager, MemoryStore) {
    let store = Arc::clone(driver.store());
    let mut manager = DriverManager::new();
    manager.register(Arc::new(driver));
    (manager, store)
}

fn written(store: &MemoryStore, path: &str) -> MemoryDataset {
    store.lock().get(&PathBuf::from(path)).cloned().unwrap()
}

#[test]
fn test_long_label_goes_into_style_unchanged() {
    let map = georeferenced(sample_map());
    let (manager, store) = manager_with(
        MemoryDriver::new(MemoryDriver::new_store())
            .with_name("ESRI Shapefile", "ESRI Shapefile")
            .with_extensions(&["shp"]),
    );
    OgrExporter::default()
        .export(&map, &manager, Path::new("roads.shp"), "OGR-export-ESRI Shapefile")
        .unwrap();

    let data = written(&store, "roads.shp");
    let points = data.layer_by_name("roads_points").unwrap();
    let feature = &points.features[0];
    let style = feature.style.as_deref().unwrap();
    assert!(style.contains("t:\"Keep \\\"out\\\" of the old mill yard at night\""));
    assert_eq!(feature.field("Name").map(|n| n.chars().count()), Some(32));
}

#[test]
fn test_dxf_folds_symbols_into_layer_field() {
    let map = georeferenced(sample_map());
    let (manager, store) =
        manager_with(MemoryDriver::new(MemoryDriver::new_store()).with_name("DXF", "AutoCAD DXF"));
    let report = OgrExporter::default()
        .export(&map, &manager, Path::new("site.dxf"), "DXF")
        .unwrap();
    assert!(!report.has_warnings());

    let data = written(&store, "site.dxf");
    assert_eq!(data.layers.len(), 1);
    let layer = &data.layers[0];
    assert_eq!(layer.name, "Layer");
    let mut symbols: Vec<&str> = layer
        .features
        .iter()
        .filter_map(|f| f.field("Layer"))
        .collect();
    symbols.sort_unstable();
    assert_eq!(symbols, vec!["Name", "Road"]);
}

#[test]
fn test_gpx_coordinates_are_geographic() {
    let map = georeferenced(sample_map());
    let (manager, store) =
        manager_with(MemoryDriver::new(MemoryDriver::new_store()).with_name("GPX", "GPX"));
    OgrExporter::default()
        .export(&map, &manager, Path::new("walk.gpx"), "OGR-export-GPX")
        .unwrap();

    let data = written(&store, "walk.gpx");
    let lines = data.layer_by_name("walk_lines").unwrap();
    let Some(Geometry::LineString(coords)) = &lines.features[0].geometry else {
        panic!("line string expected");
    };
    for c in coords {
        assert!((c.x - 9.0).abs() < 0.01, "longitude {}", c.x);
        assert!((c.y - 47.85).abs() < 0.1, "latitude {}", c.y);
    }
}

#[test]
fn test_local_map_cannot_be_written_as_shapefile() {
    let map = sample_map();
    let (manager, store) = manager_with(
        MemoryDriver::new(MemoryDriver::new_store()).with_name("ESRI Shapefile", "ESRI Shapefile"),
    );
    let err = OgrExporter::default()
        .export(&map, &manager, Path::new("roads.shp"), "ESRI Shapefile")
        .unwrap_err();
    assert!(err.is_georeferencing_error());
    assert_eq!(
        err.to_string(),
        "The ESRI Shapefile driver requires valid georeferencing info."
    );
    assert!(store.lock().is_empty());
}

#[test]
fn test_missing_driver_is_named() {
    let (manager, _) = manager_with(MemoryDriver::new(MemoryDriver::new_store()));
    let err = OgrExporter::default()
        .export(&sample_map(), &manager, Path::new("x.kml"), "OGR-export-LIBKML")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot find a vector data export driver named 'LIBKML'"
    );
}

#[test]
fn test_export_formats_use_prefixed_ids() {
    let (manager, _) = manager_with(
        MemoryDriver::new(MemoryDriver::new_store()).with_name("GPX", "GPS eXchange Format"),
    );
    let formats = manager.export_formats();
    assert_eq!(formats.len(), 1);
    assert_eq!(formats[0].id, "OGR-export-GPX");
    assert_eq!(formats[0].name, "GPS eXchange Format");
}

fn layer_names(data: &MemoryDataset) -> Vec<&str> {
    data.layers.iter().map(|l| l.name.as_str()).collect()
}

#[test]
fn test_default_layout_always_has_three_layers() {
    let mut map = Map::new();
    let black = map.add_color(MapColor::from_rgb("black", Rgb::new(0, 0, 0)));
    let road = map.add_symbol(Symbol::new(
        "Track",
        SymbolKind::Line(LineSymbol {
            color: Some(black),
            ..LineSymbol::default()
        }),
    ));
    map.add_object(MapObject::path(
        road,
        PathObject::from_parts(vec![PathPart::new(vec![
            MapCoordF::new(0.0, 0.0),
            MapCoordF::new(3.0, -3.0),
        ])]),
    ));
    let map = georeferenced(map);
    let (manager, store) = manager_with(MemoryDriver::new(MemoryDriver::new_store()));
    let report = OgrExporter::default()
        .export(&map, &manager, Path::new("roads.v2.mem"), "Memory")
        .unwrap();

    let data = written(&store, "roads.v2.mem");
    assert_eq!(
        layer_names(&data),
        vec!["roads_points", "roads_lines", "roads_areas"]
    );
    assert_eq!(report.layers_created, 3);
    assert!(data.layer_by_name("roads_points").unwrap().features.is_empty());
    assert!(data.layer_by_name("roads_areas").unwrap().features.is_empty());
    assert_eq!(data.layer_by_name("roads_lines").unwrap().features.len(), 1);
}

#[test]
fn test_layer_per_symbol_uses_symbol_names() {
    let map = georeferenced(sample_map());
    let (manager, store) = manager_with(MemoryDriver::new(MemoryDriver::new_store()));
    OgrExporter::new(ExportOptions {
        one_layer_per_symbol: true,
    })
    .export(&map, &manager, Path::new("site.mem"), "OGR-export-Memory")
    .unwrap();

    let data = written(&store, "site.mem");
    assert_eq!(layer_names(&data), vec!["site_Name", "site_Road"]);
    let road = data.layer_by_name("site_Road").unwrap();
    assert_eq!(road.geometry_type, GeometryType::LineString);
    assert_eq!(road.features[0].field("Name"), Some("Road"));
}

#[test]
fn test_dxf_ignores_layer_per_symbol() {
    let map = sample_map();
    let (manager, store) =
        manager_with(MemoryDriver::new(MemoryDriver::new_store()).with_name("DXF", "AutoCAD DXF"));
    OgrExporter::new(ExportOptions {
        one_layer_per_symbol: true,
    })
    .export(&map, &manager, Path::new("plan.dxf"), "DXF")
    .unwrap();
    assert_eq!(layer_names(&written(&store, "plan.dxf")), vec!["Layer"]);
}

#[test]
fn test_unprojectable_features_are_left_out_with_a_warning() {
    let mut map = sample_map();
    map.georeferencing_mut().set_projected_crs(
        "PROJ.4",
        "+proj=ortho +datum=WGS84 +ellps=WGS84 +units=m +lat_0=48 +lon_0=11 +no_defs",
    );
    let road = map.objects().next().unwrap().symbol;
    // Beyond the visible hemisphere at 1:1000
    map.add_object(MapObject::path(
        road,
        PathObject::from_parts(vec![PathPart::new(vec![
            MapCoordF::new(7_000_000.0, 0.0),
            MapCoordF::new(7_000_100.0, 0.0),
        ])]),
    ));
    let (manager, store) =
        manager_with(MemoryDriver::new(MemoryDriver::new_store()).with_name("GPX", "GPX"));
    let report = OgrExporter::default()
        .export(&map, &manager, Path::new("walk.gpx"), "GPX")
        .unwrap();

    assert_eq!(report.failed_transformation, 1);
    assert_eq!(
        report.warnings,
        vec!["Unable to export 1 feature, reason: Failed to transform the coordinates.".to_string()]
    );
    let data = written(&store, "walk.gpx");
    assert_eq!(data.layer_by_name("walk_lines").unwrap().features.len(), 1);
}
