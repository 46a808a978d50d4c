use geokit_map::{
    AreaSymbol, LineSymbol, Map, MapColor, MapCoordF, MapObject, PathObject, PathPart,
    ProjectedCoord, Rgb, Symbol, SymbolKind, SymbolType,
};
use geokit_ogr::{DriverManager, ImportOptions, MemoryDriver, OgrExporter, OgrImporter};
use std::path::Path;
use std::sync::Arc;

fn source_map() -> Map {
    let mut map = Map::new();
    let red = map.add_color(MapColor::from_rgb("red", Rgb::new(255, 0, 0)));
    let blue = map.add_color(MapColor::from_rgb("blue", Rgb::new(0, 0, 255)));
    let fence = map.add_symbol(Symbol::new(
        "Fence",
        SymbolKind::Line(LineSymbol {
            color: Some(red),
            line_width_mm: 0.5,
            ..LineSymbol::default()
        }),
    ));
    let lake = map.add_symbol(Symbol::new(
        "Lake",
        SymbolKind::Area(AreaSymbol {
            color: Some(blue),
            fill_patterns: Vec::new(),
        }),
    ));
    map.add_object(MapObject::path(
        fence,
        PathObject::from_parts(vec![PathPart::new(vec![
            MapCoordF::new(0.0, 0.0),
            MapCoordF::new(10.0, -10.0),
        ])]),
    ));
    map.add_object(MapObject::path(
        lake,
        PathObject::from_parts(vec![PathPart::new(vec![
            MapCoordF::new(20.0, 0.0),
            MapCoordF::new(30.0, 0.0),
            MapCoordF::new(30.0, -10.0),
        ])]),
    ));

    let georef = map.georeferencing_mut();
    georef.set_projected_crs("PROJ.4", "+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs");
    georef.set_projected_ref_point(ProjectedCoord::new(400_000.0, 5_200_000.0));
    map
}

#[test]
fn test_simple_symbols_survive_export_and_import() {
    let mut manager = DriverManager::new();
    manager.register(Arc::new(MemoryDriver::new(MemoryDriver::new_store())));
    let path = Path::new("trip.mem");

    let report = OgrExporter::default()
        .export(&source_map(), &manager, path, "Memory")
        .unwrap();
    assert_eq!(report.features_written, 2);

    let mut map = Map::new();
    let importer = OgrImporter::new(ImportOptions {
        clip_layers: false,
        ..ImportOptions::default()
    });
    let report = importer.import_path(&manager, path, &mut map).unwrap();
    assert_eq!(report.imported_objects, 2);
    assert!(map.georeferencing().projected_crs_spec().contains("+zone=33"));

    let symbol_of = |ty: SymbolType| {
        map.objects()
            .filter_map(|o| map.symbol(o.symbol).map(|s| (o, s)))
            .find(|(_, s)| s.symbol_type() == ty)
            .unwrap()
    };

    let (fence, line_symbol) = symbol_of(SymbolType::Line);
    let line = line_symbol.as_line().unwrap();
    assert!((line.line_width_mm - 0.5).abs() < 1e-9);
    let color = map.color(line.color.unwrap()).unwrap();
    assert_eq!(color.rgb, Rgb::new(255, 0, 0));
    let coords: Vec<MapCoordF> = fence.as_path().unwrap().coords().copied().collect();
    assert!((coords[0].distance_to(&coords[1]) - 200f64.sqrt()).abs() < 1e-6);

    let (_, area_symbol) = symbol_of(SymbolType::Area);
    let area = area_symbol.as_area().unwrap();
    assert_eq!(map.color(area.color.unwrap()).unwrap().rgb, Rgb::new(0, 0, 255));
}
