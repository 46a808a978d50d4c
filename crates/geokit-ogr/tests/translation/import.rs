use geokit_map::{HorizontalAlignment, Map, MapCoordF, ProjectedCoord, VerticalAlignment};
use geokit_ogr::driver::{Coord, Envelope, MemoryDataset, MemoryLayerData};
use geokit_ogr::{
    DriverManager, Feature, Geometry, ImportOptions, ImportReport, MemoryDriver, OgrImporter,
    SpatialReference,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn import_with(options: ImportOptions, dataset: MemoryDataset) -> (Map, ImportReport) {
    let store = MemoryDriver::new_store();
    store.lock().insert(PathBuf::from("input.mem"), dataset);
    let mut manager = DriverManager::new();
    manager.register(Arc::new(MemoryDriver::new(store)));

    let mut map = Map::new();
    let report = OgrImporter::new(options)
        .import_path(&manager, Path::new("input.mem"), &mut map)
        .unwrap();
    (map, report)
}

fn unclipped() -> ImportOptions {
    ImportOptions {
        clip_layers: false,
        ..ImportOptions::default()
    }
}

#[test]
fn test_line_needs_two_points() {
    let (map, report) = import_with(
        unclipped(),
        MemoryDataset::new().with_layer(
            MemoryLayerData::new("lines")
                .with_feature(Feature::new(Geometry::line_string(&[(1.0, 1.0)])))
                .with_feature(Feature::new(Geometry::line_string(&[(0.0, 0.0), (4.0, 3.0)]))),
        ),
    );
    assert_eq!(report.too_few_coordinates, 1);
    assert_eq!(map.object_count(), 1);
    let path = map.objects().next().unwrap().as_path().unwrap();
    assert_eq!(path.parts.len(), 1);
    assert_eq!(path.coordinate_count(), 2);
    assert_eq!(
        report.warnings,
        vec!["Unable to load 1 object, reason: Not enough coordinates.".to_string()]
    );
}

#[test]
fn test_polygon_needs_three_points() {
    let (map, report) = import_with(
        unclipped(),
        MemoryDataset::new().with_layer(
            MemoryLayerData::new("areas")
                .with_feature(Feature::new(Geometry::polygon(&[&[(0.0, 0.0), (1.0, 0.0)]])))
                .with_feature(Feature::new(Geometry::polygon(&[
                    &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)],
                    &[(6.0, 2.0), (8.0, 2.0), (8.0, 4.0)],
                ]))),
        ),
    );
    assert_eq!(report.too_few_coordinates, 1);
    assert_eq!(map.object_count(), 1);
    let path = map.objects().next().unwrap().as_path().unwrap();
    assert_eq!(path.parts.len(), 2);
    assert!(path.parts.iter().all(|part| part.closed));
}

#[test]
fn test_clipping_drops_points_outside_extent() {
    let (map, report) = import_with(
        ImportOptions::default(),
        MemoryDataset::new().with_layer(
            MemoryLayerData::new("pois")
                .with_extent(Envelope {
                    min_x: 0.0,
                    min_y: 0.0,
                    max_x: 10.0,
                    max_y: 10.0,
                })
                .with_feature(Feature::new(Geometry::point(5.0, 5.0)))
                .with_feature(Feature::new(Geometry::point(20.0, 20.0))),
        ),
    );
    assert_eq!(map.object_count(), 1);
    let point = map.objects().next().unwrap().as_point().unwrap();
    assert_eq!(point.position, MapCoordF::new(5.0, -5.0));
    assert_eq!(report.dropped(), 0);
}

#[test]
fn test_projected_reference_wins() {
    let utm = SpatialReference::utm(32, false).into_ref();
    let site = SpatialReference::local("Site grid").into_ref();
    let (map, report) = import_with(
        unclipped(),
        MemoryDataset::new()
            .with_layer(
                MemoryLayerData::new("plain")
                    .with_feature(Feature::new(Geometry::point(500_001.0, 5_400_001.0))),
            )
            .with_layer(
                MemoryLayerData::new("site")
                    .with_spatial_ref(site)
                    .with_feature(Feature::new(Geometry::point(3.0, 3.0))),
            )
            .with_layer(
                MemoryLayerData::new("utm")
                    .with_spatial_ref(utm)
                    .with_feature(Feature::new(Geometry::point(500_000.4, 5_400_000.2)))
                    .with_feature(Feature::new(Geometry::point(500_010.4, 5_400_010.2))),
            ),
    );

    let georef = map.georeferencing();
    assert!(georef.is_geospatial());
    assert!(georef.projected_crs_spec().contains("+zone=32"));
    assert_eq!(
        georef.projected_ref_point(),
        ProjectedCoord::new(500_005.0, 5_400_005.0)
    );
    assert_eq!(report.no_transformation, 1);
    assert_eq!(map.object_count(), 3);
}

#[test]
fn test_anchor_five_centers_label() {
    let (map, _) = import_with(
        unclipped(),
        MemoryDataset::new().with_layer(
            MemoryLayerData::new("labels").with_feature(
                Feature::new(Geometry::point(0.0, 0.0))
                    .with_style("LABEL(t:\"Hut\",c:#202020,s:2.5mm,p:5)"),
            ),
        ),
    );
    let text = map.objects().next().unwrap().as_text().unwrap();
    assert_eq!(text.text, "Hut");
    assert_eq!(text.h_align, HorizontalAlignment::Center);
    assert_eq!(text.v_align, VerticalAlignment::Center);
}

#[test]
fn test_separate_layers_skip_track_points() {
    let options = ImportOptions {
        separate_layers: true,
        ..unclipped()
    };
    let (map, report) = import_with(
        options,
        MemoryDataset::new()
            .with_layer(
                MemoryLayerData::new("tracks")
                    .with_feature(Feature::new(Geometry::line_string(&[(0.0, 0.0), (1.0, 1.0)]))),
            )
            .with_layer(
                MemoryLayerData::new("track_points")
                    .with_feature(Feature::new(Geometry::point(0.0, 0.0)))
                    .with_feature(Feature::new(Geometry::point(1.0, 1.0))),
            )
            .with_layer(
                MemoryLayerData::new("waypoints")
                    .with_feature(Feature::new(Geometry::point(0.5, 0.5))),
            ),
    );
    let names: Vec<&str> = map.parts().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["tracks", "waypoints"]);
    assert_eq!(report.imported_layers, 2);
    assert_eq!(map.object_count(), 2);
}

#[test]
fn test_object_tags_win_over_fields() {
    let (map, _) = import_with(
        unclipped(),
        MemoryDataset::new().with_layer(
            MemoryLayerData::new("wells").with_feature(
                Feature::new(Geometry::point(2.0, 2.0))
                    .with_style("SYMBOL(id:\"ogr-sym-0\",c:#0000ff,a:45)")
                    .with_field("name", "Old well")
                    .with_field("Rotation", "0")
                    .with_field("depth", ""),
            ),
        ),
    );
    let object = map.objects().next().unwrap();
    assert_eq!(object.tags.get("name"), Some("Old well"));
    assert_eq!(object.tags.get("Rotation"), Some("45"));
    assert!(!object.tags.contains("depth"));
}

#[test]
fn test_far_coordinates_move_reference_point() {
    let (map, _) = import_with(
        unclipped(),
        MemoryDataset::new().with_layer(
            MemoryLayerData::new("far")
                .with_feature(Feature::new(Geometry::point(5_000_000.4, 0.0)))
                .with_feature(Feature::new(Geometry::MultiPoint(vec![Coord::new(
                    5_000_010.0,
                    0.0,
                )]))),
        ),
    );
    let reference = map.georeferencing().projected_ref_point();
    assert!((reference.x - 5_000_000.0).abs() < 1e-6);
    assert!(reference.y.abs() < 1e-6);

    let xs: Vec<f64> = map
        .objects()
        .filter_map(|o| o.as_point())
        .map(|p| p.position.x)
        .collect();
    assert_eq!(xs.len(), 2);
    assert!((xs[0] - 0.4).abs() < 1e-6);
    assert!((xs[1] - 10.0).abs() < 1e-6);
}

#[test]
fn test_unreadable_path_is_an_error() {
    let mut manager = DriverManager::new();
    manager.register(Arc::new(MemoryDriver::new(MemoryDriver::new_store())));
    let mut map = Map::new();
    let err = OgrImporter::default()
        .import_path(&manager, Path::new("missing.mem"), &mut map)
        .unwrap_err();
    assert!(err.is_driver_error());
    assert!(err.to_string().starts_with("Cannot open file"));
    assert_eq!(map.object_count(), 0);
}
