use geokit_map::{Georeferencing, MapCoordF, ProjectedCoord};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_map_projected_round_trip(
        x in -1000.0f64..1000.0,
        y in -1000.0f64..1000.0,
        scale in 500u32..100_000,
        grivation in -10.0f64..10.0,
        factor in 0.99f64..1.01,
    ) {
        let mut georef = Georeferencing::new();
        georef.set_scale_denominator(scale);
        georef.set_grivation(grivation);
        georef.set_combined_scale_factor(factor);
        georef.set_projected_ref_point(ProjectedCoord::new(600_000.0, 5_500_000.0));

        let map = MapCoordF::new(x, y);
        let back = georef.to_map(georef.to_projected(map));
        prop_assert!((back.x - x).abs() < 1e-6);
        prop_assert!((back.y - y).abs() < 1e-6);
    }
}

#[test]
fn test_reference_points_map_onto_each_other() {
    let mut georef = Georeferencing::new();
    georef.set_map_ref_point(MapCoordF::new(10.0, 20.0));
    georef.set_projected_ref_point(ProjectedCoord::new(300.0, 400.0));
    georef.set_grivation(7.0);
    let p = georef.to_projected(MapCoordF::new(10.0, 20.0));
    assert!((p.x - 300.0).abs() < 1e-9);
    assert!((p.y - 400.0).abs() < 1e-9);
}
