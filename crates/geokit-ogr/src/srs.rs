//! Spatial reference resolution
//!
//! Chooses the one spatial reference the whole map is imported into, and
//! derives spatial references from a map's georeferencing.

use crate::driver::{CoordinateTransform, DataSource, Geometry, SpatialReference, SrsRef};
use geokit_core::GeoreferencingError;
use geokit_map::{Georeferencing, Map, ProjectedCoord};

/// Name of the local reference used for unreferenced maps
pub const LOCAL_SRS_NAME: &str = "Local SRS";

/// Running average of geometry vertices in a target reference
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageCoords {
    sum_x: f64,
    sum_y: f64,
    count: usize,
}

impl AverageCoords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Average of every feature of every layer, transformed into `target`.
    ///
    /// Layers without a reference, references that cannot be transformed and
    /// geometries that fail to transform are skipped.
    pub fn of_data_source(data_source: &mut dyn DataSource, target: &SrsRef) -> Self {
        let mut average = Self::new();
        for index in 0..data_source.layer_count() {
            let Some(layer) = data_source.layer(index) else {
                continue;
            };
            let Some(transform) = layer
                .spatial_ref()
                .and_then(|srs| CoordinateTransform::new(&srs, target))
            else {
                continue;
            };
            layer.reset_reading();
            while let Some(feature) = layer.next_feature() {
                let Some(mut geometry) = feature.geometry.filter(|g| !g.is_empty()) else {
                    continue;
                };
                if geometry.transform(&transform) {
                    average.add_geometry(&geometry);
                }
            }
        }
        average
    }

    pub fn add_geometry(&mut self, geometry: &Geometry) {
        geometry.for_each_vertex(|c| {
            self.sum_x += c.x;
            self.sum_y += c.y;
            self.count += 1;
        });
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// The average, or the origin when nothing was added.
    pub fn average(&self) -> (f64, f64) {
        if self.count == 0 {
            (0.0, 0.0)
        } else {
            (self.sum_x / self.count as f64, self.sum_y / self.count as f64)
        }
    }
}

/// Average latitude and longitude (degrees) of all features.
pub fn calc_average_lat_lon(data_source: &mut dyn DataSource) -> (f64, f64) {
    let wgs84 = SpatialReference::wgs84().into_ref();
    let (lon, lat) = AverageCoords::of_data_source(data_source, &wgs84).average();
    (lat, lon)
}

/// The spatial reference described by the map's georeferencing.
///
/// Local maps, and maps whose projection spec cannot be used, get a local
/// reference; the latter also add a warning.
pub fn srs_from_map(map: &Map, warnings: &mut Vec<String>) -> SrsRef {
    let georef = map.georeferencing();
    if georef.is_geospatial() {
        match SpatialReference::from_proj_string(georef.projected_crs_spec()) {
            Ok(srs) => return srs.into_ref(),
            Err(e) => {
                tracing::warn!("{}", e);
                warnings.push(e.to_string());
            }
        }
    }
    SpatialReference::local(LOCAL_SRS_NAME).into_ref()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Pick the map reference for importing a data source and set up the map's
/// georeferencing accordingly.
///
/// A projected layer reference wins. Otherwise a usable geographic reference
/// leads to an orthographic projection centered on the data. Local or
/// missing references leave the map locally referenced.
pub fn resolve_map_srs(
    data_source: &mut dyn DataSource,
    map: &mut Map,
    warnings: &mut Vec<String>,
) -> Result<SrsRef, GeoreferencingError> {
    let probe = SpatialReference::orthographic(0.0, 0.0).into_ref();
    let mut no_srs = true;
    let mut local_srs: Option<SrsRef> = None;
    let mut suitable_srs: Option<SrsRef> = None;
    let mut projected_spec: Option<String> = None;

    for index in 0..data_source.layer_count() {
        let Some(srs) = data_source.layer(index).and_then(|l| l.spatial_ref()) else {
            continue;
        };
        no_srs = false;

        if srs.is_local() {
            local_srs.get_or_insert(srs);
            continue;
        }

        if CoordinateTransform::new(&srs, &probe).is_none() {
            let warning = format!("Cannot use this spatial reference:\n{}", srs.to_pretty_wkt());
            tracing::warn!("{}", warning);
            warnings.push(warning);
            continue;
        }

        if srs.is_projected() {
            if let Some(spec) = srs.to_proj_string() {
                projected_spec = Some(spec);
                suitable_srs = Some(srs);
                break;
            }
        }
        suitable_srs.get_or_insert(srs);
    }

    match (projected_spec, suitable_srs) {
        (Some(spec), Some(srs)) => {
            let (x, y) = AverageCoords::of_data_source(data_source, &srs).average();
            let georef = map.georeferencing_mut();
            georef.set_projected_crs("PROJ.4", spec);
            georef.set_projected_ref_point(ProjectedCoord::new(x.round(), y.round()));
            tracing::info!("Using projected reference {}", srs.name());
            Ok(srs)
        }
        (_, Some(_)) => {
            let (lat, lon) = calc_average_lat_lon(data_source);
            let (lat, lon) = (round_to(lat, 3), round_to(lon, 3));
            let mut georef = Georeferencing::new();
            georef.set_scale_denominator(map.georeferencing().scale_denominator());
            georef.set_projected_crs(
                "",
                SpatialReference::orthographic(lat, lon)
                    .to_proj_string()
                    .unwrap_or_default(),
            );
            georef.set_projected_ref_point(ProjectedCoord::default());
            georef.set_combined_scale_factor(1.0);
            georef.set_declination(map.georeferencing().declination());
            map.set_georeferencing(georef);
            tracing::info!("Using orthographic projection centered at {}, {}", lat, lon);
            Ok(srs_from_map(map, warnings))
        }
        (_, None) if local_srs.is_some() || no_srs => {
            let mut georef = Georeferencing::new();
            georef.set_scale_denominator(map.georeferencing().scale_denominator());
            georef.set_declination(map.georeferencing().declination());
            map.set_georeferencing(georef);
            Ok(match local_srs {
                Some(srs) => srs,
                None => srs_from_map(map, warnings),
            })
        }
        _ => Err(GeoreferencingError::NoSuitableReference),
    }
}

/// True if every layer reference can be transformed into the map's projected
/// reference and at least one layer has a reference.
pub fn check_georeferencing(data_source: &mut dyn DataSource, georef: &Georeferencing) -> bool {
    if !georef.is_geospatial() {
        return false;
    }
    let Ok(map_srs) = SpatialReference::from_proj_string(georef.projected_crs_spec()) else {
        return false;
    };
    let map_srs = map_srs.into_ref();

    let mut found = false;
    for index in 0..data_source.layer_count() {
        let Some(srs) = data_source.layer(index).and_then(|l| l.spatial_ref()) else {
            continue;
        };
        if CoordinateTransform::new(&srs, &map_srs).is_none() {
            tracing::debug!("Failed to transform this SRS:\n{}", srs.to_pretty_wkt());
            return false;
        }
        found = true;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Driver, Feature, MemoryDataset, MemoryDriver, MemoryLayerData};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    fn open(dataset: MemoryDataset) -> Box<dyn DataSource> {
        let store = MemoryDriver::new_store();
        store.lock().insert(PathBuf::from("data.mem"), dataset);
        MemoryDriver::new(store).open(Path::new("data.mem")).unwrap()
    }

    #[test]
    fn test_average_coords_skips_unreferenced_layers() {
        let wgs84 = SpatialReference::wgs84().into_ref();
        let mut source = open(
            MemoryDataset::new()
                .with_layer(
                    MemoryLayerData::new("a")
                        .with_spatial_ref(Arc::clone(&wgs84))
                        .with_feature(Feature::new(Geometry::line_string(&[
                            (10.0, 50.0),
                            (12.0, 52.0),
                        ]))),
                )
                .with_layer(
                    MemoryLayerData::new("b")
                        .with_feature(Feature::new(Geometry::point(100.0, 100.0))),
                ),
        );
        let (lat, lon) = calc_average_lat_lon(source.as_mut());
        assert!((lat - 51.0).abs() < 1e-9);
        assert!((lon - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_geographic_data_gets_orthographic_projection() {
        let wgs84 = SpatialReference::wgs84().into_ref();
        let mut source = open(MemoryDataset::new().with_layer(
            MemoryLayerData::new("pois")
                .with_spatial_ref(wgs84)
                .with_feature(Feature::new(Geometry::point(11.12345, 48.98765))),
        ));
        let mut map = Map::new();
        map.georeferencing_mut().set_scale_denominator(15000);
        map.georeferencing_mut().set_declination(2.0);
        let mut warnings = Vec::new();
        let srs = resolve_map_srs(source.as_mut(), &mut map, &mut warnings).unwrap();
        assert!(srs.is_projected());
        let georef = map.georeferencing();
        assert!(georef.is_geospatial());
        assert_eq!(georef.scale_denominator(), 15000);
        assert_eq!(georef.declination(), 2.0);
        assert_eq!(
            georef.projected_crs_spec(),
            "+proj=ortho +datum=WGS84 +ellps=WGS84 +units=m +lat_0=48.988 +lon_0=11.123 +no_defs"
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unusable_reference_is_an_error() {
        let odd = SpatialReference::unsupported("VERT_CS[\"height\"]").into_ref();
        let mut source = open(MemoryDataset::new().with_layer(
            MemoryLayerData::new("heights").with_spatial_ref(odd),
        ));
        let mut map = Map::new();
        let mut warnings = Vec::new();
        let result = resolve_map_srs(source.as_mut(), &mut map, &mut warnings);
        assert_eq!(result, Err(GeoreferencingError::NoSuitableReference));
        assert_eq!(
            warnings,
            vec!["Cannot use this spatial reference:\nVERT_CS[\"height\"]".to_string()]
        );
    }

    #[test]
    fn test_no_reference_gives_local_map() {
        let mut source = open(MemoryDataset::new().with_layer(
            MemoryLayerData::new("plain").with_feature(Feature::new(Geometry::point(1.0, 1.0))),
        ));
        let mut map = Map::new();
        let mut warnings = Vec::new();
        let srs = resolve_map_srs(source.as_mut(), &mut map, &mut warnings).unwrap();
        assert!(srs.is_local());
        assert_eq!(srs.name(), LOCAL_SRS_NAME);
        assert!(!map.georeferencing().is_geospatial());
    }

    #[test]
    fn test_srs_from_map_with_bad_spec_warns() {
        let mut map = Map::new();
        map.georeferencing_mut().set_projected_crs("PROJ.4", "+proj=bogus");
        let mut warnings = Vec::new();
        let srs = srs_from_map(&map, &mut warnings);
        assert!(srs.is_local());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Unable to setup \"+proj=bogus\" SRS"));
    }

    #[test]
    fn test_check_georeferencing() {
        let utm = SpatialReference::utm(32, false).into_ref();
        let mut source = open(MemoryDataset::new().with_layer(
            MemoryLayerData::new("roads").with_spatial_ref(utm),
        ));
        let mut georef = Georeferencing::new();
        assert!(!check_georeferencing(source.as_mut(), &georef));
        georef.set_projected_crs("PROJ.4", "+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs");
        assert!(check_georeferencing(source.as_mut(), &georef));

        let mut unreferenced = open(MemoryDataset::new().with_layer(MemoryLayerData::new("x")));
        assert!(!check_georeferencing(unreferenced.as_mut(), &georef));
    }
}
