//! Georeferencing
//!
//! Relates map coordinates (paper mm, y down) to projected coordinates
//! (grid meters, y up) through a reference point pair, the map scale, a
//! combined scale factor and the grivation.

use crate::coord::{MapCoordF, ProjectedCoord};
use serde::{Deserialize, Serialize};

/// Whether the map is tied to a real-world spatial reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeoreferencingState {
    /// Arbitrary local units
    #[default]
    Local,
    /// Projected coordinates in a known CRS
    Geospatial,
}

/// Map georeferencing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Georeferencing {
    state: GeoreferencingState,
    scale_denominator: u32,
    combined_scale_factor: f64,
    declination_deg: f64,
    convergence_deg: f64,
    map_ref_point: MapCoordF,
    projected_ref_point: ProjectedCoord,
    projected_crs_id: String,
    projected_crs_spec: String,
}

impl Default for Georeferencing {
    fn default() -> Self {
        Self {
            state: GeoreferencingState::Local,
            scale_denominator: 1000,
            combined_scale_factor: 1.0,
            declination_deg: 0.0,
            convergence_deg: 0.0,
            map_ref_point: MapCoordF::default(),
            projected_ref_point: ProjectedCoord::default(),
            projected_crs_id: String::new(),
            projected_crs_spec: String::new(),
        }
    }
}

impl Georeferencing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GeoreferencingState {
        self.state
    }

    pub fn is_geospatial(&self) -> bool {
        self.state == GeoreferencingState::Geospatial
    }

    pub fn scale_denominator(&self) -> u32 {
        self.scale_denominator
    }

    pub fn set_scale_denominator(&mut self, value: u32) {
        self.scale_denominator = value.max(1);
    }

    pub fn combined_scale_factor(&self) -> f64 {
        self.combined_scale_factor
    }

    pub fn set_combined_scale_factor(&mut self, value: f64) {
        if value > 0.0 {
            self.combined_scale_factor = value;
        }
    }

    pub fn declination(&self) -> f64 {
        self.declination_deg
    }

    /// Set the magnetic declination, keeping the grid convergence.
    pub fn set_declination(&mut self, value: f64) {
        self.declination_deg = value;
    }

    /// Angle between magnetic north and grid north.
    pub fn grivation(&self) -> f64 {
        self.declination_deg - self.convergence_deg
    }

    /// Set the grivation, updating the declination.
    pub fn set_grivation(&mut self, value: f64) {
        self.declination_deg = value + self.convergence_deg;
    }

    pub fn convergence(&self) -> f64 {
        self.convergence_deg
    }

    pub fn map_ref_point(&self) -> MapCoordF {
        self.map_ref_point
    }

    pub fn set_map_ref_point(&mut self, point: MapCoordF) {
        self.map_ref_point = point;
    }

    pub fn projected_ref_point(&self) -> ProjectedCoord {
        self.projected_ref_point
    }

    pub fn set_projected_ref_point(&mut self, point: ProjectedCoord) {
        self.projected_ref_point = point;
    }

    pub fn projected_crs_id(&self) -> &str {
        &self.projected_crs_id
    }

    pub fn projected_crs_spec(&self) -> &str {
        &self.projected_crs_spec
    }

    /// Set the projected CRS; a non-empty spec makes the map geospatial.
    pub fn set_projected_crs(&mut self, id: impl Into<String>, spec: impl Into<String>) {
        self.projected_crs_id = id.into();
        self.projected_crs_spec = spec.into();
        self.state = if self.projected_crs_spec.trim().is_empty() {
            GeoreferencingState::Local
        } else {
            GeoreferencingState::Geospatial
        };
    }

    /// Drop the projected CRS, keeping scale and declination.
    pub fn set_local(&mut self) {
        self.projected_crs_id.clear();
        self.projected_crs_spec.clear();
        self.state = GeoreferencingState::Local;
    }

    /// Grid meters per paper millimeter.
    fn meters_per_mm(&self) -> f64 {
        f64::from(self.scale_denominator) / 1000.0 * self.combined_scale_factor
    }

    /// Map coordinates to projected coordinates.
    pub fn to_projected(&self, map: MapCoordF) -> ProjectedCoord {
        let f = self.meters_per_mm();
        let u = (map.x - self.map_ref_point.x) * f;
        let v = -(map.y - self.map_ref_point.y) * f;
        let (s, c) = self.grivation().to_radians().sin_cos();
        ProjectedCoord::new(
            self.projected_ref_point.x + c * u - s * v,
            self.projected_ref_point.y + s * u + c * v,
        )
    }

    /// Projected coordinates to map coordinates.
    pub fn to_map(&self, projected: ProjectedCoord) -> MapCoordF {
        let f = self.meters_per_mm();
        let dx = projected.x - self.projected_ref_point.x;
        let dy = projected.y - self.projected_ref_point.y;
        let (s, c) = self.grivation().to_radians().sin_cos();
        let u = c * dx + s * dy;
        let v = -s * dx + c * dy;
        MapCoordF::new(
            self.map_ref_point.x + u / f,
            self.map_ref_point.y - v / f,
        )
    }
}
