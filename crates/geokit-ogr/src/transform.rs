//! Source to map coordinate mapping
//!
//! One transformer serves a whole import. It keeps the transformation for the
//! most recently seen source reference and rebuilds it only when a feature
//! or layer brings a different one.

use crate::driver::{CoordinateTransform, Geometry, SrsRef};
use geokit_map::{BoundsOffset, Georeferencing, MapCoordF, ProjectedCoord};
use geokit_settings::UnitType;
use std::sync::Arc;

/// Maps source coordinates into map coordinates
#[derive(Debug)]
pub struct CoordinateTransformer {
    map_srs: SrsRef,
    unit_type: UnitType,
    data_srs: Option<SrsRef>,
    data_transform: Option<CoordinateTransform>,
    has_reference: bool,
    on_paper: bool,
    bounds_offset: BoundsOffset,
}

impl CoordinateTransformer {
    pub fn new(map_srs: SrsRef, unit_type: UnitType) -> Self {
        Self {
            map_srs,
            unit_type,
            data_srs: None,
            data_transform: None,
            has_reference: false,
            on_paper: false,
            bounds_offset: BoundsOffset::default(),
        }
    }

    pub fn map_srs(&self) -> &SrsRef {
        &self.map_srs
    }

    /// Make `srs` the reference of the following coordinates.
    ///
    /// The transformation is rebuilt only for a reference which is not the
    /// cached one. Returns false if no transformation into the map reference
    /// exists; the previous transformation stays cached in that case.
    pub fn set_reference(&mut self, srs: Option<&SrsRef>) -> bool {
        self.on_paper = false;
        self.has_reference = srs.is_some();
        match srs {
            Some(srs) => {
                let cached = self
                    .data_srs
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, srs));
                if !cached {
                    let Some(transform) = CoordinateTransform::new(srs, &self.map_srs) else {
                        tracing::debug!(
                            "No transformation from {} to {}",
                            srs.name(),
                            self.map_srs.name()
                        );
                        self.has_reference = false;
                        return false;
                    };
                    self.data_srs = Some(Arc::clone(srs));
                    self.data_transform = Some(transform);
                }
            }
            None => self.on_paper = self.unit_type == UnitType::OnPaper,
        }
        true
    }

    /// Transform a geometry into the map reference.
    ///
    /// Geometries without a reference are left as they are. Returns false if
    /// any vertex failed; the geometry is unchanged then.
    pub fn transform_geometry(&self, geometry: &mut Geometry) -> bool {
        match &self.data_transform {
            Some(transform) if self.has_reference => geometry.transform(transform),
            _ => true,
        }
    }

    /// Map coordinates of a point given in the map reference.
    ///
    /// Unreferenced data in paper units is copied with the y axis flipped.
    pub fn to_map_coord(&mut self, x: f64, y: f64, georef: &Georeferencing) -> MapCoordF {
        let coord = if self.on_paper {
            MapCoordF::new(x, -y)
        } else {
            georef.to_map(ProjectedCoord::new(x, y))
        };
        self.bounds_offset.apply(coord)
    }

    pub fn is_on_paper(&self) -> bool {
        self.on_paper
    }

    pub fn bounds_offset(&self) -> &BoundsOffset {
        &self.bounds_offset
    }

    /// Start a fresh offset, enabled or not.
    pub fn reset_bounds_offset(&mut self, enabled: bool) {
        self.bounds_offset.reset(enabled);
    }
}
