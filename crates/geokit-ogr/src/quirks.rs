//! Export driver quirks
//!
//! Some target formats need special handling which cannot be queried from
//! the driver itself. The table is keyed by driver short name.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of special handling flags for one export driver
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DriverQuirks(u8);

impl DriverQuirks {
    /// The format can be written without real georeferencing
    pub const GEOREF_OPTIONAL: Self = Self(1 << 0);
    /// Coordinates must be reprojected to WGS84
    pub const NEEDS_WGS84: Self = Self(1 << 1);
    /// All features go into one shared layer
    pub const SINGLE_LAYER: Self = Self(1 << 2);
    /// The symbol name goes into the generic `Layer` field
    pub const USE_LAYER_FIELD: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Quirks of the driver with the given short name.
    pub fn for_driver(short_name: &str) -> Self {
        match short_name {
            "ARCGEN" | "BNA" | "CSV" | "DGN" | "DGNv8" | "DWG" | "Geomedia" | "INGRES"
            | "ODS" | "OpenJUMP .jml" | "REC" | "SEGY" | "XLS" | "XLSX" => Self::GEOREF_OPTIONAL,
            "DXF" => Self::GEOREF_OPTIONAL | Self::SINGLE_LAYER | Self::USE_LAYER_FIELD,
            "GPX" | "LIBKML" => Self::NEEDS_WGS84,
            _ => Self::empty(),
        }
    }
}

impl BitOr for DriverQuirks {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DriverQuirks {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for DriverQuirks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::GEOREF_OPTIONAL, "GeorefOptional"),
            (Self::NEEDS_WGS84, "NeedsWgs84"),
            (Self::SINGLE_LAYER, "SingleLayer"),
            (Self::USE_LAYER_FIELD, "UseLayerField"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "DriverQuirks({})", set.join(" | "))
    }
}
