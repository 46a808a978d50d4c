//! # GeoKit Core
//!
//! Core types and utilities for GeoKit.
//! Provides the error taxonomy shared by the document model, the vector
//! translation layer and the settings crate, plus style unit helpers.

pub mod error;
pub mod units;

pub use error::{DriverError, Error, FormatError, GeoreferencingError, Result};
pub use units::{format_number, parse_length_token, StyleUnit, MM_PER_INCH, MM_PER_POINT};
