//! Error handling for GeoKit
//!
//! Provides the error types for the fatal conditions of import and export:
//! - Driver errors (opening, creating, writing data sources)
//! - Georeferencing errors (spatial reference and transformation problems)
//! - Format errors (content that cannot be represented at all)
//!
//! Recoverable per-feature conditions are never errors. They are counted on
//! the operation report instead.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Driver error type
///
/// Represents failures of the vector data source driver layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// The data source could not be opened
    #[error("Cannot open file\n{path}:\n{reason}")]
    OpenFailed {
        /// The path that was opened.
        path: String,
        /// The driver's message.
        reason: String,
    },

    /// The output data source could not be created
    #[error("Failed to create dataset: {reason}")]
    CreateFailed {
        /// The driver's message.
        reason: String,
    },

    /// No driver with the given short name is registered
    #[error("Cannot find a vector data export driver named '{name}'")]
    UnknownDriver {
        /// The requested driver short name.
        name: String,
    },

    /// The driver exists but lacks a capability
    #[error("The {driver} driver does not support {capability}")]
    MissingCapability {
        /// The driver short name.
        driver: String,
        /// The missing capability.
        capability: String,
    },

    /// A layer could not be created
    #[error("Failed to create layer {layer}: {reason}")]
    LayerCreation {
        /// The layer name.
        layer: String,
        /// The driver's message.
        reason: String,
    },

    /// A field could not be created
    #[error("Failed to create field {field}: {reason}")]
    FieldCreation {
        /// The field name.
        field: String,
        /// The driver's message.
        reason: String,
    },

    /// A feature could not be written
    #[error("Failed to create feature in layer: {reason}")]
    FeatureCreation {
        /// The driver's message.
        reason: String,
    },

    /// The data source is read-only
    #[error("Data source {path} is read-only")]
    ReadOnly {
        /// The path of the data source.
        path: String,
    },
}

/// Georeferencing error type
///
/// Represents problems with spatial references and coordinate transformations
/// that make a whole operation impossible.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoreferencingError {
    /// No layer carries a usable spatial reference
    #[error("The geospatial data has no suitable spatial reference.")]
    NoSuitableReference,

    /// A projection specification could not be understood
    #[error("Unable to setup \"{spec}\" SRS: {reason}")]
    InvalidSpec {
        /// The projection specification.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The target driver needs real-world coordinates
    #[error("The {driver} driver requires valid georeferencing info.")]
    RequiredByDriver {
        /// The driver short name.
        driver: String,
    },

    /// No transformation exists between two references
    #[error("Can't determine the coordinate transformation from {from} to {to}")]
    NoTransformation {
        /// Source reference description.
        from: String,
        /// Target reference description.
        to: String,
    },
}

/// Format error type
///
/// Represents content which cannot be translated at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// A style string could not be parsed where parsing is mandatory
    #[error("Invalid style string '{style}': {reason}")]
    InvalidStyle {
        /// The offending style string.
        style: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A layer index does not exist
    #[error("Unable to load layer {index}.")]
    MissingLayer {
        /// The layer index.
        index: usize,
    },

    /// Generic format error
    #[error("Format error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Main error type for GeoKit
///
/// A unified error type that can represent any fatal condition.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Driver error
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Georeferencing error
    #[error(transparent)]
    Georeferencing(#[from] GeoreferencingError),

    /// Format error
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a driver error
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Error::Driver(_))
    }

    /// Check if this is a georeferencing error
    pub fn is_georeferencing_error(&self) -> bool {
        matches!(self, Error::Georeferencing(_))
    }

    /// Check if this is a format error
    pub fn is_format_error(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
