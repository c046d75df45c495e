//! Error types returned by the strict clustering entry points and the point repository.

use thiserror::Error;

/// Errors raised while validating input, converting GeoJSON or writing to a point source.
#[derive(Debug, Error)]
pub enum Error {
    /// A numeric argument was non-finite or outside its allowed range.
    #[error("invalid {name}: {value}")]
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
        /// Value that was rejected.
        value: f64,
    },

    /// A point lies outside the valid latitude/longitude range or is not finite.
    #[error("point {id} has invalid coordinates ({lat}, {lng})")]
    InvalidCoordinate {
        /// Identifier of the rejected point.
        id: String,
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lng: f64,
    },

    /// A GeoJSON feature could not be turned into a point.
    #[error("invalid feature: {0}")]
    InvalidFeature(String),

    /// Pass-through metadata uses a key that the point's own fields serialize under.
    #[error("point {id} carries reserved property {key}")]
    ReservedProperty {
        /// Identifier of the rejected point.
        id: String,
        /// The clashing key.
        key: String,
    },

    /// A point with the same identifier already exists.
    #[error("point {0} already exists")]
    DuplicateId(String),

    /// A point was submitted without a title.
    #[error("point title must not be empty")]
    MissingTitle,

    /// Parsing JSON input failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
