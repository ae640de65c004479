//! Error types for grid geometry.

use thiserror::Error;

/// Errors raised while constructing grid geometry from raw coordinates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Fewer than two nodes along an axis.
    #[error("grid must be at least 2x2 nodes, got {ni}x{nj}")]
    Degenerate { ni: usize, nj: usize },

    /// A coordinate array does not hold `ni * nj` values.
    #[error("{axis} array has {actual} values, expected {expected}")]
    ShapeMismatch {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },

    /// NaN or infinite coordinate.
    #[error("non-finite coordinate at i={i}, j={j}")]
    NonFinite { i: usize, j: usize },

    /// Latitude outside [-90, 90].
    #[error("latitude {lat} at i={i}, j={j} is outside [-90, 90]")]
    LatitudeOutOfRange { i: usize, j: usize, lat: f64 },

    /// Axis definition that cannot index anything.
    #[error("invalid axis: {0}")]
    InvalidAxis(String),
}

impl GeometryError {
    /// Create a Degenerate error.
    pub fn degenerate(ni: usize, nj: usize) -> Self {
        Self::Degenerate { ni, nj }
    }

    /// Create an InvalidAxis error.
    pub fn invalid_axis(msg: impl Into<String>) -> Self {
        Self::InvalidAxis(msg.into())
    }
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;
