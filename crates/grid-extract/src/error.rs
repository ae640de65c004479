//! Error types for pixel mapping and data extraction.

use std::ops::Range;

use grid_geometry::GeometryError;
use grid_index::IndexBuildError;
use thiserror::Error;

/// The backing store returned something that disagrees with the pixel map.
///
/// This indicates a logic defect (or a misbehaving reader) and always
/// aborts the extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadConsistencyError {
    /// The rectangle does not have the requested shape.
    #[error("requested a {expected_ni}x{expected_nj} rectangle, got {ni}x{nj} with {values} values")]
    ShapeMismatch {
        expected_ni: usize,
        expected_nj: usize,
        ni: usize,
        nj: usize,
        values: usize,
    },

    /// A pixel map cell falls outside the rectangle that was read.
    #[error("offset ({di}, {dj}) is outside the {ni}x{nj} rectangle read")]
    OutOfRange {
        di: usize,
        dj: usize,
        ni: usize,
        nj: usize,
    },
}

/// I/O failure reported by an [`crate::ArrayReader`].
///
/// Passed through to the caller unchanged; no retry is attempted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackingStoreError {
    /// Failed to open the array.
    #[error("failed to open array: {0}")]
    OpenFailed(String),

    /// Failed to read data from the array.
    #[error("failed to read array data: {0}")]
    ReadFailed(String),

    /// The requested rectangle or slice lies outside the array.
    #[error("requested i={i:?} j={j:?} outside array of {ni}x{nj}")]
    OutOfBounds {
        i: Range<usize>,
        j: Range<usize>,
        ni: usize,
        nj: usize,
    },

    /// Array rank or data type the reader cannot handle.
    #[error("unsupported array: {0}")]
    Unsupported(String),
}

impl BackingStoreError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// Errors that can abort an extraction.
///
/// Points that fall outside the source grid are not errors; they simply
/// stay NaN in the output.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Malformed source grid.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Spatial index could not be built.
    #[error(transparent)]
    IndexBuild(#[from] IndexBuildError),

    /// Read result disagrees with the pixel map.
    #[error(transparent)]
    ReadConsistency(#[from] ReadConsistencyError),

    /// Backing store failure.
    #[error(transparent)]
    BackingStore(#[from] BackingStoreError),

    /// Source or target too large for 32-bit packed indices.
    #[error("pixel map too large: {0}")]
    TooLarge(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ExtractError {
    /// Create a TooLarge error.
    pub fn too_large(msg: impl Into<String>) -> Self {
        Self::TooLarge(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
