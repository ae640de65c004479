//! Error types for spatial index construction.

use thiserror::Error;

/// Errors that can occur while building a spatial index.
///
/// A failed build leaves no entry behind in [`crate::IndexCache`]; a later
/// request simply tries again.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexBuildError {
    /// The lookup table would exceed the configured point budget.
    #[error("lookup table of {points} points exceeds the limit of {limit}")]
    TooLarge { points: usize, limit: usize },

    /// Cell indexes are stored as `u32`.
    #[error("grid has {cells} cells, more than a 32-bit cell index can address")]
    GridTooLarge { cells: usize },

    /// Missing or invalid build parameters.
    #[error("invalid index configuration: {0}")]
    InvalidConfig(String),
}

impl IndexBuildError {
    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for index construction.
pub type Result<T> = std::result::Result<T, IndexBuildError>;
