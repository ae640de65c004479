//! Core types shared by readers and strategies.

use serde::{Deserialize, Serialize};

use crate::error::ReadConsistencyError;

/// Which time step and vertical level to read.
///
/// `None` selects index 0 (or is ignored for arrays without that axis).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slice {
    pub t_index: Option<usize>,
    pub z_index: Option<usize>,
}

impl Slice {
    /// Create a new slice.
    pub fn new(t_index: Option<usize>, z_index: Option<usize>) -> Self {
        Self { t_index, z_index }
    }

    /// Slice at time step `t`, first level.
    pub fn at_time(t: usize) -> Self {
        Self {
            t_index: Some(t),
            z_index: None,
        }
    }
}

/// A rectangle of raw values returned by an [`crate::ArrayReader`],
/// i fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRectangle {
    pub ni: usize,
    pub nj: usize,
    pub values: Vec<f64>,
}

impl RawRectangle {
    /// Create a new rectangle.
    pub fn new(ni: usize, nj: usize, values: Vec<f64>) -> Self {
        Self { ni, nj, values }
    }

    /// Fail unless this is exactly the `ni` × `nj` rectangle that was asked for.
    pub fn check_shape(&self, ni: usize, nj: usize) -> Result<(), ReadConsistencyError> {
        if self.ni != ni || self.nj != nj || self.values.len() != ni * nj {
            return Err(ReadConsistencyError::ShapeMismatch {
                expected_ni: ni,
                expected_nj: nj,
                ni: self.ni,
                nj: self.nj,
                values: self.values.len(),
            });
        }
        Ok(())
    }

    /// Value at offset `(di, dj)` from the rectangle origin.
    pub fn value(&self, di: usize, dj: usize) -> Result<f64, ReadConsistencyError> {
        let out_of_range = ReadConsistencyError::OutOfRange {
            di,
            dj,
            ni: self.ni,
            nj: self.nj,
        };
        if di >= self.ni || dj >= self.nj {
            return Err(out_of_range);
        }
        self.values.get(dj * self.ni + di).copied().ok_or(out_of_range)
    }
}

/// I/O cost of running a strategy over a pixel map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadCost {
    /// Number of `read_rectangle` calls.
    pub read_calls: usize,
    /// Number of values fetched in total.
    pub values_read: usize,
}
