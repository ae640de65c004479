//! Rectilinear lon/lat grids whose axes need not be evenly spaced.
//!
//! Both [`RegularAxis`] and [`ReferenceableAxis`] implement
//! [`CoordinateAxis`], which is all the per-axis pixel mapping needs.

use crate::error::{GeometryError, Result};
use crate::regular::RegularAxis;

/// A 1-D coordinate axis that can locate values by index.
pub trait CoordinateAxis: Send + Sync {
    /// Number of values on the axis.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinate value at `index`.
    fn value(&self, index: usize) -> f64;

    /// Index of the value nearest to `value`, `None` beyond the axis ends.
    fn nearest_index(&self, value: f64) -> Option<usize>;
}

impl CoordinateAxis for RegularAxis {
    fn len(&self) -> usize {
        self.count
    }

    fn value(&self, index: usize) -> f64 {
        RegularAxis::value(self, index)
    }

    fn nearest_index(&self, value: f64) -> Option<usize> {
        RegularAxis::nearest_index(self, value)
    }
}

/// A strictly monotonic, arbitrarily spaced 1-D coordinate axis.
///
/// Lookups binary-search the values. A value is accepted up to half the
/// end spacing beyond the first and last values, the same extension a
/// [`RegularAxis`] gives. Equidistant values resolve to the higher index.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceableAxis {
    values: Vec<f64>,
    descending: bool,
    is_longitude: bool,
}

impl ReferenceableAxis {
    pub fn new(values: Vec<f64>, is_longitude: bool) -> Result<Self> {
        if values.len() < 2 {
            return Err(GeometryError::invalid_axis(format!(
                "referenceable axis needs at least 2 values, got {}",
                values.len()
            )));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(GeometryError::invalid_axis(format!(
                "non-finite axis value at index {index}"
            )));
        }
        let descending = values[1] < values[0];
        let monotonic = values.windows(2).all(|w| {
            if descending {
                w[1] < w[0]
            } else {
                w[1] > w[0]
            }
        });
        if !monotonic {
            return Err(GeometryError::invalid_axis(
                "axis values must be strictly increasing or strictly decreasing",
            ));
        }
        Ok(Self {
            values,
            descending,
            is_longitude,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_longitude(&self) -> bool {
        self.is_longitude
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Coordinate value at `index`.
    pub fn value(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Index of the value nearest to `value`; longitude axes also try
    /// `value ± 360`.
    pub fn nearest_index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        if let Some(index) = self.index_in_range(value) {
            return Some(index);
        }
        if self.is_longitude {
            self.index_in_range(value + 360.0)
                .or_else(|| self.index_in_range(value - 360.0))
        } else {
            None
        }
    }

    /// Values mirrored so they always ascend.
    #[inline]
    fn key(&self, value: f64) -> f64 {
        if self.descending {
            -value
        } else {
            value
        }
    }

    fn index_in_range(&self, value: f64) -> Option<usize> {
        let n = self.values.len();
        let target = self.key(value);
        let first = self.key(self.values[0]);
        let last = self.key(self.values[n - 1]);
        let lower_edge = first - (self.key(self.values[1]) - first) / 2.0;
        let upper_edge = last + (last - self.key(self.values[n - 2])) / 2.0;
        if target <= lower_edge || target >= upper_edge {
            return None;
        }

        let above = self.values.partition_point(|&v| self.key(v) < target);
        let index = if above == 0 {
            0
        } else if above == n {
            n - 1
        } else {
            let below = above - 1;
            let to_below = target - self.key(self.values[below]);
            let to_above = self.key(self.values[above]) - target;
            if to_below < to_above {
                below
            } else {
                above
            }
        };
        Some(index)
    }
}

impl CoordinateAxis for ReferenceableAxis {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn value(&self, index: usize) -> f64 {
        self.values[index]
    }

    fn nearest_index(&self, value: f64) -> Option<usize> {
        ReferenceableAxis::nearest_index(self, value)
    }
}

/// A lon/lat grid with independent, possibly irregular axes: `x` is the
/// longitude axis (i), `y` the latitude axis (j).
#[derive(Debug, Clone, PartialEq)]
pub struct RectilinearGrid {
    pub x: ReferenceableAxis,
    pub y: ReferenceableAxis,
}

impl RectilinearGrid {
    pub fn new(x: ReferenceableAxis, y: ReferenceableAxis) -> Result<Self> {
        if !x.is_longitude {
            return Err(GeometryError::invalid_axis("x axis must be a longitude axis"));
        }
        if y.is_longitude {
            return Err(GeometryError::invalid_axis("y axis must be a latitude axis"));
        }
        Ok(Self { x, y })
    }

    pub fn ni(&self) -> usize {
        self.x.len()
    }

    pub fn nj(&self) -> usize {
        self.y.len()
    }

    /// Number of points, i fastest.
    pub fn len(&self) -> usize {
        self.ni() * self.nj()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinates of point `index` (i fastest).
    pub fn lon_lat(&self, index: usize) -> (f64, f64) {
        let ni = self.ni();
        (self.x.value(index % ni), self.y.value(index / ni))
    }

    /// The cell `(i, j)` nearest to a point, if the point falls within the
    /// grid.
    pub fn find_cell(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        Some((self.x.nearest_index(lon)?, self.y.nearest_index(lat)?))
    }
}
