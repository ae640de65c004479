//! Raw node coordinates of a 2-D grid and their identity.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{GeometryError, Result};
use crate::longitude::constrain_lon_180;

/// Validated longitude/latitude arrays of an `ni` × `nj` grid, i fastest.
///
/// Two values are equal when their shapes match and every coordinate is
/// bitwise identical. A fingerprint of the arrays is computed once so that
/// hashing a large grid is O(1).
#[derive(Debug, Clone)]
pub struct GridCoordinates {
    ni: usize,
    nj: usize,
    lon: Vec<f64>,
    lat: Vec<f64>,
    fingerprint: u64,
}

impl GridCoordinates {
    /// Validate and wrap node coordinates.
    ///
    /// Longitudes are normalized into [-180, 180).
    pub fn new(ni: usize, nj: usize, mut lon: Vec<f64>, lat: Vec<f64>) -> Result<Self> {
        if ni < 2 || nj < 2 {
            return Err(GeometryError::degenerate(ni, nj));
        }
        let expected = ni * nj;
        if lon.len() != expected {
            return Err(GeometryError::ShapeMismatch {
                axis: "longitude",
                expected,
                actual: lon.len(),
            });
        }
        if lat.len() != expected {
            return Err(GeometryError::ShapeMismatch {
                axis: "latitude",
                expected,
                actual: lat.len(),
            });
        }

        for (index, (x, y)) in lon.iter_mut().zip(&lat).enumerate() {
            let (i, j) = (index % ni, index / ni);
            if !x.is_finite() || !y.is_finite() {
                return Err(GeometryError::NonFinite { i, j });
            }
            if y.abs() > 90.0 {
                return Err(GeometryError::LatitudeOutOfRange { i, j, lat: *y });
            }
            *x = constrain_lon_180(*x);
        }

        let fingerprint = fingerprint(ni, nj, &lon, &lat);
        Ok(Self {
            ni,
            nj,
            lon,
            lat,
            fingerprint,
        })
    }

    /// Number of nodes along the fastest-varying axis.
    pub fn ni(&self) -> usize {
        self.ni
    }

    /// Number of nodes along the slow axis.
    pub fn nj(&self) -> usize {
        self.nj
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.ni * self.nj
    }

    /// Always false: construction rejects grids smaller than 2x2.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Node coordinates `(lon, lat)` at `(i, j)`.
    ///
    /// # Panics
    /// Panics if `(i, j)` is outside the grid.
    pub fn node(&self, i: usize, j: usize) -> (f64, f64) {
        let index = j * self.ni + i;
        (self.lon[index], self.lat[index])
    }

    /// All longitudes, i fastest.
    pub fn lons(&self) -> &[f64] {
        &self.lon
    }

    /// All latitudes, i fastest.
    pub fn lats(&self) -> &[f64] {
        &self.lat
    }

    /// Precomputed hash of shape and coordinate bits.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

fn fingerprint(ni: usize, nj: usize, lon: &[f64], lat: &[f64]) -> u64 {
    let mut hasher = DefaultHasher::new();
    ni.hash(&mut hasher);
    nj.hash(&mut hasher);
    for v in lon.iter().chain(lat) {
        v.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

fn bitwise_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

impl PartialEq for GridCoordinates {
    fn eq(&self, other: &Self) -> bool {
        self.ni == other.ni
            && self.nj == other.nj
            && self.fingerprint == other.fingerprint
            && bitwise_eq(&self.lon, &other.lon)
            && bitwise_eq(&self.lat, &other.lat)
    }
}

impl Eq for GridCoordinates {}

impl Hash for GridCoordinates {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}
