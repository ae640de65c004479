//! Axis-aligned lon/lat rectangles.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in longitude/latitude degrees.
///
/// Longitudes are not wrapped: a rectangle built from harmonized cell
/// corners may extend past ±180.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLatRect {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl LonLatRect {
    /// Create a new rectangle.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// The smallest rectangle enclosing all `points`.
    ///
    /// Returns `None` for an empty slice.
    pub fn enclosing(points: &[(f64, f64)]) -> Option<Self> {
        let (&(lon, lat), rest) = points.split_first()?;
        let mut rect = Self::new(lon, lat, lon, lat);
        for &(lon, lat) in rest {
            rect.include(lon, lat);
        }
        Some(rect)
    }

    /// Grow the rectangle so that it contains the given point.
    pub fn include(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }

    /// Union of two rectangles.
    pub fn union(&self, other: &LonLatRect) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Check if this rectangle intersects another.
    pub fn intersects(&self, other: &LonLatRect) -> bool {
        !(self.max_lon < other.min_lon
            || self.min_lon > other.max_lon
            || self.max_lat < other.min_lat
            || self.min_lat > other.max_lat)
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// The same rectangle moved by `offset` degrees of longitude.
    pub fn translate_lon(&self, offset: f64) -> Self {
        Self {
            min_lon: self.min_lon + offset,
            max_lon: self.max_lon + offset,
            ..*self
        }
    }
}
