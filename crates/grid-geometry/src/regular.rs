//! Regular (axis-aligned, evenly spaced) lon/lat grids.

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::rect::LonLatRect;

/// An evenly spaced 1-D coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegularAxis {
    pub start: f64,
    /// Spacing between consecutive values; may be negative.
    pub stride: f64,
    pub count: usize,
    /// Longitude axes match values modulo 360.
    pub is_longitude: bool,
}

impl RegularAxis {
    pub fn new(start: f64, stride: f64, count: usize, is_longitude: bool) -> Result<Self> {
        if count == 0 {
            return Err(GeometryError::invalid_axis("axis has no values"));
        }
        if !start.is_finite() || !stride.is_finite() || stride == 0.0 {
            return Err(GeometryError::invalid_axis(format!(
                "start {start} / stride {stride} must be finite and stride non-zero"
            )));
        }
        Ok(Self {
            start,
            stride,
            count,
            is_longitude,
        })
    }

    /// Coordinate value at `index`.
    pub fn value(&self, index: usize) -> f64 {
        self.start + index as f64 * self.stride
    }

    /// Index of the value nearest to `value`, or `None` if `value` lies more
    /// than half a stride beyond either end of the axis.
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

    fn index_in_range(&self, value: f64) -> Option<usize> {
        let position = ((value - self.start) / self.stride).round();
        if position >= 0.0 && position < self.count as f64 {
            Some(position as usize)
        } else {
            None
        }
    }
}

/// A regular lon/lat grid: `x` is the longitude axis (i), `y` the latitude
/// axis (j).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegularGrid {
    pub x: RegularAxis,
    pub y: RegularAxis,
}

impl RegularGrid {
    pub fn new(x: RegularAxis, y: RegularAxis) -> Result<Self> {
        if !x.is_longitude {
            return Err(GeometryError::invalid_axis("x axis must be a longitude axis"));
        }
        if y.is_longitude {
            return Err(GeometryError::invalid_axis("y axis must be a latitude axis"));
        }
        Ok(Self { x, y })
    }

    /// Image-shaped grid of pixel centres covering `bbox`, row 0 at the
    /// northern edge.
    pub fn from_bbox(bbox: &LonLatRect, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GeometryError::invalid_axis(format!(
                "image size {width}x{height} must be non-zero"
            )));
        }
        let dx = bbox.width() / width as f64;
        let dy = bbox.height() / height as f64;
        Self::new(
            RegularAxis::new(bbox.min_lon + dx / 2.0, dx, width, true)?,
            RegularAxis::new(bbox.max_lat - dy / 2.0, -dy, height, false)?,
        )
    }

    pub fn ni(&self) -> usize {
        self.x.count
    }

    pub fn nj(&self) -> usize {
        self.y.count
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_rejects_zero_stride() {
        assert!(RegularAxis::new(0.0, 0.0, 10, false).is_err());
        assert!(RegularAxis::new(0.0, 1.0, 0, false).is_err());
    }

    #[test]
    fn test_nearest_index() {
        let axis = RegularAxis::new(10.0, 0.5, 5, false).unwrap();
        assert_eq!(axis.nearest_index(10.0), Some(0));
        assert_eq!(axis.nearest_index(11.1), Some(2));
        assert_eq!(axis.nearest_index(12.2), Some(4));
        assert_eq!(axis.nearest_index(9.8), Some(0));
        assert_eq!(axis.nearest_index(9.7), None);
        assert_eq!(axis.nearest_index(12.3), None);
        assert_eq!(axis.nearest_index(f64::NAN), None);
    }

    #[test]
    fn test_descending_axis() {
        let axis = RegularAxis::new(89.5, -1.0, 180, false).unwrap();
        assert_eq!(axis.nearest_index(89.9), Some(0));
        assert_eq!(axis.nearest_index(-89.5), Some(179));
    }

    #[test]
    fn test_longitude_wraps() {
        let axis = RegularAxis::new(0.0, 1.0, 360, true).unwrap();
        assert_eq!(axis.nearest_index(-1.0), Some(359));
        assert_eq!(axis.nearest_index(-179.6), Some(180));
        let lat = RegularAxis::new(0.0, 1.0, 360, false).unwrap();
        assert_eq!(lat.nearest_index(-1.0), None);
    }

    #[test]
    fn test_from_bbox() {
        let grid = RegularGrid::from_bbox(&LonLatRect::new(0.0, 0.0, 4.0, 2.0), 4, 2).unwrap();
        assert_eq!(grid.len(), 8);
        assert_eq!(grid.lon_lat(0), (0.5, 1.5));
        assert_eq!(grid.lon_lat(7), (3.5, 0.5));
        assert_eq!(grid.find_cell(3.9, 0.1), Some((3, 1)));
        assert_eq!(grid.find_cell(5.0, 0.1), None);
    }

    #[test]
    fn test_serde_roundtrip_shape() {
        let axis = RegularAxis::new(-180.0, 0.25, 1440, true).unwrap();
        let json = serde_json::to_string(&axis).unwrap();
        assert!(json.contains("\"is_longitude\":true"));
    }
}
