//! Target point lists: where extracted values are wanted.

use std::fmt;

use grid_geometry::{CoordinateAxis, RectilinearGrid, RegularGrid};

/// Longitude (i) and latitude (j) axes of a grid with separable axes.
pub type AxisPair<'a> = (&'a dyn CoordinateAxis, &'a dyn CoordinateAxis);

/// An ordered, finite, indexable list of target positions.
///
/// Implementations own the transformation from their own coordinate
/// reference into WGS84 lon/lat; a point that cannot be transformed
/// returns `None` and is left unfilled.
pub trait TargetDomain: Send + Sync {
    /// Number of target points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of target point `index` in lon/lat degrees.
    fn lon_lat(&self, index: usize) -> Option<(f64, f64)>;

    /// The separable lon/lat axes these points form, if any, with point
    /// `j * ni + i` at `(x[i], y[j])`. Enables the per-axis pixel map fast
    /// path.
    fn axes(&self) -> Option<AxisPair<'_>> {
        None
    }
}

/// Arbitrary points already in lon/lat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointList {
    points: Vec<(f64, f64)>,
}

impl PointList {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

impl FromIterator<(f64, f64)> for PointList {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl TargetDomain for PointList {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn lon_lat(&self, index: usize) -> Option<(f64, f64)> {
        self.points.get(index).copied()
    }
}

impl TargetDomain for RegularGrid {
    fn len(&self) -> usize {
        RegularGrid::len(self)
    }

    fn lon_lat(&self, index: usize) -> Option<(f64, f64)> {
        (index < RegularGrid::len(self)).then(|| RegularGrid::lon_lat(self, index))
    }

    fn axes(&self) -> Option<AxisPair<'_>> {
        Some((&self.x as &dyn CoordinateAxis, &self.y as &dyn CoordinateAxis))
    }
}

impl TargetDomain for RectilinearGrid {
    fn len(&self) -> usize {
        RectilinearGrid::len(self)
    }

    fn lon_lat(&self, index: usize) -> Option<(f64, f64)> {
        (index < RectilinearGrid::len(self)).then(|| RectilinearGrid::lon_lat(self, index))
    }

    fn axes(&self) -> Option<AxisPair<'_>> {
        Some((&self.x as &dyn CoordinateAxis, &self.y as &dyn CoordinateAxis))
    }
}

/// Transform from a projected `(x, y)` into lon/lat, `None` where undefined.
pub type ToLonLat = Box<dyn Fn(f64, f64) -> Option<(f64, f64)> + Send + Sync>;

/// Points in some projected coordinate reference plus the transform that
/// takes them to lon/lat.
pub struct ProjectedPoints {
    points: Vec<(f64, f64)>,
    to_lon_lat: ToLonLat,
}

impl ProjectedPoints {
    pub fn new(points: Vec<(f64, f64)>, to_lon_lat: ToLonLat) -> Self {
        Self { points, to_lon_lat }
    }
}

impl fmt::Debug for ProjectedPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectedPoints")
            .field("len", &self.points.len())
            .finish_non_exhaustive()
    }
}

impl TargetDomain for ProjectedPoints {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn lon_lat(&self, index: usize) -> Option<(f64, f64)> {
        let &(x, y) = self.points.get(index)?;
        (self.to_lon_lat)(x, y)
    }
}
