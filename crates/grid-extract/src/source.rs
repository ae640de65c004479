//! Source grids: where the data lives.

use std::sync::Arc;

use grid_geometry::{CoordinateAxis, RectilinearGrid, RegularGrid};
use grid_index::SpatialIndex;

use crate::target::AxisPair;

/// A source grid together with whatever is needed to locate points in it.
#[derive(Debug, Clone)]
pub enum SourceGrid {
    /// Curvilinear grid, located through a spatial index.
    Curvilinear(Arc<dyn SpatialIndex>),
    /// Regular lon/lat grid, located by axis arithmetic.
    Regular(RegularGrid),
    /// Lon/lat grid with irregularly spaced axes, located by binary search.
    Rectilinear(RectilinearGrid),
}

impl SourceGrid {
    /// Extent along the fastest-varying axis.
    pub fn ni(&self) -> usize {
        match self {
            Self::Curvilinear(index) => index.grid().ni(),
            Self::Regular(grid) => grid.ni(),
            Self::Rectilinear(grid) => grid.ni(),
        }
    }

    /// Extent along the slow axis.
    pub fn nj(&self) -> usize {
        match self {
            Self::Curvilinear(index) => index.grid().nj(),
            Self::Regular(grid) => grid.nj(),
            Self::Rectilinear(grid) => grid.nj(),
        }
    }

    /// The cell containing (or, for axis-aligned grids, nearest to) a
    /// point.
    pub fn find_cell(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        match self {
            Self::Curvilinear(index) => index.nearest_cell(lon, lat),
            Self::Regular(_) | Self::Rectilinear(_) if !(-90.0..=90.0).contains(&lat) => None,
            Self::Regular(grid) => grid.find_cell(lon, lat),
            Self::Rectilinear(grid) => grid.find_cell(lon, lat),
        }
    }

    /// Longitude and latitude axes, for grids whose axes are separable.
    pub fn axes(&self) -> Option<AxisPair<'_>> {
        match self {
            Self::Curvilinear(_) => None,
            Self::Regular(grid) => Some((&grid.x as &dyn CoordinateAxis, &grid.y as &dyn CoordinateAxis)),
            Self::Rectilinear(grid) => Some((&grid.x as &dyn CoordinateAxis, &grid.y as &dyn CoordinateAxis)),
        }
    }
}

impl From<Arc<dyn SpatialIndex>> for SourceGrid {
    fn from(index: Arc<dyn SpatialIndex>) -> Self {
        Self::Curvilinear(index)
    }
}

impl From<RegularGrid> for SourceGrid {
    fn from(grid: RegularGrid) -> Self {
        Self::Regular(grid)
    }
}

impl From<RectilinearGrid> for SourceGrid {
    fn from(grid: RectilinearGrid) -> Self {
        Self::Rectilinear(grid)
    }
}
