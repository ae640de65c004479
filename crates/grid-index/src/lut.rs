//! Dense lookup table of precomputed containing-cell answers.

use std::sync::Arc;
use std::time::Instant;

use grid_geometry::{constrain_lon_180, CurvilinearGrid, LonLatRect};
use rayon::prelude::*;

use crate::config::IndexKind;
use crate::error::{IndexBuildError, Result};
use crate::index::{check_addressable, SpatialIndex};
use crate::rtree::PriorityRTree;

/// Marker for table nodes outside the grid.
const NO_CELL: u32 = u32::MAX;

/// Regularly spaced table nodes along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TableAxis {
    min: f64,
    stride: f64,
    count: usize,
}

impl TableAxis {
    /// `ceil(extent / resolution) + 1` nodes spanning `[min, max]` exactly.
    fn spanning(min: f64, max: f64, resolution: f64) -> Self {
        let extent = max - min;
        let count = (extent / resolution).ceil() as usize + 1;
        let count = count.max(2);
        Self {
            min,
            stride: extent / (count - 1) as f64,
            count,
        }
    }

    fn value(&self, index: usize) -> f64 {
        self.min + index as f64 * self.stride
    }

    fn nearest(&self, value: f64) -> Option<usize> {
        let position = ((value - self.min) / self.stride).round();
        (position >= 0.0 && position < self.count as f64).then(|| position as usize)
    }
}

/// Raster over the grid's bounding box. Every node stores the cell that
/// contains it; a query rounds to the nearest node and returns that answer
/// without any polygon test, so results near cell edges are only accurate
/// to within the table resolution.
#[derive(Debug)]
pub struct LookupTable {
    grid: Arc<CurvilinearGrid>,
    lon_axis: TableAxis,
    lat_axis: TableAxis,
    cells: Vec<u32>,
}

impl LookupTable {
    /// Build a table with nodes every `resolution` degrees, refusing tables
    /// of more than `max_points` nodes.
    pub fn build(grid: Arc<CurvilinearGrid>, resolution: f64, max_points: usize) -> Result<Self> {
        if !(resolution > 0.0) || !resolution.is_finite() {
            return Err(IndexBuildError::invalid_config(format!(
                "lookup table resolution {resolution} must be positive"
            )));
        }
        check_addressable(&grid)?;

        let bbox: LonLatRect = grid.bounding_box();
        let lon_axis = TableAxis::spanning(bbox.min_lon, bbox.max_lon, resolution);
        let lat_axis = TableAxis::spanning(bbox.min_lat, bbox.max_lat, resolution);
        let points = lon_axis.count.saturating_mul(lat_axis.count);
        if points > max_points {
            tracing::warn!(
                points,
                limit = max_points,
                resolution,
                "Refusing to build oversized lookup table"
            );
            return Err(IndexBuildError::TooLarge {
                points,
                limit: max_points,
            });
        }

        let start = Instant::now();
        let rtree = PriorityRTree::build(grid.clone())?;
        let ni = grid.ni();
        let mut cells = vec![NO_CELL; points];
        cells
            .par_chunks_mut(lon_axis.count)
            .enumerate()
            .for_each(|(row, slots)| {
                let lat = lat_axis.value(row);
                for (col, slot) in slots.iter_mut().enumerate() {
                    if let Some((i, j)) = rtree.nearest_cell(lon_axis.value(col), lat) {
                        *slot = (j * ni + i) as u32;
                    }
                }
            });

        tracing::debug!(
            width = lon_axis.count,
            height = lat_axis.count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Filled lookup table"
        );
        Ok(Self {
            grid,
            lon_axis,
            lat_axis,
            cells,
        })
    }

    /// Table dimensions `(lon nodes, lat nodes)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.lon_axis.count, self.lat_axis.count)
    }
}

impl SpatialIndex for LookupTable {
    fn kind(&self) -> IndexKind {
        IndexKind::LookupTable
    }

    fn grid(&self) -> &Arc<CurvilinearGrid> {
        &self.grid
    }

    fn nearest_cell(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let row = self.lat_axis.nearest(lat)?;
        let lon = constrain_lon_180(lon);
        // The table may extend past ±180 for grids touching the antimeridian
        for candidate in [lon, lon + 360.0, lon - 360.0] {
            if let Some(col) = self.lon_axis.nearest(candidate) {
                let cell = self.cells[row * self.lon_axis.count + col];
                if cell != NO_CELL {
                    let ni = self.grid.ni();
                    let cell = cell as usize;
                    return Some((cell % ni, cell / ni));
                }
            }
        }
        None
    }

    fn memory_bytes(&self) -> usize {
        self.cells.len() * std::mem::size_of::<u32>()
    }
}
