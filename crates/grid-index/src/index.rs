//! The contract shared by every spatial index variant.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use grid_geometry::CurvilinearGrid;

use crate::config::{IndexConfig, IndexKind};
use crate::error::{IndexBuildError, Result};
use crate::kdtree::KdTreeIndex;
use crate::lut::LookupTable;
use crate::rtree::{DynamicRTree, PriorityRTree};

/// Answers "which cell of this grid contains point P?".
///
/// Indexes are immutable after construction and shared between threads.
pub trait SpatialIndex: Send + Sync + Debug {
    /// Which variant this is.
    fn kind(&self) -> IndexKind;

    /// The grid this index was built from.
    fn grid(&self) -> &Arc<CurvilinearGrid>;

    /// The `(i, j)` of the cell containing `(lon, lat)`, or `None` when the
    /// point lies outside the grid.
    ///
    /// When a point lies exactly on a shared edge or corner, the cell with
    /// the lowest linear index `j * ni + i` is returned.
    fn nearest_cell(&self, lon: f64, lat: f64) -> Option<(usize, usize)>;

    /// Approximate heap footprint of the index structure in bytes.
    fn memory_bytes(&self) -> usize;
}

/// Build an index of the given kind.
pub fn build_index(
    kind: IndexKind,
    grid: Arc<CurvilinearGrid>,
    config: &IndexConfig,
) -> Result<Arc<dyn SpatialIndex>> {
    config.validate().map_err(IndexBuildError::InvalidConfig)?;
    check_addressable(&grid)?;

    let start = Instant::now();
    let (ni, nj) = (grid.ni(), grid.nj());
    let index: Arc<dyn SpatialIndex> = match kind {
        IndexKind::LookupTable => Arc::new(LookupTable::build(
            grid,
            config.lut_resolution,
            config.max_lut_points,
        )?),
        IndexKind::KdTree => {
            let params = config.kdtree.ok_or_else(|| {
                IndexBuildError::invalid_config("a kd_tree index requires kdtree parameters")
            })?;
            Arc::new(KdTreeIndex::build(grid, params)?)
        }
        IndexKind::PriorityRTree => Arc::new(PriorityRTree::build(grid)?),
        IndexKind::DynamicRTree => Arc::new(DynamicRTree::build(grid)?),
    };

    tracing::info!(
        kind = %kind,
        ni,
        nj,
        memory_bytes = index.memory_bytes(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Built spatial index"
    );
    Ok(index)
}

pub(crate) fn check_addressable(grid: &CurvilinearGrid) -> Result<()> {
    if grid.len() > u32::MAX as usize {
        return Err(IndexBuildError::GridTooLarge { cells: grid.len() });
    }
    Ok(())
}

/// Validate candidate cells (by linear index) against their polygons and
/// return the lowest containing one.
pub(crate) fn lowest_containing(
    grid: &CurvilinearGrid,
    candidates: impl IntoIterator<Item = usize>,
    lon: f64,
    lat: f64,
) -> Option<(usize, usize)> {
    let ni = grid.ni();
    candidates
        .into_iter()
        .filter(|&index| grid.cell(index % ni, index / ni).contains(lon, lat))
        .min()
        .map(|index| (index % ni, index / ni))
}
