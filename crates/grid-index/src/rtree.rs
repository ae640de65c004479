//! R-tree indexes over cell bounding rectangles.
//!
//! Both variants store one rectangle per cell (two for cells straddling the
//! antimeridian) and answer a query with an intersection search at the
//! query point, followed by an exact polygon test over the handful of
//! returned candidates.

use std::fmt;
use std::sync::Arc;

use grid_geometry::{constrain_lon_180, CurvilinearGrid};
use rstar::{RStarInsertionStrategy, RTree, RTreeObject, RTreeParams, AABB};

use crate::config::IndexKind;
use crate::error::Result;
use crate::index::{check_addressable, lowest_containing, SpatialIndex};

/// Maximum number of children per R-tree node.
pub const RTREE_BRANCH_FACTOR: usize = 10;

/// Node sizing for the bulk-loaded tree.
#[derive(Debug, Clone, Copy)]
pub struct BranchFactorParams;

impl RTreeParams for BranchFactorParams {
    const MIN_SIZE: usize = 4;
    const MAX_SIZE: usize = RTREE_BRANCH_FACTOR;
    const REINSERTION_COUNT: usize = 3;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

/// A cell's bounding rectangle tagged with its linear index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEnvelope {
    min: [f64; 2],
    max: [f64; 2],
    cell: u32,
}

impl CellEnvelope {
    /// Linear index `j * ni + i` of the cell.
    pub fn cell(&self) -> u32 {
        self.cell
    }
}

impl RTreeObject for CellEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Rectangles for every cell, plus shifted duplicates for antimeridian cells.
fn cell_envelopes(grid: &CurvilinearGrid) -> Vec<CellEnvelope> {
    let ni = grid.ni();
    let mut envelopes = Vec::with_capacity(grid.len());
    for cell in grid.cells() {
        let id = (cell.j * ni + cell.i) as u32;
        let rect = cell.rect;
        envelopes.push(CellEnvelope {
            min: [rect.min_lon, rect.min_lat],
            max: [rect.max_lon, rect.max_lat],
            cell: id,
        });
        if let Some(shift) = cell.antimeridian_shift() {
            let shifted = rect.translate_lon(shift);
            envelopes.push(CellEnvelope {
                min: [shifted.min_lon, shifted.min_lat],
                max: [shifted.max_lon, shifted.max_lat],
                cell: id,
            });
        }
    }
    envelopes
}

fn query<P: RTreeParams>(
    tree: &RTree<CellEnvelope, P>,
    grid: &CurvilinearGrid,
    lon: f64,
    lat: f64,
) -> Option<(usize, usize)> {
    if !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    let lon = constrain_lon_180(lon);
    let envelope = AABB::from_point([lon, lat]);
    let candidates = tree
        .locate_in_envelope_intersecting(&envelope)
        .map(|entry| entry.cell as usize);
    lowest_containing(grid, candidates, lon, lat)
}

/// Immutable R-tree, bulk-loaded once with a fixed branch factor.
pub struct PriorityRTree {
    grid: Arc<CurvilinearGrid>,
    tree: RTree<CellEnvelope, BranchFactorParams>,
}

impl PriorityRTree {
    pub fn build(grid: Arc<CurvilinearGrid>) -> Result<Self> {
        check_addressable(&grid)?;
        let tree = RTree::bulk_load_with_params(cell_envelopes(&grid));
        Ok(Self { grid, tree })
    }

    /// Number of rectangles stored, including antimeridian duplicates.
    pub fn size(&self) -> usize {
        self.tree.size()
    }
}

impl fmt::Debug for PriorityRTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityRTree")
            .field("ni", &self.grid.ni())
            .field("nj", &self.grid.nj())
            .field("size", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl SpatialIndex for PriorityRTree {
    fn kind(&self) -> IndexKind {
        IndexKind::PriorityRTree
    }

    fn grid(&self) -> &Arc<CurvilinearGrid> {
        &self.grid
    }

    fn nearest_cell(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        query(&self.tree, &self.grid, lon, lat)
    }

    fn memory_bytes(&self) -> usize {
        // Leaves plus roughly one internal node per branch factor leaves
        let leaves = self.tree.size() * std::mem::size_of::<CellEnvelope>();
        leaves + leaves / (RTREE_BRANCH_FACTOR - 1)
    }
}

/// R-tree grown by inserting cells one at a time with the default R* node
/// parameters.
pub struct DynamicRTree {
    grid: Arc<CurvilinearGrid>,
    tree: RTree<CellEnvelope>,
}

impl DynamicRTree {
    pub fn build(grid: Arc<CurvilinearGrid>) -> Result<Self> {
        check_addressable(&grid)?;
        let mut tree = RTree::new();
        for envelope in cell_envelopes(&grid) {
            tree.insert(envelope);
        }
        Ok(Self { grid, tree })
    }

    /// Number of rectangles stored, including antimeridian duplicates.
    pub fn size(&self) -> usize {
        self.tree.size()
    }
}

impl fmt::Debug for DynamicRTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRTree")
            .field("ni", &self.grid.ni())
            .field("nj", &self.grid.nj())
            .field("size", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl SpatialIndex for DynamicRTree {
    fn kind(&self) -> IndexKind {
        IndexKind::DynamicRTree
    }

    fn grid(&self) -> &Arc<CurvilinearGrid> {
        &self.grid
    }

    fn nearest_cell(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        query(&self.tree, &self.grid, lon, lat)
    }

    fn memory_bytes(&self) -> usize {
        let leaves = self.tree.size() * std::mem::size_of::<CellEnvelope>();
        leaves + leaves / 2
    }
}
