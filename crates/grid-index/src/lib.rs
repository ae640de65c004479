//! Containing-cell spatial indexes for curvilinear grids.
//!
//! Four interchangeable variants implement [`SpatialIndex`]:
//!
//! | Kind | Build | Query | Exact? |
//! |------|-------|-------|--------|
//! | [`LookupTable`] | O(table) | O(1) array read | no, resolution bounded |
//! | [`KdTreeIndex`] | O(n log n) | k nearest centroids + polygon test | yes, or `None` |
//! | [`PriorityRTree`] | O(n log n) bulk load | rectangle search + polygon test | yes |
//! | [`DynamicRTree`] | O(n log n) inserts | rectangle search + polygon test | yes |
//!
//! # Architecture
//!
//! ```text
//! request (grid coords, kind)
//!      │
//!      ▼
//! IndexCache::load_grid ──► interned Arc<CurvilinearGrid>
//!      │
//!      ▼
//! IndexCache::get_or_build(grid, kind)
//!      │
//!      ├─► built?  read lock, clone Arc, done
//!      │
//!      └─► per-key build lock ──► build_index ──► insert
//!                                      │
//!                                      ▼
//!                         Arc<dyn SpatialIndex>::nearest_cell(lon, lat)
//! ```
//!
//! Points lying exactly on a shared cell edge resolve to the cell with the
//! lowest linear index `j * ni + i`, whichever variant is used.

pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod kdtree;
pub mod lut;
pub mod rtree;

pub use cache::{IndexCache, IndexCacheStats};
pub use config::{IndexConfig, IndexKind, KdTreeParams};
pub use error::{IndexBuildError, Result};
pub use index::{build_index, SpatialIndex};
pub use kdtree::{KdTree, KdTreeIndex};
pub use lut::LookupTable;
pub use rtree::{DynamicRTree, PriorityRTree, RTREE_BRANCH_FACTOR};
