//! KD-tree over cell centroids.
//!
//! The tree is stored implicitly: points are reordered so that every
//! subtree occupies a contiguous range with its splitting point at the
//! middle, and only the split axis is kept per node. Construction is
//! O(n log n) with median selection on the axis of larger spread.
//!
//! Queries are approximate. The search radius starts small and grows
//! until some centroid is found, then the k nearest centroids are checked
//! against their cell polygons. If none contains the point, a short descent
//! over edge neighbours towards the point is tried before giving up.

use std::f64::consts::SQRT_2;
use std::sync::Arc;

use grid_geometry::{constrain_lon_180, CurvilinearGrid};

use crate::config::{IndexKind, KdTreeParams};
use crate::error::{IndexBuildError, Result};
use crate::index::{check_addressable, lowest_containing, SpatialIndex};

#[derive(Debug, Clone, Copy)]
struct KdPoint {
    coords: [f64; 2],
    cell: u32,
}

/// 2-D KD-tree keyed by (lon, lat) with a cell index payload.
#[derive(Debug)]
pub struct KdTree {
    points: Vec<KdPoint>,
    axes: Vec<u8>,
}

impl KdTree {
    /// Build a tree from `(lon, lat, cell)` triples.
    pub fn build(entries: impl IntoIterator<Item = (f64, f64, u32)>) -> Self {
        let mut points: Vec<KdPoint> = entries
            .into_iter()
            .map(|(lon, lat, cell)| KdPoint {
                coords: [lon, lat],
                cell,
            })
            .collect();
        let mut axes = vec![0u8; points.len()];
        build_recursive(&mut points, &mut axes);
        Self { points, axes }
    }

    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All `(distance_sq, cell)` within `radius` of `(lon, lat)`, unordered.
    pub fn within_radius(&self, lon: f64, lat: f64, radius: f64) -> Vec<(f64, u32)> {
        let mut out = Vec::new();
        self.within_recursive(0, self.points.len(), [lon, lat], radius * radius, &mut out);
        out
    }

    /// Up to `params.k` cells whose centroids are nearest to `(lon, lat)`,
    /// closest first.
    ///
    /// The radius starts at `nominal_resolution` and grows by
    /// `expansion_factor` (capped at `max_distance`) until something is
    /// found; the final search is widened by √2 so that the true nearest
    /// centroids in every direction are included.
    pub fn approx_nearest(&self, lon: f64, lat: f64, params: &KdTreeParams) -> Vec<u32> {
        let mut radius = params.nominal_resolution.min(params.max_distance);
        loop {
            if !self.within_radius(lon, lat, radius).is_empty() {
                let mut hits = self.within_radius(lon, lat, radius * SQRT_2);
                hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                let mut cells: Vec<u32> = Vec::with_capacity(params.k);
                for (_, cell) in hits {
                    // Antimeridian cells appear twice
                    if !cells.contains(&cell) {
                        cells.push(cell);
                        if cells.len() == params.k {
                            break;
                        }
                    }
                }
                return cells;
            }
            if radius >= params.max_distance {
                return Vec::new();
            }
            radius = (radius * params.expansion_factor).min(params.max_distance);
        }
    }

    fn within_recursive(
        &self,
        lo: usize,
        hi: usize,
        query: [f64; 2],
        radius_sq: f64,
        out: &mut Vec<(f64, u32)>,
    ) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let point = &self.points[mid];
        let dx = query[0] - point.coords[0];
        let dy = query[1] - point.coords[1];
        let dist_sq = dx * dx + dy * dy;
        if dist_sq <= radius_sq {
            out.push((dist_sq, point.cell));
        }

        let axis = self.axes[mid] as usize;
        let delta = query[axis] - point.coords[axis];
        if delta <= 0.0 || delta * delta <= radius_sq {
            self.within_recursive(lo, mid, query, radius_sq, out);
        }
        if delta >= 0.0 || delta * delta <= radius_sq {
            self.within_recursive(mid + 1, hi, query, radius_sq, out);
        }
    }
}

fn build_recursive(points: &mut [KdPoint], axes: &mut [u8]) {
    if points.is_empty() {
        return;
    }
    let axis = widest_axis(points);
    let mid = points.len() / 2;
    points.select_nth_unstable_by(mid, |a, b| a.coords[axis].total_cmp(&b.coords[axis]));
    axes[mid] = axis as u8;

    let (left, rest) = points.split_at_mut(mid);
    let (left_axes, rest_axes) = axes.split_at_mut(mid);
    build_recursive(left, left_axes);
    build_recursive(&mut rest[1..], &mut rest_axes[1..]);
}

fn widest_axis(points: &[KdPoint]) -> usize {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for p in points {
        for d in 0..2 {
            min[d] = min[d].min(p.coords[d]);
            max[d] = max[d].max(p.coords[d]);
        }
    }
    if max[1] - min[1] > max[0] - min[0] {
        1
    } else {
        0
    }
}

/// Spatial index over cell centroids.
#[derive(Debug)]
pub struct KdTreeIndex {
    grid: Arc<CurvilinearGrid>,
    tree: KdTree,
    params: KdTreeParams,
}

impl KdTreeIndex {
    /// Build the tree. Centroids of antimeridian cells are inserted a second
    /// time, shifted by ±360°.
    pub fn build(grid: Arc<CurvilinearGrid>, params: KdTreeParams) -> Result<Self> {
        params.validate().map_err(IndexBuildError::InvalidConfig)?;
        check_addressable(&grid)?;

        let ni = grid.ni();
        let mut entries = Vec::with_capacity(grid.len());
        for cell in grid.cells() {
            let id = (cell.j * ni + cell.i) as u32;
            let (lon, lat) = cell.centroid;
            entries.push((lon, lat, id));
            if let Some(shift) = cell.antimeridian_shift() {
                entries.push((lon + shift, lat, id));
            }
        }
        let tree = KdTree::build(entries);
        tracing::debug!(points = tree.len(), "Built kd-tree over cell centroids");

        Ok(Self { grid, tree, params })
    }

    /// Query parameters in effect.
    pub fn params(&self) -> &KdTreeParams {
        &self.params
    }

    /// Lowest-indexed containing cell among `(i, j)` and its eight
    /// surrounding cells, so that points on shared edges resolve the same
    /// way as in the other index variants.
    fn settle(&self, i: usize, j: usize, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let ni = self.grid.ni();
        let nj = self.grid.nj();
        let around = (j.saturating_sub(1)..=(j + 1).min(nj - 1)).flat_map(move |jj| {
            (i.saturating_sub(1)..=(i + 1).min(ni - 1)).map(move |ii| jj * ni + ii)
        });
        lowest_containing(&self.grid, around, lon, lat)
    }
}

impl SpatialIndex for KdTreeIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::KdTree
    }

    fn grid(&self) -> &Arc<CurvilinearGrid> {
        &self.grid
    }

    fn nearest_cell(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let lon = constrain_lon_180(lon);
        let candidates = self.tree.approx_nearest(lon, lat, &self.params);
        if let Some((i, j)) =
            lowest_containing(&self.grid, candidates.iter().map(|&c| c as usize), lon, lat)
        {
            return self.settle(i, j, lon, lat);
        }

        // Walk towards the point from the nearest centroid
        let ni = self.grid.ni();
        let first = *candidates.first()? as usize;
        let (mut i, mut j) = (first % ni, first / ni);
        let mut best = self.grid.cell(i, j).distance_sq(lon, lat);
        for _ in 0..self.params.max_iterations {
            let mut closer = None;
            for (ii, jj) in self.grid.edge_neighbours(i, j) {
                let neighbour = self.grid.cell(ii, jj);
                if neighbour.contains(lon, lat) {
                    return self.settle(ii, jj, lon, lat);
                }
                let dist = neighbour.distance_sq(lon, lat);
                if dist < best {
                    best = dist;
                    closer = Some((ii, jj));
                }
            }
            match closer {
                Some(next) => (i, j) = next,
                None => break,
            }
        }
        None
    }

    fn memory_bytes(&self) -> usize {
        self.tree.len() * (std::mem::size_of::<KdPoint>() + 1)
    }
}
