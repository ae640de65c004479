//! Batched mapping from target points to source grid cells.
//!
//! Every resolved target point contributes one `u64` entry packing the
//! source cell index `j * ni + i` in the high 32 bits and the target index
//! in the low 32 bits. Sorting the packed values orders entries by source
//! cell, then by target, so all targets fed by one source sample are
//! adjacent and can be walked as a group in a single forward pass.

use std::time::Instant;

use rayon::prelude::*;

use crate::error::{ExtractError, Result};
use crate::source::SourceGrid;
use crate::strategy::DataReadingStrategy;
use crate::target::{AxisPair, TargetDomain};
use crate::types::ReadCost;

/// Largest index that fits in half of a packed entry.
const MAX_PACKED_INDEX: usize = u32::MAX as usize;

#[inline]
fn pack(source_index: usize, target: usize) -> u64 {
    ((source_index as u64) << 32) | target as u64
}

#[inline]
fn source_of(entry: u64) -> usize {
    (entry >> 32) as usize
}

#[inline]
fn target_of(entry: u64) -> usize {
    (entry & 0xFFFF_FFFF) as usize
}

/// Sorted, deduplicated (source cell, target point) pairs plus the size
/// metrics that characterise each read strategy's cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMap {
    source_ni: usize,
    source_nj: usize,
    target_len: usize,
    entries: Vec<u64>,
    min_i: usize,
    max_i: usize,
    min_j: usize,
    max_j: usize,
    unique_ij_pairs: usize,
    rows_touched: usize,
    sum_row_lengths: usize,
}

impl PixelMap {
    /// Resolve every target point against the source grid.
    ///
    /// Target points with no containing source cell are skipped. When both
    /// source and target have separable lon/lat axes (regular or
    /// rectilinear) the two axes are resolved independently instead of
    /// point by point.
    pub fn new(source: &SourceGrid, targets: &dyn TargetDomain) -> Result<Self> {
        let start = Instant::now();
        let (ni, nj) = (source.ni(), source.nj());
        check_packable(ni, nj, targets.len())?;

        let map = match (source.axes(), targets.axes()) {
            (Some(source_axes), Some(target_axes)) => {
                Self::from_axes(source_axes, target_axes, targets.len())
            }
            _ => {
                let resolved: Vec<Option<(usize, usize)>> = (0..targets.len())
                    .into_par_iter()
                    .map(|t| {
                        let (lon, lat) = targets.lon_lat(t)?;
                        source.find_cell(lon, lat)
                    })
                    .collect();

                let mut builder = Builder::new(ni, nj, targets.len());
                for (t, cell) in resolved.into_iter().enumerate() {
                    if let Some((i, j)) = cell {
                        builder.put(i, j, t);
                    }
                }
                builder.finish()
            }
        };

        tracing::debug!(
            targets = map.target_len,
            resolved = map.resolved_targets(),
            unique_ij_pairs = map.unique_ij_pairs,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pixel map created"
        );
        Ok(map)
    }

    /// Separable source and target axes: nearest index per axis, then the
    /// Cartesian product.
    fn from_axes(
        (source_x, source_y): AxisPair<'_>,
        (target_x, target_y): AxisPair<'_>,
        target_len: usize,
    ) -> Self {
        let xs: Vec<Option<usize>> = (0..target_x.len())
            .map(|ti| source_x.nearest_index(target_x.value(ti)))
            .collect();
        let ys: Vec<Option<usize>> = (0..target_y.len())
            .map(|tj| {
                let lat = target_y.value(tj);
                if (-90.0..=90.0).contains(&lat) {
                    source_y.nearest_index(lat)
                } else {
                    None
                }
            })
            .collect();

        let target_ni = target_x.len();
        let mut builder = Builder::new(source_x.len(), source_y.len(), target_len);
        for (tj, j) in ys.iter().enumerate() {
            let Some(j) = *j else { continue };
            for (ti, i) in xs.iter().enumerate() {
                if let Some(i) = *i {
                    builder.put(i, j, tj * target_ni + ti);
                }
            }
        }
        builder.finish()
    }

    /// Source grid extents `(ni, nj)`.
    pub fn source_shape(&self) -> (usize, usize) {
        (self.source_ni, self.source_nj)
    }

    /// Number of target points the map was built for; the output size.
    pub fn target_len(&self) -> usize {
        self.target_len
    }

    /// Number of (source cell, target) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True iff no target point resolved to any source cell.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Target points that resolved to a source cell.
    pub fn resolved_targets(&self) -> usize {
        self.entries.len()
    }

    /// Target points that resolved to nothing.
    pub fn unresolved_targets(&self) -> usize {
        self.target_len - self.entries.len()
    }

    /// Smallest i touched, `None` when empty.
    pub fn min_i(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.min_i)
    }

    pub fn max_i(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.max_i)
    }

    pub fn min_j(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.min_j)
    }

    pub fn max_j(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.max_j)
    }

    /// Number of distinct source cells touched.
    pub fn unique_ij_pairs(&self) -> usize {
        self.unique_ij_pairs
    }

    /// Number of distinct source rows (j) touched.
    pub fn rows_touched(&self) -> usize {
        self.rows_touched
    }

    /// Sum over touched rows of `max_i_in_row - min_i_in_row + 1`.
    pub fn sum_row_lengths(&self) -> usize {
        self.sum_row_lengths
    }

    /// Cells in the `[min_i, max_i] × [min_j, max_j]` rectangle, 0 when empty.
    pub fn bounding_box_size(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max_i - self.min_i + 1) * (self.max_j - self.min_j + 1)
        }
    }

    /// Reads and values fetched by `strategy`, without running it.
    pub fn estimate_cost(&self, strategy: DataReadingStrategy) -> ReadCost {
        if self.is_empty() {
            return ReadCost::default();
        }
        match strategy {
            DataReadingStrategy::PixelByPixel => ReadCost {
                read_calls: self.unique_ij_pairs,
                values_read: self.unique_ij_pairs,
            },
            DataReadingStrategy::Scanline => ReadCost {
                read_calls: self.rows_touched,
                values_read: self.sum_row_lengths,
            },
            DataReadingStrategy::BoundingBox => ReadCost {
                read_calls: 1,
                values_read: self.bounding_box_size(),
            },
        }
    }

    /// Entries grouped by source cell, in ascending source index order.
    pub fn groups(&self) -> PixelGroups<'_> {
        PixelGroups {
            entries: &self.entries,
            source_ni: self.source_ni,
        }
    }

    /// All `(source_index, target)` pairs in sorted order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.iter().map(|&e| (source_of(e), target_of(e)))
    }
}

fn check_packable(ni: usize, nj: usize, targets: usize) -> Result<()> {
    let cells = ni.saturating_mul(nj);
    if cells > MAX_PACKED_INDEX + 1 {
        return Err(ExtractError::too_large(format!(
            "source grid of {ni}x{nj} cells exceeds 32-bit cell indices"
        )));
    }
    if targets > MAX_PACKED_INDEX + 1 {
        return Err(ExtractError::too_large(format!(
            "{targets} target points exceed 32-bit target indices"
        )));
    }
    Ok(())
}

/// Accumulates entries and the running bounding box.
struct Builder {
    source_ni: usize,
    source_nj: usize,
    target_len: usize,
    entries: Vec<u64>,
    min_i: usize,
    max_i: usize,
    min_j: usize,
    max_j: usize,
}

impl Builder {
    fn new(source_ni: usize, source_nj: usize, target_len: usize) -> Self {
        Self {
            source_ni,
            source_nj,
            target_len,
            entries: Vec::new(),
            min_i: usize::MAX,
            max_i: 0,
            min_j: usize::MAX,
            max_j: 0,
        }
    }

    fn put(&mut self, i: usize, j: usize, target: usize) {
        self.entries.push(pack(j * self.source_ni + i, target));
        self.min_i = self.min_i.min(i);
        self.max_i = self.max_i.max(i);
        self.min_j = self.min_j.min(j);
        self.max_j = self.max_j.max(j);
    }

    fn finish(mut self) -> PixelMap {
        self.entries.sort_unstable();
        self.entries.dedup();

        let mut map = PixelMap {
            source_ni: self.source_ni,
            source_nj: self.source_nj,
            target_len: self.target_len,
            entries: self.entries,
            min_i: self.min_i,
            max_i: self.max_i,
            min_j: self.min_j,
            max_j: self.max_j,
            unique_ij_pairs: 0,
            rows_touched: 0,
            sum_row_lengths: 0,
        };
        if map.entries.is_empty() {
            map.min_i = 0;
            map.min_j = 0;
            return map;
        }

        // Groups arrive sorted by j, then i, so each row is a contiguous run
        let mut current_row: Option<(usize, usize, usize)> = None; // (j, first_i, last_i)
        let mut unique = 0;
        let mut rows = 0;
        let mut sum_rows = 0;
        for group in map.groups() {
            unique += 1;
            current_row = match current_row {
                Some((j, first, _)) if j == group.j => Some((j, first, group.i)),
                Some((_, first, last)) => {
                    rows += 1;
                    sum_rows += last - first + 1;
                    Some((group.j, group.i, group.i))
                }
                None => Some((group.j, group.i, group.i)),
            };
        }
        if let Some((_, first, last)) = current_row {
            rows += 1;
            sum_rows += last - first + 1;
        }
        map.unique_ij_pairs = unique;
        map.rows_touched = rows;
        map.sum_row_lengths = sum_rows;
        map
    }
}

/// One source cell and the target points it supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelGroup<'a> {
    pub i: usize,
    pub j: usize,
    pub source_index: usize,
    entries: &'a [u64],
}

impl<'a> PixelGroup<'a> {
    /// Target point indices, ascending. Never empty.
    pub fn targets(&self) -> impl Iterator<Item = usize> + 'a {
        self.entries.iter().map(|&e| target_of(e))
    }

    /// Number of target points supplied by this cell.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; groups are only produced for touched cells.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Forward-only iterator merging consecutive entries of one source cell.
#[derive(Debug, Clone)]
pub struct PixelGroups<'a> {
    entries: &'a [u64],
    source_ni: usize,
}

impl<'a> Iterator for PixelGroups<'a> {
    type Item = PixelGroup<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = *self.entries.first()?;
        let source_index = source_of(first);
        let len = self
            .entries
            .iter()
            .take_while(|&&e| source_of(e) == source_index)
            .count();
        let (group, rest) = self.entries.split_at(len);
        self.entries = rest;
        Some(PixelGroup {
            i: source_index % self.source_ni,
            j: source_index / self.source_ni,
            source_index,
            entries: group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::PointList;
    use grid_geometry::{LonLatRect, RectilinearGrid, ReferenceableAxis, RegularAxis, RegularGrid};

    fn regular_source() -> SourceGrid {
        // 10 x 5 cells of 1°, centres at 0.5 .. 9.5, 0.5 .. 4.5
        SourceGrid::Regular(
            RegularGrid::new(
                RegularAxis::new(0.5, 1.0, 10, true).unwrap(),
                RegularAxis::new(0.5, 1.0, 5, false).unwrap(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_pack_roundtrip_extremes() {
        let e = pack(MAX_PACKED_INDEX, 7);
        assert_eq!(source_of(e), MAX_PACKED_INDEX);
        assert_eq!(target_of(e), 7);
    }

    #[test]
    fn test_single_point() {
        let targets = PointList::new(vec![(3.2, 1.7)]);
        let map = PixelMap::new(&regular_source(), &targets).unwrap();
        assert!(!map.is_empty());
        assert_eq!(map.unique_ij_pairs(), 1);
        assert_eq!(map.len(), 1);
        let group = map.groups().next().unwrap();
        assert_eq!((group.i, group.j), (3, 1));
        assert_eq!(group.targets().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_groups_merge_and_sort() {
        // Targets 0 and 3 share a cell; 1 is in a lower row; 2 is outside
        let targets = PointList::new(vec![(5.1, 3.1), (8.9, 0.2), (50.0, 50.0), (5.4, 3.4)]);
        let map = PixelMap::new(&regular_source(), &targets).unwrap();

        let groups: Vec<_> = map
            .groups()
            .map(|g| (g.i, g.j, g.targets().collect::<Vec<_>>()))
            .collect();
        assert_eq!(groups, vec![(8, 0, vec![1]), (5, 3, vec![0, 3])]);

        assert_eq!(map.resolved_targets(), 3);
        assert_eq!(map.unresolved_targets(), 1);
        assert_eq!((map.min_i(), map.max_i()), (Some(5), Some(8)));
        assert_eq!((map.min_j(), map.max_j()), (Some(0), Some(3)));
        assert_eq!(map.rows_touched(), 2);
        assert_eq!(map.sum_row_lengths(), 2);
        assert_eq!(map.bounding_box_size(), 16);
    }

    #[test]
    fn test_row_lengths_span_gaps() {
        let targets = PointList::new(vec![(1.5, 2.5), (6.5, 2.5), (3.5, 2.5)]);
        let map = PixelMap::new(&regular_source(), &targets).unwrap();
        assert_eq!(map.unique_ij_pairs(), 3);
        assert_eq!(map.rows_touched(), 1);
        assert_eq!(map.sum_row_lengths(), 6);
        assert_eq!(map.bounding_box_size(), 6);
    }

    #[test]
    fn test_empty_map() {
        let targets = PointList::new(vec![(-50.0, -50.0), (100.0, 80.0)]);
        let map = PixelMap::new(&regular_source(), &targets).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.target_len(), 2);
        assert_eq!(map.min_i(), None);
        assert_eq!(map.bounding_box_size(), 0);
        assert_eq!(map.groups().count(), 0);
        assert_eq!(
            map.estimate_cost(DataReadingStrategy::BoundingBox),
            ReadCost::default()
        );
    }

    #[test]
    fn test_regular_fast_path_matches_point_by_point() {
        let source = regular_source();
        let target = RegularGrid::from_bbox(&LonLatRect::new(-1.0, -1.0, 11.0, 6.0), 48, 28).unwrap();
        let fast = PixelMap::new(&source, &target).unwrap();

        let points: PointList = (0..target.len()).map(|t| target.lon_lat(t)).collect();
        let slow = PixelMap::new(&source, &points).unwrap();

        assert_eq!(fast, slow);
        assert!(!fast.is_empty());
        assert!(fast.unresolved_targets() > 0);
    }

    #[test]
    fn test_regular_fast_path_skips_invalid_latitudes() {
        let source = SourceGrid::Regular(
            RegularGrid::new(
                RegularAxis::new(-179.5, 1.0, 360, true).unwrap(),
                RegularAxis::new(-89.5, 1.0, 180, false).unwrap(),
            )
            .unwrap(),
        );
        let target = RegularGrid::from_bbox(&LonLatRect::new(0.0, 80.0, 10.0, 100.0), 10, 20).unwrap();
        let map = PixelMap::new(&source, &target).unwrap();
        // Rows north of 90° resolve to nothing
        assert_eq!(map.resolved_targets(), 100);
    }

    fn irregular_source() -> SourceGrid {
        SourceGrid::Rectilinear(
            RectilinearGrid::new(
                ReferenceableAxis::new(vec![0.0, 0.5, 1.5, 3.0, 5.0, 8.0], true).unwrap(),
                ReferenceableAxis::new(vec![10.0, 7.0, 5.0, 4.0, 3.5], false).unwrap(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_irregular_axes_fast_path_matches_point_by_point() {
        let source = irregular_source();
        let target = RegularGrid::from_bbox(&LonLatRect::new(-2.0, 2.0, 10.0, 12.0), 60, 50).unwrap();
        let fast = PixelMap::new(&source, &target).unwrap();

        let points: PointList = (0..target.len()).map(|t| target.lon_lat(t)).collect();
        let slow = PixelMap::new(&source, &points).unwrap();

        assert_eq!(fast, slow);
        assert_eq!((fast.min_i(), fast.max_i()), (Some(0), Some(5)));
        assert_eq!((fast.min_j(), fast.max_j()), (Some(0), Some(4)));
        assert!(fast.unresolved_targets() > 0);
    }

    #[test]
    fn test_irregular_target_axes() {
        let target = RectilinearGrid::new(
            ReferenceableAxis::new(vec![0.2, 1.4, 4.1, 7.9, 20.0], true).unwrap(),
            ReferenceableAxis::new(vec![9.0, 4.2], false).unwrap(),
        )
        .unwrap();
        let map = PixelMap::new(&irregular_source(), &target).unwrap();

        let cells: Vec<_> = map.pairs().collect();
        let points: PointList = (0..target.len()).map(|t| target.lon_lat(t)).collect();
        assert_eq!(map, PixelMap::new(&irregular_source(), &points).unwrap());
        // lon 20 falls off the source axis in both rows
        assert_eq!(map.resolved_targets(), 8);
        assert_eq!(map.unique_ij_pairs(), 8);
        // Source cells are linear j * 6 + i
        assert!(cells.contains(&(5, 3)));
        assert!(cells.contains(&(3 * 6 + 2, 6)));
    }

    #[test]
    fn test_cost_ordering() {
        let targets = PointList::new(vec![(0.1, 0.1), (9.9, 4.9), (4.5, 2.5), (2.5, 0.5)]);
        let map = PixelMap::new(&regular_source(), &targets).unwrap();
        let px = map.estimate_cost(DataReadingStrategy::PixelByPixel);
        let scan = map.estimate_cost(DataReadingStrategy::Scanline);
        let bbox = map.estimate_cost(DataReadingStrategy::BoundingBox);
        assert!(bbox.values_read >= scan.values_read);
        assert!(scan.values_read >= px.values_read);
        assert!(px.read_calls >= scan.read_calls);
        assert!(scan.read_calls >= bbox.read_calls);
        assert_eq!(bbox.values_read, 50);
    }
}
