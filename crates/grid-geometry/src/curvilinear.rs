//! Curvilinear grid geometry.
//!
//! Each node owns the quadrilateral bounded by the midpoints to its
//! neighbours. Corners are computed once, eagerly, from a node array padded
//! by linear extrapolation so that edge nodes get a full cell too and the
//! cells tile the grid without gaps.

use std::hash::{Hash, Hasher};
use std::time::Instant;

use crate::coords::GridCoordinates;
use crate::error::Result;
use crate::longitude::{constrain_lon_180, harmonize_longitudes};
use crate::rect::LonLatRect;

/// Tolerance for treating a point as lying on a cell edge.
pub const EDGE_EPSILON: f64 = 1e-12;

/// A grid whose cells are arbitrary quadrilaterals in lon/lat space.
#[derive(Debug, Clone)]
pub struct CurvilinearGrid {
    coords: GridCoordinates,
    /// `(ni + 1) * (nj + 1)` corner longitudes, not wrapped.
    corner_lon: Vec<f64>,
    corner_lat: Vec<f64>,
    bbox: LonLatRect,
}

impl CurvilinearGrid {
    /// Validate raw arrays and build the geometry.
    pub fn new(ni: usize, nj: usize, lon: Vec<f64>, lat: Vec<f64>) -> Result<Self> {
        Ok(Self::from_coordinates(GridCoordinates::new(ni, nj, lon, lat)?))
    }

    /// Build the geometry from already validated coordinates.
    pub fn from_coordinates(coords: GridCoordinates) -> Self {
        let start = Instant::now();
        let (corner_lon, corner_lat) = make_corners(&coords);

        let mut grid = Self {
            coords,
            corner_lon,
            corner_lat,
            bbox: LonLatRect::new(0.0, 0.0, 0.0, 0.0),
        };
        // Cell rectangles are moved into one continuous longitude frame
        // around the first node so an antimeridian grid stays compact.
        let reference = grid.midpoint(0, 0).0;
        let first = grid.cell(0, 0).rect;
        grid.bbox = grid.cells().fold(first, |acc, cell| {
            let centre = (cell.rect.min_lon + cell.rect.max_lon) / 2.0;
            let shift = harmonize_longitudes(reference, centre) - centre;
            acc.union(&cell.rect.translate_lon(shift))
        });

        tracing::debug!(
            ni = grid.ni(),
            nj = grid.nj(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Computed curvilinear cell corners"
        );
        grid
    }

    /// The node coordinates this geometry was built from.
    pub fn coordinates(&self) -> &GridCoordinates {
        &self.coords
    }

    pub fn ni(&self) -> usize {
        self.coords.ni()
    }

    pub fn nj(&self) -> usize {
        self.coords.nj()
    }

    /// Number of cells (equal to the number of nodes).
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Always false, see [`GridCoordinates::is_empty`].
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The node at `(i, j)`, which is also the centroid of its cell.
    pub fn midpoint(&self, i: usize, j: usize) -> (f64, f64) {
        self.coords.node(i, j)
    }

    /// Bounding rectangle of all cells in a continuous longitude frame.
    /// May extend past ±180 when the grid touches the antimeridian.
    pub fn bounding_box(&self) -> LonLatRect {
        self.bbox
    }

    /// The cell owned by node `(i, j)`.
    ///
    /// # Panics
    /// Panics if `(i, j)` is outside the grid.
    pub fn cell(&self, i: usize, j: usize) -> Cell {
        assert!(i < self.ni() && j < self.nj(), "cell ({i}, {j}) outside grid");
        let centroid = self.coords.node(i, j);
        let stride = self.ni() + 1;
        let corner = |ci: usize, cj: usize| {
            let index = cj * stride + ci;
            (
                harmonize_longitudes(centroid.0, self.corner_lon[index]),
                self.corner_lat[index],
            )
        };
        Cell::new(
            i,
            j,
            [corner(i, j), corner(i + 1, j), corner(i + 1, j + 1), corner(i, j + 1)],
            centroid,
        )
    }

    /// All cells, i fastest. One pass over the grid.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let ni = self.ni();
        (0..self.len()).map(move |index| self.cell(index % ni, index / ni))
    }

    /// The up to four cells sharing an edge with `(i, j)`.
    pub fn edge_neighbours(&self, i: usize, j: usize) -> impl Iterator<Item = (usize, usize)> {
        let (ni, nj) = (self.ni(), self.nj());
        [
            (i > 0).then(|| (i - 1, j)),
            (i + 1 < ni).then(|| (i + 1, j)),
            (j > 0).then(|| (i, j - 1)),
            (j + 1 < nj).then(|| (i, j + 1)),
        ]
        .into_iter()
        .flatten()
    }

    /// Mean of `sqrt(area)` over all cells, in degrees.
    pub fn mean_cell_size(&self) -> f64 {
        let total: f64 = self.cells().map(|cell| cell.area().sqrt()).sum();
        total / self.len() as f64
    }
}

impl PartialEq for CurvilinearGrid {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
    }
}

impl Eq for CurvilinearGrid {}

impl Hash for CurvilinearGrid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coords.hash(state);
    }
}

/// Corner arrays of size `(ni + 1) * (nj + 1)`.
fn make_corners(coords: &GridCoordinates) -> (Vec<f64>, Vec<f64>) {
    let (ni, nj) = (coords.ni(), coords.nj());
    let (pni, pnj) = (ni + 2, nj + 2);
    let mut plon = vec![0.0; pni * pnj];
    let mut plat = vec![0.0; pni * pnj];
    let p = |pi: usize, pj: usize| pj * pni + pi;

    for j in 0..nj {
        for i in 0..ni {
            let (lon, lat) = coords.node(i, j);
            plon[p(i + 1, j + 1)] = lon;
            plat[p(i + 1, j + 1)] = lat;
        }
    }

    // Extrapolate along i for the real rows, then along j for every column
    // (including the two padded ones) to fill the padded corners.
    for pj in 1..=nj {
        for (edge, inner, target) in [(1, 2, 0), (ni, ni - 1, ni + 1)] {
            let (lon, lat) = extrapolate(
                (plon[p(edge, pj)], plat[p(edge, pj)]),
                (plon[p(inner, pj)], plat[p(inner, pj)]),
            );
            plon[p(target, pj)] = lon;
            plat[p(target, pj)] = lat;
        }
    }
    for pi in 0..pni {
        for (edge, inner, target) in [(1, 2, 0), (nj, nj - 1, nj + 1)] {
            let (lon, lat) = extrapolate(
                (plon[p(pi, edge)], plat[p(pi, edge)]),
                (plon[p(pi, inner)], plat[p(pi, inner)]),
            );
            plon[p(pi, target)] = lon;
            plat[p(pi, target)] = lat;
        }
    }

    let mut corner_lon = Vec::with_capacity((ni + 1) * (nj + 1));
    let mut corner_lat = Vec::with_capacity((ni + 1) * (nj + 1));
    for cj in 0..=nj {
        for ci in 0..=ni {
            let ids = [p(ci, cj), p(ci + 1, cj), p(ci, cj + 1), p(ci + 1, cj + 1)];
            let reference = plon[ids[0]];
            let lon_sum: f64 = ids
                .iter()
                .map(|&k| harmonize_longitudes(reference, plon[k]))
                .sum();
            let lat_sum: f64 = ids.iter().map(|&k| plat[k]).sum();
            corner_lon.push(lon_sum / 4.0);
            corner_lat.push(lat_sum / 4.0);
        }
    }
    (corner_lon, corner_lat)
}

/// `2 * edge - inner`, with the inner longitude harmonized to the edge.
fn extrapolate(edge: (f64, f64), inner: (f64, f64)) -> (f64, f64) {
    let inner_lon = harmonize_longitudes(edge.0, inner.0);
    (2.0 * edge.0 - inner_lon, 2.0 * edge.1 - inner.1)
}

/// One quadrilateral grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub i: usize,
    pub j: usize,
    /// Corners in order around the cell, longitudes harmonized to the
    /// centroid so the polygon is contiguous.
    pub corners: [(f64, f64); 4],
    pub centroid: (f64, f64),
    pub rect: LonLatRect,
    crosses_antimeridian: bool,
}

impl Cell {
    fn new(i: usize, j: usize, corners: [(f64, f64); 4], centroid: (f64, f64)) -> Self {
        let mut rect = LonLatRect::new(centroid.0, centroid.1, centroid.0, centroid.1);
        let mut native_min = f64::INFINITY;
        let mut native_max = f64::NEG_INFINITY;
        for &(lon, lat) in &corners {
            rect.include(lon, lat);
            let native = constrain_lon_180(lon);
            native_min = native_min.min(native);
            native_max = native_max.max(native);
        }
        Self {
            i,
            j,
            corners,
            centroid,
            rect,
            crosses_antimeridian: native_max - native_min > 180.0,
        }
    }

    /// True when the cell's wrapped corner longitudes span more than 180°,
    /// i.e. the cell straddles ±180.
    pub fn crosses_antimeridian(&self) -> bool {
        self.crosses_antimeridian
    }

    /// Longitude offset of the duplicate representation needed by spatial
    /// indexes for antimeridian cells, `None` for ordinary cells.
    pub fn antimeridian_shift(&self) -> Option<f64> {
        if !self.crosses_antimeridian {
            return None;
        }
        let centre = (self.rect.min_lon + self.rect.max_lon) / 2.0;
        Some(if centre > 0.0 { -360.0 } else { 360.0 })
    }

    /// Point-in-polygon test, inclusive of edges.
    ///
    /// The query longitude is first moved by ±360 to the representation
    /// nearest the centroid, which covers the shifted duplicate of
    /// antimeridian cells.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if !lon.is_finite() || !lat.is_finite() {
            return false;
        }
        let lon = harmonize_longitudes(self.centroid.0, constrain_lon_180(lon));
        self.rect.contains(lon, lat) && point_in_polygon(&self.corners, lon, lat)
    }

    /// Squared planar distance in degrees from the centroid, longitudes
    /// harmonized.
    pub fn distance_sq(&self, lon: f64, lat: f64) -> f64 {
        let dlon = harmonize_longitudes(self.centroid.0, lon) - self.centroid.0;
        let dlat = lat - self.centroid.1;
        dlon * dlon + dlat * dlat
    }

    /// Planar area in square degrees.
    pub fn area(&self) -> f64 {
        let mut twice = 0.0;
        for k in 0..4 {
            let (x0, y0) = self.corners[k];
            let (x1, y1) = self.corners[(k + 1) % 4];
            twice += x0 * y1 - x1 * y0;
        }
        twice.abs() / 2.0
    }
}

/// Ray casting with an explicit on-edge check.
pub fn point_in_polygon(vertices: &[(f64, f64)], x: f64, y: f64) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut k = n - 1;
    for m in 0..n {
        let (xm, ym) = vertices[m];
        let (xk, yk) = vertices[k];
        if on_segment((xk, yk), (xm, ym), x, y) {
            return true;
        }
        if (ym > y) != (yk > y) {
            let x_cross = (xk - xm) * (y - ym) / (yk - ym) + xm;
            if x < x_cross {
                inside = !inside;
            }
        }
        k = m;
    }
    inside
}

fn on_segment(a: (f64, f64), b: (f64, f64), x: f64, y: f64) -> bool {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let cross = dx * (y - a.1) - dy * (x - a.0);
    let scale = dx.abs().max(dy.abs()).max(1.0);
    if cross.abs() > EDGE_EPSILON * scale {
        return false;
    }
    x >= a.0.min(b.0) - EDGE_EPSILON
        && x <= a.0.max(b.0) + EDGE_EPSILON
        && y >= a.1.min(b.1) - EDGE_EPSILON
        && y <= a.1.max(b.1) + EDGE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeometryError;

    /// Unit-spaced grid with node (i, j) at (lon0 + i, lat0 + j).
    fn unit_grid(ni: usize, nj: usize, lon0: f64, lat0: f64) -> CurvilinearGrid {
        let mut lon = Vec::new();
        let mut lat = Vec::new();
        for j in 0..nj {
            for i in 0..ni {
                lon.push(lon0 + i as f64);
                lat.push(lat0 + j as f64);
            }
        }
        CurvilinearGrid::new(ni, nj, lon, lat).unwrap()
    }

    #[test]
    fn test_interior_corners_are_midpoints() {
        let grid = unit_grid(4, 3, 10.0, 20.0);
        let cell = grid.cell(2, 1);
        assert_eq!(cell.centroid, (12.0, 21.0));
        assert_eq!(
            cell.corners,
            [(11.5, 20.5), (12.5, 20.5), (12.5, 21.5), (11.5, 21.5)]
        );
        assert!((cell.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_edge_cells_extend_half_a_step() {
        let grid = unit_grid(4, 3, 10.0, 20.0);
        let corner = grid.cell(0, 0);
        assert_eq!(corner.corners[0], (9.5, 19.5));
        let far = grid.cell(3, 2);
        assert_eq!(far.corners[2], (13.5, 22.5));
        assert_eq!(grid.bounding_box(), LonLatRect::new(9.5, 19.5, 13.5, 22.5));
    }

    #[test]
    fn test_cells_tile_without_gaps() {
        let grid = unit_grid(5, 4, 0.0, 0.0);
        let mut n = 0;
        for step in 0..200 {
            let lon = -0.45 + 4.9 * (step as f64 / 199.0);
            let lat = -0.45 + 3.9 * ((step * 37 % 200) as f64 / 199.0);
            let hits = grid.cells().filter(|c| c.contains(lon, lat)).count();
            assert!(hits >= 1, "no cell contains ({lon}, {lat})");
            n += 1;
        }
        assert_eq!(n, 200);
    }

    #[test]
    fn test_rect_contains_centroid() {
        let grid = unit_grid(3, 3, -1.0, -1.0);
        for cell in grid.cells() {
            assert!(cell.rect.contains(cell.centroid.0, cell.centroid.1));
            assert!(cell.contains(cell.centroid.0, cell.centroid.1));
        }
    }

    #[test]
    fn test_edge_points_are_inside() {
        let grid = unit_grid(4, 3, 0.0, 0.0);
        // Shared edge between (1, 1) and (2, 1)
        assert!(grid.cell(1, 1).contains(1.5, 1.0));
        assert!(grid.cell(2, 1).contains(1.5, 1.0));
        assert!(!grid.cell(3, 1).contains(1.5, 1.0));
    }

    #[test]
    fn test_antimeridian_cell() {
        // Node (1, 0) sits on the antimeridian; its corners are at +179 and -179
        let lon = vec![178.0, 180.0, -178.0, 178.0, 180.0, -178.0];
        let lat = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let grid = CurvilinearGrid::new(3, 2, lon, lat).unwrap();
        let cell = grid.cell(1, 0);
        assert!(cell.crosses_antimeridian());
        assert!(cell.contains(179.9, 0.0));
        assert!(cell.contains(-179.9, 0.0));
        assert_eq!(cell.antimeridian_shift(), Some(360.0));

        let west = grid.cell(0, 0);
        assert!(!west.crosses_antimeridian());
        assert!(west.contains(178.2, 0.0));
        assert_eq!(west.antimeridian_shift(), None);
        assert!(!west.contains(-179.9, 0.0));

        let bbox = grid.bounding_box();
        assert_eq!((bbox.min_lon, bbox.max_lon), (177.0, 183.0));
    }

    #[test]
    fn test_edge_neighbours() {
        let grid = unit_grid(3, 3, 0.0, 0.0);
        let corner: Vec<_> = grid.edge_neighbours(0, 0).collect();
        assert_eq!(corner, vec![(1, 0), (0, 1)]);
        assert_eq!(grid.edge_neighbours(1, 1).count(), 4);
    }

    #[test]
    fn test_mean_cell_size() {
        let grid = unit_grid(4, 4, 0.0, 0.0);
        assert!((grid.mean_cell_size() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_input_fails_fast() {
        let err = CurvilinearGrid::new(3, 1, vec![0.0; 3], vec![0.0; 3]).unwrap_err();
        assert_eq!(err, GeometryError::Degenerate { ni: 3, nj: 1 });
    }

    #[test]
    fn test_point_in_polygon_rotated() {
        let diamond = [(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)];
        assert!(point_in_polygon(&diamond, 0.0, 0.0));
        assert!(point_in_polygon(&diamond, 0.5, 0.5));
        assert!(!point_in_polygon(&diamond, 0.8, 0.8));
    }
}
