//! Synthetic grids and value fields.
//!
//! The generators create predictable geometries whose cells are easy to
//! reason about in assertions: evenly spaced, sheared, rotated, and
//! antimeridian-crossing curvilinear grids.

use grid_geometry::{GridCoordinates, LonLatRect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Build coordinates from a node function `f(i, j) -> (lon, lat)`, i fastest.
///
/// # Panics
///
/// Panics if the generated coordinates are invalid (test inputs only).
pub fn coords_from_fn(
    ni: usize,
    nj: usize,
    f: impl Fn(usize, usize) -> (f64, f64),
) -> GridCoordinates {
    let mut lon = Vec::with_capacity(ni * nj);
    let mut lat = Vec::with_capacity(ni * nj);
    for j in 0..nj {
        for i in 0..ni {
            let (x, y) = f(i, j);
            lon.push(x);
            lat.push(y);
        }
    }
    GridCoordinates::new(ni, nj, lon, lat).expect("generated grid must be valid")
}

/// Axis-aligned grid with node `(i, j)` at `(lon0 + i * dlon, lat0 + j * dlat)`.
///
/// # Example
///
/// ```
/// use test_utils::rectilinear_coords;
///
/// let coords = rectilinear_coords(4, 3, 10.0, 20.0, 1.0, 0.5);
/// assert_eq!(coords.node(3, 2), (13.0, 21.0));
/// ```
pub fn rectilinear_coords(
    ni: usize,
    nj: usize,
    lon0: f64,
    lat0: f64,
    dlon: f64,
    dlat: f64,
) -> GridCoordinates {
    coords_from_fn(ni, nj, |i, j| {
        (lon0 + i as f64 * dlon, lat0 + j as f64 * dlat)
    })
}

/// The small sheared 4×3 grid used by scenario tests.
///
/// Node `(i, j)` sits at `(10 + 2i + 0.3j, 40 + 1.5j + 0.2i)`, so no cell
/// is axis-aligned.
pub fn sheared_4x3() -> GridCoordinates {
    coords_from_fn(4, 3, |i, j| {
        (
            10.0 + 2.0 * i as f64 + 0.3 * j as f64,
            40.0 + 1.5 * j as f64 + 0.2 * i as f64,
        )
    })
}

/// Grid of `spacing`-degree cells rotated by `angle_deg` about `centre`.
pub fn rotated_coords(
    ni: usize,
    nj: usize,
    centre: (f64, f64),
    spacing: f64,
    angle_deg: f64,
) -> GridCoordinates {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let half_i = (ni as f64 - 1.0) / 2.0;
    let half_j = (nj as f64 - 1.0) / 2.0;
    coords_from_fn(ni, nj, |i, j| {
        let x = (i as f64 - half_i) * spacing;
        let y = (j as f64 - half_j) * spacing;
        (centre.0 + x * cos - y * sin, centre.1 + x * sin + y * cos)
    })
}

/// Grid straddling the antimeridian, `ni` columns of `spacing` degrees
/// centred on ±180 starting at latitude `lat0`.
pub fn antimeridian_coords(ni: usize, nj: usize, spacing: f64, lat0: f64) -> GridCoordinates {
    let lon0 = 180.0 - spacing * (ni as f64 - 1.0) / 2.0;
    rectilinear_coords(ni, nj, lon0, lat0, spacing, spacing)
}

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);
/// assert_eq!(grid[10], 1.0);
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Same pattern as [`create_test_grid`] as raw `f64` values.
pub fn create_test_values(ni: usize, nj: usize) -> Vec<f64> {
    create_test_grid(ni, nj).into_iter().map(f64::from).collect()
}

/// `n` reproducible uniformly distributed points inside `rect`.
pub fn random_points_in(rect: &LonLatRect, n: usize, seed: u64) -> Vec<(f64, f64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            (
                rng.gen_range(rect.min_lon..=rect.max_lon),
                rng.gen_range(rect.min_lat..=rect.max_lat),
            )
        })
        .collect()
}
