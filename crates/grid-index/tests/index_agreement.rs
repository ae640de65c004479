//! Integration tests: every index variant against brute-force polygon tests.

use std::sync::Arc;

use grid_geometry::{CurvilinearGrid, GridCoordinates};
use grid_index::{build_index, IndexConfig, IndexKind, KdTreeParams, SpatialIndex};
use test_utils::{
    antimeridian_coords, assert_lon_lat_approx_eq, random_points_in, rectilinear_coords,
    rotated_coords, sheared_4x3,
};

fn config_for(grid: &CurvilinearGrid, lut_resolution: f64) -> IndexConfig {
    IndexConfig {
        lut_resolution,
        max_lut_points: 10_000_000,
        kdtree: Some(KdTreeParams::from_grid(grid)),
    }
}

fn all_indexes(coords: GridCoordinates, lut_resolution: f64) -> Vec<Arc<dyn SpatialIndex>> {
    let grid = Arc::new(CurvilinearGrid::from_coordinates(coords));
    let config = config_for(&grid, lut_resolution);
    IndexKind::ALL
        .iter()
        .map(|&kind| build_index(kind, grid.clone(), &config).unwrap())
        .collect()
}

/// Cells whose polygon contains the point, by exhaustive search.
fn brute_force(grid: &CurvilinearGrid, lon: f64, lat: f64) -> Vec<(usize, usize)> {
    grid.cells()
        .filter(|cell| cell.contains(lon, lat))
        .map(|cell| (cell.i, cell.j))
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_centroid_of_cell_2_1_resolves_under_every_variant() {
    let indexes = all_indexes(sheared_4x3(), 0.01);
    let (lon, lat) = indexes[0].grid().midpoint(2, 1);
    for index in &indexes {
        assert_eq!(
            index.nearest_cell(lon, lat),
            Some((2, 1)),
            "{} disagrees",
            index.kind()
        );
    }
}

#[test]
fn test_points_outside_grid_resolve_to_none() {
    let indexes = all_indexes(sheared_4x3(), 0.01);
    for index in &indexes {
        for &(lon, lat) in &[(-25.0, -35.0), (0.0, 0.0), (12.0, 80.0), (170.0, 41.0)] {
            assert_eq!(index.nearest_cell(lon, lat), None, "{}", index.kind());
        }
    }
}

#[test]
fn test_antimeridian_cell_contains_both_sides() {
    // Node (2, j) sits on ±180 with 2° cells, so its corners are at +179 / -179
    let indexes = all_indexes(antimeridian_coords(5, 4, 2.0, -3.0), 0.05);
    let grid = indexes[0].grid();
    assert_lon_lat_approx_eq!(grid.coordinates().node(2, 2), (180.0, 1.0), 1e-9);
    // South-west corner, whichever side of the antimeridian it is stored on
    assert_lon_lat_approx_eq!(grid.cell(2, 2).corners[0], (179.0, 0.0), 1e-9);
    for index in &indexes {
        assert_eq!(index.nearest_cell(179.9, 0.5), Some((2, 2)), "{}", index.kind());
        assert_eq!(index.nearest_cell(-179.9, 0.5), Some((2, 2)), "{}", index.kind());
        assert_eq!(index.nearest_cell(-177.5, 0.5), Some((3, 2)), "{}", index.kind());
        assert_eq!(index.nearest_cell(177.5, -2.5), Some((1, 0)), "{}", index.kind());
    }
}

#[test]
fn test_boundary_points_pick_lowest_linear_index() {
    let indexes = all_indexes(rectilinear_coords(4, 3, 0.0, 0.0, 1.0, 1.0), 0.5);
    for index in &indexes {
        // Shared edge between (1, 1) and (2, 1)
        assert_eq!(index.nearest_cell(1.5, 1.0), Some((1, 1)), "{}", index.kind());
        // Shared corner of (1, 1), (2, 1), (1, 2), (2, 2)
        assert_eq!(index.nearest_cell(1.5, 1.5), Some((1, 1)), "{}", index.kind());
    }
}

// ============================================================================
// Agreement
// ============================================================================

#[test]
fn test_variants_agree_with_polygon_truth_on_interior_points() {
    let lut_resolution = 0.02;
    let indexes = all_indexes(rotated_coords(30, 20, (5.0, 45.0), 0.5, 25.0), lut_resolution);
    let grid = indexes[0].grid().clone();
    let points = random_points_in(&grid.bounding_box(), 3000, 42);

    let margin = 2.0 * lut_resolution;
    let mut checked = 0;
    for &(lon, lat) in &points {
        let truth = brute_force(&grid, lon, lat);
        if truth.len() != 1 {
            continue;
        }
        let cell = grid.cell(truth[0].0, truth[0].1);
        let well_inside = [(-margin, 0.0), (margin, 0.0), (0.0, -margin), (0.0, margin)]
            .iter()
            .all(|&(dx, dy)| cell.contains(lon + dx, lat + dy));
        if !well_inside {
            continue;
        }
        for index in &indexes {
            assert_eq!(
                index.nearest_cell(lon, lat),
                Some(truth[0]),
                "{} at ({lon}, {lat})",
                index.kind()
            );
        }
        checked += 1;
    }
    assert!(checked > 400, "only {checked} interior points sampled");
}

#[test]
fn test_exact_variants_never_return_non_containing_cell() {
    let indexes = all_indexes(rotated_coords(12, 9, (-60.0, -10.0), 1.0, -40.0), 0.05);
    let grid = indexes[0].grid().clone();
    let bbox = grid.bounding_box();
    let wider = grid_geometry::LonLatRect::new(
        bbox.min_lon - 2.0,
        bbox.min_lat - 2.0,
        bbox.max_lon + 2.0,
        bbox.max_lat + 2.0,
    );
    for &(lon, lat) in &random_points_in(&wider, 1000, 9) {
        let truth = brute_force(&grid, lon, lat);
        for index in indexes.iter().filter(|i| i.kind() != IndexKind::LookupTable) {
            match index.nearest_cell(lon, lat) {
                Some(found) => assert!(truth.contains(&found), "{}", index.kind()),
                None => {
                    if index.kind() != IndexKind::KdTree {
                        assert!(truth.is_empty(), "{} missed a cell", index.kind());
                    }
                }
            }
        }
    }
}
