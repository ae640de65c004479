//! Integration tests for the shared index cache.

use std::sync::Arc;
use std::thread;

use grid_index::{IndexBuildError, IndexCache, IndexConfig, IndexKind, KdTreeParams};
use test_utils::{rectilinear_coords, rotated_coords};

#[test]
fn test_concurrent_requests_build_once() {
    let cache = IndexCache::new(IndexConfig::default());
    let grid = cache.load_grid(rotated_coords(200, 150, (0.0, 0.0), 0.1, 10.0));

    let indexes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| cache.get_or_build(&grid, IndexKind::PriorityRTree).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for index in &indexes[1..] {
        assert!(Arc::ptr_eq(&indexes[0], index));
    }
    let stats = cache.stats();
    assert_eq!(stats.builds, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 7);
}

#[test]
fn test_concurrent_load_grid_interns_once() {
    let cache = IndexCache::default();
    let grids: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| cache.load_grid(rectilinear_coords(50, 40, 0.0, 0.0, 0.5, 0.5))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for grid in &grids[1..] {
        assert!(Arc::ptr_eq(&grids[0], grid));
    }
    assert_eq!(cache.stats().grids, 1);
}

#[test]
fn test_failed_build_does_not_poison_cache() {
    let config = IndexConfig {
        lut_resolution: 0.001,
        max_lut_points: 1000,
        kdtree: None,
    };
    let cache = IndexCache::new(config);
    let grid = cache.load_grid(rectilinear_coords(10, 10, 0.0, 0.0, 1.0, 1.0));

    for attempt in 1..=2 {
        let err = cache.get_or_build(&grid, IndexKind::LookupTable).unwrap_err();
        assert!(matches!(err, IndexBuildError::TooLarge { limit: 1000, .. }));
        assert_eq!(cache.stats().failed_builds, attempt);
    }
    assert!(cache.is_empty());

    // Other variants of the same grid are unaffected
    let index = cache.get_or_build(&grid, IndexKind::DynamicRTree).unwrap();
    assert_eq!(index.nearest_cell(4.2, 7.9), Some((4, 8)));
}

#[test]
fn test_concurrent_failed_builds_retry_on_one_gate() {
    let config = IndexConfig {
        lut_resolution: 0.001,
        max_lut_points: 1000,
        kdtree: None,
    };
    let cache = IndexCache::new(config);
    let grid = cache.load_grid(rectilinear_coords(10, 10, 0.0, 0.0, 1.0, 1.0));

    let failures = thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|_| scope.spawn(|| cache.get_or_build(&grid, IndexKind::LookupTable).is_err()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&failed| failed)
            .count()
    });
    assert_eq!(failures, 6);

    // Every caller retried in turn; none saw a half-registered index
    let stats = cache.stats();
    assert_eq!(stats.failed_builds, 6);
    assert_eq!(stats.misses, 6);
    assert_eq!(stats.builds, 0);
    assert!(cache.get(&grid, IndexKind::LookupTable).is_none());

    let indexes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|_| scope.spawn(|| cache.get_or_build(&grid, IndexKind::PriorityRTree).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for index in &indexes[1..] {
        assert!(Arc::ptr_eq(&indexes[0], index));
    }
    assert_eq!(cache.stats().builds, 1);
}

#[test]
fn test_kdtree_through_cache_with_explicit_params() {
    let params = KdTreeParams {
        nominal_resolution: 0.1,
        expansion_factor: 2.0,
        max_distance: 1.0,
        max_iterations: 10,
        k: 6,
    };
    let cache = IndexCache::new(IndexConfig {
        kdtree: Some(params),
        ..Default::default()
    });
    let grid = cache.load_grid(rectilinear_coords(20, 20, -5.0, -5.0, 0.5, 0.5));
    let index = cache.get_or_build(&grid, IndexKind::KdTree).unwrap();
    assert_eq!(index.kind(), IndexKind::KdTree);
    assert_eq!(index.nearest_cell(-4.9, -5.1), Some((0, 0)));
    assert_eq!(index.nearest_cell(4.6, 4.4), Some((19, 19)));

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().grids, 0);
}
