//! Benchmarks for pixel map construction and the read strategies.
//!
//! Run with: cargo bench --package grid-extract --bench extract_benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grid_extract::{
    DataReadingStrategy, InMemoryArrayReader, PixelMap, PointList, SourceGrid, Slice,
    ValueConversion,
};
use grid_geometry::{CurvilinearGrid, RegularAxis, RegularGrid};
use grid_index::{build_index, IndexConfig, IndexKind};
use test_utils::{create_test_values, random_points_in, rotated_coords};

const NI: usize = 400;
const NJ: usize = 300;

fn curvilinear_source() -> (SourceGrid, Arc<CurvilinearGrid>) {
    let grid = Arc::new(CurvilinearGrid::from_coordinates(rotated_coords(
        NI,
        NJ,
        (-40.0, 30.0),
        0.1,
        20.0,
    )));
    let index = build_index(IndexKind::PriorityRTree, grid.clone(), &IndexConfig::default()).unwrap();
    (SourceGrid::Curvilinear(index), grid)
}

// =============================================================================
// PIXEL MAP BENCHMARKS
// =============================================================================

fn bench_pixel_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("pixel_map");
    group.sample_size(20);

    let (source, grid) = curvilinear_source();
    for &n in &[1_000usize, 100_000] {
        let targets = PointList::new(random_points_in(&grid.bounding_box(), n, 42));
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("curvilinear", n), &targets, |b, targets| {
            b.iter(|| PixelMap::new(&source, targets).unwrap());
        });
    }

    // Regular source and target take the per-axis path
    let regular = SourceGrid::Regular(
        RegularGrid::new(
            RegularAxis::new(-179.875, 0.25, 1440, true).unwrap(),
            RegularAxis::new(-89.875, 0.25, 720, false).unwrap(),
        )
        .unwrap(),
    );
    let tile = RegularGrid::from_bbox(&grid.bounding_box(), 512, 512).unwrap();
    group.throughput(Throughput::Elements(tile.len() as u64));
    group.bench_function("regular_512x512", |b| {
        b.iter(|| PixelMap::new(&regular, &tile).unwrap());
    });

    group.finish();
}

// =============================================================================
// READ STRATEGY BENCHMARKS
// =============================================================================

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_strategy");

    let (source, grid) = curvilinear_source();
    let reader = InMemoryArrayReader::new(NI, NJ, create_test_values(NI, NJ)).unwrap();
    let conversion = ValueConversion::identity();

    // Sparse: a handful of points over the whole grid. Dense: a 256x256 tile.
    let sparse = PointList::new(random_points_in(&grid.bounding_box(), 200, 7));
    let dense = RegularGrid::from_bbox(&grid.bounding_box(), 256, 256).unwrap();
    let maps = [
        ("sparse", PixelMap::new(&source, &sparse).unwrap()),
        ("dense", PixelMap::new(&source, &dense).unwrap()),
    ];

    for (name, map) in &maps {
        for strategy in DataReadingStrategy::ALL {
            group.bench_with_input(BenchmarkId::new(strategy.as_str(), name), map, |b, map| {
                b.iter(|| {
                    black_box(
                        strategy
                            .read(map, &reader, Slice::default(), &conversion)
                            .unwrap(),
                    )
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_pixel_map, bench_strategies);
criterion_main!(benches);
