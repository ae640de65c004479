//! Scenario execution: index builds, timed queries and read cost estimates.

use std::sync::Arc;
use std::time::Instant;

use grid_extract::{DataReadingStrategy, PixelMap, SourceGrid};
use grid_geometry::{CurvilinearGrid, RegularGrid};
use grid_index::{build_index, IndexConfig, IndexKind, KdTreeParams, SpatialIndex};
use hdrhistogram::Histogram;
use serde::Serialize;
use test_utils::random_points_in;
use tracing::info;

use crate::config::{inset, Scenario};

/// Results for one index kind.
#[derive(Debug, Clone, Serialize)]
pub struct IndexResult {
    pub kind: IndexKind,
    pub build_ms: f64,
    pub memory_bytes: usize,
    /// Fraction of query points that resolved to a cell.
    pub hit_rate: f64,
    /// Fraction of query points answered exactly as the reference index.
    pub agreement: f64,
    pub query_p50_ns: u64,
    pub query_p99_ns: u64,
    pub query_max_ns: u64,
    pub pixel_map_ms: f64,
}

/// Estimated I/O for one read strategy over the target image.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyCost {
    pub strategy: DataReadingStrategy,
    pub read_calls: usize,
    pub values_read: usize,
}

/// Complete results of a scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResults {
    pub scenario: String,
    pub ni: usize,
    pub nj: usize,
    pub queries: usize,
    pub indexes: Vec<IndexResult>,
    pub unique_ij_pairs: usize,
    pub target_points: usize,
    pub strategies: Vec<StrategyCost>,
}

/// One point of a KD-tree parameter sweep.
#[derive(Debug, Clone, Serialize)]
pub struct TuneResult {
    pub k: usize,
    pub expansion_factor: f64,
    pub mean_query_ns: f64,
    pub hit_rate: f64,
    pub agreement: f64,
}

/// Answers of the exact bulk-loaded R-tree, used as the reference.
fn reference_answers(
    grid: &Arc<CurvilinearGrid>,
    points: &[(f64, f64)],
) -> anyhow::Result<Vec<Option<(usize, usize)>>> {
    let reference = build_index(IndexKind::PriorityRTree, grid.clone(), &IndexConfig::default())?;
    Ok(points
        .iter()
        .map(|&(lon, lat)| reference.nearest_cell(lon, lat))
        .collect())
}

struct QueryStats {
    histogram: Histogram<u64>,
    total_ns: u64,
    hits: usize,
    agreeing: usize,
}

fn time_queries(
    index: &dyn SpatialIndex,
    points: &[(f64, f64)],
    reference: &[Option<(usize, usize)>],
) -> anyhow::Result<QueryStats> {
    let mut stats = QueryStats {
        histogram: Histogram::new(3)?,
        total_ns: 0,
        hits: 0,
        agreeing: 0,
    };
    for (&(lon, lat), expected) in points.iter().zip(reference) {
        let start = Instant::now();
        let found = index.nearest_cell(lon, lat);
        let ns = start.elapsed().as_nanos() as u64;

        stats.histogram.record(ns.max(1)).ok();
        stats.total_ns += ns;
        stats.hits += usize::from(found.is_some());
        stats.agreeing += usize::from(found == *expected);
    }
    Ok(stats)
}

/// Run every index kind of `scenario` and estimate read costs.
pub fn run_scenario(scenario: &Scenario) -> anyhow::Result<ScenarioResults> {
    let coords = scenario.grid.coordinates()?;
    let (ni, nj) = (coords.ni(), coords.nj());
    let grid = Arc::new(CurvilinearGrid::from_coordinates(coords));
    let bbox = grid.bounding_box();

    let mut config = scenario.index.clone();
    if config.kdtree.is_none() {
        config.kdtree = Some(KdTreeParams::from_grid(&grid));
    }

    // Query inside the grid with a margin so that misses are exercised too
    let points = random_points_in(&inset(&bbox, -0.05), scenario.queries, scenario.seed());
    let reference = reference_answers(&grid, &points)?;
    let target = RegularGrid::from_bbox(&bbox, scenario.target.width, scenario.target.height)?;

    let mut indexes = Vec::new();
    let mut costs_map = None;
    for kind in scenario.kinds() {
        let start = Instant::now();
        let index = build_index(kind, grid.clone(), &config)?;
        let build_ms = start.elapsed().as_secs_f64() * 1000.0;

        let stats = time_queries(index.as_ref(), &points, &reference)?;

        let start = Instant::now();
        let map = PixelMap::new(&SourceGrid::Curvilinear(index.clone()), &target)?;
        let pixel_map_ms = start.elapsed().as_secs_f64() * 1000.0;

        let result = IndexResult {
            kind,
            build_ms,
            memory_bytes: index.memory_bytes(),
            hit_rate: stats.hits as f64 / points.len() as f64,
            agreement: stats.agreeing as f64 / points.len() as f64,
            query_p50_ns: stats.histogram.value_at_quantile(0.50),
            query_p99_ns: stats.histogram.value_at_quantile(0.99),
            query_max_ns: stats.histogram.max(),
            pixel_map_ms,
        };
        info!(
            kind = %kind,
            build_ms = result.build_ms,
            hit_rate = result.hit_rate,
            agreement = result.agreement,
            "Index benchmarked"
        );
        indexes.push(result);

        // Costs come from an exact index when one was run
        if costs_map.is_none() || kind == IndexKind::PriorityRTree {
            costs_map = Some(map);
        }
    }

    let map = costs_map.ok_or_else(|| anyhow::anyhow!("scenario runs no index kinds"))?;
    let strategies = DataReadingStrategy::ALL
        .into_iter()
        .map(|strategy| {
            let cost = map.estimate_cost(strategy);
            StrategyCost {
                strategy,
                read_calls: cost.read_calls,
                values_read: cost.values_read,
            }
        })
        .collect();

    Ok(ScenarioResults {
        scenario: scenario.name.clone(),
        ni,
        nj,
        queries: points.len(),
        indexes,
        unique_ij_pairs: map.unique_ij_pairs(),
        target_points: map.target_len(),
        strategies,
    })
}

/// Sweep KD-tree `k` and `expansion_factor`, scoring each pair against the
/// priority R-tree.
pub fn tune_kdtree(
    scenario: &Scenario,
    ks: &[usize],
    expansion_factors: &[f64],
) -> anyhow::Result<Vec<TuneResult>> {
    let grid = Arc::new(CurvilinearGrid::from_coordinates(scenario.grid.coordinates()?));
    let points = random_points_in(&inset(&grid.bounding_box(), -0.05), scenario.queries, scenario.seed());
    let reference = reference_answers(&grid, &points)?;
    let base = scenario
        .index
        .kdtree
        .unwrap_or_else(|| KdTreeParams::from_grid(&grid));

    let mut results = Vec::with_capacity(ks.len() * expansion_factors.len());
    for &k in ks {
        for &expansion_factor in expansion_factors {
            let config = IndexConfig {
                kdtree: Some(KdTreeParams {
                    k,
                    expansion_factor,
                    ..base
                }),
                ..scenario.index.clone()
            };
            let index = build_index(IndexKind::KdTree, grid.clone(), &config)?;
            let stats = time_queries(index.as_ref(), &points, &reference)?;

            results.push(TuneResult {
                k,
                expansion_factor,
                mean_query_ns: stats.total_ns as f64 / points.len() as f64,
                hit_rate: stats.hits as f64 / points.len() as f64,
                agreement: stats.agreeing as f64 / points.len() as f64,
            });
        }
    }
    Ok(results)
}
