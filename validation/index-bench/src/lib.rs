//! Benchmark harness for containing-cell indexes and read strategies.
//!
//! This crate provides tools to:
//! - Generate synthetic curvilinear grids from YAML scenarios
//! - Time index builds and point queries per index kind
//! - Estimate the I/O cost of each read strategy for an image-shaped target
//! - Sweep KD-tree query parameters against an exact reference

pub mod config;
pub mod report;
pub mod runner;

pub use config::{GridSpec, Scenario, TargetSpec};
pub use report::ResultsReport;
pub use runner::{run_scenario, tune_kdtree, IndexResult, ScenarioResults, StrategyCost, TuneResult};
