//! Configuration for spatial index construction.

use std::fmt;
use std::str::FromStr;

use grid_geometry::CurvilinearGrid;
use serde::{Deserialize, Serialize};

/// Which spatial index variant to build for a curvilinear grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Dense raster of precomputed answers; O(1), approximate.
    LookupTable,
    /// Approximate nearest centroids, validated against cell polygons.
    KdTree,
    /// Bulk-loaded R-tree over cell rectangles (branch factor 10).
    #[serde(rename = "priority_rtree")]
    PriorityRTree,
    /// R-tree built by incremental insertion.
    #[serde(rename = "dynamic_rtree")]
    DynamicRTree,
}

impl IndexKind {
    /// Every variant, in a stable order.
    pub const ALL: [IndexKind; 4] = [
        IndexKind::LookupTable,
        IndexKind::KdTree,
        IndexKind::PriorityRTree,
        IndexKind::DynamicRTree,
    ];

    /// Get the variant name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LookupTable => "lookup_table",
            Self::KdTree => "kd_tree",
            Self::PriorityRTree => "priority_rtree",
            Self::DynamicRTree => "dynamic_rtree",
        }
    }
}

impl Default for IndexKind {
    fn default() -> Self {
        Self::PriorityRTree
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = String;

    /// Parse from string (case-insensitive, `-` and `_` interchangeable).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "lookup_table" | "lut" => Ok(Self::LookupTable),
            "kd_tree" | "kdtree" => Ok(Self::KdTree),
            "priority_rtree" | "prtree" => Ok(Self::PriorityRTree),
            "dynamic_rtree" | "rtree" => Ok(Self::DynamicRTree),
            other => Err(format!("unknown index kind '{other}'")),
        }
    }
}

/// Query tuning for the KD-tree index.
///
/// No `Default`: sensible values scale with the
/// grid's cell size, which varies by orders of magnitude between datasets.
/// Use [`KdTreeParams::from_grid`] for a starting point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KdTreeParams {
    /// Initial search radius in degrees.
    pub nominal_resolution: f64,
    /// Factor by which the radius grows while nothing is found.
    pub expansion_factor: f64,
    /// Largest radius searched before giving up.
    pub max_distance: f64,
    /// Cap on neighbour-descent steps when no candidate contains the point.
    pub max_iterations: usize,
    /// Number of nearest centroids validated per query.
    pub k: usize,
}

impl KdTreeParams {
    /// Derive parameters from the grid's mean cell size.
    pub fn from_grid(grid: &CurvilinearGrid) -> Self {
        let size = grid.mean_cell_size();
        Self {
            nominal_resolution: size / 4.0,
            expansion_factor: 3.5,
            max_distance: size,
            max_iterations: 20,
            k: 8,
        }
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.nominal_resolution > 0.0) {
            return Err("kdtree nominal_resolution must be > 0".to_string());
        }
        if !(self.expansion_factor > 1.0) {
            return Err("kdtree expansion_factor must be > 1".to_string());
        }
        if !(self.max_distance >= self.nominal_resolution) {
            return Err("kdtree max_distance must be >= nominal_resolution".to_string());
        }
        if self.k == 0 {
            return Err("kdtree k must be > 0".to_string());
        }
        Ok(())
    }
}

/// Build-time configuration for spatial indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Lookup table node spacing in degrees.
    pub lut_resolution: f64,

    /// Largest lookup table (in nodes) that may be built.
    pub max_lut_points: usize,

    /// KD-tree query parameters; required to build a KD-tree index.
    #[serde(default)]
    pub kdtree: Option<KdTreeParams>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            lut_resolution: 0.1,
            max_lut_points: 50_000_000,
            kdtree: None,
        }
    }
}

impl IndexConfig {
    /// Load configuration from environment variables.
    ///
    /// KD-tree parameters are only set when all five `GRID_KDTREE_*`
    /// variables parse.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(res) = env_parse("GRID_LUT_RESOLUTION") {
            config.lut_resolution = res;
        }

        if let Some(points) = env_parse("GRID_LUT_MAX_POINTS") {
            config.max_lut_points = points;
        }

        let kdtree = (|| {
            Some(KdTreeParams {
                nominal_resolution: env_parse("GRID_KDTREE_NOMINAL_RESOLUTION")?,
                expansion_factor: env_parse("GRID_KDTREE_EXPANSION_FACTOR")?,
                max_distance: env_parse("GRID_KDTREE_MAX_DISTANCE")?,
                max_iterations: env_parse("GRID_KDTREE_MAX_ITERATIONS")?,
                k: env_parse("GRID_KDTREE_K")?,
            })
        })();
        if kdtree.is_some() {
            config.kdtree = kdtree;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.lut_resolution > 0.0) || !self.lut_resolution.is_finite() {
            return Err("lut_resolution must be a positive number of degrees".to_string());
        }

        if self.max_lut_points == 0 {
            return Err("max_lut_points must be > 0".to_string());
        }

        if let Some(params) = &self.kdtree {
            params.validate()?;
        }

        Ok(())
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}
