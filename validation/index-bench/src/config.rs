//! Scenario loading and synthetic grid generation.

use std::path::Path;

use grid_geometry::{GridCoordinates, LonLatRect};
use grid_index::{IndexConfig, IndexKind};
use serde::{Deserialize, Serialize};

/// A benchmark scenario loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub grid: GridSpec,
    /// Random query points per index kind.
    pub queries: usize,
    #[serde(default)]
    pub seed: Option<u64>, // Optional RNG seed for reproducible runs
    /// Index kinds to compare; all of them when empty.
    #[serde(default)]
    pub kinds: Vec<IndexKind>,
    #[serde(default)]
    pub index: IndexConfig,
    /// Image-shaped target used for read cost estimates.
    pub target: TargetSpec,
}

/// Shape of the synthetic source grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridSpec {
    /// Axis-aligned nodes at `lon0 + i * dlon`, `lat0 + j * dlat`.
    Rectilinear {
        ni: usize,
        nj: usize,
        lon0: f64,
        lat0: f64,
        dlon: f64,
        dlat: f64,
    },
    /// Square cells of `spacing` degrees rotated about `centre`.
    Rotated {
        ni: usize,
        nj: usize,
        centre: (f64, f64),
        spacing: f64,
        angle_deg: f64,
    },
    /// Rectilinear grid centred on the antimeridian.
    Antimeridian {
        ni: usize,
        nj: usize,
        spacing: f64,
        lat0: f64,
    },
}

/// Target image over the source grid's bounding box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TargetSpec {
    pub width: usize,
    pub height: usize,
}

impl Scenario {
    /// Load a scenario from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_yaml::from_str(&content)?;
        Ok(scenario)
    }

    /// Validate the scenario.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.queries == 0 {
            anyhow::bail!("queries must be > 0");
        }
        if self.target.width == 0 || self.target.height == 0 {
            anyhow::bail!("target width and height must be > 0");
        }
        self.index.validate().map_err(anyhow::Error::msg)?;
        Ok(())
    }

    /// Index kinds to run, in a stable order.
    pub fn kinds(&self) -> Vec<IndexKind> {
        if self.kinds.is_empty() {
            IndexKind::ALL.to_vec()
        } else {
            self.kinds.clone()
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(42)
    }
}

impl GridSpec {
    /// Grid dimensions `(ni, nj)`.
    pub fn dimensions(&self) -> (usize, usize) {
        match *self {
            Self::Rectilinear { ni, nj, .. }
            | Self::Rotated { ni, nj, .. }
            | Self::Antimeridian { ni, nj, .. } => (ni, nj),
        }
    }

    /// Node coordinates for this grid.
    pub fn coordinates(&self) -> anyhow::Result<GridCoordinates> {
        let (ni, nj) = self.dimensions();
        let node: Box<dyn Fn(usize, usize) -> (f64, f64)> = match *self {
            Self::Rectilinear {
                lon0,
                lat0,
                dlon,
                dlat,
                ..
            } => Box::new(move |i, j| (lon0 + i as f64 * dlon, lat0 + j as f64 * dlat)),
            Self::Rotated {
                centre,
                spacing,
                angle_deg,
                ..
            } => {
                let (sin, cos) = angle_deg.to_radians().sin_cos();
                let half_i = (ni as f64 - 1.0) / 2.0;
                let half_j = (nj as f64 - 1.0) / 2.0;
                Box::new(move |i, j| {
                    let x = (i as f64 - half_i) * spacing;
                    let y = (j as f64 - half_j) * spacing;
                    (centre.0 + x * cos - y * sin, centre.1 + x * sin + y * cos)
                })
            }
            Self::Antimeridian { spacing, lat0, .. } => {
                let lon0 = 180.0 - spacing * (ni as f64 - 1.0) / 2.0;
                Box::new(move |i, j| (lon0 + i as f64 * spacing, lat0 + j as f64 * spacing))
            }
        };

        let mut lon = Vec::with_capacity(ni * nj);
        let mut lat = Vec::with_capacity(ni * nj);
        for j in 0..nj {
            for i in 0..ni {
                let (x, y) = node(i, j);
                lon.push(x);
                lat.push(y);
            }
        }
        Ok(GridCoordinates::new(ni, nj, lon, lat)?)
    }
}

/// Bounding box shrunk towards its centre by `fraction` of each side.
pub fn inset(rect: &LonLatRect, fraction: f64) -> LonLatRect {
    let dx = rect.width() * fraction;
    let dy = rect.height() * fraction;
    LonLatRect::new(
        rect.min_lon + dx,
        rect.min_lat + dy,
        rect.max_lon - dx,
        rect.max_lat - dy,
    )
}
