//! Configuration for the extractor.

use std::str::FromStr;

use grid_index::{IndexConfig, IndexKind};
use serde::{Deserialize, Serialize};

use crate::strategy::DataReadingStrategy;

/// Configuration for [`crate::GridExtractor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Spatial index used for curvilinear source grids.
    #[serde(default)]
    pub index_kind: IndexKind,

    /// How source values are fetched.
    #[serde(default)]
    pub strategy: DataReadingStrategy,

    /// Index build parameters.
    #[serde(default)]
    pub index: IndexConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            index_kind: IndexKind::default(),
            strategy: DataReadingStrategy::default(),
            index: IndexConfig::default(),
        }
    }
}

impl ExtractConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values are ignored and the default kept.
    pub fn from_env() -> Self {
        let mut config = Self {
            index: IndexConfig::from_env(),
            ..Self::default()
        };

        if let Some(kind) = env_parse("GRID_INDEX_KIND") {
            config.index_kind = kind;
        }

        if let Some(strategy) = env_parse("GRID_READ_STRATEGY") {
            config.strategy = strategy;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.index.validate()?;

        if self.index_kind == IndexKind::KdTree && self.index.kdtree.is_none() {
            return Err("index_kind kd_tree requires index.kdtree parameters".to_string());
        }

        Ok(())
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_index::KdTreeParams;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.index_kind, IndexKind::PriorityRTree);
        assert_eq!(config.strategy, DataReadingStrategy::Scanline);
    }

    #[test]
    fn test_kdtree_requires_params() {
        let mut config = ExtractConfig {
            index_kind: IndexKind::KdTree,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.index.kdtree = Some(KdTreeParams {
            nominal_resolution: 0.05,
            expansion_factor: 2.0,
            max_distance: 1.0,
            max_iterations: 10,
            k: 4,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_index_config_propagates() {
        let mut config = ExtractConfig::default();
        config.index.lut_resolution = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ExtractConfig =
            serde_json::from_str(r#"{"index_kind": "lookup_table", "strategy": "bounding_box"}"#)
                .unwrap();
        assert_eq!(config.index_kind, IndexKind::LookupTable);
        assert_eq!(config.strategy, DataReadingStrategy::BoundingBox);
        assert_eq!(config.index, IndexConfig::default());
    }
}
