//! High-level extraction entry point.

use std::sync::Arc;
use std::time::Instant;

use grid_geometry::GridCoordinates;
use grid_index::{IndexCache, IndexKind};

use crate::config::ExtractConfig;
use crate::conversion::ValueConversion;
use crate::error::{ExtractError, Result};
use crate::pixel_map::PixelMap;
use crate::reader::ArrayReader;
use crate::source::SourceGrid;
use crate::target::TargetDomain;
use crate::types::Slice;

/// Ties together index caching, pixel mapping and reading.
///
/// Cheap to clone; clones share the index cache.
#[derive(Debug, Clone)]
pub struct GridExtractor {
    cache: Arc<IndexCache>,
    config: ExtractConfig,
}

impl GridExtractor {
    /// Create an extractor with its own index cache.
    pub fn new(config: ExtractConfig) -> Result<Self> {
        let cache = Arc::new(IndexCache::new(config.index.clone()));
        Self::with_cache(cache, config)
    }

    /// Create an extractor sharing an existing index cache.
    ///
    /// Indexes are built with the cache's own [`grid_index::IndexConfig`];
    /// `config.index` is only validated.
    pub fn with_cache(cache: Arc<IndexCache>, config: ExtractConfig) -> Result<Self> {
        config.validate().map_err(ExtractError::config)?;
        Ok(Self { cache, config })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<IndexCache> {
        &self.cache
    }

    /// Source for a curvilinear grid using the configured index kind.
    pub fn source_for(&self, coords: GridCoordinates) -> Result<SourceGrid> {
        self.source_with(coords, self.config.index_kind)
    }

    /// Source for a curvilinear grid using a specific index kind.
    pub fn source_with(&self, coords: GridCoordinates, kind: IndexKind) -> Result<SourceGrid> {
        let grid = self.cache.load_grid(coords);
        let index = self.cache.get_or_build(&grid, kind)?;
        Ok(SourceGrid::Curvilinear(index))
    }

    /// Map every target point onto `source`.
    pub fn pixel_map(&self, source: &SourceGrid, targets: &dyn TargetDomain) -> Result<PixelMap> {
        PixelMap::new(source, targets)
    }

    /// Values of `slice` at every target point, NaN where a point lies
    /// outside the source grid or its value is missing.
    pub fn extract(
        &self,
        source: &SourceGrid,
        targets: &dyn TargetDomain,
        reader: &dyn ArrayReader,
        slice: Slice,
        conversion: &ValueConversion,
    ) -> Result<Vec<f32>> {
        let start = Instant::now();
        let map = self.pixel_map(source, targets)?;
        let values = self.config.strategy.read(&map, reader, slice, conversion)?;

        tracing::debug!(
            strategy = %self.config.strategy,
            targets = targets.len(),
            resolved = map.resolved_targets(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extraction complete"
        );
        Ok(values)
    }

    /// Drop every cached index and interned grid.
    pub fn clear_index_cache(&self) {
        self.cache.clear();
    }
}
