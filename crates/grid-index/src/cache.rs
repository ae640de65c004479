//! Shared cache of grid geometries and built spatial indexes.
//!
//! Building an index is expensive and deterministic for a given grid, so
//! every built index is kept until [`IndexCache::clear`] is called. Lookups
//! of an already built index only take a read lock. A missing index is
//! built under a per-key lock, so concurrent requests for the same grid and
//! variant build it exactly once and the waiters receive the same `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use grid_geometry::{CurvilinearGrid, GridCoordinates};
use serde::Serialize;

use crate::config::{IndexConfig, IndexKind};
use crate::error::Result;
use crate::index::{build_index, SpatialIndex};

/// Cache key: grid identity plus index variant.
#[derive(Debug, Clone)]
struct IndexKey {
    grid: Arc<CurvilinearGrid>,
    kind: IndexKind,
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && (Arc::ptr_eq(&self.grid, &other.grid) || self.grid == other.grid)
    }
}

impl Eq for IndexKey {}

impl Hash for IndexKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.grid.coordinates().fingerprint().hash(state);
        self.kind.hash(state);
    }
}

/// Statistics for the index cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IndexCacheStats {
    /// Requests answered by an already built index.
    pub hits: u64,
    /// Requests that had to build.
    pub misses: u64,
    /// Successful builds.
    pub builds: u64,
    /// Builds that returned an error.
    pub failed_builds: u64,
    /// Indexes currently cached.
    pub indexes: usize,
    /// Distinct grid geometries currently interned.
    pub grids: usize,
}

impl IndexCacheStats {
    /// Calculate hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Cache service for grid geometries and spatial indexes.
///
/// Create one per process (or per dataset catalogue) and pass it by
/// reference or `Arc` to request handlers.
pub struct IndexCache {
    config: IndexConfig,
    grids: RwLock<HashMap<u64, Vec<Arc<CurvilinearGrid>>>>,
    built: RwLock<HashMap<IndexKey, Arc<dyn SpatialIndex>>>,
    building: Mutex<HashMap<IndexKey, Arc<Mutex<()>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    failed_builds: AtomicU64,
}

impl IndexCache {
    /// Create an empty cache that builds indexes with `config`.
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            grids: RwLock::new(HashMap::new()),
            built: RwLock::new(HashMap::new()),
            building: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            builds: AtomicU64::new(0),
            failed_builds: AtomicU64::new(0),
        }
    }

    /// The configuration used for builds.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Intern the geometry for `coords`.
    ///
    /// Equal coordinate arrays always yield the same `Arc`, which makes
    /// subsequent index lookups for that grid pointer comparisons. Corner
    /// computation happens outside any lock; if two callers race on a new
    /// grid, the first to insert wins and the other copy is dropped.
    pub fn load_grid(&self, coords: GridCoordinates) -> Arc<CurvilinearGrid> {
        let fingerprint = coords.fingerprint();
        if let Some(grid) = find_grid(&read(&self.grids), fingerprint, &coords) {
            return grid;
        }

        let grid = Arc::new(CurvilinearGrid::from_coordinates(coords));
        let mut grids = write(&self.grids);
        if let Some(existing) = find_grid(&grids, fingerprint, grid.coordinates()) {
            return existing;
        }
        grids.entry(fingerprint).or_default().push(grid.clone());
        grid
    }

    /// The index of `kind` for `grid`, building it if necessary.
    pub fn get_or_build(
        &self,
        grid: &Arc<CurvilinearGrid>,
        kind: IndexKind,
    ) -> Result<Arc<dyn SpatialIndex>> {
        let key = IndexKey {
            grid: grid.clone(),
            kind,
        };
        self.get_or_build_with(key, || build_index(kind, grid.clone(), &self.config))
    }

    /// Single-flight lookup behind [`IndexCache::get_or_build`].
    ///
    /// The per-key gate stays registered until a build succeeds, so callers
    /// queued behind a failed build retry one at a time on the same gate
    /// and a newcomer can never open a second gate for the key while
    /// anyone is building.
    fn get_or_build_with(
        &self,
        key: IndexKey,
        build: impl FnOnce() -> Result<Arc<dyn SpatialIndex>>,
    ) -> Result<Arc<dyn SpatialIndex>> {
        if let Some(index) = read(&self.built).get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(index.clone());
        }

        let gate = lock(&self.building).entry(key.clone()).or_default().clone();
        let _guard = lock(&*gate);

        // Another caller may have finished the build while we waited
        let finished = read(&self.built).get(&key).cloned();
        if let Some(index) = finished {
            self.hits.fetch_add(1, Ordering::Relaxed);
            self.release_gate(&key, &gate);
            return Ok(index);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            kind = %key.kind,
            ni = key.grid.ni(),
            nj = key.grid.nj(),
            "Index cache miss"
        );
        match build() {
            Ok(index) => {
                write(&self.built).insert(key.clone(), index.clone());
                self.builds.fetch_add(1, Ordering::Relaxed);
                self.release_gate(&key, &gate);
                Ok(index)
            }
            Err(e) => {
                self.failed_builds.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(kind = %key.kind, error = %e, "Index build failed");
                Err(e)
            }
        }
    }

    /// Unregister `gate` once the key is built, unless a newer gate has
    /// already taken its place.
    fn release_gate(&self, key: &IndexKey, gate: &Arc<Mutex<()>>) {
        let mut building = lock(&self.building);
        if building.get(key).is_some_and(|g| Arc::ptr_eq(g, gate)) {
            building.remove(key);
        }
    }

    /// The cached index, without building.
    pub fn get(&self, grid: &Arc<CurvilinearGrid>, kind: IndexKind) -> Option<Arc<dyn SpatialIndex>> {
        let key = IndexKey {
            grid: grid.clone(),
            kind,
        };
        read(&self.built).get(&key).cloned()
    }

    /// Drop every cached index and interned grid.
    ///
    /// Indexes already handed out stay alive for as long as their holders
    /// keep them.
    pub fn clear(&self) {
        let mut built = write(&self.built);
        let count = built.len();
        built.clear();
        write(&self.grids).clear();
        // Gates left behind by failed builds; held gates stay reachable
        // through their waiters' clones
        lock(&self.building).retain(|_, gate| Arc::strong_count(gate) > 1);
        tracing::info!(indexes = count, "Cleared index cache");
    }

    /// Number of cached indexes.
    pub fn len(&self) -> usize {
        read(&self.built).len()
    }

    /// Whether no index is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics.
    pub fn stats(&self) -> IndexCacheStats {
        IndexCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            failed_builds: self.failed_builds.load(Ordering::Relaxed),
            indexes: self.len(),
            grids: read(&self.grids).values().map(Vec::len).sum(),
        }
    }
}

impl fmt::Debug for IndexCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

fn find_grid(
    grids: &HashMap<u64, Vec<Arc<CurvilinearGrid>>>,
    fingerprint: u64,
    coords: &GridCoordinates,
) -> Option<Arc<CurvilinearGrid>> {
    grids
        .get(&fingerprint)?
        .iter()
        .find(|grid| grid.coordinates() == coords)
        .cloned()
}

// A panic in another thread cannot leave these maps half-updated, so
// poisoning is ignored.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
