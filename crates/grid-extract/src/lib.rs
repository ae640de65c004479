//! Extraction of gridded data at arbitrary target points.
//!
//! A request names a source grid, a list of target points, a backing
//! array and a slice. Extraction happens in two phases: every target
//! point is first located in the source grid (producing a [`PixelMap`]),
//! then the touched source cells are fetched with one of three
//! [`DataReadingStrategy`] variants and scattered back to the targets.
//!
//! # Architecture
//!
//! ```text
//! GridExtractor::extract(source, targets, reader, slice)
//!      │
//!      ├─► SourceGrid::Curvilinear ── IndexCache::get_or_build ──► SpatialIndex
//!      │   SourceGrid::Regular ────── axis arithmetic
//!      │   SourceGrid::Rectilinear ── binary search per axis
//!      │
//!      ▼
//! PixelMap::new (parallel point lookups, sort, dedup)
//!      │
//!      ├─► sorted (source cell, target) entries
//!      │
//!      ▼
//! DataReadingStrategy::read
//!      │
//!      ├─► PixelByPixel: 1×1 read per cell
//!      ├─► Scanline:     one read per row span
//!      └─► BoundingBox:  one read
//!               │
//!               ▼
//!      ValueConversion ──► Vec<f32> (NaN where unresolved or missing)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_extract::{ExtractConfig, GridExtractor, PointList, Slice, ValueConversion, ZarrArrayReader};
//!
//! let extractor = GridExtractor::new(ExtractConfig::from_env())?;
//! let source = extractor.source_for(coords)?;
//! let reader = ZarrArrayReader::open(store, "/sst")?;
//! let targets = PointList::new(vec![(-30.0, -20.0), (-29.5, -20.5)]);
//!
//! let values = extractor.extract(&source, &targets, &reader, Slice::at_time(0), &ValueConversion::identity())?;
//! ```

pub mod config;
pub mod conversion;
pub mod error;
pub mod extractor;
pub mod pixel_map;
pub mod reader;
pub mod source;
pub mod strategy;
pub mod target;
pub mod types;

pub use config::ExtractConfig;
pub use conversion::ValueConversion;
pub use error::{BackingStoreError, ExtractError, ReadConsistencyError, Result};
pub use extractor::GridExtractor;
pub use pixel_map::{PixelGroup, PixelGroups, PixelMap};
pub use reader::{ArrayReader, InMemoryArrayReader, ZarrArrayReader};
pub use source::SourceGrid;
pub use strategy::DataReadingStrategy;
pub use target::{AxisPair, PointList, ProjectedPoints, TargetDomain, ToLonLat};
pub use types::{RawRectangle, ReadCost, Slice};
