//! Readers for the backing array.
//!
//! The strategies only ever ask for inclusive-exclusive rectangles of one
//! 2-D slice; everything about storage layout, chunking and compression
//! stays behind [`ArrayReader`].

mod zarr;

pub use zarr::ZarrArrayReader;

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::BackingStoreError;
use crate::types::{RawRectangle, Slice};

/// Source of raw (unconverted) array values on the source grid.
pub trait ArrayReader: Send + Sync {
    /// Horizontal extents `(ni, nj)` of one slice.
    fn shape(&self) -> (usize, usize);

    /// Read the rectangle `i × j` of `slice`, i fastest.
    ///
    /// Implementations return exactly `i.len() * j.len()` values or an
    /// error; fill values come back as whatever raw value is stored.
    fn read_rectangle(
        &self,
        slice: Slice,
        i: Range<usize>,
        j: Range<usize>,
    ) -> Result<RawRectangle, BackingStoreError>;
}

/// Reject empty or out-of-range requests before touching storage.
pub(crate) fn check_bounds(
    shape: (usize, usize),
    i: &Range<usize>,
    j: &Range<usize>,
) -> Result<(), BackingStoreError> {
    let (ni, nj) = shape;
    if i.start >= i.end || j.start >= j.end || i.end > ni || j.end > nj {
        return Err(BackingStoreError::OutOfBounds {
            i: i.clone(),
            j: j.clone(),
            ni,
            nj,
        });
    }
    Ok(())
}

/// Array held in memory as `nt × nz` layers of `ni × nj` values.
///
/// Counts every read so that strategy costs can be observed.
#[derive(Debug)]
pub struct InMemoryArrayReader {
    ni: usize,
    nj: usize,
    nt: usize,
    nz: usize,
    values: Vec<f64>,
    read_calls: AtomicUsize,
    values_read: AtomicUsize,
}

impl InMemoryArrayReader {
    /// A single 2-D layer.
    pub fn new(ni: usize, nj: usize, values: Vec<f64>) -> Result<Self, BackingStoreError> {
        Self::with_layers(ni, nj, 1, 1, values)
    }

    /// `nt` time steps of `nz` levels each, t slowest.
    pub fn with_layers(
        ni: usize,
        nj: usize,
        nt: usize,
        nz: usize,
        values: Vec<f64>,
    ) -> Result<Self, BackingStoreError> {
        let expected = ni * nj * nt * nz;
        if expected == 0 || values.len() != expected {
            return Err(BackingStoreError::open_failed(format!(
                "expected {expected} values for {nt}x{nz}x{nj}x{ni}, got {}",
                values.len()
            )));
        }
        Ok(Self {
            ni,
            nj,
            nt,
            nz,
            values,
            read_calls: AtomicUsize::new(0),
            values_read: AtomicUsize::new(0),
        })
    }

    /// Number of `read_rectangle` calls that succeeded.
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::Relaxed)
    }

    /// Total values returned across all reads.
    pub fn values_read(&self) -> usize {
        self.values_read.load(Ordering::Relaxed)
    }

    pub fn reset_counters(&self) {
        self.read_calls.store(0, Ordering::Relaxed);
        self.values_read.store(0, Ordering::Relaxed);
    }

    fn layer_offset(&self, slice: Slice) -> Result<usize, BackingStoreError> {
        let t = slice.t_index.unwrap_or(0);
        let z = slice.z_index.unwrap_or(0);
        if t >= self.nt || z >= self.nz {
            return Err(BackingStoreError::read_failed(format!(
                "slice t={t} z={z} outside {}x{} layers",
                self.nt, self.nz
            )));
        }
        Ok((t * self.nz + z) * self.ni * self.nj)
    }
}

impl ArrayReader for InMemoryArrayReader {
    fn shape(&self) -> (usize, usize) {
        (self.ni, self.nj)
    }

    fn read_rectangle(
        &self,
        slice: Slice,
        i: Range<usize>,
        j: Range<usize>,
    ) -> Result<RawRectangle, BackingStoreError> {
        check_bounds(self.shape(), &i, &j)?;
        let offset = self.layer_offset(slice)?;

        let mut values = Vec::with_capacity(i.len() * j.len());
        for jj in j.clone() {
            let row = offset + jj * self.ni;
            values.extend_from_slice(&self.values[row + i.start..row + i.end]);
        }

        self.read_calls.fetch_add(1, Ordering::Relaxed);
        self.values_read.fetch_add(values.len(), Ordering::Relaxed);
        Ok(RawRectangle::new(i.len(), j.len(), values))
    }
}
