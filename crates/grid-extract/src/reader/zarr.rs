//! Zarr V3 backed array reader.

use std::ops::Range;
use std::sync::Arc;

use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::storage::ReadableStorageTraits;

use super::{check_bounds, ArrayReader};
use crate::error::BackingStoreError;
use crate::types::{RawRectangle, Slice};

/// Reads rectangles from a Zarr array laid out as `[y, x]`, `[t, y, x]` or
/// `[t, z, y, x]`, x (i) fastest.
///
/// Only the chunks intersecting a requested rectangle are fetched and
/// decoded; zarrs takes care of partial edge chunks.
pub struct ZarrArrayReader<S: ?Sized> {
    array: Array<S>,
    path: String,
    ni: usize,
    nj: usize,
}

impl<S: ReadableStorageTraits + Send + Sync + 'static> ZarrArrayReader<S> {
    /// Open the array at `path` within `storage`.
    pub fn open(storage: S, path: &str) -> Result<Self, BackingStoreError> {
        let array = Array::open(Arc::new(storage), path)
            .map_err(|e| BackingStoreError::open_failed(e.to_string()))?;
        Self::from_array(array, path)
    }

    /// Wrap an already opened array.
    pub fn from_array(array: Array<S>, path: &str) -> Result<Self, BackingStoreError> {
        let shape = array.shape();
        if !(2..=4).contains(&shape.len()) {
            return Err(BackingStoreError::unsupported(format!(
                "{path}: rank {} (expected 2, 3 or 4)",
                shape.len()
            )));
        }
        match array.data_type() {
            DataType::Float32 | DataType::Float64 | DataType::Int16 | DataType::Int32 => {}
            other => {
                return Err(BackingStoreError::unsupported(format!(
                    "{path}: data type {other:?}"
                )))
            }
        }

        let rank = shape.len();
        let nj = shape[rank - 2] as usize;
        let ni = shape[rank - 1] as usize;
        tracing::debug!(path, ni, nj, rank, "Opened zarr array");

        Ok(Self {
            array,
            path: path.to_string(),
            ni,
            nj,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Leading `[t]` / `[t, z]` indices for the array's rank.
    fn leading_indices(&self, slice: Slice) -> Result<Vec<u64>, BackingStoreError> {
        let shape = self.array.shape();
        let leading: Vec<usize> = match shape.len() {
            2 => Vec::new(),
            3 => vec![slice.t_index.unwrap_or(0)],
            _ => vec![slice.t_index.unwrap_or(0), slice.z_index.unwrap_or(0)],
        };
        for (axis, &index) in leading.iter().enumerate() {
            if index as u64 >= shape[axis] {
                return Err(BackingStoreError::read_failed(format!(
                    "{}: index {index} outside axis {axis} of length {}",
                    self.path, shape[axis]
                )));
            }
        }
        Ok(leading.into_iter().map(|v| v as u64).collect())
    }

    fn retrieve(&self, subset: &ArraySubset) -> Result<Vec<f64>, BackingStoreError> {
        let read_failed = |e: zarrs::array::ArrayError| {
            BackingStoreError::read_failed(format!("{}: {e}", self.path))
        };
        let values = match self.array.data_type() {
            DataType::Float32 => self
                .array
                .retrieve_array_subset_elements::<f32>(subset)
                .map_err(read_failed)?
                .into_iter()
                .map(f64::from)
                .collect(),
            DataType::Float64 => self
                .array
                .retrieve_array_subset_elements::<f64>(subset)
                .map_err(read_failed)?,
            DataType::Int16 => self
                .array
                .retrieve_array_subset_elements::<i16>(subset)
                .map_err(read_failed)?
                .into_iter()
                .map(f64::from)
                .collect(),
            DataType::Int32 => self
                .array
                .retrieve_array_subset_elements::<i32>(subset)
                .map_err(read_failed)?
                .into_iter()
                .map(f64::from)
                .collect(),
            other => {
                return Err(BackingStoreError::unsupported(format!(
                    "{}: data type {other:?}",
                    self.path
                )))
            }
        };
        Ok(values)
    }
}

impl<S: ReadableStorageTraits + Send + Sync + 'static> ArrayReader for ZarrArrayReader<S> {
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

        let mut start = self.leading_indices(slice)?;
        let mut shape = vec![1u64; start.len()];
        start.extend([j.start as u64, i.start as u64]);
        shape.extend([j.len() as u64, i.len() as u64]);

        // Zarr uses [.., row, col] indexing, which is already j-major / i-fastest
        let subset = ArraySubset::new_with_start_shape(start, shape)
            .map_err(|e| BackingStoreError::read_failed(e.to_string()))?;
        let values = self.retrieve(&subset)?;

        Ok(RawRectangle::new(i.len(), j.len(), values))
    }
}

impl<S: ?Sized> std::fmt::Debug for ZarrArrayReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZarrArrayReader")
            .field("path", &self.path)
            .field("ni", &self.ni)
            .field("nj", &self.nj)
            .finish_non_exhaustive()
    }
}
