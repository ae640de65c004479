//! Strategies for turning a pixel map into reads against the backing array.
//!
//! | Strategy        | Read calls          | Values read                   |
//! |-----------------|---------------------|-------------------------------|
//! | `PixelByPixel`  | one per source cell | unique (i, j) pairs           |
//! | `Scanline`      | one per source row  | sum of row spans              |
//! | `BoundingBox`   | one                 | whole `[min, max]` rectangle  |
//!
//! All three produce identical output for the same map, reader and slice;
//! they differ only in I/O pattern.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::conversion::ValueConversion;
use crate::error::{ExtractError, Result};
use crate::pixel_map::{PixelGroup, PixelMap};
use crate::reader::ArrayReader;
use crate::types::Slice;

/// How source values are fetched for a pixel map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataReadingStrategy {
    /// One 1×1 read per touched source cell. Best for sparse targets on
    /// remote stores with cheap small reads.
    PixelByPixel,
    /// One read per touched row, spanning the first to last touched column.
    Scanline,
    /// A single read of the bounding rectangle. Best for dense targets.
    BoundingBox,
}

impl DataReadingStrategy {
    pub const ALL: [DataReadingStrategy; 3] = [
        DataReadingStrategy::PixelByPixel,
        DataReadingStrategy::Scanline,
        DataReadingStrategy::BoundingBox,
    ];

    /// Get the strategy name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PixelByPixel => "pixel_by_pixel",
            Self::Scanline => "scanline",
            Self::BoundingBox => "bounding_box",
        }
    }

    /// Fill a `map.target_len()` output from `reader`.
    ///
    /// Targets the map did not resolve stay NaN, as do targets whose raw
    /// value is missing under `conversion`.
    pub fn read(
        self,
        map: &PixelMap,
        reader: &dyn ArrayReader,
        slice: Slice,
        conversion: &ValueConversion,
    ) -> Result<Vec<f32>> {
        let mut output = vec![f32::NAN; map.target_len()];
        if map.is_empty() {
            return Ok(output);
        }
        if reader.shape() != map.source_shape() {
            return Err(ExtractError::config(format!(
                "reader shape {:?} does not match pixel map source shape {:?}",
                reader.shape(),
                map.source_shape()
            )));
        }

        let start = Instant::now();
        match self {
            Self::PixelByPixel => read_pixel_by_pixel(map, reader, slice, conversion, &mut output)?,
            Self::Scanline => read_scanline(map, reader, slice, conversion, &mut output)?,
            Self::BoundingBox => read_bounding_box(map, reader, slice, conversion, &mut output)?,
        }

        tracing::debug!(
            strategy = self.as_str(),
            groups = map.unique_ij_pairs(),
            targets = map.target_len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Read pixel map"
        );
        Ok(output)
    }
}

impl Default for DataReadingStrategy {
    fn default() -> Self {
        Self::Scanline
    }
}

impl fmt::Display for DataReadingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataReadingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pixel_by_pixel" | "pixel" => Ok(Self::PixelByPixel),
            "scanline" | "row" => Ok(Self::Scanline),
            "bounding_box" | "bbox" => Ok(Self::BoundingBox),
            other => Err(format!("unknown read strategy '{other}'")),
        }
    }
}

/// Write one converted value to every target of a group.
fn scatter(output: &mut [f32], group: &PixelGroup<'_>, value: f32) {
    for target in group.targets() {
        output[target] = value;
    }
}

fn read_pixel_by_pixel(
    map: &PixelMap,
    reader: &dyn ArrayReader,
    slice: Slice,
    conversion: &ValueConversion,
    output: &mut [f32],
) -> Result<()> {
    for group in map.groups() {
        let rect = reader.read_rectangle(slice, group.i..group.i + 1, group.j..group.j + 1)?;
        rect.check_shape(1, 1)?;
        scatter(output, &group, conversion.convert(rect.value(0, 0)?));
    }
    Ok(())
}

fn read_scanline(
    map: &PixelMap,
    reader: &dyn ArrayReader,
    slice: Slice,
    conversion: &ValueConversion,
    output: &mut [f32],
) -> Result<()> {
    let mut groups = map.groups().peekable();
    let mut row = Vec::new();
    while let Some(first) = groups.next() {
        row.clear();
        row.push(first);
        while let Some(group) = groups.next_if(|g| g.j == first.j) {
            row.push(group);
        }

        // Groups within a row are sorted by i
        let first_i = first.i;
        let last_i = row[row.len() - 1].i;
        let width = last_i - first_i + 1;
        let rect = reader.read_rectangle(slice, first_i..last_i + 1, first.j..first.j + 1)?;
        rect.check_shape(width, 1)?;

        for group in &row {
            let raw = rect.value(group.i - first_i, 0)?;
            scatter(output, group, conversion.convert(raw));
        }
    }
    Ok(())
}

fn read_bounding_box(
    map: &PixelMap,
    reader: &dyn ArrayReader,
    slice: Slice,
    conversion: &ValueConversion,
    output: &mut [f32],
) -> Result<()> {
    let (Some(min_i), Some(max_i), Some(min_j), Some(max_j)) =
        (map.min_i(), map.max_i(), map.min_j(), map.max_j())
    else {
        return Ok(());
    };

    let (width, height) = (max_i - min_i + 1, max_j - min_j + 1);
    let rect = reader.read_rectangle(slice, min_i..max_i + 1, min_j..max_j + 1)?;
    rect.check_shape(width, height)?;

    for group in map.groups() {
        let raw = rect.value(group.i - min_i, group.j - min_j)?;
        scatter(output, &group, conversion.convert(raw));
    }
    Ok(())
}
