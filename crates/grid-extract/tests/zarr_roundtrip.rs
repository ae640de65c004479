//! Integration test: write Zarr arrays to disk and read them back through
//! `ZarrArrayReader`, alone and driven by the read strategies.

use std::sync::Arc;

use grid_extract::{
    ArrayReader, BackingStoreError, DataReadingStrategy, InMemoryArrayReader, PixelMap, PointList,
    Slice, SourceGrid, ValueConversion, ZarrArrayReader,
};
use grid_geometry::{RegularAxis, RegularGrid};
use test_utils::generators::{create_test_grid, random_points_in};
use test_utils::fixtures::rect;
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Write a 2-D float32 array (no sharding, no compression).
fn write_f32_2d(
    path: &std::path::Path,
    data: &[f32],
    width: usize,
    height: usize,
    chunk_size: usize,
) -> TestResult<()> {
    std::fs::create_dir_all(path)?;
    let store = Arc::new(FilesystemStore::new(path)?);

    let array = ArrayBuilder::new(
        vec![height as u64, width as u64], // shape [rows, cols]
        DataType::Float32,
        vec![chunk_size as u64, chunk_size as u64].try_into()?,
        FillValue::from(f32::NAN),
    )
    .build(store.clone(), "/")?;
    array.store_metadata()?;

    let subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![height as u64, width as u64])?;
    array.store_array_subset_elements(&subset, data)?;
    Ok(())
}

#[test]
fn test_zarr_rectangles_across_chunks() {
    let (width, height) = (50, 40);
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let zarr_path = temp_dir.path().join("grid.zarr");
    let data = create_test_grid(width, height);
    write_f32_2d(&zarr_path, &data, width, height, 16).expect("Failed to write Zarr");

    let store = FilesystemStore::new(&zarr_path).expect("Failed to open store");
    let reader = ZarrArrayReader::open(store, "/").expect("Failed to open reader");
    assert_eq!(reader.shape(), (width, height));

    // Spans chunk boundaries in both directions
    let rect = reader
        .read_rectangle(Slice::default(), 14..35, 10..18)
        .expect("Failed to read rectangle");
    assert_eq!((rect.ni, rect.nj), (21, 8));
    for dj in 0..rect.nj {
        for di in 0..rect.ni {
            let expected = ((14 + di) * 1000 + 10 + dj) as f64;
            assert_eq!(rect.value(di, dj).unwrap(), expected, "at ({di}, {dj})");
        }
    }

    let single = reader.read_rectangle(Slice::default(), 49..50, 39..40).unwrap();
    assert_eq!(single.values, vec![49_039.0]);
}

#[test]
fn test_zarr_out_of_bounds() {
    let temp_dir = tempfile::tempdir().unwrap();
    let zarr_path = temp_dir.path().join("small.zarr");
    write_f32_2d(&zarr_path, &create_test_grid(8, 6), 8, 6, 4).unwrap();

    let reader = ZarrArrayReader::open(FilesystemStore::new(&zarr_path).unwrap(), "/").unwrap();
    let err = reader.read_rectangle(Slice::default(), 6..9, 0..2).unwrap_err();
    assert!(matches!(err, BackingStoreError::OutOfBounds { ni: 8, nj: 6, .. }));
}

#[test]
fn test_zarr_time_series_int16() -> TestResult<()> {
    let (nt, nj, ni) = (3usize, 5usize, 7usize);
    let temp_dir = tempfile::tempdir()?;
    let zarr_path = temp_dir.path().join("series.zarr");
    std::fs::create_dir_all(&zarr_path)?;
    let store = Arc::new(FilesystemStore::new(&zarr_path)?);

    let array = ArrayBuilder::new(
        vec![nt as u64, nj as u64, ni as u64],
        DataType::Int16,
        vec![1, 4, 4].try_into()?,
        FillValue::from(-999i16),
    )
    .build(store.clone(), "/")?;
    array.store_metadata()?;

    // value = 100 * t + 10 * j + i
    let data: Vec<i16> = (0..nt)
        .flat_map(|t| (0..nj).flat_map(move |j| (0..ni).map(move |i| (100 * t + 10 * j + i) as i16)))
        .collect();
    let subset = ArraySubset::new_with_start_shape(vec![0, 0, 0], vec![nt as u64, nj as u64, ni as u64])?;
    array.store_array_subset_elements(&subset, &data)?;

    let reader = ZarrArrayReader::open(FilesystemStore::new(&zarr_path)?, "/")?;
    assert_eq!(reader.shape(), (ni, nj));

    let rect = reader.read_rectangle(Slice::at_time(2), 5..7, 3..5)?;
    assert_eq!(rect.values, vec![235.0, 236.0, 245.0, 246.0]);

    let first = reader.read_rectangle(Slice::default(), 0..1, 0..1)?;
    assert_eq!(first.values, vec![0.0]);

    assert!(reader.read_rectangle(Slice::at_time(3), 0..1, 0..1).is_err());

    // Scale/offset applies on top of the packed integers
    let conversion = ValueConversion::scaled(0.5, -10.0).with_missing_value(-999.0);
    assert_eq!(conversion.convert(rect.values[0]), 107.5);
    Ok(())
}

#[test]
fn test_zarr_rejects_unsupported_data_type() -> TestResult<()> {
    let temp_dir = tempfile::tempdir()?;
    let zarr_path = temp_dir.path().join("bytes.zarr");
    std::fs::create_dir_all(&zarr_path)?;
    let store = Arc::new(FilesystemStore::new(&zarr_path)?);

    let array = ArrayBuilder::new(
        vec![4, 4],
        DataType::UInt8,
        vec![4, 4].try_into()?,
        FillValue::from(0u8),
    )
    .build(store.clone(), "/")?;
    array.store_metadata()?;

    let err = ZarrArrayReader::open(FilesystemStore::new(&zarr_path)?, "/").unwrap_err();
    assert!(matches!(err, BackingStoreError::Unsupported(_)));
    Ok(())
}

#[test]
fn test_zarr_missing_array() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(temp_dir.path()).unwrap();
    let err = ZarrArrayReader::open(store, "/does/not/exist").unwrap_err();
    assert!(matches!(err, BackingStoreError::OpenFailed(_)));
}

#[test]
fn test_strategies_over_zarr_match_in_memory() {
    let (width, height) = (60, 30);
    let temp_dir = tempfile::tempdir().unwrap();
    let zarr_path = temp_dir.path().join("regular.zarr");
    let data = create_test_grid(width, height);
    write_f32_2d(&zarr_path, &data, width, height, 16).unwrap();

    let zarr = ZarrArrayReader::open(FilesystemStore::new(&zarr_path).unwrap(), "/").unwrap();
    let memory =
        InMemoryArrayReader::new(width, height, data.iter().map(|&v| f64::from(v)).collect()).unwrap();

    // 2° cells over 0..120 E, -30..30 N, row 0 in the south
    let source = SourceGrid::Regular(
        RegularGrid::new(
            RegularAxis::new(1.0, 2.0, width, true).unwrap(),
            RegularAxis::new(-29.0, 2.0, height, false).unwrap(),
        )
        .unwrap(),
    );
    let targets = PointList::new(random_points_in(&rect((-5.0, -35.0, 125.0, 35.0)), 500, 7));
    let map = PixelMap::new(&source, &targets).unwrap();
    assert!(!map.is_empty());

    let conversion = ValueConversion::identity();
    let expected = DataReadingStrategy::PixelByPixel
        .read(&map, &memory, Slice::default(), &conversion)
        .unwrap();
    for strategy in DataReadingStrategy::ALL {
        let output = strategy.read(&map, &zarr, Slice::default(), &conversion).unwrap();
        assert_eq!(output.len(), expected.len());
        for (got, want) in output.iter().zip(&expected) {
            assert_eq!(got.to_bits(), want.to_bits(), "{strategy}");
        }
    }
}
