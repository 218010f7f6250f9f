//! Low-level Parquet reading and column extraction.

use std::collections::BTreeMap;
use std::path::Path;

use arrow::array::{Array, AsArray, RecordBatch};
use arrow::datatypes::{ArrowPrimitiveType, Float64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::IoError;

/// Reads all record batches of a Parquet file together with its Arrow
/// schema metadata.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file does not exist, or
/// [`IoError::Parquet`] if the file cannot be opened or read.
pub(crate) fn read_batches(
    path: &Path,
) -> Result<(Vec<RecordBatch>, BTreeMap<String, String>), IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = std::fs::File::open(path).map_err(|e| IoError::Parquet {
        reason: format!("{}: {e}", path.display()),
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let metadata = builder
        .schema()
        .metadata()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let batches = builder.build()?.collect::<Result<Vec<_>, _>>()?;
    Ok((batches, metadata))
}

/// Primitive column `name` of `batch`.
pub(crate) fn primitive<'a, T: ArrowPrimitiveType>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'a arrow::array::PrimitiveArray<T>, IoError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_primitive_opt::<T>())
        .ok_or_else(|| IoError::MissingColumn {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
}

/// UTF-8 column `name` of `batch`.
pub(crate) fn utf8<'a>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'a arrow::array::StringArray, IoError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_string_opt::<i32>())
        .ok_or_else(|| IoError::MissingColumn {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
}

/// Nullable `value` column as `f64`, nulls becoming `NaN`.
pub(crate) fn values(batch: &RecordBatch, path: &Path) -> Result<Vec<f64>, IoError> {
    let col = primitive::<Float64Type>(batch, "value", path)?;
    Ok((0..col.len())
        .map(|k| if col.is_null(k) { f64::NAN } else { col.value(k) })
        .collect())
}

/// Collects cells into a `[lat, lon]` grid.
///
/// Coordinates are deduplicated and sorted; cells absent from the input stay
/// missing.
pub(crate) struct CellGrid {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

impl CellGrid {
    /// Distinct sorted coordinates of `lat` and `lon`.
    pub fn from_coordinates(lat: &[f64], lon: &[f64]) -> Self {
        let distinct = |v: &[f64]| {
            let mut v = v.to_vec();
            v.sort_by(f64::total_cmp);
            v.dedup();
            v
        };
        Self {
            lat: distinct(lat),
            lon: distinct(lon),
        }
    }

    /// Index of the cell at `(lat, lon)`.
    pub fn index(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let j = self.lat.binary_search_by(|x| x.total_cmp(&lat)).ok()?;
        let i = self.lon.binary_search_by(|x| x.total_cmp(&lon)).ok()?;
        Some((j, i))
    }
}
