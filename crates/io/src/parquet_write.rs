//! Low-level Parquet column building.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, RecordBatch, StringArray, UInt8Array};
use arrow::datatypes::{DataType, Field as ArrowField, Schema};
use delta_field::{Field, FieldSeries};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::error::IoError;
use crate::layer::Layer;

/// Schema metadata key holding the grid name of a series file.
pub(crate) const GRID_KEY: &str = "delta:grid";

fn with_metadata(fields: Vec<ArrowField>, metadata: &BTreeMap<String, String>) -> Schema {
    let metadata: HashMap<String, String> = metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Schema::new(fields).with_metadata(metadata)
}

/// Schema of a series file: `year`, `month`, `lat`, `lon`, nullable `value`.
pub(crate) fn series_schema(grid_name: &str) -> Schema {
    let metadata = BTreeMap::from([(GRID_KEY.to_string(), grid_name.to_string())]);
    with_metadata(
        vec![
            ArrowField::new("year", DataType::Int32, false),
            ArrowField::new("month", DataType::UInt8, false),
            ArrowField::new("lat", DataType::Float64, false),
            ArrowField::new("lon", DataType::Float64, false),
            ArrowField::new("value", DataType::Float64, true),
        ],
        &metadata,
    )
}

/// Schema of a layer file: `layer`, nullable `model`, `grid`, `lat`, `lon`,
/// nullable `value`, with `metadata` attached.
pub(crate) fn layer_schema(metadata: &BTreeMap<String, String>) -> Schema {
    with_metadata(
        vec![
            ArrowField::new("layer", DataType::Utf8, false),
            ArrowField::new("model", DataType::Utf8, true),
            ArrowField::new("grid", DataType::Utf8, false),
            ArrowField::new("lat", DataType::Float64, false),
            ArrowField::new("lon", DataType::Float64, false),
            ArrowField::new("value", DataType::Float64, true),
        ],
        metadata,
    )
}

/// Cell coordinates and values of `field` in row-major order.
fn cells(field: &Field) -> (Vec<f64>, Vec<f64>, Vec<Option<f64>>) {
    let grid = field.grid();
    let n = grid.nlat() * grid.nlon();
    let mut lat = Vec::with_capacity(n);
    let mut lon = Vec::with_capacity(n);
    let mut value = Vec::with_capacity(n);
    for ((j, i), &v) in field.values().indexed_iter() {
        lat.push(grid.lat()[j]);
        lon.push(grid.lon()[i]);
        value.push(v.is_finite().then_some(v));
    }
    (lat, lon, value)
}

/// Converts one time step of a series into a [`RecordBatch`].
pub(crate) fn step_to_record_batch(
    series: &FieldSeries,
    t: usize,
    schema: &Arc<Schema>,
) -> Result<RecordBatch, IoError> {
    let stamp = series.stamps()[t];
    let (lat, lon, value) = cells(&series.step(t));
    let n = lat.len();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(vec![stamp.year; n])),
        Arc::new(UInt8Array::from(vec![stamp.month; n])),
        Arc::new(Float64Array::from(lat)),
        Arc::new(Float64Array::from(lon)),
        Arc::new(Float64Array::from(value)),
    ];
    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}

/// Converts one layer into a [`RecordBatch`].
pub(crate) fn layer_to_record_batch(
    layer: &Layer,
    schema: &Arc<Schema>,
) -> Result<RecordBatch, IoError> {
    let (lat, lon, value) = cells(&layer.field);
    let n = lat.len();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![layer.name.as_str(); n])),
        Arc::new(StringArray::from(vec![layer.model.as_deref(); n])),
        Arc::new(StringArray::from(vec![layer.field.grid().name(); n])),
        Arc::new(Float64Array::from(lat)),
        Arc::new(Float64Array::from(lon)),
        Arc::new(Float64Array::from(value)),
    ];
    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}

/// Writes a sequence of [`RecordBatch`]es to a Parquet file at `path`.
///
/// # Errors
///
/// Returns [`IoError::Parquet`] if file creation, batch writing, or file
/// finalisation fails.
pub(crate) fn write_batches(
    path: &Path,
    batches: &[RecordBatch],
    schema: &Arc<Schema>,
    props: WriterProperties,
) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|e| IoError::Parquet {
        reason: format!("{}: {e}", path.display()),
    })?;
    let mut writer = ArrowWriter::try_new(file, Arc::clone(schema), Some(props))?;

    for batch in batches {
        writer.write(batch)?;
    }

    writer.close()?;
    Ok(())
}
