//! High-level Parquet readers.

use std::collections::BTreeMap;
use std::path::Path;

use arrow::array::Array;
use arrow::datatypes::{Float64Type, Int32Type, UInt8Type};
use delta_field::{Field, FieldSeries, Grid, Stamp};
use ndarray::{Array2, Array3};
use tracing::debug;

use crate::error::IoError;
use crate::layer::Layer;
use crate::parquet_read::{self, CellGrid};
use crate::parquet_write::GRID_KEY;

struct Cells {
    lat: Vec<f64>,
    lon: Vec<f64>,
    value: Vec<f64>,
}

impl Cells {
    fn new() -> Self {
        Self {
            lat: Vec::new(),
            lon: Vec::new(),
            value: Vec::new(),
        }
    }

    fn push(&mut self, lat: f64, lon: f64, value: f64) {
        self.lat.push(lat);
        self.lon.push(lon);
        self.value.push(value);
    }
}

fn duplicate(path: &Path, what: String) -> IoError {
    IoError::Validation {
        count: 1,
        details: format!("duplicate cell {what} in {}", path.display()),
    }
}

/// Reads a field time series written by
/// [`write_series`](crate::write_series).
///
/// Steps come out sorted by stamp.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::Parquet`],
/// [`IoError::MissingColumn`] for malformed files, [`IoError::Validation`]
/// for a repeated cell, and [`IoError::Field`] for an invalid grid.
pub fn read_series(path: &Path) -> Result<FieldSeries, IoError> {
    let (batches, metadata) = parquet_read::read_batches(path)?;
    let mut steps: BTreeMap<Stamp, Cells> = BTreeMap::new();
    for batch in &batches {
        let year = parquet_read::primitive::<Int32Type>(batch, "year", path)?;
        let month = parquet_read::primitive::<UInt8Type>(batch, "month", path)?;
        let lat = parquet_read::primitive::<Float64Type>(batch, "lat", path)?;
        let lon = parquet_read::primitive::<Float64Type>(batch, "lon", path)?;
        let value = parquet_read::values(batch, path)?;
        for k in 0..batch.num_rows() {
            steps
                .entry(Stamp::new(year.value(k), month.value(k)))
                .or_insert_with(Cells::new)
                .push(lat.value(k), lon.value(k), value[k]);
        }
    }

    let all_lat: Vec<f64> = steps.values().flat_map(|c| c.lat.iter().copied()).collect();
    let all_lon: Vec<f64> = steps.values().flat_map(|c| c.lon.iter().copied()).collect();
    let cells = CellGrid::from_coordinates(&all_lat, &all_lon);
    let name = metadata.get(GRID_KEY).map_or("unnamed", String::as_str);

    let mut data = Array3::from_elem((steps.len(), cells.lat.len(), cells.lon.len()), f64::NAN);
    for (t, (stamp, step)) in steps.iter().enumerate() {
        let mut filled = Array2::from_elem((cells.lat.len(), cells.lon.len()), false);
        for ((&la, &lo), &v) in step.lat.iter().zip(&step.lon).zip(&step.value) {
            if let Some((j, i)) = cells.index(la, lo) {
                if std::mem::replace(&mut filled[[j, i]], true) {
                    return Err(duplicate(path, format!("({la}, {lo}) at {stamp:?}")));
                }
                data[[t, j, i]] = v;
            }
        }
    }
    let stamps: Vec<Stamp> = steps.into_keys().collect();
    let grid = Grid::new(name, cells.lat, cells.lon)?;
    debug!(path = %path.display(), steps = stamps.len(), "read series");
    Ok(FieldSeries::new(grid, stamps, data)?)
}

/// Reads layers and metadata written by [`write_layers`](crate::write_layers).
///
/// Layers come out in file order; each is rebuilt on the distinct
/// coordinates of its own cells.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::Parquet`],
/// [`IoError::MissingColumn`] for malformed files, [`IoError::Validation`]
/// for a repeated cell, and [`IoError::Field`] for an invalid grid.
pub fn read_layers(path: &Path) -> Result<(Vec<Layer>, BTreeMap<String, String>), IoError> {
    let (batches, metadata) = parquet_read::read_batches(path)?;
    let mut order: Vec<(String, Option<String>, String)> = Vec::new();
    let mut groups: BTreeMap<(String, Option<String>), Cells> = BTreeMap::new();
    for batch in &batches {
        let layer = parquet_read::utf8(batch, "layer", path)?;
        let model = parquet_read::utf8(batch, "model", path)?;
        let grid = parquet_read::utf8(batch, "grid", path)?;
        let lat = parquet_read::primitive::<Float64Type>(batch, "lat", path)?;
        let lon = parquet_read::primitive::<Float64Type>(batch, "lon", path)?;
        let value = parquet_read::values(batch, path)?;
        for k in 0..batch.num_rows() {
            let key = (
                layer.value(k).to_string(),
                (!model.is_null(k)).then(|| model.value(k).to_string()),
            );
            let cells = groups.entry(key.clone()).or_insert_with(|| {
                order.push((key.0.clone(), key.1.clone(), grid.value(k).to_string()));
                Cells::new()
            });
            cells.push(lat.value(k), lon.value(k), value[k]);
        }
    }

    let mut layers = Vec::with_capacity(order.len());
    for (name, model, grid_name) in order {
        let Some(cells) = groups.remove(&(name.clone(), model.clone())) else {
            continue;
        };
        let index = CellGrid::from_coordinates(&cells.lat, &cells.lon);
        let mut values = Array2::from_elem((index.lat.len(), index.lon.len()), f64::NAN);
        let mut filled = Array2::from_elem(values.dim(), false);
        for ((&la, &lo), &v) in cells.lat.iter().zip(&cells.lon).zip(&cells.value) {
            if let Some((j, i)) = index.index(la, lo) {
                if std::mem::replace(&mut filled[[j, i]], true) {
                    return Err(duplicate(path, format!("({la}, {lo}) in layer {name}")));
                }
                values[[j, i]] = v;
            }
        }
        let grid = Grid::new(&grid_name, index.lat, index.lon)?;
        layers.push(Layer {
            name,
            model,
            field: Field::new(grid, values)?,
        });
    }
    debug!(path = %path.display(), layers = layers.len(), "read layers");
    Ok((layers, metadata))
}
