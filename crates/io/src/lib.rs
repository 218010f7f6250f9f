//! # delta-io
//!
//! Parquet persistence for gridded data. Two layouts are supported:
//!
//! - **series**: one field time series per file, one row per
//!   `(year, month, lat, lon)`; used for archive datasets.
//! - **layers**: any number of named fields, optionally tagged with a model,
//!   one row per `(layer, model, lat, lon)`, plus string metadata stored in
//!   the Arrow schema; used for cached ensemble bundles.
//!
//! Missing values are written as nulls and read back as `NaN`.

mod error;
mod layer;
mod parquet_read;
mod parquet_write;
mod reader;
mod writer;

pub use error::IoError;
pub use layer::Layer;
pub use reader::{read_layers, read_series};
pub use writer::{Compression, WriterConfig, write_layers, write_series};
