//! High-level Parquet writer configuration and orchestration.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use delta_field::FieldSeries;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::error::IoError;
use crate::layer::Layer;
use crate::parquet_write;

/// Compression algorithm for Parquet output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// No compression.
    None,
    /// Snappy compression (fast, moderate ratio).
    #[default]
    Snappy,
    /// Zstd compression (slower, better ratio).
    Zstd,
}

impl Compression {
    fn to_parquet(self) -> Result<parquet::basic::Compression, IoError> {
        Ok(match self {
            Self::None => parquet::basic::Compression::UNCOMPRESSED,
            Self::Snappy => parquet::basic::Compression::SNAPPY,
            Self::Zstd => {
                let level = parquet::basic::ZstdLevel::try_new(3)?;
                parquet::basic::Compression::ZSTD(level)
            }
        })
    }
}

impl std::str::FromStr for Compression {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Self::None),
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            other => Err(IoError::Validation {
                count: 1,
                details: format!("unknown compression '{other}'"),
            }),
        }
    }
}

/// Configuration for writing Parquet files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            row_group_size: 1_000_000,
        }
    }
}

impl WriterConfig {
    /// Sets the compression algorithm.
    pub fn with_compression(mut self, comp: Compression) -> Self {
        self.compression = comp;
        self
    }

    /// Sets the maximum number of rows per row group.
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Compression algorithm.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Maximum number of rows per row group.
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if `row_group_size` is zero.
    pub fn validate(&self) -> Result<(), IoError> {
        if self.row_group_size == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "row_group_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    fn properties(&self) -> Result<WriterProperties, IoError> {
        self.validate()?;
        Ok(WriterProperties::builder()
            .set_compression(self.compression.to_parquet()?)
            .set_max_row_group_size(self.row_group_size)
            .build())
    }
}

/// Writes a field time series to a Parquet file, one batch per time step.
///
/// # Errors
///
/// Returns [`IoError::Validation`] if the configuration is invalid, or
/// [`IoError::Parquet`] if batch conversion or file I/O fails.
pub fn write_series(path: &Path, series: &FieldSeries, config: &WriterConfig) -> Result<(), IoError> {
    let props = config.properties()?;
    let schema = Arc::new(parquet_write::series_schema(series.grid().name()));
    let batches = (0..series.len())
        .map(|t| parquet_write::step_to_record_batch(series, t, &schema))
        .collect::<Result<Vec<_>, _>>()?;
    parquet_write::write_batches(path, &batches, &schema, props)?;
    debug!(path = %path.display(), steps = series.len(), "wrote series");
    Ok(())
}

/// Writes named layers and string metadata to a Parquet file.
///
/// Layers keep their order; `(name, model)` pairs must be unique.
///
/// # Errors
///
/// Returns [`IoError::Validation`] if the configuration is invalid or a
/// `(name, model)` pair repeats, or [`IoError::Parquet`] if batch conversion
/// or file I/O fails.
pub fn write_layers(
    path: &Path,
    layers: &[Layer],
    metadata: &BTreeMap<String, String>,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let props = config.properties()?;
    let mut seen = std::collections::BTreeSet::new();
    let duplicates: Vec<String> = layers
        .iter()
        .filter(|l| !seen.insert((l.name.as_str(), l.model.as_deref())))
        .map(|l| format!("{}/{}", l.name, l.model.as_deref().unwrap_or("-")))
        .collect();
    if !duplicates.is_empty() {
        return Err(IoError::Validation {
            count: duplicates.len(),
            details: format!("duplicate layers: {}", duplicates.join("; ")),
        });
    }

    let schema = Arc::new(parquet_write::layer_schema(metadata));
    let batches = layers
        .iter()
        .map(|l| parquet_write::layer_to_record_batch(l, &schema))
        .collect::<Result<Vec<_>, _>>()?;
    parquet_write::write_batches(path, &batches, &schema, props)?;
    debug!(path = %path.display(), layers = layers.len(), "wrote layers");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = WriterConfig::default();
        assert_eq!(config.compression(), Compression::Snappy);
        assert_eq!(config.row_group_size(), 1_000_000);
    }

    #[test]
    fn builder_methods() {
        let config = WriterConfig::default()
            .with_compression(Compression::Zstd)
            .with_row_group_size(500);
        assert_eq!(config.compression(), Compression::Zstd);
        assert_eq!(config.row_group_size(), 500);
    }

    #[test]
    fn validate_zero_row_group_size() {
        let config = WriterConfig::default().with_row_group_size(0);
        match config.validate().unwrap_err() {
            IoError::Validation { count, details } => {
                assert_eq!(count, 1);
                assert!(details.contains("row_group_size"));
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn compression_from_str() {
        assert_eq!("ZSTD".parse::<Compression>().unwrap(), Compression::Zstd);
        assert_eq!("none".parse::<Compression>().unwrap(), Compression::None);
        assert!("lz4".parse::<Compression>().is_err());
    }
}
