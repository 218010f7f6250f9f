//! Error types for delta-io.

use std::path::PathBuf;

use delta_field::FieldError;

/// Error type for all fallible operations in the delta-io crate.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error originating from the Parquet or Arrow libraries, or
    /// from file I/O underneath them.
    #[error("parquet error: {reason}")]
    Parquet {
        /// Description of the underlying failure.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when a required column is absent or has the wrong type.
    #[error("column '{name}' missing or mistyped in {}", path.display())]
    MissingColumn {
        /// Column name.
        name: String,
        /// File that was inspected.
        path: PathBuf,
    },

    /// The decoded values do not form a valid field.
    #[error(transparent)]
    Field(#[from] FieldError),
}

impl From<parquet::errors::ParquetError> for IoError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<arrow::error::ArrowError> for IoError {
    fn from(e: arrow::error::ArrowError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}
