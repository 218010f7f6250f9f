//! Error types for the delta-catalog crate.

/// Error type for all fallible operations in the delta-catalog crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    /// Returned when a lookup misses one level of the catalog.
    #[error("catalog has no {level} '{key}' under {path}")]
    NotFound {
        /// Name of the missing level (`experiment`, `variable`, ...).
        level: &'static str,
        /// The key that was looked up.
        key: String,
        /// Slash-joined keys of the levels above, or `/` at the root.
        path: String,
    },

    /// Returned when the catalog file cannot be read.
    #[error("cannot read catalog file {path}: {reason}")]
    Read {
        /// Path of the catalog file.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },

    /// Returned when the catalog document is malformed.
    #[error("malformed catalog '{tag}': {reason}")]
    Parse {
        /// Tag of the catalog.
        tag: String,
        /// Parser error message.
        reason: String,
    },

    /// Returned when an entry has an unusable period.
    #[error("catalog entry {path} has an invalid period: {reason}")]
    InvalidEntry {
        /// Slash-joined location of the entry.
        path: String,
        /// Why the period was rejected.
        reason: String,
    },

    /// Returned when a dataset needs a period the catalog does not record.
    #[error("catalog entry {path} has no available period")]
    MissingPeriod {
        /// Slash-joined location of the entry.
        path: String,
    },

    /// Returned when an experiment is not attached to a known MIP.
    #[error("cannot tell which MIP defines experiment '{experiment}'")]
    UnknownExperiment {
        /// The experiment name.
        experiment: String,
    },
}
