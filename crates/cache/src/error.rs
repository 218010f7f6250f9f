//! Error types for delta-cache.

use std::path::PathBuf;

use delta_aggregate::AggregateError;
use delta_io::IoError;

/// Errors raised by the ensemble cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading or writing a cache file failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// A cached layer could not be put back into a bundle.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// The requested fields are not in the cache; callers recompute them.
    #[error("cache miss for {what}")]
    Miss {
        /// What was looked up.
        what: String,
    },

    /// A tag cannot be embedded in a file name.
    #[error("invalid cache tag '{tag}': {reason}")]
    InvalidTag {
        /// The rejected tag.
        tag: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A bundle key label cannot be embedded in a file name.
    #[error("cannot cache {field} '{value}': {reason}")]
    InvalidLabel {
        /// Which key field holds the label.
        field: &'static str,
        /// The rejected label.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A file name does not follow the cache naming scheme.
    #[error("not a cache entry name: '{name}' ({reason})")]
    InvalidEntryName {
        /// The file name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Listing or creating the cache directory failed.
    #[error("cache directory {}: {reason}", path.display())]
    Directory {
        /// Directory path.
        path: PathBuf,
        /// Operating system message.
        reason: String,
    },
}

impl CacheError {
    /// Returns `true` for a cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_miss() {
        let e = CacheError::Miss {
            what: "pr/ssp585/DJF/mean_change/plain".to_string(),
        };
        assert_eq!(e.to_string(), "cache miss for pr/ssp585/DJF/mean_change/plain");
        assert!(e.is_miss());
    }

    #[test]
    fn display_invalid_tag() {
        let e = CacheError::InvalidTag {
            tag: "a=b".to_string(),
            reason: "contains '='".to_string(),
        };
        assert_eq!(e.to_string(), "invalid cache tag 'a=b': contains '='");
        assert!(!e.is_miss());
    }

    #[test]
    fn display_directory() {
        let e = CacheError::Directory {
            path: PathBuf::from("/tmp/cache"),
            reason: "permission denied".to_string(),
        };
        assert_eq!(e.to_string(), "cache directory /tmp/cache: permission denied");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<CacheError>();
    }
}
