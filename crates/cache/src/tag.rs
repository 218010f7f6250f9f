//! Tags identifying an ensemble in cache file names.

use std::fmt;

use delta_select::ModelVariantSet;
use sha2::{Digest, Sha256};

use crate::error::CacheError;

/// Catalog tag plus a short digest of the (model, realization) pairs of an
/// ensemble, e.g. `20230101_3fa2c01e`.
///
/// Changing the catalog tag or any pair changes the tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheTag(String);

impl CacheTag {
    /// Derives the tag of an ensemble selected from the catalog `catalog_tag`.
    ///
    /// The digest is the first 8 hex digits of the SHA-256 of
    /// `"{model}{realization}_"` concatenated over the pairs in model order.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidTag`] if `catalog_tag` cannot be part of
    /// a file name.
    pub fn derive(catalog_tag: &str, models: &ModelVariantSet) -> Result<Self, CacheError> {
        let mut hasher = Sha256::new();
        for (model, realization) in models.as_str_pairs() {
            hasher.update(format!("{model}{realization}_").as_bytes());
        }
        let digest = hex::encode(hasher.finalize());
        Self::parse(&format!("{catalog_tag}_{}", &digest[..8]))
    }

    /// Wraps an existing tag.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidTag`] for an empty tag or one holding
    /// the field delimiter `=` or a path separator.
    pub fn parse(tag: &str) -> Result<Self, CacheError> {
        match unfit_for_file_name(tag) {
            Some(reason) => Err(CacheError::InvalidTag {
                tag: tag.to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(Self(tag.to_string())),
        }
    }

    /// Returns the tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Why `text` cannot be one field of a cache file name, if it cannot.
pub(crate) fn unfit_for_file_name(text: &str) -> Option<&'static str> {
    if text.is_empty() {
        Some("empty")
    } else if text.contains('=') {
        Some("contains '='")
    } else if text.contains(['/', '\\']) {
        Some("contains a path separator")
    } else {
        None
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
