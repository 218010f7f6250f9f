//! Model inclusion and exclusion lists.

use std::collections::BTreeSet;

/// Which models a selection may return.
///
/// Excluded models are never returned, even when also included. An empty
/// inclusion list means "all models".
///
/// # Example
///
/// ```
/// use delta_select::SelectionConfig;
///
/// let config = SelectionConfig::default()
///     .with_excluded(["CIESM"])
///     .with_included(["CNRM-CM6-1", "CIESM"]);
/// assert!(config.allows("CNRM-CM6-1"));
/// assert!(!config.allows("CIESM"));
/// assert!(!config.allows("IPSL-CM6A-LR"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionConfig {
    excluded: BTreeSet<String>,
    included: BTreeSet<String>,
}

impl SelectionConfig {
    /// Sets the excluded models.
    pub fn with_excluded<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = models.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts the selection to these models. Empty means no restriction.
    pub fn with_included<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included = models.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the excluded models.
    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.excluded
    }

    /// Returns the included models (empty for all).
    pub fn included(&self) -> &BTreeSet<String> {
        &self.included
    }

    /// Returns `true` if `model` may be selected.
    pub fn allows(&self, model: &str) -> bool {
        !self.excluded.contains(model) && (self.included.is_empty() || self.included.contains(model))
    }
}
