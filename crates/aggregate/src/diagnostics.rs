//! Per-model statistics and notes collected during an aggregation.

use delta_period::Season;
use serde::{Deserialize, Serialize};

use crate::aggregator::Stage;
use crate::error::AggregateError;

/// Area-weighted summary of one model's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatistics {
    pub experiment: String,
    pub season: Season,
    pub model: String,
    pub realization: String,
    /// Area mean of the reference statistic.
    pub reference_mean: Option<f64>,
    /// Area mean of the projection statistic.
    pub projection_mean: Option<f64>,
    /// Area mean of the change.
    pub change_mean: Option<f64>,
    /// Median over cells of the relative change.
    pub rchange_median: Option<f64>,
    /// Area mean of the standardized change.
    pub schange_mean: Option<f64>,
}

/// A model left out of one part of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedModel {
    pub experiment: String,
    pub season: Season,
    pub model: String,
    /// `changes` or `variability`.
    pub stage: String,
    pub reason: String,
}

/// Changes and variability model sets with no model in common, so that
/// normalized changes and AR6 masks could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingCommonModels {
    pub experiment: String,
    pub season: Season,
    pub changes_models: Vec<String>,
    pub variability_models: Vec<String>,
}

/// Outcome of one (experiment, season) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub experiment: String,
    pub season: Season,
    /// Models contributing to the changes.
    pub models: usize,
    /// Models contributing to the variability.
    pub variability_models: usize,
    /// Masks computed during the session.
    pub masks: Vec<String>,
    /// Last stage reached.
    pub stage: Stage,
    /// `true` if no ensemble field could be produced.
    pub degraded: bool,
}

/// Everything noted during an aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub models: Vec<ModelStatistics>,
    pub skipped: Vec<SkippedModel>,
    pub missing_common: Vec<MissingCommonModels>,
    pub sessions: Vec<SessionSummary>,
}

impl Diagnostics {
    /// Returns `true` if any model was skipped or any session degraded.
    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty()
            || !self.missing_common.is_empty()
            || self.sessions.iter().any(|s| s.degraded)
    }

    /// Pretty-printed JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String, AggregateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
