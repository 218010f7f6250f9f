//! Error types for delta-aggregate.

use delta_catalog::CatalogError;
use delta_engine::EngineError;
use delta_field::FieldError;
use delta_period::PeriodError;
use delta_select::SelectError;
use delta_stats::StatsError;

/// Errors raised while aggregating per-model changes into ensemble fields.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// A per-model statistic failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A field operation failed.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Model selection failed.
    #[error(transparent)]
    Select(#[from] SelectError),

    /// A scalar ensemble statistic failed.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// A period or sampling argument was invalid.
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// The aggregation settings are inconsistent.
    #[error("invalid aggregate configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// A field kind name is not recognised.
    #[error("unknown field kind '{name}'")]
    UnknownFieldKind {
        /// The unrecognised name.
        name: String,
    },

    /// A field was stored with the wrong shape for its kind.
    #[error("field kind '{kind}' holds {expected} results")]
    KindMismatch {
        /// Field kind name.
        kind: String,
        /// The shape the kind requires.
        expected: &'static str,
    },

    /// No model set was provided for an experiment.
    #[error("no model set for experiment '{experiment}'")]
    NoModels {
        /// Experiment name.
        experiment: String,
    },

    /// Diagnostics could not be serialized.
    #[error("cannot serialize diagnostics: {reason}")]
    Serialize {
        /// Serializer message.
        reason: String,
    },
}

impl AggregateError {
    /// Returns `true` for failures that only concern one model, after which
    /// the ensemble proceeds without it.
    pub fn is_per_model(&self) -> bool {
        matches!(self, AggregateError::Engine(EngineError::InsufficientData { .. }))
    }
}

impl From<serde_json::Error> for AggregateError {
    fn from(e: serde_json::Error) -> Self {
        AggregateError::Serialize { reason: e.to_string() }
    }
}
