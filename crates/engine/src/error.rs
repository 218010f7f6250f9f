//! Error types for delta-engine.

use delta_catalog::CatalogError;
use delta_field::FieldError;
use delta_io::IoError;
use delta_period::PeriodError;

/// Errors raised while building or running statistics on datasets.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A period, season or sampling argument was invalid.
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// A field operation failed.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Reading an archive dataset failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// The control run of a model is too short for the requested sampling.
    #[error("control run of {model} is too short: {source}")]
    InsufficientData {
        /// Model whose control run is too short.
        model: String,
        /// Sampler error carrying the available window and the shortfall.
        #[source]
        source: PeriodError,
    },

    /// The derivation cannot be combined with the requested statistic.
    #[error("derivation '{derivation}' is not supported for {statistic}: {reason}")]
    UnsupportedDerivation {
        /// Derivation label.
        derivation: String,
        /// Statistic that was requested.
        statistic: &'static str,
        /// Why the combination is rejected.
        reason: String,
    },

    /// No derivation is registered under this label.
    #[error("unknown derivation '{label}'")]
    UnknownDerivation {
        /// Requested label.
        label: String,
    },

    /// A derivation with this label is already registered.
    #[error("derivation '{label}' is already registered")]
    DuplicateDerivation {
        /// Duplicated label.
        label: String,
    },

    /// The executor does not hold the dataset.
    #[error("dataset {key} is not available")]
    DatasetUnavailable {
        /// Display form of the dataset key.
        key: String,
    },

    /// The dataset holds no time step inside the requested period.
    #[error("dataset {key} has no data in the requested period")]
    EmptyDataset {
        /// Display form of the dataset key.
        key: String,
    },

    /// A pipeline expected to reduce time to one step did not.
    #[error("pipeline '{pipeline}' on {key} gave {steps} time steps instead of one")]
    NotReduced {
        /// Rendered pipeline.
        pipeline: String,
        /// Display form of the dataset key.
        key: String,
        /// Number of steps produced.
        steps: usize,
    },

    /// An operation could not be applied.
    #[error("cannot apply '{operation}': {reason}")]
    InvalidOperation {
        /// Rendered operation.
        operation: String,
        /// What went wrong.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use delta_period::YearRange;

    #[test]
    fn display_unsupported_derivation() {
        let err = EngineError::UnsupportedDerivation {
            derivation: "dry".to_string(),
            statistic: "inter-annual variability",
            reason: "it has a per-year operator".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "derivation 'dry' is not supported for inter-annual variability: it has a per-year operator"
        );
    }

    #[test]
    fn insufficient_data_keeps_the_sampler_error() {
        let available = YearRange::new(2000, 2050).unwrap();
        let err = EngineError::InsufficientData {
            model: "ModelX".to_string(),
            source: PeriodError::InsufficientData {
                available,
                needed: 100,
                shortfall: 49,
            },
        };
        assert!(err.to_string().starts_with("control run of ModelX is too short"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn display_not_reduced() {
        let err = EngineError::NotReduced {
            pipeline: "yearmean".to_string(),
            key: "k".to_string(),
            steps: 30,
        };
        assert_eq!(
            err.to_string(),
            "pipeline 'yearmean' on k gave 30 time steps instead of one"
        );
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<EngineError>();
    }
}
