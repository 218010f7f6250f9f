//! Error types for the delta-select crate.

use delta_catalog::CatalogError;

/// Error type for all fallible operations in the delta-select crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectError {
    /// Catalog lookup error.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Returned when the realization preference cannot pick a single label.
    #[error("ambiguous variant for {model}: {}", candidates.join(", "))]
    AmbiguousVariant {
        /// Model concerned.
        model: String,
        /// Competing realization labels.
        candidates: Vec<String>,
    },

    /// Returned when a realization label is not of the `r<N>i<N>p<N>[f<N>]` form.
    #[error("invalid variant label: '{label}'")]
    InvalidVariant {
        /// The offending label.
        label: String,
    },

    /// Returned when a model has no realization to choose from.
    #[error("no realization available for {model}")]
    NoVariant {
        /// Model concerned.
        model: String,
    },

    /// Returned when no constraint is given.
    #[error("at least one (experiment, variable, table) constraint is required")]
    NoConstraints,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_ambiguous_variant() {
        let e = SelectError::AmbiguousVariant {
            model: "M".to_string(),
            candidates: vec!["r1i1p1f2".to_string(), "r1i1p1f3".to_string()],
        };
        assert_eq!(e.to_string(), "ambiguous variant for M: r1i1p1f2, r1i1p1f3");
    }

    #[test]
    fn display_invalid_variant() {
        let e = SelectError::InvalidVariant {
            label: "run1".to_string(),
        };
        assert_eq!(e.to_string(), "invalid variant label: 'run1'");
    }

    #[test]
    fn catalog_error_is_transparent() {
        let e: SelectError = CatalogError::UnknownExperiment {
            experiment: "amip".into(),
        }
        .into();
        assert_eq!(e.to_string(), "cannot tell which MIP defines experiment 'amip'");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<SelectError>();
    }
}
