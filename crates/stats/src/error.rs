//! Error types for the delta-stats crate.

/// Error type for all fallible operations in the delta-stats crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    /// Returned when an ensemble has no members.
    #[error("ensemble is empty")]
    EmptyEnsemble,

    /// Returned when a statistic needs more members than available.
    #[error("statistic '{stat}' needs at least {min} members, got {n}")]
    TooFewMembers {
        /// Name of the requested statistic.
        stat: String,
        /// Minimum number of members.
        min: usize,
        /// Actual number of members.
        n: usize,
    },

    /// Returned when a statistic name cannot be parsed.
    #[error("unknown ensemble statistic: {name}")]
    UnknownStatistic {
        /// The unrecognised name.
        name: String,
    },

    /// Returned when a percentile is outside `(0, 100)`.
    #[error("percentile must be in (0, 100), got {p}")]
    InvalidPercentile {
        /// The invalid percentile.
        p: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_empty_ensemble() {
        assert_eq!(StatsError::EmptyEnsemble.to_string(), "ensemble is empty");
    }

    #[test]
    fn display_too_few_members() {
        let e = StatsError::TooFewMembers {
            stat: "second".to_string(),
            min: 2,
            n: 1,
        };
        assert_eq!(
            e.to_string(),
            "statistic 'second' needs at least 2 members, got 1"
        );
    }

    #[test]
    fn display_unknown_statistic() {
        let e = StatsError::UnknownStatistic {
            name: "lq42".to_string(),
        };
        assert_eq!(e.to_string(), "unknown ensemble statistic: lq42");
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<StatsError>();
    }
}
