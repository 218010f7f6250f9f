//! Error types for the delta-period crate.

use crate::range::YearRange;

/// Error type for all fallible operations in the delta-period crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PeriodError {
    /// Returned when a season token is not recognised.
    #[error("unknown season: '{token}' (expected ANN, DJF, MAM, JJA or SON)")]
    UnknownSeason {
        /// The unrecognised token.
        token: String,
    },

    /// Returned when a period string cannot be parsed.
    #[error("invalid period '{text}': {reason}")]
    InvalidPeriod {
        /// The offending text.
        text: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Returned when a year range ends before it starts.
    #[error("year range {start}-{end} ends before it starts")]
    ReversedRange {
        /// First year.
        start: i32,
        /// Last year.
        end: i32,
    },

    /// Returned when a sampling configuration is not usable.
    #[error("invalid sampling configuration: {reason}")]
    InvalidSampling {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// Returned when the available window cannot host all slices, even with
    /// the shift fully relaxed.
    #[error(
        "available period {available} is too short for {needed} years even with no shift \
         ({shortfall} years missing)"
    )]
    InsufficientData {
        /// The available window.
        available: YearRange,
        /// Number of years required (`nyears * number`).
        needed: u32,
        /// Number of years missing.
        shortfall: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_season() {
        let e = PeriodError::UnknownSeason {
            token: "XYZ".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "unknown season: 'XYZ' (expected ANN, DJF, MAM, JJA or SON)"
        );
    }

    #[test]
    fn display_insufficient_data() {
        let e = PeriodError::InsufficientData {
            available: YearRange::new(2000, 2050).unwrap(),
            needed: 100,
            shortfall: 49,
        };
        assert_eq!(
            e.to_string(),
            "available period 2000-2050 is too short for 100 years even with no shift (49 years missing)"
        );
    }

    #[test]
    fn display_reversed_range() {
        let e = PeriodError::ReversedRange {
            start: 2010,
            end: 2000,
        };
        assert_eq!(e.to_string(), "year range 2010-2000 ends before it starts");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<PeriodError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<PeriodError>();
    }
}
