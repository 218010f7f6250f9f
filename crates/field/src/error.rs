//! Error types for the delta-field crate.

/// Error type for all fallible operations in the delta-field crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// Returned when grid coordinates are unusable.
    #[error("invalid grid '{name}': {reason}")]
    InvalidGrid {
        /// Grid name.
        name: String,
        /// What is wrong with the coordinates.
        reason: String,
    },

    /// Returned when a grid specification such as `r360x180` cannot be parsed.
    #[error("invalid grid specification '{spec}' (expected r<nlon>x<nlat>)")]
    InvalidGridSpec {
        /// The offending specification.
        spec: String,
    },

    /// Returned when values do not match the grid shape.
    #[error("shape mismatch: grid is {expected:?} (lat, lon), values are {got:?}")]
    ShapeMismatch {
        /// Grid shape.
        expected: (usize, usize),
        /// Shape of the values.
        got: (usize, usize),
    },

    /// Returned when two fields combined cell-wise are on different grids.
    #[error("fields are on different grids: '{left}' and '{right}'")]
    GridMismatch {
        /// Name of the first grid.
        left: String,
        /// Name of the second grid.
        right: String,
    },

    /// Returned when a series has a different number of stamps and time steps.
    #[error("series has {stamps} time stamps but {steps} time steps")]
    TimeMismatch {
        /// Number of stamps.
        stamps: usize,
        /// Number of time steps in the data.
        steps: usize,
    },

    /// Returned when a series has no time step left.
    #[error("time series is empty{context}")]
    EmptySeries {
        /// Extra context, starting with a separator.
        context: String,
    },

    /// Returned when an ensemble reduction gets no members.
    #[error("ensemble has no members")]
    EmptyEnsemble,

    /// Returned when a percentile is outside `[0, 100]`.
    #[error("percentile must be in [0, 100], got {p}")]
    InvalidPercentile {
        /// The invalid percentile.
        p: f64,
    },
}
