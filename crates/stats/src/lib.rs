//! # delta-stats
//!
//! Scalar statistics behind the ensemble change computations: sample
//! moments, type-7 quantiles, least-squares trends and the ensemble
//! statistics used to summarise regional changes across models.
//!
//! Missing values are `NaN` throughout the workspace. The functions here
//! take plain slices; callers drop missing values with [`finite`] when a
//! statistic must skip them.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `moments` | Mean, N-1 variance and sd, quantiles, median |
//! | `trend` | Linear trend and level-preserving detrend |
//! | `ensemble` | `EnsembleStat` across model values |
//! | `error` | Error types |

mod ensemble;
mod error;
mod moments;
mod trend;

pub use ensemble::{EnsembleStat, ensemble_stat};
pub use error::StatsError;
pub use moments::{finite, mean, median, quantile_type7, sd, sort_values, variance};
pub use trend::{LinearTrend, detrend_keep_level, linear_trend};
