//! Statistics across an ensemble of scalar values (one value per model).

use std::collections::BTreeMap;
use std::str::FromStr;

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::StatsError;

/// A statistic computed across the members of a scalar ensemble.
///
/// String forms (see [`FromStr`]): `mean`, `min`, `max`, `second`,
/// `butlast`, `median` or `mdn`, `lq<p>` (empirical percentile with linear
/// interpolation, e.g. `lq5`), `nq<p>` (percentile under a normal
/// approximation, e.g. `nq95`). Any other string names a single member.
#[derive(Debug, Clone, PartialEq)]
pub enum EnsembleStat {
    /// Arithmetic mean of the members.
    Mean,
    /// Smallest member value.
    Min,
    /// Largest member value.
    Max,
    /// Second smallest member value.
    Second,
    /// Second largest member value.
    ButLast,
    /// Median with linear interpolation.
    Median,
    /// Empirical percentile (0-100) with linear interpolation.
    LinearPercentile(f64),
    /// Percentile (0-100) of a normal law fitted with the N-1 standard deviation.
    NormalPercentile(f64),
    /// The value of one named member.
    Member(String),
}

impl FromStr for EnsembleStat {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stat = match s {
            "mean" => Self::Mean,
            "min" => Self::Min,
            "max" => Self::Max,
            "second" => Self::Second,
            "butlast" => Self::ButLast,
            "median" | "mdn" => Self::Median,
            _ => {
                if let Some(p) = s.strip_prefix("lq").and_then(|r| r.parse::<f64>().ok()) {
                    Self::LinearPercentile(check_percentile(p)?)
                } else if let Some(p) = s.strip_prefix("nq").and_then(|r| r.parse::<f64>().ok()) {
                    Self::NormalPercentile(check_percentile(p)?)
                } else if s.is_empty() {
                    return Err(StatsError::UnknownStatistic {
                        name: s.to_string(),
                    });
                } else {
                    Self::Member(s.to_string())
                }
            }
        };
        Ok(stat)
    }
}

fn check_percentile(p: f64) -> Result<f64, StatsError> {
    if p > 0.0 && p < 100.0 {
        Ok(p)
    } else {
        Err(StatsError::InvalidPercentile { p })
    }
}

/// Computes `stat` across the ensemble `members` (member name -> value).
///
/// # Errors
///
/// Returns [`StatsError::EmptyEnsemble`] for an empty ensemble,
/// [`StatsError::TooFewMembers`] when an order statistic needs more members
/// than available, and [`StatsError::UnknownStatistic`] when a named member
/// is absent.
pub fn ensemble_stat(members: &BTreeMap<String, f64>, stat: &EnsembleStat) -> Result<f64, StatsError> {
    if members.is_empty() {
        return Err(StatsError::EmptyEnsemble);
    }
    let mut sorted: Vec<f64> = members.values().copied().collect();
    crate::sort_values(&mut sorted);
    let n = sorted.len();

    let value = match stat {
        EnsembleStat::Mean => crate::mean(&sorted),
        EnsembleStat::Min => sorted[0],
        EnsembleStat::Max => sorted[n - 1],
        EnsembleStat::Second | EnsembleStat::ButLast => {
            if n < 2 {
                return Err(StatsError::TooFewMembers {
                    stat: format!("{stat:?}").to_lowercase(),
                    min: 2,
                    n,
                });
            }
            if *stat == EnsembleStat::Second {
                sorted[1]
            } else {
                sorted[n - 2]
            }
        }
        EnsembleStat::Median => crate::quantile_type7(&sorted, 0.5),
        EnsembleStat::LinearPercentile(p) => crate::quantile_type7(&sorted, p / 100.0),
        EnsembleStat::NormalPercentile(p) => {
            if n < 2 {
                return Err(StatsError::TooFewMembers {
                    stat: format!("nq{p}"),
                    min: 2,
                    n,
                });
            }
            let z = standard_normal_quantile(p / 100.0)?;
            crate::mean(&sorted) + z * crate::sd(&sorted)
        }
        EnsembleStat::Member(name) => {
            *members
                .get(name)
                .ok_or_else(|| StatsError::UnknownStatistic { name: name.clone() })?
        }
    };
    Ok(value)
}

fn standard_normal_quantile(p: f64) -> Result<f64, StatsError> {
    let normal = Normal::new(0.0, 1.0).map_err(|_| StatsError::InvalidPercentile { p: p * 100.0 })?;
    Ok(normal.inverse_cdf(p))
}
