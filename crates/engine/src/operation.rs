//! Typed operator pipelines.
//!
//! A [`Pipeline`] is an ordered list of [`Operation`]s applied to a
//! [`FieldSeries`]. It renders to the CDO-style chain used by external
//! executors (`"timmean -seasmean -selseason,DJF"`, last operation first)
//! and is interpreted in-process by [`Pipeline::apply`].

use std::collections::BTreeMap;
use std::fmt;

use delta_field::{FieldSeries, Grid, Reduce, RemapMethod, Stamp, remap};
use delta_period::Season;
use ndarray::{Axis, Zip};

use crate::error::EngineError;

/// Annual precipitation below which the Walsh seasonality index is not
/// defined: 10 mm per year, as a mean monthly flux in kg m-2 s-1.
pub const WALSH_ANNUAL_FLOOR: f64 = 10.0 / (365.0 / 12.0 * 86_400.0);

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Keeps the months of a season; the whole-year token keeps everything.
    SelectSeason(Season),
    /// Mean per occurrence of each season (DJF attributed to the January year).
    SeasonMean,
    /// Mean per calendar year.
    YearMean,
    /// Sum per calendar year.
    YearSum,
    /// Mean over all steps.
    TimeMean,
    /// Standard deviation (N-1) over all steps.
    TimeStd1,
    /// 1 where the value is below the constant, 0 elsewhere.
    LessThan(f64),
    /// Values within `[low, high]` become missing.
    SetRangeToMissing {
        /// Lower bound, inclusive.
        low: f64,
        /// Upper bound, inclusive.
        high: f64,
    },
    /// Removes the least-squares linear trend of each cell, keeping its mean.
    Detrend,
    /// Multiplies by a constant.
    MulC(f64),
    /// Walsh seasonality index per year, from monthly precipitation.
    Seasonality,
    /// Gini index of each cell's series.
    Gini,
    /// Remaps every step onto a regular grid given by its spec (`r360x180`).
    Remap {
        /// Remapping method.
        method: RemapMethod,
        /// Target grid spec.
        grid: String,
    },
}

fn season_of_month(month: u8) -> Season {
    match month {
        12 | 1 | 2 => Season::Djf,
        3..=5 => Season::Mam,
        6..=8 => Season::Jja,
        _ => Season::Son,
    }
}

/// Gini index of the non-missing values; missing if there are none or they
/// sum to zero.
pub fn gini_index(values: &[f64]) -> f64 {
    let mut v = delta_stats::finite(values);
    let total: f64 = v.iter().sum();
    if v.is_empty() || total == 0.0 {
        return f64::NAN;
    }
    delta_stats::sort_values(&mut v);
    let n = v.len() as f64;
    let ranked: f64 = v.iter().enumerate().map(|(k, x)| (k + 1) as f64 * x).sum();
    2.0 * ranked / (n * total) - (n + 1.0) / n
}

fn collapse(series: &FieldSeries, reduce: impl Fn(&[f64]) -> f64, op: &Operation) -> Result<FieldSeries, EngineError> {
    let Some(&first) = series.stamps().first() else {
        return Err(EngineError::InvalidOperation {
            operation: op.to_string(),
            reason: "series is empty".to_string(),
        });
    };
    Ok(FieldSeries::from_fields(vec![(first, series.time_apply(reduce))])?)
}

fn walsh(series: &FieldSeries) -> Result<FieldSeries, EngineError> {
    let annual = series
        .yearly(Reduce::Mean)
        .map(|v| if 12.0 * v < WALSH_ANNUAL_FLOOR { f64::NAN } else { 12.0 * v });
    let year_index: BTreeMap<i32, usize> = annual
        .stamps()
        .iter()
        .enumerate()
        .map(|(k, s)| (s.year, k))
        .collect();
    let (grid, stamps, mut data) = series.clone().into_parts();
    for (t, stamp) in stamps.iter().enumerate() {
        let Some(&k) = year_index.get(&stamp.year) else {
            continue;
        };
        let total = annual.data().index_axis(Axis(0), k);
        Zip::from(data.index_axis_mut(Axis(0), t))
            .and(&total)
            .for_each(|v, &a| *v = (*v / a - 1.0 / 12.0).abs());
    }
    Ok(FieldSeries::new(grid, stamps, data)?.yearly(Reduce::Sum))
}

impl Operation {
    /// Applies the operation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOperation`] when reducing an empty
    /// series, and field errors from remapping.
    pub fn apply(&self, series: FieldSeries) -> Result<FieldSeries, EngineError> {
        Ok(match self {
            Operation::SelectSeason(season) if season.is_annual() => series,
            Operation::SelectSeason(season) => series.select_season(*season),
            Operation::SeasonMean => series.group_reduce(
                |s| {
                    let season = season_of_month(s.month);
                    Stamp::new(season.season_year(s.year, s.month), season.months()[0])
                },
                Reduce::Mean,
            ),
            Operation::YearMean => series.yearly(Reduce::Mean),
            Operation::YearSum => series.yearly(Reduce::Sum),
            Operation::TimeMean => collapse(&series, |v| Reduce::Mean.apply(v), self)?,
            Operation::TimeStd1 => collapse(&series, |v| Reduce::Std1.apply(v), self)?,
            Operation::LessThan(c) => series.map(|v| {
                if v.is_nan() {
                    v
                } else if v < *c {
                    1.0
                } else {
                    0.0
                }
            }),
            Operation::SetRangeToMissing { low, high } => {
                series.map(|v| if (*low..=*high).contains(&v) { f64::NAN } else { v })
            }
            Operation::Detrend => series.detrend_keep_level(),
            Operation::MulC(c) => series.map(|v| v * c),
            Operation::Seasonality => walsh(&series)?,
            Operation::Gini => collapse(&series, gini_index, self)?,
            Operation::Remap { method, grid } => {
                let target = Grid::from_spec(grid)?;
                let steps = (0..series.len())
                    .map(|t| Ok((series.stamps()[t], remap(&series.step(t), &target, *method)?)))
                    .collect::<Result<Vec<_>, EngineError>>()?;
                FieldSeries::from_fields(steps)?
            }
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SelectSeason(season) => write!(f, "selseason,{season}"),
            Operation::SeasonMean => f.write_str("seasmean"),
            Operation::YearMean => f.write_str("yearmean"),
            Operation::YearSum => f.write_str("yearsum"),
            Operation::TimeMean => f.write_str("timmean"),
            Operation::TimeStd1 => f.write_str("timstd1"),
            Operation::LessThan(c) => write!(f, "ltc,{c}"),
            Operation::SetRangeToMissing { low, high } => write!(f, "setrtomiss,{low},{high}"),
            Operation::Detrend => f.write_str("detrend"),
            Operation::MulC(c) => write!(f, "mulc,{c}"),
            Operation::Seasonality => f.write_str("seasonality"),
            Operation::Gini => f.write_str("gini"),
            Operation::Remap { method, grid } => write!(f, "{},{grid}", method.cdo_operator()),
        }
    }
}

/// Ordered operations, first applied first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    operations: Vec<Operation>,
}

impl Pipeline {
    /// An empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation.
    pub fn then(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Appends all operations of `other`.
    pub fn then_all(mut self, other: &Pipeline) -> Self {
        self.operations.extend(other.operations.iter().cloned());
        self
    }

    /// Operations in application order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns `true` if the pipeline has no operation.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Renders the pipeline as a CDO operator chain, last operation first.
    pub fn to_cdo_string(&self) -> String {
        self.operations
            .iter()
            .rev()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -")
    }

    /// Applies every operation in order.
    ///
    /// # Errors
    ///
    /// Propagates the first failing operation.
    pub fn apply(&self, series: FieldSeries) -> Result<FieldSeries, EngineError> {
        self.operations
            .iter()
            .try_fold(series, |acc, op| op.apply(acc))
    }
}

impl From<Vec<Operation>> for Pipeline {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cdo_string())
    }
}
