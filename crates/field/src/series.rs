//! Time series of fields on one grid.

use std::collections::BTreeMap;

use delta_period::{Season, YearRange};
use ndarray::{Array2, Array3, ArrayView1, Axis};

use crate::error::FieldError;
use crate::field::Field;
use crate::grid::Grid;

/// Year and month of a time step.
///
/// Daily series carry several steps with the same stamp; reduced series
/// carry the stamp of their group (January for yearly groups, the first
/// month of the season for seasonal groups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stamp {
    /// Calendar year.
    pub year: i32,
    /// Month, 1..=12.
    pub month: u8,
}

impl Stamp {
    /// Creates a stamp.
    pub fn new(year: i32, month: u8) -> Self {
        Self { year, month }
    }

    /// Key grouping all steps of the same year.
    pub fn yearly(&self) -> Stamp {
        Stamp::new(self.year, 1)
    }

    /// Key grouping all steps of the same year and month.
    pub fn monthly(&self) -> Stamp {
        *self
    }
}

/// Cell-wise reduction of a set of values; missing values are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    /// Mean of the non-missing values, missing if none.
    Mean,
    /// Sum of the non-missing values, missing if none.
    Sum,
    /// Standard deviation with N-1 denominator, missing below two values.
    Std1,
}

impl Reduce {
    /// Applies the reduction to `values`.
    pub fn apply(self, values: &[f64]) -> f64 {
        let finite = delta_stats::finite(values);
        match self {
            Reduce::Mean if !finite.is_empty() => delta_stats::mean(&finite),
            Reduce::Sum if !finite.is_empty() => finite.iter().sum(),
            Reduce::Std1 if finite.len() >= 2 => delta_stats::sd(&finite),
            _ => f64::NAN,
        }
    }
}

/// Fields on one grid, indexed `[time, lat, lon]`, with one stamp per step.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSeries {
    grid: Grid,
    stamps: Vec<Stamp>,
    data: Array3<f64>,
}

impl FieldSeries {
    /// Creates a series.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TimeMismatch`] if the number of stamps differs
    /// from the number of steps, and [`FieldError::ShapeMismatch`] if the
    /// spatial dimensions do not match the grid.
    pub fn new(grid: Grid, stamps: Vec<Stamp>, data: Array3<f64>) -> Result<Self, FieldError> {
        let (nt, nlat, nlon) = data.dim();
        if nt != stamps.len() {
            return Err(FieldError::TimeMismatch {
                stamps: stamps.len(),
                steps: nt,
            });
        }
        if (nlat, nlon) != grid.shape() {
            return Err(FieldError::ShapeMismatch {
                expected: grid.shape(),
                got: (nlat, nlon),
            });
        }
        Ok(Self { grid, stamps, data })
    }

    /// Stacks fields sharing one grid into a series.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::EmptySeries`] without steps and
    /// [`FieldError::GridMismatch`] if the grids differ.
    pub fn from_fields(steps: Vec<(Stamp, Field)>) -> Result<Self, FieldError> {
        let Some((_, first)) = steps.first() else {
            return Err(FieldError::EmptySeries {
                context: String::new(),
            });
        };
        let grid = first.grid().clone();
        let (nlat, nlon) = grid.shape();
        let mut data = Array3::zeros((steps.len(), nlat, nlon));
        let mut stamps = Vec::with_capacity(steps.len());
        for (t, (stamp, field)) in steps.into_iter().enumerate() {
            if !field.grid().same_coordinates(&grid) {
                return Err(FieldError::GridMismatch {
                    left: grid.name().to_string(),
                    right: field.grid().name().to_string(),
                });
            }
            data.index_axis_mut(Axis(0), t).assign(field.values());
            stamps.push(stamp);
        }
        Ok(Self { grid, stamps, data })
    }

    /// The grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Stamps of the time steps.
    pub fn stamps(&self) -> &[Stamp] {
        &self.stamps
    }

    /// The values, `[time, lat, lon]`.
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Returns `true` if the series has no time step.
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Field at time step `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` is out of range.
    pub fn step(&self, t: usize) -> Field {
        Field::from_grid_values(self.grid.clone(), self.data.index_axis(Axis(0), t).to_owned())
    }

    /// First and last years of the series, `None` if empty.
    pub fn year_span(&self) -> Option<YearRange> {
        let first = self.stamps.iter().map(|s| s.year).min()?;
        let last = self.stamps.iter().map(|s| s.year).max()?;
        YearRange::new(first, last).ok()
    }

    /// Keeps the steps whose stamp satisfies `keep`.
    pub fn filter(&self, keep: impl Fn(&Stamp) -> bool) -> Self {
        let idx: Vec<usize> = (0..self.len()).filter(|&t| keep(&self.stamps[t])).collect();
        Self {
            grid: self.grid.clone(),
            stamps: idx.iter().map(|&t| self.stamps[t]).collect(),
            data: self.data.select(Axis(0), &idx),
        }
    }

    /// Keeps the steps of the years in `range`.
    pub fn crop(&self, range: YearRange) -> Self {
        self.filter(|s| range.contains(s.year))
    }

    /// Keeps the steps of the months of `season`.
    pub fn select_season(&self, season: Season) -> Self {
        self.filter(|s| season.contains_month(s.month))
    }

    /// Applies `f` to every value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            grid: self.grid.clone(),
            stamps: self.stamps.clone(),
            data: self.data.mapv(f),
        }
    }

    /// Groups steps by `key` and reduces each cell of each group with `f`.
    /// Groups come out sorted by key.
    pub fn group_apply(&self, key: impl Fn(&Stamp) -> Stamp, f: impl Fn(&[f64]) -> f64) -> Self {
        let mut groups: BTreeMap<Stamp, Vec<usize>> = BTreeMap::new();
        for (t, stamp) in self.stamps.iter().enumerate() {
            groups.entry(key(stamp)).or_default().push(t);
        }
        let (nlat, nlon) = self.grid.shape();
        let mut data = Array3::from_elem((groups.len(), nlat, nlon), f64::NAN);
        let mut buf = Vec::new();
        for (g, idx) in groups.values().enumerate() {
            for j in 0..nlat {
                for i in 0..nlon {
                    buf.clear();
                    buf.extend(idx.iter().map(|&t| self.data[[t, j, i]]));
                    data[[g, j, i]] = f(&buf);
                }
            }
        }
        Self {
            grid: self.grid.clone(),
            stamps: groups.into_keys().collect(),
            data,
        }
    }

    /// Groups steps by `key` and applies `reduce` to each group.
    pub fn group_reduce(&self, key: impl Fn(&Stamp) -> Stamp, reduce: Reduce) -> Self {
        self.group_apply(key, |v| reduce.apply(v))
    }

    /// One value per year.
    pub fn yearly(&self, reduce: Reduce) -> Self {
        self.group_reduce(Stamp::yearly, reduce)
    }

    /// One mean per occurrence of `season`, December counting towards the
    /// following year's DJF. Steps outside the season are dropped.
    pub fn seasonal_mean(&self, season: Season) -> Self {
        let first = season.months()[0];
        self.select_season(season).group_reduce(
            |s| Stamp::new(season.season_year(s.year, s.month), first),
            Reduce::Mean,
        )
    }

    /// Reduces each cell over the whole series with `f`.
    pub fn time_apply(&self, f: impl Fn(&[f64]) -> f64) -> Field {
        let values: Array2<f64> = self.data.map_axis(Axis(0), |lane: ArrayView1<'_, f64>| {
            let v: Vec<f64> = lane.iter().copied().collect();
            f(&v)
        });
        Field::from_grid_values(self.grid.clone(), values)
    }

    /// Reduces each cell over the whole series.
    pub fn time_reduce(&self, reduce: Reduce) -> Field {
        self.time_apply(|v| reduce.apply(v))
    }

    /// Removes the least-squares linear trend of each cell, keeping its mean.
    pub fn detrend_keep_level(&self) -> Self {
        let mut data = self.data.clone();
        for mut lane in data.lanes_mut(Axis(0)) {
            let v: Vec<f64> = lane.iter().copied().collect();
            let detrended = delta_stats::detrend_keep_level(&v);
            lane.assign(&ArrayView1::from(&detrended));
        }
        Self {
            grid: self.grid.clone(),
            stamps: self.stamps.clone(),
            data,
        }
    }

    /// Combines two series with identical stamps and grids step by step.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::GridMismatch`] if the grids differ and
    /// [`FieldError::TimeMismatch`] if the stamps differ.
    pub fn zip_with(&self, other: &FieldSeries, f: impl Fn(f64, f64) -> f64) -> Result<Self, FieldError> {
        if !self.grid.same_coordinates(&other.grid) {
            return Err(FieldError::GridMismatch {
                left: self.grid.name().to_string(),
                right: other.grid.name().to_string(),
            });
        }
        if self.stamps != other.stamps {
            return Err(FieldError::TimeMismatch {
                stamps: self.stamps.len(),
                steps: other.stamps.len(),
            });
        }
        let mut data = self.data.clone();
        data.zip_mut_with(&other.data, |a, &b| *a = f(*a, b));
        Ok(Self {
            grid: self.grid.clone(),
            stamps: self.stamps.clone(),
            data,
        })
    }

    /// Consumes the series into its parts.
    pub fn into_parts(self) -> (Grid, Vec<Stamp>, Array3<f64>) {
        (self.grid, self.stamps, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new("p", vec![0.0], vec![0.0]).unwrap()
    }

    fn monthly(years: std::ops::RangeInclusive<i32>, value: impl Fn(i32, u8) -> f64) -> FieldSeries {
        let mut stamps = Vec::new();
        let mut values = Vec::new();
        for y in years {
            for m in 1..=12u8 {
                stamps.push(Stamp::new(y, m));
                values.push(value(y, m));
            }
        }
        let n = values.len();
        FieldSeries::new(grid(), stamps, Array3::from_shape_vec((n, 1, 1), values).unwrap()).unwrap()
    }

    #[test]
    fn yearly_mean_and_sum() {
        let s = monthly(2000..=2001, |y, m| (y - 2000) as f64 * 100.0 + m as f64);
        let mean = s.yearly(Reduce::Mean);
        assert_eq!(mean.len(), 2);
        assert_relative_eq!(mean.data()[[0, 0, 0]], 6.5);
        assert_relative_eq!(mean.data()[[1, 0, 0]], 106.5);
        let sum = s.yearly(Reduce::Sum);
        assert_relative_eq!(sum.data()[[0, 0, 0]], 78.0);
    }

    #[test]
    fn djf_spans_the_new_year() {
        let s = monthly(2000..=2001, |y, m| if y == 2000 && m == 12 { 30.0 } else { m as f64 });
        let djf = s.seasonal_mean(Season::Djf);
        // 2000: Jan, Feb | 2001: Dec 2000, Jan, Feb | 2002: Dec 2001
        assert_eq!(
            djf.stamps(),
            &[Stamp::new(2000, 12), Stamp::new(2001, 12), Stamp::new(2002, 12)]
        );
        assert_relative_eq!(djf.data()[[0, 0, 0]], 1.5);
        assert_relative_eq!(djf.data()[[1, 0, 0]], 11.0);
    }

    #[test]
    fn crop_keeps_years() {
        let s = monthly(1990..=2010, |_, _| 1.0);
        let c = s.crop(YearRange::new(1995, 2004).unwrap());
        assert_eq!(c.len(), 120);
        assert_eq!(c.year_span(), Some(YearRange::new(1995, 2004).unwrap()));
    }

    #[test]
    fn time_std_uses_n_minus_one() {
        let s = monthly(2000..=2000, |_, m| if m % 2 == 0 { 1.0 } else { -1.0 });
        let sd = s.time_reduce(Reduce::Std1);
        assert_relative_eq!(sd.values()[[0, 0]], (12.0f64 / 11.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn missing_values_are_skipped() {
        assert_eq!(Reduce::Mean.apply(&[1.0, f64::NAN, 3.0]), 2.0);
        assert_eq!(Reduce::Sum.apply(&[1.0, f64::NAN, 3.0]), 4.0);
        assert!(Reduce::Sum.apply(&[f64::NAN]).is_nan());
        assert!(Reduce::Std1.apply(&[1.0]).is_nan());
    }

    #[test]
    fn detrend_keeps_mean() {
        let s = monthly(2000..=2009, |y, _| (y - 2000) as f64).yearly(Reduce::Mean);
        let d = s.detrend_keep_level();
        let before = s.time_reduce(Reduce::Mean).values()[[0, 0]];
        let after = d.time_reduce(Reduce::Mean).values()[[0, 0]];
        assert_relative_eq!(before, after, epsilon = 1e-12);
        assert_relative_eq!(d.time_reduce(Reduce::Std1).values()[[0, 0]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn from_fields_stacks_steps() {
        let a = Field::filled(grid(), 1.0);
        let b = Field::filled(grid(), 2.0);
        let s = FieldSeries::from_fields(vec![(Stamp::new(2000, 1), a), (Stamp::new(2001, 1), b)]).unwrap();
        assert_eq!(s.step(1).values()[[0, 0]], 2.0);
        assert!(FieldSeries::from_fields(Vec::new()).is_err());
    }

    #[test]
    fn time_mismatch_is_rejected() {
        assert!(matches!(
            FieldSeries::new(grid(), vec![Stamp::new(2000, 1)], Array3::zeros((2, 1, 1))),
            Err(FieldError::TimeMismatch { stamps: 1, steps: 2 })
        ));
    }
}
