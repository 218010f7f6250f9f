//! Cell-wise statistics across an ensemble of fields on one grid.

use ndarray::Array2;

use crate::error::FieldError;
use crate::field::Field;
use crate::series::Reduce;

/// Applies `f` to the member values of each cell.
///
/// `f` receives one value per member, in member order, missing values
/// included.
///
/// # Errors
///
/// Returns [`FieldError::EmptyEnsemble`] without members and
/// [`FieldError::GridMismatch`] if the members are on different grids.
pub fn reduce_cells<'a>(
    members: impl IntoIterator<Item = &'a Field>,
    f: impl Fn(&[f64]) -> f64,
) -> Result<Field, FieldError> {
    let members: Vec<&Field> = members.into_iter().collect();
    let Some(first) = members.first() else {
        return Err(FieldError::EmptyEnsemble);
    };
    let grid = first.grid();
    if let Some(other) = members.iter().find(|m| !m.grid().same_coordinates(grid)) {
        return Err(FieldError::GridMismatch {
            left: grid.name().to_string(),
            right: other.grid().name().to_string(),
        });
    }
    let mut buf = Vec::with_capacity(members.len());
    let values = Array2::from_shape_fn(grid.shape(), |idx| {
        buf.clear();
        buf.extend(members.iter().map(|m| m.values()[idx]));
        f(&buf)
    });
    Ok(Field::from_grid_values(grid.clone(), values))
}

/// Ensemble mean of the non-missing members.
pub fn ensemble_mean<'a>(members: impl IntoIterator<Item = &'a Field>) -> Result<Field, FieldError> {
    reduce_cells(members, |v| Reduce::Mean.apply(v))
}

/// Ensemble standard deviation (N-1) of the non-missing members.
pub fn ensemble_std1<'a>(members: impl IntoIterator<Item = &'a Field>) -> Result<Field, FieldError> {
    reduce_cells(members, |v| Reduce::Std1.apply(v))
}

/// Ensemble percentile `p` (0..=100) of the non-missing members, with
/// linear interpolation between order statistics.
///
/// # Errors
///
/// Returns [`FieldError::InvalidPercentile`] if `p` is outside `[0, 100]`,
/// plus the errors of [`reduce_cells`].
pub fn ensemble_percentile<'a>(
    members: impl IntoIterator<Item = &'a Field>,
    p: f64,
) -> Result<Field, FieldError> {
    if !(0.0..=100.0).contains(&p) {
        return Err(FieldError::InvalidPercentile { p });
    }
    reduce_cells(members, |v| {
        let mut finite = delta_stats::finite(v);
        if finite.is_empty() {
            return f64::NAN;
        }
        delta_stats::sort_values(&mut finite);
        delta_stats::quantile_type7(&finite, p / 100.0)
    })
}

/// Ensemble median: the mean of the two central members for even counts.
pub fn ensemble_median<'a>(members: impl IntoIterator<Item = &'a Field>) -> Result<Field, FieldError> {
    ensemble_percentile(members, 50.0)
}

/// Fraction of all members whose value satisfies `pred`.
///
/// The denominator is the number of members; a missing member value never
/// satisfies `pred`. Cells where every member is missing stay missing.
pub fn ensemble_fraction<'a>(
    members: impl IntoIterator<Item = &'a Field>,
    pred: impl Fn(f64) -> bool,
) -> Result<Field, FieldError> {
    reduce_cells(members, |v| {
        if v.iter().all(|x| x.is_nan()) {
            return f64::NAN;
        }
        let hits = v.iter().filter(|x| x.is_finite() && pred(**x)).count();
        hits as f64 / v.len() as f64
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use approx::assert_relative_eq;

    fn point(v: f64) -> Field {
        Field::filled(Grid::new("p", vec![0.0], vec![0.0]).unwrap(), v)
    }

    #[test]
    fn mean_median_of_three() {
        let m = [point(2.0), point(4.0), point(-1.0)];
        assert_relative_eq!(ensemble_mean(&m).unwrap().values()[[0, 0]], 5.0 / 3.0, epsilon = 1e-12);
        assert_eq!(ensemble_median(&m).unwrap().values()[[0, 0]], 2.0);
    }

    #[test]
    fn median_of_even_count_interpolates() {
        let m = [point(1.0), point(2.0), point(4.0), point(10.0)];
        assert_eq!(ensemble_median(&m).unwrap().values()[[0, 0]], 3.0);
    }

    #[test]
    fn fraction_counts_all_members() {
        let m = [point(2.0), point(f64::NAN), point(-1.0), point(3.0)];
        let f = ensemble_fraction(&m, |x| x >= 0.0).unwrap();
        assert_relative_eq!(f.values()[[0, 0]], 0.5);
    }

    #[test]
    fn all_missing_stays_missing() {
        let m = [point(f64::NAN), point(f64::NAN)];
        assert!(ensemble_mean(&m).unwrap().values()[[0, 0]].is_nan());
        assert!(ensemble_fraction(&m, |x| x > 0.0).unwrap().values()[[0, 0]].is_nan());
    }

    #[test]
    fn empty_and_mixed_grids() {
        assert_eq!(
            ensemble_mean(std::iter::empty::<&Field>()).unwrap_err(),
            FieldError::EmptyEnsemble
        );
        let other = Field::filled(Grid::regular(2, 2).unwrap(), 0.0);
        assert!(matches!(
            ensemble_mean([&point(1.0), &other]),
            Err(FieldError::GridMismatch { .. })
        ));
    }

    #[test]
    fn std1_of_two() {
        let m = [point(3.0), point(7.0)];
        assert_relative_eq!(ensemble_std1(&m).unwrap().values()[[0, 0]], 8f64.sqrt());
    }

    #[test]
    fn percentile_range_checked() {
        assert!(ensemble_percentile(&[point(1.0)], 101.0).is_err());
    }
}
