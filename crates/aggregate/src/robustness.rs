//! Agreement fractions and robustness masks.
//!
//! Masks are 1 where the condition holds and 0 elsewhere; a cell missing in
//! any input stays missing.

use delta_field::{Field, FieldError, ensemble_fraction};

/// Fraction of models agreeing on the sign of the change:
/// `max(#(x <= 0), #(x >= 0)) / N` per cell.
///
/// # Errors
///
/// Returns [`FieldError::EmptyEnsemble`] without members and
/// [`FieldError::GridMismatch`] for members on different grids.
pub fn agreement_fraction_on_sign(members: &[&Field]) -> Result<Field, FieldError> {
    let negative = ensemble_fraction(members.iter().copied(), |x| x <= 0.0)?;
    let positive = ensemble_fraction(members.iter().copied(), |x| x >= 0.0)?;
    negative.zip_with(&positive, |n, p| if n.is_nan() || p.is_nan() { f64::NAN } else { n.max(p) })
}

/// Fraction of models whose value lies within `[-threshold, threshold]`.
///
/// # Errors
///
/// Same as [`agreement_fraction_on_sign`].
pub fn agreement_fraction_on_lower(members: &[&Field], threshold: f64) -> Result<Field, FieldError> {
    ensemble_fraction(members.iter().copied(), |x| x.abs() <= threshold)
}

fn indicator(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}

/// AR5 masks as `(stippling, hatching)`.
///
/// Hatching where `|change| < variability`; stippling where
/// `|change| >= 2 * variability` and the sign agreement reaches
/// `sign_agreement`.
///
/// # Errors
///
/// Returns [`FieldError::GridMismatch`] if the inputs are on different grids.
pub fn ar5_masks(
    change: &Field,
    variability: &Field,
    agreement: &Field,
    sign_agreement: f64,
) -> Result<(Field, Field), FieldError> {
    let hatching = change.zip_with(variability, |c, v| {
        if c.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            indicator(c.abs() < v)
        }
    })?;
    let large = change.zip_with(variability, |c, v| {
        if c.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            indicator(c.abs() >= 2.0 * v)
        }
    })?;
    let stippling = large.zip_with(agreement, |l, a| {
        if l.is_nan() || a.is_nan() {
            f64::NAN
        } else {
            indicator(l == 1.0 && a >= sign_agreement)
        }
    })?;
    Ok((stippling, hatching))
}

/// AR6 masks as `(lowchange, conflict)`.
///
/// `lowchange` where the low-change fraction reaches `magnitude_fraction`;
/// `conflict` where the change is not low and the sign agreement is below
/// `sign_threshold`.
///
/// # Errors
///
/// Returns [`FieldError::GridMismatch`] if the inputs are on different grids.
pub fn ar6_masks(
    sign_agreement: &Field,
    agree_low: &Field,
    magnitude_fraction: f64,
    sign_threshold: f64,
) -> Result<(Field, Field), FieldError> {
    let lowchange = agree_low.map(|a| if a.is_nan() { f64::NAN } else { indicator(a >= magnitude_fraction) });
    let conflict = lowchange.zip_with(sign_agreement, |low, s| {
        if low.is_nan() || s.is_nan() {
            f64::NAN
        } else {
            indicator(low == 0.0 && s < sign_threshold)
        }
    })?;
    Ok((lowchange, conflict))
}

/// Cells where the sign agreement is at or below `threshold`.
pub fn sign_disagreement(sign_agreement: &Field, threshold: f64) -> Field {
    sign_agreement.map(|a| if a.is_nan() { f64::NAN } else { indicator(a <= threshold) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use delta_field::Grid;
    use ndarray::array;

    fn row(values: [f64; 3]) -> Field {
        let grid = Grid::new("row", vec![0.0], vec![0.0, 10.0, 20.0]).unwrap();
        Field::new(grid, array![[values[0], values[1], values[2]]]).unwrap()
    }

    fn at(f: &Field, j: usize) -> f64 {
        f.values()[[0, j]]
    }

    #[test]
    fn sign_agreement_of_three_models() {
        let (a, b, c) = (row([2.0, 1.0, 0.0]), row([4.0, -1.0, 0.0]), row([-1.0, -2.0, 3.0]));
        let agree = agreement_fraction_on_sign(&[&a, &b, &c]).unwrap();
        assert_relative_eq!(at(&agree, 0), 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(at(&agree, 1), 2.0 / 3.0, epsilon = 1e-12);
        // zeros count on both sides
        assert_eq!(at(&agree, 2), 1.0);
    }

    #[test]
    fn sign_agreement_is_at_least_half_without_zeros() {
        let members: Vec<Field> = [1.0, -2.0, 3.0, -4.0].iter().map(|v| row([*v; 3])).collect();
        let refs: Vec<&Field> = members.iter().collect();
        let agree = agreement_fraction_on_sign(&refs).unwrap();
        assert!(agree.values().iter().all(|v| (0.5..=1.0).contains(v)));
    }

    #[test]
    fn lower_fraction_is_inclusive() {
        let (a, b) = (row([1.645, 2.0, -0.5]), row([-1.0, -3.0, 0.0]));
        let low = agreement_fraction_on_lower(&[&a, &b], 1.645).unwrap();
        assert_eq!(at(&low, 0), 1.0);
        assert_eq!(at(&low, 1), 0.0);
        assert_eq!(at(&low, 2), 1.0);
    }

    #[test]
    fn ar5_stippling_and_hatching() {
        let change = row([0.5, 3.0, 3.0]);
        let var = row([1.0, 1.0, 1.0]);
        let agree = row([1.0, 0.95, 0.6]);
        let (stip, hatch) = ar5_masks(&change, &var, &agree, 0.9).unwrap();
        assert_eq!([at(&hatch, 0), at(&hatch, 1), at(&hatch, 2)], [1.0, 0.0, 0.0]);
        assert_eq!([at(&stip, 0), at(&stip, 1), at(&stip, 2)], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn ar5_missing_propagates() {
        let change = row([f64::NAN, 3.0, 3.0]);
        let var = row([1.0, f64::NAN, 1.0]);
        let agree = row([1.0, 1.0, f64::NAN]);
        let (stip, hatch) = ar5_masks(&change, &var, &agree, 0.9).unwrap();
        assert!(at(&hatch, 0).is_nan() && at(&hatch, 1).is_nan());
        assert_eq!(at(&hatch, 2), 0.0);
        assert!(stip.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ar6_low_change_and_conflict() {
        let sign = row([0.6, 0.6, 0.9]);
        let low = row([0.5, 0.2, 0.2]);
        let (lowchange, conflict) = ar6_masks(&sign, &low, 0.33, 0.8).unwrap();
        assert_eq!([at(&lowchange, 0), at(&lowchange, 1), at(&lowchange, 2)], [1.0, 0.0, 0.0]);
        assert_eq!([at(&conflict, 0), at(&conflict, 1), at(&conflict, 2)], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn disagreement_threshold_is_inclusive() {
        let mask = sign_disagreement(&row([0.8, 0.81, f64::NAN]), 0.8);
        assert_eq!(at(&mask, 0), 1.0);
        assert_eq!(at(&mask, 1), 0.0);
        assert!(at(&mask, 2).is_nan());
    }
}
