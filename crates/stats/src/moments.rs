//! Scalar moments and order statistics.

use std::cmp::Ordering;

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    match data.len() {
        0 => 0.0,
        n => data.iter().sum::<f64>() / n as f64,
    }
}

/// Unbiased sample variance (N-1 denominator), 0.0 below two values.
pub fn variance(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let centre = mean(data);
    let squares: f64 = data.iter().map(|x| (x - centre).powi(2)).sum();
    squares / (data.len() - 1) as f64
}

/// Sample standard deviation (N-1 denominator), the `timstd1` of the
/// operator chains.
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Quantile at probability `p` by linear interpolation between order
/// statistics (Hyndman and Fan type 7). `p` is clamped to `[0, 1]`.
///
/// `sorted` must be sorted ascending.
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn quantile_type7(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "quantile_type7: input must not be empty");
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let below = rank.floor() as usize;
    let Some(&above) = sorted.get(below + 1) else {
        return sorted[below];
    };
    sorted[below] + (rank - below as f64) * (above - sorted[below])
}

/// Median of sorted values; the mean of the two central values for an even
/// count.
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn median(sorted: &[f64]) -> f64 {
    assert!(!sorted.is_empty(), "median: input must not be empty");
    quantile_type7(sorted, 0.5)
}

/// The finite values of `data`, in order. Missing cells are `NaN`.
pub fn finite(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|x| x.is_finite()).collect()
}

/// Sorts ascending; incomparable values keep their relative order.
pub fn sort_values(data: &mut [f64]) {
    data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn moments_of_model_changes() {
        let changes = [1.5, -0.5, 2.0, 3.0];
        assert_relative_eq!(mean(&changes), 1.5);
        // deviations 0, -2, 0.5, 1.5: squares sum to 6.5
        assert_relative_eq!(variance(&changes), 6.5 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(sd(&changes), (6.5_f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[4.0]), 0.0);
        assert_eq!(sd(&[]), 0.0);
    }

    #[test]
    fn type7_quantiles() {
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_relative_eq!(quantile_type7(&sorted, 0.0), 10.0);
        assert_relative_eq!(quantile_type7(&sorted, 0.05), 12.0, epsilon = 1e-12);
        assert_relative_eq!(quantile_type7(&sorted, 0.75), 40.0, epsilon = 1e-12);
        assert_relative_eq!(quantile_type7(&sorted, 1.0), 50.0);
        assert_relative_eq!(quantile_type7(&sorted, 1.5), 50.0);
        assert_relative_eq!(quantile_type7(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn median_of_even_and_odd_counts() {
        assert_relative_eq!(median(&[-1.0, 2.0, 4.0, 10.0]), 3.0);
        assert_relative_eq!(median(&[0.0, 5.0, 6.0]), 5.0);
    }

    #[test]
    #[should_panic(expected = "median: input must not be empty")]
    fn median_of_nothing_panics() {
        median(&[]);
    }

    #[test]
    fn missing_values_are_dropped_before_sorting() {
        let mut cells = finite(&[3.0, f64::NAN, -1.0, f64::NEG_INFINITY, 2.0]);
        sort_values(&mut cells);
        assert_eq!(cells, [-1.0, 2.0, 3.0]);
    }
}
