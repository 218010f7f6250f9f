//! Least-squares linear trend and level-preserving detrending.

/// Ordinary least-squares fit `y = intercept + slope * t`, with `t = 0, 1, ...`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    /// Value of the fit at `t = 0`.
    pub intercept: f64,
    /// Change per time step.
    pub slope: f64,
}

impl LinearTrend {
    /// Evaluates the fitted line at time step `t`.
    pub fn at(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }
}

/// Fits a linear trend against the element index.
///
/// Non-finite values are skipped. Returns `None` if fewer than two finite
/// values remain.
pub fn linear_trend(y: &[f64]) -> Option<LinearTrend> {
    let points: Vec<(f64, f64)> = y
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i as f64, v))
        .collect();
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mt = points.iter().map(|(t, _)| t).sum::<f64>() / n;
    let my = points.iter().map(|(_, v)| v).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for &(t, v) in &points {
        sxy += (t - mt) * (v - my);
        sxx += (t - mt) * (t - mt);
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(LinearTrend {
        intercept: my - slope * mt,
        slope,
    })
}

/// Removes the least-squares linear trend while keeping the series mean.
///
/// Each finite value becomes `y[i] - slope * (i - t_mean)`, so the mean of
/// the finite values is unchanged. Non-finite values are passed through. A
/// series with fewer than two finite values is returned unchanged.
pub fn detrend_keep_level(y: &[f64]) -> Vec<f64> {
    let Some(trend) = linear_trend(y) else {
        return y.to_vec();
    };

    let finite_t: Vec<f64> = y
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, _)| i as f64)
        .collect();
    let t_mean = finite_t.iter().sum::<f64>() / finite_t.len() as f64;

    y.iter()
        .enumerate()
        .map(|(i, &v)| {
            if v.is_finite() {
                v - trend.slope * (i as f64 - t_mean)
            } else {
                v
            }
        })
        .collect()
}
