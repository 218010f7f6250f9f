use std::collections::BTreeMap;

use approx::assert_relative_eq;
use delta_stats::{EnsembleStat, StatsError, detrend_keep_level, ensemble_stat, linear_trend};

fn ensemble(values: &[(&str, f64)]) -> BTreeMap<String, f64> {
    values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn three_model_change_statistics() {
    // A: +2, B: +4, C: -1
    let e = ensemble(&[("A", 2.0), ("B", 4.0), ("C", -1.0)]);
    assert_relative_eq!(
        ensemble_stat(&e, &EnsembleStat::Mean).unwrap(),
        5.0 / 3.0,
        epsilon = 1e-12
    );
    assert_eq!(ensemble_stat(&e, &EnsembleStat::Median).unwrap(), 2.0);
    assert_eq!(ensemble_stat(&e, &"butlast".parse().unwrap()).unwrap(), 2.0);
}

#[test]
fn every_keyword_parses_and_evaluates() {
    let e = ensemble(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
    for name in [
        "mean", "min", "max", "second", "butlast", "median", "mdn", "lq5", "lq25", "lq75",
        "lq95", "nq5", "nq25", "nq75", "nq95", "c",
    ] {
        let stat: EnsembleStat = name.parse().unwrap();
        let v = ensemble_stat(&e, &stat).unwrap();
        assert!(v.is_finite(), "{name} gave {v}");
    }
}

#[test]
fn normal_percentiles_are_symmetric_about_mean() {
    let e = ensemble(&[("a", 1.0), ("b", 2.0), ("c", 6.0)]);
    let lo = ensemble_stat(&e, &EnsembleStat::NormalPercentile(5.0)).unwrap();
    let hi = ensemble_stat(&e, &EnsembleStat::NormalPercentile(95.0)).unwrap();
    assert_relative_eq!((lo + hi) / 2.0, 3.0, epsilon = 1e-9);
}

#[test]
fn unknown_member_is_reported() {
    let e = ensemble(&[("a", 1.0)]);
    let err = ensemble_stat(&e, &"IPSL-CM6A-LR".parse().unwrap()).unwrap_err();
    assert_eq!(
        err,
        StatsError::UnknownStatistic {
            name: "IPSL-CM6A-LR".to_string()
        }
    );
}

#[test]
fn detrended_series_has_no_trend_and_same_mean() {
    let series: Vec<f64> = (0..30).map(|i| 280.0 + 0.05 * i as f64 + if i % 2 == 0 { 0.3 } else { -0.3 }).collect();
    let detrended = detrend_keep_level(&series);
    let before = delta_stats::mean(&series);
    let after = delta_stats::mean(&detrended);
    assert_relative_eq!(before, after, epsilon = 1e-9);
    let trend = linear_trend(&detrended).unwrap();
    assert_relative_eq!(trend.slope, 0.0, epsilon = 1e-9);
}
