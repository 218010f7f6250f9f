use std::f64::consts::SQRT_2;

use approx::assert_relative_eq;
use delta_catalog::DatasetKey;
use delta_engine::{EngineError, MemoryExecutor, OperatorRegistry, StatKind, StatisticEngine};
use delta_field::{FieldSeries, Grid, Stamp};
use delta_period::{SamplingConfig, Season, YearRange};
use ndarray::Array3;

fn key(experiment: &str, start: i32, end: i32) -> DatasetKey {
    DatasetKey {
        project: "CMIP6".to_string(),
        experiment: experiment.to_string(),
        model: "ModelA".to_string(),
        realization: "r1i1p1f1".to_string(),
        variable: "tas".to_string(),
        table: "Amon".to_string(),
        grid: "gr".to_string(),
        version: "v20190101".to_string(),
        period: YearRange::new(start, end).unwrap(),
    }
}

/// Monthly series on a 2x4 grid with every cell equal to `value(year, month)`.
fn monthly(years: YearRange, value: impl Fn(i32, u8) -> f64) -> FieldSeries {
    let grid = Grid::regular(4, 2).unwrap();
    let stamps: Vec<Stamp> = years
        .years()
        .flat_map(|y| (1..=12u8).map(move |m| Stamp::new(y, m)))
        .collect();
    let data = Array3::from_shape_fn((stamps.len(), 2, 4), |(t, _, _)| {
        value(stamps[t].year, stamps[t].month)
    });
    FieldSeries::new(grid, stamps, data).unwrap()
}

fn engine_with(datasets: Vec<(DatasetKey, FieldSeries)>) -> StatisticEngine<MemoryExecutor> {
    let mut exec = MemoryExecutor::new();
    for (k, s) in datasets {
        exec.insert(&k, s);
    }
    StatisticEngine::new(exec, OperatorRegistry::standard())
}

#[test]
fn annual_and_seasonal_means() {
    let k = key("historical", 1995, 2014);
    let engine = engine_with(vec![(
        k.clone(),
        monthly(YearRange::new(1950, 2014).unwrap(), |y, m| {
            f64::from(y - 1995) + if m == 7 { 12.0 } else { 0.0 }
        }),
    )]);
    let ann = engine.aggregate(&k, Season::Ann, StatKind::Mean, false, "plain").unwrap();
    assert_relative_eq!(ann.values()[[0, 0]], 9.5 + 1.0, epsilon = 1e-9);
    let jja = engine.aggregate(&k, Season::Jja, StatKind::Mean, true, "plain").unwrap();
    assert_relative_eq!(jja.values()[[1, 3]], 9.5 + 4.0, epsilon = 1e-9);
}

#[test]
fn std_with_and_without_detrending() {
    let k = key("ssp585", 2081, 2100);
    let engine = engine_with(vec![(
        k.clone(),
        monthly(YearRange::new(2015, 2100).unwrap(), |y, _| 0.5 * f64::from(y)),
    )]);
    let detrended = engine.aggregate(&k, Season::Ann, StatKind::Std, true, "plain").unwrap();
    assert_relative_eq!(detrended.values()[[0, 0]], 0.0, epsilon = 1e-9);
    let raw = engine.aggregate(&k, Season::Ann, StatKind::Std, false, "plain").unwrap();
    assert!(raw.values()[[0, 0]] > 1.0);
}

#[test]
fn interannual_variability_scales_by_sqrt_two() {
    let k = key("historical", 2000, 2003);
    let pattern = [1.0, 3.0, 3.0, 1.0];
    let engine = engine_with(vec![(
        k.clone(),
        monthly(YearRange::new(2000, 2003).unwrap(), |y, _| pattern[(y - 2000) as usize]),
    )]);
    let iav = engine.interannual_variability(&k, Season::Ann, "plain").unwrap();
    assert_relative_eq!(iav.values()[[0, 0]], (4.0f64 / 3.0).sqrt() * SQRT_2, epsilon = 1e-9);
}

#[test]
fn interannual_variability_rejects_processed_derivations() {
    let k = key("historical", 2000, 2003);
    let engine = engine_with(vec![]);
    for label in ["dry", "drain", "iav", "gini", "seasonality"] {
        let err = engine.interannual_variability(&k, Season::Ann, label).unwrap_err();
        assert!(
            matches!(err, EngineError::UnsupportedDerivation { .. }),
            "{label}: {err}"
        );
    }
}

#[test]
fn ar5_variability_of_slice_means() {
    let control = key("piControl", 1850, 1855);
    let levels = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
    let engine = engine_with(vec![(
        control.clone(),
        monthly(YearRange::new(1850, 1855).unwrap(), |y, _| levels[(y - 1850) as usize]),
    )]);
    // A shift of 100 years does not fit and is relaxed to the window start.
    let sampling = SamplingConfig::new(100, 2, 3);
    let var = engine
        .variability_ar5(&control, Season::Ann, "plain", &sampling, false)
        .unwrap();
    assert_relative_eq!(var.values()[[1, 2]], SQRT_2, epsilon = 1e-12);
}

#[test]
fn ar5_variability_with_post_operator() {
    let control = key("piControl", 1850, 1855);
    let engine = engine_with(vec![(
        control.clone(),
        monthly(YearRange::new(1850, 1855).unwrap(), |y, _| f64::from(y % 2)),
    )]);
    let sampling = SamplingConfig::new(0, 3, 2);
    // Each slice holds the same alternating pattern, so the per-slice
    // inter-annual spread is identical and its ensemble spread vanishes.
    let var = engine
        .variability_ar5(&control, Season::Ann, "iav", &sampling, false)
        .unwrap();
    assert_relative_eq!(var.values()[[0, 0]], 0.0, epsilon = 1e-12);
}

#[test]
fn short_control_run_names_the_model() {
    let control = key("piControl", 1850, 1855);
    let engine = engine_with(vec![(
        control.clone(),
        monthly(YearRange::new(1850, 1855).unwrap(), |_, _| 1.0),
    )]);
    let sampling = SamplingConfig::new(0, 20, 5);
    let err = engine
        .variability_ar5(&control, Season::Ann, "plain", &sampling, true)
        .unwrap_err();
    match err {
        EngineError::InsufficientData { model, .. } => assert_eq!(model, "ModelA"),
        other => panic!("expected InsufficientData, got {other}"),
    }
}

#[test]
fn control_interannual_variability_uses_sampled_window() {
    let control = key("piControl", 1850, 1859);
    let pattern = [1.0, 3.0, 3.0, 1.0];
    let engine = engine_with(vec![(
        control.clone(),
        // Only the last four years carry variability.
        monthly(YearRange::new(1850, 1859).unwrap(), |y, _| {
            if y >= 1856 { pattern[(y - 1856) as usize] } else { 100.0 * f64::from(y) }
        }),
    )]);
    let sampling = SamplingConfig::new(6, 2, 2);
    let iav = engine
        .control_interannual_variability(&control, Season::Ann, "plain", &sampling)
        .unwrap();
    assert_relative_eq!(iav.values()[[0, 0]], (4.0f64 / 3.0).sqrt() * SQRT_2, epsilon = 1e-9);
}

#[test]
fn dry_days_mean() {
    let k = key("historical", 2000, 2001);
    let grid = Grid::new("p", vec![0.0], vec![0.0]).unwrap();
    // Daily steps: three of ten days per year are dry.
    let mut stamps = Vec::new();
    let mut values = Vec::new();
    for y in 2000..=2001 {
        for d in 0..10 {
            stamps.push(Stamp::new(y, 1));
            values.push(if d < 3 { 0.0 } else { 5.0 / 86_400.0 });
        }
    }
    let n = values.len();
    let series = FieldSeries::new(grid, stamps, Array3::from_shape_vec((n, 1, 1), values).unwrap())
        .unwrap();
    let engine = engine_with(vec![(k.clone(), series)]);
    let dry = engine.aggregate(&k, Season::Ann, StatKind::Mean, false, "dry").unwrap();
    assert_relative_eq!(dry.values()[[0, 0]], 3.0);
    let drain = engine.aggregate(&k, Season::Ann, StatKind::Mean, false, "drain").unwrap();
    assert_relative_eq!(drain.values()[[0, 0]], 5.0 / 86_400.0, epsilon = 1e-15);
}
