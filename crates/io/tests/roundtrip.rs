//! Integration tests: series and layers through Parquet write/read.

use std::collections::BTreeMap;

use approx::assert_relative_eq;
use delta_field::{Field, FieldSeries, Grid, Stamp};
use delta_io::{
    Compression, IoError, Layer, WriterConfig, read_layers, read_series, write_layers,
    write_series,
};
use ndarray::{Array2, Array3};

fn sample_series() -> FieldSeries {
    let grid = Grid::regular(6, 3).unwrap();
    let stamps: Vec<Stamp> = (1990..1993)
        .flat_map(|y| (1..=12u8).map(move |m| Stamp::new(y, m)))
        .collect();
    let data = Array3::from_shape_fn((stamps.len(), 3, 6), |(t, j, i)| {
        if t == 4 && j == 1 && i == 2 {
            f64::NAN
        } else {
            t as f64 + 0.1 * j as f64 + 0.01 * i as f64
        }
    });
    FieldSeries::new(grid, stamps, data).unwrap()
}

#[test]
fn series_survives_every_compression() {
    let dir = tempfile::tempdir().unwrap();
    let series = sample_series();
    for compression in [Compression::None, Compression::Snappy, Compression::Zstd] {
        let path = dir.path().join(format!("{compression:?}.parquet"));
        let config = WriterConfig::default()
            .with_compression(compression)
            .with_row_group_size(50);
        write_series(&path, &series, &config).unwrap();
        let back = read_series(&path).unwrap();
        assert_eq!(back.stamps(), series.stamps());
        assert_eq!(back.grid().name(), "r6x3");
        assert!(back.grid().same_coordinates(series.grid()));
        assert!(back.data()[[4, 1, 2]].is_nan());
        assert_relative_eq!(back.data()[[35, 2, 5]], 35.25, epsilon = 1e-12);
    }
}

#[test]
fn layers_keep_order_models_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.parquet");
    let fine = Grid::regular(4, 2).unwrap();
    let point = Grid::new("pt", vec![45.0], vec![7.5]).unwrap();
    let layers = vec![
        Layer::ensemble("mean_change", Field::filled(fine.clone(), 1.5)),
        Layer::per_model("change", "ModelB", Field::filled(point.clone(), -2.0)),
        Layer::per_model("change", "ModelA", Field::filled(point, 3.0)),
        Layer::ensemble(
            "stippling",
            Field::new(fine, Array2::from_shape_fn((2, 4), |(j, _)| j as f64)).unwrap(),
        ),
    ];
    let metadata = BTreeMap::from([
        ("models".to_string(), "[\"ModelA\",\"ModelB\"]".to_string()),
        ("tag".to_string(), "cmip6_1a2b3c4d".to_string()),
    ]);
    write_layers(&path, &layers, &metadata, &WriterConfig::default()).unwrap();

    let (back, meta) = read_layers(&path).unwrap();
    assert_eq!(back, layers);
    assert_eq!(meta.get("tag").map(String::as_str), Some("cmip6_1a2b3c4d"));
    assert_eq!(meta.get("models"), metadata.get("models"));
}

#[test]
fn duplicate_layers_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dup.parquet");
    let grid = Grid::regular(2, 1).unwrap();
    let layers = vec![
        Layer::ensemble("change", Field::filled(grid.clone(), 0.0)),
        Layer::ensemble("change", Field::filled(grid, 1.0)),
    ];
    let err = write_layers(&path, &layers, &BTreeMap::new(), &WriterConfig::default()).unwrap_err();
    assert!(matches!(err, IoError::Validation { count: 1, .. }));
    assert!(!path.exists());
}

#[test]
fn reading_a_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_series(&dir.path().join("absent.parquet")).unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }));
}

#[test]
fn reading_layers_from_a_series_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("series.parquet");
    write_series(&path, &sample_series(), &WriterConfig::default()).unwrap();
    let err = read_layers(&path).unwrap_err();
    assert!(matches!(err, IoError::MissingColumn { ref name, .. } if name == "layer"));
}
