use approx::assert_relative_eq;
use delta_field::{
    Field, FieldSeries, Grid, Reduce, RemapMethod, Stamp, ensemble_fraction, ensemble_mean,
    ensemble_median, remap,
};
use delta_period::{Season, YearRange};
use ndarray::{Array2, Array3};

fn grid() -> Grid {
    Grid::regular(4, 2).unwrap()
}

fn monthly_series(years: YearRange, value: impl Fn(i32, u8) -> f64) -> FieldSeries {
    let g = grid();
    let mut stamps = Vec::new();
    for y in years.years() {
        for m in 1..=12u8 {
            stamps.push(Stamp::new(y, m));
        }
    }
    let (nlat, nlon) = g.shape();
    let data = Array3::from_shape_fn((stamps.len(), nlat, nlon), |(t, _, _)| {
        value(stamps[t].year, stamps[t].month)
    });
    FieldSeries::new(g, stamps, data).unwrap()
}

#[test]
fn climatology_change_of_two_periods() {
    let series = monthly_series(YearRange::new(1981, 2060).unwrap(), |y, _| {
        if y < 2031 { 10.0 } else { 12.5 }
    });
    let reference = series
        .crop(YearRange::new(1981, 2010).unwrap())
        .yearly(Reduce::Mean)
        .time_reduce(Reduce::Mean);
    let projection = series
        .crop(YearRange::new(2031, 2060).unwrap())
        .yearly(Reduce::Mean)
        .time_reduce(Reduce::Mean);
    let change = projection.minus(&reference).unwrap();
    assert_relative_eq!(change.area_mean(None).unwrap(), 2.5);
    let rchange = Field::relative_change(&projection, &reference, Some(1.0)).unwrap();
    assert_relative_eq!(rchange.cell_median().unwrap(), 25.0);
}

#[test]
fn djf_mean_uses_previous_december() {
    let series = monthly_series(YearRange::new(2000, 2001).unwrap(), |y, m| {
        f64::from(y - 2000) * 100.0 + f64::from(m)
    });
    let djf = series.seasonal_mean(Season::Djf);
    // DJF 2001 = Dec 2000 (12), Jan 2001 (101), Feb 2001 (102).
    let stamps = djf.stamps();
    let idx = stamps.iter().position(|s| s.year == 2001).unwrap();
    assert_relative_eq!(djf.step(idx).values()[[0, 0]], (12.0 + 101.0 + 102.0) / 3.0);
}

#[test]
fn three_model_ensemble() {
    let g = grid();
    let a = Field::filled(g.clone(), 1.0);
    let b = Field::filled(g.clone(), 2.0);
    let c = Field::filled(g.clone(), 2.0);
    let members = [&a, &b, &c];
    assert_relative_eq!(
        ensemble_mean(members).unwrap().values()[[0, 0]],
        5.0 / 3.0,
        epsilon = 1e-12
    );
    assert_relative_eq!(ensemble_median(members).unwrap().values()[[1, 3]], 2.0);
    let positive = ensemble_fraction(members, |v| v >= 1.5).unwrap();
    assert_relative_eq!(positive.values()[[0, 0]], 2.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn remapped_changes_share_a_grid() {
    let fine = Grid::regular(8, 4).unwrap();
    let values = Array2::from_shape_fn(fine.shape(), |(j, _)| j as f64);
    let field = Field::new(fine, values).unwrap();
    let common = grid();
    let con = remap(&field, &common, RemapMethod::Conservative).unwrap();
    let dis = remap(&field, &common, RemapMethod::DistanceWeighted).unwrap();
    assert!(con.grid().same_coordinates(dis.grid()));
    assert_eq!(con.count_valid(), 8);
    assert!(con.minus(&dis).is_ok());
}
