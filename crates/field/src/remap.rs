//! Remapping of fields onto another grid.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use tracing::trace;

use crate::error::FieldError;
use crate::field::Field;
use crate::grid::Grid;

/// Remapping method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemapMethod {
    /// First-order conservative remapping, normalized by the valid
    /// overlapping source area.
    Conservative,
    /// Inverse-distance weighting of the four nearest valid source cells.
    DistanceWeighted,
    /// No remapping; the source must already be on the target grid.
    Identity,
}

/// Neighbours used by distance-weighted remapping.
const NEIGHBOURS: usize = 4;

impl RemapMethod {
    /// CDO operator name (`remapcon`, `remapdis`), empty for identity.
    pub fn cdo_operator(&self) -> &'static str {
        match self {
            RemapMethod::Conservative => "remapcon",
            RemapMethod::DistanceWeighted => "remapdis",
            RemapMethod::Identity => "",
        }
    }
}

impl fmt::Display for RemapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RemapMethod::Conservative => "conservative",
            RemapMethod::DistanceWeighted => "distance-weighted",
            RemapMethod::Identity => "identity",
        })
    }
}

impl FromStr for RemapMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conservative" | "remapcon" => Ok(RemapMethod::Conservative),
            "distance-weighted" | "remapdis" => Ok(RemapMethod::DistanceWeighted),
            "identity" | "none" => Ok(RemapMethod::Identity),
            other => Err(format!("unknown remap method '{other}'")),
        }
    }
}

/// Remaps `field` onto `target` with `method`.
///
/// A field already on the target coordinates is returned unchanged
/// whatever the method.
///
/// # Errors
///
/// Returns [`FieldError::GridMismatch`] for [`RemapMethod::Identity`] when
/// the grids differ.
pub fn remap(field: &Field, target: &Grid, method: RemapMethod) -> Result<Field, FieldError> {
    if field.grid().same_coordinates(target) {
        return Field::new(target.clone(), field.values().clone());
    }
    trace!(from = field.grid().name(), to = target.name(), method = %method, "remap");
    let values = match method {
        RemapMethod::Identity => {
            return Err(FieldError::GridMismatch {
                left: field.grid().name().to_string(),
                right: target.name().to_string(),
            });
        }
        RemapMethod::Conservative => conservative(field, target),
        RemapMethod::DistanceWeighted => distance_weighted(field, target),
    };
    Field::new(target.clone(), values)
}

/// For each destination interval, the overlapping source intervals and the
/// overlap lengths.
fn overlaps(src: &[f64], dst: &[f64], shifts: &[f64]) -> Vec<Vec<(usize, f64)>> {
    dst.windows(2)
        .map(|d| {
            src.windows(2)
                .enumerate()
                .filter_map(|(k, s)| {
                    let w: f64 = shifts
                        .iter()
                        .map(|shift| (s[1] + shift).min(d[1]) - (s[0] + shift).max(d[0]))
                        .filter(|o| *o > 0.0)
                        .sum();
                    (w > 0.0).then_some((k, w))
                })
                .collect()
        })
        .collect()
}

fn conservative(field: &Field, target: &Grid) -> Array2<f64> {
    let sin = |b: Vec<f64>| -> Vec<f64> { b.into_iter().map(|x| x.to_radians().sin()).collect() };
    let lat_w = overlaps(
        &sin(field.grid().lat_bounds()),
        &sin(target.lat_bounds()),
        &[0.0],
    );
    let lon_w = overlaps(
        &field.grid().lon_bounds(),
        &target.lon_bounds(),
        &[-360.0, 0.0, 360.0],
    );
    let src = field.values();
    Array2::from_shape_fn(target.shape(), |(j, i)| {
        let mut num = 0.0;
        let mut den = 0.0;
        for &(sj, wj) in &lat_w[j] {
            for &(si, wi) in &lon_w[i] {
                let v = src[[sj, si]];
                if v.is_finite() {
                    num += wj * wi * v;
                    den += wj * wi;
                }
            }
        }
        if den > 0.0 { num / den } else { f64::NAN }
    })
}

fn unit_vector(lat: f64, lon: f64) -> [f64; 3] {
    let (la, lo) = (lat.to_radians(), lon.to_radians());
    [la.cos() * lo.cos(), la.cos() * lo.sin(), la.sin()]
}

/// Great-circle angle between two unit vectors, in radians.
fn angle(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let cross = [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ];
    let sin = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
    let cos = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    sin.atan2(cos)
}

fn nearest_index(axis: &[f64], x: f64) -> usize {
    let k = axis.partition_point(|&a| a < x);
    if k == 0 {
        0
    } else if k == axis.len() || x - axis[k - 1] <= axis[k] - x {
        k - 1
    } else {
        k
    }
}

fn distance_weighted(field: &Field, target: &Grid) -> Array2<f64> {
    let src_grid = field.grid();
    let src = field.values();
    let (nlat, nlon) = src_grid.shape();
    let lon0 = src_grid.lon()[0];
    let max_radius = nlat.max(nlon);

    Array2::from_shape_fn(target.shape(), |(j, i)| {
        let (tlat, tlon) = (target.lat()[j], target.lon()[i]);
        let p = unit_vector(tlat, tlon);
        let jc = nearest_index(src_grid.lat(), tlat);
        let ic = nearest_index(src_grid.lon(), lon0 + (tlon - lon0).rem_euclid(360.0));

        let mut found: Vec<(f64, f64)> = Vec::new();
        let mut settled = false;
        for radius in 1..=max_radius {
            found.clear();
            let rows = jc.saturating_sub(radius)..=(jc + radius).min(nlat - 1);
            let span = (2 * radius + 1).min(nlon);
            for sj in rows {
                for k in 0..span {
                    let si = (ic + nlon + k - radius.min(nlon / 2)) % nlon;
                    let v = src[[sj, si]];
                    if v.is_finite() {
                        let q = unit_vector(src_grid.lat()[sj], src_grid.lon()[si]);
                        found.push((angle(&p, &q), v));
                    }
                }
            }
            if found.len() >= NEIGHBOURS {
                // One more ring catches closer cells just outside the window.
                if settled {
                    break;
                }
                settled = true;
            }
        }
        if found.is_empty() {
            return f64::NAN;
        }
        found.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        found.truncate(NEIGHBOURS);
        if found[0].0 < 1e-12 {
            return found[0].1;
        }
        let (num, den) = found
            .iter()
            .fold((0.0, 0.0), |(n, d), &(dist, v)| (n + v / dist, d + 1.0 / dist));
        num / den
    })
}
