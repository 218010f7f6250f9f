//! Rectilinear latitude/longitude grids.

use crate::error::FieldError;

/// A rectilinear grid: ascending latitudes and longitudes of cell centres,
/// in degrees.
///
/// Cell bounds are the midpoints between neighbouring centres; the outer
/// latitude bounds are clipped to the poles and the outer longitude bounds
/// extend by half the neighbouring spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    name: String,
    lat: Vec<f64>,
    lon: Vec<f64>,
}

fn check_axis(name: &str, axis: &str, values: &[f64]) -> Result<(), FieldError> {
    let invalid = |reason: String| FieldError::InvalidGrid {
        name: name.to_string(),
        reason,
    };
    if values.is_empty() {
        return Err(invalid(format!("{axis} axis is empty")));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(invalid(format!("{axis} axis has non-finite values")));
    }
    if values.windows(2).any(|w| w[1] <= w[0]) {
        return Err(invalid(format!("{axis} axis is not strictly ascending")));
    }
    Ok(())
}

fn midpoint_bounds(centres: &[f64]) -> Vec<f64> {
    let n = centres.len();
    if n == 1 {
        return vec![centres[0] - 0.5, centres[0] + 0.5];
    }
    let mut bounds = Vec::with_capacity(n + 1);
    bounds.push(centres[0] - (centres[1] - centres[0]) / 2.0);
    for w in centres.windows(2) {
        bounds.push((w[0] + w[1]) / 2.0);
    }
    bounds.push(centres[n - 1] + (centres[n - 1] - centres[n - 2]) / 2.0);
    bounds
}

impl Grid {
    /// Creates a grid from cell-centre coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidGrid`] if an axis is empty, non-finite or
    /// not strictly ascending, or if a latitude lies outside `[-90, 90]`.
    pub fn new(name: &str, lat: Vec<f64>, lon: Vec<f64>) -> Result<Self, FieldError> {
        check_axis(name, "latitude", &lat)?;
        check_axis(name, "longitude", &lon)?;
        if lat.iter().any(|l| l.abs() > 90.0) {
            return Err(FieldError::InvalidGrid {
                name: name.to_string(),
                reason: "latitude outside [-90, 90]".to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            lat,
            lon,
        })
    }

    /// Global regular grid of `nlon` by `nlat` cells, named `r<nlon>x<nlat>`.
    ///
    /// Longitudes start at half a cell east of 0, latitudes at half a cell
    /// north of the south pole.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidGrid`] if either count is zero.
    pub fn regular(nlon: usize, nlat: usize) -> Result<Self, FieldError> {
        let name = format!("r{nlon}x{nlat}");
        if nlon == 0 || nlat == 0 {
            return Err(FieldError::InvalidGrid {
                name,
                reason: "cell counts must be positive".to_string(),
            });
        }
        let dlon = 360.0 / nlon as f64;
        let dlat = 180.0 / nlat as f64;
        let lon = (0..nlon).map(|i| (i as f64 + 0.5) * dlon).collect();
        let lat = (0..nlat).map(|j| -90.0 + (j as f64 + 0.5) * dlat).collect();
        Self::new(&name, lat, lon)
    }

    /// Parses a CDO-style global grid name, e.g. `r360x180`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidGridSpec`] if `spec` is not `r<nlon>x<nlat>`.
    pub fn from_spec(spec: &str) -> Result<Self, FieldError> {
        let invalid = || FieldError::InvalidGridSpec {
            spec: spec.to_string(),
        };
        let (nlon, nlat) = spec
            .strip_prefix('r')
            .and_then(|rest| rest.split_once('x'))
            .ok_or_else(invalid)?;
        let nlon = nlon.parse().map_err(|_| invalid())?;
        let nlat = nlat.parse().map_err(|_| invalid())?;
        Self::regular(nlon, nlat)
    }

    /// Grid name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latitudes of cell centres.
    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    /// Longitudes of cell centres.
    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    /// Number of latitudes.
    pub fn nlat(&self) -> usize {
        self.lat.len()
    }

    /// Number of longitudes.
    pub fn nlon(&self) -> usize {
        self.lon.len()
    }

    /// `(nlat, nlon)`, the shape of field values on this grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.nlat(), self.nlon())
    }

    /// Latitude cell bounds (`nlat + 1` values), clipped to the poles.
    pub fn lat_bounds(&self) -> Vec<f64> {
        midpoint_bounds(&self.lat)
            .into_iter()
            .map(|b| b.clamp(-90.0, 90.0))
            .collect()
    }

    /// Longitude cell bounds (`nlon + 1` values).
    pub fn lon_bounds(&self) -> Vec<f64> {
        midpoint_bounds(&self.lon)
    }

    /// Relative area of each latitude band: `sin(upper) - sin(lower)`.
    pub fn lat_weights(&self) -> Vec<f64> {
        self.lat_bounds()
            .windows(2)
            .map(|w| w[1].to_radians().sin() - w[0].to_radians().sin())
            .collect()
    }

    /// Returns `true` if both grids have the same coordinates.
    pub fn same_coordinates(&self, other: &Grid) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }
}
