//! A single 2-D field and its cell-wise arithmetic.

use ndarray::{Array2, Zip};

use crate::error::FieldError;
use crate::grid::Grid;

/// Values on a grid, indexed `[lat, lon]`. `NaN` marks missing cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    grid: Grid,
    values: Array2<f64>,
}

impl Field {
    /// Creates a field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ShapeMismatch`] if `values` is not `(nlat, nlon)`.
    pub fn new(grid: Grid, values: Array2<f64>) -> Result<Self, FieldError> {
        if values.dim() != grid.shape() {
            return Err(FieldError::ShapeMismatch {
                expected: grid.shape(),
                got: values.dim(),
            });
        }
        Ok(Self { grid, values })
    }

    /// Builds a field whose values are known to match the grid shape.
    pub(crate) fn from_grid_values(grid: Grid, values: Array2<f64>) -> Self {
        debug_assert_eq!(values.dim(), grid.shape());
        Self { grid, values }
    }

    /// Field with the same value in every cell.
    pub fn filled(grid: Grid, value: f64) -> Self {
        let values = Array2::from_elem(grid.shape(), value);
        Self { grid, values }
    }

    /// The grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The values, `[lat, lon]`.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Consumes the field and returns its values.
    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    fn check_grid(&self, other: &Field) -> Result<(), FieldError> {
        if self.grid.same_coordinates(&other.grid) {
            Ok(())
        } else {
            Err(FieldError::GridMismatch {
                left: self.grid.name().to_string(),
                right: other.grid.name().to_string(),
            })
        }
    }

    /// Applies `f` to every cell.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            grid: self.grid.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Combines two fields cell by cell.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::GridMismatch`] if the grids differ.
    pub fn zip_with(&self, other: &Field, f: impl Fn(f64, f64) -> f64) -> Result<Self, FieldError> {
        self.check_grid(other)?;
        let mut values = Array2::zeros(self.grid.shape());
        Zip::from(&mut values)
            .and(&self.values)
            .and(&other.values)
            .for_each(|out, &a, &b| *out = f(a, b));
        Ok(Self {
            grid: self.grid.clone(),
            values,
        })
    }

    /// `self - other`.
    pub fn minus(&self, other: &Field) -> Result<Self, FieldError> {
        self.zip_with(other, |a, b| a - b)
    }

    /// `self / other`, missing where `other` is zero.
    pub fn ratio(&self, other: &Field) -> Result<Self, FieldError> {
        self.zip_with(other, |a, b| if b == 0.0 { f64::NAN } else { a / b })
    }

    /// `self * factor`.
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Absolute values.
    pub fn abs(&self) -> Self {
        self.map(f64::abs)
    }

    /// Cells below `threshold` become missing.
    pub fn mask_below(&self, threshold: f64) -> Self {
        self.map(|v| if v < threshold { f64::NAN } else { v })
    }

    /// Relative change in percent, `100 * (projection - reference) / reference`.
    ///
    /// With a `threshold`, reference cells below it are treated as missing
    /// before the division. A zero reference also gives a missing cell.
    pub fn relative_change(
        projection: &Field,
        reference: &Field,
        threshold: Option<f64>,
    ) -> Result<Self, FieldError> {
        let reference = match threshold {
            Some(t) => reference.mask_below(t),
            None => reference.clone(),
        };
        projection
            .minus(&reference)?
            .ratio(&reference)
            .map(|f| f.scale(100.0))
    }

    /// Number of non-missing cells.
    pub fn count_valid(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }

    /// Area-weighted mean of the non-missing cells, restricted to `mask`
    /// when given. Returns `None` if no cell contributes.
    pub fn area_mean(&self, mask: Option<&Array2<bool>>) -> Option<f64> {
        let weights = self.grid.lat_weights();
        let mut sum = 0.0;
        let mut wsum = 0.0;
        for ((j, i), &v) in self.values.indexed_iter() {
            if !v.is_finite() || mask.is_some_and(|m| !m.get((j, i)).copied().unwrap_or(false)) {
                continue;
            }
            sum += weights[j] * v;
            wsum += weights[j];
        }
        (wsum > 0.0).then(|| sum / wsum)
    }

    /// Non-missing values in row-major order.
    pub fn finite_values(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| v.is_finite()).collect()
    }

    /// Median of the non-missing cells (unweighted).
    pub fn cell_median(&self) -> Option<f64> {
        let mut v = self.finite_values();
        if v.is_empty() {
            return None;
        }
        delta_stats::sort_values(&mut v);
        Some(delta_stats::median(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn grid() -> Grid {
        Grid::new("t", vec![-45.0, 45.0], vec![90.0, 270.0]).unwrap()
    }

    #[test]
    fn relative_change_exact() {
        let r = Field::filled(grid(), 10.0);
        let p = Field::filled(grid(), 12.0);
        let rc = Field::relative_change(&p, &r, None).unwrap();
        assert!(rc.values().iter().all(|&v| v == 20.0));
    }

    #[test]
    fn relative_change_threshold_masks_reference() {
        let r = Field::new(grid(), array![[3.0, 10.0], [5.0, 0.0]]).unwrap();
        let p = Field::filled(grid(), 12.0);
        let rc = Field::relative_change(&p, &r, Some(5.0)).unwrap();
        assert!(rc.values()[[0, 0]].is_nan());
        assert_relative_eq!(rc.values()[[0, 1]], 20.0);
        assert_relative_eq!(rc.values()[[1, 0]], 140.0);
        assert!(rc.values()[[1, 1]].is_nan());
    }

    #[test]
    fn shape_is_checked() {
        assert!(matches!(
            Field::new(grid(), Array2::zeros((3, 2))),
            Err(FieldError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn grids_must_match() {
        let a = Field::filled(grid(), 1.0);
        let b = Field::filled(Grid::regular(2, 2).unwrap(), 1.0);
        assert!(matches!(a.minus(&b), Err(FieldError::GridMismatch { .. })));
    }

    #[test]
    fn area_mean_weights_by_latitude() {
        let g = Grid::new("t", vec![0.5, 89.5], vec![0.0]).unwrap();
        let f = Field::new(g, array![[1.0], [0.0]]).unwrap();
        let m = f.area_mean(None).unwrap();
        // Equatorial band dominates.
        assert!(m > 0.9);
    }

    #[test]
    fn area_mean_skips_missing_and_masked() {
        let f = Field::new(grid(), array![[f64::NAN, 2.0], [4.0, 6.0]]).unwrap();
        let mask = array![[true, true], [false, true]];
        assert_relative_eq!(f.area_mean(Some(&mask)).unwrap(), 4.0);
        let empty = Field::filled(grid(), f64::NAN);
        assert_eq!(empty.area_mean(None), None);
    }

    #[test]
    fn cell_median_ignores_missing() {
        let f = Field::new(grid(), array![[f64::NAN, 2.0], [4.0, 9.0]]).unwrap();
        assert_eq!(f.cell_median(), Some(4.0));
        assert_eq!(f.count_valid(), 3);
    }
}
