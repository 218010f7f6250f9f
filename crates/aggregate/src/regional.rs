//! Scalar change statistics over regions.
//!
//! Each model's reference and projection statistics are averaged over a
//! region (area-weighted), turned into absolute or relative changes per
//! projection slice, and reduced across models with [`EnsembleStat`]s.

use std::collections::BTreeMap;

use delta_catalog::VersionCatalog;
use delta_engine::{DatasetExecutor, RegridPolicy, StatKind, StatisticEngine};
use delta_field::{Field, FieldError, Grid, RemapMethod, remap};
use delta_period::{Season, YearRange};
use delta_select::ModelVariantSet;
use delta_stats::{EnsembleStat, ensemble_stat};
use ndarray::Array2;
use serde::Serialize;
use tracing::debug;

use crate::error::AggregateError;

/// Area over which fields are averaged.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    name: String,
    area: Option<(Grid, Array2<bool>)>,
}

impl Region {
    /// The whole native grid of each model.
    pub fn global() -> Self {
        Self {
            name: "globe".to_string(),
            area: None,
        }
    }

    /// Cells of `grid` where `mask` is `true`; fields are remapped to `grid`
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ShapeMismatch`] if the mask does not match the grid.
    pub fn masked(name: &str, grid: Grid, mask: Array2<bool>) -> Result<Self, FieldError> {
        if mask.dim() != grid.shape() {
            return Err(FieldError::ShapeMismatch {
                expected: grid.shape(),
                got: mask.dim(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            area: Some((grid, mask)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the grid fields are remapped to, if any.
    pub fn grid_name(&self) -> Option<&str> {
        self.area.as_ref().map(|(g, _)| g.name())
    }

    /// Area mean of `field` over the region, `None` if no cell is valid.
    ///
    /// # Errors
    ///
    /// Returns remapping errors.
    pub fn mean(&self, field: &Field, method: RemapMethod) -> Result<Option<f64>, FieldError> {
        match &self.area {
            None => Ok(field.area_mean(None)),
            Some((grid, mask)) => Ok(remap(field, grid, method)?.area_mean(Some(mask))),
        }
    }
}

/// What to compute in [`regional_changes`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalRequest {
    pub project: String,
    pub variable: String,
    pub table: String,
    pub reference_experiment: String,
    pub experiment: String,
    pub season: Season,
    /// Time statistic of each period; standard deviations are detrended.
    pub stat: StatKind,
    pub derivation: String,
    pub reference_period: YearRange,
    /// Projection periods.
    pub slices: Vec<YearRange>,
    /// Changes in percent of the reference rather than differences.
    pub relative: bool,
    /// Ensemble statistic tokens, see [`EnsembleStat`].
    pub statistics: Vec<String>,
}

/// Regional changes per model and across the ensemble.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionalChanges {
    /// region -> slice -> model -> change.
    pub per_model: BTreeMap<String, BTreeMap<YearRange, BTreeMap<String, f64>>>,
    /// region -> statistic -> slice -> value.
    pub ensemble: BTreeMap<String, BTreeMap<String, BTreeMap<YearRange, f64>>>,
}

impl RegionalChanges {
    /// Pretty-printed JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String, AggregateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Computes regional changes of every model of `models` and their ensemble
/// statistics.
///
/// A model without a valid cell in a region, or with a zero reference for
/// relative changes, is left out of that region.
///
/// # Errors
///
/// Returns [`delta_stats::StatsError`] for bad statistic tokens (before any
/// computation) or ensembles too small for a statistic, and catalog or
/// engine errors for the datasets.
pub fn regional_changes<E: DatasetExecutor>(
    engine: &StatisticEngine<E>,
    catalog: &VersionCatalog,
    policy: &RegridPolicy,
    models: &ModelVariantSet,
    regions: &[Region],
    request: &RegionalRequest,
) -> Result<RegionalChanges, AggregateError> {
    let statistics = request
        .statistics
        .iter()
        .map(|token| Ok((token.clone(), token.parse::<EnsembleStat>()?)))
        .collect::<Result<Vec<_>, AggregateError>>()?;
    let detrend = request.stat == StatKind::Std;

    let mut out = RegionalChanges::default();
    for variant in models {
        let (model, realization) = (variant.model.as_str(), variant.realization.as_str());
        let reference_key = catalog.dataset_key(
            &request.project,
            &request.reference_experiment,
            &request.variable,
            &request.table,
            model,
            realization,
            request.reference_period,
        )?;
        let reference = engine.aggregate(&reference_key, request.season, request.stat, detrend, &request.derivation)?;

        for slice in &request.slices {
            let key = catalog.dataset_key(
                &request.project,
                &request.experiment,
                &request.variable,
                &request.table,
                model,
                realization,
                *slice,
            )?;
            let projection = engine.aggregate(&key, request.season, request.stat, detrend, &request.derivation)?;

            for region in regions {
                let method = policy.method(
                    &request.variable,
                    &request.table,
                    model,
                    &reference_key.grid,
                    region.grid_name(),
                );
                let (Some(r), Some(p)) = (region.mean(&reference, method)?, region.mean(&projection, method)?)
                else {
                    debug!(model, region = region.name(), "no valid cell in region");
                    continue;
                };
                let change = if request.relative { 100.0 * (p - r) / r } else { p - r };
                if !change.is_finite() {
                    continue;
                }
                out.per_model
                    .entry(region.name().to_string())
                    .or_default()
                    .entry(*slice)
                    .or_default()
                    .insert(model.to_string(), change);
            }
        }
    }

    for (region, slices) in &out.per_model {
        let by_stat = out.ensemble.entry(region.clone()).or_default();
        for (token, stat) in &statistics {
            let values = by_stat.entry(token.clone()).or_default();
            for (slice, members) in slices {
                values.insert(*slice, ensemble_stat(members, stat)?);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn mask_must_match_grid() {
        let grid = Grid::regular(4, 2).unwrap();
        assert!(Region::masked("north", grid.clone(), Array2::from_elem((2, 4), true)).is_ok());
        let err = Region::masked("north", grid, Array2::from_elem((4, 2), true)).unwrap_err();
        assert!(matches!(err, FieldError::ShapeMismatch { .. }));
    }

    #[test]
    fn masked_mean_uses_selected_cells() {
        let grid = Grid::regular(2, 2).unwrap();
        let field = Field::new(grid.clone(), array![[1.0, 1.0], [3.0, 3.0]]).unwrap();
        let north = Region::masked("north", grid, array![[false, false], [true, true]]).unwrap();
        let n = north.mean(&field, RemapMethod::Conservative).unwrap().unwrap();
        assert_relative_eq!(n, 3.0, epsilon = 1e-12);
        let g = Region::global().mean(&field, RemapMethod::Identity).unwrap().unwrap();
        assert_relative_eq!(g, 2.0, epsilon = 1e-12);
        assert_eq!(north.grid_name(), Some("r2x2"));
        assert_eq!(Region::global().grid_name(), None);
    }
}
