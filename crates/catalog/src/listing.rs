//! One-line-per-dataset description of the data behind a result.

use crate::catalog::VersionCatalog;
use crate::cmip::{CONTROL_EXPERIMENT, institute_for_model, mip_for_experiment};
use crate::error::CatalogError;

/// Describes the datasets used for `experiments` and `variable`/`table`,
/// one line per (experiment, model) pair:
///
/// ```text
/// CMIP6.CMIP.CNRM-CERFACS.CNRM-CM6-1.piControl                   none   r1i1p1f2 Amon         pr  gr v20180814
/// ```
///
/// Control runs use the realization actually available in the catalog
/// when the selected one is absent.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownExperiment`] if no MIP is known for an
/// experiment and [`CatalogError::NotFound`] if a dataset is not in the
/// catalog.
pub fn dataset_listing<'a>(
    catalog: &VersionCatalog,
    project: &str,
    experiments: &[&str],
    variable: &str,
    table: &str,
    pairs: impl IntoIterator<Item = (&'a str, &'a str)> + Clone,
) -> Result<Vec<String>, CatalogError> {
    let mut lines = Vec::new();
    for &experiment in experiments {
        let mip = mip_for_experiment(experiment)?;
        for (model, variant) in pairs.clone() {
            let institute = institute_for_model(model, mip).unwrap_or("*");
            let drs = format!("{project}.{mip}.{institute}.{model}.{experiment}");
            let (realization, entry) = if experiment == CONTROL_EXPERIMENT {
                catalog.resolve_control(variable, table, model, variant)?
            } else {
                (variant, catalog.resolve(experiment, variable, table, model, variant)?)
            };
            lines.push(format!(
                "{drs:<60} {:>6} {realization:>10} {table:>4} {variable:>10} {:>3} {:>9}",
                "none",
                entry.grid(),
                entry.version()
            ));
        }
    }
    Ok(lines)
}
