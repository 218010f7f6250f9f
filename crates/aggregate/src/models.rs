//! Which models feed the changes and the control-run variability.

use delta_catalog::{CONTROL_EXPERIMENT, VersionCatalog};
use delta_select::{Constraint, ModelVariantSet, SelectionConfig, select};
use tracing::info;

use crate::config::AggregateConfig;
use crate::error::AggregateError;

/// How the variability models relate to the changes models.
#[derive(Debug, Clone, PartialEq)]
pub enum VariabilityModels {
    /// Changes models must also have a control run, and the same models
    /// provide the variability.
    SameAsChanges,
    /// Variability models are selected on the control run alone, with their
    /// own inclusion and exclusion lists.
    Independent(SelectionConfig),
    /// No variability models.
    Disabled,
}

/// Model sets of one projection experiment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentModels {
    /// Models and realizations used for the changes.
    pub changes: ModelVariantSet,
    /// Models and preferred realizations used for control-run variability.
    pub control: ModelVariantSet,
}

/// Selects the models of `experiment`.
///
/// Changes models need the reference and projection experiments for the
/// configured variable and every `(variable, table)` of `extra_variables`.
/// Standardized changes also require a control run of the changes models.
///
/// # Errors
///
/// Returns the selection errors of [`delta_select::select`].
pub fn select_models(
    catalog: &VersionCatalog,
    config: &AggregateConfig,
    experiment: &str,
    selection: &SelectionConfig,
    variability: &VariabilityModels,
    extra_variables: &[(&str, &str)],
) -> Result<ExperimentModels, AggregateError> {
    let mut variables = vec![(config.variable(), config.table())];
    variables.extend_from_slice(extra_variables);

    let mut experiments = vec![config.reference_experiment(), experiment];
    let control_required = match variability {
        VariabilityModels::SameAsChanges => true,
        VariabilityModels::Independent(_) | VariabilityModels::Disabled => config.standardized(),
    };
    if control_required {
        experiments.insert(0, CONTROL_EXPERIMENT);
    }

    let changes = select(catalog, &Constraint::grid(&experiments, &variables), selection)?;
    let control = match variability {
        VariabilityModels::SameAsChanges => changes.clone(),
        VariabilityModels::Independent(own) => {
            select(catalog, &Constraint::grid(&[CONTROL_EXPERIMENT], &variables), own)?
        }
        VariabilityModels::Disabled => ModelVariantSet::default(),
    };
    info!(
        experiment,
        changes = changes.len(),
        control = control.len(),
        "selected models"
    );
    Ok(ExperimentModels { changes, control })
}
