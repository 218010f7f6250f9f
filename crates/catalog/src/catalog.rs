//! The version catalog and its lookups.

use std::collections::BTreeMap;
use std::path::Path;

use delta_period::YearRange;
use tracing::{debug, info};

use crate::cmip::CONTROL_EXPERIMENT;
use crate::entry::{CatalogEntry, DatasetKey};
use crate::error::CatalogError;

type Realizations = BTreeMap<String, CatalogEntry>;
type Models = BTreeMap<String, Realizations>;
type Tables = BTreeMap<String, Models>;
type Variables = BTreeMap<String, Tables>;

/// File name of the catalog with the given tag.
pub fn catalog_file_name(tag: &str) -> String {
    format!("Data_versions_selection_{tag}.json")
}

/// Read-only mapping
/// `experiment -> variable -> table -> model -> realization -> entry`.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionCatalog {
    tag: String,
    experiments: BTreeMap<String, Variables>,
}

impl VersionCatalog {
    /// Loads `Data_versions_selection_<tag>.json` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Read`] if the file cannot be read and
    /// [`CatalogError::Parse`] if it is not a well-formed catalog.
    pub fn load(tag: &str, dir: &Path) -> Result<Self, CatalogError> {
        let path = dir.join(catalog_file_name(tag));
        let text = std::fs::read_to_string(&path).map_err(|e| CatalogError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let catalog = Self::from_json_str(tag, &text)?;
        info!(
            tag,
            path = %path.display(),
            experiments = catalog.experiments.len(),
            "loaded version catalog"
        );
        Ok(catalog)
    }

    /// Parses a catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] if the document does not have the
    /// expected nesting or an entry has an invalid period.
    pub fn from_json_str(tag: &str, json: &str) -> Result<Self, CatalogError> {
        let experiments = serde_json::from_str(json).map_err(|e| CatalogError::Parse {
            tag: tag.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            tag: tag.to_string(),
            experiments,
        })
    }

    /// Builds an empty catalog, to be filled with [`VersionCatalog::insert`].
    pub fn empty(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            experiments: BTreeMap::new(),
        }
    }

    /// Adds or replaces one entry. Used to assemble catalogs in memory.
    pub fn insert(
        &mut self,
        experiment: &str,
        variable: &str,
        table: &str,
        model: &str,
        realization: &str,
        entry: CatalogEntry,
    ) {
        self.experiments
            .entry(experiment.to_string())
            .or_default()
            .entry(variable.to_string())
            .or_default()
            .entry(table.to_string())
            .or_default()
            .entry(model.to_string())
            .or_default()
            .insert(realization.to_string(), entry);
    }

    /// Serializes the catalog back to its JSON document.
    pub fn to_json_string(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(&self.experiments).map_err(|e| CatalogError::Parse {
            tag: self.tag.clone(),
            reason: e.to_string(),
        })
    }

    /// Tag the catalog was loaded under.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Experiments present in the catalog, sorted.
    pub fn experiments(&self) -> impl Iterator<Item = &str> {
        self.experiments.keys().map(String::as_str)
    }

    fn branch(&self, experiment: &str, variable: &str, table: &str) -> Result<&Models, CatalogError> {
        let variables = self
            .experiments
            .get(experiment)
            .ok_or_else(|| not_found("experiment", experiment, &[]))?;
        let tables = variables
            .get(variable)
            .ok_or_else(|| not_found("variable", variable, &[experiment]))?;
        tables
            .get(table)
            .ok_or_else(|| not_found("table", table, &[experiment, variable]))
    }

    /// Returns `true` if the catalog has any model for the triple.
    pub fn contains_branch(&self, experiment: &str, variable: &str, table: &str) -> bool {
        self.branch(experiment, variable, table).is_ok()
    }

    /// Models available for the triple, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the experiment, variable or
    /// table level is absent.
    pub fn models(&self, experiment: &str, variable: &str, table: &str) -> Result<Vec<&str>, CatalogError> {
        Ok(self
            .branch(experiment, variable, table)?
            .keys()
            .map(String::as_str)
            .collect())
    }

    /// Realizations of `model` for the triple, sorted, or `None` if the
    /// model (or any level above it) is absent.
    pub fn realizations(
        &self,
        experiment: &str,
        variable: &str,
        table: &str,
        model: &str,
    ) -> Option<Vec<&str>> {
        let reals = self.branch(experiment, variable, table).ok()?.get(model)?;
        Some(reals.keys().map(String::as_str).collect())
    }

    /// Looks up one dataset entry.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] naming the first absent level.
    pub fn resolve(
        &self,
        experiment: &str,
        variable: &str,
        table: &str,
        model: &str,
        realization: &str,
    ) -> Result<&CatalogEntry, CatalogError> {
        let models = self.branch(experiment, variable, table)?;
        let reals = models
            .get(model)
            .ok_or_else(|| not_found("model", model, &[experiment, variable, table]))?;
        reals.get(realization).ok_or_else(|| {
            not_found("realization", realization, &[experiment, variable, table, model])
        })
    }

    /// Looks up one dataset entry, returning `None` when any level is absent.
    pub fn try_resolve(
        &self,
        experiment: &str,
        variable: &str,
        table: &str,
        model: &str,
        realization: &str,
    ) -> Option<&CatalogEntry> {
        self.resolve(experiment, variable, table, model, realization).ok()
    }

    /// Returns `true` if the dataset is in the catalog.
    pub fn contains(
        &self,
        experiment: &str,
        variable: &str,
        table: &str,
        model: &str,
        realization: &str,
    ) -> bool {
        self.try_resolve(experiment, variable, table, model, realization)
            .is_some()
    }

    /// Resolves the control-run dataset of `model`.
    ///
    /// Control runs need not share the realization used for the other
    /// experiments: if `preferred` is not available, the lexicographically
    /// smallest available realization is used instead. A model with no
    /// control run at all is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the model has no control run
    /// for the variable and table.
    pub fn resolve_control(
        &self,
        variable: &str,
        table: &str,
        model: &str,
        preferred: &str,
    ) -> Result<(&str, &CatalogEntry), CatalogError> {
        let models = self.branch(CONTROL_EXPERIMENT, variable, table)?;
        let reals = models
            .get(model)
            .ok_or_else(|| not_found("model", model, &[CONTROL_EXPERIMENT, variable, table]))?;
        if let Some((real, entry)) = reals.get_key_value(preferred) {
            return Ok((real.as_str(), entry));
        }
        let (real, entry) = reals.iter().next().ok_or_else(|| {
            not_found("realization", preferred, &[CONTROL_EXPERIMENT, variable, table, model])
        })?;
        debug!(
            model,
            preferred,
            used = %real,
            "control run uses another realization"
        );
        Ok((real.as_str(), entry))
    }

    /// Builds the key of a dataset restricted to `period`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the dataset is not in the catalog.
    #[allow(clippy::too_many_arguments)]
    pub fn dataset_key(
        &self,
        project: &str,
        experiment: &str,
        variable: &str,
        table: &str,
        model: &str,
        realization: &str,
        period: YearRange,
    ) -> Result<DatasetKey, CatalogError> {
        let entry = self.resolve(experiment, variable, table, model, realization)?;
        Ok(DatasetKey {
            project: project.to_string(),
            experiment: experiment.to_string(),
            model: model.to_string(),
            realization: realization.to_string(),
            variable: variable.to_string(),
            table: table.to_string(),
            grid: entry.grid().to_string(),
            version: entry.version().to_string(),
            period,
        })
    }

    /// Builds the key of a control-run dataset over the whole available
    /// period, with the realization fallback of
    /// [`VersionCatalog::resolve_control`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the model has no control run and
    /// [`CatalogError::MissingPeriod`] if its period is not recorded.
    pub fn control_key(
        &self,
        project: &str,
        variable: &str,
        table: &str,
        model: &str,
        preferred: &str,
    ) -> Result<DatasetKey, CatalogError> {
        let (real, entry) = self.resolve_control(variable, table, model, preferred)?;
        let period = entry.period().ok_or_else(|| CatalogError::MissingPeriod {
            path: [CONTROL_EXPERIMENT, variable, table, model, real].join("/"),
        })?;
        Ok(DatasetKey {
            project: project.to_string(),
            experiment: CONTROL_EXPERIMENT.to_string(),
            model: model.to_string(),
            realization: real.to_string(),
            variable: variable.to_string(),
            table: table.to_string(),
            grid: entry.grid().to_string(),
            version: entry.version().to_string(),
            period,
        })
    }
}

fn not_found(level: &'static str, key: &str, above: &[&str]) -> CatalogError {
    CatalogError::NotFound {
        level,
        key: key.to_string(),
        path: if above.is_empty() {
            "/".to_string()
        } else {
            above.join("/")
        },
    }
}
