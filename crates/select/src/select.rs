//! Ensemble selection across (experiment, variable, table) constraints.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use delta_catalog::{CONTROL_EXPERIMENT, VersionCatalog};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SelectionConfig;
use crate::error::SelectError;
use crate::variant::preferred_variant;

/// One data requirement: the experiment, variable and table a model must provide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Constraint {
    /// Experiment name.
    pub experiment: String,
    /// Variable name.
    pub variable: String,
    /// Table name.
    pub table: String,
}

impl Constraint {
    /// Creates a constraint.
    pub fn new(experiment: &str, variable: &str, table: &str) -> Self {
        Self {
            experiment: experiment.to_string(),
            variable: variable.to_string(),
            table: table.to_string(),
        }
    }

    /// Constraints for every pair of `experiments` and `variables`, all in `table`.
    pub fn grid(experiments: &[&str], variables: &[(&str, &str)]) -> Vec<Self> {
        experiments
            .iter()
            .flat_map(|exp| variables.iter().map(move |(var, table)| Self::new(exp, var, table)))
            .collect()
    }
}

/// A model and the realization chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelVariant {
    /// Model name.
    pub model: String,
    /// Realization label.
    pub realization: String,
}

impl ModelVariant {
    /// Creates a pair.
    pub fn new(model: &str, realization: &str) -> Self {
        Self {
            model: model.to_string(),
            realization: realization.to_string(),
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.model, self.realization)
    }
}

/// (model, realization) pairs sorted by model name, one per model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ModelVariant>", into = "Vec<ModelVariant>")]
pub struct ModelVariantSet {
    pairs: Vec<ModelVariant>,
}

impl ModelVariantSet {
    /// Builds a set from pairs. Later pairs replace earlier ones for the same model.
    pub fn from_pairs(pairs: impl IntoIterator<Item = ModelVariant>) -> Self {
        let by_model: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|p| (p.model, p.realization))
            .collect();
        Self {
            pairs: by_model
                .into_iter()
                .map(|(model, realization)| ModelVariant { model, realization })
                .collect(),
        }
    }

    /// The pairs, sorted by model.
    pub fn pairs(&self) -> &[ModelVariant] {
        &self.pairs
    }

    /// Iterates over the pairs, sorted by model.
    pub fn iter(&self) -> std::slice::Iter<'_, ModelVariant> {
        self.pairs.iter()
    }

    /// Iterates over `(model, realization)` string pairs.
    pub fn as_str_pairs(&self) -> impl Iterator<Item = (&str, &str)> + Clone {
        self.pairs
            .iter()
            .map(|p| (p.model.as_str(), p.realization.as_str()))
    }

    /// Model names, sorted.
    pub fn models(&self) -> Vec<&str> {
        self.pairs.iter().map(|p| p.model.as_str()).collect()
    }

    /// Realization chosen for `model`.
    pub fn realization_of(&self, model: &str) -> Option<&str> {
        self.pairs
            .binary_search_by(|p| p.model.as_str().cmp(model))
            .ok()
            .map(|i| self.pairs[i].realization.as_str())
    }

    /// Returns `true` if `model` is in the set.
    pub fn contains_model(&self, model: &str) -> bool {
        self.realization_of(model).is_some()
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no model was selected.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl From<Vec<ModelVariant>> for ModelVariantSet {
    fn from(pairs: Vec<ModelVariant>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl From<ModelVariantSet> for Vec<ModelVariant> {
    fn from(set: ModelVariantSet) -> Self {
        set.pairs
    }
}

impl<'a> IntoIterator for &'a ModelVariantSet {
    type Item = &'a ModelVariant;
    type IntoIter = std::slice::Iter<'a, ModelVariant>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Selects the models satisfying every constraint, with one realization each.
///
/// A model is kept when it is allowed by `config`, appears under every
/// constraint, and has at least one realization shared by all constraints
/// of each experiment and by all non-control experiments. The control
/// experiment only needs some realization of its own, unless it is the
/// only experiment requested.
///
/// # Errors
///
/// Returns [`SelectError::NoConstraints`] for an empty constraint list,
/// [`SelectError::Catalog`] when a constraint names a branch absent from the
/// catalog, and the errors of [`preferred_variant`].
pub fn select(
    catalog: &VersionCatalog,
    constraints: &[Constraint],
    config: &SelectionConfig,
) -> Result<ModelVariantSet, SelectError> {
    if constraints.is_empty() {
        return Err(SelectError::NoConstraints);
    }

    // model -> experiment -> realizations available for every constraint of that experiment
    let mut available: BTreeMap<&str, BTreeMap<&str, BTreeSet<&str>>> = BTreeMap::new();
    let mut candidates: Option<BTreeSet<&str>> = None;

    for c in constraints {
        let models = catalog.models(&c.experiment, &c.variable, &c.table)?;
        let allowed: BTreeSet<&str> = models.into_iter().filter(|m| config.allows(m)).collect();
        for &model in &allowed {
            let reals: BTreeSet<&str> = catalog
                .realizations(&c.experiment, &c.variable, &c.table, model)
                .unwrap_or_default()
                .into_iter()
                .collect();
            match available.entry(model).or_default().entry(c.experiment.as_str()) {
                Entry::Occupied(mut seen) => {
                    let common = seen.get().intersection(&reals).copied().collect();
                    seen.insert(common);
                }
                Entry::Vacant(slot) => {
                    slot.insert(reals);
                }
            }
        }
        candidates = Some(match candidates {
            None => allowed,
            Some(prev) => prev.intersection(&allowed).copied().collect(),
        });
    }

    let experiments: BTreeSet<&str> = constraints.iter().map(|c| c.experiment.as_str()).collect();
    let constraining: Vec<&str> = if experiments.len() > 1 {
        experiments
            .iter()
            .copied()
            .filter(|e| *e != CONTROL_EXPERIMENT)
            .collect()
    } else {
        experiments.iter().copied().collect()
    };

    let mut pairs = Vec::new();
    for model in candidates.unwrap_or_default() {
        let per_exp = &available[model];
        if per_exp.values().any(BTreeSet::is_empty) {
            debug!(model, "dropped: no realization common to all variables of an experiment");
            continue;
        }
        let mut common: Option<BTreeSet<&str>> = None;
        for exp in &constraining {
            let reals = &per_exp[exp];
            common = Some(match common {
                None => reals.clone(),
                Some(prev) => prev.intersection(reals).copied().collect(),
            });
        }
        let common: BTreeSet<String> = common
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();
        if common.is_empty() {
            debug!(model, "dropped: no realization common to all experiments");
            continue;
        }
        let realization = preferred_variant(&common, model)?;
        pairs.push(ModelVariant::new(model, &realization));
    }

    let set = ModelVariantSet::from_pairs(pairs);
    info!(
        constraints = constraints.len(),
        models = set.len(),
        "selected ensemble"
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_sorted_by_model() {
        let s = ModelVariantSet::from_pairs([
            ModelVariant::new("b", "r1i1p1f1"),
            ModelVariant::new("a", "r2i1p1f1"),
        ]);
        assert_eq!(s.models(), vec!["a", "b"]);
        assert_eq!(s.realization_of("a"), Some("r2i1p1f1"));
        assert_eq!(s.realization_of("c"), None);
    }

    #[test]
    fn constraint_grid() {
        let cs = Constraint::grid(&["historical", "ssp585"], &[("pr", "Amon"), ("tas", "Amon")]);
        assert_eq!(cs.len(), 4);
        assert_eq!(cs[1], Constraint::new("historical", "tas", "Amon"));
    }

    #[test]
    fn set_serializes_as_list() {
        let s = ModelVariantSet::from_pairs([ModelVariant::new("a", "r1i1p1f1")]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"[{"model":"a","realization":"r1i1p1f1"}]"#);
        let back: ModelVariantSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
