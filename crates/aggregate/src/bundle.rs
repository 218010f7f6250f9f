//! Typed container of aggregated fields.

use std::collections::BTreeMap;

use delta_field::Field;
use delta_period::Season;

use crate::error::AggregateError;
use crate::kind::FieldKind;

/// Address of one aggregated result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BundleKey {
    /// Variable name.
    pub variable: String,
    /// Projection experiment.
    pub experiment: String,
    /// Season.
    pub season: Season,
    /// Field kind.
    pub kind: FieldKind,
    /// Derivation label.
    pub derivation: String,
}

impl BundleKey {
    pub fn new(variable: &str, experiment: &str, season: Season, kind: FieldKind, derivation: &str) -> Self {
        Self {
            variable: variable.to_string(),
            experiment: experiment.to_string(),
            season,
            kind,
            derivation: derivation.to_string(),
        }
    }

    /// Same address with another kind.
    pub fn with_kind(&self, kind: FieldKind) -> Self {
        Self { kind, ..self.clone() }
    }
}

/// One ensemble field, or one field per model.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldResult {
    /// Ensemble statistic or mask.
    Ensemble(Field),
    /// Field of each model, keyed by model name.
    PerModel(BTreeMap<String, Field>),
}

impl FieldResult {
    /// The ensemble field, if this is one.
    pub fn ensemble(&self) -> Option<&Field> {
        match self {
            Self::Ensemble(f) => Some(f),
            Self::PerModel(_) => None,
        }
    }

    /// The field of `model`, if this is a per-model result holding it.
    pub fn model(&self, model: &str) -> Option<&Field> {
        match self {
            Self::Ensemble(_) => None,
            Self::PerModel(m) => m.get(model),
        }
    }

    /// Per-model fields in model order; empty for ensemble results.
    pub fn models(&self) -> impl Iterator<Item = (&str, &Field)> {
        let per_model = match self {
            Self::Ensemble(_) => None,
            Self::PerModel(m) => Some(m.iter().map(|(k, v)| (k.as_str(), v))),
        };
        per_model.into_iter().flatten()
    }
}

/// Aggregated fields addressed by variable, experiment, season, kind and
/// derivation.
///
/// Per-model kinds always hold [`FieldResult::PerModel`] and the others
/// [`FieldResult::Ensemble`]; the insertion methods enforce it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateBundle {
    entries: BTreeMap<BundleKey, FieldResult>,
}

impl AggregateBundle {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(key: &BundleKey, per_model: bool) -> Result<(), AggregateError> {
        if key.kind.is_per_model() != per_model {
            return Err(AggregateError::KindMismatch {
                kind: key.kind.to_string(),
                expected: if key.kind.is_per_model() { "per-model" } else { "ensemble" },
            });
        }
        Ok(())
    }

    /// Stores an ensemble field, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::KindMismatch`] for per-model kinds.
    pub fn insert_ensemble(&mut self, key: BundleKey, field: Field) -> Result<(), AggregateError> {
        Self::check(&key, false)?;
        self.entries.insert(key, FieldResult::Ensemble(field));
        Ok(())
    }

    /// Stores the field of one model.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::KindMismatch`] for ensemble kinds.
    pub fn insert_model(&mut self, key: BundleKey, model: &str, field: Field) -> Result<(), AggregateError> {
        Self::check(&key, true)?;
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| FieldResult::PerModel(BTreeMap::new()));
        if let FieldResult::PerModel(m) = entry {
            m.insert(model.to_string(), field);
        }
        Ok(())
    }

    /// Stores a whole result.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::KindMismatch`] if the result shape does not
    /// match the kind.
    pub fn insert(&mut self, key: BundleKey, result: FieldResult) -> Result<(), AggregateError> {
        Self::check(&key, matches!(result, FieldResult::PerModel(_)))?;
        self.entries.insert(key, result);
        Ok(())
    }

    pub fn get(&self, key: &BundleKey) -> Option<&FieldResult> {
        self.entries.get(key)
    }

    /// Looks up a result by its address parts.
    pub fn lookup(
        &self,
        variable: &str,
        experiment: &str,
        season: Season,
        kind: FieldKind,
        derivation: &str,
    ) -> Option<&FieldResult> {
        self.get(&BundleKey::new(variable, experiment, season, kind, derivation))
    }

    /// Ensemble field at an address.
    pub fn ensemble(
        &self,
        variable: &str,
        experiment: &str,
        season: Season,
        kind: FieldKind,
        derivation: &str,
    ) -> Option<&Field> {
        self.lookup(variable, experiment, season, kind, derivation)
            .and_then(FieldResult::ensemble)
    }

    pub fn contains(&self, key: &BundleKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&BundleKey, &FieldResult)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BundleKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves every entry of `other` into `self`; entries of `other` win.
    pub fn merge(&mut self, other: AggregateBundle) {
        self.entries.extend(other.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delta_field::Grid;

    fn point(v: f64) -> Field {
        Field::filled(Grid::new("p", vec![0.0], vec![0.0]).unwrap(), v)
    }

    fn key(kind: FieldKind) -> BundleKey {
        BundleKey::new("pr", "ssp585", Season::Djf, kind, "plain")
    }

    #[test]
    fn per_model_results_accumulate() {
        let mut b = AggregateBundle::new();
        b.insert_model(key(FieldKind::Change), "A", point(2.0)).unwrap();
        b.insert_model(key(FieldKind::Change), "B", point(4.0)).unwrap();
        assert_eq!(b.len(), 1);
        let r = b.get(&key(FieldKind::Change)).unwrap();
        assert_eq!(r.models().map(|(m, _)| m).collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(r.model("B").unwrap().values()[[0, 0]], 4.0);
        assert!(r.ensemble().is_none());
    }

    #[test]
    fn kinds_enforce_shape() {
        let mut b = AggregateBundle::new();
        assert!(b.insert_model(key(FieldKind::MeanChange), "A", point(1.0)).is_err());
        assert!(b.insert_ensemble(key(FieldKind::Change), point(1.0)).is_err());
        assert!(b.insert(key(FieldKind::Stippling), FieldResult::Ensemble(point(1.0))).is_ok());
    }

    #[test]
    fn lookup_by_parts() {
        let mut b = AggregateBundle::new();
        b.insert_ensemble(key(FieldKind::MeanChange), point(1.5)).unwrap();
        let f = b
            .ensemble("pr", "ssp585", Season::Djf, FieldKind::MeanChange, "plain")
            .unwrap();
        assert_eq!(f.values()[[0, 0]], 1.5);
        assert!(b.lookup("pr", "ssp585", Season::Jja, FieldKind::MeanChange, "plain").is_none());
    }

    #[test]
    fn merge_overrides() {
        let mut a = AggregateBundle::new();
        a.insert_ensemble(key(FieldKind::MeanChange), point(1.0)).unwrap();
        let mut b = AggregateBundle::new();
        b.insert_ensemble(key(FieldKind::MeanChange), point(2.0)).unwrap();
        b.insert_ensemble(key(FieldKind::MedianChange), point(3.0)).unwrap();
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(&key(FieldKind::MeanChange)).unwrap().ensemble().unwrap().values()[[0, 0]], 2.0);
    }
}
