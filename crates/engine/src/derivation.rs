//! Named transforms applied to a variable before time aggregation.

use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::operation::{Operation, Pipeline};

/// 1 mm/day as a precipitation flux in kg m-2 s-1.
pub const ONE_MM_PER_DAY: f64 = 1.0 / 86_400.0;

/// A named transform.
///
/// `operator` turns the raw series into one value per year (or season
/// occurrence) and replaces the default yearly/seasonal mean.
/// `post_operator` reduces those values over time and replaces the default
/// time mean.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    label: String,
    operator: Option<Pipeline>,
    post_operator: Option<Pipeline>,
}

impl Derivation {
    /// A derivation with neither operator nor post-operator.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            operator: None,
            post_operator: None,
        }
    }

    /// Sets the per-year operator.
    pub fn with_operator(mut self, pipeline: Pipeline) -> Self {
        self.operator = Some(pipeline);
        self
    }

    /// Sets the post-operator.
    pub fn with_post_operator(mut self, pipeline: Pipeline) -> Self {
        self.post_operator = Some(pipeline);
        self
    }

    /// Label, e.g. `dry`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Per-year operator, if any.
    pub fn operator(&self) -> Option<&Pipeline> {
        self.operator.as_ref()
    }

    /// Post-operator, if any.
    pub fn post_operator(&self) -> Option<&Pipeline> {
        self.post_operator.as_ref()
    }

    /// Returns `true` if the derivation changes the default processing.
    pub fn has_processing(&self) -> bool {
        self.operator.is_some() || self.post_operator.is_some()
    }
}

/// Registry of derivations by label.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    derivations: BTreeMap<String, Derivation>,
}

impl OperatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard derivations:
    ///
    /// | Label | Meaning |
    /// |-------|---------|
    /// | `plain` | the variable itself |
    /// | `dry` | annual count of days below 1 mm/day |
    /// | `drain` | annual mean daily rain over days above 1 mm/day |
    /// | `iav` | detrended standard deviation of the annual values |
    /// | `gini` | Gini index of the annual values |
    /// | `seasonality` | Walsh seasonality index, from monthly precipitation |
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let standard = [
            Derivation::new("plain"),
            Derivation::new("dry").with_operator(Pipeline::from(vec![
                Operation::LessThan(ONE_MM_PER_DAY),
                Operation::YearSum,
            ])),
            Derivation::new("drain").with_operator(Pipeline::from(vec![
                Operation::SetRangeToMissing {
                    low: -1.0,
                    high: ONE_MM_PER_DAY,
                },
                Operation::YearMean,
            ])),
            Derivation::new("iav").with_post_operator(Pipeline::from(vec![
                Operation::Detrend,
                Operation::TimeStd1,
            ])),
            Derivation::new("gini").with_post_operator(Pipeline::from(vec![Operation::Gini])),
            Derivation::new("seasonality")
                .with_operator(Pipeline::from(vec![Operation::Seasonality])),
        ];
        for derivation in standard {
            registry.derivations.insert(derivation.label.clone(), derivation);
        }
        registry
    }

    /// Adds a derivation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateDerivation`] if the label is taken.
    pub fn register(&mut self, derivation: Derivation) -> Result<(), EngineError> {
        match self.derivations.entry(derivation.label.clone()) {
            std::collections::btree_map::Entry::Occupied(_) => {
                Err(EngineError::DuplicateDerivation {
                    label: derivation.label,
                })
            }
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(derivation);
                Ok(())
            }
        }
    }

    /// Looks up a derivation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownDerivation`] for an unregistered label.
    pub fn get(&self, label: &str) -> Result<&Derivation, EngineError> {
        self.derivations
            .get(label)
            .ok_or_else(|| EngineError::UnknownDerivation {
                label: label.to_string(),
            })
    }

    /// Registered labels, sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.derivations.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_labels() {
        let registry = OperatorRegistry::standard();
        let labels: Vec<&str> = registry.labels().collect();
        assert_eq!(labels, ["drain", "dry", "gini", "iav", "plain", "seasonality"]);
    }

    #[test]
    fn standard_pipelines_render() {
        let registry = OperatorRegistry::standard();
        let dry = registry.get("dry").unwrap();
        assert_eq!(
            dry.operator().unwrap().to_cdo_string(),
            format!("yearsum -ltc,{ONE_MM_PER_DAY}")
        );
        assert!(dry.post_operator().is_none());
        let iav = registry.get("iav").unwrap();
        assert_eq!(iav.post_operator().unwrap().to_cdo_string(), "timstd1 -detrend");
        assert!(!registry.get("plain").unwrap().has_processing());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = OperatorRegistry::standard();
        let err = registry.register(Derivation::new("dry")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateDerivation { ref label } if label == "dry"));
        registry
            .register(Derivation::new("wet").with_operator(Pipeline::from(vec![Operation::YearSum])))
            .unwrap();
        assert!(registry.get("wet").is_ok());
    }

    #[test]
    fn unknown_label() {
        let registry = OperatorRegistry::new();
        assert!(matches!(
            registry.get("plain"),
            Err(EngineError::UnknownDerivation { .. })
        ));
    }
}
