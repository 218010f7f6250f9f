//! Names of the fields an aggregation produces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AggregateError;

/// One kind of aggregated field.
///
/// Per-model kinds hold one field per model; the others hold one ensemble
/// field. String forms are the snake-case names used in cache file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKind {
    /// Reference-period statistic on the native grid.
    Reference,
    /// Reference-period statistic on the common grid.
    ReferenceRemapped,
    /// Projection-period statistic on the native grid.
    Projection,
    /// Projection-period statistic on the common grid.
    ProjectionRemapped,
    /// Projection minus reference.
    Change,
    /// Change in percent of the reference.
    RChange,
    /// Change divided by inter-annual variability.
    SChange,
    /// Change divided by the model's own multi-decadal variability.
    NChange,
    /// Multi-decadal variability of the control run.
    Variability,
    MeanChange,
    MedianChange,
    MeanRChange,
    MedianRChange,
    /// Relative change of the ensemble means of projection and reference.
    MeansRChange,
    MeanSChange,
    MedianSChange,
    /// Fraction of models agreeing on the sign of the change.
    AgreementFractionOnSign,
    MedianVariability,
    /// Large change with sign agreement.
    Stippling,
    /// Change smaller than variability.
    Hatching,
    /// Fraction of models with a low normalized change.
    AgreeLow,
    /// Most models show a low change.
    LowChange,
    /// Models disagree on the sign of a non-low change.
    Conflict,
    /// Sign agreement at or below the threshold.
    SignDisagreement,
}

impl FieldKind {
    /// Every kind, per-model kinds first.
    pub const ALL: [FieldKind; 24] = [
        Self::Reference,
        Self::ReferenceRemapped,
        Self::Projection,
        Self::ProjectionRemapped,
        Self::Change,
        Self::RChange,
        Self::SChange,
        Self::NChange,
        Self::Variability,
        Self::MeanChange,
        Self::MedianChange,
        Self::MeanRChange,
        Self::MedianRChange,
        Self::MeansRChange,
        Self::MeanSChange,
        Self::MedianSChange,
        Self::AgreementFractionOnSign,
        Self::MedianVariability,
        Self::Stippling,
        Self::Hatching,
        Self::AgreeLow,
        Self::LowChange,
        Self::Conflict,
        Self::SignDisagreement,
    ];

    /// Returns `true` for kinds holding one field per model.
    pub fn is_per_model(&self) -> bool {
        matches!(
            self,
            Self::Reference
                | Self::ReferenceRemapped
                | Self::Projection
                | Self::ProjectionRemapped
                | Self::Change
                | Self::RChange
                | Self::SChange
                | Self::NChange
                | Self::Variability
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::ReferenceRemapped => "reference_remapped",
            Self::Projection => "projection",
            Self::ProjectionRemapped => "projection_remapped",
            Self::Change => "change",
            Self::RChange => "rchange",
            Self::SChange => "schange",
            Self::NChange => "nchange",
            Self::Variability => "variability",
            Self::MeanChange => "mean_change",
            Self::MedianChange => "median_change",
            Self::MeanRChange => "mean_rchange",
            Self::MedianRChange => "median_rchange",
            Self::MeansRChange => "means_rchange",
            Self::MeanSChange => "mean_schange",
            Self::MedianSChange => "median_schange",
            Self::AgreementFractionOnSign => "agreement_fraction_on_sign",
            Self::MedianVariability => "median_variability",
            Self::Stippling => "stippling",
            Self::Hatching => "hatching",
            Self::AgreeLow => "agree_low",
            Self::LowChange => "lowchange",
            Self::Conflict => "conflict",
            Self::SignDisagreement => "sign_disagreement",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| AggregateError::UnknownFieldKind { name: s.to_string() })
    }
}

impl TryFrom<String> for FieldKind {
    type Error = AggregateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FieldKind> for String {
    fn from(k: FieldKind) -> Self {
        k.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(kind.as_str().parse::<FieldKind>().unwrap(), kind);
        }
    }

    #[test]
    fn names_have_no_delimiter() {
        assert!(FieldKind::ALL.iter().all(|k| !k.as_str().contains('=')));
    }

    #[test]
    fn per_model_kinds() {
        assert!(FieldKind::Change.is_per_model());
        assert!(FieldKind::Variability.is_per_model());
        assert!(!FieldKind::MeanChange.is_per_model());
        assert!(!FieldKind::Stippling.is_per_model());
        assert_eq!(FieldKind::ALL.iter().filter(|k| k.is_per_model()).count(), 9);
    }

    #[test]
    fn unknown_name() {
        let err = "mean_changes".parse::<FieldKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown field kind 'mean_changes'");
    }
}
