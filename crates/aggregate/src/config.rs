//! Aggregation settings.

use std::fmt;
use std::str::FromStr;

use delta_catalog::table_for_variable;
use delta_field::Grid;
use delta_period::{SamplingConfig, Season, YearRange};

use crate::error::AggregateError;
use crate::kind::FieldKind;

/// Robustness scheme used to qualify ensemble changes.
///
/// All masks whose inputs exist are computed; the scheme names the ones a
/// consumer should draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RobustnessScheme {
    /// Stippling where the change is large and models agree, hatching where
    /// the change is small compared to internal variability.
    #[default]
    Ar5,
    /// Low-change and conflicting-signal masks.
    Ar6,
    /// Sign-disagreement mask only; needs no control run.
    Ar6Simple,
}

impl RobustnessScheme {
    /// Mask fields drawn under this scheme.
    pub fn mask_kinds(&self) -> &'static [FieldKind] {
        match self {
            Self::Ar5 => &[FieldKind::Stippling, FieldKind::Hatching],
            Self::Ar6 => &[FieldKind::LowChange, FieldKind::Conflict],
            Self::Ar6Simple => &[FieldKind::SignDisagreement],
        }
    }

    /// Returns `true` if the masks need control-run variability.
    pub fn needs_variability(&self) -> bool {
        !matches!(self, Self::Ar6Simple)
    }
}

impl fmt::Display for RobustnessScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ar5 => "AR5",
            Self::Ar6 => "AR6",
            Self::Ar6Simple => "AR6S",
        })
    }
}

impl FromStr for RobustnessScheme {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AR5" => Ok(Self::Ar5),
            "AR6" => Ok(Self::Ar6),
            "AR6S" | "AR6-SIMPLE" => Ok(Self::Ar6Simple),
            _ => Err(AggregateError::InvalidConfig {
                reason: format!("unknown robustness scheme '{s}' (expected AR5, AR6 or AR6S)"),
            }),
        }
    }
}

/// What to aggregate and how.
///
/// Defaults follow common CMIP6 practice: precipitation, `historical`
/// 1995-2014 against `ssp245` 2081-2100, annual means, relative changes,
/// results remapped to a 1° grid, AR5 variability from 20-year control
/// slices.
///
/// # Example
///
/// ```
/// use delta_aggregate::{AggregateConfig, RobustnessScheme};
/// use delta_period::{Season, YearRange};
///
/// let config = AggregateConfig::new("tas")
///     .with_experiments(["ssp585"])
///     .with_seasons([Season::Djf, Season::Jja])
///     .with_projection_period(YearRange::new(2041, 2060).unwrap())
///     .with_relative(false)
///     .with_scheme(RobustnessScheme::Ar6);
/// assert_eq!(config.table(), "Amon");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateConfig {
    project: String,
    variable: String,
    table: Option<String>,
    reference_experiment: String,
    experiments: Vec<String>,
    seasons: Vec<Season>,
    reference_period: YearRange,
    projection_period: YearRange,
    derivation: String,
    relative: bool,
    standardized: bool,
    threshold: Option<f64>,
    common_grid: Option<String>,
    sampling: Option<SamplingConfig>,
    detrend: bool,
    scheme: RobustnessScheme,
    low_change_agree_threshold: f64,
    magnitude_fraction_threshold: f64,
    sign_agree_threshold: f64,
    stippling_sign_agreement: f64,
}

impl AggregateConfig {
    /// Default settings for `variable`.
    pub fn new(variable: &str) -> Self {
        Self {
            variable: variable.to_string(),
            ..Self::default()
        }
    }

    /// Sets the project, e.g. `CMIP6`.
    pub fn with_project(mut self, project: &str) -> Self {
        self.project = project.to_string();
        self
    }

    /// Sets the table explicitly instead of deriving it from the variable.
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Sets the reference experiment.
    pub fn with_reference_experiment(mut self, experiment: &str) -> Self {
        self.reference_experiment = experiment.to_string();
        self
    }

    /// Sets the projection experiments.
    pub fn with_experiments<I, S>(mut self, experiments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.experiments = experiments.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the seasons.
    pub fn with_seasons(mut self, seasons: impl IntoIterator<Item = Season>) -> Self {
        self.seasons = seasons.into_iter().collect();
        self
    }

    /// Sets the reference period.
    pub fn with_reference_period(mut self, period: YearRange) -> Self {
        self.reference_period = period;
        self
    }

    /// Sets the projection period.
    pub fn with_projection_period(mut self, period: YearRange) -> Self {
        self.projection_period = period;
        self
    }

    /// Sets the derivation label.
    pub fn with_derivation(mut self, label: &str) -> Self {
        self.derivation = label.to_string();
        self
    }

    /// Enables or disables relative changes.
    pub fn with_relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    /// Enables or disables standardized changes.
    pub fn with_standardized(mut self, standardized: bool) -> Self {
        self.standardized = standardized;
        self
    }

    /// Reference values below `threshold` are missing in relative changes.
    pub fn with_threshold(mut self, threshold: Option<f64>) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the common grid spec (`r<nlon>x<nlat>`); `None` keeps native grids.
    pub fn with_common_grid(mut self, grid: Option<&str>) -> Self {
        self.common_grid = grid.map(str::to_string);
        self
    }

    /// Sets the control-run sampling; `None` disables variability.
    pub fn with_sampling(mut self, sampling: Option<SamplingConfig>) -> Self {
        self.sampling = sampling;
        self
    }

    /// Whether control-run series are detrended before slicing.
    pub fn with_detrend(mut self, detrend: bool) -> Self {
        self.detrend = detrend;
        self
    }

    /// Sets the robustness scheme.
    pub fn with_scheme(mut self, scheme: RobustnessScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the bound on `|change / variability|` under which a model
    /// counts as showing a low change.
    pub fn with_low_change_agree_threshold(mut self, threshold: f64) -> Self {
        self.low_change_agree_threshold = threshold;
        self
    }

    /// Sets the fraction of low-change models above which a cell is
    /// flagged as low change.
    pub fn with_magnitude_fraction_threshold(mut self, fraction: f64) -> Self {
        self.magnitude_fraction_threshold = fraction;
        self
    }

    /// Sets the sign-agreement fraction under which signals conflict.
    pub fn with_sign_agree_threshold(mut self, fraction: f64) -> Self {
        self.sign_agree_threshold = fraction;
        self
    }

    /// Sets the sign-agreement fraction required for stippling.
    pub fn with_stippling_sign_agreement(mut self, fraction: f64) -> Self {
        self.stippling_sign_agreement = fraction;
        self
    }

    /// Returns the project.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Returns the variable.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Table of the variable: the explicit one, or the usual table for it.
    pub fn table(&self) -> &str {
        self.table
            .as_deref()
            .unwrap_or_else(|| table_for_variable(&self.variable))
    }

    /// Returns the reference experiment.
    pub fn reference_experiment(&self) -> &str {
        &self.reference_experiment
    }

    /// Returns the projection experiments.
    pub fn experiments(&self) -> &[String] {
        &self.experiments
    }

    /// Returns the seasons.
    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    /// Returns the reference period.
    pub fn reference_period(&self) -> YearRange {
        self.reference_period
    }

    /// Returns the projection period.
    pub fn projection_period(&self) -> YearRange {
        self.projection_period
    }

    /// Returns the derivation label.
    pub fn derivation(&self) -> &str {
        &self.derivation
    }

    /// Returns whether relative changes are computed.
    pub fn relative(&self) -> bool {
        self.relative
    }

    /// Returns whether standardized changes are computed.
    pub fn standardized(&self) -> bool {
        self.standardized
    }

    /// Returns the reference floor of relative changes.
    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    /// Returns the common grid spec, if any.
    pub fn common_grid(&self) -> Option<&str> {
        self.common_grid.as_deref()
    }

    /// Returns the control-run sampling, if any.
    pub fn sampling(&self) -> Option<&SamplingConfig> {
        self.sampling.as_ref()
    }

    /// Returns whether control-run series are detrended.
    pub fn detrend(&self) -> bool {
        self.detrend
    }

    /// Returns the robustness scheme.
    pub fn scheme(&self) -> RobustnessScheme {
        self.scheme
    }

    /// Returns the low-change bound on `|change / variability|`.
    pub fn low_change_agree_threshold(&self) -> f64 {
        self.low_change_agree_threshold
    }

    /// Returns the low-change model fraction threshold.
    pub fn magnitude_fraction_threshold(&self) -> f64 {
        self.magnitude_fraction_threshold
    }

    /// Returns the conflict sign-agreement threshold.
    pub fn sign_agree_threshold(&self) -> f64 {
        self.sign_agree_threshold
    }

    /// Returns the stippling sign-agreement threshold.
    pub fn stippling_sign_agreement(&self) -> f64 {
        self.stippling_sign_agreement
    }

    /// Parses the common grid, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Field`] for a malformed grid spec.
    pub fn target_grid(&self) -> Result<Option<Grid>, AggregateError> {
        Ok(self.common_grid.as_deref().map(Grid::from_spec).transpose()?)
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidConfig`] for empty lists, out-of-range
    /// thresholds, or standardized changes without control-run sampling, and
    /// the sampler or grid error for a bad sampling or grid spec.
    pub fn validate(&self) -> Result<(), AggregateError> {
        let invalid = |reason: String| Err(AggregateError::InvalidConfig { reason });
        if self.variable.is_empty() {
            return invalid("no variable".to_string());
        }
        if self.experiments.is_empty() {
            return invalid("no projection experiment".to_string());
        }
        if self.seasons.is_empty() {
            return invalid("no season".to_string());
        }
        if self.standardized && self.sampling.is_none() {
            return invalid("standardized changes need control-run sampling".to_string());
        }
        if let Some(t) = self.threshold
            && !t.is_finite()
        {
            return invalid(format!("threshold must be finite, got {t}"));
        }
        if !self.low_change_agree_threshold.is_finite() || self.low_change_agree_threshold <= 0.0 {
            return invalid(format!(
                "low_change_agree_threshold must be finite and > 0, got {}",
                self.low_change_agree_threshold
            ));
        }
        for (name, value) in [
            ("magnitude_fraction_threshold", self.magnitude_fraction_threshold),
            ("sign_agree_threshold", self.sign_agree_threshold),
            ("stippling_sign_agreement", self.stippling_sign_agreement),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        if let Some(sampling) = &self.sampling {
            sampling.validate()?;
        }
        self.target_grid()?;
        Ok(())
    }
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            project: "CMIP6".to_string(),
            variable: "pr".to_string(),
            table: None,
            reference_experiment: "historical".to_string(),
            experiments: vec!["ssp245".to_string()],
            seasons: vec![Season::Ann],
            reference_period: YearRange::spanning(1995, 2014),
            projection_period: YearRange::spanning(2081, 2100),
            derivation: "plain".to_string(),
            relative: true,
            standardized: false,
            threshold: None,
            common_grid: Some("r360x180".to_string()),
            sampling: Some(SamplingConfig::default()),
            detrend: true,
            scheme: RobustnessScheme::Ar5,
            low_change_agree_threshold: 1.645,
            magnitude_fraction_threshold: 0.33,
            sign_agree_threshold: 0.8,
            stippling_sign_agreement: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let c = AggregateConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.table(), "Amon");
        assert_eq!(c.reference_period().to_string(), "1995-2014");
    }

    #[test]
    fn explicit_table_wins() {
        let c = AggregateConfig::new("tos").with_table("Oday");
        assert_eq!(c.table(), "Oday");
    }

    #[test]
    fn standardized_requires_sampling() {
        let c = AggregateConfig::default()
            .with_standardized(true)
            .with_sampling(None);
        assert!(matches!(c.validate(), Err(AggregateError::InvalidConfig { .. })));
    }

    #[test]
    fn fractions_must_be_fractions() {
        let c = AggregateConfig::default().with_sign_agree_threshold(80.0);
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("sign_agree_threshold"));
    }

    #[test]
    fn bad_grid_spec_rejected() {
        let c = AggregateConfig::default().with_common_grid(Some("n96"));
        assert!(matches!(c.validate(), Err(AggregateError::Field(_))));
    }

    #[test]
    fn empty_lists_rejected() {
        let c = AggregateConfig::default().with_seasons([]);
        assert!(c.validate().is_err());
        let c = AggregateConfig::default().with_experiments(Vec::<String>::new());
        assert!(c.validate().is_err());
    }

    #[test]
    fn scheme_tokens() {
        assert_eq!("ar6s".parse::<RobustnessScheme>().unwrap(), RobustnessScheme::Ar6Simple);
        assert_eq!(RobustnessScheme::Ar6.to_string(), "AR6");
        assert!("AR4".parse::<RobustnessScheme>().is_err());
        assert!(!RobustnessScheme::Ar6Simple.needs_variability());
        assert_eq!(
            RobustnessScheme::Ar5.mask_kinds(),
            &[FieldKind::Stippling, FieldKind::Hatching]
        );
    }
}
