//! Per-model time statistics.

use std::f64::consts::SQRT_2;
use std::fmt;
use std::str::FromStr;

use delta_catalog::DatasetKey;
use delta_field::{Field, ensemble_std1};
use delta_period::{PeriodError, SamplingConfig, Season, sample};
use tracing::{debug, info_span};

use crate::derivation::{Derivation, OperatorRegistry};
use crate::error::EngineError;
use crate::executor::DatasetExecutor;
use crate::operation::{Operation, Pipeline};

/// Time statistic of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// Time mean (or the derivation's post-operator).
    Mean,
    /// Standard deviation (N-1) of the yearly or seasonal values.
    Std,
}

impl StatKind {
    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Mean => "mean",
            StatKind::Std => "std",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(StatKind::Mean),
            "std" => Ok(StatKind::Std),
            other => Err(format!("unknown statistic '{other}', expected mean or std")),
        }
    }
}

/// Computes per-model statistics through a [`DatasetExecutor`], resolving
/// derivation labels in an [`OperatorRegistry`].
#[derive(Debug, Clone)]
pub struct StatisticEngine<E> {
    executor: E,
    registry: OperatorRegistry,
}

impl<E: DatasetExecutor> StatisticEngine<E> {
    /// Creates an engine.
    pub fn new(executor: E, registry: OperatorRegistry) -> Self {
        Self { executor, registry }
    }

    /// The executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The derivation registry.
    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Looks up a derivation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownDerivation`] for an unregistered label.
    pub fn derivation(&self, label: &str) -> Result<&Derivation, EngineError> {
        self.registry.get(label)
    }

    /// Pipeline giving one value per year (whole year) or per season
    /// occurrence: the derivation's operator after season selection, or a
    /// yearly/seasonal mean.
    pub fn per_year_pipeline(season: Season, derivation: &Derivation) -> Pipeline {
        match (derivation.operator(), season.is_annual()) {
            (None, true) => Pipeline::from(vec![Operation::YearMean]),
            (None, false) => {
                Pipeline::from(vec![Operation::SelectSeason(season), Operation::SeasonMean])
            }
            (Some(op), true) => op.clone(),
            (Some(op), false) => Pipeline::from(vec![Operation::SelectSeason(season)]).then_all(op),
        }
    }

    /// Pipeline of a statistic.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedDerivation`] for [`StatKind::Std`]
    /// with a derivation that has a post-operator.
    pub fn pipeline(
        season: Season,
        stat: StatKind,
        detrend: bool,
        derivation: &Derivation,
    ) -> Result<Pipeline, EngineError> {
        let mut pipeline = Self::per_year_pipeline(season, derivation);
        match stat {
            StatKind::Mean => {
                pipeline = match derivation.post_operator() {
                    Some(post) => pipeline.then_all(post),
                    None => pipeline.then(Operation::TimeMean),
                };
            }
            StatKind::Std => {
                if derivation.post_operator().is_some() {
                    return Err(EngineError::UnsupportedDerivation {
                        derivation: derivation.label().to_string(),
                        statistic: "standard deviation",
                        reason: "it already reduces time with a post-operator".to_string(),
                    });
                }
                if detrend {
                    pipeline = pipeline.then(Operation::Detrend);
                }
                pipeline = pipeline.then(Operation::TimeStd1);
            }
        }
        Ok(pipeline)
    }

    /// Time statistic of a dataset over `key.period` for `season`, after the
    /// derivation `derivation` is applied.
    ///
    /// `detrend` only matters for [`StatKind::Std`]: a level-preserving
    /// detrend leaves the mean unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownDerivation`],
    /// [`EngineError::UnsupportedDerivation`], and executor errors.
    pub fn aggregate(
        &self,
        key: &DatasetKey,
        season: Season,
        stat: StatKind,
        detrend: bool,
        derivation: &str,
    ) -> Result<Field, EngineError> {
        let derivation = self.registry.get(derivation)?;
        let pipeline = Self::pipeline(season, stat, detrend, derivation)?;
        self.executor.field(key, &pipeline)
    }

    fn require_plain(derivation: &Derivation, statistic: &'static str) -> Result<(), EngineError> {
        if derivation.has_processing() {
            return Err(EngineError::UnsupportedDerivation {
                derivation: derivation.label().to_string(),
                statistic,
                reason: "it needs pre- or post-processing".to_string(),
            });
        }
        Ok(())
    }

    /// Inter-annual variability of a dataset: standard deviation (N-1) of
    /// the detrended yearly or seasonal means over `key.period`, times √2.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedDerivation`] before any computation
    /// if the derivation has an operator or a post-operator.
    pub fn interannual_variability(
        &self,
        key: &DatasetKey,
        season: Season,
        derivation: &str,
    ) -> Result<Field, EngineError> {
        let d = self.registry.get(derivation)?;
        Self::require_plain(d, "inter-annual variability")?;
        let pipeline = Self::pipeline(season, StatKind::Std, true, d)?;
        Ok(self.executor.field(key, &pipeline)?.scale(SQRT_2))
    }

    fn sample_control(
        control: &DatasetKey,
        sampling: &SamplingConfig,
    ) -> Result<delta_period::SliceEnsemble, EngineError> {
        sample(control.period, sampling).map_err(|e| match e {
            PeriodError::InsufficientData { .. } => EngineError::InsufficientData {
                model: control.model.clone(),
                source: e,
            },
            other => other.into(),
        })
    }

    /// Multi-decadal variability of a control run (AR5 Box 2.1).
    ///
    /// The control window is sampled into slices; the yearly values (after
    /// the derivation's operator) are optionally detrended over the whole
    /// window, reduced per slice by the post-operator or a time mean, and the
    /// slice ensemble's standard deviation (N-1) is multiplied by √2.
    ///
    /// `control.period` is the available control window.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientData`] if the window cannot host
    /// the slices, and executor errors.
    pub fn variability_ar5(
        &self,
        control: &DatasetKey,
        season: Season,
        derivation: &str,
        sampling: &SamplingConfig,
        detrend: bool,
    ) -> Result<Field, EngineError> {
        let _span = info_span!("variability", model = %control.model, season = %season).entered();
        let d = self.registry.get(derivation)?;
        let slices = Self::sample_control(control, sampling)?;
        let key = control.with_period(slices.window());

        let mut pipeline = Self::per_year_pipeline(season, d);
        if detrend {
            pipeline = pipeline.then(Operation::Detrend);
        }
        let series = self.executor.run(&key, &pipeline)?;

        let reduce = match d.post_operator() {
            Some(post) => post.clone(),
            None => Pipeline::from(vec![Operation::TimeMean]),
        };
        let members = slices
            .slices()
            .iter()
            .map(|slice| {
                let reduced = reduce.apply(series.crop(*slice))?;
                if reduced.len() != 1 {
                    return Err(EngineError::NotReduced {
                        pipeline: reduce.to_cdo_string(),
                        key: key.with_period(*slice).to_string(),
                        steps: reduced.len(),
                    });
                }
                Ok(reduced.step(0))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        debug!(
            window = %slices.window(),
            slices = members.len(),
            relaxed = slices.relaxed(),
            "sampled control run"
        );
        Ok(ensemble_std1(&members)?.scale(SQRT_2))
    }

    /// Inter-annual variability of a control run over the sampled window:
    /// detrended standard deviation (N-1) of yearly or seasonal means,
    /// times √2.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedDerivation`] for derivations with
    /// processing, [`EngineError::InsufficientData`] for short control runs,
    /// and executor errors.
    pub fn control_interannual_variability(
        &self,
        control: &DatasetKey,
        season: Season,
        derivation: &str,
        sampling: &SamplingConfig,
    ) -> Result<Field, EngineError> {
        let d = self.registry.get(derivation)?;
        Self::require_plain(d, "inter-annual variability")?;
        let slices = Self::sample_control(control, sampling)?;
        self.interannual_variability(&control.with_period(slices.window()), season, derivation)
    }
}
