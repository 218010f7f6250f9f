//! Per-model changes reduced to ensemble fields and robustness masks.

use std::collections::BTreeMap;

use delta_catalog::VersionCatalog;
use delta_engine::{DatasetExecutor, EngineError, RegridPolicy, StatKind, StatisticEngine};
use delta_field::{Field, FieldError, Grid, RemapMethod, ensemble_mean, ensemble_median, remap};
use delta_period::{SamplingConfig, Season};
use delta_select::{ModelVariant, ModelVariantSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::bundle::{AggregateBundle, BundleKey};
use crate::config::AggregateConfig;
use crate::diagnostics::{Diagnostics, MissingCommonModels, ModelStatistics, SessionSummary, SkippedModel};
use crate::error::AggregateError;
use crate::kind::FieldKind;
use crate::models::ExperimentModels;
use crate::robustness::{agreement_fraction_on_lower, agreement_fraction_on_sign, ar5_masks, ar6_masks, sign_disagreement};

/// Progress of one (experiment, season) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Per-model statistics and changes.
    CollectingPerModel,
    /// Ensemble means, medians and sign agreement.
    ReducingEnsemble,
    /// Variability-based masks.
    ComputingRobustness,
    /// Every field with available inputs is stored.
    Done,
}

/// Fields and diagnostics of an aggregation.
#[derive(Debug, Clone, Default)]
pub struct AggregateOutcome {
    /// Every field computed for the configured sessions.
    pub bundle: AggregateBundle,
    /// Skipped models, degraded sessions and per-session summaries.
    pub diagnostics: Diagnostics,
}

/// Changes of one model.
struct ModelChange {
    variant: ModelVariant,
    reference: Field,
    projection: Field,
    reference_remapped: Field,
    projection_remapped: Field,
    /// On the common grid, like every field below.
    change: Field,
    rchange: Option<Field>,
    schange: Option<Field>,
}

impl ModelChange {
    fn statistics(&self, experiment: &str, season: Season) -> ModelStatistics {
        ModelStatistics {
            experiment: experiment.to_string(),
            season,
            model: self.variant.model.clone(),
            realization: self.variant.realization.clone(),
            reference_mean: self.reference.area_mean(None),
            projection_mean: self.projection.area_mean(None),
            change_mean: self.change.area_mean(None),
            rchange_median: self.rchange.as_ref().and_then(Field::cell_median),
            schange_mean: self.schange.as_ref().and_then(|f| f.area_mean(None)),
        }
    }
}

struct Session<'s> {
    experiment: &'s str,
    season: Season,
    stage: Stage,
}

impl Session<'_> {
    fn advance(&mut self, next: Stage) {
        debug!(from = ?self.stage, to = ?next, "session stage");
        self.stage = next;
    }
}

/// Computes per-model changes and reduces them across the ensemble, one
/// session per (experiment, season).
///
/// A model whose control run is too short is dropped from the variability
/// with a warning; any other error while collecting per-model fields aborts
/// the run. An error while reducing leaves the session degraded, keeping the
/// per-model fields already stored.
pub struct ChangeAggregator<'a, E> {
    engine: &'a StatisticEngine<E>,
    catalog: &'a VersionCatalog,
    policy: &'a RegridPolicy,
    config: AggregateConfig,
    target: Option<Grid>,
}

impl<'a, E: DatasetExecutor> ChangeAggregator<'a, E> {
    /// Creates an aggregator.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of [`AggregateConfig::validate`].
    pub fn new(
        engine: &'a StatisticEngine<E>,
        catalog: &'a VersionCatalog,
        policy: &'a RegridPolicy,
        config: AggregateConfig,
    ) -> Result<Self, AggregateError> {
        config.validate()?;
        let target = config.target_grid()?;
        Ok(Self {
            engine,
            catalog,
            policy,
            config,
            target,
        })
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    /// Runs every configured (experiment, season) session.
    ///
    /// `models` maps each projection experiment to its model sets.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownDerivation`] or
    /// [`EngineError::UnsupportedDerivation`] before any computation,
    /// [`AggregateError::NoModels`] for an experiment without model sets, and
    /// the first non per-model error met while collecting.
    pub fn run(&self, models: &BTreeMap<String, ExperimentModels>) -> Result<AggregateOutcome, AggregateError> {
        let derivation = self.engine.derivation(self.config.derivation())?;
        if self.config.standardized() && derivation.has_processing() {
            return Err(EngineError::UnsupportedDerivation {
                derivation: derivation.label().to_string(),
                statistic: "standardized changes",
                reason: "inter-annual variability needs a derivation without processing".to_string(),
            }
            .into());
        }

        let mut outcome = AggregateOutcome::default();
        for experiment in self.config.experiments() {
            let sets = models.get(experiment).ok_or_else(|| AggregateError::NoModels {
                experiment: experiment.clone(),
            })?;
            for &season in self.config.seasons() {
                self.session(experiment, season, sets, &mut outcome)?;
            }
        }
        info!(
            fields = outcome.bundle.len(),
            skipped = outcome.diagnostics.skipped.len(),
            "aggregation done"
        );
        Ok(outcome)
    }

    fn key(&self, session: &Session<'_>, kind: FieldKind) -> BundleKey {
        BundleKey::new(
            self.config.variable(),
            session.experiment,
            session.season,
            kind,
            self.config.derivation(),
        )
    }

    fn session(
        &self,
        experiment: &str,
        season: Season,
        sets: &ExperimentModels,
        outcome: &mut AggregateOutcome,
    ) -> Result<(), AggregateError> {
        let _span = info_span!("session", experiment, season = %season).entered();
        let mut session = Session {
            experiment,
            season,
            stage: Stage::CollectingPerModel,
        };

        let changes = self.collect_changes(&session, &sets.changes, &mut outcome.diagnostics)?;
        let variability = self.collect_variability(&session, &sets.control, &mut outcome.diagnostics)?;
        for c in &changes {
            self.store_model(&session, c, &mut outcome.bundle)?;
            outcome.diagnostics.models.push(c.statistics(experiment, season));
        }
        for (model, v) in &variability {
            outcome
                .bundle
                .insert_model(self.key(&session, FieldKind::Variability), model, v.clone())?;
        }

        let mut masks = Vec::new();
        let mut degraded = changes.is_empty();
        if degraded {
            warn!("no model left for the ensemble");
        } else {
            session.advance(Stage::ReducingEnsemble);
            match self.reduce(&mut session, &changes, &variability, outcome, &mut masks) {
                Ok(()) => session.advance(Stage::Done),
                Err(AggregateError::Field(e)) => {
                    warn!(stage = ?session.stage, error = %e, "ensemble reduction failed");
                    degraded = true;
                }
                Err(e) => return Err(e),
            }
        }
        outcome.diagnostics.sessions.push(SessionSummary {
            experiment: experiment.to_string(),
            season,
            models: changes.len(),
            variability_models: variability.len(),
            masks,
            stage: session.stage,
            degraded,
        });
        Ok(())
    }

    fn collect_changes(
        &self,
        session: &Session<'_>,
        models: &ModelVariantSet,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<ModelChange>, AggregateError> {
        let mut out = Vec::with_capacity(models.len());
        for variant in models {
            match self.model_change(session, variant) {
                Ok(c) => out.push(c),
                Err(e) if e.is_per_model() => {
                    warn!(model = %variant.model, error = %e, "model skipped");
                    diagnostics.skipped.push(skipped(session, variant, "changes", &e));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    fn collect_variability(
        &self,
        session: &Session<'_>,
        models: &ModelVariantSet,
        diagnostics: &mut Diagnostics,
    ) -> Result<BTreeMap<String, Field>, AggregateError> {
        let mut out = BTreeMap::new();
        let Some(sampling) = self.config.sampling() else {
            return Ok(out);
        };
        for variant in models {
            match self.model_variability(session.season, variant, sampling) {
                Ok(v) => {
                    out.insert(variant.model.clone(), v);
                }
                Err(e) if e.is_per_model() => {
                    warn!(model = %variant.model, error = %e, "model skipped for variability");
                    diagnostics.skipped.push(skipped(session, variant, "variability", &e));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    fn to_common(&self, field: &Field, method: RemapMethod) -> Result<Field, FieldError> {
        match &self.target {
            Some(grid) => remap(field, grid, method),
            None => Ok(field.clone()),
        }
    }

    fn model_change(&self, session: &Session<'_>, variant: &ModelVariant) -> Result<ModelChange, AggregateError> {
        let cfg = &self.config;
        let (model, realization) = (variant.model.as_str(), variant.realization.as_str());
        let reference_key = self.catalog.dataset_key(
            cfg.project(),
            cfg.reference_experiment(),
            cfg.variable(),
            cfg.table(),
            model,
            realization,
            cfg.reference_period(),
        )?;
        let projection_key = self.catalog.dataset_key(
            cfg.project(),
            session.experiment,
            cfg.variable(),
            cfg.table(),
            model,
            realization,
            cfg.projection_period(),
        )?;
        let method = self
            .policy
            .method(cfg.variable(), cfg.table(), model, &reference_key.grid, cfg.common_grid());

        let season = session.season;
        let reference = self
            .engine
            .aggregate(&reference_key, season, StatKind::Mean, false, cfg.derivation())?;
        let projection = self
            .engine
            .aggregate(&projection_key, season, StatKind::Mean, false, cfg.derivation())?;
        let change = projection.minus(&reference)?;
        let rchange = cfg
            .relative()
            .then(|| Field::relative_change(&projection, &reference, cfg.threshold()))
            .transpose()?;
        let schange = if cfg.standardized() {
            let iav = self
                .engine
                .interannual_variability(&reference_key, season, cfg.derivation())?;
            Some(change.ratio(&iav)?)
        } else {
            None
        };
        debug!(model, realization, method = %method, "model change");

        Ok(ModelChange {
            variant: variant.clone(),
            reference_remapped: self.to_common(&reference, method)?,
            projection_remapped: self.to_common(&projection, method)?,
            change: self.to_common(&change, method)?,
            rchange: rchange.map(|f| self.to_common(&f, method)).transpose()?,
            schange: schange.map(|f| self.to_common(&f, method)).transpose()?,
            reference,
            projection,
        })
    }

    fn model_variability(
        &self,
        season: Season,
        variant: &ModelVariant,
        sampling: &SamplingConfig,
    ) -> Result<Field, AggregateError> {
        let cfg = &self.config;
        let control = self.catalog.control_key(
            cfg.project(),
            cfg.variable(),
            cfg.table(),
            &variant.model,
            &variant.realization,
        )?;
        let method = self
            .policy
            .method(cfg.variable(), cfg.table(), &variant.model, &control.grid, cfg.common_grid());
        let mut variability = self
            .engine
            .variability_ar5(&control, season, cfg.derivation(), sampling, cfg.detrend())?;
        if cfg.standardized() {
            let iav = self
                .engine
                .control_interannual_variability(&control, season, cfg.derivation(), sampling)?;
            variability = variability.ratio(&iav)?;
        }
        Ok(self.to_common(&variability, method)?)
    }

    fn store_model(
        &self,
        session: &Session<'_>,
        c: &ModelChange,
        bundle: &mut AggregateBundle,
    ) -> Result<(), AggregateError> {
        let model = c.variant.model.as_str();
        let fields = [
            (FieldKind::Reference, Some(&c.reference)),
            (FieldKind::ReferenceRemapped, Some(&c.reference_remapped)),
            (FieldKind::Projection, Some(&c.projection)),
            (FieldKind::ProjectionRemapped, Some(&c.projection_remapped)),
            (FieldKind::Change, Some(&c.change)),
            (FieldKind::RChange, c.rchange.as_ref()),
            (FieldKind::SChange, c.schange.as_ref()),
        ];
        for (kind, field) in fields {
            if let Some(field) = field {
                bundle.insert_model(self.key(session, kind), model, field.clone())?;
            }
        }
        Ok(())
    }

    fn reduce(
        &self,
        session: &mut Session<'_>,
        changes: &[ModelChange],
        variability: &BTreeMap<String, Field>,
        outcome: &mut AggregateOutcome,
        masks: &mut Vec<String>,
    ) -> Result<(), AggregateError> {
        let cfg = &self.config;
        let bundle = &mut outcome.bundle;

        let change: Vec<&Field> = changes.iter().map(|c| &c.change).collect();
        let mean_change = ensemble_mean(change.iter().copied())?;
        bundle.insert_ensemble(self.key(session, FieldKind::MeanChange), mean_change.clone())?;
        bundle.insert_ensemble(
            self.key(session, FieldKind::MedianChange),
            ensemble_median(change.iter().copied())?,
        )?;

        if cfg.relative() {
            let rchange: Vec<&Field> = changes.iter().filter_map(|c| c.rchange.as_ref()).collect();
            bundle.insert_ensemble(
                self.key(session, FieldKind::MeanRChange),
                ensemble_mean(rchange.iter().copied())?,
            )?;
            bundle.insert_ensemble(
                self.key(session, FieldKind::MedianRChange),
                ensemble_median(rchange.iter().copied())?,
            )?;
            let mean_reference = ensemble_mean(changes.iter().map(|c| &c.reference_remapped))?;
            let mean_projection = ensemble_mean(changes.iter().map(|c| &c.projection_remapped))?;
            bundle.insert_ensemble(
                self.key(session, FieldKind::MeansRChange),
                Field::relative_change(&mean_projection, &mean_reference, None)?,
            )?;
        }

        // signal whose sign and magnitude qualify robustness
        let signal: Vec<&Field> = if cfg.standardized() {
            changes.iter().filter_map(|c| c.schange.as_ref()).collect()
        } else {
            change.clone()
        };
        let mean_signal = if cfg.standardized() {
            let mean = ensemble_mean(signal.iter().copied())?;
            bundle.insert_ensemble(self.key(session, FieldKind::MeanSChange), mean.clone())?;
            bundle.insert_ensemble(
                self.key(session, FieldKind::MedianSChange),
                ensemble_median(signal.iter().copied())?,
            )?;
            mean
        } else {
            mean_change
        };
        let agreement = agreement_fraction_on_sign(&signal)?;
        bundle.insert_ensemble(self.key(session, FieldKind::AgreementFractionOnSign), agreement.clone())?;

        session.advance(Stage::ComputingRobustness);
        bundle.insert_ensemble(
            self.key(session, FieldKind::SignDisagreement),
            sign_disagreement(&agreement, cfg.sign_agree_threshold()),
        )?;
        masks.push(FieldKind::SignDisagreement.to_string());

        if variability.is_empty() {
            debug!("no control-run variability");
            return Ok(());
        }
        let median_variability = ensemble_median(variability.values())?;
        let (stippling, hatching) = ar5_masks(
            &mean_signal,
            &median_variability,
            &agreement,
            cfg.stippling_sign_agreement(),
        )?;
        bundle.insert_ensemble(self.key(session, FieldKind::MedianVariability), median_variability)?;
        bundle.insert_ensemble(self.key(session, FieldKind::Stippling), stippling)?;
        bundle.insert_ensemble(self.key(session, FieldKind::Hatching), hatching)?;
        masks.extend([FieldKind::Stippling.to_string(), FieldKind::Hatching.to_string()]);

        let normalized = changes
            .iter()
            .zip(&signal)
            .filter_map(|(c, s)| {
                variability
                    .get(&c.variant.model)
                    .map(|v| s.ratio(v).map(|n| (c.variant.model.clone(), n)))
            })
            .collect::<Result<BTreeMap<String, Field>, FieldError>>()?;
        if normalized.is_empty() {
            let changes_models: Vec<String> = changes.iter().map(|c| c.variant.model.clone()).collect();
            let variability_models: Vec<String> = variability.keys().cloned().collect();
            warn!(
                changes = ?changes_models,
                variability = ?variability_models,
                "no model shared by changes and variability; low-change masks skipped"
            );
            outcome.diagnostics.missing_common.push(MissingCommonModels {
                experiment: session.experiment.to_string(),
                season: session.season,
                changes_models,
                variability_models,
            });
            return Ok(());
        }
        for (model, n) in &normalized {
            bundle.insert_model(self.key(session, FieldKind::NChange), model, n.clone())?;
        }
        let members: Vec<&Field> = normalized.values().collect();
        let agree_low = agreement_fraction_on_lower(&members, cfg.low_change_agree_threshold())?;
        let (lowchange, conflict) = ar6_masks(
            &agreement,
            &agree_low,
            cfg.magnitude_fraction_threshold(),
            cfg.sign_agree_threshold(),
        )?;
        bundle.insert_ensemble(self.key(session, FieldKind::AgreeLow), agree_low)?;
        bundle.insert_ensemble(self.key(session, FieldKind::LowChange), lowchange)?;
        bundle.insert_ensemble(self.key(session, FieldKind::Conflict), conflict)?;
        masks.extend([FieldKind::LowChange.to_string(), FieldKind::Conflict.to_string()]);
        Ok(())
    }
}

fn skipped(session: &Session<'_>, variant: &ModelVariant, stage: &str, error: &AggregateError) -> SkippedModel {
    SkippedModel {
        experiment: session.experiment.to_string(),
        season: session.season,
        model: variant.model.clone(),
        stage: stage.to_string(),
        reason: error.to_string(),
    }
}
