//! Change command: fetch the ensemble change fields from the cache, or
//! compute and cache them.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use delta_aggregate::{
    AggregateBundle, AggregateConfig, BundleKey, ChangeAggregator, Diagnostics, ExperimentModels, FieldKind,
    RobustnessScheme,
};
use delta_cache::{CacheTag, EnsembleCache};
use delta_engine::{ArchiveExecutor, OperatorRegistry, StatisticEngine};

use crate::cli::ChangeArgs;
use crate::convert;
use crate::session::Session;

/// Summary printed at the end of a run.
#[derive(Debug, Serialize)]
struct Report {
    experiments: Vec<ExperimentReport>,
    diagnostics: Diagnostics,
}

#[derive(Debug, Serialize)]
struct ExperimentReport {
    experiment: String,
    tag: String,
    models: usize,
    source: &'static str,
    fields: usize,
}

/// Run the change pipeline.
pub fn run(args: ChangeArgs) -> Result<()> {
    let _cmd = info_span!("change").entered();
    let session = Session::open(&args.common, &args.seasons)?;
    let cfg = &session.aggregate;
    let selected = session.select()?;

    let cache = EnsembleCache::new(&session.config.cache.dir)
        .with_writer(convert::build_writer_config(&session.config.cache)?);
    let use_cache = session.config.cache.enabled && !args.no_cache;

    let mut reports = Vec::new();
    let mut pending: BTreeMap<String, (ExperimentModels, CacheTag)> = BTreeMap::new();
    for (experiment, models) in selected {
        let tag = CacheTag::derive(session.catalog.tag(), &models.changes)?;
        if use_cache {
            if let Some(bundle) = cached(&cache, cfg, &experiment, &tag)? {
                info!(experiment = %experiment, tag = %tag, fields = bundle.len(), "using cached fields");
                reports.push(ExperimentReport {
                    experiment,
                    tag: tag.to_string(),
                    models: models.changes.len(),
                    source: "cache",
                    fields: bundle.len(),
                });
                continue;
            }
        }
        pending.insert(experiment, (models, tag));
    }

    let mut diagnostics = Diagnostics::default();
    if !pending.is_empty() {
        let engine = StatisticEngine::new(
            ArchiveExecutor::new(&session.config.archive.root),
            OperatorRegistry::standard(),
        );
        let policy = convert::build_regrid_policy(&session.config.regrid);
        let config = cfg.clone().with_experiments(pending.keys());
        let aggregator = ChangeAggregator::new(&engine, &session.catalog, &policy, config)?;
        let models: BTreeMap<String, ExperimentModels> = pending
            .iter()
            .map(|(experiment, (models, _))| (experiment.clone(), models.clone()))
            .collect();
        let outcome = aggregator.run(&models).context("ensemble aggregation failed")?;
        if outcome.diagnostics.has_warnings() {
            warn!("some models were skipped or sessions degraded, see diagnostics");
        }

        for (experiment, (models, tag)) in &pending {
            let part = experiment_part(&outcome.bundle, experiment)?;
            if use_cache {
                cache
                    .write(&part, cfg.reference_period(), cfg.projection_period(), tag)
                    .with_context(|| format!("failed to cache fields of {experiment}"))?;
            }
            reports.push(ExperimentReport {
                experiment: experiment.clone(),
                tag: tag.to_string(),
                models: models.changes.len(),
                source: "computed",
                fields: part.len(),
            });
        }
        diagnostics = outcome.diagnostics;
    }

    let report = Report {
        experiments: reports,
        diagnostics,
    };
    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, &json)
                .with_context(|| format!("failed to write diagnostics: {}", path.display()))?;
            info!(path = %path.display(), "diagnostics written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Fields a run with `cfg` stores for every season of `experiment`.
fn wanted_kinds(cfg: &AggregateConfig) -> Vec<FieldKind> {
    let mut kinds = vec![FieldKind::MeanChange];
    if cfg.relative() {
        kinds.push(FieldKind::MeanRChange);
    }
    if cfg.standardized() {
        kinds.push(FieldKind::MeanSChange);
    }
    if cfg.sampling().is_some() {
        kinds.extend([FieldKind::MedianVariability, FieldKind::Stippling, FieldKind::Hatching]);
        if cfg.scheme() == RobustnessScheme::Ar6 {
            kinds.extend([FieldKind::LowChange, FieldKind::Conflict]);
        }
    }
    kinds
}

fn wanted_keys(cfg: &AggregateConfig, experiment: &str) -> Vec<BundleKey> {
    let kinds = wanted_kinds(cfg);
    cfg.seasons()
        .iter()
        .flat_map(|&season| {
            kinds
                .iter()
                .map(move |&kind| BundleKey::new(cfg.variable(), experiment, season, kind, cfg.derivation()))
        })
        .collect()
}

/// Cached fields of `experiment`, if every field the configuration asks
/// for is there.
fn cached(
    cache: &EnsembleCache,
    cfg: &AggregateConfig,
    experiment: &str,
    tag: &CacheTag,
) -> Result<Option<AggregateBundle>> {
    let wanted = wanted_keys(cfg, experiment);
    let Some(first) = wanted.first() else {
        return Ok(None);
    };
    let bundle = match cache.fetch(cfg.reference_period(), cfg.projection_period(), tag, first) {
        Ok(bundle) => bundle,
        Err(e) if e.is_miss() => {
            debug!(error = %e, "cache miss");
            return Ok(None);
        }
        Err(e) => return Err(e).context("failed to read cache"),
    };
    match wanted.iter().find(|key| !bundle.contains(key)) {
        None => Ok(Some(bundle)),
        Some(missing) => {
            debug!(experiment, season = %missing.season, kind = %missing.kind, "cache lacks a wanted field");
            Ok(None)
        }
    }
}

/// Fields of one experiment.
fn experiment_part(bundle: &AggregateBundle, experiment: &str) -> Result<AggregateBundle> {
    let mut part = AggregateBundle::new();
    for (key, result) in bundle.iter().filter(|(key, _)| key.experiment == experiment) {
        part.insert(key.clone(), result.clone())?;
    }
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use delta_field::{Field, Grid};
    use delta_period::{Season, YearRange};
    use ndarray::Array2;

    fn field(value: f64) -> Field {
        Field::new(Grid::regular(4, 2).unwrap(), Array2::from_elem((2, 4), value)).unwrap()
    }

    fn plain() -> AggregateConfig {
        AggregateConfig::new("pr")
            .with_experiments(["ssp585"])
            .with_seasons([Season::Djf])
            .with_projection_period(YearRange::new(2081, 2100).unwrap())
            .with_sampling(None)
    }

    fn write(cache: &EnsembleCache, cfg: &AggregateConfig, kinds: &[FieldKind], tag: &CacheTag) {
        let mut bundle = AggregateBundle::new();
        for &kind in kinds {
            let key = BundleKey::new(cfg.variable(), "ssp585", Season::Djf, kind, cfg.derivation());
            bundle.insert_ensemble(key, field(1.0)).unwrap();
        }
        cache
            .write(&bundle, cfg.reference_period(), cfg.projection_period(), tag)
            .unwrap();
    }

    #[test]
    fn headline_fields_hit_a_plain_run() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EnsembleCache::new(dir.path());
        let tag = CacheTag::parse("t_deadbeef").unwrap();
        let cfg = plain();
        write(&cache, &cfg, &[FieldKind::MeanChange, FieldKind::MeanRChange], &tag);

        let hit = cached(&cache, &cfg, "ssp585", &tag).unwrap();
        assert_eq!(hit.map(|b| b.len()), Some(2));
        assert!(cached(&cache, &cfg, "ssp245", &tag).unwrap().is_none());
    }

    #[test]
    fn standardized_run_misses_without_standardized_change() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EnsembleCache::new(dir.path());
        let tag = CacheTag::parse("t_deadbeef").unwrap();
        let cfg = plain();
        write(&cache, &cfg, &[FieldKind::MeanChange, FieldKind::MeanRChange], &tag);

        let standardized = cfg.clone().with_standardized(true);
        assert!(cached(&cache, &standardized, "ssp585", &tag).unwrap().is_none());

        write(&cache, &cfg, &[FieldKind::MeanSChange], &tag);
        assert!(cached(&cache, &standardized, "ssp585", &tag).unwrap().is_some());
    }

    #[test]
    fn robustness_masks_are_required_when_variability_is_sampled() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EnsembleCache::new(dir.path());
        let tag = CacheTag::parse("t_deadbeef").unwrap();
        let cfg = plain();
        write(&cache, &cfg, &[FieldKind::MeanChange, FieldKind::MeanRChange], &tag);

        let ar5 = AggregateConfig::new("pr")
            .with_experiments(["ssp585"])
            .with_seasons([Season::Djf])
            .with_projection_period(YearRange::new(2081, 2100).unwrap());
        assert!(ar5.sampling().is_some());
        assert!(cached(&cache, &ar5, "ssp585", &tag).unwrap().is_none());

        write(
            &cache,
            &cfg,
            &[FieldKind::MedianVariability, FieldKind::Stippling, FieldKind::Hatching],
            &tag,
        );
        assert!(cached(&cache, &ar5, "ssp585", &tag).unwrap().is_some());

        let ar6 = ar5.clone().with_scheme(RobustnessScheme::Ar6);
        assert!(cached(&cache, &ar6, "ssp585", &tag).unwrap().is_none());
        write(&cache, &cfg, &[FieldKind::LowChange, FieldKind::Conflict], &tag);
        assert!(cached(&cache, &ar6, "ssp585", &tag).unwrap().is_some());
    }

    #[test]
    fn every_season_must_be_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = EnsembleCache::new(dir.path());
        let tag = CacheTag::parse("t_deadbeef").unwrap();
        let cfg = plain();
        write(&cache, &cfg, &[FieldKind::MeanChange, FieldKind::MeanRChange], &tag);

        let two_seasons = cfg.clone().with_seasons([Season::Djf, Season::Jja]);
        assert_eq!(wanted_keys(&two_seasons, "ssp585").len(), 4);
        assert!(cached(&cache, &two_seasons, "ssp585", &tag).unwrap().is_none());
    }
}
