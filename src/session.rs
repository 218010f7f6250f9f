//! Inputs shared by every subcommand: configuration, catalog and model sets.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use delta_aggregate::{AggregateConfig, ExperimentModels, VariabilityModels, select_models};
use delta_catalog::VersionCatalog;
use delta_select::SelectionConfig;

use crate::cli::CommonArgs;
use crate::config::DeltaConfig;
use crate::convert;

/// Configuration with CLI overrides applied, plus the loaded catalog.
pub struct Session {
    pub config: DeltaConfig,
    pub catalog: VersionCatalog,
    pub aggregate: AggregateConfig,
    pub selection: SelectionConfig,
    pub variability: VariabilityModels,
}

impl Session {
    /// Loads the TOML file named by `common`, applies the overrides and
    /// loads the version catalog.
    pub fn open(common: &CommonArgs, seasons: &[String]) -> Result<Self> {
        let mut config = DeltaConfig::load(&common.config)?;
        if let Some(ref tag) = common.catalog_tag {
            config.catalog.tag = Some(tag.clone());
        }
        if let Some(ref variable) = common.variable {
            config.change.variable = variable.clone();
        }
        if !common.experiments.is_empty() {
            config.change.experiments = common.experiments.clone();
        }
        if !seasons.is_empty() {
            config.change.seasons = seasons.to_vec();
        }

        let tag = config
            .catalog
            .tag
            .clone()
            .ok_or_else(|| anyhow!("no catalog tag: set [catalog].tag in config or use --catalog-tag"))?;
        let catalog = VersionCatalog::load(&tag, &config.catalog.dir)
            .with_context(|| format!("failed to load catalog {tag:?} from {}", config.catalog.dir.display()))?;

        let aggregate = convert::build_aggregate_config(&config.change, &config.variability, &config.robustness)
            .context("invalid [change], [variability] or [robustness] section")?;
        let selection = convert::build_selection_config(&config.change);
        let variability = convert::build_variability_models(&config.variability, aggregate.scheme());
        Ok(Self {
            config,
            catalog,
            aggregate,
            selection,
            variability,
        })
    }

    /// Selects the model sets of every configured experiment.
    pub fn select(&self) -> Result<BTreeMap<String, ExperimentModels>> {
        let mut all = BTreeMap::new();
        for experiment in self.aggregate.experiments() {
            let models = select_models(
                &self.catalog,
                &self.aggregate,
                experiment,
                &self.selection,
                &self.variability,
                &[],
            )
            .with_context(|| format!("model selection failed for {experiment}"))?;
            info!(
                experiment = %experiment,
                changes = models.changes.len(),
                control = models.control.len(),
                "selected models"
            );
            all.insert(experiment.clone(), models);
        }
        Ok(all)
    }
}
