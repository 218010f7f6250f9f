//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result};

use crate::config::*;

use delta_aggregate::{AggregateConfig, RobustnessScheme, VariabilityModels};
use delta_engine::RegridPolicy;
use delta_io::{Compression, WriterConfig};
use delta_period::{SamplingConfig, Season, YearRange};
use delta_select::SelectionConfig;

/// Parses season tokens such as `ANN` or `DJF`.
pub fn parse_seasons(tokens: &[String]) -> Result<Vec<Season>> {
    tokens
        .iter()
        .map(|t| t.parse::<Season>().with_context(|| format!("invalid season {t:?}")))
        .collect()
}

/// Parses a `YYYY-YYYY` period.
pub fn parse_period(s: &str) -> Result<YearRange> {
    s.parse::<YearRange>()
        .with_context(|| format!("invalid period {s:?}"))
}

/// Builds an [`AggregateConfig`] from the change, variability and
/// robustness sections.
pub fn build_aggregate_config(
    change: &ChangeToml,
    variability: &VariabilityToml,
    robustness: &RobustnessToml,
) -> Result<AggregateConfig> {
    let scheme: RobustnessScheme = robustness.scheme.parse()?;
    let sampling = variability
        .enabled
        .then(|| SamplingConfig::new(variability.shift, variability.nyears, variability.number));
    let mut cfg = AggregateConfig::new(&change.variable)
        .with_project(&change.project)
        .with_reference_experiment(&change.reference_experiment)
        .with_experiments(&change.experiments)
        .with_seasons(parse_seasons(&change.seasons)?)
        .with_reference_period(parse_period(&change.reference_period)?)
        .with_projection_period(parse_period(&change.projection_period)?)
        .with_derivation(&change.derivation)
        .with_relative(change.relative)
        .with_standardized(change.standardized)
        .with_threshold(change.threshold)
        .with_common_grid(change.common_grid.as_deref())
        .with_sampling(sampling)
        .with_detrend(variability.detrend)
        .with_scheme(scheme)
        .with_low_change_agree_threshold(robustness.low_change_agree_threshold)
        .with_magnitude_fraction_threshold(robustness.magnitude_fraction_threshold)
        .with_sign_agree_threshold(robustness.sign_agree_threshold)
        .with_stippling_sign_agreement(robustness.stippling_sign_agreement);
    if let Some(ref table) = change.table {
        cfg = cfg.with_table(table);
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Builds the [`SelectionConfig`] of the changes models.
pub fn build_selection_config(change: &ChangeToml) -> SelectionConfig {
    SelectionConfig::default()
        .with_included(&change.included_models)
        .with_excluded(&change.excluded_models)
}

/// Chooses how variability models are selected.
///
/// The sign-only scheme never reads control runs, so its variability models
/// are disabled whatever the section says.
pub fn build_variability_models(variability: &VariabilityToml, scheme: RobustnessScheme) -> VariabilityModels {
    if !variability.enabled || !scheme.needs_variability() {
        VariabilityModels::Disabled
    } else if variability.same_models {
        VariabilityModels::SameAsChanges
    } else {
        VariabilityModels::Independent(
            SelectionConfig::default()
                .with_included(&variability.included_models)
                .with_excluded(&variability.excluded_models),
        )
    }
}

/// Builds a [`RegridPolicy`] from the standard policy plus the TOML additions.
pub fn build_regrid_policy(regrid: &RegridToml) -> RegridPolicy {
    let policy = regrid
        .distance_weighted_tables
        .iter()
        .fold(RegridPolicy::standard(), |p, t| p.with_table(t));
    regrid
        .distance_weighted_models
        .iter()
        .fold(policy, |p, m| p.with_distance_weighted_model(m))
}

/// Builds a [`WriterConfig`] from the TOML cache configuration.
pub fn build_writer_config(cache: &CacheToml) -> Result<WriterConfig> {
    let compression: Compression = cache.compression.parse()?;
    let cfg = WriterConfig::default()
        .with_compression(compression)
        .with_row_group_size(cache.row_group_size);
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_valid_configs() {
        let config = DeltaConfig::default();
        let agg = build_aggregate_config(&config.change, &config.variability, &config.robustness).unwrap();
        assert_eq!(agg.variable(), "pr");
        assert_eq!(agg.table(), "Amon");
        assert_eq!(agg.seasons(), [Season::Ann]);
        assert_eq!(agg.scheme(), RobustnessScheme::Ar5);
        assert!(agg.sampling().is_some());
        assert_eq!(
            build_variability_models(&config.variability, agg.scheme()),
            VariabilityModels::SameAsChanges
        );
        assert!(build_writer_config(&config.cache).is_ok());
    }

    #[test]
    fn sign_only_scheme_disables_variability() {
        let variability = VariabilityToml::default();
        assert_eq!(
            build_variability_models(&variability, RobustnessScheme::Ar6Simple),
            VariabilityModels::Disabled
        );
        let independent = VariabilityToml {
            same_models: false,
            excluded_models: vec!["B".to_string()],
            ..VariabilityToml::default()
        };
        let VariabilityModels::Independent(selection) = build_variability_models(&independent, RobustnessScheme::Ar6)
        else {
            panic!("expected independent variability models");
        };
        assert!(!selection.allows("B"));
    }

    #[test]
    fn invalid_values_are_reported() {
        let cache = CacheToml {
            compression: "lz4".to_string(),
            ..CacheToml::default()
        };
        assert!(build_writer_config(&cache).is_err());
        assert!(parse_seasons(&["DJF".to_string(), "XYZ".to_string()]).is_err());
        assert!(parse_period("2014-1995").is_err());

        let robustness = RobustnessToml {
            scheme: "AR7".to_string(),
            ..RobustnessToml::default()
        };
        let config = DeltaConfig::default();
        assert!(build_aggregate_config(&config.change, &config.variability, &robustness).is_err());

        let change = ChangeToml {
            standardized: true,
            ..ChangeToml::default()
        };
        let variability = VariabilityToml {
            enabled: false,
            ..VariabilityToml::default()
        };
        assert!(build_aggregate_config(&change, &variability, &config.robustness).is_err());
    }

    #[test]
    fn regrid_additions() {
        let policy = build_regrid_policy(&RegridToml {
            distance_weighted_tables: vec!["Omon".to_string()],
            distance_weighted_models: vec!["MY-MODEL".to_string()],
        });
        assert_eq!(policy, RegridPolicy::standard().with_distance_weighted_model("MY-MODEL"));
    }
}
