use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level delta configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeltaConfig {
    /// Version catalog location.
    #[serde(default)]
    pub catalog: CatalogToml,

    /// Dataset archive location.
    #[serde(default)]
    pub archive: ArchiveToml,

    /// What to aggregate.
    #[serde(default)]
    pub change: ChangeToml,

    /// Control-run variability settings.
    #[serde(default)]
    pub variability: VariabilityToml,

    /// Robustness scheme and thresholds.
    #[serde(default)]
    pub robustness: RobustnessToml,

    /// Ensemble cache settings.
    #[serde(default)]
    pub cache: CacheToml,

    /// Remapping policy additions.
    #[serde(default)]
    pub regrid: RegridToml,
}

impl DeltaConfig {
    /// Reads and parses a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&text).context("failed to parse TOML config")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogToml {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub tag: Option<String>,
}

impl Default for CatalogToml {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            tag: None,
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveToml {
    #[serde(default = "default_archive_root")]
    pub root: PathBuf,
}

impl Default for ArchiveToml {
    fn default() -> Self {
        Self {
            root: default_archive_root(),
        }
    }
}

fn default_archive_root() -> PathBuf {
    PathBuf::from("archive")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeToml {
    #[serde(default = "default_project")]
    pub project: String,
    #[serde(default = "default_variable")]
    pub variable: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default = "default_reference_experiment")]
    pub reference_experiment: String,
    #[serde(default = "default_experiments")]
    pub experiments: Vec<String>,
    #[serde(default = "default_seasons")]
    pub seasons: Vec<String>,
    #[serde(default = "default_reference_period")]
    pub reference_period: String,
    #[serde(default = "default_projection_period")]
    pub projection_period: String,
    #[serde(default = "default_derivation")]
    pub derivation: String,
    #[serde(default = "default_true")]
    pub relative: bool,
    #[serde(default)]
    pub standardized: bool,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default = "default_common_grid")]
    pub common_grid: Option<String>,
    #[serde(default)]
    pub included_models: Vec<String>,
    #[serde(default)]
    pub excluded_models: Vec<String>,
}

impl Default for ChangeToml {
    fn default() -> Self {
        Self {
            project: default_project(),
            variable: default_variable(),
            table: None,
            reference_experiment: default_reference_experiment(),
            experiments: default_experiments(),
            seasons: default_seasons(),
            reference_period: default_reference_period(),
            projection_period: default_projection_period(),
            derivation: default_derivation(),
            relative: true,
            standardized: false,
            threshold: None,
            common_grid: default_common_grid(),
            included_models: Vec::new(),
            excluded_models: Vec::new(),
        }
    }
}

fn default_project() -> String {
    "CMIP6".to_string()
}
fn default_variable() -> String {
    "pr".to_string()
}
fn default_reference_experiment() -> String {
    "historical".to_string()
}
fn default_experiments() -> Vec<String> {
    vec!["ssp245".to_string()]
}
fn default_seasons() -> Vec<String> {
    vec!["ANN".to_string()]
}
fn default_reference_period() -> String {
    "1995-2014".to_string()
}
fn default_projection_period() -> String {
    "2081-2100".to_string()
}
fn default_derivation() -> String {
    "plain".to_string()
}
fn default_true() -> bool {
    true
}
fn default_common_grid() -> Option<String> {
    Some("r360x180".to_string())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariabilityToml {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub same_models: bool,
    #[serde(default = "default_shift")]
    pub shift: u32,
    #[serde(default = "default_nyears")]
    pub nyears: u32,
    #[serde(default = "default_number")]
    pub number: u32,
    #[serde(default = "default_true")]
    pub detrend: bool,
    #[serde(default)]
    pub included_models: Vec<String>,
    #[serde(default)]
    pub excluded_models: Vec<String>,
}

impl Default for VariabilityToml {
    fn default() -> Self {
        Self {
            enabled: true,
            same_models: true,
            shift: default_shift(),
            nyears: default_nyears(),
            number: default_number(),
            detrend: true,
            included_models: Vec::new(),
            excluded_models: Vec::new(),
        }
    }
}

fn default_shift() -> u32 {
    100
}
fn default_nyears() -> u32 {
    20
}
fn default_number() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RobustnessToml {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_low_change_agree_threshold")]
    pub low_change_agree_threshold: f64,
    #[serde(default = "default_magnitude_fraction_threshold")]
    pub magnitude_fraction_threshold: f64,
    #[serde(default = "default_sign_agree_threshold")]
    pub sign_agree_threshold: f64,
    #[serde(default = "default_stippling_sign_agreement")]
    pub stippling_sign_agreement: f64,
}

impl Default for RobustnessToml {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            low_change_agree_threshold: default_low_change_agree_threshold(),
            magnitude_fraction_threshold: default_magnitude_fraction_threshold(),
            sign_agree_threshold: default_sign_agree_threshold(),
            stippling_sign_agreement: default_stippling_sign_agreement(),
        }
    }
}

fn default_scheme() -> String {
    "AR5".to_string()
}
fn default_low_change_agree_threshold() -> f64 {
    1.645
}
fn default_magnitude_fraction_threshold() -> f64 {
    0.33
}
fn default_sign_agree_threshold() -> f64 {
    0.8
}
fn default_stippling_sign_agreement() -> f64 {
    0.9
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheToml {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

impl Default for CacheToml {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            compression: default_compression(),
            row_group_size: default_row_group_size(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}
fn default_compression() -> String {
    "snappy".to_string()
}
fn default_row_group_size() -> usize {
    1_000_000
}

/// Additions to the standard remapping policy.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegridToml {
    #[serde(default)]
    pub distance_weighted_tables: Vec<String>,
    #[serde(default)]
    pub distance_weighted_models: Vec<String>,
}
