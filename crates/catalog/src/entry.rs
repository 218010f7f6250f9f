//! Catalog leaves and dataset identities.

use std::fmt;

use delta_period::{PeriodError, YearRange};
use serde::{Deserialize, Serialize};

/// The dataset chosen for one (experiment, variable, table, model, realization).
///
/// Persisted as a three-element array `[grid, version, period]`, where
/// `period` may be `null`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct CatalogEntry {
    grid: String,
    version: String,
    period: Option<YearRange>,
}

#[derive(Deserialize, Serialize)]
struct RawEntry(String, String, Option<String>);

impl TryFrom<RawEntry> for CatalogEntry {
    type Error = PeriodError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let period = raw.2.as_deref().map(str::parse).transpose()?;
        Ok(Self {
            grid: raw.0,
            version: raw.1,
            period,
        })
    }
}

impl From<CatalogEntry> for RawEntry {
    fn from(entry: CatalogEntry) -> Self {
        RawEntry(
            entry.grid,
            entry.version,
            entry.period.map(|p| p.to_string()),
        )
    }
}

impl CatalogEntry {
    /// Creates an entry.
    pub fn new(grid: impl Into<String>, version: impl Into<String>, period: Option<YearRange>) -> Self {
        Self {
            grid: grid.into(),
            version: version.into(),
            period,
        }
    }

    /// Grid label, e.g. `gn` or `gr1`.
    pub fn grid(&self) -> &str {
        &self.grid
    }

    /// Dataset version, e.g. `v20190219`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Years available in the dataset, when recorded.
    pub fn period(&self) -> Option<YearRange> {
        self.period
    }
}

/// Identity of one retrievable dataset, restricted to a period.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatasetKey {
    /// Project, e.g. `CMIP6`.
    pub project: String,
    /// Experiment, e.g. `ssp585`.
    pub experiment: String,
    /// Model name.
    pub model: String,
    /// Realization (variant) label.
    pub realization: String,
    /// Variable name.
    pub variable: String,
    /// Table, e.g. `Amon`.
    pub table: String,
    /// Grid label.
    pub grid: String,
    /// Dataset version.
    pub version: String,
    /// Years to read.
    pub period: YearRange,
}

impl DatasetKey {
    /// File stem of the dataset in an archive directory:
    /// `<project>_<experiment>_<model>_<realization>_<table>_<variable>_<grid>_<version>`.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}_{}_{}",
            self.project,
            self.experiment,
            self.model,
            self.realization,
            self.table,
            self.variable,
            self.grid,
            self.version
        )
    }

    /// Same dataset over another period.
    pub fn with_period(&self, period: YearRange) -> Self {
        Self {
            period,
            ..self.clone()
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.file_stem(), self.period)
    }
}
