//! Dataset executors: run a pipeline on one dataset.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use delta_catalog::DatasetKey;
use delta_field::{Field, FieldSeries};
use tracing::debug;

use crate::error::EngineError;
use crate::operation::Pipeline;

/// Runs operator pipelines on datasets identified by a [`DatasetKey`].
pub trait DatasetExecutor {
    /// Runs `pipeline` on the dataset `key`, restricted to `key.period`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DatasetUnavailable`] for unknown datasets,
    /// [`EngineError::EmptyDataset`] if nothing falls in the period, and any
    /// error raised by the pipeline.
    fn run(&self, key: &DatasetKey, pipeline: &Pipeline) -> Result<FieldSeries, EngineError>;

    /// Runs a pipeline that reduces time to a single step and returns that
    /// step.
    ///
    /// # Errors
    ///
    /// As [`DatasetExecutor::run`], plus [`EngineError::NotReduced`] when the
    /// result has more or fewer than one step.
    fn field(&self, key: &DatasetKey, pipeline: &Pipeline) -> Result<Field, EngineError> {
        let series = self.run(key, pipeline)?;
        if series.len() != 1 {
            return Err(EngineError::NotReduced {
                pipeline: pipeline.to_cdo_string(),
                key: key.to_string(),
                steps: series.len(),
            });
        }
        Ok(series.step(0))
    }
}

impl<E: DatasetExecutor + ?Sized> DatasetExecutor for &E {
    fn run(&self, key: &DatasetKey, pipeline: &Pipeline) -> Result<FieldSeries, EngineError> {
        (**self).run(key, pipeline)
    }
}

fn execute(series: &FieldSeries, key: &DatasetKey, pipeline: &Pipeline) -> Result<FieldSeries, EngineError> {
    let cropped = series.crop(key.period);
    if cropped.is_empty() {
        return Err(EngineError::EmptyDataset {
            key: key.to_string(),
        });
    }
    debug!(dataset = %key, pipeline = %pipeline, "running pipeline");
    pipeline.apply(cropped)
}

/// Executor over series held in memory, keyed by dataset file stem.
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    datasets: BTreeMap<String, FieldSeries>,
}

impl MemoryExecutor {
    /// An empty executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the full series of the dataset `key` (its period is ignored).
    pub fn insert(&mut self, key: &DatasetKey, series: FieldSeries) {
        self.datasets.insert(key.file_stem(), series);
    }

    /// Number of stored datasets.
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Returns `true` if no dataset is stored.
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl DatasetExecutor for MemoryExecutor {
    fn run(&self, key: &DatasetKey, pipeline: &Pipeline) -> Result<FieldSeries, EngineError> {
        let series = self
            .datasets
            .get(&key.file_stem())
            .ok_or_else(|| EngineError::DatasetUnavailable {
                key: key.to_string(),
            })?;
        execute(series, key, pipeline)
    }
}

/// Executor over a directory of Parquet series, one file per dataset named
/// `<file stem>.parquet`.
#[derive(Debug, Clone)]
pub struct ArchiveExecutor {
    root: PathBuf,
}

impl ArchiveExecutor {
    /// Executor reading from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Archive directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn path_of(&self, key: &DatasetKey) -> PathBuf {
        self.root.join(format!("{}.parquet", key.file_stem()))
    }
}

impl DatasetExecutor for ArchiveExecutor {
    fn run(&self, key: &DatasetKey, pipeline: &Pipeline) -> Result<FieldSeries, EngineError> {
        let path = self.path_of(key);
        if !path.exists() {
            return Err(EngineError::DatasetUnavailable {
                key: key.to_string(),
            });
        }
        let series = delta_io::read_series(&path)?;
        execute(&series, key, pipeline)
    }
}
