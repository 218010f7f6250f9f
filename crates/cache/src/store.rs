//! Directory of cached aggregated fields.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use delta_aggregate::{AggregateBundle, BundleKey, FieldResult};
use delta_io::{Layer, WriterConfig, read_layers, write_layers};
use delta_period::YearRange;
use tracing::{debug, info, warn};

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::tag::{CacheTag, unfit_for_file_name};

const TAG_KEY: &str = "delta:tag";
const KIND_KEY: &str = "delta:kind";

/// Aggregated fields cached as one Parquet file per field.
///
/// Entries are only invalidated by a different tag or period; concurrent
/// writers of the same entry overwrite each other.
#[derive(Debug, Clone)]
pub struct EnsembleCache {
    dir: PathBuf,
    writer: WriterConfig,
}

/// Rejects keys whose labels would break the `=`-separated file name.
fn check_labels(key: &BundleKey) -> Result<(), CacheError> {
    let labels = [
        ("variable", &key.variable),
        ("experiment", &key.experiment),
        ("derivation", &key.derivation),
    ];
    for (field, value) in labels {
        if let Some(reason) = unfit_for_file_name(value) {
            return Err(CacheError::InvalidLabel {
                field,
                value: value.clone(),
                reason: reason.to_string(),
            });
        }
    }
    Ok(())
}

impl EnsembleCache {
    /// A cache rooted at `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writer: WriterConfig::default(),
        }
    }

    /// Sets the Parquet writer settings.
    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    /// Directory holding the cache files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn directory_error(&self, e: std::io::Error) -> CacheError {
        CacheError::Directory {
            path: self.dir.clone(),
            reason: e.to_string(),
        }
    }

    /// Writes every field of `bundle`, one file each, and returns the
    /// number of files written.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidLabel`], before anything is written, if a
    /// key label cannot be part of a file name, [`CacheError::Directory`] if
    /// the directory cannot be created and [`CacheError::Io`] if a file
    /// cannot be written.
    pub fn write(
        &self,
        bundle: &AggregateBundle,
        reference_period: YearRange,
        projection_period: YearRange,
        tag: &CacheTag,
    ) -> Result<usize, CacheError> {
        for (key, _) in bundle.iter() {
            check_labels(key)?;
        }
        fs::create_dir_all(&self.dir).map_err(|e| self.directory_error(e))?;
        for (key, result) in bundle.iter() {
            let entry = CacheEntry {
                key: key.clone(),
                reference_period,
                projection_period,
                tag: tag.clone(),
            };
            let layers: Vec<Layer> = match result {
                FieldResult::Ensemble(field) => vec![Layer::ensemble(key.kind.as_str(), field.clone())],
                FieldResult::PerModel(models) => models
                    .iter()
                    .map(|(model, field)| Layer::per_model(key.kind.as_str(), model, field.clone()))
                    .collect(),
            };
            let metadata = BTreeMap::from([
                (TAG_KEY.to_string(), tag.to_string()),
                (KIND_KEY.to_string(), key.kind.to_string()),
            ]);
            let path = self.dir.join(entry.file_name());
            write_layers(&path, &layers, &metadata, &self.writer)?;
            debug!(path = %path.display(), "cached field");
        }
        info!(dir = %self.dir.display(), tag = %tag, files = bundle.len(), "wrote cache");
        Ok(bundle.len())
    }

    /// Entries of `tag` present in the directory, whatever their periods.
    ///
    /// Files ending with the tag but not following the naming scheme are
    /// skipped with a warning. A missing directory holds no entry.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Directory`] if the directory cannot be listed.
    pub fn entries(&self, tag: &CacheTag) -> Result<Vec<CacheEntry>, CacheError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let suffix = CacheEntry::tag_suffix(tag);
        let mut entries = Vec::new();
        for item in fs::read_dir(&self.dir).map_err(|e| self.directory_error(e))? {
            let item = item.map_err(|e| self.directory_error(e))?;
            let name = item.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(&suffix) {
                continue;
            }
            match CacheEntry::parse(name) {
                Ok(entry) if entry.tag == *tag => entries.push(entry),
                Ok(_) => {}
                Err(e) => warn!(file = name, error = %e, "ignoring cache file"),
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// Reads every cached field of `tag` for the two periods into a bundle,
    /// possibly empty.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Directory`] if the directory cannot be listed,
    /// [`CacheError::Io`] for unreadable files, and
    /// [`CacheError::Aggregate`] for layers that do not fit their kind.
    pub fn read(
        &self,
        reference_period: YearRange,
        projection_period: YearRange,
        tag: &CacheTag,
    ) -> Result<AggregateBundle, CacheError> {
        let mut bundle = AggregateBundle::new();
        for entry in self.entries(tag)? {
            if entry.reference_period != reference_period || entry.projection_period != projection_period {
                continue;
            }
            let (layers, _) = read_layers(&self.dir.join(entry.file_name()))?;
            let result = if entry.key.kind.is_per_model() {
                FieldResult::PerModel(
                    layers
                        .into_iter()
                        .filter_map(|l| l.model.map(|m| (m, l.field)))
                        .collect(),
                )
            } else {
                let Some(layer) = layers.into_iter().next() else {
                    warn!(entry = %entry.file_name(), "empty cache file");
                    continue;
                };
                FieldResult::Ensemble(layer.field)
            };
            bundle.insert(entry.key, result)?;
        }
        debug!(tag = %tag, fields = bundle.len(), "read cache");
        Ok(bundle)
    }

    /// Reads the cached fields of `tag` and checks that `wanted` is among
    /// them.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Miss`] if `wanted` is absent, in which case the
    /// whole request should be recomputed, and the errors of
    /// [`EnsembleCache::read`].
    pub fn fetch(
        &self,
        reference_period: YearRange,
        projection_period: YearRange,
        tag: &CacheTag,
        wanted: &BundleKey,
    ) -> Result<AggregateBundle, CacheError> {
        let bundle = self.read(reference_period, projection_period, tag)?;
        if !bundle.contains(wanted) {
            return Err(CacheError::Miss {
                what: format!(
                    "{}/{}/{}/{}/{} [{tag}]",
                    wanted.variable, wanted.experiment, wanted.season, wanted.kind, wanted.derivation
                ),
            });
        }
        Ok(bundle)
    }
}
