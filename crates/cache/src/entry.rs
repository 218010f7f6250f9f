//! Cache file names.
//!
//! One file per aggregated field, named
//! `season=variable=experiment=fieldKind=derivation=refPeriod=projPeriod=tag.parquet`.

use delta_aggregate::{BundleKey, FieldKind};
use delta_period::YearRange;

use crate::error::CacheError;
use crate::tag::CacheTag;

const DELIMITER: char = '=';
const EXTENSION: &str = ".parquet";

/// Identity of one cached field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheEntry {
    pub key: BundleKey,
    pub reference_period: YearRange,
    pub projection_period: YearRange,
    pub tag: CacheTag,
}

impl CacheEntry {
    /// File name of the entry.
    pub fn file_name(&self) -> String {
        let k = &self.key;
        let fields = [
            k.season.as_str().to_string(),
            k.variable.clone(),
            k.experiment.clone(),
            k.kind.to_string(),
            k.derivation.clone(),
            self.reference_period.to_string(),
            self.projection_period.to_string(),
            self.tag.to_string(),
        ];
        format!("{}{EXTENSION}", fields.join(&DELIMITER.to_string()))
    }

    /// Suffix shared by the file names of every entry with `tag`.
    pub fn tag_suffix(tag: &CacheTag) -> String {
        format!("{DELIMITER}{tag}{EXTENSION}")
    }

    /// Parses a file name written by [`CacheEntry::file_name`].
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidEntryName`] if the name has the wrong
    /// extension or field count, or a field does not parse.
    pub fn parse(name: &str) -> Result<Self, CacheError> {
        let invalid = |reason: String| CacheError::InvalidEntryName {
            name: name.to_string(),
            reason,
        };
        let stem = name
            .strip_suffix(EXTENSION)
            .ok_or_else(|| invalid(format!("no {EXTENSION} extension")))?;
        let fields: Vec<&str> = stem.split(DELIMITER).collect();
        let [season, variable, experiment, kind, derivation, reference, projection, tag] = fields[..] else {
            return Err(invalid(format!("{} fields instead of 8", fields.len())));
        };
        Ok(Self {
            key: BundleKey::new(
                variable,
                experiment,
                season.parse().map_err(|e| invalid(format!("{e}")))?,
                kind.parse::<FieldKind>().map_err(|e| invalid(e.to_string()))?,
                derivation,
            ),
            reference_period: reference.parse().map_err(|e| invalid(format!("{e}")))?,
            projection_period: projection.parse().map_err(|e| invalid(format!("{e}")))?,
            tag: CacheTag::parse(tag)?,
        })
    }
}
