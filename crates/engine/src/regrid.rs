//! Choice of remapping method per dataset.

use std::collections::BTreeSet;

use delta_field::RemapMethod;

/// Models whose native ocean grids need distance-weighted remapping.
const DISTANCE_WEIGHTED_OCEAN_MODELS: [&str; 9] = [
    "CNRM-CM6-1",
    "CNRM-ESM2-1",
    "IPSL-CM6A-LR",
    "AWI-CM-1-1-MR",
    "BCC-CSM2-MR",
    "EC-Earth3",
    "EC-Earth3-Veg",
    "MPI-ESM1-2-HR",
    "NESM3",
];

/// Static mapping from (variable, table, model, grid) to a remapping method.
///
/// Fields of the listed tables from the listed models on native grids (grid
/// labels not starting with `gr`) use distance-weighted remapping; all other
/// fields use conservative remapping. Without a common grid nothing is
/// remapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegridPolicy {
    tables: BTreeSet<String>,
    models: BTreeSet<String>,
}

impl Default for RegridPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl RegridPolicy {
    /// Policy for CMIP6 ocean grids (`Omon`).
    pub fn standard() -> Self {
        Self {
            tables: BTreeSet::from(["Omon".to_string()]),
            models: DISTANCE_WEIGHTED_OCEAN_MODELS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Adds a model to the distance-weighted list.
    pub fn with_distance_weighted_model(mut self, model: impl Into<String>) -> Self {
        self.models.insert(model.into());
        self
    }

    /// Adds a table whose listed models use distance-weighted remapping.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.tables.insert(table.into());
        self
    }

    /// Method for one dataset. `common_grid` is `None` when fields stay on
    /// their native grids.
    pub fn method(
        &self,
        _variable: &str,
        table: &str,
        model: &str,
        grid: &str,
        common_grid: Option<&str>,
    ) -> RemapMethod {
        if common_grid.is_none() {
            RemapMethod::Identity
        } else if self.tables.contains(table) && self.models.contains(model) && !grid.starts_with("gr") {
            RemapMethod::DistanceWeighted
        } else {
            RemapMethod::Conservative
        }
    }
}
