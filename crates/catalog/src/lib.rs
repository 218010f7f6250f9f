//! # delta-catalog
//!
//! In-memory view of the dataset-version catalog: for every experiment,
//! variable, table, model and realization, the grid, version and available
//! period of the dataset to use.
//!
//! The catalog is loaded once from `Data_versions_selection_<tag>.json` and
//! is read-only afterwards. Lookups either fail with
//! [`CatalogError::NotFound`] naming the missing level, or go through the
//! `try_*`/`contains` probes when a branch is legitimately optional.
//!
//! ```ignore
//! use delta_catalog::VersionCatalog;
//!
//! let catalog = VersionCatalog::load("20200719", "data_versions".as_ref())?;
//! let entry = catalog.resolve("ssp585", "pr", "Amon", "CNRM-CM6-1", "r1i1p1f2")?;
//! println!("{} {}", entry.grid(), entry.version());
//! ```

mod catalog;
mod cmip;
mod entry;
mod error;
mod listing;

pub use catalog::{VersionCatalog, catalog_file_name};
pub use cmip::{CONTROL_EXPERIMENT, institute_for_model, mip_for_experiment, table_for_variable};
pub use entry::{CatalogEntry, DatasetKey};
pub use error::CatalogError;
pub use listing::dataset_listing;
