//! # delta-select
//!
//! Chooses, for a set of (experiment, variable, table) constraints, the
//! models that provide data for all of them and one realization per model.
//!
//! ## Realization preference
//!
//! Among the realizations common to all non-control experiments of a model:
//!
//! 1. `r1i1p1f1`;
//! 2. the single `r1i1p1f*` (several is an ambiguity error);
//! 3. the single `r1i1p*` (several is an ambiguity error);
//! 4. the single `r1i*`;
//! 5. the lowest `r` index, ties broken by the smallest label.
//!
//! Control runs (`piControl`) do not constrain the realization unless they
//! are the only experiment requested.

mod config;
mod error;
mod select;
mod variant;

pub use config::SelectionConfig;
pub use error::SelectError;
pub use select::{Constraint, ModelVariant, ModelVariantSet, select};
pub use variant::{VariantLabel, preferred_variant};
