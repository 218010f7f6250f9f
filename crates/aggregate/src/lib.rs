//! # delta-aggregate
//!
//! Multi-model ensemble changes of a climate variable between a reference
//! and a projection period.
//!
//! For each (experiment, season) a [`ChangeAggregator`] collects per-model
//! statistics, changes and control-run variability onto a common grid,
//! reduces them across the ensemble and derives robustness masks. Results
//! land in an [`AggregateBundle`]; per-model summaries, skipped models and
//! missing common models land in [`Diagnostics`].
//!
//! ## Architecture
//!
//! ```mermaid
//! graph TD
//!     C["VersionCatalog"] --> M["select_models()"]
//!     M -->|"ExperimentModels"| A["ChangeAggregator"]
//!     E["StatisticEngine"] --> A
//!     P["RegridPolicy"] --> A
//!     A -->|"CollectingPerModel"| A
//!     A -->|"ReducingEnsemble"| A
//!     A -->|"ComputingRobustness"| R["robustness masks"]
//!     A --> B["AggregateBundle"]
//!     A --> D["Diagnostics"]
//!     E --> G["regional_changes()"]
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | `AggregateConfig`, `RobustnessScheme` |
//! | `kind` | `FieldKind` names |
//! | `bundle` | `AggregateBundle` and its keys |
//! | `models` | Changes and variability model sets |
//! | `robustness` | Agreement fractions, AR5/AR6 masks |
//! | `aggregator` | `ChangeAggregator` sessions |
//! | `diagnostics` | Per-model statistics and warnings |
//! | `regional` | Regional scalar changes and ensemble statistics |
//! | `error` | Error types |

mod aggregator;
mod bundle;
mod config;
mod diagnostics;
mod error;
mod kind;
mod models;
mod regional;
mod robustness;

pub use aggregator::{AggregateOutcome, ChangeAggregator, Stage};
pub use bundle::{AggregateBundle, BundleKey, FieldResult};
pub use config::{AggregateConfig, RobustnessScheme};
pub use diagnostics::{Diagnostics, MissingCommonModels, ModelStatistics, SessionSummary, SkippedModel};
pub use error::AggregateError;
pub use kind::FieldKind;
pub use models::{ExperimentModels, VariabilityModels, select_models};
pub use regional::{Region, RegionalChanges, RegionalRequest, regional_changes};
pub use robustness::{
    agreement_fraction_on_lower, agreement_fraction_on_sign, ar5_masks, ar6_masks, sign_disagreement,
};
