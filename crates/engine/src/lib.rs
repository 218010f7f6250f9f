//! # delta-engine
//!
//! Per-model time statistics of climate datasets.
//!
//! Statistics are described as typed [`Pipeline`]s of [`Operation`]s and run
//! by a [`DatasetExecutor`]: [`MemoryExecutor`] for in-process series,
//! [`ArchiveExecutor`] for a directory of Parquet datasets. Pipelines render
//! to CDO operator chains for executors that shell out.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["DatasetKey"] --> E["StatisticEngine"]
//!     R["OperatorRegistry"] -->|"derivation"| E
//!     E -->|"Pipeline"| X["DatasetExecutor"]
//!     X -->|"Field"| E
//!     S["SamplingConfig"] -->|"variability_ar5()"| E
//!     P["RegridPolicy"] -->|"RemapMethod"| O["callers"]
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `operation` | `Operation`, `Pipeline` and their in-process interpretation |
//! | `derivation` | Named transforms and the `OperatorRegistry` |
//! | `executor` | `DatasetExecutor` trait, memory and archive executors |
//! | `regrid` | Remapping method per dataset |
//! | `statistic` | `StatisticEngine`: mean, std, AR5 and inter-annual variability |
//! | `error` | Error types |

mod derivation;
mod error;
mod executor;
mod operation;
mod regrid;
mod statistic;

pub use derivation::{Derivation, ONE_MM_PER_DAY, OperatorRegistry};
pub use error::EngineError;
pub use executor::{ArchiveExecutor, DatasetExecutor, MemoryExecutor};
pub use operation::{Operation, Pipeline, WALSH_ANNUAL_FLOOR, gini_index};
pub use regrid::RegridPolicy;
pub use statistic::{StatKind, StatisticEngine};
