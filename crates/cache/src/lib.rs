//! # delta-cache
//!
//! On-disk cache of [`AggregateBundle`](delta_aggregate::AggregateBundle)s.
//!
//! Each field is one Parquet file whose name carries its identity
//! (season, variable, experiment, kind, derivation, periods) and the
//! [`CacheTag`] of the ensemble that produced it. Reading scans the files of
//! a tag and rebuilds the bundle; a request whose field is absent is a
//! [`CacheError::Miss`] and gets recomputed in full.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     S["ModelVariantSet"] -->|"derive()"| T["CacheTag"]
//!     B["AggregateBundle"] -->|"write()"| D[("cache dir")]
//!     D -->|"read() / fetch()"| B2["AggregateBundle"]
//!     T --> D
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `tag` | `CacheTag` derivation |
//! | `entry` | File naming scheme |
//! | `store` | `EnsembleCache` reads and writes |
//! | `error` | Error types |

mod entry;
mod error;
mod store;
mod tag;

pub use entry::CacheEntry;
pub use error::CacheError;
pub use store::EnsembleCache;
pub use tag::CacheTag;
