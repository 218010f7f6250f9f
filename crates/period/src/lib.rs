//! # delta-period
//!
//! Calendar vocabulary shared by the change engine: seasons, year ranges
//! (`"1995-2014"` period strings) and the control-run slice sampler.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["\"1995-2014\""] -->|"YearRange::from_str()"| B["YearRange"]
//!     B -->|"sample()"| C["SliceEnsemble"]
//!     D["SamplingConfig"] -->|"sample()"| C
//!     E["\"DJF\""] -->|"Season::from_str()"| F["Season"]
//!     F -->|".months()"| G["[12, 1, 2]"]
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `season` | Season tokens and month membership |
//! | `range` | Inclusive year ranges |
//! | `sampler` | Non-overlapping control-run slices with shift relaxation |
//! | `error` | Error types |

mod error;
mod range;
mod sampler;
mod season;

pub use error::PeriodError;
pub use range::YearRange;
pub use sampler::{SamplingConfig, SliceEnsemble, sample};
pub use season::Season;
