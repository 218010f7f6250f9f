//! # delta-field
//!
//! Geophysical fields on rectilinear latitude/longitude grids.
//!
//! Missing values are `NaN`. Arithmetic between fields propagates them, and
//! reductions (area means, ensemble statistics, time statistics) skip them.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `grid` | Rectilinear grids, cell bounds and area weights |
//! | `field` | One 2-D field and its cell-wise arithmetic |
//! | `series` | Time series of fields and their time reductions |
//! | `ensemble` | Cell-wise statistics across an ensemble of fields |
//! | `remap` | Conservative, distance-weighted and identity remapping |
//! | `error` | Error types |

mod ensemble;
mod error;
mod field;
mod grid;
mod remap;
mod series;

pub use ensemble::{
    ensemble_fraction, ensemble_mean, ensemble_median, ensemble_percentile, ensemble_std1,
    reduce_cells,
};
pub use error::FieldError;
pub use field::Field;
pub use grid::Grid;
pub use remap::{RemapMethod, remap};
pub use series::{FieldSeries, Reduce, Stamp};
