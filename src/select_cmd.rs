//! Select and metadata commands: show which models and datasets a
//! computation would use.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use tracing::info_span;

use delta_catalog::{CONTROL_EXPERIMENT, dataset_listing};

use crate::cli::SelectArgs;
use crate::session::Session;

/// Prints the selected models, one `experiment role model realization` line each.
pub fn run(args: SelectArgs) -> Result<()> {
    let _cmd = info_span!("select").entered();
    let session = Session::open(&args.common, &[])?;
    for (experiment, models) in session.select()? {
        for pair in &models.changes {
            println!("{experiment} changes {} {}", pair.model, pair.realization);
        }
        for pair in &models.control {
            println!("{experiment} variability {} {}", pair.model, pair.realization);
        }
    }
    Ok(())
}

/// Prints one line per dataset read by the computation, reference datasets
/// once.
pub fn metadata(args: SelectArgs) -> Result<()> {
    let _cmd = info_span!("metadata").entered();
    let session = Session::open(&args.common, &[])?;
    let cfg = &session.aggregate;
    let mut seen = BTreeSet::new();
    for (experiment, models) in session.select()? {
        let mut lines = dataset_listing(
            &session.catalog,
            cfg.project(),
            &[cfg.reference_experiment(), experiment.as_str()],
            cfg.variable(),
            cfg.table(),
            models.changes.as_str_pairs(),
        )
        .with_context(|| format!("failed to list datasets of {experiment}"))?;
        if !models.control.is_empty() {
            lines.extend(
                dataset_listing(
                    &session.catalog,
                    cfg.project(),
                    &[CONTROL_EXPERIMENT],
                    cfg.variable(),
                    cfg.table(),
                    models.control.as_str_pairs(),
                )
                .context("failed to list control datasets")?,
            );
        }
        for line in lines {
            if seen.insert(line.clone()) {
                println!("{line}");
            }
        }
    }
    Ok(())
}
