use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Delta multi-model ensemble change fields.
#[derive(Parser)]
#[command(
    name = "delta",
    version,
    about = "Multi-model ensemble climate change fields with robustness masks"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Compute (or fetch from cache) the ensemble change fields.
    Change(ChangeArgs),
    /// List the models and realizations selected for each experiment.
    Select(SelectArgs),
    /// List the datasets a computation would read.
    Metadata(SelectArgs),
}

/// Options shared by every subcommand.
#[derive(clap::Args)]
pub struct CommonArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "delta.toml")]
    pub config: PathBuf,

    /// Override the catalog tag from config.
    #[arg(long = "catalog-tag")]
    pub catalog_tag: Option<String>,

    /// Override the variable from config.
    #[arg(long)]
    pub variable: Option<String>,

    /// Override the projection experiments from config (repeatable).
    #[arg(short, long = "experiment")]
    pub experiments: Vec<String>,
}

/// Arguments for the `change` subcommand.
#[derive(clap::Args)]
pub struct ChangeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override the seasons from config (repeatable).
    #[arg(short, long = "season")]
    pub seasons: Vec<String>,

    /// Recompute even if the cache holds the results.
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Path for diagnostics JSON output (stdout if absent).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `select` and `metadata` subcommands.
#[derive(clap::Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}
