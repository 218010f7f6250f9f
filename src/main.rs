mod change_cmd;
mod cli;
mod config;
mod convert;
mod logging;
mod select_cmd;
mod session;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Change(args) => change_cmd::run(args),
        Command::Select(args) => select_cmd::run(args),
        Command::Metadata(args) => select_cmd::metadata(args),
    }
}
