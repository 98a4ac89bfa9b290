#![deny(missing_docs)]

//! # droidpatch CLI
//!
//! Command Line Interface for the idempotent Android artifact patcher.
//!
//! Supported Commands:
//! - `apply`: load the project, run the configured stages, write changes.
//! - `check`: verify that a second run of the pipeline is a no-op.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod apply;
mod check;
mod error;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Idempotent Android artifact patcher")]
struct Cli {
    /// Log patch decisions at debug level.
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the configured stages and write changed artifacts.
    Apply(apply::ApplyArgs),
    /// Fail if a second run of the pipeline would change anything.
    Check(check::CheckArgs),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Apply(args) => apply::execute(args)?,
        Commands::Check(args) => check::execute(args)?,
    }

    Ok(())
}
