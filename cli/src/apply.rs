#![deny(missing_docs)]

//! # Apply Command
//!
//! Loads the project named in the config, runs every stage and writes the
//! changed artifacts back.

use crate::error::{CliError, CliResult};
use droidpatch_core::{PipelineConfig, PipelineReport};
use std::path::PathBuf;
use tracing::info;

/// Arguments for the apply command.
#[derive(clap::Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Pipeline configuration file (YAML or JSON).
    #[clap(long, short, default_value = "droidpatch.yaml", env = "DROIDPATCH_CONFIG")]
    pub config: PathBuf,

    /// Run the stages without writing anything back.
    #[clap(long)]
    pub dry_run: bool,

    /// Fail when any patch misses its anchor or node.
    #[clap(long)]
    pub strict: bool,
}

/// Executes the apply command.
pub fn execute(args: &ApplyArgs) -> CliResult<()> {
    let config = PipelineConfig::load(&args.config)?;
    let pipeline = config.pipeline()?;

    info!("applying {} stage(s) from {:?}", config.stages.len(), args.config);
    let run = pipeline.run_project(&config.project, args.dry_run)?;

    print_summary(&run.report);
    for path in &run.written {
        println!("  wrote {}", path.display());
    }
    if args.dry_run && run.report.changed() {
        println!("Dry run: changes were not written.");
    }

    let misses = run.report.misses().len();
    if args.strict && misses > 0 {
        return Err(CliError::Misses(misses));
    }
    Ok(())
}

/// Prints one line per patch outcome, grouped by stage.
pub fn print_summary(report: &PipelineReport) {
    for stage in &report.stages {
        println!("[{}]", stage.stage);
        for outcome in &stage.outcomes {
            println!("  {:<48} {}", outcome.target, outcome.outcome);
        }
    }
}
