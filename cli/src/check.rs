#![deny(missing_docs)]

//! # Check Command
//!
//! Runs the pipeline twice in memory and fails if the second pass changes
//! anything. Nothing is written.

use crate::apply::print_summary;
use crate::error::{CliError, CliResult};
use droidpatch_core::{ArtifactSet, PipelineConfig};
use std::path::PathBuf;

/// Arguments for the check command.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// Pipeline configuration file (YAML or JSON).
    #[clap(long, short, default_value = "droidpatch.yaml", env = "DROIDPATCH_CONFIG")]
    pub config: PathBuf,
}

/// Executes the idempotence check.
pub fn execute(args: &CheckArgs) -> CliResult<()> {
    let config = PipelineConfig::load(&args.config)?;
    let pipeline = config.pipeline()?;

    let artifacts = ArtifactSet::load(&config.project)?;
    let check = pipeline.check_idempotence(&artifacts)?;

    if !check.is_idempotent() {
        print_summary(&check.second_pass);
        let stages = check.changed_stages();
        let culprit = if stages.is_empty() {
            "artifacts without reporting it".to_string()
        } else {
            stages.join(", ")
        };
        return Err(CliError::NotIdempotent(culprit));
    }

    println!(
        "{} stage(s) are idempotent over {:?}",
        pipeline.stage_names().len(),
        config.project.root
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_check_passes_and_writes_nothing() {
        let dir = tempdir().unwrap();
        let source = "import a.B;\nclass Main {\n}\n";
        fs::write(dir.path().join("Main.java"), source).unwrap();
        fs::write(
            dir.path().join("droidpatch.json"),
            r#"{
                "project": { "sources": { "main": "Main.java" } },
                "stages": [
                    { "kind": "source-injection", "target": "main",
                      "required_imports": ["import c.D;"],
                      "method_signature": "void m(", "method_body": "  void m() {}\n" }
                ]
            }"#,
        )
        .unwrap();

        let args = CheckArgs {
            config: dir.path().join("droidpatch.json"),
        };
        execute(&args).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("Main.java")).unwrap(), source);
    }

    #[test]
    fn test_check_rejects_fighting_stages() {
        let dir = tempdir().unwrap();
        let source = "class Main {\n  void onCreate() {}\n}\n";
        fs::write(dir.path().join("Main.kt"), source).unwrap();
        fs::write(
            dir.path().join("droidpatch.yaml"),
            "project:\n  sources:\n    main: Main.kt\nstages:\n  - kind: generated-section\n    target: main\n    tag: boot\n    contents: \"    boot()\"\n    anchor: onCreate\n  - kind: generated-section\n    target: main\n    tag: boot\n    anchor: onCreate\n    remove: true\n",
        )
        .unwrap();

        let args = CheckArgs {
            config: dir.path().join("droidpatch.yaml"),
        };
        match execute(&args) {
            Err(CliError::NotIdempotent(stages)) => assert!(stages.contains("generated-section")),
            other => panic!("expected a non-idempotent pipeline, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(dir.path().join("Main.kt")).unwrap(), source);
    }
}
