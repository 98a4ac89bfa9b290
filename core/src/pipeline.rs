//! # Patch Pipeline
//!
//! Runs an ordered list of stages over one [`ArtifactSet`]. Each stage sees
//! the output of the previous one; nothing is validated in between.
//!
//! Stages must be idempotent (`s(s(x)) == s(x)`): the pipeline is re-run on
//! every build against freshly loaded artifacts and relies on that property
//! to avoid accumulating duplicate edits.

use crate::artifacts::{ArtifactSet, ProjectLayout};
use crate::error::AppResult;
use crate::outcome::{StageReport, TargetOutcome};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A single artifact transformation.
pub trait PatchStage {
    /// Name used in reports and diagnostics.
    fn name(&self) -> &str;

    /// Applies the stage in place.
    ///
    /// Missing nodes or anchors are reported in the returned [`StageReport`];
    /// an `Err` aborts the pipeline.
    fn apply(&self, artifacts: &mut ArtifactSet) -> AppResult<StageReport>;
}

/// Outcome of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// One report per stage, in execution order.
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Whether any stage modified an artifact.
    pub fn changed(&self) -> bool {
        self.stages.iter().any(StageReport::changed)
    }

    /// Every patch that could not be placed, with its stage name.
    pub fn misses(&self) -> Vec<(&str, &TargetOutcome)> {
        self.stages
            .iter()
            .flat_map(|s| s.misses().map(move |o| (s.stage.as_str(), o)))
            .collect()
    }
}

/// Applies `stages` to `artifacts` strictly in order.
pub fn run(artifacts: &mut ArtifactSet, stages: &[Box<dyn PatchStage>]) -> AppResult<PipelineReport> {
    let mut report = PipelineReport::default();
    for stage in stages {
        debug!("running stage '{}'", stage.name());
        let stage_report = stage.apply(artifacts)?;
        for miss in stage_report.misses() {
            warn!("[{}] {}: {}", stage.name(), miss.target, miss.outcome);
        }
        report.stages.push(stage_report);
    }
    Ok(report)
}

/// An ordered, reusable list of stages.
#[derive(Default)]
pub struct PatchPipeline {
    stages: Vec<Box<dyn PatchStage>>,
}

impl PatchPipeline {
    /// Creates a pipeline from stages in execution order.
    pub fn new(stages: Vec<Box<dyn PatchStage>>) -> Self {
        Self { stages }
    }

    /// Appends a stage.
    pub fn push(&mut self, stage: Box<dyn PatchStage>) {
        self.stages.push(stage);
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs every stage over `artifacts`.
    pub fn run(&self, artifacts: &mut ArtifactSet) -> AppResult<PipelineReport> {
        run(artifacts, &self.stages)
    }

    /// Loads the project, runs the stages and, unless `dry_run`, saves it.
    ///
    /// Load failures abort before any stage runs.
    pub fn run_project(&self, layout: &ProjectLayout, dry_run: bool) -> AppResult<ProjectRun> {
        let mut artifacts = ArtifactSet::load(layout)?;
        info!("running {} stage(s)", self.stages.len());
        let report = self.run(&mut artifacts)?;

        let written = if dry_run {
            Vec::new()
        } else {
            artifacts.save(layout)?
        };
        info!(
            "pipeline finished: {} file(s) written, {} miss(es)",
            written.len(),
            report.misses().len()
        );

        Ok(ProjectRun {
            artifacts,
            report,
            written,
        })
    }

    /// Runs the pipeline twice on a copy of `artifacts` and reports whether
    /// the second pass left everything untouched.
    pub fn is_idempotent(&self, artifacts: &ArtifactSet) -> AppResult<bool> {
        Ok(self.check_idempotence(artifacts)?.is_idempotent())
    }

    /// Runs the pipeline twice on a copy of `artifacts`, keeping the second
    /// pass report for diagnostics.
    pub fn check_idempotence(&self, artifacts: &ArtifactSet) -> AppResult<IdempotenceCheck> {
        let mut first = artifacts.clone();
        self.run(&mut first)?;
        let mut second = first.clone();
        let report = self.run(&mut second)?;
        Ok(IdempotenceCheck {
            artifacts_equal: first == second,
            second_pass: report,
        })
    }
}

/// Result of [`PatchPipeline::check_idempotence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotenceCheck {
    /// Artifacts after the second pass equal those after the first.
    pub artifacts_equal: bool,
    /// Outcomes of the second pass.
    pub second_pass: PipelineReport,
}

impl IdempotenceCheck {
    /// Whether the second pass neither reported nor produced a change.
    pub fn is_idempotent(&self) -> bool {
        self.artifacts_equal && !self.second_pass.changed()
    }

    /// Stages whose second pass reported a change.
    pub fn changed_stages(&self) -> Vec<&str> {
        self.second_pass
            .stages
            .iter()
            .filter(|s| s.changed())
            .map(|s| s.stage.as_str())
            .collect()
    }
}

/// Result of [`PatchPipeline::run_project`].
#[derive(Debug)]
pub struct ProjectRun {
    /// Artifacts after all stages.
    pub artifacts: ArtifactSet,
    /// Per-stage outcomes.
    pub report: PipelineReport,
    /// Files written back.
    pub written: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::outcome::PatchOutcome;
    use crate::source::{SourceDocument, SourceLanguage};

    struct Append(&'static str);

    impl PatchStage for Append {
        fn name(&self) -> &str {
            "append"
        }

        fn apply(&self, artifacts: &mut ArtifactSet) -> AppResult<StageReport> {
            let doc = artifacts.source_mut("main", self.name())?;
            let mut text = doc.text().to_string();
            text.push_str(self.0);
            *doc = SourceDocument::new(text, doc.language());
            let mut report = StageReport::new(self.name());
            report.record(self.0, PatchOutcome::applied());
            Ok(report)
        }
    }

    struct Fail;

    impl PatchStage for Fail {
        fn name(&self) -> &str {
            "fail"
        }

        fn apply(&self, _: &mut ArtifactSet) -> AppResult<StageReport> {
            Err(AppError::General("boom".into()))
        }
    }

    fn artifacts() -> ArtifactSet {
        let mut set = ArtifactSet::default();
        set.sources
            .insert("main".into(), SourceDocument::new("", SourceLanguage::Java));
        set
    }

    #[test]
    fn test_stages_run_in_order() {
        let pipeline = PatchPipeline::new(vec![Box::new(Append("a")), Box::new(Append("b"))]);
        let mut set = artifacts();
        let report = pipeline.run(&mut set).unwrap();
        assert_eq!(set.sources["main"].text(), "ab");
        assert_eq!(report.stages.len(), 2);
        assert!(report.changed());
    }

    #[test]
    fn test_error_aborts_remaining_stages() {
        let pipeline = PatchPipeline::new(vec![Box::new(Fail), Box::new(Append("a"))]);
        let mut set = artifacts();
        assert!(pipeline.run(&mut set).is_err());
        assert_eq!(set.sources["main"].text(), "");
    }

    #[test]
    fn test_non_idempotent_stage_detected() {
        let pipeline = PatchPipeline::new(vec![Box::new(Append("x"))]);
        assert!(!pipeline.is_idempotent(&artifacts()).unwrap());
    }

    #[test]
    fn test_idempotence_check_names_changing_stage() {
        let pipeline = PatchPipeline::new(vec![Box::new(Append("x"))]);
        let check = pipeline.check_idempotence(&artifacts()).unwrap();
        assert!(!check.artifacts_equal);
        assert!(!check.is_idempotent());
        assert_eq!(check.changed_stages(), vec!["append"]);
    }

    #[test]
    fn test_stage_names() {
        let pipeline = PatchPipeline::new(vec![Box::new(Append("a")), Box::new(Fail)]);
        assert_eq!(pipeline.stage_names(), vec!["append", "fail"]);
    }
}
