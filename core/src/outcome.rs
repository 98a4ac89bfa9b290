//! # Patch Outcomes
//!
//! Every patch operation reports what happened to the artifact instead of
//! silently returning it. This lets callers tell "nothing to do" apart from
//! "the edit could not be placed".

use crate::source::AnchorKind;
use std::fmt;

/// Result of a single patch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Content was inserted. `insertions` counts the inserted copies, which is
    /// greater than one when a call-site anchor matched several times.
    Applied {
        /// Number of inserted copies.
        insertions: usize,
    },
    /// An existing entry was rewritten in an explicit update mode.
    Updated,
    /// The content was already there.
    AlreadyPresent,
    /// The source anchor could not be resolved; nothing was inserted.
    AnchorMissing(AnchorKind),
    /// A required structural node is absent; the artifact is unchanged.
    NodeMissing(String),
}

impl PatchOutcome {
    /// A single insertion.
    pub fn applied() -> Self {
        PatchOutcome::Applied { insertions: 1 }
    }

    /// Whether the artifact was modified.
    pub fn changed(&self) -> bool {
        matches!(self, PatchOutcome::Applied { .. } | PatchOutcome::Updated)
    }

    /// Whether the patch could not be placed.
    pub fn is_miss(&self) -> bool {
        matches!(
            self,
            PatchOutcome::AnchorMissing(_) | PatchOutcome::NodeMissing(_)
        )
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOutcome::Applied { insertions: 1 } => write!(f, "applied"),
            PatchOutcome::Applied { insertions } => write!(f, "applied x{}", insertions),
            PatchOutcome::Updated => write!(f, "updated"),
            PatchOutcome::AlreadyPresent => write!(f, "already present"),
            PatchOutcome::AnchorMissing(kind) => write!(f, "anchor missing ({})", kind),
            PatchOutcome::NodeMissing(node) => write!(f, "node missing ({})", node),
        }
    }
}

/// A labelled outcome, e.g. `("import com.foo.Bar;", Applied)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    /// What the patch was aimed at.
    pub target: String,
    /// What happened.
    pub outcome: PatchOutcome,
}

/// Outcomes collected by one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Stage name.
    pub stage: String,
    /// Outcomes in the order the stage produced them.
    pub outcomes: Vec<TargetOutcome>,
}

impl StageReport {
    /// Creates an empty report for `stage`.
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            outcomes: Vec::new(),
        }
    }

    /// Records an outcome against `target`.
    pub fn record(&mut self, target: impl Into<String>, outcome: PatchOutcome) {
        self.outcomes.push(TargetOutcome {
            target: target.into(),
            outcome,
        });
    }

    /// Whether any patch in this stage modified an artifact.
    pub fn changed(&self) -> bool {
        self.outcomes.iter().any(|o| o.outcome.changed())
    }

    /// Outcomes that could not be placed.
    pub fn misses(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.is_miss())
    }
}
