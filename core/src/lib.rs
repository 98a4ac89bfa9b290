#![deny(missing_docs)]

//! # droidpatch core
//!
//! Idempotent patching engine for generated Android project artifacts:
//! manifest trees, value resources and Java/Kotlin sources. Every patch
//! checks for its own prior application so the whole pipeline can be re-run
//! on each build without duplicating edits.

/// Shared error types.
pub mod error;

/// Patch outcomes and stage reports.
pub mod outcome;

/// Insertion-ordered flag sets.
pub mod ordered_set;

/// Minimal element tree and its JSON boundary form.
pub mod xml;

/// Manifest and style patching.
pub mod manifest;

/// Named value resources.
pub mod resources;

/// Text-anchor source patching.
pub mod source;

/// Loaded artifacts and project layout.
pub mod artifacts;

/// Stage trait and pipeline runner.
pub mod pipeline;

/// Built-in plugin stages.
pub mod stages;

/// Pipeline configuration files.
pub mod config;

pub use artifacts::{ArtifactSet, ProjectLayout};
pub use config::{PipelineConfig, StageConfig};
pub use error::{AppError, AppResult};
pub use manifest::{
    ensure_style_item, ensure_tools_namespace, merge_config_changes, override_activity,
};
pub use outcome::{PatchOutcome, StageReport};
pub use pipeline::{run, IdempotenceCheck, PatchPipeline, PatchStage, PipelineReport, ProjectRun};
pub use resources::{ensure_named_resource, NamedResource, ResourceList, ResourceMode, StyleNode};
pub use source::{
    add_call_after_pattern, add_import, add_method_before_closing_brace, Anchor, AnchorKind,
    Pattern, SourceDocument, SourceLanguage,
};
pub use xml::{XmlNode, XmlTree};
