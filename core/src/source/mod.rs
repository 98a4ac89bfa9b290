//! # Source Patching
//!
//! Text-anchor edits on generated Java/Kotlin sources.
//!
//! - **anchor**: tagged insertion points and search patterns.
//! - **document**: the text buffer and the import/method/call insertions.
//! - **generated**: fingerprinted, replaceable generated sections.
//!
//! Every operation is idempotent through a presence check, and every miss is
//! reported as [`crate::outcome::PatchOutcome::AnchorMissing`].

/// Anchors and patterns.
pub mod anchor;

/// Source documents and insertion operations.
pub mod document;

/// Fingerprinted generated sections.
pub mod generated;

pub use anchor::{Anchor, AnchorKind, Pattern};
pub use document::{
    add_call_after_pattern, add_import, add_method_before_closing_brace, SourceDocument,
    SourceLanguage,
};
pub use generated::{
    merge_generated_section, remove_generated_section, section_fingerprint, GeneratedSection,
};
