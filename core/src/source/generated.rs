//! Tagged generated sections.
//!
//! A section is a block of lines fenced by marker comments that carry a
//! fingerprint of the block contents:
//!
//! ```text
//! // @generated begin splash - droidpatch (DO NOT MODIFY) sync-1f3a...
//! SplashScreen.show(this);
//! // @generated end splash
//! ```
//!
//! Unlike the presence checks in [`super::document`], a section is replaced
//! when its contents change.

use super::anchor::{AnchorKind, Pattern};
use super::document::SourceDocument;
use crate::outcome::PatchOutcome;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

const FINGERPRINT_BYTES: usize = 20;

/// Where and what to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSection {
    /// Unique section tag.
    pub tag: String,
    /// Lines to place between the markers.
    pub contents: String,
    /// First line matching this pattern is the anchor line.
    pub anchor: Pattern,
    /// Line offset from the anchor line; `1` places the block right below it.
    pub offset: isize,
    /// Line-comment prefix of the target language, e.g. `//`.
    pub comment: String,
}

/// SHA-256 fingerprint of section contents, hex encoded.
pub fn section_fingerprint(contents: &str) -> String {
    let digest = Sha256::digest(contents.as_bytes());
    digest[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Inserts the section, or replaces it when its contents changed.
///
/// Returns `AlreadyPresent` when the fingerprint matches, `Updated` when an
/// older version was replaced, and `AnchorMissing` (document untouched) when
/// the anchor line cannot be found.
pub fn merge_generated_section(doc: &mut SourceDocument, section: &GeneratedSection) -> PatchOutcome {
    let fingerprint = section_fingerprint(&section.contents);
    let mut lines: Vec<String> = split_lines(doc.text());

    let existed = match find_section(&lines, &section.tag) {
        Some(found) if found.fingerprint == fingerprint => return PatchOutcome::AlreadyPresent,
        Some(found) => {
            lines.drain(found.begin..=found.end);
            true
        }
        None => false,
    };

    let Some(anchor_line) = lines.iter().position(|l| section.anchor.is_match(l)) else {
        warn!(
            "{} anchor '{}' not found for section '{}'",
            AnchorKind::CallSite,
            section.anchor.as_str(),
            section.tag
        );
        return PatchOutcome::AnchorMissing(AnchorKind::CallSite);
    };

    let at = (anchor_line as isize)
        .saturating_add(section.offset)
        .clamp(0, lines.len() as isize) as usize;
    if at == lines.len() {
        if let Some(last) = lines.last_mut() {
            if !last.ends_with('\n') {
                last.push('\n');
            }
        }
    }

    let mut block = Vec::new();
    block.push(format!(
        "{} @generated begin {} - droidpatch (DO NOT MODIFY) sync-{}\n",
        section.comment, section.tag, fingerprint
    ));
    for line in section.contents.trim_end_matches('\n').split('\n') {
        block.push(format!("{}\n", line));
    }
    block.push(format!("{} @generated end {}\n", section.comment, section.tag));
    lines.splice(at..at, block);

    doc.replace_text(lines.concat());
    debug!("generated section '{}' written at line {}", section.tag, at + 1);
    if existed {
        PatchOutcome::Updated
    } else {
        PatchOutcome::applied()
    }
}

/// Removes the section tagged `tag`, markers included.
///
/// Returns `Updated` when a section was removed and `AlreadyPresent` when
/// there was nothing to remove.
pub fn remove_generated_section(doc: &mut SourceDocument, tag: &str) -> PatchOutcome {
    let mut lines = split_lines(doc.text());
    match find_section(&lines, tag) {
        Some(found) => {
            lines.drain(found.begin..=found.end);
            doc.replace_text(lines.concat());
            debug!("generated section '{}' removed", tag);
            PatchOutcome::Updated
        }
        None => PatchOutcome::AlreadyPresent,
    }
}

struct FoundSection {
    begin: usize,
    end: usize,
    fingerprint: String,
}

fn find_section(lines: &[String], tag: &str) -> Option<FoundSection> {
    let begin_marker = format!("@generated begin {} - ", tag);
    let end_marker = format!("@generated end {}", tag);

    let begin = lines.iter().position(|l| l.contains(&begin_marker))?;
    let end = begin
        + lines[begin..]
            .iter()
            .position(|l| l.trim_end().ends_with(&end_marker))?;
    let fingerprint = lines[begin]
        .trim_end()
        .rsplit_once("sync-")
        .map(|(_, hash)| hash.to_string())
        .unwrap_or_default();

    Some(FoundSection {
        begin,
        end,
        fingerprint,
    })
}

fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}
