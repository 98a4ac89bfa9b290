//! Tagged insertion anchors for source documents.

use crate::error::AppResult;
use regex::Regex;
use std::fmt;
use std::ops::Range;

/// A literal or regular-expression search pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Plain substring.
    Literal(String),
    /// Compiled regular expression.
    Regex(Regex),
}

impl Pattern {
    /// A literal substring pattern.
    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    /// Compiles a regular-expression pattern.
    pub fn regex(expr: &str) -> AppResult<Self> {
        Ok(Pattern::Regex(Regex::new(expr)?))
    }

    /// Byte ranges of every non-overlapping match, in document order.
    pub fn find_all(&self, text: &str) -> Vec<Range<usize>> {
        match self {
            Pattern::Literal(needle) if needle.is_empty() => Vec::new(),
            Pattern::Literal(needle) => text
                .match_indices(needle.as_str())
                .map(|(start, m)| start..start + m.len())
                .collect(),
            Pattern::Regex(re) => re
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect(),
        }
    }

    /// Whether the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        !self.find_all(text).is_empty()
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Literal(needle) => needle,
            Pattern::Regex(re) => re.as_str(),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pattern::Literal(a), Pattern::Literal(b)) => a == b,
            (Pattern::Regex(a), Pattern::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// An addressable position in a source document.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    /// End of the last top-level import line.
    LastImportLine,
    /// The final top-level closing brace of the document.
    ClassClosingBrace,
    /// End of every match of the pattern.
    CallSite(Pattern),
}

impl Anchor {
    /// The anchor's tag, without its payload.
    pub fn kind(&self) -> AnchorKind {
        match self {
            Anchor::LastImportLine => AnchorKind::LastImportLine,
            Anchor::ClassClosingBrace => AnchorKind::ClassClosingBrace,
            Anchor::CallSite(_) => AnchorKind::CallSite,
        }
    }
}

/// Payload-free anchor tag, carried by [`crate::outcome::PatchOutcome::AnchorMissing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    /// See [`Anchor::LastImportLine`].
    LastImportLine,
    /// See [`Anchor::ClassClosingBrace`].
    ClassClosingBrace,
    /// See [`Anchor::CallSite`].
    CallSite,
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnchorKind::LastImportLine => "last-import-line",
            AnchorKind::ClassClosingBrace => "class-closing-brace",
            AnchorKind::CallSite => "call-site",
        };
        f.write_str(name)
    }
}
