//! Source documents and the anchor-addressed insertion operations.

use super::anchor::{Anchor, AnchorKind, Pattern};
use crate::outcome::PatchOutcome;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Language of a generated source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceLanguage {
    /// `.java`
    #[default]
    Java,
    /// `.kt`
    Kotlin,
}

impl SourceLanguage {
    /// Infers the language from a file extension, defaulting to Java.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("kt") | Some("kts") => SourceLanguage::Kotlin,
            _ => SourceLanguage::Java,
        }
    }

    /// Keyword that starts an import line.
    pub fn import_keyword(&self) -> &'static str {
        "import "
    }

    /// Statement terminator completing an import line.
    pub fn terminator(&self) -> &'static str {
        match self {
            SourceLanguage::Java => ";",
            SourceLanguage::Kotlin => "",
        }
    }
}

/// An opaque text buffer addressed through [`Anchor`]s.
///
/// Bytes outside inserted regions are never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    text: String,
    language: SourceLanguage,
}

impl SourceDocument {
    /// Wraps `text`.
    pub fn new(text: impl Into<String>, language: SourceLanguage) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }

    /// Current contents.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consumes the document, returning its contents.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Language of the document.
    pub fn language(&self) -> SourceLanguage {
        self.language
    }

    /// Literal presence check.
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// Byte offsets at which content addressed by `anchor` is inserted.
    ///
    /// - `LastImportLine`: just past the last line starting with the import
    ///   keyword (its newline included, if any).
    /// - `ClassClosingBrace`: the final `}` that is followed only by
    ///   whitespace and preceded by a newline.
    /// - `CallSite`: the end of every match.
    ///
    /// An empty result means the anchor is missing.
    pub fn resolve(&self, anchor: &Anchor) -> Vec<usize> {
        match anchor {
            Anchor::LastImportLine => self.last_import_line_end().into_iter().collect(),
            Anchor::ClassClosingBrace => closing_brace_regex()
                .find(&self.text)
                .map(|m| m.start() + 1)
                .into_iter()
                .collect(),
            Anchor::CallSite(pattern) => pattern
                .find_all(&self.text)
                .into_iter()
                .map(|r| r.end)
                .collect(),
        }
    }

    pub(crate) fn replace_text(&mut self, text: String) {
        self.text = text;
    }

    fn last_import_line_end(&self) -> Option<usize> {
        let keyword = self.language.import_keyword();
        let start = match self.text.rfind(&format!("\n{}", keyword)) {
            Some(newline) => newline + 1,
            None if self.text.starts_with(keyword) => 0,
            None => return None,
        };
        Some(match self.text[start..].find('\n') {
            Some(end) => start + end + 1,
            None => self.text.len(),
        })
    }

    fn line_indent(&self, offset: usize) -> &str {
        let line_start = self.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line = &self.text[line_start..];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }
}

fn closing_brace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\}\s*$").expect("static pattern compiles"))
}

/// Inserts `import_line` after the last existing import.
///
/// The line is completed with the language's statement terminator when it
/// lacks one, so `import a.B` and `import a.B;` are the same Java import.
/// Documents without any import line are left alone and reported as
/// [`AnchorKind::LastImportLine`] misses.
pub fn add_import(doc: &mut SourceDocument, import_line: &str) -> PatchOutcome {
    let mut line = import_line.trim_end().to_string();
    let terminator = doc.language.terminator();
    if !line.ends_with(terminator) {
        line.push_str(terminator);
    }
    let line = line.as_str();
    if doc.contains(line) {
        return PatchOutcome::AlreadyPresent;
    }

    let Some(&at) = doc.resolve(&Anchor::LastImportLine).first() else {
        return anchor_missing(AnchorKind::LastImportLine, line);
    };

    if at == doc.text.len() && !doc.text.ends_with('\n') {
        doc.text.insert_str(at, &format!("\n{}", line));
    } else {
        doc.text.insert_str(at, &format!("{}\n", line));
    }
    debug!("inserted import '{}'", line);
    PatchOutcome::applied()
}

/// Inserts `method_body` right above the final closing brace, unless
/// `method_signature` already appears in the document.
///
/// The anchor is re-resolved on every call, so successive methods land in
/// call order just above the brace.
pub fn add_method_before_closing_brace(
    doc: &mut SourceDocument,
    method_signature: &str,
    method_body: &str,
) -> PatchOutcome {
    if doc.contains(method_signature) {
        return PatchOutcome::AlreadyPresent;
    }

    let Some(&at) = doc.resolve(&Anchor::ClassClosingBrace).first() else {
        return anchor_missing(AnchorKind::ClassClosingBrace, method_signature);
    };

    let mut block = method_body.to_string();
    if !block.ends_with('\n') {
        block.push('\n');
    }
    doc.text.insert_str(at, &block);
    debug!("inserted method '{}'", method_signature);
    PatchOutcome::applied()
}

/// Inserts `call_line` on a new line after every match of `anchor`,
/// indented like the matched line.
///
/// Every match receives a copy: two matches yield two inserted lines, and
/// the outcome reports `insertions: 2`.
pub fn add_call_after_pattern(
    doc: &mut SourceDocument,
    anchor: &Pattern,
    call_line: &str,
) -> PatchOutcome {
    let line = call_line.trim();
    if doc.contains(line) {
        return PatchOutcome::AlreadyPresent;
    }

    let offsets = doc.resolve(&Anchor::CallSite(anchor.clone()));
    if offsets.is_empty() {
        return anchor_missing(AnchorKind::CallSite, anchor.as_str());
    }
    if offsets.len() > 1 {
        warn!(
            "call anchor '{}' matched {} times; '{}' is inserted after each",
            anchor.as_str(),
            offsets.len(),
            line
        );
    }

    // Back to front so earlier offsets stay valid.
    for &at in offsets.iter().rev() {
        let insertion = format!("\n{}{}", doc.line_indent(at), line);
        doc.text.insert_str(at, &insertion);
    }
    debug!("inserted call '{}' x{}", line, offsets.len());
    PatchOutcome::Applied {
        insertions: offsets.len(),
    }
}

fn anchor_missing(kind: AnchorKind, what: &str) -> PatchOutcome {
    warn!("{} anchor not found for '{}'", kind, what);
    PatchOutcome::AnchorMissing(kind)
}
