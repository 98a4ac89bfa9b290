//! # Artifact Set
//!
//! The artifacts a pipeline run owns: the manifest tree, resource trees and
//! source documents. They are loaded from the project once before any stage
//! runs and written back once afterwards.

use crate::error::{AppError, AppResult};
use crate::source::{SourceDocument, SourceLanguage};
use crate::xml::XmlTree;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the artifacts live. Paths are relative to `root`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectLayout {
    /// Project root directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Manifest tree in attribute-map JSON form.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    /// Resource trees keyed by a logical name, e.g. `colors`.
    #[serde(default)]
    pub resources: IndexMap<String, PathBuf>,
    /// Source files keyed by a logical name, e.g. `main-activity`.
    #[serde(default)]
    pub sources: IndexMap<String, PathBuf>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl ProjectLayout {
    /// Absolute (root-joined) path of a layout entry.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

/// In-memory artifacts of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactSet {
    /// The manifest, when the layout names one.
    pub manifest: Option<XmlTree>,
    /// Resource trees by logical name.
    pub resources: IndexMap<String, XmlTree>,
    /// Source documents by logical name.
    pub sources: IndexMap<String, SourceDocument>,
}

impl ArtifactSet {
    /// Loads every artifact named by `layout`.
    ///
    /// Any unreadable or malformed artifact aborts the load.
    pub fn load(layout: &ProjectLayout) -> AppResult<Self> {
        let mut set = ArtifactSet::default();

        if let Some(relative) = &layout.manifest {
            let path = layout.resolve(relative);
            set.manifest = Some(XmlTree::parse(&read(&path)?, &path.to_string_lossy())?);
        }

        for (name, relative) in &layout.resources {
            let path = layout.resolve(relative);
            let tree = XmlTree::parse(&read(&path)?, &path.to_string_lossy())?;
            set.resources.insert(name.clone(), tree);
        }

        for (name, relative) in &layout.sources {
            let path = layout.resolve(relative);
            let doc = SourceDocument::new(read(&path)?, SourceLanguage::from_path(&path));
            set.sources.insert(name.clone(), doc);
        }

        info!(
            "loaded {} manifest, {} resource file(s), {} source file(s)",
            if set.manifest.is_some() { "1" } else { "no" },
            set.resources.len(),
            set.sources.len()
        );
        Ok(set)
    }

    /// Writes the artifacts back, skipping files whose contents are unchanged.
    ///
    /// Returns the paths that were written.
    pub fn save(&self, layout: &ProjectLayout) -> AppResult<Vec<PathBuf>> {
        let mut written = Vec::new();

        if let (Some(tree), Some(relative)) = (&self.manifest, &layout.manifest) {
            let path = layout.resolve(relative);
            if write_if_changed(&path, &tree.to_string_pretty()?)? {
                written.push(path);
            }
        }

        for (name, tree) in &self.resources {
            let Some(relative) = layout.resources.get(name) else {
                continue;
            };
            let path = layout.resolve(relative);
            if write_if_changed(&path, &tree.to_string_pretty()?)? {
                written.push(path);
            }
        }

        for (name, doc) in &self.sources {
            let Some(relative) = layout.sources.get(name) else {
                continue;
            };
            let path = layout.resolve(relative);
            if write_if_changed(&path, doc.text())? {
                written.push(path);
            }
        }

        Ok(written)
    }

    /// The manifest, or an error naming the stage that needed it.
    pub fn manifest_mut(&mut self, stage: &str) -> AppResult<&mut XmlTree> {
        self.manifest.as_mut().ok_or_else(|| {
            AppError::General(format!("Stage '{}' needs a manifest, none configured", stage))
        })
    }

    /// A resource tree by logical name.
    pub fn resource_mut(&mut self, name: &str, stage: &str) -> AppResult<&mut XmlTree> {
        self.resources.get_mut(name).ok_or_else(|| {
            AppError::General(format!(
                "Stage '{}' needs resource file '{}', none configured",
                stage, name
            ))
        })
    }

    /// A source document by logical name.
    pub fn source_mut(&mut self, name: &str, stage: &str) -> AppResult<&mut SourceDocument> {
        self.sources.get_mut(name).ok_or_else(|| {
            AppError::General(format!(
                "Stage '{}' needs source file '{}', none configured",
                stage, name
            ))
        })
    }
}

fn read(path: &Path) -> AppResult<String> {
    fs::read_to_string(path)
        .map_err(|e| AppError::General(format!("Failed to read {:?}: {}", path, e)))
}

fn write_if_changed(path: &Path, contents: &str) -> AppResult<bool> {
    let existing = fs::read_to_string(path).ok();
    if existing.as_deref() == Some(contents) {
        return Ok(false);
    }
    fs::write(path, contents)
        .map_err(|e| AppError::General(format!("Failed to write {:?}: {}", path, e)))?;
    debug!("wrote {:?}", path);
    Ok(true)
}
