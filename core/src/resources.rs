//! # Resource Patching
//!
//! Ordered, name-unique value resources (`<color>`, style `<item>`).
//!
//! The default policy is presence-idempotent: once a name exists its value
//! is left alone, whatever a later call asks for. [`ResourceMode::UpdateIfChanged`]
//! opts into rewriting stale values.

use crate::outcome::PatchOutcome;
use crate::xml::XmlNode;
use serde::{Deserialize, Serialize};
use tracing::debug;

const NAME: &str = "name";

/// How an already-present name is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceMode {
    /// Existing entries win.
    #[default]
    KeepExisting,
    /// Existing entries are rewritten when their value differs.
    UpdateIfChanged,
}

/// A single `{name, value}` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    /// Unique name within the list.
    pub name: String,
    /// Resource value, e.g. `#1a1a1a`.
    pub value: String,
}

/// Ordered resources of one category. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceList {
    entries: Vec<NamedResource>,
}

impl ResourceList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the `tag` children of `parent` that carry a `name` attribute.
    /// Later duplicates of a name are ignored.
    pub fn read(parent: &XmlNode, tag: &str) -> Self {
        let mut list = Self::new();
        for child in parent.children_named(tag) {
            if let Some(name) = child.attr(NAME) {
                if list.get(name).is_none() {
                    list.entries.push(NamedResource {
                        name: name.to_string(),
                        value: child.text.clone().unwrap_or_default(),
                    });
                }
            }
        }
        list
    }

    /// Writes the list back into `parent`.
    ///
    /// Existing elements keep their position and extra attributes; only their
    /// text changes when the value differs. New entries are placed after the
    /// last existing `tag` child, or at the end.
    pub fn write(&self, parent: &mut XmlNode, tag: &str) {
        for entry in &self.entries {
            let existing = parent
                .children
                .iter_mut()
                .find(|c| c.tag == tag && c.attr(NAME) == Some(entry.name.as_str()));
            match existing {
                Some(node) => {
                    if node.text.as_deref().unwrap_or_default() != entry.value {
                        node.text = Some(entry.value.clone());
                    }
                }
                None => {
                    let node = XmlNode::new(tag)
                        .with_attr(NAME, entry.name.clone())
                        .with_text(entry.value.clone());
                    let at = parent
                        .children
                        .iter()
                        .rposition(|c| c.tag == tag)
                        .map_or(parent.children.len(), |i| i + 1);
                    parent.children.insert(at, node);
                }
            }
        }
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&NamedResource> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Iterates in list order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedResource> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<NamedResource> for ResourceList {
    fn from_iter<I: IntoIterator<Item = NamedResource>>(iter: I) -> Self {
        let mut list = Self::new();
        for entry in iter {
            ensure_named_resource(&mut list, &entry.name, &entry.value);
        }
        list
    }
}

/// One `<style>` entry and its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleNode {
    /// Style name, e.g. `AppTheme`.
    pub name: String,
    /// Items scoped to this style.
    pub items: ResourceList,
}

impl StyleNode {
    /// Reads a style element, taking its `item_tag` children as items.
    pub fn read(node: &XmlNode, item_tag: &str) -> Self {
        Self {
            name: node.attr(NAME).unwrap_or_default().to_string(),
            items: ResourceList::read(node, item_tag),
        }
    }
}

/// Appends `{name, value}` unless `name` is already present.
pub fn ensure_named_resource(list: &mut ResourceList, name: &str, value: &str) -> PatchOutcome {
    ensure_named_resource_with(list, name, value, ResourceMode::KeepExisting)
}

/// [`ensure_named_resource`] with an explicit [`ResourceMode`].
pub fn ensure_named_resource_with(
    list: &mut ResourceList,
    name: &str,
    value: &str,
    mode: ResourceMode,
) -> PatchOutcome {
    match list.entries.iter_mut().find(|e| e.name == name) {
        Some(entry) if mode == ResourceMode::UpdateIfChanged && entry.value != value => {
            debug!("resource {}: {} -> {}", name, entry.value, value);
            entry.value = value.to_string();
            PatchOutcome::Updated
        }
        Some(_) => PatchOutcome::AlreadyPresent,
        None => {
            list.entries.push(NamedResource {
                name: name.to_string(),
                value: value.to_string(),
            });
            PatchOutcome::applied()
        }
    }
}
