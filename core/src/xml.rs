//! # Structural XML Model
//!
//! A minimal element tree: tag, ordered attribute map, optional text and
//! ordered children. It is not an XML parser. Trees cross the load/save
//! boundary in the attribute-map JSON form emitted by xml2js-style
//! converters:
//!
//! ```json
//! { "manifest": { "$": { "package": "com.app" }, "application": [ { "$": {} } ] } }
//! ```
//!
//! - `$` holds the attribute map.
//! - `_` holds character data.
//! - every other key is a child tag mapped to an array of elements; a bare
//!   string element is a text-only child.
//!
//! Loaded elements remember their JSON shape (key order, an empty `$`, a
//! text-only element written as `{"_": ..}` instead of a bare string), so an
//! unpatched tree saves back byte-identical. Children sharing a tag are
//! always grouped under one key, as the format requires. Elements created
//! by patches use the plain shape: `$`, then `_`, then child groups.

use crate::error::{AppError, AppResult};
use indexmap::IndexMap;
use serde_json::{Map, Value};

const ATTRS_KEY: &str = "$";
const TEXT_KEY: &str = "_";

/// One element of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    /// Element name, e.g. `activity`.
    pub tag: String,
    /// Attributes in document order. Keys are unique by construction.
    pub attributes: IndexMap<String, String>,
    /// Character data, if any.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
    form: JsonForm,
}

/// JSON shape an element was loaded with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct JsonForm {
    /// Written as an object even when it only holds text.
    object: bool,
    /// Object keys in their original order.
    keys: Vec<String>,
}

impl XmlNode {
    /// Creates an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
            form: JsonForm::default(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Reads an attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Sets an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Removes an attribute, keeping the order of the others.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        self.attributes.shift_remove(key)
    }

    /// Children with the given tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Whether at least one child has the given tag.
    pub fn has_child(&self, tag: &str) -> bool {
        self.children.iter().any(|c| c.tag == tag)
    }

    /// First child with the given tag.
    pub fn child_mut(&mut self, tag: &str) -> Option<&mut XmlNode> {
        self.children.iter_mut().find(|c| c.tag == tag)
    }

    /// First child with the given tag whose `attr` equals `value`.
    pub fn find_child(&self, tag: &str, attr: &str, value: &str) -> Option<&XmlNode> {
        self.children
            .iter()
            .find(|c| c.tag == tag && c.attr(attr) == Some(value))
    }

    /// Mutable variant of [`XmlNode::find_child`].
    pub fn find_child_mut(&mut self, tag: &str, attr: &str, value: &str) -> Option<&mut XmlNode> {
        self.children
            .iter_mut()
            .find(|c| c.tag == tag && c.attr(attr) == Some(value))
    }

    /// Appends a child.
    pub fn push_child(&mut self, child: XmlNode) {
        self.children.push(child);
    }

    fn from_json(tag: &str, value: &Value, origin: &str) -> AppResult<Self> {
        let mut node = XmlNode::new(tag);
        let object = match value {
            Value::String(text) => return Ok(node.with_text(text.clone())),
            Value::Object(object) => {
                node.form = JsonForm {
                    object: true,
                    keys: object.keys().cloned().collect(),
                };
                object
            }
            other => {
                return Err(AppError::malformed(
                    origin,
                    format!("element <{}> is {}, expected an object", tag, kind_of(other)),
                ))
            }
        };

        for (key, entry) in object {
            match key.as_str() {
                ATTRS_KEY => {
                    let attrs = entry.as_object().ok_or_else(|| {
                        AppError::malformed(origin, format!("attributes of <{}> are not a map", tag))
                    })?;
                    for (name, attr_value) in attrs {
                        let attr_value = attr_value.as_str().ok_or_else(|| {
                            AppError::malformed(
                                origin,
                                format!("attribute '{}' of <{}> is not a string", name, tag),
                            )
                        })?;
                        node.attributes.insert(name.clone(), attr_value.to_string());
                    }
                }
                TEXT_KEY => {
                    let text = entry.as_str().ok_or_else(|| {
                        AppError::malformed(origin, format!("text of <{}> is not a string", tag))
                    })?;
                    node.text = Some(text.to_string());
                }
                child_tag => {
                    let group = entry.as_array().ok_or_else(|| {
                        AppError::malformed(
                            origin,
                            format!("children '{}' of <{}> are not an array", child_tag, tag),
                        )
                    })?;
                    for child in group {
                        node.children
                            .push(XmlNode::from_json(child_tag, child, origin)?);
                    }
                }
            }
        }

        Ok(node)
    }

    fn to_json(&self) -> Value {
        if !self.form.object && self.attributes.is_empty() && self.children.is_empty() {
            if let Some(text) = &self.text {
                return Value::String(text.clone());
            }
        }

        let mut entries: IndexMap<String, Value> = IndexMap::new();
        if !self.attributes.is_empty() || self.form.keys.iter().any(|k| k == ATTRS_KEY) {
            let attrs: Map<String, Value> = self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            entries.insert(ATTRS_KEY.to_string(), Value::Object(attrs));
        }
        if let Some(text) = &self.text {
            entries.insert(TEXT_KEY.to_string(), Value::String(text.clone()));
        }

        // Children regroup by tag in order of first appearance.
        let mut groups: IndexMap<&str, Vec<Value>> = IndexMap::new();
        for child in &self.children {
            groups.entry(&child.tag).or_default().push(child.to_json());
        }
        for (tag, group) in groups {
            entries.insert(tag.to_string(), Value::Array(group));
        }

        let mut object = Map::new();
        for key in &self.form.keys {
            if let Some(value) = entries.shift_remove(key) {
                object.insert(key.clone(), value);
            }
        }
        object.extend(entries);
        Value::Object(object)
    }
}

/// A rooted element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTree {
    /// The document element.
    pub root: XmlNode,
}

impl XmlTree {
    /// Wraps a root element.
    pub fn new(root: XmlNode) -> Self {
        Self { root }
    }

    /// Builds a tree from its JSON boundary form.
    ///
    /// `origin` names the artifact in error messages.
    pub fn from_json(value: &Value, origin: &str) -> AppResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            AppError::malformed(origin, format!("document is {}, expected an object", kind_of(value)))
        })?;

        let mut entries = object.iter();
        let (tag, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => return Err(AppError::malformed(origin, "document has no root element")),
            (Some(_), Some(_)) => {
                return Err(AppError::malformed(origin, "document has more than one root element"))
            }
        };

        if !body.is_object() {
            return Err(AppError::malformed(
                origin,
                format!("root <{}> is {}, expected an object", tag, kind_of(body)),
            ));
        }

        Ok(Self::new(XmlNode::from_json(tag, body, origin)?))
    }

    /// Parses the JSON boundary form from text.
    pub fn parse(text: &str, origin: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| AppError::malformed(origin, e.to_string()))?;
        Self::from_json(&value, origin)
    }

    /// Converts the tree back to its JSON boundary form.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        let body = match self.root.to_json() {
            Value::String(text) => {
                let mut wrapped = Map::new();
                wrapped.insert(TEXT_KEY.to_string(), Value::String(text));
                Value::Object(wrapped)
            }
            other => other,
        };
        object.insert(self.root.tag.clone(), body);
        Value::Object(object)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_string_pretty(&self) -> AppResult<String> {
        let mut text = serde_json::to_string_pretty(&self.to_json())?;
        text.push('\n');
        Ok(text)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
