//! # Built-in Stages
//!
//! Plugin stages, each configured with static option data and built on the
//! manifest, resource and source patchers.

use crate::artifacts::ArtifactSet;
use crate::error::AppResult;
use crate::manifest::{
    ensure_style_item_with, ensure_tools_namespace, merge_config_changes, override_activity,
    TOOLS_NAMESPACE_KEY,
};
use crate::outcome::StageReport;
use crate::pipeline::PatchStage;
use crate::resources::{ensure_named_resource_with, NamedResource, ResourceList, ResourceMode};
use crate::source::{
    add_call_after_pattern, add_import, add_method_before_closing_brace, merge_generated_section,
    remove_generated_section, GeneratedSection, Pattern,
};
use indexmap::IndexMap;

/// Adds the `tools` namespace to the manifest root.
#[derive(Debug, Clone, Default)]
pub struct ToolsNamespaceStage;

impl PatchStage for ToolsNamespaceStage {
    fn name(&self) -> &str {
        "tools-namespace"
    }

    fn apply(&self, artifacts: &mut ArtifactSet) -> AppResult<StageReport> {
        let tree = artifacts.manifest_mut(self.name())?;
        let mut report = StageReport::new(self.name());
        report.record(TOOLS_NAMESPACE_KEY, ensure_tools_namespace(tree));
        Ok(report)
    }
}

/// Overrides attributes of library activities through `tools:replace`.
#[derive(Debug, Clone)]
pub struct ActivityOverrideStage {
    /// Fully qualified activity names.
    pub activity_names: Vec<String>,
    /// Attribute overrides, in `tools:replace` order.
    pub overrides: IndexMap<String, String>,
}

impl PatchStage for ActivityOverrideStage {
    fn name(&self) -> &str {
        "activity-override"
    }

    fn apply(&self, artifacts: &mut ArtifactSet) -> AppResult<StageReport> {
        let tree = artifacts.manifest_mut(self.name())?;
        let mut report = StageReport::new(self.name());
        report.record(TOOLS_NAMESPACE_KEY, ensure_tools_namespace(tree));
        for activity in &self.activity_names {
            report.record(activity.clone(), override_activity(tree, activity, &self.overrides));
        }
        Ok(report)
    }
}

/// Lets an activity handle resize-related configuration changes itself.
#[derive(Debug, Clone)]
pub struct ConfigChangesStage {
    /// Activity `android:name`, e.g. `.MainActivity`.
    pub activity_name: String,
    /// Flags to merge, in catalog order.
    pub flags: Vec<String>,
}

impl PatchStage for ConfigChangesStage {
    fn name(&self) -> &str {
        "config-changes"
    }

    fn apply(&self, artifacts: &mut ArtifactSet) -> AppResult<StageReport> {
        let tree = artifacts.manifest_mut(self.name())?;
        let mut report = StageReport::new(self.name());
        report.record(
            self.activity_name.clone(),
            merge_config_changes(tree, &self.activity_name, self.flags.as_slice()),
        );
        Ok(report)
    }
}

/// Ensures a catalog of named resources (colors by default) exists.
#[derive(Debug, Clone)]
pub struct NamedResourcesStage {
    /// Logical resource file name in the layout.
    pub file: String,
    /// Element tag of the category, e.g. `color`.
    pub category: String,
    /// Entries to ensure, in order.
    pub catalog: Vec<NamedResource>,
    /// Policy for names already present.
    pub mode: ResourceMode,
}

impl PatchStage for NamedResourcesStage {
    fn name(&self) -> &str {
        "named-resources"
    }

    fn apply(&self, artifacts: &mut ArtifactSet) -> AppResult<StageReport> {
        let tree = artifacts.resource_mut(&self.file, self.name())?;
        let mut list = ResourceList::read(&tree.root, &self.category);
        let mut report = StageReport::new(self.name());
        for entry in &self.catalog {
            let outcome = ensure_named_resource_with(&mut list, &entry.name, &entry.value, self.mode);
            report.record(format!("{} {}", self.category, entry.name), outcome);
        }
        if report.changed() {
            list.write(&mut tree.root, &self.category);
        }
        Ok(report)
    }
}

/// Ensures items on one style.
#[derive(Debug, Clone)]
pub struct StyleItemsStage {
    /// Logical resource file name in the layout.
    pub file: String,
    /// Style name, e.g. `AppTheme`.
    pub style: String,
    /// Items to ensure, in order.
    pub items: Vec<NamedResource>,
    /// Policy for names already present.
    pub mode: ResourceMode,
}

impl PatchStage for StyleItemsStage {
    fn name(&self) -> &str {
        "style-items"
    }

    fn apply(&self, artifacts: &mut ArtifactSet) -> AppResult<StageReport> {
        let tree = artifacts.resource_mut(&self.file, self.name())?;
        let mut report = StageReport::new(self.name());
        for item in &self.items {
            let outcome = ensure_style_item_with(tree, &self.style, &item.name, &item.value, self.mode);
            report.record(format!("{} {}", self.style, item.name), outcome);
        }
        Ok(report)
    }
}

/// A method to add before the class closing brace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInjection {
    /// Presence marker, usually the method signature.
    pub signature: String,
    /// Full method text.
    pub body: String,
}

/// A line to add after a call site.
#[derive(Debug, Clone, PartialEq)]
pub struct CallInjection {
    /// Call-site pattern.
    pub anchor: Pattern,
    /// Line inserted after each match.
    pub line: String,
}

/// Imports, one method and one call-site line for a source file.
///
/// Applied in that order: imports, method, call.
#[derive(Debug, Clone)]
pub struct SourceInjectionStage {
    /// Logical source file name in the layout.
    pub target: String,
    /// Import lines, each inserted after the last existing import.
    pub required_imports: Vec<String>,
    /// Optional method insertion.
    pub method: Option<MethodInjection>,
    /// Optional call-site insertion.
    pub call: Option<CallInjection>,
}

impl PatchStage for SourceInjectionStage {
    fn name(&self) -> &str {
        "source-injection"
    }

    fn apply(&self, artifacts: &mut ArtifactSet) -> AppResult<StageReport> {
        let doc = artifacts.source_mut(&self.target, self.name())?;
        let mut report = StageReport::new(self.name());
        for import in &self.required_imports {
            report.record(import.clone(), add_import(doc, import));
        }
        if let Some(method) = &self.method {
            report.record(
                method.signature.clone(),
                add_method_before_closing_brace(doc, &method.signature, &method.body),
            );
        }
        if let Some(call) = &self.call {
            report.record(call.line.clone(), add_call_after_pattern(doc, &call.anchor, &call.line));
        }
        Ok(report)
    }
}

/// Writes or removes a fingerprinted generated section.
#[derive(Debug, Clone)]
pub struct GeneratedSectionStage {
    /// Logical source file name in the layout.
    pub target: String,
    /// Section definition.
    pub section: GeneratedSection,
    /// Remove the section instead of writing it.
    pub remove: bool,
}

impl PatchStage for GeneratedSectionStage {
    fn name(&self) -> &str {
        "generated-section"
    }

    fn apply(&self, artifacts: &mut ArtifactSet) -> AppResult<StageReport> {
        let doc = artifacts.source_mut(&self.target, self.name())?;
        let outcome = if self.remove {
            remove_generated_section(doc, &self.section.tag)
        } else {
            merge_generated_section(doc, &self.section)
        };
        let mut report = StageReport::new(self.name());
        report.record(self.section.tag.clone(), outcome);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::PatchOutcome;
    use crate::source::{SourceDocument, SourceLanguage};
    use crate::xml::{XmlNode, XmlTree};

    fn artifacts() -> ArtifactSet {
        let mut set = ArtifactSet::default();
        let mut root = XmlNode::new("manifest");
        let mut app = XmlNode::new("application");
        app.push_child(XmlNode::new("activity").with_attr("android:name", ".MainActivity"));
        root.push_child(app);
        set.manifest = Some(XmlTree::new(root));
        set.resources
            .insert("colors".into(), XmlTree::new(XmlNode::new("resources")));
        set.sources.insert(
            "main".into(),
            SourceDocument::new(
                "import a.B;\nclass Main {\n  void onCreate() {\n    super.onCreate(null);\n  }\n}\n",
                SourceLanguage::Java,
            ),
        );
        set
    }

    #[test]
    fn test_activity_override_adds_namespace() {
        let mut set = artifacts();
        let mut overrides = IndexMap::new();
        overrides.insert("android:screenOrientation".to_string(), "unspecified".to_string());
        let stage = ActivityOverrideStage {
            activity_names: vec!["com.sdk.Proxy".into()],
            overrides,
        };
        let report = stage.apply(&mut set).unwrap();
        assert_eq!(report.outcomes.len(), 2);
        let manifest = set.manifest.as_ref().unwrap();
        assert!(manifest.root.attr(TOOLS_NAMESPACE_KEY).is_some());
        assert!(!stage.apply(&mut set).unwrap().changed());
    }

    #[test]
    fn test_named_resources_writes_tree() {
        let mut set = artifacts();
        let stage = NamedResourcesStage {
            file: "colors".into(),
            category: "color".into(),
            catalog: vec![NamedResource {
                name: "activityBackground".into(),
                value: "#000000".into(),
            }],
            mode: ResourceMode::KeepExisting,
        };
        assert!(stage.apply(&mut set).unwrap().changed());
        assert!(!stage.apply(&mut set).unwrap().changed());
        let root = &set.resources["colors"].root;
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].text.as_deref(), Some("#000000"));
    }

    #[test]
    fn test_source_injection_reports_each_edit() {
        let mut set = artifacts();
        let stage = SourceInjectionStage {
            target: "main".into(),
            required_imports: vec!["import c.D;".into()],
            method: Some(MethodInjection {
                signature: "void extra(".into(),
                body: "  void extra() {}\n".into(),
            }),
            call: Some(CallInjection {
                anchor: Pattern::literal("super.onCreate(null);"),
                line: "extra();".into(),
            }),
        };
        let report = stage.apply(&mut set).unwrap();
        let outcomes: Vec<_> = report.outcomes.iter().map(|o| o.outcome.clone()).collect();
        assert_eq!(outcomes, vec![PatchOutcome::applied(); 3]);
    }

    #[test]
    fn test_missing_source_is_error() {
        let mut set = artifacts();
        let stage = GeneratedSectionStage {
            target: "other".into(),
            section: GeneratedSection {
                tag: "t".into(),
                contents: "x".into(),
                anchor: Pattern::literal("class"),
                offset: 1,
                comment: "//".into(),
            },
            remove: false,
        };
        assert!(stage.apply(&mut set).is_err());
    }
}
