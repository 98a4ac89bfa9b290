//! # Pipeline Configuration
//!
//! A pipeline is described by a YAML or JSON file: the project layout and
//! the ordered stage list. Every stage takes static option data.
//!
//! ```yaml
//! project:
//!   root: android
//!   manifest: app/src/main/AndroidManifest.json
//!   resources:
//!     colors: app/src/main/res/values/colors.json
//!   sources:
//!     main-activity: app/src/main/java/com/app/MainActivity.java
//! stages:
//!   - kind: tools-namespace
//!   - kind: config-changes
//!     activity_name: .MainActivity
//! ```

use crate::artifacts::ProjectLayout;
use crate::error::{AppError, AppResult};
use crate::manifest::RESIZE_CONFIG_CHANGES;
use crate::pipeline::{PatchPipeline, PatchStage};
use crate::resources::{NamedResource, ResourceMode};
use crate::source::{GeneratedSection, Pattern};
use crate::stages::{
    ActivityOverrideStage, CallInjection, ConfigChangesStage, GeneratedSectionStage,
    MethodInjection, NamedResourcesStage, SourceInjectionStage, StyleItemsStage,
    ToolsNamespaceStage,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Artifact locations.
    pub project: ProjectLayout,
    /// Stages in execution order.
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

impl PipelineConfig {
    /// Reads a configuration file, picking the format by extension
    /// (`.json` is JSON, anything else YAML).
    ///
    /// A relative project root is resolved against the file's directory.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::General(format!("Failed to read config {:?}: {}", path, e)))?;

        let mut config = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text)?
        } else {
            Self::from_yaml(&text)?
        };

        if config.project.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.project.root = dir.join(&config.project.root);
            }
        }
        Ok(config)
    }

    /// Parses YAML configuration.
    pub fn from_yaml(text: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parses JSON configuration.
    pub fn from_json(text: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds the configured pipeline.
    pub fn pipeline(&self) -> AppResult<PatchPipeline> {
        let stages = self
            .stages
            .iter()
            .map(StageConfig::build)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PatchPipeline::new(stages))
    }
}

/// Options of one stage, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StageConfig {
    /// See [`ToolsNamespaceStage`].
    ToolsNamespace,
    /// See [`ActivityOverrideStage`].
    ActivityOverride {
        /// Activities to override.
        activity_names: Vec<String>,
        /// Attribute overrides, in order.
        overrides: IndexMap<String, String>,
    },
    /// See [`ConfigChangesStage`].
    ConfigChanges {
        /// Activity `android:name`.
        activity_name: String,
        /// Flags to merge; the resize catalog when omitted.
        #[serde(default)]
        flags: Option<Vec<String>>,
    },
    /// See [`NamedResourcesStage`].
    NamedResources {
        /// Logical resource file name.
        file: String,
        /// Element tag; `color` when omitted.
        #[serde(default = "default_category")]
        category: String,
        /// Entries to ensure.
        catalog: Vec<NamedResource>,
        /// Policy for existing names.
        #[serde(default)]
        mode: ResourceMode,
    },
    /// See [`StyleItemsStage`].
    StyleItems {
        /// Logical resource file name.
        file: String,
        /// Style name.
        style: String,
        /// Items to ensure.
        items: Vec<NamedResource>,
        /// Policy for existing names.
        #[serde(default)]
        mode: ResourceMode,
    },
    /// See [`SourceInjectionStage`].
    SourceInjection {
        /// Logical source file name.
        target: String,
        /// Import lines.
        #[serde(default)]
        required_imports: Vec<String>,
        /// Presence marker for the method.
        #[serde(default)]
        method_signature: Option<String>,
        /// Method text.
        #[serde(default)]
        method_body: Option<String>,
        /// Call-site anchor.
        #[serde(default)]
        call_anchor: Option<String>,
        /// Treat `call_anchor` as a regular expression.
        #[serde(default)]
        call_anchor_is_regex: bool,
        /// Line to insert after the call site.
        #[serde(default)]
        call_line: Option<String>,
    },
    /// See [`GeneratedSectionStage`].
    GeneratedSection {
        /// Logical source file name.
        target: String,
        /// Section tag.
        tag: String,
        /// Section contents.
        #[serde(default)]
        contents: String,
        /// Anchor line pattern (regular expression).
        anchor: String,
        /// Line offset from the anchor line.
        #[serde(default = "default_offset")]
        offset: isize,
        /// Line-comment prefix.
        #[serde(default = "default_comment")]
        comment: String,
        /// Remove instead of write.
        #[serde(default)]
        remove: bool,
    },
}

fn default_category() -> String {
    "color".to_string()
}

fn default_offset() -> isize {
    1
}

fn default_comment() -> String {
    "//".to_string()
}

impl StageConfig {
    /// Builds the stage, compiling any patterns.
    pub fn build(&self) -> AppResult<Box<dyn PatchStage>> {
        let stage: Box<dyn PatchStage> = match self {
            StageConfig::ToolsNamespace => Box::new(ToolsNamespaceStage),
            StageConfig::ActivityOverride {
                activity_names,
                overrides,
            } => Box::new(ActivityOverrideStage {
                activity_names: activity_names.clone(),
                overrides: overrides.clone(),
            }),
            StageConfig::ConfigChanges {
                activity_name,
                flags,
            } => Box::new(ConfigChangesStage {
                activity_name: activity_name.clone(),
                flags: flags.clone().unwrap_or_else(|| {
                    RESIZE_CONFIG_CHANGES.iter().map(|f| f.to_string()).collect()
                }),
            }),
            StageConfig::NamedResources {
                file,
                category,
                catalog,
                mode,
            } => Box::new(NamedResourcesStage {
                file: file.clone(),
                category: category.clone(),
                catalog: catalog.clone(),
                mode: *mode,
            }),
            StageConfig::StyleItems {
                file,
                style,
                items,
                mode,
            } => Box::new(StyleItemsStage {
                file: file.clone(),
                style: style.clone(),
                items: items.clone(),
                mode: *mode,
            }),
            StageConfig::SourceInjection {
                target,
                required_imports,
                method_signature,
                method_body,
                call_anchor,
                call_anchor_is_regex,
                call_line,
            } => {
                let method = match (method_signature, method_body) {
                    (Some(signature), Some(body)) => Some(MethodInjection {
                        signature: signature.clone(),
                        body: body.clone(),
                    }),
                    (None, None) => None,
                    _ => {
                        return Err(AppError::General(format!(
                            "source-injection for '{}' needs both method_signature and method_body",
                            target
                        )))
                    }
                };
                let call = match (call_anchor, call_line) {
                    (Some(anchor), Some(line)) => Some(CallInjection {
                        anchor: if *call_anchor_is_regex {
                            Pattern::regex(anchor)?
                        } else {
                            Pattern::literal(anchor.clone())
                        },
                        line: line.clone(),
                    }),
                    (None, None) => None,
                    _ => {
                        return Err(AppError::General(format!(
                            "source-injection for '{}' needs both call_anchor and call_line",
                            target
                        )))
                    }
                };
                Box::new(SourceInjectionStage {
                    target: target.clone(),
                    required_imports: required_imports.clone(),
                    method,
                    call,
                })
            }
            StageConfig::GeneratedSection {
                target,
                tag,
                contents,
                anchor,
                offset,
                comment,
                remove,
            } => Box::new(GeneratedSectionStage {
                target: target.clone(),
                section: GeneratedSection {
                    tag: tag.clone(),
                    contents: contents.clone(),
                    anchor: Pattern::regex(anchor)?,
                    offset: *offset,
                    comment: comment.clone(),
                },
                remove: *remove,
            }),
        };
        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r##"
project:
  root: android
  manifest: app/src/main/AndroidManifest.json
  resources:
    colors: app/src/main/res/values/colors.json
  sources:
    main-activity: app/src/main/java/com/app/MainActivity.java
stages:
  - kind: tools-namespace
  - kind: activity-override
    activity_names: [com.vendor.ProxyActivity]
    overrides:
      android:screenOrientation: unspecified
      android:resizeableActivity: "true"
  - kind: config-changes
    activity_name: .MainActivity
  - kind: named-resources
    file: colors
    catalog:
      - { name: activityBackground, value: "#000000" }
  - kind: source-injection
    target: main-activity
    required_imports: ["import android.content.res.Configuration;"]
    call_anchor: 'super\.onCreate\(.*\);'
    call_anchor_is_regex: true
    call_line: "Setup.init(this);"
"##;

    #[test]
    fn test_parse_yaml_and_build() {
        let config = PipelineConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.project.sources.len(), 1);
        assert_eq!(config.stages.len(), 5);

        match &config.stages[1] {
            StageConfig::ActivityOverride { overrides, .. } => {
                let keys: Vec<_> = overrides.keys().cloned().collect();
                assert_eq!(
                    keys,
                    vec!["android:screenOrientation", "android:resizeableActivity"]
                );
            }
            other => panic!("unexpected stage {:?}", other),
        }

        let pipeline = config.pipeline().unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "tools-namespace",
                "activity-override",
                "config-changes",
                "named-resources",
                "source-injection"
            ]
        );
    }

    #[test]
    fn test_half_configured_method_is_rejected() {
        let stage = StageConfig::SourceInjection {
            target: "main".into(),
            required_imports: vec![],
            method_signature: Some("void a(".into()),
            method_body: None,
            call_anchor: None,
            call_anchor_is_regex: false,
            call_line: None,
        };
        assert!(stage.build().is_err());
    }

    #[test]
    fn test_bad_regex_is_rejected() {
        let stage = StageConfig::GeneratedSection {
            target: "main".into(),
            tag: "t".into(),
            contents: String::new(),
            anchor: "(".into(),
            offset: 1,
            comment: "//".into(),
            remove: false,
        };
        assert!(matches!(stage.build(), Err(AppError::Pattern(_))));
    }

    #[test]
    fn test_unknown_stage_kind() {
        let text = "project: {}\nstages:\n  - kind: teleport\n";
        assert!(matches!(
            PipelineConfig::from_yaml(text),
            Err(AppError::Yaml(_))
        ));
    }

    #[test]
    fn test_json_config() {
        let text = r#"{ "project": { "root": "." }, "stages": [ { "kind": "tools-namespace" } ] }"#;
        let config = PipelineConfig::from_json(text).unwrap();
        assert_eq!(config.stages, vec![StageConfig::ToolsNamespace]);
    }
}
