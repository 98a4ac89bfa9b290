//! # Manifest Patching
//!
//! Attribute-level edits on the manifest tree and on style resources.
//!
//! Missing structural nodes are never fatal: the host project may lack the
//! element in some configurations, so the call logs a warning and reports
//! [`PatchOutcome::NodeMissing`] with the tree untouched.

use crate::ordered_set::OrderedSet;
use crate::outcome::PatchOutcome;
use crate::resources::{ensure_named_resource_with, ResourceMode, StyleNode};
use crate::xml::{XmlNode, XmlTree};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Namespace declaration key for manifest-merger directives.
pub const TOOLS_NAMESPACE_KEY: &str = "xmlns:tools";
/// Namespace URI for manifest-merger directives.
pub const TOOLS_NAMESPACE_URI: &str = "http://schemas.android.com/tools";
/// Attribute identifying components.
pub const ANDROID_NAME: &str = "android:name";
/// Merger directive listing attributes to override.
pub const TOOLS_REPLACE: &str = "tools:replace";
/// Activity configuration-change flags.
pub const CONFIG_CHANGES: &str = "android:configChanges";
/// Activity orientation lock.
pub const SCREEN_ORIENTATION: &str = "android:screenOrientation";
/// Multi-window / large screen support.
pub const RESIZEABLE_ACTIVITY: &str = "android:resizeableActivity";

const APPLICATION: &str = "application";
const ACTIVITY: &str = "activity";
const STYLE: &str = "style";
const ITEM: &str = "item";
const NAME: &str = "name";

/// Configuration changes an activity must handle itself to survive resizing,
/// folding and multi-window transitions without a restart.
pub const RESIZE_CONFIG_CHANGES: &[&str] = &[
    "orientation",
    "screenSize",
    "smallestScreenSize",
    "screenLayout",
    "density",
    "keyboard",
    "keyboardHidden",
    "navigation",
    "uiMode",
];

/// Adds `xmlns:tools` to the root element if absent.
pub fn ensure_tools_namespace(tree: &mut XmlTree) -> PatchOutcome {
    if tree.root.attributes.contains_key(TOOLS_NAMESPACE_KEY) {
        return PatchOutcome::AlreadyPresent;
    }
    tree.root.set_attr(TOOLS_NAMESPACE_KEY, TOOLS_NAMESPACE_URI);
    debug!("added {} to <{}>", TOOLS_NAMESPACE_KEY, tree.root.tag);
    PatchOutcome::applied()
}

/// Appends an overriding `<activity>` entry for a library activity.
///
/// Detection is by `android:name` only: an existing entry is never updated,
/// even if `overrides` differs from what it carries. The new element holds
/// `android:name`, the overrides in the supplied order, and `tools:replace`
/// listing the override keys comma-joined in that same order.
///
/// `android:name` and `tools:replace` are never taken from `overrides`:
/// the first identifies the entry on later runs, the second is derived.
pub fn override_activity(
    tree: &mut XmlTree,
    activity_name: &str,
    overrides: &IndexMap<String, String>,
) -> PatchOutcome {
    let Some(application) = application_mut(tree) else {
        return node_missing(APPLICATION.to_string());
    };

    if application
        .find_child(ACTIVITY, ANDROID_NAME, activity_name)
        .is_some()
    {
        return PatchOutcome::AlreadyPresent;
    }

    let mut activity = XmlNode::new(ACTIVITY).with_attr(ANDROID_NAME, activity_name);
    let mut replaced: Vec<&str> = Vec::new();
    for (key, value) in overrides {
        if key == ANDROID_NAME || key == TOOLS_REPLACE {
            warn!("ignoring reserved override '{}' for {}", key, activity_name);
            continue;
        }
        activity.set_attr(key.clone(), value.clone());
        replaced.push(key);
    }
    activity.set_attr(TOOLS_REPLACE, replaced.join(","));

    application.push_child(activity);
    debug!("added activity override for {}", activity_name);
    PatchOutcome::applied()
}

/// Merges `flags` into the activity's `android:configChanges`.
///
/// Existing flags keep their order; missing ones are appended in the order
/// given. The activity's orientation lock is dropped and it is marked
/// resizeable.
pub fn merge_config_changes<S: AsRef<str>>(
    tree: &mut XmlTree,
    activity_name: &str,
    flags: &[S],
) -> PatchOutcome {
    let Some(application) = application_mut(tree) else {
        return node_missing(APPLICATION.to_string());
    };
    let Some(activity) = application.find_child_mut(ACTIVITY, ANDROID_NAME, activity_name) else {
        return node_missing(format!("{} {}", ACTIVITY, activity_name));
    };

    let current = activity.attr(CONFIG_CHANGES).unwrap_or_default().to_string();
    let mut merged = OrderedSet::parse(&current, '|');
    merged.union_in_order(flags.iter().map(|f| f.as_ref()));
    let merged = merged.join("|");

    let mut changed = false;
    if merged != current && !merged.is_empty() {
        activity.set_attr(CONFIG_CHANGES, merged);
        changed = true;
    }
    if activity.remove_attr(SCREEN_ORIENTATION).is_some() {
        changed = true;
    }
    if activity.attr(RESIZEABLE_ACTIVITY) != Some("true") {
        activity.set_attr(RESIZEABLE_ACTIVITY, "true");
        changed = true;
    }

    if changed {
        debug!("merged configChanges on {}", activity_name);
        PatchOutcome::applied()
    } else {
        PatchOutcome::AlreadyPresent
    }
}

/// Adds `<item name="item_name">item_value</item>` to the named style.
///
/// An existing item is never overwritten.
pub fn ensure_style_item(
    tree: &mut XmlTree,
    style_name: &str,
    item_name: &str,
    item_value: &str,
) -> PatchOutcome {
    ensure_style_item_with(tree, style_name, item_name, item_value, ResourceMode::KeepExisting)
}

/// [`ensure_style_item`] with an explicit [`ResourceMode`].
pub fn ensure_style_item_with(
    tree: &mut XmlTree,
    style_name: &str,
    item_name: &str,
    item_value: &str,
    mode: ResourceMode,
) -> PatchOutcome {
    let Some(node) = tree.root.find_child_mut(STYLE, NAME, style_name) else {
        return node_missing(format!("{} {}", STYLE, style_name));
    };

    let mut style = StyleNode::read(node, ITEM);
    let outcome = ensure_named_resource_with(&mut style.items, item_name, item_value, mode);
    if outcome.changed() {
        style.items.write(node, ITEM);
        debug!("style {}: {} = {} ({})", style_name, item_name, item_value, outcome);
    }
    outcome
}

fn application_mut(tree: &mut XmlTree) -> Option<&mut XmlNode> {
    tree.root.child_mut(APPLICATION)
}

fn node_missing(node: String) -> PatchOutcome {
    warn!("<{}> not found, skipping", node);
    PatchOutcome::NodeMissing(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overrides() -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        map.insert(SCREEN_ORIENTATION.to_string(), "unspecified".to_string());
        map.insert(RESIZEABLE_ACTIVITY.to_string(), "true".to_string());
        map
    }

    fn manifest_with_activity(config_changes: Option<&str>) -> XmlTree {
        let mut activity = XmlNode::new(ACTIVITY)
            .with_attr(ANDROID_NAME, ".MainActivity")
            .with_attr(SCREEN_ORIENTATION, "portrait");
        if let Some(value) = config_changes {
            activity.set_attr(CONFIG_CHANGES, value);
        }
        let mut application = XmlNode::new(APPLICATION);
        application.push_child(activity);
        let mut root = XmlNode::new("manifest");
        root.push_child(application);
        XmlTree::new(root)
    }

    #[test]
    fn test_tools_namespace_bootstrap() {
        let mut tree = XmlTree::new(XmlNode::new("manifest"));
        assert_eq!(ensure_tools_namespace(&mut tree), PatchOutcome::applied());
        assert_eq!(tree.root.attr(TOOLS_NAMESPACE_KEY), Some(TOOLS_NAMESPACE_URI));
        assert_eq!(ensure_tools_namespace(&mut tree), PatchOutcome::AlreadyPresent);
        assert_eq!(tree.root.attributes.len(), 1);
    }

    #[test]
    fn test_override_into_childless_application() {
        let mut tree = XmlTree::from_json(&json!({ "manifest": { "application": [ {} ] } }), "m").unwrap();
        let name = "com.vendor.sdk.ProxyActivity";

        let outcome = override_activity(&mut tree, name, &overrides());
        assert_eq!(outcome, PatchOutcome::applied());

        let application = &tree.root.children[0];
        let activities: Vec<_> = application.children_named(ACTIVITY).collect();
        assert_eq!(activities.len(), 1);
        let activity = activities[0];
        assert_eq!(activity.attr(ANDROID_NAME), Some(name));
        assert_eq!(activity.attr(SCREEN_ORIENTATION), Some("unspecified"));
        assert_eq!(activity.attr(RESIZEABLE_ACTIVITY), Some("true"));
        assert_eq!(
            activity.attr(TOOLS_REPLACE),
            Some("android:screenOrientation,android:resizeableActivity")
        );
    }

    #[test]
    fn test_override_is_name_idempotent() {
        let mut tree = manifest_with_activity(None);
        let name = "com.vendor.sdk.ProxyActivity";
        override_activity(&mut tree, name, &overrides());

        let mut other = IndexMap::new();
        other.insert(SCREEN_ORIENTATION.to_string(), "landscape".to_string());
        assert_eq!(
            override_activity(&mut tree, name, &other),
            PatchOutcome::AlreadyPresent
        );

        let application = &tree.root.children[0];
        let matching: Vec<_> = application
            .children_named(ACTIVITY)
            .filter(|a| a.attr(ANDROID_NAME) == Some(name))
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].attr(SCREEN_ORIENTATION), Some("unspecified"));
    }

    #[test]
    fn test_reserved_override_keys_keep_name_identity() {
        let mut tree = XmlTree::from_json(&json!({ "manifest": { "application": [ {} ] } }), "m").unwrap();
        let mut reserved = overrides();
        reserved.insert(ANDROID_NAME.to_string(), ".Other".to_string());
        reserved.insert(TOOLS_REPLACE.to_string(), "android:theme".to_string());

        assert_eq!(override_activity(&mut tree, ".X", &reserved), PatchOutcome::applied());
        let once = tree.clone();
        assert_eq!(override_activity(&mut tree, ".X", &reserved), PatchOutcome::AlreadyPresent);
        assert_eq!(tree, once);

        let activities: Vec<_> = tree.root.children[0].children_named(ACTIVITY).collect();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].attr(ANDROID_NAME), Some(".X"));
        assert_eq!(
            activities[0].attr(TOOLS_REPLACE),
            Some("android:screenOrientation,android:resizeableActivity")
        );
    }

    #[test]
    fn test_override_without_application_is_noop() {
        let mut tree = XmlTree::new(XmlNode::new("manifest"));
        let before = tree.clone();
        assert_eq!(
            override_activity(&mut tree, ".X", &overrides()),
            PatchOutcome::NodeMissing("application".into())
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn test_merge_config_changes_union_order() {
        let mut tree = manifest_with_activity(Some("orientation|screenSize"));
        let outcome = merge_config_changes(
            &mut tree,
            ".MainActivity",
            &["screenSize", "density", "keyboard"],
        );
        assert_eq!(outcome, PatchOutcome::applied());

        let activity = &tree.root.children[0].children[0];
        assert_eq!(
            activity.attr(CONFIG_CHANGES),
            Some("orientation|screenSize|density|keyboard")
        );
        assert_eq!(activity.attr(SCREEN_ORIENTATION), None);
        assert_eq!(activity.attr(RESIZEABLE_ACTIVITY), Some("true"));

        let again = merge_config_changes(
            &mut tree,
            ".MainActivity",
            &["screenSize", "density", "keyboard"],
        );
        assert_eq!(again, PatchOutcome::AlreadyPresent);
    }

    #[test]
    fn test_merge_config_changes_cleans_existing_value() {
        let mut tree = manifest_with_activity(Some("keyboard||keyboard|"));
        merge_config_changes(&mut tree, ".MainActivity", &["uiMode"]);
        let activity = &tree.root.children[0].children[0];
        assert_eq!(activity.attr(CONFIG_CHANGES), Some("keyboard|uiMode"));
    }

    #[test]
    fn test_merge_config_changes_missing_activity() {
        let mut tree = manifest_with_activity(None);
        let outcome = merge_config_changes(&mut tree, ".Other", RESIZE_CONFIG_CHANGES);
        assert!(outcome.is_miss());
    }

    #[test]
    fn test_style_item_presence_only() {
        let mut tree = XmlTree::from_json(
            &json!({ "resources": { "style": [
                { "$": { "name": "AppTheme", "parent": "Theme.AppCompat" },
                  "item": [ { "$": { "name": "android:windowBackground" }, "_": "@color/bg" } ] }
            ] } }),
            "styles",
        )
        .unwrap();

        assert_eq!(
            ensure_style_item(&mut tree, "AppTheme", "android:windowBackground", "@color/other"),
            PatchOutcome::AlreadyPresent
        );
        assert_eq!(
            ensure_style_item(&mut tree, "AppTheme", "android:windowIsTranslucent", "true"),
            PatchOutcome::applied()
        );
        assert_eq!(
            ensure_style_item(&mut tree, "Missing", "x", "y"),
            PatchOutcome::NodeMissing("style Missing".into())
        );

        let style = &tree.root.children[0];
        let items: Vec<_> = style
            .children_named("item")
            .map(|i| (i.attr("name").unwrap(), i.text.as_deref().unwrap()))
            .collect();
        assert_eq!(
            items,
            vec![
                ("android:windowBackground", "@color/bg"),
                ("android:windowIsTranslucent", "true")
            ]
        );
        assert_eq!(style.attr("parent"), Some("Theme.AppCompat"));
    }
}
