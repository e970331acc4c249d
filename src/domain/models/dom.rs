//! DOM boundary types: nodes, mutation records, click events and the
//! selectors that identify the two controls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::config::ControlConfig;
use super::toggle::ControlKind;

/// A node as seen by the mutation feed or the click boundary.
///
/// Non-element nodes (text, comments) carry no tag and never match a selector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomNode {
    pub tag: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl DomNode {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            attributes: BTreeMap::new(),
        }
    }

    pub fn text() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Tag comparison is case-insensitive, matching HTML `nodeName` semantics.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// One low-level DOM mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationRecord {
    Attributes {
        target: DomNode,
        attribute: String,
    },
    ChildList {
        #[serde(default)]
        added: Vec<DomNode>,
        #[serde(default)]
        removed: Vec<DomNode>,
    },
}

/// A batch of mutation records delivered together by the feed.
pub type MutationBatch = Vec<MutationRecord>;

/// A click as seen by a capturing listener on the document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// The click target followed by its ancestors, innermost first.
    pub path: Vec<DomNode>,
    /// False for clicks synthesised by script, including our own corrections.
    pub trusted: bool,
}

/// Events the host page delivers, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Click(ClickEvent),
    Mutations(MutationBatch),
}

/// Attribute-equality selectors for the enable and disable controls,
/// i.e. `button[aria-label="Enable search"]` and its disable twin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSelectors {
    pub element: String,
    pub label_attribute: String,
    pub enable_label: String,
    pub disable_label: String,
}

impl ControlSelectors {
    pub fn from_config(config: &ControlConfig) -> Self {
        Self {
            element: config.element.clone(),
            label_attribute: config.label_attribute.clone(),
            enable_label: config.enable_label.clone(),
            disable_label: config.disable_label.clone(),
        }
    }

    pub fn label_for(&self, control: ControlKind) -> &str {
        match control {
            ControlKind::Enable => &self.enable_label,
            ControlKind::Disable => &self.disable_label,
        }
    }

    /// Which control, if any, this node is.
    pub fn classify(&self, node: &DomNode) -> Option<ControlKind> {
        if !node.has_tag(&self.element) {
            return None;
        }
        match node.attribute(&self.label_attribute) {
            Some(label) if label == self.enable_label => Some(ControlKind::Enable),
            Some(label) if label == self.disable_label => Some(ControlKind::Disable),
            _ => None,
        }
    }

    pub fn matches_any(&self, node: &DomNode) -> bool {
        self.classify(node).is_some()
    }

    /// Build a node that matches the selector for `control`.
    pub fn node_for(&self, control: ControlKind) -> DomNode {
        DomNode::element(self.element.clone())
            .with_attribute(self.label_attribute.clone(), self.label_for(control))
    }

    /// Closest node on a click path that matches either control.
    pub fn closest(&self, path: &[DomNode]) -> Option<ControlKind> {
        path.iter().find_map(|node| self.classify(node))
    }
}

impl Default for ControlSelectors {
    fn default() -> Self {
        Self::from_config(&ControlConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_matches_label() {
        let selectors = ControlSelectors::default();
        let enable = DomNode::element("button").with_attribute("aria-label", "Enable search");
        let disable = DomNode::element("BUTTON").with_attribute("aria-label", "Disable search");

        assert_eq!(selectors.classify(&enable), Some(ControlKind::Enable));
        assert_eq!(selectors.classify(&disable), Some(ControlKind::Disable));
    }

    #[test]
    fn test_classify_rejects_other_nodes() {
        let selectors = ControlSelectors::default();
        let wrong_tag = DomNode::element("div").with_attribute("aria-label", "Enable search");
        let wrong_label = DomNode::element("button").with_attribute("aria-label", "Send");
        let unlabeled = DomNode::element("button");

        assert_eq!(selectors.classify(&wrong_tag), None);
        assert_eq!(selectors.classify(&wrong_label), None);
        assert_eq!(selectors.classify(&unlabeled), None);
        assert_eq!(selectors.classify(&DomNode::text()), None);
    }

    #[test]
    fn test_closest_walks_up_the_path() {
        let selectors = ControlSelectors::default();
        let path = vec![
            DomNode::element("svg"),
            DomNode::element("span"),
            selectors.node_for(ControlKind::Disable),
            DomNode::element("body"),
        ];

        assert_eq!(selectors.closest(&path), Some(ControlKind::Disable));
        assert_eq!(selectors.closest(&[DomNode::element("body")]), None);
    }
}
