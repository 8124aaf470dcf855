use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A style rule captured with a snapshot: either inline CSS text or a
/// reference to an external stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleRule {
    Inline(String),
    Link { href: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Element box in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A serialized capture of the AUT document taken while a command ran.
///
/// Records are immutable once captured and only the surface controller
/// reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub name: String,
    /// Serialized body fragment
    pub body: String,
    #[serde(default)]
    pub styles: Vec<StyleRule>,
    #[serde(default)]
    pub html_attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub body_attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_dimensions: Option<Rect>,
}

impl SnapshotRecord {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            styles: Vec::new(),
            html_attrs: BTreeMap::new(),
            body_attrs: BTreeMap::new(),
            element_selector: None,
            element_dimensions: None,
        }
    }

    pub fn with_element(mut self, selector: impl Into<String>, dimensions: Option<Rect>) -> Self {
        self.element_selector = Some(selector.into());
        self.element_dimensions = dimensions;
        self
    }

    pub fn with_style(mut self, rule: StyleRule) -> Self {
        self.styles.push(rule);
        self
    }

    /// Whether the snapshot points at an element that can be highlighted.
    pub fn has_element(&self) -> bool {
        self.element_selector.is_some() || self.element_dimensions.is_some()
    }
}
