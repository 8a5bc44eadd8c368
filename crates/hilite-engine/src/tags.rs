use std::collections::{BTreeMap, HashSet};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::AnnotateError;

/// A reusable annotation category with its visual attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    /// Display name; older palettes looked tags up by this instead of the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub color: String,
    #[serde(default, alias = "selected_color", skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
    #[serde(default, alias = "hover_color", skip_serializing_if = "Option::is_none")]
    pub hover_color: Option<String>,
    /// Extra inline style declarations applied to every fragment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
}

impl Tag {
    pub fn new(id: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            color: color.into(),
            selected_color: None,
            hover_color: None,
            style: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_selected_color(mut self, color: impl Into<String>) -> Self {
        self.selected_color = Some(color.into());
        self
    }

    pub fn with_hover_color(mut self, color: impl Into<String>) -> Self {
        self.hover_color = Some(color.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    /// The style stamped onto wrapper fragments carrying this tag.
    pub fn marker_style(&self) -> MarkerStyle {
        MarkerStyle {
            background: self.color.clone(),
            extra: self.style.clone(),
        }
    }
}

/// Visual attributes carried by a wrapper fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkerStyle {
    pub background: String,
    pub extra: BTreeMap<String, String>,
}

impl MarkerStyle {
    /// Inline CSS declaration list.
    pub fn to_css(&self) -> String {
        let mut css = format!("background-color: {}", self.background);
        for (property, value) in &self.extra {
            css.push_str(&format!("; {property}: {value}"));
        }
        css
    }
}

/// The tag palette, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: Vec<Tag>,
}

impl TagRegistry {
    /// Builds a registry, warning about definitions that break its contract.
    /// Duplicates are kept but only the first is reachable by id.
    pub fn new(tags: Vec<Tag>) -> Self {
        if tags.is_empty() {
            warn!("tag registry initialized with no tags");
        }
        let mut seen = HashSet::new();
        for tag in &tags {
            if tag.id.trim().is_empty() {
                warn!("tag definition missing required id: {tag:?}");
            }
            if tag.color.trim().is_empty() {
                warn!("tag {:?} has no color", tag.id);
            }
            if !seen.insert(tag.id.as_str()) {
                warn!("duplicate tag id {:?}; tag ids must be unique", tag.id);
            }
        }
        Self { tags }
    }

    pub fn get(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == id)
    }

    /// Lookup for callers that treat an unknown id as an error.
    pub fn require(&self, id: &str) -> Result<&Tag, AnnotateError> {
        self.get(id)
            .ok_or_else(|| AnnotateError::TagNotFound(id.to_string()))
    }

    /// Legacy lookup by display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|tag| tag.name.as_deref() == Some(name))
    }

    pub fn all(&self) -> &[Tag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for TagRegistry {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
