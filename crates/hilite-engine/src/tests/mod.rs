//! Shared fixtures for unit tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::{MarkerId, Tag, TagRegistry, tree::{MarkerFragment, Node}};

/// A tag with a plain yellow background.
pub fn tag(id: &str) -> Tag {
    Tag::new(id, "yellow")
}

/// Tags `person`, `place` and `test`.
pub fn registry() -> TagRegistry {
    TagRegistry::new(vec![tag("person"), tag("place"), tag("test")])
}

/// An empty fragment of tag `test`.
pub fn marker(id: &str, is_start: bool, is_end: bool) -> MarkerFragment {
    MarkerFragment {
        marker_id: MarkerId::new(id),
        tag_id: "test".to_string(),
        is_start,
        is_end,
        style: tag("test").marker_style(),
        children: Vec::new(),
    }
}

/// A fragment of tag `test` wrapping a single text run.
pub fn fragment(id: &str, text: &str, is_start: bool, is_end: bool) -> Node {
    Node::Marker(MarkerFragment {
        children: vec![Node::text(text)],
        ..marker(id, is_start, is_end)
    })
}

pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}
