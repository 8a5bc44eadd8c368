//! # Content Tree
//!
//! The mutable tree that annotations are materialized into.
//!
//! ## Model
//!
//! - **`Node::Text`**: a leaf text run, the unit absolute offsets are computed from
//! - **`Node::Element`**: structural markup (paragraphs, emphasis, list items)
//! - **`Node::Marker`**: a wrapper fragment realizing part of one annotation
//!
//! The flattened document text is the concatenation of every text run in
//! document order; structural nodes contribute nothing.
//!
//! ## Addressing
//!
//! Nodes are addressed by [`NodePath`]: child indices from the root. Paths
//! are positional and go stale when an earlier sibling is split or
//! unwrapped, so mutations apply batches of paths in reverse document order.

mod html;
pub mod walker;

use std::ops::Range;

pub use walker::{TextRun, Walk, WalkEvent, text_runs};

use crate::{MarkerId, MarkerStyle};

/// Child indices from the root to a node. The empty path is the root itself.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Element(Element),
    Marker(MarkerFragment),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn element(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Element(Element::new(name, children))
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Text(_) => &[],
            Node::Element(element) => &element.children,
            Node::Marker(fragment) => &fragment.children,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Text(_) => None,
            Node::Element(element) => Some(&mut element.children),
            Node::Marker(fragment) => Some(&mut fragment.children),
        }
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for event in Walk::new(std::slice::from_ref(self)) {
            if let WalkEvent::Text(text) = event {
                out.push_str(text);
            }
        }
        out
    }

    pub fn as_marker(&self) -> Option<&MarkerFragment> {
        match self {
            Node::Marker(fragment) => Some(fragment),
            _ => None,
        }
    }
}

/// A structural node with no annotation semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// One physical piece of an annotation.
///
/// `is_start` is set on the first fragment of a marker in document order and
/// `is_end` on the last; together they delimit the annotation's window.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerFragment {
    pub marker_id: MarkerId,
    pub tag_id: String,
    pub is_start: bool,
    pub is_end: bool,
    pub style: MarkerStyle,
    pub children: Vec<Node>,
}

impl MarkerFragment {
    /// True when every child is a plain text run.
    pub fn is_plain(&self) -> bool {
        self.children
            .iter()
            .all(|child| matches!(child, Node::Text(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentTree {
    root: Vec<Node>,
}

impl ContentTree {
    pub fn new(root: Vec<Node>) -> Self {
        Self { root }
    }

    /// A tree holding a single text run.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Node::text(text)])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.root
    }

    pub fn walk(&self) -> Walk<'_> {
        Walk::new(&self.root)
    }

    /// The flattened document text.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for event in self.walk() {
            if let WalkEvent::Text(text) = event {
                out.push_str(text);
            }
        }
        out
    }

    /// Document length in chars.
    pub fn len_chars(&self) -> usize {
        self.walk()
            .map(|event| match event {
                WalkEvent::Text(text) => crate::text::char_len(text),
                _ => 0,
            })
            .sum()
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(*first)?;
        for idx in rest {
            node = node.children().get(*idx)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get_mut(*first)?;
        for idx in rest {
            node = node.children_mut()?.get_mut(*idx)?;
        }
        Some(node)
    }

    fn children_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.root);
        }
        self.node_mut(path)?.children_mut()
    }

    /// Removes the node at `path` and splices whatever `f` returns into its
    /// place. Returns false when the path does not resolve.
    pub fn splice_with<F>(&mut self, path: &[usize], f: F) -> bool
    where
        F: FnOnce(Node) -> Vec<Node>,
    {
        let Some((idx, parent)) = path.split_last() else {
            return false;
        };
        let Some(siblings) = self.children_at_mut(parent) else {
            return false;
        };
        if *idx >= siblings.len() {
            return false;
        }
        let node = siblings.remove(*idx);
        let replacement = f(node);
        siblings.splice(*idx..*idx, replacement);
        true
    }

    /// Paths of every fragment of `marker_id`, in document order.
    pub fn marker_paths(&self, marker_id: &MarkerId) -> Vec<NodePath> {
        let mut out = Vec::new();
        collect_marker_paths(
            &self.root,
            &mut Vec::new(),
            &mut |fragment: &MarkerFragment| &fragment.marker_id == marker_id,
            &mut out,
        );
        out
    }

    /// Paths of every fragment in the tree, in document order.
    pub fn all_marker_paths(&self) -> Vec<NodePath> {
        let mut out = Vec::new();
        collect_marker_paths(
            &self.root,
            &mut Vec::new(),
            &mut |_: &MarkerFragment| true,
            &mut out,
        );
        out
    }

    pub fn has_markers(&self) -> bool {
        self.walk()
            .any(|event| matches!(event, WalkEvent::Enter(_)))
    }

    /// Path of the deepest fragment among the ancestors of `path`,
    /// including the node at `path` itself.
    pub fn innermost_marker_along(&self, path: &[usize]) -> Option<NodePath> {
        (1..=path.len())
            .rev()
            .find(|&depth| matches!(self.node(&path[..depth]), Some(Node::Marker(_))))
            .map(|depth| path[..depth].to_vec())
    }

    /// Char range covered by the subtree at `path`.
    pub fn extent(&self, path: &[usize]) -> Option<Range<usize>> {
        let runs = text_runs(self);
        let mut inside = runs.iter().filter(|run| run.path.starts_with(path));
        let first = inside.next()?;
        let end = inside.last().map_or(first.end(), |run| run.end());
        Some(first.start..end)
    }

    /// Merges adjacent text runs and drops empty ones, recursively.
    pub fn normalize(&mut self) {
        normalize_children(&mut self.root);
    }
}

fn collect_marker_paths(
    nodes: &[Node],
    path: &mut NodePath,
    keep: &mut dyn FnMut(&MarkerFragment) -> bool,
    out: &mut Vec<NodePath>,
) {
    for (idx, node) in nodes.iter().enumerate() {
        path.push(idx);
        if let Node::Marker(fragment) = node
            && keep(fragment)
        {
            out.push(path.clone());
        }
        collect_marker_paths(node.children(), path, keep, out);
        path.pop();
    }
}

fn normalize_children(nodes: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        if let Some(children) = node.children_mut() {
            normalize_children(children);
        }
        if let Node::Text(text) = &node {
            if text.is_empty() {
                continue;
            }
            if let Some(Node::Text(previous)) = merged.last_mut() {
                previous.push_str(text);
                continue;
            }
        }
        merged.push(node);
    }
    *nodes = merged;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fragment;
    use pretty_assertions::assert_eq;

    fn sample() -> ContentTree {
        ContentTree::new(vec![
            Node::element("p", vec![Node::text("Hello "), Node::element("em", vec![Node::text("big")])]),
            Node::element("p", vec![Node::text(" world")]),
        ])
    }

    #[test]
    fn flattened_text_ignores_structure() {
        let tree = sample();
        assert_eq!(tree.text(), "Hello big world");
        assert_eq!(tree.len_chars(), 15);
    }

    #[test]
    fn node_lookup_by_path() {
        let tree = sample();
        assert_eq!(tree.node(&[0, 1, 0]), Some(&Node::text("big")));
        assert_eq!(tree.node(&[2]), None);
        assert_eq!(tree.node(&[]), None);
    }

    #[test]
    fn splice_replaces_node_with_many() {
        let mut tree = sample();
        let spliced = tree.splice_with(&[1, 0], |_| vec![Node::text(" wor"), Node::text("ld")]);
        assert!(spliced);
        assert_eq!(tree.node(&[1]).unwrap().children().len(), 2);
        assert_eq!(tree.text(), "Hello big world");
    }

    #[test]
    fn splice_rejects_bad_path() {
        let mut tree = sample();
        assert!(!tree.splice_with(&[], |node| vec![node]));
        assert!(!tree.splice_with(&[0, 9], |node| vec![node]));
    }

    #[test]
    fn marker_paths_in_document_order() {
        let tree = ContentTree::new(vec![
            fragment("a", "x", true, false),
            Node::element("p", vec![fragment("b", "y", true, true), fragment("a", "z", false, true)]),
        ]);
        assert_eq!(tree.marker_paths(&MarkerId::new("a")), vec![vec![0], vec![1, 1]]);
        assert_eq!(tree.all_marker_paths().len(), 3);
        assert!(tree.has_markers());
    }

    #[test]
    fn innermost_marker_along_path() {
        let inner = fragment("b", "x", true, true);
        let tree = ContentTree::new(vec![Node::element("p", vec![inner])]);
        assert_eq!(tree.innermost_marker_along(&[0, 0, 0]), Some(vec![0, 0]));
        assert_eq!(tree.innermost_marker_along(&[0]), None);
    }

    #[test]
    fn extent_of_subtree() {
        let tree = sample();
        assert_eq!(tree.extent(&[0, 1]), Some(6..9));
        assert_eq!(tree.extent(&[1]), Some(9..15));
    }

    #[test]
    fn normalize_merges_adjacent_text() {
        let mut tree = ContentTree::new(vec![
            Node::text("a"),
            Node::text(""),
            Node::text("b"),
            Node::element("p", vec![Node::text("c"), Node::text("d")]),
        ]);
        tree.normalize();
        assert_eq!(
            tree.nodes(),
            &[Node::text("ab"), Node::element("p", vec![Node::text("cd")])]
        );
    }
}
