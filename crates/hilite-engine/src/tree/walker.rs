use crate::{MarkerId, text::char_len};

use super::{ContentTree, MarkerFragment, Node, NodePath};

/// A step of a depth-first traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WalkEvent<'a> {
    /// A leaf text run.
    Text(&'a str),
    /// Entering a wrapper fragment, before its children.
    Enter(&'a MarkerFragment),
    /// Leaving a wrapper fragment, after its children.
    Exit(&'a MarkerFragment),
}

enum Frame<'a> {
    Visit(&'a Node),
    Leave(&'a MarkerFragment),
}

/// Depth-first, document-order traversal driven by an explicit stack.
///
/// Structural elements are descended into silently; only text runs and
/// fragment boundaries are reported.
pub struct Walk<'a> {
    stack: Vec<Frame<'a>>,
}

impl<'a> Walk<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        Self {
            stack: nodes.iter().rev().map(Frame::Visit).collect(),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop()? {
                Frame::Leave(fragment) => return Some(WalkEvent::Exit(fragment)),
                Frame::Visit(Node::Text(text)) => return Some(WalkEvent::Text(text)),
                Frame::Visit(Node::Element(element)) => {
                    self.stack
                        .extend(element.children.iter().rev().map(Frame::Visit));
                }
                Frame::Visit(Node::Marker(fragment)) => {
                    self.stack.push(Frame::Leave(fragment));
                    self.stack
                        .extend(fragment.children.iter().rev().map(Frame::Visit));
                    return Some(WalkEvent::Enter(fragment));
                }
            }
        }
    }
}

/// A leaf text run located in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub path: NodePath,
    /// Absolute char offset of the run's first char.
    pub start: usize,
    /// Length in chars.
    pub len: usize,
    pub text: String,
    /// Enclosing fragments, outermost first.
    pub markers: Vec<MarkerId>,
}

impl TextRun {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// True when some fragment encloses this run.
    pub fn is_marked(&self) -> bool {
        !self.markers.is_empty()
    }
}

/// Every leaf text run of the tree in document order.
pub fn text_runs(tree: &ContentTree) -> Vec<TextRun> {
    let mut runs = Vec::new();
    collect_runs(
        tree.nodes(),
        &mut Vec::new(),
        &mut Vec::new(),
        &mut 0,
        &mut runs,
    );
    runs
}

fn collect_runs(
    nodes: &[Node],
    path: &mut NodePath,
    markers: &mut Vec<MarkerId>,
    offset: &mut usize,
    out: &mut Vec<TextRun>,
) {
    for (idx, node) in nodes.iter().enumerate() {
        path.push(idx);
        match node {
            Node::Text(text) => {
                let len = char_len(text);
                out.push(TextRun {
                    path: path.clone(),
                    start: *offset,
                    len,
                    text: text.clone(),
                    markers: markers.clone(),
                });
                *offset += len;
            }
            Node::Element(element) => {
                collect_runs(&element.children, path, markers, offset, out);
            }
            Node::Marker(fragment) => {
                markers.push(fragment.marker_id.clone());
                collect_runs(&fragment.children, path, markers, offset, out);
                markers.pop();
            }
        }
        path.pop();
    }
}
