use log::debug;

use crate::{
    AnnotateError, AnnotationSpan, MarkerId, Tag,
    annotate::find_span,
    tree::{ContentTree, Node},
};

/// Removes every fragment of `marker_id`, returning the span it covered.
///
/// Fragments holding only text collapse into one text run; fragments with
/// nested annotations or structure are unwrapped so the nested content
/// survives with its offsets unchanged.
pub fn remove(tree: &mut ContentTree, marker_id: &MarkerId) -> Result<AnnotationSpan, AnnotateError> {
    let paths = tree.marker_paths(marker_id);
    let Some(span) = find_span(tree, marker_id) else {
        return Err(AnnotateError::MarkerNotFound(marker_id.clone()));
    };

    for path in paths.iter().rev() {
        tree.splice_with(path, unwrap_fragment);
    }

    debug!("removed marker {marker_id} ({} fragment(s))", paths.len());
    Ok(span)
}

/// Re-tags every fragment of `marker_id` and returns the refreshed span.
pub fn update_tag(
    tree: &mut ContentTree,
    marker_id: &MarkerId,
    tag: &Tag,
) -> Result<AnnotationSpan, AnnotateError> {
    let paths = tree.marker_paths(marker_id);
    if paths.is_empty() {
        return Err(AnnotateError::MarkerNotFound(marker_id.clone()));
    }

    for path in &paths {
        if let Some(Node::Marker(fragment)) = tree.node_mut(path) {
            fragment.tag_id = tag.id.clone();
            fragment.style = tag.marker_style();
        }
    }

    debug!("marker {marker_id} now tagged {:?}", tag.id);
    find_span(tree, marker_id).ok_or_else(|| AnnotateError::MarkerNotFound(marker_id.clone()))
}

/// Unwraps every fragment in the tree and merges the freed text runs.
/// Returns the number of fragments removed.
pub fn remove_all(tree: &mut ContentTree) -> usize {
    let paths = tree.all_marker_paths();
    for path in paths.iter().rev() {
        tree.splice_with(path, unwrap_fragment);
    }
    tree.normalize();
    paths.len()
}

fn unwrap_fragment(node: Node) -> Vec<Node> {
    match node {
        Node::Marker(fragment) if fragment.is_plain() => {
            let text = fragment
                .children
                .iter()
                .filter_map(|child| match child {
                    Node::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect::<String>();
            vec![Node::Text(text)]
        }
        Node::Marker(fragment) => fragment.children,
        other => vec![other],
    }
}
