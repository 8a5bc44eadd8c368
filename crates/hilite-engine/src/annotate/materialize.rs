use std::ops::Range;

use log::debug;

use crate::{
    AnnotateError, MarkerId, Tag,
    text::{char_len, char_slice, leading_whitespace, split_at_char, trailing_whitespace},
    tree::{ContentTree, MarkerFragment, Node, NodePath, text_runs},
};

/// Outcome of a successful materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub marker_id: MarkerId,
    /// Document text from the first fragment's start to the last one's end.
    pub text: String,
}

/// The part of one text run a new annotation covers.
#[derive(Debug)]
struct Segment {
    path: NodePath,
    run_start: usize,
    text: String,
    /// Char range local to the run.
    local: Range<usize>,
}

impl Segment {
    fn selected(&self) -> &str {
        char_slice(&self.text, self.local.clone())
    }

    fn is_blank(&self) -> bool {
        self.selected().chars().all(char::is_whitespace)
    }

    fn absolute(&self) -> Range<usize> {
        self.run_start + self.local.start..self.run_start + self.local.end
    }
}

/// Wraps the text covered by `range` in fragments of one new annotation.
///
/// The range is trimmed of surrounding whitespace first. With
/// `allow_overlap` false, runs already inside an annotation are left alone;
/// if that leaves nothing to wrap the call fails with
/// [`AnnotateError::AlreadyAnnotated`]. `marker_id` is reused when given,
/// otherwise a fresh id is minted.
///
/// Every check runs before the first mutation.
pub fn materialize(
    tree: &mut ContentTree,
    range: Range<usize>,
    allow_overlap: bool,
    tag: &Tag,
    marker_id: Option<MarkerId>,
) -> Result<Materialized, AnnotateError> {
    let len = tree.len_chars();
    if range.start >= range.end {
        return Err(AnnotateError::Collapsed);
    }
    if range.end > len {
        return Err(AnnotateError::OutOfBounds {
            start: range.start,
            end: range.end,
            len,
        });
    }

    let document = tree.text();
    let selected = char_slice(&document, range.clone());
    let lead = leading_whitespace(selected);
    if lead == char_len(selected) {
        return Err(AnnotateError::WhitespaceOnly);
    }
    let trail = trailing_whitespace(selected);
    let range = range.start + lead..range.end - trail;

    let mut segments: Vec<Segment> = text_runs(tree)
        .into_iter()
        .filter(|run| run.len > 0 && run.start < range.end && run.end() > range.start)
        .filter(|run| allow_overlap || !run.is_marked())
        .map(|run| Segment {
            local: range.start.max(run.start) - run.start..range.end.min(run.end()) - run.start,
            path: run.path,
            run_start: run.start,
            text: run.text,
        })
        .collect();

    let Some(first) = segments.iter().position(|segment| !segment.is_blank()) else {
        debug!("nothing left to wrap in {range:?}; every run is already annotated");
        return Err(AnnotateError::AlreadyAnnotated);
    };
    let last = segments
        .iter()
        .rposition(|segment| !segment.is_blank())
        .unwrap_or(first);

    let head = leading_whitespace(segments[first].selected());
    segments[first].local.start += head;
    let tail = trailing_whitespace(segments[last].selected());
    segments[last].local.end -= tail;

    let covered = segments[first].absolute().start..segments[last].absolute().end;
    let text = char_slice(&document, covered).to_string();
    let marker_id = marker_id.unwrap_or_else(MarkerId::generate);

    for idx in (first..=last).rev() {
        let segment = &segments[idx];
        if segment.local.is_empty() {
            continue;
        }
        let fragment = MarkerFragment {
            marker_id: marker_id.clone(),
            tag_id: tag.id.clone(),
            is_start: idx == first,
            is_end: idx == last,
            style: tag.marker_style(),
            children: Vec::new(),
        };
        let local = segment.local.clone();
        tree.splice_with(&segment.path, move |node| split_run(node, local, fragment));
    }

    debug!(
        "materialized marker {marker_id} over {} run(s) with tag {:?}",
        last - first + 1,
        tag.id
    );
    Ok(Materialized { marker_id, text })
}

/// Wraps the whole node at `path` in a single fragment, so the new marker
/// encloses any fragments already there. Returns `None` when the path does
/// not resolve.
pub(crate) fn wrap_node(
    tree: &mut ContentTree,
    path: &[usize],
    tag: &Tag,
    marker_id: MarkerId,
) -> Option<Materialized> {
    let text = tree.node(path)?.text_content();
    let mut fragment = MarkerFragment {
        marker_id: marker_id.clone(),
        tag_id: tag.id.clone(),
        is_start: true,
        is_end: true,
        style: tag.marker_style(),
        children: Vec::new(),
    };
    let wrapped = tree.splice_with(path, move |node| {
        fragment.children.push(node);
        vec![Node::Marker(fragment)]
    });
    if !wrapped {
        return None;
    }
    debug!("wrapped node {path:?} in marker {marker_id} with tag {:?}", tag.id);
    Some(Materialized { marker_id, text })
}

/// Splits a text run into `before | fragment(middle) | after`.
fn split_run(node: Node, local: Range<usize>, mut fragment: MarkerFragment) -> Vec<Node> {
    let Node::Text(text) = node else {
        return vec![node];
    };
    let (before, rest) = split_at_char(&text, local.start);
    let (middle, after) = split_at_char(rest, local.end - local.start);

    let mut out = Vec::with_capacity(3);
    if !before.is_empty() {
        out.push(Node::text(before));
    }
    fragment.children.push(Node::text(middle));
    out.push(Node::Marker(fragment));
    if !after.is_empty() {
        out.push(Node::text(after));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{fragment, tag};
    use pretty_assertions::assert_eq;

    fn fragments(tree: &ContentTree) -> Vec<(String, bool, bool)> {
        tree.all_marker_paths()
            .iter()
            .filter_map(|path| tree.node(path)?.as_marker())
            .map(|f| (Node::Marker(f.clone()).text_content(), f.is_start, f.is_end))
            .collect()
    }

    #[test]
    fn wraps_middle_of_single_run() {
        let mut tree = ContentTree::from_text("say hello there");

        let result = materialize(&mut tree, 4..9, false, &tag("t"), None).unwrap();

        assert_eq!(result.text, "hello");
        assert_eq!(tree.nodes().len(), 3);
        assert_eq!(fragments(&tree), vec![("hello".to_string(), true, true)]);
        assert_eq!(tree.text(), "say hello there");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let mut tree = ContentTree::from_text("  hello  ");
        let result = materialize(&mut tree, 0..9, false, &tag("t"), None).unwrap();
        assert_eq!(result.text, "hello");
        assert_eq!(tree.extent(&[1]), Some(2..7));
    }

    #[test]
    fn spans_several_runs() {
        let mut tree = ContentTree::new(vec![Node::element(
            "p",
            vec![
                Node::text("one "),
                Node::element("strong", vec![Node::text("two")]),
                Node::text(" three"),
            ],
        )]);

        let result = materialize(&mut tree, 0..13, false, &tag("t"), None).unwrap();

        assert_eq!(result.text, "one two three");
        assert_eq!(
            fragments(&tree),
            vec![
                ("one ".to_string(), true, false),
                ("two".to_string(), false, false),
                (" three".to_string(), false, true),
            ]
        );
    }

    #[test]
    fn whitespace_only_runs_at_the_edges_stay_unwrapped() {
        let mut tree = ContentTree::new(vec![
            Node::text("a"),
            Node::text("  "),
            Node::text("b"),
            Node::text(" "),
        ]);

        materialize(&mut tree, 0..5, false, &tag("t"), None).unwrap();

        assert_eq!(
            fragments(&tree),
            vec![
                ("a".to_string(), true, false),
                ("  ".to_string(), false, false),
                ("b".to_string(), false, true),
            ]
        );
        assert_eq!(tree.nodes().last(), Some(&Node::text(" ")));
    }

    #[test]
    fn reuses_supplied_marker_id() {
        let mut tree = ContentTree::from_text("abc");
        let result = materialize(&mut tree, 0..3, false, &tag("t"), Some(MarkerId::new("keep")))
            .unwrap();
        assert_eq!(result.marker_id, MarkerId::new("keep"));
    }

    #[test]
    fn skips_annotated_runs_without_overlap() {
        let mut tree = ContentTree::new(vec![Node::text("ab "), fragment("old", "cd", true, true)]);

        materialize(&mut tree, 0..5, false, &tag("t"), Some(MarkerId::new("new"))).unwrap();

        assert_eq!(tree.marker_paths(&MarkerId::new("new")).len(), 1);
        assert_eq!(tree.extent(&tree.marker_paths(&MarkerId::new("new"))[0]), Some(0..2));
    }

    #[test]
    fn fully_annotated_selection_is_rejected() {
        let mut tree = ContentTree::new(vec![Node::text("x "), fragment("old", "word", true, true)]);
        let before = tree.clone();

        let err = materialize(&mut tree, 3..5, false, &tag("t"), None).unwrap_err();

        assert_eq!(err, AnnotateError::AlreadyAnnotated);
        assert_eq!(tree, before);
    }

    #[test]
    fn overlap_wraps_inside_existing_fragment() {
        let mut tree = ContentTree::new(vec![fragment("old", "word", true, true)]);

        materialize(&mut tree, 1..3, true, &tag("t"), Some(MarkerId::new("new"))).unwrap();

        assert_eq!(tree.marker_paths(&MarkerId::new("new")), vec![vec![0, 1]]);
    }

    #[test]
    fn invalid_ranges_fail_before_mutation() {
        let mut tree = ContentTree::from_text("abc   ");
        let before = tree.clone();

        assert_eq!(
            materialize(&mut tree, 2..2, false, &tag("t"), None),
            Err(AnnotateError::Collapsed)
        );
        assert_eq!(
            materialize(&mut tree, 1..9, false, &tag("t"), None),
            Err(AnnotateError::OutOfBounds { start: 1, end: 9, len: 6 })
        );
        assert_eq!(
            materialize(&mut tree, 3..6, false, &tag("t"), None),
            Err(AnnotateError::WhitespaceOnly)
        );
        assert_eq!(tree, before);
    }
}
