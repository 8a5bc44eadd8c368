use log::warn;

use crate::{
    AnnotationSpan, MarkerId,
    text::{char_len, char_slice},
    tree::{ContentTree, WalkEvent},
};

/// Everything a reconstruction pass found, including inconsistencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanScan {
    pub spans: Vec<AnnotationSpan>,
    /// Markers whose start fragment was never closed by an end fragment.
    pub unclosed: Vec<MarkerId>,
    /// End fragments with no open start fragment.
    pub unmatched_ends: Vec<MarkerId>,
}

/// Rebuilds every annotation span from the tree.
///
/// A running counter advances over text runs only. Start fragments open a
/// span at the counter, text is appended to every open span, and end
/// fragments close the open span with the same marker id, wherever it sits
/// in the open set.
pub fn scan(tree: &ContentTree) -> SpanScan {
    let mut counter = 0;
    let mut open: Vec<AnnotationSpan> = Vec::new();
    let mut scan = SpanScan::default();

    for event in tree.walk() {
        match event {
            WalkEvent::Enter(fragment) if fragment.is_start => open.push(AnnotationSpan {
                marker_id: fragment.marker_id.clone(),
                tag_id: fragment.tag_id.clone(),
                text: String::new(),
                begin_index: counter,
                end_index: counter,
            }),
            WalkEvent::Text(text) => {
                for span in &mut open {
                    span.text.push_str(text);
                }
                counter += char_len(text);
            }
            WalkEvent::Exit(fragment) if fragment.is_end => {
                match open
                    .iter()
                    .rposition(|span| span.marker_id == fragment.marker_id)
                {
                    Some(idx) => {
                        let mut span = open.remove(idx);
                        span.end_index = counter;
                        scan.spans.push(span);
                    }
                    None => scan.unmatched_ends.push(fragment.marker_id.clone()),
                }
            }
            _ => {}
        }
    }

    scan.unclosed = open.into_iter().map(|span| span.marker_id).collect();
    scan.spans.sort_by(|a, b| {
        a.begin_index
            .cmp(&b.begin_index)
            .then(b.end_index.cmp(&a.end_index))
            .then_with(|| a.marker_id.cmp(&b.marker_id))
    });
    scan
}

/// All annotations in the tree, ordered by begin offset. Orphaned start or
/// end flags are logged and left out.
pub fn query_all(tree: &ContentTree) -> Vec<AnnotationSpan> {
    let scan = scan(tree);
    for marker_id in &scan.unclosed {
        warn!("marker {marker_id} has a start fragment but no end fragment");
    }
    for marker_id in &scan.unmatched_ends {
        warn!("marker {marker_id} has an end fragment but no start fragment");
    }
    scan.spans
}

/// Recomputes the span of a single marker.
///
/// Tolerates a missing end flag by closing at the marker's last fragment.
pub fn find_span(tree: &ContentTree, marker_id: &MarkerId) -> Option<AnnotationSpan> {
    let mut counter = 0;
    let mut begin = None;
    let mut end = None;
    let mut last_exit = None;
    let mut tag_id = None;

    for event in tree.walk() {
        match event {
            WalkEvent::Text(text) => counter += char_len(text),
            WalkEvent::Enter(fragment) if &fragment.marker_id == marker_id => {
                if begin.is_none() {
                    begin = Some(counter);
                    tag_id = Some(fragment.tag_id.clone());
                }
            }
            WalkEvent::Exit(fragment) if &fragment.marker_id == marker_id => {
                last_exit = Some(counter);
                if fragment.is_end {
                    end = Some(counter);
                }
            }
            _ => {}
        }
    }

    let begin_index = begin?;
    let end_index = end.or(last_exit)?;
    Some(AnnotationSpan {
        marker_id: marker_id.clone(),
        tag_id: tag_id?,
        text: char_slice(&tree.text(), begin_index..end_index).to_string(),
        begin_index,
        end_index,
    })
}
