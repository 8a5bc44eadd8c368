use std::collections::HashSet;
use std::ops::Range;

use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

use crate::{
    AnnotateError, AnnotationSpan, MarkerId, RestoreError, TagRegistry,
    annotate::{materialize, materialize::wrap_node, remove_all},
    text::char_slice,
    tree::{ContentTree, NodePath, text_runs},
};

/// Why a restore entry was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("missing marker id")]
    MissingMarkerId,
    #[error("missing tag id")]
    MissingTagId,
    #[error("range {begin}..{end} is empty")]
    EmptyRange { begin: usize, end: usize },
    #[error("range ends at {end}, past the document end {len}")]
    OutOfBounds { end: usize, len: usize },
    #[error("unknown tag {0:?}")]
    UnknownTag(String),
    #[error("marker id already used by an earlier entry")]
    DuplicateMarker,
    #[error("malformed entry: {0}")]
    Malformed(String),
    #[error("offsets do not resolve to text in the document")]
    Unresolved,
    #[error(transparent)]
    Materialize(#[from] AnnotateError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreFailure {
    /// Position of the entry in the input.
    pub index: usize,
    pub marker_id: Option<MarkerId>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: usize,
    pub failures: Vec<RestoreFailure>,
}

impl RestoreReport {
    fn skip(&mut self, index: usize, marker_id: Option<MarkerId>, reason: SkipReason) {
        warn!("skipping annotation #{index}: {reason}");
        self.skipped += 1;
        self.failures.push(RestoreFailure {
            index,
            marker_id,
            reason,
        });
    }
}

/// Replaces the tree's annotations with `spans`.
///
/// Invalid entries are skipped and reported. When no entry is valid the tree
/// is left as it was; otherwise every existing fragment is removed first and
/// the spans are re-materialized innermost-first under their original ids.
pub fn restore(tree: &mut ContentTree, spans: &[AnnotationSpan], tags: &TagRegistry) -> RestoreReport {
    let entries: Vec<_> = spans.iter().enumerate().collect();
    restore_entries(tree, &entries, tags, RestoreReport::default())
}

/// Lenient JSON entry point over [`restore`].
///
/// The payload must be an array; entries that do not deserialize into an
/// [`AnnotationSpan`] are skipped as malformed.
pub fn restore_json(
    tree: &mut ContentTree,
    json: &str,
    tags: &TagRegistry,
) -> Result<RestoreReport, RestoreError> {
    let Value::Array(items) = serde_json::from_str::<Value>(json)? else {
        return Err(RestoreError::NotAnArray);
    };

    let mut report = RestoreReport::default();
    let mut spans = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let marker_id = item
            .get("markerId")
            .and_then(Value::as_str)
            .map(MarkerId::from);
        match serde_json::from_value::<AnnotationSpan>(item) {
            Ok(span) => spans.push((index, span)),
            Err(err) => report.skip(index, marker_id, SkipReason::Malformed(err.to_string())),
        }
    }

    let entries: Vec<_> = spans.iter().map(|(index, span)| (*index, span)).collect();
    Ok(restore_entries(tree, &entries, tags, report))
}

fn restore_entries(
    tree: &mut ContentTree,
    entries: &[(usize, &AnnotationSpan)],
    tags: &TagRegistry,
    mut report: RestoreReport,
) -> RestoreReport {
    let len = tree.len_chars();
    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(entries.len());

    for &(index, span) in entries {
        match validate(span, len, tags, &mut seen) {
            Ok(()) => valid.push((index, span)),
            Err(reason) => report.skip(index, Some(span.marker_id.clone()), reason),
        }
    }

    if valid.is_empty() {
        warn!("no valid annotations to restore; document left untouched");
        report.failures.sort_by_key(|failure| failure.index);
        return report;
    }

    let cleared = remove_all(tree);
    debug!("cleared {cleared} fragment(s) before restoring {} span(s)", valid.len());

    let document = tree.text();
    valid.sort_by_key(|(_, span)| (span.len(), span.begin_index));

    for (index, span) in valid {
        let current = char_slice(&document, span.range());
        if !span.text.is_empty() && span.text != current {
            warn!(
                "stored text {:?} of marker {} no longer matches the document ({current:?}); using the document",
                span.text, span.marker_id
            );
        }

        let Some(placement) = resolve_range(tree, span) else {
            report.skip(index, Some(span.marker_id.clone()), SkipReason::Unresolved);
            continue;
        };
        let Some(tag) = tags.get(&span.tag_id) else {
            report.skip(index, Some(span.marker_id.clone()), SkipReason::UnknownTag(span.tag_id.clone()));
            continue;
        };

        let outcome = match placement {
            Placement::Wrap(path) => {
                wrap_node(tree, &path, tag, span.marker_id.clone()).ok_or(SkipReason::Unresolved)
            }
            Placement::Range(range) => {
                materialize(tree, range, true, tag, Some(span.marker_id.clone())).map_err(SkipReason::from)
            }
        };
        match outcome {
            Ok(_) => report.restored += 1,
            Err(reason) => report.skip(index, Some(span.marker_id.clone()), reason),
        }
    }

    report.failures.sort_by_key(|failure| failure.index);
    debug!(
        "restore finished: {} restored, {} skipped",
        report.restored, report.skipped
    );
    report
}

fn validate<'a>(
    span: &'a AnnotationSpan,
    len: usize,
    tags: &TagRegistry,
    seen: &mut HashSet<&'a MarkerId>,
) -> Result<(), SkipReason> {
    if span.marker_id.is_empty() {
        return Err(SkipReason::MissingMarkerId);
    }
    if span.tag_id.trim().is_empty() {
        return Err(SkipReason::MissingTagId);
    }
    if span.begin_index >= span.end_index {
        return Err(SkipReason::EmptyRange {
            begin: span.begin_index,
            end: span.end_index,
        });
    }
    if span.end_index > len {
        return Err(SkipReason::OutOfBounds {
            end: span.end_index,
            len,
        });
    }
    if tags.get(&span.tag_id).is_none() {
        return Err(SkipReason::UnknownTag(span.tag_id.clone()));
    }
    if !seen.insert(&span.marker_id) {
        return Err(SkipReason::DuplicateMarker);
    }
    Ok(())
}

/// Where a restored span goes in the current tree.
#[derive(Debug, PartialEq)]
enum Placement {
    /// Wrap the text runs under this range.
    Range(Range<usize>),
    /// Wrap the existing fragment at this path as a whole.
    Wrap(NodePath),
}

/// Locates the runs holding both ends of `span` in the current tree. When
/// their common ancestor sits inside a fragment, the range grows to cover
/// that whole fragment; if that is exactly the fragment, the fragment itself
/// is wrapped.
fn resolve_range(tree: &ContentTree, span: &AnnotationSpan) -> Option<Placement> {
    let runs = text_runs(tree);
    let start_run = runs
        .iter()
        .find(|run| run.start <= span.begin_index && span.begin_index < run.end())?;
    let end_run = runs
        .iter()
        .find(|run| run.start < span.end_index && span.end_index <= run.end())?;

    let mut range = span.range();
    let common = common_prefix(&start_run.path, &end_run.path);
    if let Some(marker_path) = tree.innermost_marker_along(&common)
        && let Some(extent) = tree.extent(&marker_path)
    {
        range = range.start.min(extent.start)..range.end.max(extent.end);
        if range == extent {
            return Some(Placement::Wrap(marker_path));
        }
    }
    Some(Placement::Range(range))
}

fn common_prefix(a: &[usize], b: &[usize]) -> NodePath {
    a.iter()
        .zip(b)
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| *x)
        .collect()
}
