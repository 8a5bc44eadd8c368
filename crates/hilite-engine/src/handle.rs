//! The imperative annotation handle hosts drive.
//!
//! [`Hilite`] owns a content tree, the tag palette and the current selection,
//! and exposes the annotation operations keyed by marker id.

use std::ops::Range;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    AnnotateError, AnnotationSpan, MarkerId, RestoreError, TagRegistry,
    annotate::{self, MarkerBounds, Point, RestoreReport},
    tree::ContentTree,
};

/// Construction-time behavior flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HiliteOptions {
    /// Grow selections to whole words before annotating.
    pub auto_word_boundaries: bool,
    /// Annotate with the default tag as soon as a selection is released.
    pub auto_tag: bool,
    /// Allow new annotations over text that is already annotated.
    pub overlap_tag: bool,
}

type MarkerObserver = Box<dyn FnMut(Option<&MarkerId>)>;

pub struct Hilite {
    tree: ContentTree,
    tags: TagRegistry,
    options: HiliteOptions,
    default_tag: Option<String>,
    selection: Option<Range<usize>>,
    selected_marker: Option<MarkerId>,
    observer: Option<MarkerObserver>,
}

impl Hilite {
    pub fn new(tree: ContentTree, tags: TagRegistry, options: HiliteOptions) -> Self {
        Self {
            tree,
            tags,
            options,
            default_tag: None,
            selection: None,
            selected_marker: None,
            observer: None,
        }
    }

    /// Tag used when an operation names none. Unknown ids are reported when
    /// the tag is first needed.
    pub fn with_default_tag(mut self, tag_id: impl Into<String>) -> Self {
        self.default_tag = Some(tag_id.into());
        self
    }

    /// Registers the callback told which marker a click resolved to, or
    /// `None` when it hit nothing.
    pub fn on_marker_select(&mut self, observer: impl FnMut(Option<&MarkerId>) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn options(&self) -> HiliteOptions {
        self.options
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    pub fn selected_marker(&self) -> Option<&MarkerId> {
        self.selected_marker.as_ref()
    }

    /// Records the live selection as a char range of the document text.
    pub fn set_selection(&mut self, selection: Option<Range<usize>>) {
        self.selection = selection;
    }

    /// Annotates the current selection with `tag_id`, or the default tag.
    ///
    /// The selection is consumed on success and kept on failure.
    pub fn materialize_selection(&mut self, tag_id: Option<&str>) -> Result<AnnotationSpan, AnnotateError> {
        let range = self.selection.clone().ok_or(AnnotateError::NoSelection)?;
        let tag_id = tag_id
            .map(str::to_string)
            .or_else(|| self.default_tag.clone())
            .ok_or(AnnotateError::MissingTag)?;
        let tag = self.tags.require(&tag_id)?;

        let len = self.tree.len_chars();
        if range.end > len {
            return Err(AnnotateError::OutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let range = if self.options.auto_word_boundaries {
            annotate::expand_to_word_boundaries(&self.tree.text(), range)
        } else {
            range
        };

        let result = annotate::materialize(&mut self.tree, range, self.options.overlap_tag, tag, None)?;
        self.selection = None;
        annotate::find_span(&self.tree, &result.marker_id)
            .ok_or(AnnotateError::MarkerNotFound(result.marker_id))
    }

    /// Signals the end of a selection gesture. With `auto_tag` set this
    /// annotates the selection with the default tag.
    pub fn selection_released(&mut self) -> Option<Result<AnnotationSpan, AnnotateError>> {
        if !self.options.auto_tag || self.selection.is_none() {
            return None;
        }
        if self.default_tag.is_none() {
            warn!("auto-tag is enabled but no default tag is configured");
        }
        let result = self.materialize_selection(None);
        if let Err(err) = &result {
            debug!("auto-tag skipped: {err}");
        }
        Some(result)
    }

    pub fn remove(&mut self, marker_id: &MarkerId) -> Result<AnnotationSpan, AnnotateError> {
        let span = annotate::remove(&mut self.tree, marker_id)?;
        if self.selected_marker.as_ref() == Some(marker_id) {
            self.select(None);
        }
        Ok(span)
    }

    /// Re-tags an annotation. Both the marker and the tag must exist.
    pub fn update(&mut self, marker_id: &MarkerId, tag_id: &str) -> Result<AnnotationSpan, AnnotateError> {
        let tag = self.tags.require(tag_id)?;
        annotate::update_tag(&mut self.tree, marker_id, tag)
    }

    pub fn query_all(&self) -> Vec<AnnotationSpan> {
        annotate::query_all(&self.tree)
    }

    pub fn restore(&mut self, spans: &[AnnotationSpan]) -> RestoreReport {
        let report = annotate::restore(&mut self.tree, spans, &self.tags);
        self.forget_missing_selection();
        report
    }

    pub fn restore_json(&mut self, json: &str) -> Result<RestoreReport, RestoreError> {
        let report = annotate::restore_json(&mut self.tree, json, &self.tags)?;
        self.forget_missing_selection();
        Ok(report)
    }

    /// All annotations as the JSON array hosts persist.
    pub fn to_json(&self) -> serde_json::Result<String> {
        crate::spans_to_json(&self.query_all())
    }

    pub fn to_html(&self) -> String {
        self.tree.to_html()
    }

    /// Resolves a click against the on-screen boxes of the markers and
    /// notifies the observer with the outcome.
    pub fn click(&mut self, point: Point, bounds: &[MarkerBounds]) -> Option<MarkerId> {
        let resolved = annotate::resolve_click(point, bounds);
        self.select(resolved.clone());
        resolved
    }

    fn select(&mut self, marker: Option<MarkerId>) {
        self.selected_marker = marker;
        if let Some(observer) = self.observer.as_mut() {
            observer(self.selected_marker.as_ref());
        }
    }

    fn forget_missing_selection(&mut self) {
        if let Some(marker_id) = &self.selected_marker
            && self.tree.marker_paths(marker_id).is_empty()
        {
            self.select(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::Rect;
    use crate::tests::registry;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn handle(text: &str, options: HiliteOptions) -> Hilite {
        Hilite::new(ContentTree::from_text(text), registry(), options).with_default_tag("person")
    }

    #[test]
    fn materialize_selection_returns_span() {
        let mut hilite = handle("Ada wrote notes", HiliteOptions::default());
        hilite.set_selection(Some(4..9));

        let span = hilite.materialize_selection(Some("place")).unwrap();

        assert_eq!((span.tag_id.as_str(), span.range(), span.text.as_str()), ("place", 4..9, "wrote"));
        assert_eq!(hilite.selection(), None);
        assert_eq!(hilite.query_all(), vec![span]);
    }

    #[test]
    fn word_boundaries_expand_selection() {
        let options = HiliteOptions {
            auto_word_boundaries: true,
            ..Default::default()
        };
        let mut hilite = handle("a testing run", options);
        hilite.set_selection(Some(4..7));

        let span = hilite.materialize_selection(None).unwrap();

        assert_eq!(span.text, "testing");
        assert_eq!(span.range(), 2..9);
    }

    #[test]
    fn selection_errors() {
        let mut hilite = Hilite::new(ContentTree::from_text("abc"), registry(), HiliteOptions::default());
        assert_eq!(hilite.materialize_selection(Some("person")), Err(AnnotateError::NoSelection));

        hilite.set_selection(Some(0..2));
        assert_eq!(hilite.materialize_selection(None), Err(AnnotateError::MissingTag));
        assert_eq!(
            hilite.materialize_selection(Some("nobody")),
            Err(AnnotateError::TagNotFound("nobody".to_string()))
        );

        hilite.set_selection(Some(1..8));
        assert!(matches!(
            hilite.materialize_selection(Some("person")),
            Err(AnnotateError::OutOfBounds { .. })
        ));
        assert!(!hilite.tree().has_markers());
    }

    #[test]
    fn overlap_flag_controls_nested_annotation() {
        let mut strict = handle("one two three", HiliteOptions::default());
        strict.set_selection(Some(0..13));
        strict.materialize_selection(None).unwrap();
        strict.set_selection(Some(4..7));
        assert_eq!(strict.materialize_selection(None), Err(AnnotateError::AlreadyAnnotated));
        assert_eq!(strict.query_all().len(), 1);

        let mut lenient = handle(
            "one two three",
            HiliteOptions {
                overlap_tag: true,
                ..Default::default()
            },
        );
        lenient.set_selection(Some(0..13));
        lenient.materialize_selection(None).unwrap();
        lenient.set_selection(Some(4..7));
        lenient.materialize_selection(None).unwrap();
        assert_eq!(lenient.query_all().len(), 2);
    }

    #[test]
    fn auto_tag_on_release() {
        let mut manual = handle("abc def", HiliteOptions::default());
        manual.set_selection(Some(0..3));
        assert!(manual.selection_released().is_none());

        let mut auto = handle(
            "abc def",
            HiliteOptions {
                auto_tag: true,
                ..Default::default()
            },
        );
        auto.set_selection(Some(4..7));
        let span = auto.selection_released().unwrap().unwrap();
        assert_eq!((span.tag_id.as_str(), span.text.as_str()), ("person", "def"));
    }

    #[test]
    fn update_and_remove_by_marker_id() {
        let mut hilite = handle("Ada wrote notes", HiliteOptions::default());
        hilite.set_selection(Some(0..3));
        let span = hilite.materialize_selection(None).unwrap();

        let updated = hilite.update(&span.marker_id, "place").unwrap();
        assert_eq!(updated.tag_id, "place");
        assert_eq!(
            hilite.update(&span.marker_id, "nobody"),
            Err(AnnotateError::TagNotFound("nobody".to_string()))
        );

        let removed = hilite.remove(&span.marker_id).unwrap();
        assert_eq!(removed.range(), 0..3);
        assert!(hilite.query_all().is_empty());
        assert!(matches!(hilite.remove(&span.marker_id), Err(AnnotateError::MarkerNotFound(_))));
    }

    #[test]
    fn json_round_trip_through_handle() {
        let mut hilite = handle("Ada wrote notes", HiliteOptions::default());
        hilite.set_selection(Some(10..15));
        hilite.materialize_selection(None).unwrap();
        let json = hilite.to_json().unwrap();

        let mut fresh = handle("Ada wrote notes", HiliteOptions::default());
        let report = fresh.restore_json(&json).unwrap();

        assert_eq!(report.restored, 1);
        assert_eq!(fresh.query_all(), hilite.query_all());
    }

    #[test]
    fn click_notifies_observer() {
        let seen: Rc<RefCell<Vec<Option<MarkerId>>>> = Rc::default();
        let mut hilite = handle("abc", HiliteOptions::default());
        let log = Rc::clone(&seen);
        hilite.on_marker_select(move |marker| log.borrow_mut().push(marker.cloned()));
        let bounds = [MarkerBounds {
            marker_id: MarkerId::new("m"),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        }];

        hilite.click(Point::new(5.0, 5.0), &bounds);
        hilite.click(Point::new(50.0, 5.0), &bounds);

        assert_eq!(*seen.borrow(), vec![Some(MarkerId::new("m")), None]);
        assert_eq!(hilite.selected_marker(), None);
    }

    #[test]
    fn removing_selected_marker_clears_selection() {
        let seen: Rc<RefCell<Vec<Option<MarkerId>>>> = Rc::default();
        let mut hilite = handle("abc", HiliteOptions::default());
        hilite.set_selection(Some(0..3));
        let span = hilite.materialize_selection(None).unwrap();
        let log = Rc::clone(&seen);
        hilite.on_marker_select(move |marker| log.borrow_mut().push(marker.cloned()));
        let bounds = [MarkerBounds {
            marker_id: span.marker_id.clone(),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        }];
        hilite.click(Point::new(1.0, 1.0), &bounds);

        hilite.remove(&span.marker_id).unwrap();

        assert_eq!(*seen.borrow(), vec![Some(span.marker_id.clone()), None]);
    }
}
