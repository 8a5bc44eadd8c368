use thiserror::Error;

use crate::MarkerId;

/// Failures of selection, materialize, remove and update operations.
///
/// All of these are detected before the tree is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotateError {
    #[error("no text selected")]
    NoSelection,

    #[error("selection is collapsed")]
    Collapsed,

    #[error("selection {start}..{end} lies outside the document (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("selection contains only whitespace")]
    WhitespaceOnly,

    #[error("selected text is already annotated")]
    AlreadyAnnotated,

    #[error("no marker with id {0}")]
    MarkerNotFound(MarkerId),

    #[error("no tag with id {0:?}")]
    TagNotFound(String),

    #[error("no tag provided and no default tag configured")]
    MissingTag,
}

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("restore payload is not a JSON array")]
    NotAnArray,

    #[error("restore payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("range {start}..{end} is empty")]
    EmptyRange { start: usize, end: usize },

    #[error("range {start}..{end} lies outside the text (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("could not find {text:?} in the {target}")]
    NotFound { text: String, target: MappingTarget },
}

/// Which side of the mapping a search ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingTarget {
    Source,
    Projection,
}

impl std::fmt::Display for MappingTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingTarget::Source => f.write_str("markdown source"),
            MappingTarget::Projection => f.write_str("rendered text"),
        }
    }
}
