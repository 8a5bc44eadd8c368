pub mod annotate;
pub mod error;
pub mod handle;
pub mod io;
pub mod mapping;
pub mod render;
pub mod span;
pub mod tags;
pub mod text;
pub mod tree;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use annotate::{
    MarkerBounds, Materialized, Point, Rect, RestoreFailure, RestoreReport, SkipReason, SpanScan,
};
pub use error::{AnnotateError, MappingError, MappingTarget, RestoreError};
pub use handle::{Hilite, HiliteOptions};
pub use io::IoError;
pub use mapping::{MappedRange, PositionMapper};
pub use render::{MarkdownRenderer, Projector};
pub use span::{AnnotationSpan, MarkerId, spans_to_json};
pub use tags::{MarkerStyle, Tag, TagRegistry};
pub use tree::{ContentTree, Element, MarkerFragment, Node, NodePath};
