//! # Annotation Core
//!
//! Turns character ranges into wrapper fragments and back.
//!
//! ## Flow
//!
//! ```text
//! selection ──► boundary (optional) ──► materialize ──► fragments in tree
//!                                                            │
//!        restore ◄── JSON spans ◄── query (scan / find_span) ◄┘
//! ```
//!
//! - **`boundary`**: grows a raw range to whole words
//! - **`materialize`**: splits the touched text runs and inserts fragments
//!   sharing one marker id
//! - **`query`**: rebuilds spans with an open-marker stack and a running
//!   char counter
//! - **`mutate`**: remove, re-tag and clear annotations
//! - **`restore`**: resets the tree and re-materializes a saved span set
//! - **`click`**: picks one marker among overlapping on-screen boxes
//!
//! All offsets are char offsets into the flattened document text. Every
//! operation validates its input before mutating, so a failed call leaves
//! the tree exactly as it found it.

pub mod boundary;
pub mod click;
pub mod materialize;
pub mod mutate;
pub mod query;
pub mod restore;

pub use boundary::expand_to_word_boundaries;
pub use click::{MarkerBounds, Point, Rect, resolve_click};
pub use materialize::{Materialized, materialize};
pub use mutate::{remove, remove_all, update_tag};
pub use query::{SpanScan, find_span, query_all, scan};
pub use restore::{RestoreFailure, RestoreReport, SkipReason, restore, restore_json};
