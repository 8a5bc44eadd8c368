//! # Source/Rendered Position Mapping
//!
//! Translates char ranges between a markdown source and its rendered
//! plain-text projection. Both directions search for the excerpt on the
//! other side rather than tracking positions through the renderer, so a
//! result is heuristic: when an excerpt occurs more than once the first
//! occurrence wins and [`MappedRange::ambiguous`] is set.
//!
//! - **projection → source**: exact search, then a word-by-word search that
//!   tolerates formatting inside and between words. Matches widen over
//!   surrounding `*`, `_` and `` ` `` so the range covers the delimiters.
//! - **source → projection**: the excerpt is stripped of markdown syntax and
//!   searched for exactly, then with flexible whitespace.

mod fuzzy;
pub mod strip;

use std::ops::Range;

use log::warn;
use regex::Regex;

use crate::{
    MappingError, MappingTarget, Projector,
    text::{byte_to_char, char_len, char_slice},
};

/// Delimiters a mapped source range grows over.
const WRAPPING_DELIMITERS: &[char] = &['*', '_', '`'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedRange {
    pub start: usize,
    pub end: usize,
    /// The excerpt matched in more than one place.
    pub ambiguous: bool,
}

impl MappedRange {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone)]
pub struct PositionMapper {
    source: String,
    source_chars: Vec<char>,
    projection: String,
}

impl PositionMapper {
    pub fn new(source: impl Into<String>, projector: &impl Projector) -> Self {
        let source = source.into();
        let projection = projector.project(&source);
        Self::from_parts(source, projection)
    }

    /// Builds a mapper over an already computed projection.
    pub fn from_parts(source: impl Into<String>, projection: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            source_chars: source.chars().collect(),
            source,
            projection: projection.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn projection(&self) -> &str {
        &self.projection
    }

    /// Maps a range of the rendered text onto the markdown source,
    /// including the formatting delimiters wrapping it.
    pub fn projection_to_source(&self, range: Range<usize>) -> Result<MappedRange, MappingError> {
        check_range(&range, char_len(&self.projection))?;
        let excerpt = char_slice(&self.projection, range);

        let exact = find_occurrences(&self.source, excerpt, 2);
        let candidates = if exact.is_empty() {
            let words: Vec<Vec<char>> = excerpt
                .split_whitespace()
                .map(|word| word.chars().collect())
                .collect();
            fuzzy::find_words(&self.source_chars, &words, 2)
        } else {
            exact
                .into_iter()
                .map(|start| start..start + char_len(excerpt))
                .collect()
        };

        let Some(found) = candidates.first() else {
            warn!("could not find rendered text {excerpt:?} in the markdown source");
            return Err(MappingError::NotFound {
                text: excerpt.to_string(),
                target: MappingTarget::Source,
            });
        };

        let ambiguous = candidates.len() > 1;
        if ambiguous {
            warn!("rendered text {excerpt:?} occurs more than once in the source; using the first");
        }
        let widened = self.widen(found.clone());
        Ok(MappedRange {
            start: widened.start,
            end: widened.end,
            ambiguous,
        })
    }

    /// Maps a range of the markdown source onto the rendered text.
    pub fn source_to_projection(&self, range: Range<usize>) -> Result<MappedRange, MappingError> {
        check_range(&range, self.source_chars.len())?;
        let excerpt = char_slice(&self.source, range);
        let stripped = strip::strip_markdown(excerpt);
        let not_found = || MappingError::NotFound {
            text: stripped.clone(),
            target: MappingTarget::Projection,
        };
        if stripped.trim().is_empty() {
            return Err(not_found());
        }

        let exact = find_occurrences(&self.projection, &stripped, 2);
        let candidates: Vec<Range<usize>> = if exact.is_empty() {
            self.flexible_whitespace_matches(&stripped)
        } else {
            exact
                .into_iter()
                .map(|start| start..start + char_len(&stripped))
                .collect()
        };

        let Some(found) = candidates.first() else {
            warn!("could not find markdown text {stripped:?} in the rendered text");
            return Err(not_found());
        };

        let ambiguous = candidates.len() > 1;
        if ambiguous {
            warn!("markdown text {stripped:?} occurs more than once in the rendered text; using the first");
        }
        Ok(MappedRange {
            start: found.start,
            end: found.end,
            ambiguous,
        })
    }

    fn widen(&self, range: Range<usize>) -> Range<usize> {
        let chars = &self.source_chars;
        let mut start = range.start;
        while start > 0 && WRAPPING_DELIMITERS.contains(&chars[start - 1]) {
            start -= 1;
        }
        let mut end = range.end;
        while end < chars.len() && WRAPPING_DELIMITERS.contains(&chars[end]) {
            end += 1;
        }
        start..end
    }

    /// Searches the projection for `text`'s words separated by any run of
    /// whitespace.
    fn flexible_whitespace_matches(&self, text: &str) -> Vec<Range<usize>> {
        let pattern = text
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let Ok(regex) = Regex::new(&pattern) else {
            return Vec::new();
        };
        regex
            .find_iter(&self.projection)
            .take(2)
            .map(|m| byte_to_char(&self.projection, m.start())..byte_to_char(&self.projection, m.end()))
            .collect()
    }
}

fn check_range(range: &Range<usize>, len: usize) -> Result<(), MappingError> {
    if range.start >= range.end {
        return Err(MappingError::EmptyRange {
            start: range.start,
            end: range.end,
        });
    }
    if range.end > len {
        return Err(MappingError::OutOfBounds {
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

/// Char offsets of up to `limit` occurrences of `needle`, overlapping ones
/// included.
fn find_occurrences(haystack: &str, needle: &str, limit: usize) -> Vec<usize> {
    let mut found = Vec::new();
    if needle.is_empty() {
        return found;
    }
    let mut from = 0;
    while found.len() < limit {
        let Some(offset) = haystack[from..].find(needle) else {
            break;
        };
        let byte = from + offset;
        found.push(byte_to_char(haystack, byte));
        from = byte + haystack[byte..].chars().next().map_or(1, char::len_utf8);
    }
    found
}
