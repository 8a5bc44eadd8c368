use std::ops::Range;

use crate::text::is_word_char;

/// Grows `range` outward to the nearest non-word boundaries of `text`.
///
/// An endpoint only moves when the char just inside the selection at that
/// endpoint is a word char, so a selection starting on a space or ending on
/// punctuation keeps that edge. Empty and whitespace-only selections come
/// back unchanged. Offsets are chars and are clamped to `text`.
pub fn expand_to_word_boundaries(text: &str, range: Range<usize>) -> Range<usize> {
    let chars: Vec<char> = text.chars().collect();
    let end = range.end.min(chars.len());
    let start = range.start.min(end);

    let selected = &chars[start..end];
    if selected.iter().all(|c| c.is_whitespace()) {
        return start..end;
    }

    let mut new_start = start;
    if is_word_char(chars[start]) {
        while new_start > 0 && is_word_char(chars[new_start - 1]) {
            new_start -= 1;
        }
    }

    let mut new_end = end;
    if is_word_char(chars[end - 1]) {
        while new_end < chars.len() && is_word_char(chars[new_end]) {
            new_end += 1;
        }
    }

    new_start..new_end
}
