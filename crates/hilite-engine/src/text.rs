//! Char-offset helpers over UTF-8 strings.
//!
//! Every offset the engine exposes counts Unicode scalar values (chars), not
//! bytes. These helpers convert between the two at the edges.

use std::ops::Range;

/// Number of chars in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the char at `char_idx`, or `s.len()` when past the end.
pub fn char_to_byte(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

/// Char index of a byte offset. `byte_idx` must sit on a char boundary.
pub fn byte_to_char(s: &str, byte_idx: usize) -> usize {
    s[..byte_idx.min(s.len())].chars().count()
}

/// Slices `s` by a char range, clamping both ends to the string.
pub fn char_slice(s: &str, range: Range<usize>) -> &str {
    let start = char_to_byte(s, range.start);
    let end = char_to_byte(s, range.end).max(start);
    &s[start..end]
}

/// Splits `s` at a char index.
pub fn split_at_char(s: &str, char_idx: usize) -> (&str, &str) {
    s.split_at(char_to_byte(s, char_idx))
}

/// Word characters for boundary expansion: alphanumerics and underscore.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Count of leading whitespace chars.
pub fn leading_whitespace(s: &str) -> usize {
    s.chars().take_while(|c| c.is_whitespace()).count()
}

/// Count of trailing whitespace chars.
pub fn trailing_whitespace(s: &str) -> usize {
    s.chars().rev().take_while(|c| c.is_whitespace()).count()
}
