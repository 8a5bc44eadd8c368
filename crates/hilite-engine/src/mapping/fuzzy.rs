//! Word-by-word search of rendered text inside markdown source.
//!
//! Used when the rendered excerpt does not occur verbatim in the source
//! because formatting splits it, e.g. `work **too** hard` or a link.

use std::ops::Range;

/// Delimiters that may appear inside a word in the source but not in the
/// rendered text.
const INLINE_DELIMITERS: &[char] = &['*', '_', '`', '[', ']', '(', ')'];

/// Locates `words` in `source`, returning at most `limit` char ranges, the
/// earliest first.
pub fn find_words(source: &[char], words: &[Vec<char>], limit: usize) -> Vec<Range<usize>> {
    let Some((first, rest)) = words.split_first() else {
        return Vec::new();
    };
    let Some(&head) = first.first() else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for start in 0..source.len() {
        if found.len() >= limit {
            break;
        }
        if source[start] != head {
            continue;
        }
        let Some(mut pos) = match_word(source, start, first) else {
            continue;
        };
        let mut matched = true;
        for word in rest {
            match next_word(source, pos, word) {
                Some(end) => pos = end,
                None => {
                    matched = false;
                    break;
                }
            }
        }
        if matched {
            found.push(start..pos);
        }
    }
    found
}

/// Matches `word` at `pos`, letting inline delimiters interrupt it after its
/// first char. Returns the end of the match.
fn match_word(source: &[char], pos: usize, word: &[char]) -> Option<usize> {
    let mut idx = pos;
    let mut matched = 0;
    while matched < word.len() {
        let c = *source.get(idx)?;
        if c == word[matched] {
            matched += 1;
        } else if matched == 0 || !INLINE_DELIMITERS.contains(&c) {
            return None;
        }
        idx += 1;
    }
    Some(idx)
}

/// Finds `word` after `pos`, skipping whatever separates words in the source.
fn next_word(source: &[char], mut pos: usize, word: &[char]) -> Option<usize> {
    loop {
        if let Some(end) = match_word(source, pos, word) {
            return Some(end);
        }
        pos = skip_separator(source, pos)?;
    }
}

/// Steps over one separator: a link destination, an ordered-list marker at
/// the start of a line, or a single whitespace or punctuation char.
fn skip_separator(source: &[char], pos: usize) -> Option<usize> {
    let c = *source.get(pos)?;

    if c == ']' && source.get(pos + 1) == Some(&'(') {
        let close = source[pos + 2..].iter().position(|&c| c == ')')?;
        return Some(pos + 2 + close + 1);
    }

    let at_line_start = pos == 0 || source[pos - 1] == '\n';
    if at_line_start && c.is_ascii_digit() {
        let digits = source[pos..].iter().take_while(|c| c.is_ascii_digit()).count();
        if source.get(pos + digits) == Some(&'.') {
            return Some(pos + digits + 1);
        }
    }

    (c.is_whitespace() || c.is_ascii_punctuation()).then_some(pos + 1)
}
