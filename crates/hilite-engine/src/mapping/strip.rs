use std::sync::OnceLock;

use regex::Regex;

/// Inline and line-level markdown syntax, removed in this order.
const RULES: &[(&str, &str)] = &[
    (r"\*\*([^*]+)\*\*", "$1"),
    (r"\*([^*]+)\*", "$1"),
    (r"__([^_]+)__", "$1"),
    (r"_([^_]+)_", "$1"),
    (r"`([^`]+)`", "$1"),
    (r"\[([^\]]+)\]\([^)]+\)", "$1"),
    (r"(?m)^#+\s+", ""),
    (r"(?m)^[-*+]\s+", ""),
    (r"(?m)^\d+\.\s+", ""),
];

fn rules() -> &'static [(Regex, &'static str)] {
    static COMPILED: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(pattern, replacement)| {
                (Regex::new(pattern).expect("Invalid markdown strip regex"), *replacement)
            })
            .collect()
    })
}

/// Removes markdown formatting from a source excerpt, approximating the
/// rendered text: bold, italic, inline code, links, header and list markers.
pub fn strip_markdown(text: &str) -> String {
    rules()
        .iter()
        .fold(text.to_string(), |acc, (regex, replacement)| {
            regex.replace_all(&acc, *replacement).into_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bold("**work too** hard", "work too hard")]
    #[case::italic("an *odd* one", "an odd one")]
    #[case::underscores("__big__ and _small_", "big and small")]
    #[case::code("run `cargo` now", "run cargo now")]
    #[case::link("see [the docs](https://example.com)", "see the docs")]
    #[case::header("## Heading", "Heading")]
    #[case::bullets("- one\n* two\n+ three", "one\ntwo\nthree")]
    #[case::ordered("1. first\n10. tenth", "first\ntenth")]
    #[case::plain("nothing here", "nothing here")]
    fn strips_formatting(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(strip_markdown(source), expected);
    }
}
