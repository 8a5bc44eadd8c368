use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity shared by every wrapper fragment of one annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh, globally unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MarkerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A serialized annotation: the persisted wire record.
///
/// Offsets are char offsets into the flattened document text, i.e. the
/// concatenation of every leaf text run in document order. `text` is
/// informational; restore re-derives it from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSpan {
    pub marker_id: MarkerId,
    pub tag_id: String,
    #[serde(default)]
    pub text: String,
    pub begin_index: usize,
    pub end_index: usize,
}

impl AnnotationSpan {
    pub fn range(&self) -> Range<usize> {
        self.begin_index..self.end_index
    }

    /// Length in chars. Uses saturating subtraction for inverted spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.begin_index)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serializes spans as the pretty-printed JSON array hosts persist.
pub fn spans_to_json(spans: &[AnnotationSpan]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wire_format_uses_camel_case_field_names() {
        let span = AnnotationSpan {
            marker_id: MarkerId::new("m1"),
            tag_id: "person".to_string(),
            text: "Ada".to_string(),
            begin_index: 4,
            end_index: 7,
        };

        let value = serde_json::to_value(&span).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "markerId": "m1",
                "tagId": "person",
                "text": "Ada",
                "beginIndex": 4,
                "endIndex": 7
            })
        );
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let span: AnnotationSpan = serde_json::from_str(
            r#"{"markerId":"m1","tagId":"t","beginIndex":0,"endIndex":3}"#,
        )
        .unwrap();
        assert_eq!(span.text, "");
        assert_eq!(span.range(), 0..3);
    }

    #[test]
    fn negative_index_is_rejected() {
        let result: Result<AnnotationSpan, _> = serde_json::from_str(
            r#"{"markerId":"m1","tagId":"t","beginIndex":-1,"endIndex":3}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = MarkerId::generate();
        let b = MarkerId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }
}
