use std::fs;
use std::path::{Path, PathBuf};

use crate::AnnotationSpan;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid annotations in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Suffix of the JSON sidecar holding a document's annotations.
pub const SPANS_EXTENSION: &str = "hilite.json";

/// Read a markdown document
pub fn read_document(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(IoError::Io)
}

/// Read the raw annotation JSON stored at `path`, if any.
///
/// The content is returned unparsed so callers can hand it to the lenient
/// restore entry point.
pub fn load_spans(path: &Path) -> Result<Option<String>, IoError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path).map(Some).map_err(IoError::Io)
}

/// Write annotations as pretty JSON
pub fn save_spans(path: &Path, spans: &[AnnotationSpan]) -> Result<(), IoError> {
    let json = crate::spans_to_json(spans).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(path, json).map_err(IoError::Io)
}

/// Where the annotations of `document` live: next to it, or inside
/// `annotations_dir` when one is configured.
pub fn spans_path_for(document: &Path, annotations_dir: Option<&Path>) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let file_name = format!("{stem}.{SPANS_EXTENSION}");

    match annotations_dir {
        Some(dir) => dir.join(file_name),
        None => document.with_file_name(file_name),
    }
}
