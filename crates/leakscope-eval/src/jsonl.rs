//! Append-only newline-delimited JSON log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use leakscope_types::errors::LeakscopeError;
use leakscope_types::traits::EpisodeSink;

/// [`EpisodeSink`] backed by a single append-only file.
///
/// Each record becomes one compact JSON line. The file is opened in append
/// mode per write, so concurrent processes logging to the same file
/// interleave whole lines rather than corrupting each other.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a sink writing to `path`, creating parent directories.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, LeakscopeError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LeakscopeError::Sink(format!(
                        "failed to create log directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(Self { path })
    }

    /// The file this sink appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EpisodeSink for JsonlSink {
    fn append(&self, record: &serde_json::Value) -> Result<(), LeakscopeError> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LeakscopeError::Sink(format!("failed to open {}: {e}", self.path.display()))
            })?;
        writeln!(file, "{line}").map_err(|e| {
            LeakscopeError::Sink(format!("failed to append to {}: {e}", self.path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::new(dir.path().join("log.jsonl")).unwrap();

        sink.append(&json!({"turn": 0, "label": "SAFE"})).unwrap();
        sink.append(&json!({"turn": 1, "label": "VIOLATION"})).unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["turn"], 0);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["label"], "VIOLATION");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("log.jsonl");
        let sink = JsonlSink::new(&nested).unwrap();
        sink.append(&json!({"ok": true})).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_never_rewrites_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");

        let sink = JsonlSink::new(&path).unwrap();
        sink.append(&json!({"n": 1})).unwrap();

        // A second sink over the same file keeps appending.
        let reopened = JsonlSink::new(&path).unwrap();
        reopened.append(&json!({"n": 2})).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().next().unwrap().contains("\"n\":1"));
    }
}
