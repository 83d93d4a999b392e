//! Source buffers: a file's current text plus its cached syntax tree.
//!
//! Invariant: any textual mutation that bypasses a full reparse invalidates
//! the cached tree. The buffer enforces this by dropping the tree whenever
//! the text changes, so stale positions can never be used for further
//! structural matching.

use crate::error::WeaveError;
use crate::parse::SourceParser;
use std::path::{Path, PathBuf};
use tree_sitter::Tree;

/// A file's identity, current text, and (when parsed) its syntax tree
#[derive(Debug)]
pub struct SourceBuffer {
    /// File this buffer was read from and is persisted to
    path: PathBuf,
    /// Current source text
    text: String,
    /// Cached parse of `text`; dropped on every textual mutation
    tree: Option<Tree>,
}

impl SourceBuffer {
    /// Read a buffer from the backing store
    pub fn read(path: &Path) -> Result<Self, WeaveError> {
        let text = std::fs::read_to_string(path).map_err(|e| WeaveError::io(path, e))?;
        Ok(SourceBuffer {
            path: path.to_path_buf(),
            text,
            tree: None,
        })
    }

    /// Build an in-memory buffer (tests and library callers)
    pub fn from_text(path: &Path, text: String) -> Self {
        SourceBuffer {
            path: path.to_path_buf(),
            text,
            tree: None,
        }
    }

    /// File identity of this buffer
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current source text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text, invalidating the cached tree
    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.tree = None;
    }

    /// Parse the current text, reusing the cached tree if still valid
    pub fn ensure_parsed(&mut self, parser: &mut SourceParser) -> Result<(), WeaveError> {
        if self.tree.is_none() {
            self.tree = Some(parser.parse(&self.text)?);
        }
        Ok(())
    }

    /// Cached tree for the current text, if parsed
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Drop the cached tree without touching the text
    pub fn invalidate(&mut self) {
        self.tree = None;
    }

    /// Write the current text back to the backing store
    pub fn persist(&self) -> Result<(), WeaveError> {
        std::fs::write(&self.path, &self.text).map_err(|e| WeaveError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_text_invalidates_tree() {
        let mut parser = SourceParser::new().unwrap();
        let mut buf = SourceBuffer::from_text(Path::new("mem.rs"), "fn a() {}\n".to_string());

        buf.ensure_parsed(&mut parser).unwrap();
        assert!(buf.tree.is_some());

        buf.set_text("fn b() {}\n".to_string());
        assert!(buf.tree.is_none(), "textual mutation must drop the cached tree");
    }

    #[test]
    fn test_read_persist_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sample.rs");
        std::fs::write(&path, "fn main() {}\n").unwrap();

        let mut buf = SourceBuffer::read(&path).unwrap();
        buf.set_text("fn main() { run(); }\n".to_string());
        buf.persist().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "fn main() { run(); }\n"
        );
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = SourceBuffer::read(Path::new("/nonexistent/missing.rs")).unwrap_err();
        assert!(matches!(err, WeaveError::Io { .. }));
    }
}
