//! Document provider: live line-indexed buffers with a raw-content fallback.
//!
//! Editors push unsaved buffer contents into the [`DocumentStore`]; a file
//! with a live buffer gets exact line/offset math from its line index, and
//! everything else falls back to the raw stored bytes.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::classpath;

/// An immutable snapshot of a live buffer with a precomputed line index.
///
/// Line numbers are 0-based internally; a trailing newline opens a final
/// empty line, matching editor line counting.
#[derive(Debug, Clone)]
pub struct LineDocument {
    text: String,
    line_starts: Vec<usize>,
    version: u64,
}

impl LineDocument {
    pub fn new(text: impl Into<String>, version: u64) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            text,
            line_starts,
            version,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Offset of the first character of the 0-based line.
    pub fn line_start_offset(&self, line: usize) -> usize {
        self.line_starts[line]
    }

    /// Offset just past the last character of the 0-based line, excluding
    /// the line separator.
    pub fn line_end_offset(&self, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(next_start) => next_start - 1,
            None => self.text.len(),
        }
    }

    /// 0-based line containing the offset. Offsets past the end land on the
    /// last line.
    pub fn line_number_at(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|start| *start <= offset) - 1
    }
}

/// Overlay of live buffers keyed by location URI. Stale updates (version not
/// newer than the stored one) are ignored.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<String, LineDocument>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, uri: &str, content: &str, version: u64) {
        let mut docs = self.documents.write().unwrap();
        if let Some(existing) = docs.get(uri) {
            if version <= existing.version() {
                return;
            }
        }
        docs.insert(uri.to_string(), LineDocument::new(content, version));
    }

    pub fn get(&self, uri: &str) -> Option<LineDocument> {
        let docs = self.documents.read().unwrap();
        docs.get(uri).cloned()
    }

    pub fn contains(&self, uri: &str) -> bool {
        let docs = self.documents.read().unwrap();
        docs.contains_key(uri)
    }

    pub fn discard(&self, uri: &str) {
        let mut docs = self.documents.write().unwrap();
        docs.remove(uri);
    }

    pub fn clear(&self) {
        let mut docs = self.documents.write().unwrap();
        docs.clear();
    }

    pub fn len(&self) -> usize {
        let docs = self.documents.read().unwrap();
        docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw text behind a URI when no live buffer exists. An IO failure is
    /// downgraded to empty text; the request keeps going.
    pub fn load_text(&self, uri: &str) -> String {
        match classpath::read_uri_text(uri) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(uri, error = %err, "unable to load document text");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_basics() {
        let doc = LineDocument::new("ab\ncd\nef", 1);
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.line_start_offset(0), 0);
        assert_eq!(doc.line_end_offset(0), 2);
        assert_eq!(doc.line_start_offset(1), 3);
        assert_eq!(doc.line_end_offset(2), 8);
    }

    #[test]
    fn test_trailing_newline_opens_empty_line() {
        let doc = LineDocument::new("ab\n", 1);
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.line_start_offset(1), 3);
        assert_eq!(doc.line_end_offset(1), 3);
    }

    #[test]
    fn test_line_number_at() {
        let doc = LineDocument::new("ab\ncd\nef", 1);
        assert_eq!(doc.line_number_at(0), 0);
        assert_eq!(doc.line_number_at(2), 0);
        assert_eq!(doc.line_number_at(3), 1);
        assert_eq!(doc.line_number_at(7), 2);
        assert_eq!(doc.line_number_at(doc.text().len()), 2);
    }

    #[test]
    fn test_store_version_ordering() {
        let store = DocumentStore::new();
        store.update("file:///a.java", "v1", 1);
        store.update("file:///a.java", "v2", 2);
        assert_eq!(store.get("file:///a.java").unwrap().text(), "v2");

        // Stale update is ignored.
        store.update("file:///a.java", "v0", 1);
        assert_eq!(store.get("file:///a.java").unwrap().text(), "v2");
    }

    #[test]
    fn test_store_discard_and_clear() {
        let store = DocumentStore::new();
        store.update("file:///a.java", "a", 1);
        store.update("file:///b.java", "b", 1);
        store.discard("file:///a.java");
        assert!(!store.contains("file:///a.java"));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_text_downgrades_io_failure() {
        let store = DocumentStore::new();
        assert_eq!(store.load_text("file:///definitely/missing.txt"), "");
    }
}
