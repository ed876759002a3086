//! Snippet extraction across the two document representations.
//!
//! An explicit 1-based inclusive line range is clamped and sliced exactly,
//! against the live buffer when one exists and against raw stored text
//! otherwise. Without a range, the element's own textual extent is used, with
//! line numbers derived from the live line index or by counting newlines in
//! the raw text. Lines are 0 and offsets -1 when nothing positional is known.

use crate::documents::{DocumentStore, LineDocument};
use crate::index::models::TextRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub text: String,
    /// 1-based inclusive; 0 when unknown.
    pub start_line: u32,
    pub end_line: u32,
    /// Character offsets; -1 when unknown.
    pub start_offset: i64,
    pub end_offset: i64,
}

impl Snippet {
    fn whole(text: String) -> Self {
        Self {
            text,
            start_line: 0,
            end_line: 0,
            start_offset: -1,
            end_offset: -1,
        }
    }
}

/// Extracts a snippet for the file behind `uri`.
///
/// `extent` is the element's own range (None for whole-file targets); the
/// line pair, when present, overrides it.
pub fn build(
    store: &DocumentStore,
    uri: &str,
    extent: Option<TextRange>,
    line_start: Option<u32>,
    line_end: Option<u32>,
) -> Snippet {
    let live = store.get(uri);

    if let (Some(start), Some(end)) = (line_start, line_end) {
        return match live {
            Some(doc) => slice_by_lines(&doc, start, end),
            None => slice_raw_by_lines(&store.load_text(uri), start, end),
        };
    }

    let Some(range) = extent else {
        let text = match live {
            Some(doc) => doc.text().to_string(),
            None => store.load_text(uri),
        };
        return Snippet::whole(text);
    };

    match live {
        Some(doc) => {
            let text = safe_substr(doc.text(), range.start, range.end).to_string();
            let last = range.start.max(range.end.saturating_sub(1));
            Snippet {
                text,
                start_line: doc.line_number_at(range.start) as u32 + 1,
                end_line: doc.line_number_at(last) as u32 + 1,
                start_offset: range.start as i64,
                end_offset: range.end as i64,
            }
        }
        None => {
            let full = store.load_text(uri);
            let text = safe_substr(&full, range.start, range.end).to_string();
            let start_line = 1 + count_newlines(&full, 0, range.start);
            let end_line = 1 + count_newlines(&full, 0, range.end.saturating_sub(1));
            Snippet {
                text,
                start_line,
                end_line,
                start_offset: range.start as i64,
                end_offset: range.end as i64,
            }
        }
    }
}

/// Exact inclusive line slice of a live document, both ends clamped into the
/// document.
pub fn slice_by_lines(doc: &LineDocument, line_start: u32, line_end: u32) -> Snippet {
    let line_count = doc.line_count() as u32;
    let start_line = line_start.clamp(1, line_count);
    let end_line = line_end.clamp(start_line, line_count);
    let start_offset = doc.line_start_offset(start_line as usize - 1);
    let end_offset = doc.line_end_offset(end_line as usize - 1);
    Snippet {
        text: doc.text()[start_offset..end_offset].to_string(),
        start_line,
        end_line,
        start_offset: start_offset as i64,
        end_offset: end_offset as i64,
    }
}

/// Line slice over raw text, same clamping rules as the live-document path.
pub fn slice_raw_by_lines(text: &str, line_start: u32, line_end: u32) -> Snippet {
    let line_count = count_lines(text);
    let start_line = line_start.clamp(1, line_count);
    let end_line = line_end.clamp(start_line, line_count);
    let (start_offset, end_offset) = offsets_for_line_range(text, start_line, end_line);
    Snippet {
        text: safe_substr(text, start_offset, end_offset).to_string(),
        start_line,
        end_line,
        start_offset: start_offset as i64,
        end_offset: end_offset as i64,
    }
}

fn count_lines(text: &str) -> u32 {
    text.bytes().filter(|b| *b == b'\n').count() as u32 + 1
}

/// Newlines in `[from, to_exclusive)`, capped at the text length.
pub fn count_newlines(text: &str, from: usize, to_exclusive: usize) -> u32 {
    let upper = to_exclusive.min(text.len());
    if from >= upper {
        return 0;
    }
    text.as_bytes()[from..upper]
        .iter()
        .filter(|b| **b == b'\n')
        .count() as u32
}

/// Start/end offsets of an inclusive 1-based line range in raw text. The end
/// excludes the trailing line separator.
pub fn offsets_for_line_range(text: &str, line_start: u32, line_end: u32) -> (usize, usize) {
    let bytes = text.as_bytes();
    let mut line: u32 = 1;
    let mut start_offset = 0;
    let mut index = 0;
    while index < bytes.len() {
        if line == line_start {
            start_offset = index;
            break;
        }
        if bytes[index] == b'\n' {
            line += 1;
        }
        index += 1;
    }
    if line_start <= 1 {
        start_offset = 0;
    }
    let mut end_offset = bytes.len();
    while index < bytes.len() {
        if line == line_end && (index + 1 == bytes.len() || bytes[index] == b'\n') {
            end_offset = if bytes[index] == b'\n' { index } else { index + 1 };
            break;
        }
        if bytes[index] == b'\n' {
            line += 1;
        }
        index += 1;
    }
    (start_offset, end_offset.max(start_offset))
}

/// Substring clamped into bounds and snapped outward-safe to char
/// boundaries, so arbitrary stored offsets can never split a code point.
pub fn safe_substr(text: &str, start: usize, end: usize) -> &str {
    let mut begin = start.min(text.len());
    while begin < text.len() && !text.is_char_boundary(begin) {
        begin += 1;
    }
    let mut finish = end.clamp(begin, text.len());
    while finish > begin && !text.is_char_boundary(finish) {
        finish -= 1;
    }
    &text[begin..finish]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "alpha\nbravo\ncharlie\ndelta";

    #[test]
    fn test_slice_by_lines_exact() {
        let doc = LineDocument::new(TEXT, 1);
        let snippet = slice_by_lines(&doc, 2, 3);
        assert_eq!(snippet.text, "bravo\ncharlie");
        assert_eq!((snippet.start_line, snippet.end_line), (2, 3));
        assert_eq!(snippet.start_offset, 6);
        assert_eq!(snippet.end_offset, 19);
    }

    #[test]
    fn test_slice_by_lines_clamps() {
        let doc = LineDocument::new(TEXT, 1);
        let snippet = slice_by_lines(&doc, 0, 99);
        assert_eq!(snippet.text, TEXT);
        assert_eq!((snippet.start_line, snippet.end_line), (1, 4));

        let snippet = slice_by_lines(&doc, 3, 2);
        assert_eq!(snippet.text, "charlie");
        assert_eq!((snippet.start_line, snippet.end_line), (3, 3));
    }

    #[test]
    fn test_raw_slice_matches_live_slice() {
        let doc = LineDocument::new(TEXT, 1);
        for (s, e) in [(1, 1), (1, 4), (2, 3), (4, 4)] {
            let live = slice_by_lines(&doc, s, e);
            let raw = slice_raw_by_lines(TEXT, s, e);
            assert_eq!(live, raw, "range {}:{}", s, e);
        }
    }

    #[test]
    fn test_line_range_round_trip() {
        // Slicing then re-deriving line numbers from the slice offsets must
        // reproduce the requested range.
        let doc = LineDocument::new(TEXT, 1);
        for s in 1..=4u32 {
            for e in s..=4u32 {
                let snippet = slice_by_lines(&doc, s, e);
                let derived_start = doc.line_number_at(snippet.start_offset as usize) as u32 + 1;
                let last = (snippet.end_offset as usize).max(snippet.start_offset as usize + 1) - 1;
                let derived_end = doc.line_number_at(last) as u32 + 1;
                assert_eq!((derived_start, derived_end), (s, e));
            }
        }
    }

    #[test]
    fn test_extent_snippet_with_live_document() {
        let store = DocumentStore::new();
        store.update("file:///a.java", TEXT, 1);
        let snippet = build(
            &store,
            "file:///a.java",
            Some(TextRange::new(6, 19)),
            None,
            None,
        );
        assert_eq!(snippet.text, "bravo\ncharlie");
        assert_eq!((snippet.start_line, snippet.end_line), (2, 3));
        assert_eq!((snippet.start_offset, snippet.end_offset), (6, 19));
    }

    #[test]
    fn test_explicit_lines_override_extent() {
        let store = DocumentStore::new();
        store.update("file:///a.java", TEXT, 1);
        let snippet = build(
            &store,
            "file:///a.java",
            Some(TextRange::new(0, 5)),
            Some(4),
            Some(4),
        );
        assert_eq!(snippet.text, "delta");
        assert_eq!((snippet.start_line, snippet.end_line), (4, 4));
    }

    #[test]
    fn test_whole_file_without_positions() {
        let store = DocumentStore::new();
        store.update("file:///a.java", TEXT, 1);
        let snippet = build(&store, "file:///a.java", None, None, None);
        assert_eq!(snippet.text, TEXT);
        assert_eq!((snippet.start_line, snippet.end_line), (0, 0));
        assert_eq!((snippet.start_offset, snippet.end_offset), (-1, -1));
    }

    #[test]
    fn test_offsets_for_line_range_raw() {
        assert_eq!(offsets_for_line_range(TEXT, 1, 1), (0, 5));
        assert_eq!(offsets_for_line_range(TEXT, 2, 3), (6, 19));
        assert_eq!(offsets_for_line_range(TEXT, 4, 4), (20, 25));
    }

    #[test]
    fn test_safe_substr_respects_char_boundaries() {
        let text = "héllo";
        // Offset 2 falls inside the two-byte é.
        assert_eq!(safe_substr(text, 0, 2), "h");
        assert_eq!(safe_substr(text, 2, 6), "llo");
        assert_eq!(safe_substr(text, 4, 99), "lo");
        assert_eq!(safe_substr(text, 9, 12), "");
    }
}
