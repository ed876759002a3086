use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::resolve::candidate::{Candidate, Origin, ResolvedKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LookupStatus {
    Ok,
    NotFound,
    Indexing,
    Error,
}

/// The one response shape of the engine: status, primary match, ranked
/// alternatives (primary first, deduplicated by URI), and diagnostics.
/// Constructed once per query and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    pub status: LookupStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    /// Location anchor: base URI plus a line or offset suffix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_key: Option<String>,
    pub kind: ResolvedKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    pub start_line: u32,
    pub end_line: u32,
    pub start_offset: i64,
    pub end_offset: i64,
    #[serde(default)]
    pub alternatives: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl LookupResult {
    pub fn is_ok(&self) -> bool {
        self.status == LookupStatus::Ok
    }

    /// A result with no snippet and no position; the non-OK statuses share
    /// this shape.
    pub fn empty(
        status: LookupStatus,
        message: impl Into<String>,
        symbol_key: Option<String>,
        kind: ResolvedKind,
        module_name: Option<String>,
        alternatives: Vec<Candidate>,
        diagnostics: Option<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            source_text: None,
            uri: None,
            symbol_key,
            kind,
            module_name,
            origin: None,
            start_line: 0,
            end_line: 0,
            start_offset: -1,
            end_offset: -1,
            alternatives,
            diagnostics,
        }
    }
}

/// Alternatives keyed by location URI, insertion-ordered, first-wins. The
/// primary entry always leads and survives even when a later alternative
/// shares its URI.
pub fn dedupe_candidates(primary: Candidate, rest: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(primary.uri.clone());
    let mut out = vec![primary];
    for candidate in rest {
        if seen.insert(candidate.uri.clone()) {
            out.push(candidate);
        }
    }
    out
}

/// Location anchor for a span: `#L<start>` / `#L<start>-L<end>` when line
/// numbers are known, `#offset=<start>` / `#offset=<start>-<end>` when only
/// offsets are, the bare URI otherwise.
pub fn anchor(base_uri: &str, start_line: u32, end_line: u32, start_offset: i64, end_offset: i64) -> String {
    if base_uri.trim().is_empty() {
        return base_uri.to_string();
    }
    if start_line > 0 {
        if end_line > start_line {
            return format!("{}#L{}-L{}", base_uri, start_line, end_line);
        }
        return format!("{}#L{}", base_uri, start_line);
    }
    if start_offset >= 0 {
        if end_offset > start_offset {
            return format!("{}#offset={}-{}", base_uri, start_offset, end_offset);
        }
        return format!("{}#offset={}", base_uri, start_offset);
    }
    base_uri.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(key: &str, uri: &str) -> Candidate {
        Candidate {
            symbol_key: key.to_string(),
            origin: Origin::Source,
            module_name: None,
            classpath_entry: String::new(),
            uri: uri.to_string(),
            kind: ResolvedKind::Class,
        }
    }

    #[test]
    fn test_dedupe_keeps_primary_on_conflict() {
        let primary = candidate("primary", "file:///a.java");
        let deduped = dedupe_candidates(
            primary.clone(),
            vec![
                candidate("shadow", "file:///a.java"),
                candidate("other", "file:///b.java"),
            ],
        );
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].symbol_key, "primary");
        assert_eq!(deduped[1].uri, "file:///b.java");
    }

    #[test]
    fn test_dedupe_preserves_first_seen_order() {
        let deduped = dedupe_candidates(
            candidate("p", "file:///p.java"),
            vec![
                candidate("b", "file:///b.java"),
                candidate("a", "file:///a.java"),
                candidate("b2", "file:///b.java"),
            ],
        );
        let uris: Vec<_> = deduped.iter().map(|c| c.uri.as_str()).collect();
        assert_eq!(uris, vec!["file:///p.java", "file:///b.java", "file:///a.java"]);
    }

    #[test]
    fn test_anchor_prefers_lines_over_offsets() {
        assert_eq!(anchor("file:///a", 3, 7, 10, 90), "file:///a#L3-L7");
        assert_eq!(anchor("file:///a", 3, 3, 10, 90), "file:///a#L3");
        assert_eq!(anchor("file:///a", 0, 0, 10, 90), "file:///a#offset=10-90");
        assert_eq!(anchor("file:///a", 0, 0, 10, 10), "file:///a#offset=10");
        assert_eq!(anchor("file:///a", 0, 0, -1, -1), "file:///a");
        assert_eq!(anchor("", 3, 7, 0, 0), "");
    }
}
