//! The resolution engine: a lookup request in, one immutable result out.
//!
//! Control flow: exact name match, then short-name fallback, then (when
//! allowed) resource path guessing; ranked candidates are narrowed to a
//! member when requested, sliced into a snippet, depth-truncated, and
//! assembled with deduplicated alternatives. Each call is a synchronous,
//! side-effect-free computation inside one read snapshot of the index.

pub mod candidate;
pub mod element;
pub mod member;
pub mod query;
pub mod result;
pub mod snippet;
pub mod truncate;

use std::sync::Arc;

use crate::classpath::ClasspathLayout;
use crate::documents::DocumentStore;
use crate::error::{LookupError, Result};
use crate::index::models::Declaration;
use crate::index::{IndexGate, Scope, SymbolIndex};
use element::ResolvedElement;

pub use candidate::{Candidate, Origin, ResolvedKind};
pub use query::LookupQuery;
pub use result::{LookupResult, LookupStatus};
pub use snippet::Snippet;

pub struct Resolver {
    index: Arc<dyn SymbolIndex>,
    layout: ClasspathLayout,
    documents: Arc<DocumentStore>,
    gate: Arc<IndexGate>,
}

impl Resolver {
    pub fn new(
        index: Arc<dyn SymbolIndex>,
        layout: ClasspathLayout,
        documents: Arc<DocumentStore>,
        gate: Arc<IndexGate>,
    ) -> Self {
        Self {
            index,
            layout,
            documents,
            gate,
        }
    }

    /// Resolves a query to a result. Never panics across this boundary and
    /// never blocks on an index rebuild: malformed queries and internal
    /// faults come back as ERROR results, a rebuild in progress as INDEXING.
    pub fn resolve(&self, query: &LookupQuery) -> LookupResult {
        if let Err(err) = query.validate() {
            return LookupResult::empty(
                LookupStatus::Error,
                err.to_string(),
                Some(query.symbol_name.clone()),
                ResolvedKind::Unknown,
                query.module_name.clone(),
                vec![],
                Some(err.diagnostic()),
            );
        }
        if self.gate.is_building() {
            return self.indexing_result(
                "Index rebuild in progress. Try again when indexing completes.",
                query,
            );
        }
        match self
            .gate
            .with_read_snapshot(|| self.resolve_under_read(query))
        {
            Ok(result) => result,
            Err(LookupError::IndexNotReady) => self.indexing_result(
                "Index became unavailable mid-lookup. Try again later.",
                query,
            ),
            Err(err) => {
                tracing::warn!(symbol = %query.symbol_name, error = %err, "symbol resolution failed");
                LookupResult::empty(
                    LookupStatus::Error,
                    format!("Unexpected error: {}", err),
                    Some(query.symbol_name.clone()),
                    ResolvedKind::Unknown,
                    query.module_name.clone(),
                    vec![],
                    Some(err.diagnostic()),
                )
            }
        }
    }

    fn resolve_under_read(&self, query: &LookupQuery) -> Result<LookupResult> {
        let scope = Scope::for_module(query.module_name.as_deref());
        let mut classes = self.index.find_exact(&query.symbol_name, &scope)?;
        if classes.is_empty() {
            let short = extract_short_name(&query.symbol_name);
            classes = self.index.find_by_short_name(&short, &scope)?;
        }
        if !classes.is_empty() {
            return self.resolve_from_classes(query, classes);
        }
        if query.allow_resource_lookup {
            if let Some(found) = self.resolve_resource(query)? {
                return Ok(found);
            }
        }
        Ok(LookupResult::empty(
            LookupStatus::NotFound,
            format!("No class or resource matched symbol_name: {}", query.symbol_name),
            Some(query.symbol_name.clone()),
            ResolvedKind::Unknown,
            query.module_name.clone(),
            vec![],
            Some("Tried exact and short-name class resolution, then resource lookup (if allowed).".to_string()),
        ))
    }

    fn resolve_from_classes(
        &self,
        query: &LookupQuery,
        classes: Vec<Declaration>,
    ) -> Result<LookupResult> {
        let ordered = candidate::rank_declarations(classes, query);
        let best = ordered[0].clone();
        if let Some(method_name) = query.method_name.clone() {
            return self.resolve_method(query, &ordered, best, &method_name);
        }
        if let Some(field_name) = query.field_name.clone() {
            return self.resolve_field(query, &ordered, best, &field_name);
        }
        self.resolve_class(query, &ordered, best)
    }

    fn resolve_method(
        &self,
        query: &LookupQuery,
        ordered: &[Declaration],
        best: Declaration,
        method_name: &str,
    ) -> Result<LookupResult> {
        let methods = best.methods_by_name(method_name, query.include_inherited);
        if methods.is_empty() {
            return Ok(self.not_found_inside(
                &best,
                query,
                format!("No method named {} found.", method_name),
            ));
        }
        let filtered = member::filter_by_param_types(&methods, query.method_param_types.as_ref());
        let mut final_set = if filtered.is_empty() { methods } else { filtered };
        final_set.sort_by_key(|m| member::signature_of(&best.qualified_name, m));
        let target = final_set[0].clone();
        let target_element = ResolvedElement::Method {
            owner: best.clone(),
            method: target,
        };

        let mut alternatives = vec![target_element.candidate(&self.layout)];
        for overload in final_set.iter().skip(1) {
            let element = ResolvedElement::Method {
                owner: best.clone(),
                method: (*overload).clone(),
            };
            alternatives.push(element.candidate(&self.layout));
        }
        for other in ordered.iter().skip(1) {
            for method in other.methods_by_name(method_name, query.include_inherited) {
                let element = ResolvedElement::Method {
                    owner: other.clone(),
                    method: method.clone(),
                };
                alternatives.push(element.candidate(&self.layout));
            }
        }
        let message = if alternatives.len() > 1 {
            "Resolved method; multiple overloads exist. Returning best match and listing alternatives."
        } else {
            "Resolved method successfully."
        };
        let diagnostics = final_set
            .iter()
            .map(|m| member::signature_of(&best.qualified_name, m))
            .collect::<Vec<_>>()
            .join("\n");

        let symbol_key = target_element.qualified_key();
        self.assemble(
            query,
            target_element,
            ResolvedKind::Method,
            symbol_key,
            message.to_string(),
            alternatives,
            Some(diagnostics),
            "Resolved method has no containing file.",
        )
    }

    fn resolve_field(
        &self,
        query: &LookupQuery,
        ordered: &[Declaration],
        best: Declaration,
        field_name: &str,
    ) -> Result<LookupResult> {
        let fields = best.fields_by_name(field_name);
        if fields.is_empty() {
            return Ok(self.not_found_inside(
                &best,
                query,
                format!("No field named {} found.", field_name),
            ));
        }
        let target_element = ResolvedElement::Field {
            owner: best.clone(),
            field: fields[0].clone(),
        };

        let mut alternatives = vec![target_element.candidate(&self.layout)];
        for other in ordered.iter().skip(1) {
            for field in other.fields_by_name(field_name) {
                let element = ResolvedElement::Field {
                    owner: other.clone(),
                    field: field.clone(),
                };
                alternatives.push(element.candidate(&self.layout));
            }
        }
        let message = if alternatives.len() > 1 {
            "Resolved field; multiple classpath copies exist. Returning best match and listing alternatives."
        } else {
            "Resolved field successfully."
        };

        let symbol_key = target_element.qualified_key();
        self.assemble(
            query,
            target_element,
            ResolvedKind::Field,
            symbol_key,
            message.to_string(),
            alternatives,
            None,
            "Resolved field has no containing file.",
        )
    }

    fn resolve_class(
        &self,
        query: &LookupQuery,
        ordered: &[Declaration],
        best: Declaration,
    ) -> Result<LookupResult> {
        let mut alternatives = Vec::new();
        for other in ordered.iter().skip(1) {
            alternatives.push(ResolvedElement::Class(other.clone()).candidate(&self.layout));
        }
        let message = if ordered.len() > 1 {
            "Resolved class; multiple classpath copies exist. Returning best match and listing alternatives."
        } else {
            "Resolved class successfully."
        };

        let view = ResolvedElement::Class(best)
            .choose_view(self.index.as_ref(), query.force_decompiled)?;
        let symbol_key = view.qualified_key();
        self.assemble_view(
            query,
            view,
            ResolvedKind::Class,
            symbol_key,
            message.to_string(),
            alternatives,
            None,
            "Resolved class has no containing file.",
        )
    }

    /// Member variant of assembly: applies the view selection to the target
    /// element first, keeping the pre-view candidate in the alternatives.
    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        query: &LookupQuery,
        target_element: ResolvedElement,
        kind: ResolvedKind,
        symbol_key: String,
        message: String,
        alternatives: Vec<Candidate>,
        diagnostics: Option<String>,
        missing_file_message: &str,
    ) -> Result<LookupResult> {
        let view = target_element.choose_view(self.index.as_ref(), query.force_decompiled)?;
        self.assemble_view(
            query,
            view,
            kind,
            symbol_key,
            message,
            alternatives,
            diagnostics,
            missing_file_message,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble_view(
        &self,
        query: &LookupQuery,
        view: ResolvedElement,
        kind: ResolvedKind,
        symbol_key: String,
        message: String,
        alternatives: Vec<Candidate>,
        diagnostics: Option<String>,
        missing_file_message: &str,
    ) -> Result<LookupResult> {
        if view.file_uri().trim().is_empty() {
            return Ok(self.problem(missing_file_message, &view));
        }
        let snip = snippet::build(
            &self.documents,
            view.file_uri(),
            view.range(),
            query.line_start,
            query.line_end,
        );
        let text = truncate::truncate_by_depth(&snip.text, query.response_depth).into_owned();
        let primary = view.candidate(&self.layout);
        let deduped = result::dedupe_candidates(primary.clone(), alternatives);
        Ok(LookupResult {
            status: LookupStatus::Ok,
            message,
            source_text: Some(text),
            uri: Some(result::anchor(
                view.file_uri(),
                snip.start_line,
                snip.end_line,
                snip.start_offset,
                snip.end_offset,
            )),
            symbol_key: Some(symbol_key),
            kind,
            module_name: primary.module_name.clone(),
            origin: Some(primary.origin),
            start_line: snip.start_line,
            end_line: snip.end_line,
            start_offset: snip.start_offset,
            end_offset: snip.end_offset,
            alternatives: deduped,
            diagnostics,
        })
    }

    fn resolve_resource(&self, query: &LookupQuery) -> Result<Option<LookupResult>> {
        let attempts = resource_attempts(&query.symbol_name);
        let hits = self
            .layout
            .resolve_resource(&attempts, query.module_name.as_deref());
        if hits.is_empty() {
            return Ok(None);
        }
        let uris: Vec<String> = hits.into_iter().map(|hit| hit.uri).collect();
        let ranked = candidate::rank_resource_uris(uris, &self.layout, query);
        let primary_uri = ranked[0].clone();

        let snip = snippet::build(
            &self.documents,
            &primary_uri,
            None,
            query.line_start,
            query.line_end,
        );
        let text = truncate::truncate_by_depth(&snip.text, query.response_depth).into_owned();
        let primary = ResolvedElement::Resource {
            uri: primary_uri.clone(),
        }
        .candidate(&self.layout);
        let mut alternatives = Vec::new();
        for uri in ranked.iter().skip(1) {
            alternatives.push(
                ResolvedElement::Resource { uri: uri.clone() }.candidate(&self.layout),
            );
        }
        let message = if ranked.len() > 1 {
            "Resolved resource; multiple copies on classpath. Returning best match and listing alternatives."
        } else {
            "Resolved resource successfully."
        };
        // The key is presented as the winning attempt path, not the URI.
        let symbol_key = attempts
            .first()
            .cloned()
            .unwrap_or_else(|| primary_uri.clone());
        let module_name = primary.module_name.clone();
        let deduped = result::dedupe_candidates(primary, alternatives);
        Ok(Some(LookupResult {
            status: LookupStatus::Ok,
            message: message.to_string(),
            source_text: Some(text),
            uri: Some(result::anchor(
                &primary_uri,
                snip.start_line,
                snip.end_line,
                snip.start_offset,
                snip.end_offset,
            )),
            symbol_key: Some(symbol_key),
            kind: ResolvedKind::Resource,
            module_name,
            origin: Some(Origin::Resource),
            start_line: snip.start_line,
            end_line: snip.end_line,
            start_offset: snip.start_offset,
            end_offset: snip.end_offset,
            alternatives: deduped,
            diagnostics: None,
        }))
    }

    fn not_found_inside(
        &self,
        owner: &Declaration,
        query: &LookupQuery,
        message: String,
    ) -> LookupResult {
        LookupResult::empty(
            LookupStatus::NotFound,
            message,
            Some(owner.qualified_name.clone()),
            ResolvedKind::Unknown,
            query.module_name.clone(),
            vec![ResolvedElement::Class(owner.clone()).candidate(&self.layout)],
            None,
        )
    }

    fn problem(&self, message: &str, element: &ResolvedElement) -> LookupResult {
        LookupResult::empty(
            LookupStatus::Error,
            message,
            Some(element.qualified_key()),
            element.kind(),
            None,
            vec![element.candidate(&self.layout)],
            None,
        )
    }

    fn indexing_result(&self, message: &str, query: &LookupQuery) -> LookupResult {
        LookupResult::empty(
            LookupStatus::Indexing,
            message,
            Some(query.symbol_name.clone()),
            ResolvedKind::Unknown,
            query.module_name.clone(),
            vec![],
            Some("Rebuild in progress; not blocking for the index.".to_string()),
        )
    }
}

/// Short name of a possibly qualified symbol: last path segment, then last
/// dot segment.
fn extract_short_name(name: &str) -> String {
    let normalized = if name.contains('/') {
        last_segment(name)
    } else {
        name.to_string()
    };
    match normalized.rfind('.') {
        Some(idx) => normalized[idx + 1..].to_string(),
        None => normalized,
    }
}

fn last_segment(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    match normalized.rfind('/') {
        Some(idx) => normalized[idx + 1..].to_string(),
        None => normalized,
    }
}

fn has_extension(name: &str) -> bool {
    match name.rfind('.') {
        Some(idx) => idx > 0 && idx < name.len() - 1,
        None => false,
    }
}

fn strip_leading_slash(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Resource path guesses for a raw symbol name, most specific first. A name
/// with a path separator is a literal path; otherwise the dotted base is
/// converted to a path, and the bare last segment is tried as well.
fn resource_attempts(raw: &str) -> Vec<String> {
    let mut attempts = Vec::new();
    let path_form = raw.replace('\\', "/");
    if path_form.contains('/') {
        attempts.push(strip_leading_slash(&path_form).to_string());
    } else {
        if has_extension(raw) {
            if let Some(last_dot) = raw.rfind('.') {
                let base = raw[..last_dot].replace('.', "/");
                attempts.push(format!("{}.{}", base, &raw[last_dot + 1..]));
            }
        }
        let bare = last_segment(&path_form);
        if !attempts.contains(&bare) {
            attempts.push(bare);
        }
    }
    attempts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_short_name() {
        assert_eq!(extract_short_name("com.acme.Widget"), "Widget");
        assert_eq!(extract_short_name("Widget"), "Widget");
        assert_eq!(extract_short_name("com/acme/Widget.java"), "java");
        assert_eq!(extract_short_name("a\\b\\Widget"), "a\\b\\Widget");
    }

    #[test]
    fn test_resource_attempts_literal_path() {
        assert_eq!(
            resource_attempts("/com/acme/app.properties"),
            vec!["com/acme/app.properties"]
        );
        assert_eq!(
            resource_attempts("com\\acme\\app.properties"),
            vec!["com/acme/app.properties"]
        );
    }

    #[test]
    fn test_resource_attempts_dotted_name() {
        assert_eq!(
            resource_attempts("com.acme.app.properties"),
            vec!["com/acme/app.properties", "com.acme.app.properties"]
        );
    }

    #[test]
    fn test_resource_attempts_trivial_split_not_duplicated() {
        assert_eq!(resource_attempts("app.properties"), vec!["app.properties"]);
        assert_eq!(resource_attempts("README"), vec!["README"]);
    }
}
