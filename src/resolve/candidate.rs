use serde::{Deserialize, Serialize};

use crate::classpath::{is_archive_uri, ClasspathLayout};
use crate::index::models::Declaration;
use crate::resolve::query::LookupQuery;

/// Where an element's text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    Source,
    Decompiled,
    Resource,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Source => "SOURCE",
            Origin::Decompiled => "DECOMPILED",
            Origin::Resource => "RESOURCE",
        }
    }
}

/// What kind of thing a lookup resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolvedKind {
    Class,
    Method,
    Field,
    Resource,
    File,
    Unknown,
}

impl ResolvedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedKind::Class => "CLASS",
            ResolvedKind::Method => "METHOD",
            ResolvedKind::Field => "FIELD",
            ResolvedKind::Resource => "RESOURCE",
            ResolvedKind::File => "FILE",
            ResolvedKind::Unknown => "UNKNOWN",
        }
    }
}

/// One match considered during resolution. Value object; alternatives carry
/// these in ranked order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol_key: String,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    pub classpath_entry: String,
    pub uri: String,
    pub kind: ResolvedKind,
}

/// Orders ambiguous declaration matches, best first. The order is total and
/// reproducible: module affinity, then source preference (only when
/// requested), then loose files before archives, then location URI.
pub fn rank_declarations(mut declarations: Vec<Declaration>, query: &LookupQuery) -> Vec<Declaration> {
    declarations.sort_by(|a, b| rank_key(a, query).cmp(&rank_key(b, query)));
    declarations
}

fn rank_key<'a>(decl: &'a Declaration, query: &LookupQuery) -> (bool, bool, bool, &'a str) {
    (
        decl.module.as_deref() != query.module_name.as_deref(),
        !(query.prefer_source && !decl.compiled),
        is_archive_uri(&decl.file_uri),
        decl.file_uri.as_str(),
    )
}

/// Orders resource hits: module affinity, loose files before archives, URI.
pub fn rank_resource_uris(mut uris: Vec<String>, layout: &ClasspathLayout, query: &LookupQuery) -> Vec<String> {
    uris.sort_by(|a, b| {
        let key = |uri: &String| {
            (
                layout.owner_module(uri).as_deref() != query.module_name.as_deref(),
                is_archive_uri(uri),
                uri.clone(),
            )
        };
        key(a).cmp(&key(b))
    });
    uris
}
