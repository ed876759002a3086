//! Pre-built index manifest.
//!
//! The index content is produced elsewhere; this crate only consumes it. A
//! manifest is a plain JSON document with the module/root layout and the
//! declaration table, loaded wholesale into the store.

use serde::Deserialize;

use crate::index::models::{FieldDecl, MethodDecl, ModuleDef, RootDef, TextRange};

#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub modules: Vec<ModuleDef>,
    #[serde(default)]
    pub roots: Vec<RootDef>,
    #[serde(default)]
    pub declarations: Vec<DeclarationEntry>,
}

/// One declaration as it appears in a manifest. The source-mapped counterpart
/// is referenced by file URI and resolved to a row id at load time.
#[derive(Debug, Deserialize)]
pub struct DeclarationEntry {
    pub qualified_name: String,
    pub file_uri: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub compiled: bool,
    /// File URI of the declaration (same qualified name) that carries the
    /// attached-source view of this entry.
    #[serde(default)]
    pub source_mapped_uri: Option<String>,
    #[serde(default)]
    pub range: Option<TextRange>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

impl Manifest {
    /// Parses a manifest from JSON text.
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| crate::error::LookupError::Manifest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = Manifest::from_json(
            r#"{
                "modules": [{"name": "core", "deps": []}],
                "roots": [{"module": "core", "label": "core sources", "path": "/p/core/src"}],
                "declarations": [{
                    "qualified_name": "com.acme.Widget",
                    "file_uri": "file:///p/core/src/com/acme/Widget.java",
                    "module": "core",
                    "range": {"start": 0, "end": 120},
                    "methods": [{"name": "render", "param_types": ["int"]}]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(manifest.modules.len(), 1);
        assert_eq!(manifest.roots.len(), 1);
        assert_eq!(manifest.declarations.len(), 1);
        assert_eq!(manifest.declarations[0].methods[0].param_types, vec!["int"]);
        assert!(!manifest.declarations[0].compiled);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(Manifest::from_json("{not json").is_err());
    }
}
