use serde::{Deserialize, Serialize};

/// Search scope for name lookups: the whole project, or one module plus its
/// dependencies and libraries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Project,
    Module(String),
}

impl Scope {
    /// Builds a scope from an optional module hint. Blank names degrade to
    /// project scope, matching how an unknown module is treated downstream.
    pub fn for_module(module_name: Option<&str>) -> Self {
        match module_name {
            Some(name) if !name.trim().is_empty() => Scope::Module(name.to_string()),
            _ => Scope::Project,
        }
    }
}

/// Half-open character offset range `[start, end)` within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A method member of an indexed declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    /// Canonical parameter type names, in declaration order.
    pub param_types: Vec<String>,
    /// True when the member comes from a supertype rather than the
    /// declaration itself.
    #[serde(default)]
    pub inherited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
}

/// A field member of an indexed declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
}

/// An indexed class declaration, fully hydrated with its member lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub id: i64,
    pub qualified_name: String,
    pub file_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// True when the declaration is backed by a compiled/binary rendering.
    pub compiled: bool,
    /// Row id of the source-mapped counterpart, when attached sources exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_mapped_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

impl Declaration {
    /// Last dot-segment of the qualified name.
    pub fn short_name(&self) -> &str {
        match self.qualified_name.rfind('.') {
            Some(idx) => &self.qualified_name[idx + 1..],
            None => &self.qualified_name,
        }
    }

    /// Methods with the given name. Inherited members are included only on
    /// request.
    pub fn methods_by_name(&self, name: &str, include_inherited: bool) -> Vec<&MethodDecl> {
        self.methods
            .iter()
            .filter(|m| m.name == name && (include_inherited || !m.inherited))
            .collect()
    }

    /// Own fields with the given exact name.
    pub fn fields_by_name(&self, name: &str) -> Vec<&FieldDecl> {
        self.fields.iter().filter(|f| f.name == name).collect()
    }
}

/// Counts reported by the `stats` surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub declarations: usize,
    pub methods: usize,
    pub fields: usize,
    pub modules: usize,
    pub roots: usize,
}

/// A module known to the classpath layout, with its direct dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    #[serde(default)]
    pub deps: Vec<String>,
}

/// A classpath root: a loose directory or a zip archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootDef {
    /// Owning module, or None for project-level library roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Presentable classpath-entry label.
    pub label: String,
    pub path: String,
    #[serde(default)]
    pub archive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, inherited: bool) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            param_types: vec![],
            inherited,
            range: None,
        }
    }

    #[test]
    fn test_scope_for_module() {
        assert_eq!(Scope::for_module(None), Scope::Project);
        assert_eq!(Scope::for_module(Some("  ")), Scope::Project);
        assert_eq!(
            Scope::for_module(Some("core")),
            Scope::Module("core".to_string())
        );
    }

    #[test]
    fn test_short_name() {
        let decl = Declaration {
            id: 1,
            qualified_name: "com.acme.Widget".to_string(),
            file_uri: "file:///src/Widget.java".to_string(),
            module: None,
            compiled: false,
            source_mapped_id: None,
            range: None,
            methods: vec![],
            fields: vec![],
        };
        assert_eq!(decl.short_name(), "Widget");
    }

    #[test]
    fn test_methods_by_name_inherited_filter() {
        let decl = Declaration {
            id: 1,
            qualified_name: "A".to_string(),
            file_uri: String::new(),
            module: None,
            compiled: false,
            source_mapped_id: None,
            range: None,
            methods: vec![method("run", false), method("run", true), method("stop", false)],
            fields: vec![],
        };
        assert_eq!(decl.methods_by_name("run", false).len(), 1);
        assert_eq!(decl.methods_by_name("run", true).len(), 2);
        assert_eq!(decl.methods_by_name("missing", true).len(), 0);
    }
}
