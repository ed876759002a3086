//! Resolved elements as a closed set of tagged variants, each carrying only
//! what its kind needs, plus the source-mapped view selection applied before
//! text extraction.

use crate::classpath::ClasspathLayout;
use crate::error::Result;
use crate::index::models::{Declaration, FieldDecl, MethodDecl, TextRange};
use crate::index::SymbolIndex;
use crate::resolve::candidate::{Candidate, Origin, ResolvedKind};
use crate::resolve::member;

#[derive(Debug, Clone)]
pub enum ResolvedElement {
    Class(Declaration),
    Method {
        owner: Declaration,
        method: MethodDecl,
    },
    Field {
        owner: Declaration,
        field: FieldDecl,
    },
    Resource {
        uri: String,
    },
}

impl ResolvedElement {
    pub fn kind(&self) -> ResolvedKind {
        match self {
            ResolvedElement::Class(_) => ResolvedKind::Class,
            ResolvedElement::Method { .. } => ResolvedKind::Method,
            ResolvedElement::Field { .. } => ResolvedKind::Field,
            ResolvedElement::Resource { .. } => ResolvedKind::Resource,
        }
    }

    pub fn file_uri(&self) -> &str {
        match self {
            ResolvedElement::Class(decl) => &decl.file_uri,
            ResolvedElement::Method { owner, .. } => &owner.file_uri,
            ResolvedElement::Field { owner, .. } => &owner.file_uri,
            ResolvedElement::Resource { uri } => uri,
        }
    }

    /// Textual extent of the element itself; None for whole-file targets and
    /// synthetic entries.
    pub fn range(&self) -> Option<TextRange> {
        match self {
            ResolvedElement::Class(decl) => decl.range,
            ResolvedElement::Method { method, .. } => method.range,
            ResolvedElement::Field { field, .. } => field.range,
            ResolvedElement::Resource { .. } => None,
        }
    }

    /// Qualified key: class name, `Owner#member`, or the resource URI.
    pub fn qualified_key(&self) -> String {
        match self {
            ResolvedElement::Class(decl) => decl.qualified_name.clone(),
            ResolvedElement::Method { owner, method } => {
                format!("{}#{}", owner.qualified_name, method.name)
            }
            ResolvedElement::Field { owner, field } => {
                format!("{}#{}", owner.qualified_name, field.name)
            }
            ResolvedElement::Resource { uri } => uri.clone(),
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            ResolvedElement::Resource { .. } => Origin::Resource,
            ResolvedElement::Class(decl) => origin_of(decl),
            ResolvedElement::Method { owner, .. } => origin_of(owner),
            ResolvedElement::Field { owner, .. } => origin_of(owner),
        }
    }

    fn module(&self, layout: &ClasspathLayout) -> Option<String> {
        let declared = match self {
            ResolvedElement::Class(decl) => decl.module.clone(),
            ResolvedElement::Method { owner, .. } => owner.module.clone(),
            ResolvedElement::Field { owner, .. } => owner.module.clone(),
            ResolvedElement::Resource { .. } => None,
        };
        declared.or_else(|| layout.owner_module(self.file_uri()))
    }

    pub fn candidate(&self, layout: &ClasspathLayout) -> Candidate {
        Candidate {
            symbol_key: self.qualified_key(),
            origin: self.origin(),
            module_name: self.module(layout),
            classpath_entry: layout.classpath_label(self.file_uri()),
            uri: self.file_uri().to_string(),
            kind: self.kind(),
        }
    }

    /// Picks which rendering of the element supplies the text. The ranked
    /// copy stays fixed; this only switches a compiled element to its
    /// source-mapped counterpart when one is attached, independent of how
    /// ranking was configured. `force_decompiled` pins the element's own
    /// rendering.
    pub fn choose_view(self, index: &dyn SymbolIndex, force_decompiled: bool) -> Result<Self> {
        if force_decompiled {
            return Ok(self);
        }
        match &self {
            ResolvedElement::Class(decl) => match mapped_owner(index, decl)? {
                Some(mapped) => Ok(ResolvedElement::Class(mapped)),
                None => Ok(self),
            },
            ResolvedElement::Method { owner, method } => {
                let Some(mapped) = mapped_owner(index, owner)? else {
                    return Ok(self);
                };
                match matching_method(&mapped, method) {
                    Some(counterpart) => Ok(ResolvedElement::Method {
                        owner: mapped,
                        method: counterpart,
                    }),
                    None => Ok(self),
                }
            }
            ResolvedElement::Field { owner, field } => {
                let Some(mapped) = mapped_owner(index, owner)? else {
                    return Ok(self);
                };
                match mapped.fields_by_name(&field.name).first() {
                    Some(counterpart) => Ok(ResolvedElement::Field {
                        field: (*counterpart).clone(),
                        owner: mapped,
                    }),
                    None => Ok(self),
                }
            }
            ResolvedElement::Resource { .. } => Ok(self),
        }
    }
}

fn origin_of(decl: &Declaration) -> Origin {
    if decl.compiled {
        Origin::Decompiled
    } else {
        Origin::Source
    }
}

fn mapped_owner(index: &dyn SymbolIndex, owner: &Declaration) -> Result<Option<Declaration>> {
    match owner.source_mapped_id {
        Some(id) => index.declaration_by_id(id),
        None => Ok(None),
    }
}

/// The counterpart of `method` on the mapped owner: same name and erasure,
/// falling back to same name and arity.
fn matching_method(mapped: &Declaration, method: &MethodDecl) -> Option<MethodDecl> {
    let same_name: Vec<&MethodDecl> =
        mapped.methods.iter().filter(|m| m.name == method.name).collect();
    same_name
        .iter()
        .copied()
        .find(|m| member::same_erasure(m, &method.param_types))
        .or_else(|| {
            same_name
                .iter()
                .copied()
                .find(|m| m.param_types.len() == method.param_types.len())
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::manifest::Manifest;
    use crate::index::models::Scope;
    use crate::index::sqlite::SqliteIndex;

    fn mapped_pair() -> SqliteIndex {
        let index = SqliteIndex::in_memory().unwrap();
        let manifest = Manifest::from_json(
            r#"{
                "declarations": [
                    {
                        "qualified_name": "com.acme.Widget",
                        "file_uri": "jar:///libs/acme.jar!/com/acme/Widget.class",
                        "compiled": true,
                        "source_mapped_uri": "jar:///libs/acme-sources.jar!/com/acme/Widget.java",
                        "methods": [
                            {"name": "render", "param_types": ["int"]},
                            {"name": "render", "param_types": ["int", "java.lang.String"]}
                        ]
                    },
                    {
                        "qualified_name": "com.acme.Widget",
                        "file_uri": "jar:///libs/acme-sources.jar!/com/acme/Widget.java",
                        "methods": [
                            {"name": "render", "param_types": ["int"], "range": {"start": 10, "end": 40}},
                            {"name": "render", "param_types": ["int", "String"], "range": {"start": 50, "end": 90}}
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();
        index.load_manifest(&manifest).unwrap();
        index
    }

    fn compiled_decl(index: &SqliteIndex) -> Declaration {
        index
            .find_exact("com.acme.Widget", &Scope::Project)
            .unwrap()
            .into_iter()
            .find(|d| d.compiled)
            .unwrap()
    }

    #[test]
    fn test_class_view_follows_source_mapping() {
        let index = mapped_pair();
        let decl = compiled_decl(&index);
        let view = ResolvedElement::Class(decl).choose_view(&index, false).unwrap();
        assert!(view.file_uri().contains("acme-sources"));
        assert_eq!(view.origin(), Origin::Source);
    }

    #[test]
    fn test_force_decompiled_pins_own_rendering() {
        let index = mapped_pair();
        let decl = compiled_decl(&index);
        let view = ResolvedElement::Class(decl).choose_view(&index, true).unwrap();
        assert!(view.file_uri().contains("acme.jar"));
        assert_eq!(view.origin(), Origin::Decompiled);
    }

    #[test]
    fn test_method_view_matches_overload_by_erasure() {
        let index = mapped_pair();
        let owner = compiled_decl(&index);
        let method = owner
            .methods
            .iter()
            .find(|m| m.param_types.len() == 2)
            .unwrap()
            .clone();
        let view = ResolvedElement::Method { owner, method }
            .choose_view(&index, false)
            .unwrap();
        // Landed on the two-arg source counterpart, which carries a range.
        assert_eq!(view.range(), Some(TextRange::new(50, 90)));
        assert_eq!(view.qualified_key(), "com.acme.Widget#render");
    }

    #[test]
    fn test_unmapped_element_keeps_itself() {
        let index = SqliteIndex::in_memory().unwrap();
        let decl = Declaration {
            id: 1,
            qualified_name: "A".to_string(),
            file_uri: "file:///p/A.java".to_string(),
            module: None,
            compiled: false,
            source_mapped_id: None,
            range: None,
            methods: vec![],
            fields: vec![],
        };
        let view = ResolvedElement::Class(decl).choose_view(&index, false).unwrap();
        assert_eq!(view.file_uri(), "file:///p/A.java");
    }
}
