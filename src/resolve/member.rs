//! Member narrowing: picking a method or field out of a resolved owner.
//!
//! Overloads are disambiguated by erasure comparison: generic argument lists
//! are stripped, trailing varargs normalize to array form, and either the
//! canonical text or the unqualified short names must agree.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::models::MethodDecl;

static GENERIC_ARGS: Lazy<Regex> = Lazy::new(|| Regex::new("<.*>").unwrap());

/// Erasure-normalized form of a type name.
pub fn normalize_type_name(raw: &str) -> String {
    let no_generics = GENERIC_ARGS.replace_all(raw, "");
    no_generics.replace("...", "[]").trim().to_string()
}

/// Unqualified tail of a (possibly dotted) type name.
pub fn short_type_name(text: &str) -> &str {
    match text.rfind('.') {
        Some(idx) => &text[idx + 1..],
        None => text,
    }
}

/// True when the method's parameters match the requested type names under
/// erasure comparison.
pub fn same_erasure(method: &MethodDecl, names: &[String]) -> bool {
    if method.param_types.len() != names.len() {
        return false;
    }
    method
        .param_types
        .iter()
        .zip(names)
        .all(|(actual_raw, expected_raw)| {
            let expected = normalize_type_name(expected_raw);
            let actual = normalize_type_name(actual_raw);
            actual == expected || short_type_name(&actual) == short_type_name(&expected)
        })
}

/// Filters overloads by parameter types. No type names means no filtering;
/// the caller falls back to the unfiltered set when nothing survives.
pub fn filter_by_param_types<'a>(
    methods: &[&'a MethodDecl],
    type_names: Option<&Vec<String>>,
) -> Vec<&'a MethodDecl> {
    match type_names {
        Some(names) if !names.is_empty() => methods
            .iter()
            .copied()
            .filter(|method| same_erasure(method, names))
            .collect(),
        _ => methods.to_vec(),
    }
}

/// Synthetic `Owner#name(paramType1, paramType2)` signature used for the
/// deterministic overload sort and for diagnostics.
pub fn signature_of(owner_qualified_name: &str, method: &MethodDecl) -> String {
    format!(
        "{}#{}({})",
        owner_qualified_name,
        method.name,
        method.param_types.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, params: &[&str]) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            param_types: params.iter().map(|p| p.to_string()).collect(),
            inherited: false,
            range: None,
        }
    }

    #[test]
    fn test_normalize_strips_generics_and_varargs() {
        assert_eq!(normalize_type_name("java.util.List<String>"), "java.util.List");
        assert_eq!(normalize_type_name("java.lang.String..."), "java.lang.String[]");
        assert_eq!(normalize_type_name("  int "), "int");
    }

    #[test]
    fn test_same_erasure_accepts_short_names() {
        let m = method("render", &["int", "java.lang.String"]);
        assert!(same_erasure(&m, &["int".to_string(), "java.lang.String".to_string()]));
        assert!(same_erasure(&m, &["int".to_string(), "String".to_string()]));
        assert!(!same_erasure(&m, &["int".to_string()]));
        assert!(!same_erasure(&m, &["long".to_string(), "String".to_string()]));
    }

    #[test]
    fn test_same_erasure_varargs() {
        let m = method("log", &["java.lang.Object[]"]);
        assert!(same_erasure(&m, &["java.lang.Object...".to_string()]));
    }

    #[test]
    fn test_filter_falls_through_untouched_without_names() {
        let a = method("render", &["int"]);
        let b = method("render", &["int", "java.lang.String"]);
        let all = vec![&a, &b];

        assert_eq!(filter_by_param_types(&all, None).len(), 2);
        assert_eq!(filter_by_param_types(&all, Some(&vec![])).len(), 2);

        let filtered = filter_by_param_types(
            &all,
            Some(&vec!["int".to_string(), "String".to_string()]),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].param_types.len(), 2);
    }

    #[test]
    fn test_signature_of() {
        let m = method("render", &["int", "java.lang.String"]);
        assert_eq!(
            signature_of("com.acme.Widget", &m),
            "com.acme.Widget#render(int, java.lang.String)"
        );
    }
}
