use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};

/// A symbol or resource lookup request.
///
/// `symbol_name` is the only required part: a fully qualified class name, a
/// bare short name, or (with `allow_resource_lookup`) a classpath resource
/// path. The member fields narrow the match; the line pair slices the
/// extracted text; `response_depth` collapses nested blocks past that depth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupQuery {
    pub symbol_name: String,
    #[serde(default)]
    pub method_name: Option<String>,
    #[serde(default)]
    pub method_param_types: Option<Vec<String>>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub module_name: Option<String>,
    /// 1-based inclusive line range; both ends or neither.
    #[serde(default)]
    pub line_start: Option<u32>,
    #[serde(default)]
    pub line_end: Option<u32>,
    #[serde(default)]
    pub prefer_source: bool,
    #[serde(default)]
    pub include_inherited: bool,
    #[serde(default)]
    pub force_decompiled: bool,
    #[serde(default)]
    pub allow_resource_lookup: bool,
    #[serde(default)]
    pub response_depth: Option<u32>,
}

impl LookupQuery {
    pub fn new(symbol_name: impl Into<String>) -> Self {
        Self {
            symbol_name: symbol_name.into(),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, name: impl Into<String>) -> Self {
        self.method_name = Some(name.into());
        self
    }

    pub fn with_param_types(mut self, types: Vec<String>) -> Self {
        self.method_param_types = Some(types);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    pub fn with_module(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    pub fn with_lines(mut self, start: u32, end: u32) -> Self {
        self.line_start = Some(start);
        self.line_end = Some(end);
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.response_depth = Some(depth);
        self
    }

    /// Rejects malformed queries before any index access.
    pub fn validate(&self) -> Result<()> {
        if self.symbol_name.trim().is_empty() {
            return Err(LookupError::InvalidQuery(
                "`symbol_name` must not be blank".to_string(),
            ));
        }
        if self.line_start.is_some() != self.line_end.is_some() {
            return Err(LookupError::InvalidQuery(
                "`line_start` and `line_end` must be given together".to_string(),
            ));
        }
        Ok(())
    }
}
