//! MCP surface: one resolution tool plus document overlay updates and index
//! stats. Engine statuses (NOT_FOUND, INDEXING, ERROR) ride inside the
//! result body; only malformed parameters become transport errors.

use std::sync::Arc;

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool, ToolsCapability,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use symbol_lookup::{DocumentStore, LookupQuery, Resolver, SqliteIndex, SymbolIndex};

#[derive(Clone)]
pub struct McpServer {
    resolver: Arc<Resolver>,
    index: Arc<SqliteIndex>,
    documents: Arc<DocumentStore>,
}

impl McpServer {
    pub fn new(
        resolver: Arc<Resolver>,
        index: Arc<SqliteIndex>,
        documents: Arc<DocumentStore>,
    ) -> Self {
        Self {
            resolver,
            index,
            documents,
        }
    }
}

/// Parameters for resolving a symbol or resource to a source snippet
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ResolveSymbolParams {
    /// Fully qualified class name, bare short name, or resource path
    pub symbol_name: String,
    /// Method to narrow the match to
    #[serde(default)]
    pub method_name: Option<String>,
    /// Parameter type names for overload disambiguation (erasure matching)
    #[serde(default)]
    pub method_param_types: Option<Vec<String>>,
    /// Field to narrow the match to
    #[serde(default)]
    pub field_name: Option<String>,
    /// Module scoping hint
    #[serde(default)]
    pub module_name: Option<String>,
    /// 1-based inclusive start line of an explicit slice
    #[serde(default)]
    pub line_start: Option<u32>,
    /// 1-based inclusive end line of an explicit slice
    #[serde(default)]
    pub line_end: Option<u32>,
    /// Rank source-backed classpath copies before compiled ones
    #[serde(default)]
    pub prefer_source: Option<bool>,
    /// Include inherited members when matching a method
    #[serde(default)]
    pub include_inherited: Option<bool>,
    /// Use the element's own rendering even when sources are attached
    #[serde(default)]
    pub force_decompiled: Option<bool>,
    /// Fall back to classpath resource lookup when no class matches
    #[serde(default)]
    pub allow_resource_lookup: Option<bool>,
    /// Collapse brace blocks nested deeper than this depth
    #[serde(default)]
    pub response_depth: Option<u32>,
}

impl From<ResolveSymbolParams> for LookupQuery {
    fn from(params: ResolveSymbolParams) -> Self {
        LookupQuery {
            symbol_name: params.symbol_name,
            method_name: params.method_name,
            method_param_types: params.method_param_types,
            field_name: params.field_name,
            module_name: params.module_name,
            line_start: params.line_start,
            line_end: params.line_end,
            prefer_source: params.prefer_source.unwrap_or(false),
            include_inherited: params.include_inherited.unwrap_or(false),
            force_decompiled: params.force_decompiled.unwrap_or(false),
            allow_resource_lookup: params.allow_resource_lookup.unwrap_or(false),
            response_depth: params.response_depth,
        }
    }
}

/// Parameters for pushing live document buffers
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateDocumentsParams {
    /// Buffers to update
    pub documents: Vec<DocumentUpdate>,
}

/// One live buffer update
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DocumentUpdate {
    /// Location URI of the file
    pub uri: String,
    /// Full buffer content
    pub content: String,
    /// Version for stale-update detection; defaults past the stored version
    #[serde(default)]
    pub version: Option<u64>,
}

/// Empty parameter set
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EmptyParams {}

fn schema_for<T: JsonSchema>() -> Arc<serde_json::Map<String, serde_json::Value>> {
    let schema = schemars::schema_for!(T);
    let value = serde_json::to_value(&schema).expect("Failed to serialize schema");
    match value {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
) -> Result<T, McpError> {
    serde_json::from_value(serde_json::Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| McpError::invalid_params(e.to_string(), None))
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(true),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "symbol-lookup".to_string(),
                title: Some("Symbol Lookup".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Resolves class, member, and resource symbols against a pre-built \
                 project index and returns bounded source snippets with exact \
                 line/offset coordinates."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = vec![
            Tool {
                name: "resolve_symbol".into(),
                title: Some("Resolve Symbol".to_string()),
                description: Some("Resolve a symbol or resource to a source snippet".into()),
                input_schema: schema_for::<ResolveSymbolParams>(),
                output_schema: None,
                annotations: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "update_documents".into(),
                title: Some("Update Documents".to_string()),
                description: Some("Push live editor buffers".into()),
                input_schema: schema_for::<UpdateDocumentsParams>(),
                output_schema: None,
                annotations: None,
                icons: None,
                meta: None,
            },
            Tool {
                name: "index_stats".into(),
                title: Some("Index Stats".to_string()),
                description: Some("Index content counts".into()),
                input_schema: schema_for::<EmptyParams>(),
                output_schema: None,
                annotations: None,
                icons: None,
                meta: None,
            },
        ];

        Ok(ListToolsResult {
            next_cursor: None,
            tools,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = match request.name.as_ref() {
            "resolve_symbol" => {
                let params: ResolveSymbolParams = parse_params(request.arguments)?;
                let query: LookupQuery = params.into();
                let result = self.resolver.resolve(&query);
                let json = serde_json::to_string_pretty(&result).unwrap_or_default();
                CallToolResult::success(vec![Content::text(json)])
            }
            "update_documents" => {
                let params: UpdateDocumentsParams = parse_params(request.arguments)?;
                let mut updated = 0usize;
                for update in params.documents {
                    let version = update.version.unwrap_or_else(|| {
                        self.documents
                            .get(&update.uri)
                            .map(|doc| doc.version() + 1)
                            .unwrap_or(1)
                    });
                    self.documents.update(&update.uri, &update.content, version);
                    updated += 1;
                }
                let json = serde_json::json!({ "updated": updated }).to_string();
                CallToolResult::success(vec![Content::text(json)])
            }
            "index_stats" => match self.index.get_stats() {
                Ok(stats) => {
                    let json = serde_json::to_string_pretty(&stats).unwrap_or_default();
                    CallToolResult::success(vec![Content::text(json)])
                }
                Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
            },
            _ => {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", request.name),
                    None,
                ))
            }
        };
        Ok(result)
    }
}
