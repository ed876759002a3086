use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::ProgressBar;

use symbol_lookup::{
    ClasspathLayout, DocumentStore, IndexGate, LookupError, LookupQuery, Manifest, Resolver,
    SqliteIndex, SymbolIndex,
};

use crate::error::Result;

#[derive(Parser)]
#[command(name = "symbol-lookup")]
#[command(about = "CLI tool and MCP server for symbol-to-source resolution")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Load a pre-built index manifest
    symbol-lookup load index-manifest.json

    # Resolve a class to its source snippet
    symbol-lookup resolve com.acme.Widget

    # Disambiguate an overload, collapsing bodies below depth 2
    symbol-lookup resolve Widget --method render --param int --param java.lang.String --depth 2

    # Resolve a classpath resource
    symbol-lookup resolve app.properties --resources

    # Slice lines 10 to 40 of a class in a given module
    symbol-lookup resolve com.acme.Widget --module core --lines 10:40

    # Start MCP server
    symbol-lookup serve
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the index database
    #[arg(long, default_value = ".symbol-index.db")]
    pub db: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a pre-built index manifest into the store
    Load {
        /// Path to the manifest JSON file
        manifest: PathBuf,
    },

    /// Resolve a symbol or resource and print the result as JSON
    Resolve {
        /// Fully qualified class name, short name, or resource path
        symbol: String,

        /// Method name to narrow the match to
        #[arg(long)]
        method: Option<String>,

        /// Parameter type name for overload disambiguation (repeatable)
        #[arg(long = "param")]
        params: Vec<String>,

        /// Field name to narrow the match to
        #[arg(long)]
        field: Option<String>,

        /// Module scoping hint
        #[arg(long)]
        module: Option<String>,

        /// Explicit line slice as START:END (1-based, inclusive)
        #[arg(long)]
        lines: Option<String>,

        /// Rank source-backed classpath copies before compiled ones
        #[arg(long)]
        prefer_source: bool,

        /// Include inherited members when matching a method
        #[arg(long)]
        include_inherited: bool,

        /// Use the element's own rendering even when sources are attached
        #[arg(long)]
        force_decompiled: bool,

        /// Fall back to classpath resource lookup when no class matches
        #[arg(long = "resources")]
        allow_resources: bool,

        /// Collapse brace blocks nested deeper than this depth
        #[arg(long)]
        depth: Option<u32>,
    },

    /// Start MCP server
    Serve,

    /// Show index statistics
    Stats,

    /// Clear the index
    Clear,
}

pub fn load_manifest(db_path: &PathBuf, manifest_path: &PathBuf) -> Result<()> {
    let index = SqliteIndex::new(db_path)?;
    let text = fs::read_to_string(manifest_path)?;
    let manifest = Manifest::from_json(&text)?;

    let progress = ProgressBar::new_spinner();
    progress.set_message(format!("Loading {}", manifest_path.display()));
    progress.enable_steady_tick(Duration::from_millis(100));
    let loaded = index.load_manifest(&manifest)?;
    progress.finish_and_clear();

    println!(
        "Loaded {} declarations, {} modules, {} classpath roots",
        loaded,
        manifest.modules.len(),
        manifest.roots.len()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn resolve_symbol(
    db_path: &PathBuf,
    symbol: String,
    method: Option<String>,
    params: Vec<String>,
    field: Option<String>,
    module: Option<String>,
    lines: Option<String>,
    prefer_source: bool,
    include_inherited: bool,
    force_decompiled: bool,
    allow_resources: bool,
    depth: Option<u32>,
) -> Result<()> {
    let (line_start, line_end) = match lines {
        Some(range) => {
            let (start, end) = parse_lines(&range)?;
            (Some(start), Some(end))
        }
        None => (None, None),
    };
    let query = LookupQuery {
        symbol_name: symbol,
        method_name: method,
        method_param_types: if params.is_empty() { None } else { Some(params) },
        field_name: field,
        module_name: module,
        line_start,
        line_end,
        prefer_source,
        include_inherited,
        force_decompiled,
        allow_resource_lookup: allow_resources,
        response_depth: depth,
    };

    let resolver = build_resolver(db_path)?;
    let result = resolver.resolve(&query);
    println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
    Ok(())
}

pub async fn run_mcp_server(db_path: &PathBuf) -> Result<()> {
    use crate::mcp::McpServer;
    use rmcp::ServiceExt;

    let index = Arc::new(SqliteIndex::new(db_path)?);
    let layout = ClasspathLayout::from_index(&index)?;
    let documents = Arc::new(DocumentStore::new());
    let gate = Arc::new(IndexGate::new());
    let resolver = Arc::new(Resolver::new(
        index.clone(),
        layout,
        documents.clone(),
        gate,
    ));
    let server = McpServer::new(resolver, index, documents);

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = server
        .serve(transport)
        .await
        .map_err(|e| LookupError::Mcp(e.to_string()))?;
    service
        .waiting()
        .await
        .map_err(|e| LookupError::Mcp(e.to_string()))?;

    Ok(())
}

pub fn show_stats(db_path: &PathBuf) -> Result<()> {
    let index = SqliteIndex::new(db_path)?;
    let stats = index.get_stats()?;
    println!("Declarations: {}", stats.declarations);
    println!("Methods:      {}", stats.methods);
    println!("Fields:       {}", stats.fields);
    println!("Modules:      {}", stats.modules);
    println!("Roots:        {}", stats.roots);
    Ok(())
}

pub fn clear_index(db_path: &PathBuf) -> Result<()> {
    let index = SqliteIndex::new(db_path)?;
    index.clear()?;
    println!("Index cleared");
    Ok(())
}

fn build_resolver(db_path: &PathBuf) -> Result<Resolver> {
    let index = Arc::new(SqliteIndex::new(db_path)?);
    let layout = ClasspathLayout::from_index(&index)?;
    let documents = Arc::new(DocumentStore::new());
    let gate = Arc::new(IndexGate::new());
    Ok(Resolver::new(index, layout, documents, gate))
}

fn parse_lines(range: &str) -> Result<(u32, u32)> {
    let parse = |value: &str| -> Result<u32> {
        value
            .trim()
            .parse()
            .map_err(|_| LookupError::InvalidQuery(format!("invalid line number: {}", value)))
    };
    let (start, end) = range
        .split_once(':')
        .ok_or_else(|| LookupError::InvalidQuery("--lines expects START:END".to_string()))?;
    Ok((parse(start)?, parse(end)?))
}
