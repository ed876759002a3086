mod cli;
mod mcp;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

// Re-export from lib for internal use
use symbol_lookup::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "symbol_lookup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load { manifest } => {
            cli::load_manifest(&cli.db, &manifest)?;
        }
        Commands::Serve => {
            cli::run_mcp_server(&cli.db).await?;
        }
        Commands::Resolve {
            symbol,
            method,
            params,
            field,
            module,
            lines,
            prefer_source,
            include_inherited,
            force_decompiled,
            allow_resources,
            depth,
        } => {
            cli::resolve_symbol(
                &cli.db,
                symbol,
                method,
                params,
                field,
                module,
                lines,
                prefer_source,
                include_inherited,
                force_decompiled,
                allow_resources,
                depth,
            )?;
        }
        Commands::Stats => {
            cli::show_stats(&cli.db)?;
        }
        Commands::Clear => {
            cli::clear_index(&cli.db)?;
        }
    }

    Ok(())
}
