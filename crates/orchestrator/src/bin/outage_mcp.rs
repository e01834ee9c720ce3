//! MCP server exposing IODA outage signals and news search over stdio.
//!
//! Stdout carries protocol messages only; logs go to stderr. Example
//! client entry:
//!
//!   { "command": "outage-mcp", "args": ["--config", "configs/config.yaml"] }

use std::path::PathBuf;

use clap::Parser;
use orchestrator::{McpServer, ReporterConfig};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "outage-mcp")]
#[command(about = "Serve outage data and news to MCP clients over stdio")]
struct Args {
    /// YAML config file (default: configs/config.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let config = ReporterConfig::load(args.config.as_deref())?;
    let server = McpServer::from_config(&config);

    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}
