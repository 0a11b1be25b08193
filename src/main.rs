//! Binary entry point for axons.
//!
//! Hosts the memory graph behind an MCP stdio server, and offers a couple
//! of maintenance subcommands for inspecting a database from the shell.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use axons::config::AxonsConfig;
use axons::mcp::McpServer;
use axons::service::MemoryGraphService;

#[derive(Parser)]
#[command(name = "axons", version, about = "Graph-structured associative memory for agents")]
struct Cli {
    /// Path to the graph database.
    #[arg(long, env = "AXONS_DB_PATH", global = true)]
    db_path: Option<PathBuf>,

    /// Path to a plasticity configuration JSON file.
    #[arg(long, global = true)]
    plasticity_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the memory graph over MCP stdio.
    Serve,
    /// Initialize the database schema and exit.
    Init,
    /// Print connection statistics and node counts.
    Stats,
}

fn open_service(cli: &Cli) -> anyhow::Result<MemoryGraphService> {
    let config = AxonsConfig::resolve(cli.db_path.clone(), cli.plasticity_config.as_deref())
        .context("resolving configuration")?;
    MemoryGraphService::open(&config.db_path, config.plasticity)
        .with_context(|| format!("opening memory graph at {}", config.db_path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => {
            let service = open_service(&cli)?;
            tracing::info!("axons MCP server listening on stdio");
            McpServer::new(service).run_stdio().await?;
        }
        Command::Init => {
            let service = open_service(&cli)?;
            drop(service);
            eprintln!("schema initialized");
        }
        Command::Stats => {
            let service = open_service(&cli)?;
            let stats = service.get_connection_statistics()?;
            let counts = service.get_node_counts()?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "connections": stats,
                "nodes": counts,
            }))?);
        }
    }
    Ok(())
}
