//! Acervo server binary
//!
//! Starts the catalog HTTP server.

use acervo_server::{config::ServerConfig, start_server};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

/// Acervo - historical document catalog server
#[derive(Debug, Parser)]
#[command(name = "acervo-server", version, about)]
struct Args {
    /// Load configuration from a TOML file
    #[arg(short, long, env = "ACERVO_CONFIG")]
    config: Option<PathBuf>,

    /// Override the port to listen on
    #[arg(long)]
    bind_port: Option<u16>,

    /// Override the SQLite database path
    #[arg(long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            eprintln!("Warning: No config file specified, using defaults");
            eprintln!("Usage: acervo-server --config <path-to-config.toml>");
            eprintln!();
            ServerConfig::default()
        }
    };

    if let Some(port) = args.bind_port {
        config.bind_port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    start_server(config).await.context("server failed")?;
    Ok(())
}
