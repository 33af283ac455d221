//! Placement policy RAG HTTP server
//!
//! Serves the query, chat, and health endpoints over the ingested corpus.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};

use placement_rag::api::{HttpApiConfig, HttpApiServer};
use placement_rag::config::{Config, LogFormat};
use placement_rag::RagService;

#[derive(Parser)]
#[command(name = "rag-server")]
#[command(about = "Placement policy RAG HTTP server")]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML); environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address override
    #[arg(long)]
    host: Option<String>,

    /// Port override
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(host) = cli.host {
        config.api.host = host;
    }
    if let Some(port) = cli.port {
        config.api.port = port;
    }
    config.validate()?;

    init_logging(&config, cli.verbose);

    info!("Starting placement policy RAG server");

    let service = Arc::new(RagService::from_config(&config)?);

    // A missing collection is recoverable; health reports it until it is.
    if let Err(e) = service.initialize().await {
        warn!(error = %e, "Vector store initialization failed, serving degraded");
    }

    let server = HttpApiServer::new(HttpApiConfig::from(&config.api)).with_provider(service);

    server.start().await?;

    Ok(())
}

fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(Level::INFO)
    };

    // RUST_LOG directives take precedence over the configured level.
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
