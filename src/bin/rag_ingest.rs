//! Placement policy corpus ingestion CLI
//!
//! Extracts text from PDFs, splits it into chunks, embeds them, and upserts
//! the result into the configured Qdrant collection.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};

use placement_rag::config::Config;
use placement_rag::ingest::{IngestionPipeline, RecursiveCharacterSplitter};
use placement_rag::retrieval::{
    create_embedding_service_from_env, QdrantStoreConfig, QdrantVectorStore, VectorStore,
};

#[derive(Parser)]
#[command(name = "rag-ingest")]
#[command(about = "Ingest placement policy PDFs into the vector store")]
#[command(version)]
struct Cli {
    /// PDF files to ingest
    #[arg(required = true)]
    pdfs: Vec<PathBuf>,

    /// Configuration file path (TOML); environment variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Collection name override
    #[arg(long)]
    collection: Option<String>,

    /// Remove existing points before ingesting
    #[arg(long)]
    clear: bool,

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
    if let Some(collection) = cli.collection {
        config.storage.collection_name = collection;
    }
    config.validate()?;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!(files = cli.pdfs.len(), "Starting corpus ingestion");

    let embedding = create_embedding_service_from_env(config.storage.vector_dimension)?;
    let store: Arc<dyn VectorStore> = Arc::new(QdrantVectorStore::new(QdrantStoreConfig::from(
        &config.storage,
    )));

    store.initialize().await?;

    if cli.clear {
        store.clear().await?;
        info!(
            collection = %config.storage.collection_name,
            "Cleared existing points from collection"
        );
    }

    let pipeline = IngestionPipeline::new(
        RecursiveCharacterSplitter::new(
            config.retrieval.chunk_size,
            config.retrieval.chunk_overlap,
        ),
        embedding,
        Arc::clone(&store),
        config.retrieval.embedding_batch_size,
    );

    let mut total_chunks = 0usize;
    for path in &cli.pdfs {
        let report = pipeline.ingest_pdf(path).await?;
        println!(
            "{}: {} pages, {} chunks, {} stored",
            report.source, report.pages, report.chunks, report.stored
        );
        total_chunks += report.chunks;
    }

    let stats = store.stats().await?;
    println!(
        "Done: {} files, {} chunks ingested, {} points in '{}'",
        cli.pdfs.len(),
        total_chunks,
        stats.points_count,
        stats.collection_name
    );

    Ok(())
}
