//! Offline corpus ingestion: PDF → pages → chunks → embeddings → store

pub mod pdf;
pub mod splitter;

pub use pdf::{extract_pages, PageText};
pub use splitter::RecursiveCharacterSplitter;

use std::path::Path;
use std::sync::Arc;

use crate::retrieval::{EmbeddingService, VectorStore};
use crate::types::{
    ChunkId, ChunkMetadata, DocumentChunk, EmbeddedChunk, IngestError, RagError, RagResult,
};

/// Summary of a single document ingestion
#[derive(Debug, Clone)]
pub struct IngestionReport {
    /// Source document file name
    pub source: String,
    /// Pages with extractable text
    pub pages: usize,
    /// Chunks produced by splitting
    pub chunks: usize,
    /// Points written to the vector store
    pub stored: usize,
}

/// Drives a document through extraction, splitting, embedding, and storage.
pub struct IngestionPipeline {
    splitter: RecursiveCharacterSplitter,
    embedding: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
    embedding_batch_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        splitter: RecursiveCharacterSplitter,
        embedding: Arc<dyn EmbeddingService>,
        store: Arc<dyn VectorStore>,
        embedding_batch_size: usize,
    ) -> Self {
        Self {
            splitter,
            embedding,
            store,
            embedding_batch_size: embedding_batch_size.max(1),
        }
    }

    /// Ingest a PDF file end to end.
    pub async fn ingest_pdf(&self, path: &Path) -> RagResult<IngestionReport> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let pages = pdf::extract_pages(path).map_err(RagError::Ingest)?;

        self.ingest_pages(&source, &pages).await
    }

    /// Ingest already-extracted pages under a source name.
    ///
    /// Chunk ids derive from chunk text, so re-ingesting the same document
    /// overwrites existing points instead of duplicating them.
    pub async fn ingest_pages(
        &self,
        source: &str,
        pages: &[PageText],
    ) -> RagResult<IngestionReport> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0usize;

        for page in pages {
            for text in self.splitter.split_text(&page.text) {
                chunks.push(DocumentChunk {
                    id: ChunkId::from_text(&text),
                    text,
                    chunk_index,
                    metadata: ChunkMetadata {
                        source: source.to_string(),
                        page: page.number,
                    },
                });
                chunk_index += 1;
            }
        }

        if chunks.is_empty() {
            return Err(RagError::Ingest(IngestError::EmptyDocument {
                path: source.to_string(),
            }));
        }

        tracing::info!(
            source,
            pages = pages.len(),
            chunks = chunks.len(),
            "Split document into chunks"
        );

        let mut embedded = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.embedding_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self
                .embedding
                .generate_batch_embeddings(texts)
                .await
                .map_err(RagError::Embedding)?;

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                embedded.push(EmbeddedChunk {
                    chunk: chunk.clone(),
                    embedding,
                });
            }
        }

        self.store.initialize().await.map_err(RagError::Store)?;
        let stored = self
            .store
            .upsert_chunks(&embedded)
            .await
            .map_err(RagError::Store)?;

        tracing::info!(source, stored, "Stored embedded chunks");

        Ok(IngestionReport {
            source: source.to_string(),
            pages: pages.len(),
            chunks: chunks.len(),
            stored,
        })
    }
}
