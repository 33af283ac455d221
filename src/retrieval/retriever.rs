//! Query-time retrieval: embed the query, search the vector store

use std::sync::Arc;

use crate::types::{RagError, RagResult, ScoredChunk};

use super::vector_db::{EmbeddingService, VectorStore};

/// Retrieves the most relevant chunks for a query.
///
/// Holds the configured defaults for result count and minimum score; callers
/// may override either per request.
pub struct Retriever {
    embedding: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
    default_top_k: usize,
    default_min_score: f32,
}

impl Retriever {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        store: Arc<dyn VectorStore>,
        default_top_k: usize,
        default_min_score: f32,
    ) -> Self {
        Self {
            embedding,
            store,
            default_top_k,
            default_min_score,
        }
    }

    /// Retrieve scored chunks for a query.
    ///
    /// `top_k` and `min_score` fall back to the configured defaults when not
    /// given. Results arrive ordered by score descending.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: Option<usize>,
        min_score: Option<f32>,
    ) -> RagResult<Vec<ScoredChunk>> {
        let limit = top_k.unwrap_or(self.default_top_k);
        let threshold = min_score.unwrap_or(self.default_min_score);

        let query_embedding = self
            .embedding
            .generate_embedding(query)
            .await
            .map_err(RagError::Embedding)?;

        let results = self
            .store
            .search(query_embedding, limit, Some(threshold))
            .await
            .map_err(RagError::Store)?;

        tracing::debug!(
            query_length = query.len(),
            limit,
            threshold,
            results = results.len(),
            "Retrieved chunks for query"
        );

        Ok(results)
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }
}
