//! Placement Policy RAG Service
//!
//! Retrieval-augmented question answering over institute placement policy
//! documents: PDFs are split into chunks, embedded, and stored in Qdrant;
//! questions are answered by an LLM grounded in the retrieved chunks.

pub mod api;
pub mod config;
pub mod generation;
pub mod ingest;
pub mod pipeline;
pub mod retrieval;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{RagAnswer, RagPipeline, SourceAttribution};
pub use types::{RagError, RagResult};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use api::traits::RagApiProvider;
use api::types::{
    ChatRequest, ChatResponse, HealthResponse, QueryRequest, QueryResponse, QueryResult,
};
use generation::LlmClient;
use retrieval::{
    create_embedding_service_from_env, create_token_counter, EmbeddingService, QdrantStoreConfig,
    QdrantVectorStore, Retriever, VectorStore,
};

/// Main RAG service wiring embeddings, vector storage, and the LLM together
pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    store: Arc<dyn VectorStore>,
    retriever: Arc<Retriever>,
    pipeline: RagPipeline,
}

impl RagService {
    /// Build the service from configuration and environment credentials.
    ///
    /// Fails when no LLM provider is configured; the embedding service falls
    /// back to the deterministic mock when no embedding key is present.
    pub fn from_config(config: &Config) -> RagResult<Self> {
        let embedding = create_embedding_service_from_env(config.storage.vector_dimension)
            .map_err(RagError::Embedding)?;
        let store: Arc<dyn VectorStore> = Arc::new(QdrantVectorStore::new(
            QdrantStoreConfig::from(&config.storage),
        ));

        let llm = LlmClient::from_env().map_err(RagError::Generation)?;

        Self::with_components(embedding, store, llm, config)
    }

    /// Build the service from explicit components.
    pub fn with_components(
        embedding: Arc<dyn EmbeddingService>,
        store: Arc<dyn VectorStore>,
        llm: LlmClient,
        config: &Config,
    ) -> RagResult<Self> {
        let retriever = Arc::new(Retriever::new(
            Arc::clone(&embedding),
            Arc::clone(&store),
            config.retrieval.top_k,
            config.retrieval.similarity_threshold,
        ));

        let token_counter = create_token_counter(llm.model());
        let pipeline = RagPipeline::new(
            Arc::clone(&retriever),
            llm,
            config.generation.clone(),
            token_counter,
        );

        Ok(Self {
            embedding,
            store,
            retriever,
            pipeline,
        })
    }

    /// Ensure the vector store is reachable and its collection exists.
    pub async fn initialize(&self) -> RagResult<()> {
        self.store.initialize().await.map_err(RagError::Store)
    }

    /// The embedding service in use
    pub fn embedding(&self) -> &Arc<dyn EmbeddingService> {
        &self.embedding
    }

    /// The vector store in use
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }
}

#[async_trait]
impl RagApiProvider for RagService {
    async fn search_documents(&self, request: QueryRequest) -> RagResult<QueryResponse> {
        let chunks = self
            .retriever
            .retrieve(&request.query, request.top_k, request.min_score)
            .await?;

        let results: Vec<QueryResult> = chunks
            .into_iter()
            .map(|chunk| QueryResult {
                text: chunk.text,
                chunk_id: chunk.chunk_id,
                score: chunk.score,
                metadata: chunk.metadata,
            })
            .collect();

        let total_results = results.len();

        Ok(QueryResponse {
            query: request.query,
            results,
            total_results,
        })
    }

    async fn chat(&self, request: ChatRequest) -> RagResult<ChatResponse> {
        let answer = self.pipeline.answer(&request.query, request.top_k).await?;

        Ok(ChatResponse {
            query: answer.query,
            answer: answer.answer,
            sources: answer.sources,
        })
    }

    async fn health(&self) -> HealthResponse {
        let store_ready = matches!(self.store.health_check().await, Ok(true));

        let mut services = HashMap::new();
        services.insert(
            "vector_store".to_string(),
            if store_ready { "ready" } else { "unavailable" }.to_string(),
        );
        services.insert("embeddings".to_string(), "ready".to_string());
        services.insert("llm".to_string(), "ready".to_string());

        let (status, message) = if store_ready {
            ("healthy", "All services operational")
        } else {
            ("degraded", "Vector store is unreachable")
        };

        HealthResponse {
            status: status.to_string(),
            message: message.to_string(),
            services,
            timestamp: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::{IngestionPipeline, PageText, RecursiveCharacterSplitter};
    use retrieval::{InMemoryVectorStore, MockEmbeddingService};
    use serial_test::serial;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.storage.vector_dimension = 32;
        config.retrieval.similarity_threshold = 0.2;
        config
    }

    fn test_llm() -> LlmClient {
        std::env::set_var("GROQ_API_KEY", "test-key");
        let llm = LlmClient::from_env().unwrap();
        std::env::remove_var("GROQ_API_KEY");
        llm
    }

    async fn seeded_service() -> RagService {
        let config = test_config();
        let embedding: Arc<dyn EmbeddingService> = Arc::new(MockEmbeddingService::new(32));
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new(32));

        let ingestion = IngestionPipeline::new(
            RecursiveCharacterSplitter::new(200, 20),
            Arc::clone(&embedding),
            Arc::clone(&store),
            10,
        );
        ingestion
            .ingest_pages(
                "policy.pdf",
                &[PageText {
                    number: 1,
                    text: "Students need an NOC before accepting off-campus offers.".to_string(),
                }],
            )
            .await
            .unwrap();

        RagService::with_components(embedding, store, test_llm(), &config).unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn test_search_documents_returns_hits() {
        let service = seeded_service().await;

        let response = service
            .search_documents(QueryRequest {
                query: "Students need an NOC before accepting off-campus offers.".to_string(),
                top_k: Some(3),
                min_score: Some(0.5),
            })
            .await
            .unwrap();

        assert_eq!(response.total_results, response.results.len());
        assert!(!response.results.is_empty());
        assert!(response.results[0].text.contains("NOC"));
        assert_eq!(response.results[0].metadata.source, "policy.pdf");
    }

    #[tokio::test]
    #[serial]
    async fn test_health_reports_ready_services() {
        let service = seeded_service().await;

        let health = service.health().await;

        assert_eq!(health.status, "healthy");
        assert_eq!(health.services.get("vector_store").unwrap(), "ready");
        assert_eq!(health.services.get("llm").unwrap(), "ready");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    #[serial]
    async fn test_chat_falls_back_when_nothing_relevant() {
        let config = test_config();
        let embedding: Arc<dyn EmbeddingService> = Arc::new(MockEmbeddingService::new(32));
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new(32));
        let service =
            RagService::with_components(embedding, store, test_llm(), &config).unwrap();

        let response = service
            .chat(ChatRequest {
                query: "Anything at all".to_string(),
                top_k: None,
            })
            .await
            .unwrap();

        assert_eq!(response.answer, generation::FALLBACK_ANSWER);
        assert!(response.sources.is_empty());
    }
}
