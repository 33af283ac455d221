//! Retrieval layer: embeddings, vector storage, and query-time search
//!
//! The retrieval side of the pipeline is built from three pieces:
//!
//! - **EmbeddingService**: turns text into dense vectors (Hugging Face or
//!   OpenAI-compatible APIs, with a deterministic mock for tests)
//! - **VectorStore**: persists embedded chunks and answers similarity
//!   queries (Qdrant in production, in-memory for tests)
//! - **Retriever**: ties the two together for query-time lookups

pub mod embedding;
pub mod retriever;
pub mod token_counter;
pub mod vector_db;

pub use embedding::{
    create_embedding_service, create_embedding_service_from_env, EmbeddingConfig,
    EmbeddingProvider, HuggingFaceEmbeddingService, OpenAiEmbeddingService,
};
pub use retriever::Retriever;
pub use token_counter::{
    context_limit_for_model, create_token_counter, HeuristicTokenCounter, TiktokenCounter,
    TokenCounter,
};
pub use vector_db::{
    cosine_similarity, EmbeddingService, InMemoryVectorStore, MockEmbeddingService,
    QdrantDistance, QdrantStoreConfig, QdrantVectorStore, VectorStore,
};
