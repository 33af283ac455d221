//! API abstraction traits for the HTTP API
//!
//! Decouples route handlers from the concrete service so tests can run the
//! router against a stub provider.

use async_trait::async_trait;

use super::types::{ChatRequest, ChatResponse, HealthResponse, QueryRequest, QueryResponse};
use crate::types::RagResult;

/// Trait providing API access to the retrieval and generation pipeline
#[async_trait]
pub trait RagApiProvider: Send + Sync {
    /// Search the corpus for chunks relevant to a query
    async fn search_documents(&self, request: QueryRequest) -> RagResult<QueryResponse>;

    /// Answer a question grounded in the corpus
    async fn chat(&self, request: ChatRequest) -> RagResult<ChatResponse>;

    /// Get service health information
    async fn health(&self) -> HealthResponse;
}
