//! Error types for the RAG service

use thiserror::Error;

use crate::config::ConfigError;

/// Main service error type
#[derive(Error, Debug, Clone)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by embedding providers
#[derive(Error, Debug, Clone)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid embedding response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Embedding provider misconfigured: {reason}")]
    Configuration { reason: String },
}

/// Errors raised by the vector store
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Storage error: {reason}")]
    Storage { reason: String },

    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },
}

/// Errors raised while loading documents into the store
#[derive(Error, Debug, Clone)]
pub enum IngestError {
    #[error("Failed to read PDF {path}: {reason}")]
    PdfRead { path: String, reason: String },

    #[error("No extractable text in {path}")]
    EmptyDocument { path: String },
}

/// Errors raised by the LLM client
#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    #[error("LLM request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid LLM response: {reason}")]
    InvalidResponse { reason: String },

    #[error("No LLM provider configured: {reason}")]
    NotConfigured { reason: String },
}

/// Result type alias for service operations
pub type RagResult<T> = Result<T, RagError>;
