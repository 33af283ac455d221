//! Core data types shared across ingestion, retrieval, and the API

pub mod error;

pub use error::{EmbeddingError, GenerationError, IngestError, RagError, RagResult, StoreError};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a document chunk.
///
/// Derived deterministically from the chunk text (UUIDv5), so the same text
/// always maps to the same vector store point and re-ingestion is idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId(pub Uuid);

impl ChunkId {
    pub fn from_text(text: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, text.as_bytes()))
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ChunkId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Provenance of a chunk within the source corpus
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct ChunkMetadata {
    /// Source document file name
    pub source: String,
    /// 1-based page number the chunk was extracted from
    pub page: u32,
}

/// A contiguous piece of extracted document text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub text: String,
    /// Position of the chunk within its source document
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

/// A chunk paired with its embedding, ready for storage
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// A chunk returned from similarity search with its relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub text: String,
    /// Cosine similarity against the query embedding
    pub score: f32,
    pub metadata: ChunkMetadata,
}

/// Collection-level statistics from the vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection_name: String,
    pub points_count: u64,
    pub dimension: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_deterministic() {
        let a = ChunkId::from_text("eligibility criteria for placements");
        let b = ChunkId::from_text("eligibility criteria for placements");
        assert_eq!(a, b);
    }

    #[test]
    fn test_chunk_id_distinct_for_distinct_text() {
        let a = ChunkId::from_text("chapter one");
        let b = ChunkId::from_text("chapter two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_chunk_id_round_trips_through_display() {
        let id = ChunkId::from_text("round trip");
        let parsed: ChunkId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
