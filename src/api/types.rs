//! HTTP API data structures
//!
//! Request and response types for the query, chat, and health endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pipeline::SourceAttribution;
use crate::types::ChunkMetadata;

/// Bounds accepted for the `top_k` request field
const TOP_K_RANGE: std::ops::RangeInclusive<usize> = 1..=10;

/// Request structure for document search
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// The question or search text
    pub query: String,
    /// Number of results to return (1-10, defaults to the configured value)
    pub top_k: Option<usize>,
    /// Minimum similarity score (0.0-1.0, defaults to the configured value)
    pub min_score: Option<f32>,
}

impl QueryRequest {
    /// Validate field ranges, returning a message suitable for the client.
    pub fn validate(&self) -> Result<(), String> {
        validate_query(&self.query)?;
        validate_top_k(self.top_k)?;
        if let Some(min_score) = self.min_score {
            if !(0.0..=1.0).contains(&min_score) {
                return Err(format!(
                    "min_score must be between 0.0 and 1.0, got {}",
                    min_score
                ));
            }
        }
        Ok(())
    }
}

/// A single search hit
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    /// Chunk text
    pub text: String,
    /// Identifier of the chunk
    pub chunk_id: String,
    /// Similarity score
    pub score: f32,
    /// Source document and page
    pub metadata: ChunkMetadata,
}

/// Response structure for document search
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    /// The query that was searched
    pub query: String,
    /// Matching chunks, best first
    pub results: Vec<QueryResult>,
    /// Number of results returned
    pub total_results: usize,
}

/// Request structure for grounded chat
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The question to answer
    pub query: String,
    /// Number of context chunks to retrieve (1-10)
    pub top_k: Option<usize>,
}

impl ChatRequest {
    /// Validate field ranges, returning a message suitable for the client.
    pub fn validate(&self) -> Result<(), String> {
        validate_query(&self.query)?;
        validate_top_k(self.top_k)
    }
}

/// Response structure for grounded chat
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    /// The question that was asked
    pub query: String,
    /// Generated answer
    pub answer: String,
    /// Chunks the answer was grounded on
    pub sources: Vec<SourceAttribution>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,
    /// Human-readable status summary
    pub message: String,
    /// Per-dependency status
    pub services: HashMap<String, String>,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Version information
    pub version: String,
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Optional details
    pub details: Option<serde_json::Value>,
}

fn validate_query(query: &str) -> Result<(), String> {
    if query.trim().is_empty() {
        return Err("query must not be empty".to_string());
    }
    Ok(())
}

fn validate_top_k(top_k: Option<usize>) -> Result<(), String> {
    if let Some(top_k) = top_k {
        if !TOP_K_RANGE.contains(&top_k) {
            return Err(format!(
                "top_k must be between {} and {}, got {}",
                TOP_K_RANGE.start(),
                TOP_K_RANGE.end(),
                top_k
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_valid() {
        let request = QueryRequest {
            query: "What is the PPO policy?".to_string(),
            top_k: Some(5),
            min_score: Some(0.5),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_query_request_rejects_blank_query() {
        let request = QueryRequest {
            query: "   ".to_string(),
            top_k: None,
            min_score: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_query_request_rejects_out_of_range_top_k() {
        let request = QueryRequest {
            query: "q".to_string(),
            top_k: Some(0),
            min_score: None,
        };
        assert!(request.validate().is_err());

        let request = QueryRequest {
            query: "q".to_string(),
            top_k: Some(11),
            min_score: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_query_request_rejects_out_of_range_min_score() {
        let request = QueryRequest {
            query: "q".to_string(),
            top_k: None,
            min_score: Some(1.5),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_chat_request_validation() {
        let request = ChatRequest {
            query: "What is the NOC process?".to_string(),
            top_k: Some(3),
        };
        assert!(request.validate().is_ok());

        let request = ChatRequest {
            query: String::new(),
            top_k: None,
        };
        assert!(request.validate().is_err());
    }
}
