//! HTTP API module
//!
//! Axum routes, request/response types, and the server wrapper for the
//! query, chat, and health endpoints.

pub mod routes;
pub mod server;
pub mod traits;
pub mod types;

pub use server::{ApiDoc, HttpApiConfig, HttpApiServer};
pub use traits::RagApiProvider;
pub use types::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, QueryRequest, QueryResponse,
    QueryResult,
};
