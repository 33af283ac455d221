//! HTTP API route handlers

use axum::{extract::State, http::StatusCode, response::Json};
use std::sync::Arc;

use super::traits::RagApiProvider;
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, QueryRequest, QueryResponse,
};

/// Service banner endpoint handler
pub async fn service_banner() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Placement Policy RAG API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "query": "/api/query",
            "chat": "/api/chat",
            "health": "/api/health",
            "docs": "/docs"
        }
    }))
}

/// Document search endpoint handler
#[utoipa::path(
    post,
    path = "/api/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Search completed successfully", body = QueryResponse),
        (status = 422, description = "Invalid request fields", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "retrieval"
)]
pub async fn query_documents(
    State(provider): State<Arc<dyn RagApiProvider>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(reason) = request.validate() {
        return Err(validation_error(reason));
    }

    match provider.search_documents(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Query processing failed: {}", e),
                code: "QUERY_PROCESSING_FAILED".to_string(),
                details: None,
            }),
        )),
    }
}

/// Grounded chat endpoint handler
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer generated successfully", body = ChatResponse),
        (status = 422, description = "Invalid request fields", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "chat"
)]
pub async fn chat(
    State(provider): State<Arc<dyn RagApiProvider>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(reason) = request.validate() {
        return Err(validation_error(reason));
    }

    match provider.chat(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Chat processing failed: {}", e),
                code: "CHAT_PROCESSING_FAILED".to_string(),
                details: None,
            }),
        )),
    }
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Health snapshot", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(provider): State<Arc<dyn RagApiProvider>>,
) -> Json<HealthResponse> {
    Json(provider.health().await)
}

fn validation_error(reason: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: reason,
            code: "VALIDATION_FAILED".to_string(),
            details: None,
        }),
    )
}
