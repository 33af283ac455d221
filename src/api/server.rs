//! Axum server exposing the query, chat, and health endpoints, plus Swagger
//! UI at `/docs` backed by the generated OpenAPI document.

use axum::http::HeaderValue;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::routes::{chat, health_check, query_documents, service_banner};
use super::traits::RagApiProvider;
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, QueryRequest, QueryResponse,
    QueryResult,
};
use crate::config::ApiConfig;
use crate::pipeline::SourceAttribution;
use crate::types::{ChunkMetadata, RagError};

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Exact origin allowed by CORS; permissive when unset
    pub cors_allowed_origin: Option<String>,
    /// Enable request tracing
    pub enable_tracing: bool,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            cors_allowed_origin: Some("http://localhost:5173".to_string()),
            enable_tracing: true,
        }
    }
}

impl From<&ApiConfig> for HttpApiConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            bind_address: config.host.clone(),
            port: config.port,
            enable_cors: config.enable_cors,
            cors_allowed_origin: config.cors_allowed_origin.clone(),
            enable_tracing: config.enable_tracing,
        }
    }
}

/// OpenAPI documentation for the service
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::routes::query_documents,
        crate::api::routes::chat,
        crate::api::routes::health_check,
    ),
    components(schemas(
        QueryRequest,
        QueryResult,
        QueryResponse,
        ChatRequest,
        ChatResponse,
        SourceAttribution,
        ChunkMetadata,
        HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "retrieval", description = "Document search endpoints"),
        (name = "chat", description = "Grounded question answering"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// HTTP API server
pub struct HttpApiServer {
    config: HttpApiConfig,
    provider: Option<Arc<dyn RagApiProvider>>,
}

impl HttpApiServer {
    /// Server with no provider attached yet
    pub fn new(config: HttpApiConfig) -> Self {
        Self {
            config,
            provider: None,
        }
    }

    /// Set the provider backing the API endpoints
    pub fn with_provider(mut self, provider: Arc<dyn RagApiProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Start the HTTP API server
    pub async fn start(&self) -> Result<(), RagError> {
        let app = self.create_router();

        let addr = format!("{}:{}", self.config.bind_address, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| RagError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

        tracing::info!("RAG API listening on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| RagError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Create the axum router with all routes and middleware
    pub fn create_router(&self) -> Router {
        use axum::routing::{get, post};

        let mut router = Router::new()
            .route("/", get(service_banner))
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

        // Add stateful routes if we have a provider
        if let Some(provider) = &self.provider {
            let stateful_router = Router::new()
                .route("/api/query", post(query_documents))
                .route("/api/chat", post(chat))
                .route("/api/health", get(health_check))
                .with_state(provider.clone());

            router = router.merge(stateful_router);
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        if self.config.enable_cors {
            router = router.layer(self.cors_layer());
        }

        router
    }

    fn cors_layer(&self) -> CorsLayer {
        match &self.config.cors_allowed_origin {
            Some(origin) => match origin.parse::<HeaderValue>() {
                Ok(value) => CorsLayer::new()
                    .allow_origin(value)
                    .allow_methods(Any)
                    .allow_headers(Any),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Invalid CORS origin, allowing any");
                    CorsLayer::permissive()
                }
            },
            None => CorsLayer::permissive(),
        }
    }
}
