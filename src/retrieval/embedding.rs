//! Embedding providers for the retrieval pipeline
//!
//! Hugging Face's feature-extraction endpoint is the primary provider, with
//! OpenAI-compatible APIs as an alternative and a deterministic mock when no
//! credentials are present. Provider choice comes from the environment.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::vector_db::{EmbeddingService, MockEmbeddingService};
use crate::types::EmbeddingError;

/// Which hosted embedding API to talk to
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingProvider {
    HuggingFace,
    OpenAi,
}

/// Resolved settings for one embedding provider
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub timeout_seconds: u64,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl EmbeddingConfig {
    /// Read provider settings from the environment.
    ///
    /// `EMBEDDING_PROVIDER` picks the provider explicitly; otherwise a
    /// `HUGGINGFACE_API_KEY` selects Hugging Face and an
    /// `EMBEDDING_API_KEY`/`OPENAI_API_KEY` selects OpenAI. `EMBEDDING_MODEL`,
    /// `EMBEDDING_API_BASE_URL`, and `VECTOR_DIMENSION` override the
    /// per-provider defaults. `None` means nothing usable is set and the
    /// caller should run with the mock.
    pub fn from_env() -> Option<Self> {
        let hf_key = env_nonempty("HUGGINGFACE_API_KEY");
        let openai_key =
            env_nonempty("EMBEDDING_API_KEY").or_else(|| env_nonempty("OPENAI_API_KEY"));

        let provider = match env_nonempty("EMBEDDING_PROVIDER") {
            Some(name) => match name.to_lowercase().as_str() {
                "huggingface" | "hf" => EmbeddingProvider::HuggingFace,
                "openai" => EmbeddingProvider::OpenAi,
                _ => return None,
            },
            None if hf_key.is_some() => EmbeddingProvider::HuggingFace,
            None if openai_key.is_some() => EmbeddingProvider::OpenAi,
            None => return None,
        };

        let api_key = match provider {
            EmbeddingProvider::HuggingFace => hf_key,
            EmbeddingProvider::OpenAi => openai_key,
        };

        let (default_model, default_url, default_dim) = match provider {
            EmbeddingProvider::HuggingFace => (
                "sentence-transformers/all-MiniLM-L6-v2",
                "https://api-inference.huggingface.co",
                384,
            ),
            EmbeddingProvider::OpenAi => {
                ("text-embedding-3-small", "https://api.openai.com/v1", 1536)
            }
        };

        let dimension = env_nonempty("VECTOR_DIMENSION")
            .and_then(|d| d.parse().ok())
            .unwrap_or(default_dim);

        Some(Self {
            provider,
            model: env_nonempty("EMBEDDING_MODEL").unwrap_or_else(|| default_model.to_string()),
            base_url: env_nonempty("EMBEDDING_API_BASE_URL")
                .unwrap_or_else(|| default_url.to_string()),
            api_key,
            dimension,
            timeout_seconds: 30,
        })
    }
}

/// Parse a JSON array of numbers into an embedding vector.
fn parse_vector(value: &serde_json::Value, what: &str) -> Result<Vec<f32>, EmbeddingError> {
    value
        .as_array()
        .ok_or_else(|| EmbeddingError::InvalidResponse {
            reason: format!("{what} is not an array"),
        })?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| EmbeddingError::InvalidResponse {
                    reason: format!("{what} contains a non-numeric entry"),
                })
        })
        .collect()
}

fn build_http_client(timeout_seconds: u64) -> Result<reqwest::Client, EmbeddingError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| EmbeddingError::Configuration {
            reason: format!("Could not build HTTP client: {e}"),
        })
}

/// Hugging Face Inference API embedding service using the
/// feature-extraction pipeline endpoint
pub struct HuggingFaceEmbeddingService {
    client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
    dimension: usize,
}

impl HuggingFaceEmbeddingService {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EmbeddingError::Configuration {
                reason: "Hugging Face embeddings require HUGGINGFACE_API_KEY".to_string(),
            })?;

        Ok(Self {
            client: build_http_client(config.timeout_seconds)?,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingService for HuggingFaceEmbeddingService {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut results = self.generate_batch_embeddings(vec![text]).await?;
        results.pop().ok_or_else(|| EmbeddingError::InvalidResponse {
            reason: "Hugging Face returned no embeddings".to_string(),
        })
    }

    async fn generate_batch_embeddings(
        &self,
        texts: Vec<&str>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!(
            "{}/pipeline/feature-extraction/{}",
            self.base_url, self.model
        );

        // wait_for_model avoids 503s while the inference backend warms up
        let payload = serde_json::json!({
            "inputs": texts,
            "options": { "wait_for_model": true },
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmbeddingError::RequestFailed {
                reason: format!("Hugging Face request failed: {e}"),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::RequestFailed {
                reason: format!("Hugging Face returned {status}: {body_text}"),
            });
        }

        let json: serde_json::Value =
            resp.json()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse {
                    reason: format!("Hugging Face response is not JSON: {e}"),
                })?;

        // The feature-extraction pipeline answers with one vector per input,
        // in input order.
        let rows = json
            .as_array()
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "Hugging Face response is not an array of embeddings".to_string(),
            })?;

        let embeddings = rows
            .iter()
            .map(|row| parse_vector(row, "Hugging Face embedding"))
            .collect::<Result<Vec<_>, _>>()?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse {
                reason: format!(
                    "Expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                ),
            });
        }

        Ok(embeddings)
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn max_text_length(&self) -> usize {
        // all-MiniLM-L6-v2 truncates past 512 wordpieces
        512
    }
}

/// Embeddings via an OpenAI `/embeddings` endpoint or a compatible server
pub struct OpenAiEmbeddingService {
    client: reqwest::Client,
    model: String,
    base_url: String,
    api_key: String,
    dimension: usize,
}

impl OpenAiEmbeddingService {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EmbeddingError::Configuration {
                reason: "OpenAI embeddings require EMBEDDING_API_KEY or OPENAI_API_KEY"
                    .to_string(),
            })?;

        Ok(Self {
            client: build_http_client(config.timeout_seconds)?,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            dimension: config.dimension,
        })
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbeddingService {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut results = self.generate_batch_embeddings(vec![text]).await?;
        results.pop().ok_or_else(|| EmbeddingError::InvalidResponse {
            reason: "OpenAI returned no embeddings".to_string(),
        })
    }

    async fn generate_batch_embeddings(
        &self,
        texts: Vec<&str>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let payload = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let resp = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmbeddingError::RequestFailed {
                reason: format!("OpenAI request failed: {e}"),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(EmbeddingError::RequestFailed {
                reason: format!("OpenAI returned {status}: {body_text}"),
            });
        }

        let json: serde_json::Value =
            resp.json()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse {
                    reason: format!("OpenAI response is not JSON: {e}"),
                })?;

        if let Some(usage) = json.get("usage") {
            tracing::debug!(
                prompt_tokens = usage.get("prompt_tokens").and_then(|v| v.as_u64()),
                total_tokens = usage.get("total_tokens").and_then(|v| v.as_u64()),
                "Embedding token usage"
            );
        }

        let items = json
            .get("data")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "OpenAI response is missing the 'data' array".to_string(),
            })?;

        // Items can arrive out of order; "index" says where each belongs.
        let mut indexed = Vec::with_capacity(items.len());
        for item in items {
            let position = item.get("index").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
            let vector = item
                .get("embedding")
                .ok_or_else(|| EmbeddingError::InvalidResponse {
                    reason: "OpenAI response item is missing 'embedding'".to_string(),
                })?;
            indexed.push((position, parse_vector(vector, "OpenAI embedding")?));
        }
        indexed.sort_by_key(|(position, _)| *position);

        if indexed.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse {
                reason: format!("Expected {} embeddings, got {}", texts.len(), indexed.len()),
            });
        }

        Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn max_text_length(&self) -> usize {
        8191 // text-embedding-3 input cap
    }
}

/// Instantiate the provider named by `config`.
pub fn create_embedding_service(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingService>, EmbeddingError> {
    let service: Arc<dyn EmbeddingService> = match config.provider {
        EmbeddingProvider::HuggingFace => Arc::new(HuggingFaceEmbeddingService::new(config)?),
        EmbeddingProvider::OpenAi => Arc::new(OpenAiEmbeddingService::new(config)?),
    };

    tracing::info!(
        provider = ?config.provider,
        model = %config.model,
        url = %config.base_url,
        dimension = config.dimension,
        "Embedding service ready"
    );

    Ok(service)
}

/// Resolve a provider from the environment, taking the deterministic mock
/// when no credentials are configured.
pub fn create_embedding_service_from_env(
    fallback_dimension: usize,
) -> Result<Arc<dyn EmbeddingService>, EmbeddingError> {
    match EmbeddingConfig::from_env() {
        Some(config) => create_embedding_service(&config),
        None => {
            tracing::warn!(
                dimension = fallback_dimension,
                "No embedding credentials found, answers will use the mock embedder"
            );
            Ok(Arc::new(MockEmbeddingService::new(fallback_dimension)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in &[
            "EMBEDDING_PROVIDER",
            "HUGGINGFACE_API_KEY",
            "EMBEDDING_API_KEY",
            "OPENAI_API_KEY",
            "EMBEDDING_API_BASE_URL",
            "EMBEDDING_MODEL",
            "VECTOR_DIMENSION",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_huggingface_provider_defaults() {
        clear_env();
        std::env::set_var("EMBEDDING_PROVIDER", "huggingface");
        std::env::set_var("HUGGINGFACE_API_KEY", "hf-unit-key");

        let config = EmbeddingConfig::from_env().expect("config should resolve");
        assert_eq!(config.provider, EmbeddingProvider::HuggingFace);
        assert_eq!(config.model, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(config.base_url, "https://api-inference.huggingface.co");
        assert_eq!(config.dimension, 384);
        assert_eq!(config.api_key.as_deref(), Some("hf-unit-key"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_openai_provider_defaults() {
        clear_env();
        std::env::set_var("EMBEDDING_PROVIDER", "openai");
        std::env::set_var("OPENAI_API_KEY", "sk-embed-unit");

        let config = EmbeddingConfig::from_env().expect("config should resolve");
        assert_eq!(config.provider, EmbeddingProvider::OpenAi);
        assert_eq!(config.model, "text-embedding-3-small");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.dimension, 1536);
        assert_eq!(config.api_key.as_deref(), Some("sk-embed-unit"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_hf_key_implies_hf_provider() {
        clear_env();
        std::env::set_var("HUGGINGFACE_API_KEY", "hf-detected");

        let config = EmbeddingConfig::from_env().expect("config should resolve");
        assert_eq!(config.provider, EmbeddingProvider::HuggingFace);
        assert_eq!(config.api_key.as_deref(), Some("hf-detected"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_openai_key_implies_openai_provider() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-detected");

        let config = EmbeddingConfig::from_env().expect("config should resolve");
        assert_eq!(config.provider, EmbeddingProvider::OpenAi);
        assert_eq!(config.api_key.as_deref(), Some("sk-detected"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_no_env_resolves_to_none() {
        clear_env();
        assert!(EmbeddingConfig::from_env().is_none());
    }

    #[test]
    #[serial]
    fn test_model_and_dimension_overrides() {
        clear_env();
        std::env::set_var("HUGGINGFACE_API_KEY", "hf-unit-key");
        std::env::set_var("EMBEDDING_MODEL", "sentence-transformers/all-mpnet-base-v2");
        std::env::set_var("VECTOR_DIMENSION", "768");

        let config = EmbeddingConfig::from_env().expect("config should resolve");
        assert_eq!(config.model, "sentence-transformers/all-mpnet-base-v2");
        assert_eq!(config.dimension, 768);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_huggingface_service_requires_api_key() {
        clear_env();

        let config = EmbeddingConfig {
            provider: EmbeddingProvider::HuggingFace,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            api_key: None,
            dimension: 384,
            timeout_seconds: 30,
        };

        assert!(HuggingFaceEmbeddingService::new(&config).is_err());
    }

    #[test]
    #[serial]
    fn test_factory_falls_back_to_mock() {
        clear_env();

        let svc = create_embedding_service_from_env(256).expect("mock fallback should build");
        assert_eq!(svc.embedding_dimension(), 256);
    }

    #[tokio::test]
    #[serial]
    async fn test_mock_fallback_embeds_normalized() {
        clear_env();

        let svc = create_embedding_service_from_env(128).expect("mock fallback should build");
        let emb = svc.generate_embedding("hello world").await.unwrap();
        assert_eq!(emb.len(), 128);

        let magnitude: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_vector_rejects_non_numeric() {
        let bad = serde_json::json!([0.1, "not a number", 0.3]);
        assert!(parse_vector(&bad, "test vector").is_err());

        let good = serde_json::json!([0.25, -0.5, 1.0]);
        assert_eq!(parse_vector(&good, "test vector").unwrap(), vec![0.25, -0.5, 1.0]);
    }
}
