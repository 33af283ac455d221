//! Service configuration
//!
//! Settings load from a TOML file or from environment variables, with
//! validation covering the ranges the pipeline depends on.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Could not read config file: {message}")]
    IoError { message: String },

    #[error("Config file did not parse: {message}")]
    ParseError { message: String },
}

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP API configuration
    pub api: ApiConfig,
    /// Vector store configuration
    pub storage: StorageConfig,
    /// Retrieval and chunking configuration
    pub retrieval: RetrievalConfig,
    /// Answer generation configuration
    pub generation: GenerationConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API server host
    pub host: String,
    /// API server port
    pub port: u16,
    /// Enable CORS headers
    pub enable_cors: bool,
    /// Exact origin allowed by CORS; `None` means allow any origin
    pub cors_allowed_origin: Option<String>,
    /// Enable request tracing middleware
    pub enable_tracing: bool,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Qdrant server URL
    pub url: String,
    /// Qdrant API key (securely handled)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Collection holding the document corpus
    pub collection_name: String,
    /// Embedding vector dimension
    pub vector_dimension: usize,
    /// Upsert batch size
    pub batch_size: usize,
    /// Client timeout in seconds
    pub timeout_seconds: u64,
}

/// Retrieval and chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of chunks retrieved per query
    pub top_k: usize,
    /// Minimum cosine similarity for a chunk to count as relevant
    pub similarity_threshold: f32,
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,
    /// Number of texts embedded per provider request
    pub embedding_batch_size: usize,
}

/// Answer generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum completion tokens per answer
    pub max_answer_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling parameter
    pub top_p: f32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            cors_allowed_origin: Some("http://localhost:5173".to_string()),
            enable_tracing: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection_name: "placement_policies".to_string(),
            vector_dimension: 384,
            batch_size: 100,
            timeout_seconds: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            similarity_threshold: 0.7,
            chunk_size: 1000,
            chunk_overlap: 200,
            embedding_batch_size: 10,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_answer_tokens: 512,
            temperature: 0.3,
            top_p: 1.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Build a configuration from the environment, starting from defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // API configuration
        if let Ok(host) = env::var("API_HOST") {
            config.api.host = host;
        }

        if let Ok(port) = env::var("API_PORT") {
            config.api.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "API_PORT".to_string(),
                reason: "not a valid port number".to_string(),
            })?;
        }

        if let Ok(origin) = env::var("CORS_ALLOWED_ORIGIN") {
            config.api.cors_allowed_origin = Some(origin);
        }

        // Vector store configuration
        if let Ok(url) = env::var("QDRANT_URL") {
            config.storage.url = url;
        }

        if let Ok(api_key) = env::var("QDRANT_API_KEY") {
            config.storage.api_key = Some(api_key);
        }

        if let Ok(collection) = env::var("QDRANT_COLLECTION") {
            config.storage.collection_name = collection;
        }

        if let Ok(dimension) = env::var("VECTOR_DIMENSION") {
            config.storage.vector_dimension =
                dimension.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "VECTOR_DIMENSION".to_string(),
                    reason: "Invalid vector dimension".to_string(),
                })?;
        }

        if let Ok(batch) = env::var("UPSERT_BATCH_SIZE") {
            config.storage.batch_size = batch.parse().map_err(|_| ConfigError::InvalidValue {
                key: "UPSERT_BATCH_SIZE".to_string(),
                reason: "Invalid batch size".to_string(),
            })?;
        }

        // Retrieval configuration
        if let Ok(top_k) = env::var("TOP_K") {
            config.retrieval.top_k = top_k.parse().map_err(|_| ConfigError::InvalidValue {
                key: "TOP_K".to_string(),
                reason: "Invalid top_k value".to_string(),
            })?;
        }

        if let Ok(threshold) = env::var("SIMILARITY_THRESHOLD") {
            config.retrieval.similarity_threshold =
                threshold.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "SIMILARITY_THRESHOLD".to_string(),
                    reason: "Invalid similarity threshold".to_string(),
                })?;
        }

        if let Ok(chunk_size) = env::var("CHUNK_SIZE") {
            config.retrieval.chunk_size =
                chunk_size.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "CHUNK_SIZE".to_string(),
                    reason: "Invalid chunk size".to_string(),
                })?;
        }

        if let Ok(overlap) = env::var("CHUNK_OVERLAP") {
            config.retrieval.chunk_overlap =
                overlap.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "CHUNK_OVERLAP".to_string(),
                    reason: "Invalid chunk overlap".to_string(),
                })?;
        }

        if let Ok(batch) = env::var("EMBEDDING_BATCH_SIZE") {
            config.retrieval.embedding_batch_size =
                batch.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "EMBEDDING_BATCH_SIZE".to_string(),
                    reason: "Invalid embedding batch size".to_string(),
                })?;
        }

        // Generation configuration
        if let Ok(max_tokens) = env::var("MAX_ANSWER_TOKENS") {
            config.generation.max_answer_tokens =
                max_tokens.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "MAX_ANSWER_TOKENS".to_string(),
                    reason: "Invalid token limit".to_string(),
                })?;
        }

        if let Ok(temperature) = env::var("LLM_TEMPERATURE") {
            config.generation.temperature =
                temperature.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "LLM_TEMPERATURE".to_string(),
                    reason: "Invalid temperature".to_string(),
                })?;
        }

        // Logging configuration
        if let Ok(level) = env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = env::var("LOG_FORMAT") {
            config.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: "LOG_FORMAT".to_string(),
                        reason: format!("Unknown log format: {}", other),
                    })
                }
            };
        }

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Check ranges the pipeline depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.port".to_string(),
                reason: "port must be nonzero".to_string(),
            });
        }

        let known_levels = ["error", "warn", "info", "debug", "trace"];
        if !known_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                reason: format!("expected one of: {}", known_levels.join(", ")),
            });
        }

        if self.storage.vector_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "storage.vector_dimension".to_string(),
                reason: "vector dimension must be positive".to_string(),
            });
        }

        if self.retrieval.top_k == 0 || self.retrieval.top_k > 10 {
            return Err(ConfigError::InvalidValue {
                key: "retrieval.top_k".to_string(),
                reason: "top_k must be between 1 and 10".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "retrieval.similarity_threshold".to_string(),
                reason: "Similarity threshold must be between 0.0 and 1.0".to_string(),
            });
        }

        if self.retrieval.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retrieval.chunk_size".to_string(),
                reason: "Chunk size must be > 0".to_string(),
            });
        }

        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(ConfigError::InvalidValue {
                key: "retrieval.chunk_overlap".to_string(),
                reason: "Chunk overlap must be smaller than chunk size".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::InvalidValue {
                key: "generation.temperature".to_string(),
                reason: "Temperature must be between 0.0 and 2.0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.storage.vector_dimension, 384);
    }

    #[test]
    #[serial]
    fn test_env_overrides_applied() {
        env::set_var("API_PORT", "9105");
        env::set_var("TOP_K", "5");
        env::set_var("SIMILARITY_THRESHOLD", "0.5");
        env::set_var("QDRANT_COLLECTION", "policies_test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.api.port, 9105);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.similarity_threshold, 0.5);
        assert_eq!(config.storage.collection_name, "policies_test");

        for var in ["API_PORT", "TOP_K", "SIMILARITY_THRESHOLD", "QDRANT_COLLECTION"] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_env_port_must_be_numeric() {
        env::set_var("API_PORT", "not-a-port");

        let result = Config::from_env();
        assert!(result.is_err());
        if let Err(ConfigError::InvalidValue { key, .. }) = result {
            assert_eq!(key, "API_PORT");
        }

        env::remove_var("API_PORT");
    }

    #[test]
    fn test_invalid_port() {
        let mut config = Config::default();
        config.api.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_top_k_out_of_range() {
        let mut config = Config::default();
        config.retrieval.top_k = 11;
        assert!(config.validate().is_err());

        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default();
        config.retrieval.chunk_overlap = config.retrieval.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
host = "127.0.0.1"
port = 9000
enable_cors = false
enable_tracing = true

[storage]
url = "http://qdrant:6333"
collection_name = "policies"
vector_dimension = 384
batch_size = 50
timeout_seconds = 10

[retrieval]
top_k = 4
similarity_threshold = 0.6
chunk_size = 800
chunk_overlap = 100
embedding_batch_size = 8

[generation]
max_answer_tokens = 256
temperature = 0.2
top_p = 1.0

[logging]
level = "debug"
format = "Pretty"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.storage.collection_name, "policies");
        assert_eq!(config.retrieval.chunk_size, 800);
        assert_eq!(config.generation.max_answer_tokens, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = Config::from_file("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
