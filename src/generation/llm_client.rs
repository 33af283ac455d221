//! Chat completion client for answer generation
//!
//! Auto-detects the provider from environment variables and provides a
//! unified interface for chat completion requests. Groq, OpenAI, and
//! OpenRouter all speak the same chat completions dialect.

use crate::config::GenerationConfig;
use crate::types::GenerationError;

/// Supported LLM providers
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Groq,
    OpenAi,
    OpenRouter,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Groq => write!(f, "Groq"),
            LlmProvider::OpenAi => write!(f, "OpenAI"),
            LlmProvider::OpenRouter => write!(f, "OpenRouter"),
        }
    }
}

/// Client for an OpenAI-compatible chat completions endpoint
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    provider: LlmProvider,
}

impl LlmClient {
    /// Auto-detect the LLM provider from environment variables.
    ///
    /// Checks in order:
    /// 1. `GROQ_API_KEY` → Groq
    /// 2. `OPENAI_API_KEY` → OpenAI
    /// 3. `OPENROUTER_API_KEY` → OpenRouter
    ///
    /// `LLM_MODEL` and `LLM_BASE_URL` override the per-provider defaults.
    /// Returns `GenerationError::NotConfigured` when no key is set.
    pub fn from_env() -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| GenerationError::NotConfigured {
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        let detected = if let Ok(api_key) = std::env::var("GROQ_API_KEY") {
            Some((
                api_key,
                LlmProvider::Groq,
                "llama-3.3-70b-versatile",
                "https://api.groq.com/openai/v1",
            ))
        } else if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            Some((
                api_key,
                LlmProvider::OpenAi,
                "gpt-4o-mini",
                "https://api.openai.com/v1",
            ))
        } else if let Ok(api_key) = std::env::var("OPENROUTER_API_KEY") {
            Some((
                api_key,
                LlmProvider::OpenRouter,
                "meta-llama/llama-3.3-70b-instruct",
                "https://openrouter.ai/api/v1",
            ))
        } else {
            None
        };

        let (api_key, provider, default_model, default_base_url) =
            detected.ok_or_else(|| GenerationError::NotConfigured {
                reason:
                    "No LLM API key found; set GROQ_API_KEY, OPENAI_API_KEY, or OPENROUTER_API_KEY"
                        .to_string(),
            })?;

        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| default_model.to_string());
        let base_url =
            std::env::var("LLM_BASE_URL").unwrap_or_else(|_| default_base_url.to_string());

        tracing::info!("LLM client initialized: provider={} model={}", provider, model);

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
            provider,
        })
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the provider
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Run one system + user exchange and return the assistant text.
    pub async fn chat_completion(
        &self,
        system: &str,
        user: &str,
        params: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "max_tokens": params.max_answer_tokens,
            "temperature": params.temperature,
            "top_p": params.top_p
        });

        let start = std::time::Instant::now();

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed {
                reason: format!("LLM request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GenerationError::RequestFailed {
                reason: format!("LLM API error ({}): {}", status, error_text),
            });
        }

        let resp_json: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| GenerationError::InvalidResponse {
                    reason: format!("Failed to parse LLM response: {}", e),
                })?;

        let elapsed = start.elapsed();

        if let Some(usage) = resp_json.get("usage") {
            tracing::info!(
                "LLM call finished: provider={} model={} prompt_tokens={} completion_tokens={} total_tokens={} elapsed={:?}",
                self.provider,
                self.model,
                usage.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
                usage.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
                usage.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
                elapsed,
            );
        }

        resp_json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| GenerationError::InvalidResponse {
                reason: "No content in LLM response choices".to_string(),
            })
    }
}
