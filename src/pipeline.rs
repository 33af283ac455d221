//! End-to-end question answering over the retrieval and generation layers

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::GenerationConfig;
use crate::generation::{
    build_context, build_user_prompt, LlmClient, FALLBACK_ANSWER, SYSTEM_PROMPT,
};
use crate::retrieval::{Retriever, TokenCounter};
use crate::types::{RagError, RagResult, ScoredChunk};

/// Number of characters of chunk text included in a source preview
const PREVIEW_CHARS: usize = 200;

/// A chunk that contributed to an answer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceAttribution {
    /// Identifier of the source chunk
    pub chunk_id: String,
    /// Similarity score, rounded to four decimal places
    pub score: f64,
    /// First part of the chunk text
    pub text_preview: String,
}

/// A generated answer with its supporting sources
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub query: String,
    pub answer: String,
    pub sources: Vec<SourceAttribution>,
}

/// Answers questions by retrieving relevant chunks and prompting the LLM.
pub struct RagPipeline {
    retriever: Arc<Retriever>,
    llm: LlmClient,
    generation: GenerationConfig,
    token_counter: Box<dyn TokenCounter>,
}

impl RagPipeline {
    pub fn new(
        retriever: Arc<Retriever>,
        llm: LlmClient,
        generation: GenerationConfig,
        token_counter: Box<dyn TokenCounter>,
    ) -> Self {
        Self {
            retriever,
            llm,
            generation,
            token_counter,
        }
    }

    /// Answer a question from the ingested corpus.
    ///
    /// When retrieval finds nothing above the similarity threshold, returns
    /// the fallback answer without calling the LLM.
    pub async fn answer(&self, query: &str, top_k: Option<usize>) -> RagResult<RagAnswer> {
        let chunks = self.retriever.retrieve(query, top_k, None).await?;

        if chunks.is_empty() {
            tracing::info!(query_length = query.len(), "No relevant chunks, skipping LLM");
            return Ok(RagAnswer {
                query: query.to_string(),
                answer: FALLBACK_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let context = build_context(&chunks);
        let user_prompt = build_user_prompt(query, &context);

        tracing::debug!(
            chunks = chunks.len(),
            estimated_prompt_tokens = self.token_counter.count_prompt(SYSTEM_PROMPT, &user_prompt),
            context_limit = self.token_counter.model_context_limit(),
            "Prompt assembled"
        );

        let answer = self
            .llm
            .chat_completion(SYSTEM_PROMPT, &user_prompt, &self.generation)
            .await
            .map_err(RagError::Generation)?;

        Ok(RagAnswer {
            query: query.to_string(),
            answer,
            sources: build_sources(&chunks),
        })
    }
}

/// Convert retrieved chunks into source attributions.
pub(crate) fn build_sources(chunks: &[ScoredChunk]) -> Vec<SourceAttribution> {
    chunks
        .iter()
        .map(|chunk| SourceAttribution {
            chunk_id: chunk.chunk_id.clone(),
            score: round_score(chunk.score),
            text_preview: chunk.text.chars().take(PREVIEW_CHARS).collect(),
        })
        .collect()
}

fn round_score(score: f32) -> f64 {
    (score as f64 * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{InMemoryVectorStore, MockEmbeddingService};
    use crate::types::ChunkMetadata;
    use serial_test::serial;

    fn scored(text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk_id: "c1".to_string(),
            text: text.to_string(),
            score,
            metadata: ChunkMetadata::default(),
        }
    }

    #[test]
    fn test_round_score_to_four_places() {
        assert_eq!(round_score(0.123456), 0.1235);
        assert_eq!(round_score(0.7), 0.7);
        assert_eq!(round_score(1.0), 1.0);
    }

    #[test]
    fn test_build_sources_previews_long_text() {
        let long_text = "a".repeat(500);
        let sources = build_sources(&[scored(&long_text, 0.95)]);

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].text_preview.chars().count(), 200);
        assert_eq!(sources[0].score, 0.95);
    }

    #[test]
    fn test_build_sources_preview_is_char_safe() {
        let text = "ट".repeat(300);
        let sources = build_sources(&[scored(&text, 0.8)]);
        assert_eq!(sources[0].text_preview.chars().count(), 200);
    }

    #[tokio::test]
    #[serial]
    async fn test_answer_falls_back_without_llm_call() {
        // A dummy key lets the client construct; the empty store means the
        // fallback path returns before any request is made.
        std::env::set_var("GROQ_API_KEY", "test-key");
        let llm = LlmClient::from_env().unwrap();
        std::env::remove_var("GROQ_API_KEY");

        let retriever = Arc::new(Retriever::new(
            Arc::new(MockEmbeddingService::new(16)),
            Arc::new(InMemoryVectorStore::new(16)),
            3,
            0.7,
        ));
        let pipeline = RagPipeline::new(
            retriever,
            llm,
            GenerationConfig::default(),
            crate::retrieval::create_token_counter("llama-3.3-70b-versatile"),
        );

        let result = pipeline.answer("anything", None).await.unwrap();

        assert_eq!(result.answer, FALLBACK_ANSWER);
        assert!(result.sources.is_empty());
        assert_eq!(result.query, "anything");
    }
}
