//! Answer generation: LLM client and prompt assembly

pub mod llm_client;
pub mod prompt;

pub use llm_client::{LlmClient, LlmProvider};
pub use prompt::{
    build_context, build_user_prompt, FALLBACK_ANSWER, MAX_CONTEXT_CHARS, SYSTEM_PROMPT,
};
