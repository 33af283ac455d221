//! Prompt assembly for grounded answers

use crate::types::ScoredChunk;

/// System prompt steering the model to answer only from retrieved context.
pub const SYSTEM_PROMPT: &str = "\
You are a helpful assistant that answers questions about IIIT Kota's placement policies.

Rules:
- Answer only from the provided context. Never invent policy details.
- If the context does not contain the answer, reply exactly: \"I don't have enough information to answer this.\"
- Expand abbreviations when helpful: SPC (Student Placement Cell), T&P (Training and Placement), PPO (Pre-Placement Offer), CGPA (Cumulative Grade Point Average), NOC (No Objection Certificate).
- Be concise. Use bullet points for lists.";

/// Answer returned without calling the LLM when retrieval finds nothing.
pub const FALLBACK_ANSWER: &str =
    "I couldn't find relevant information to answer your question.";

/// Maximum number of context characters included in the user prompt.
pub const MAX_CONTEXT_CHARS: usize = 3000;

/// Build a numbered context block from retrieved chunks.
///
/// Chunks are numbered 1-based in retrieval order so the model can cite
/// them; an empty result set yields a sentinel the model can recognize.
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return "No relevant information found.".to_string();
    }

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] {}", i + 1, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the user prompt, truncating the context to `MAX_CONTEXT_CHARS`.
pub fn build_user_prompt(query: &str, context: &str) -> String {
    let truncated: String = context.chars().take(MAX_CONTEXT_CHARS).collect();
    format!("Context:\n{}\n\nQuestion: {}", truncated, query)
}
