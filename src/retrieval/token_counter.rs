//! Token estimation for prompt sizing.
//!
//! The chat pipeline logs an estimate of the assembled prompt against the
//! model's context window before every LLM call. OpenAI-tokenized models get
//! exact counts via tiktoken-rs; Groq- and OpenRouter-hosted open-weight
//! models fall back to a character heuristic since their tokenizers are not
//! shipped with tiktoken.

/// Chat-format framing tokens added per message (role, separators).
const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Rough character-to-token ratio for English prose.
const APPROX_CHARS_PER_TOKEN: f64 = 3.5;

/// Fallback window for models missing from the limit table.
const DEFAULT_CONTEXT_LIMIT: usize = 32_000;

/// Context window sizes by model name substring, first match wins.
///
/// Longer names come before their prefixes (gpt-4o before gpt-4) so the
/// lookup never stops at the wrong family.
const CONTEXT_LIMITS: &[(&str, usize)] = &[
    ("gpt-4o", 128_000),
    ("gpt-4-turbo", 128_000),
    ("o1", 128_000),
    ("o3", 128_000),
    ("gpt-4", 128_000),
    ("llama", 128_000),
    ("qwen", 131_072),
    ("mixtral", 32_000),
    ("mistral", 32_000),
    ("gemma", 8_192),
    ("deepseek", 128_000),
];

/// Counts tokens for a specific model's tokenizer, exactly or approximately.
pub trait TokenCounter: Send + Sync {
    /// Tokens in a single piece of text.
    fn count_tokens(&self, text: &str) -> usize;

    /// Tokens for a two-message chat prompt, including per-message framing.
    fn count_prompt(&self, system: &str, user: &str) -> usize {
        self.count_tokens(system) + self.count_tokens(user) + 2 * MESSAGE_OVERHEAD_TOKENS
    }

    /// The model's context window size in tokens.
    fn model_context_limit(&self) -> usize;
}

/// Context window size for a model name, [`DEFAULT_CONTEXT_LIMIT`] if unknown.
pub fn context_limit_for_model(model: &str) -> usize {
    let name = model.to_lowercase();

    CONTEXT_LIMITS
        .iter()
        .find(|(pattern, _)| name.contains(pattern))
        .map(|(_, limit)| *limit)
        .unwrap_or(DEFAULT_CONTEXT_LIMIT)
}

/// Exact counter backed by a tiktoken-rs encoding.
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
    context_limit: usize,
}

impl TiktokenCounter {
    /// Pick the encoding for `model`: o200k_base for the GPT-4o and o-series
    /// families, cl100k_base otherwise.
    pub fn for_model(model: &str) -> Self {
        let name = model.to_lowercase();
        let wants_o200k = ["gpt-4o", "o1", "o3"]
            .iter()
            .any(|family| name.contains(family));

        let bpe = if wants_o200k {
            tiktoken_rs::o200k_base().or_else(|_| tiktoken_rs::cl100k_base())
        } else {
            tiktoken_rs::cl100k_base()
        }
        .expect("embedded tiktoken encoding failed to load");

        Self {
            bpe,
            context_limit: context_limit_for_model(model),
        }
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn model_context_limit(&self) -> usize {
        self.context_limit
    }
}

/// Character-ratio counter for models without a shipped tokenizer.
pub struct HeuristicTokenCounter {
    context_limit: usize,
}

impl HeuristicTokenCounter {
    pub fn new(context_limit: usize) -> Self {
        Self { context_limit }
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        let estimate = (text.len() as f64 / APPROX_CHARS_PER_TOKEN).ceil() as usize;
        // ~15% headroom over the raw estimate
        estimate + estimate / 7
    }

    fn model_context_limit(&self) -> usize {
        self.context_limit
    }
}

/// Counter for `model`: tiktoken when its tokenizer is available, heuristic
/// otherwise.
pub fn create_token_counter(model: &str) -> Box<dyn TokenCounter> {
    let name = model.to_lowercase();
    let openai_tokenized = name.contains("gpt")
        || name.contains("o1")
        || name.contains("o3")
        || name.contains("text-embedding");

    if openai_tokenized {
        Box::new(TiktokenCounter::for_model(model))
    } else {
        Box::new(HeuristicTokenCounter::new(context_limit_for_model(model)))
    }
}
