//! LLM integration (Gemini) for menu extraction and summarization.

mod client;

pub use client::{GeminiClient, GeminiConfig, LlmError};

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
