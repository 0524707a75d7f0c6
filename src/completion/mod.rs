//! Text-completion capability used by the generation pipeline.
//!
//! The pipeline never talks to a model client directly; it receives a
//! `&dyn CompletionService` so the OpenAI-backed implementation can be swapped
//! for [`ScriptedCompletion`] in tests or offline runs.

mod openai;
mod scripted;

pub use openai::OpenAICompletion;
pub use scripted::ScriptedCompletion;

use async_trait::async_trait;
use thiserror::Error;

/// A single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System persona.
    pub system: String,
    /// Rendered user prompt.
    pub prompt: String,
    /// Token ceiling for the answer.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 for deterministic output).
    pub temperature: f32,
}

/// Failure of the completion service itself, as opposed to unusable output.
///
/// These are never retried by the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("rate limited or quota exhausted: {0}")]
    RateLimited(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("API error: {0}")]
    Api(String),
}

/// Trait for text-completion services.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run one completion and return the raw generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
