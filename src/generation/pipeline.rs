//! Prompt → completion → sanitize → parse, with bounded retries.

use super::sanitize::strip_code_fences;
use crate::completion::{CompletionError, CompletionRequest, CompletionService};
use crate::config::{GenerationLimits, PromptTemplate, Prompts};
use crate::error::CourseGenError;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, instrument, warn};

/// A fully rendered generation job.
#[derive(Debug, Clone)]
pub struct PromptJob {
    pub request: CompletionRequest,
    /// Additional attempts allowed after an unparseable reply.
    pub max_retries: u32,
}

impl PromptJob {
    /// Render `template` with `vars` (plus custom config variables) under the given limits.
    pub fn render(
        prompts: &Prompts,
        template: &PromptTemplate,
        vars: &HashMap<String, String>,
        limits: &GenerationLimits,
    ) -> Self {
        Self {
            request: CompletionRequest {
                system: prompts.render_with_custom(&template.system, vars),
                prompt: prompts.render_with_custom(&template.user, vars),
                max_tokens: limits.max_tokens,
                temperature: limits.temperature,
            },
            max_retries: limits.max_retries,
        }
    }
}

/// Outcome of a single attempt that did not yield JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    /// The model answered, but not with parseable JSON.
    Format(String),
    /// The completion service itself failed.
    Service(CompletionError),
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Call the model again.
    Retry,
    /// Unparseable output and no attempts left.
    GiveUp,
    /// Service failure; stop without retrying.
    Abort,
}

impl RetryDecision {
    /// Decide after `attempts` calls have been made (1-based).
    pub fn after(failure: &AttemptFailure, attempts: u32, max_retries: u32) -> Self {
        match failure {
            AttemptFailure::Service(_) => RetryDecision::Abort,
            AttemptFailure::Format(_) if attempts <= max_retries => RetryDecision::Retry,
            AttemptFailure::Format(_) => RetryDecision::GiveUp,
        }
    }
}

/// Terminal failure of [`request_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationFailure {
    Service(CompletionError),
    Exhausted { attempts: u32, last_error: String },
}

impl From<GenerationFailure> for CourseGenError {
    fn from(failure: GenerationFailure) -> Self {
        match failure {
            GenerationFailure::Service(e) => CourseGenError::Completion(e),
            GenerationFailure::Exhausted {
                attempts,
                last_error,
            } => CourseGenError::MalformedOutput {
                attempts,
                message: last_error,
            },
        }
    }
}

/// Parse sanitized model output as JSON.
pub fn parse_payload(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(raw))
}

/// Run `job` until the model returns parseable JSON.
///
/// At most `max_retries + 1` completion calls are made. Each retry is a fresh,
/// independent call; service errors end the loop immediately.
#[instrument(skip_all, fields(max_tokens = job.request.max_tokens, max_retries = job.max_retries))]
pub async fn request_json(
    completion: &dyn CompletionService,
    job: &PromptJob,
) -> Result<Value, GenerationFailure> {
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        let failure = match completion.complete(&job.request).await {
            Ok(raw) => match parse_payload(&raw) {
                Ok(value) => {
                    debug!("Parsed model output on attempt {}", attempts);
                    return Ok(value);
                }
                Err(e) => AttemptFailure::Format(e.to_string()),
            },
            Err(e) => AttemptFailure::Service(e),
        };

        match (RetryDecision::after(&failure, attempts, job.max_retries), failure) {
            (RetryDecision::Retry, AttemptFailure::Format(e)) => {
                warn!(
                    "Model returned invalid JSON ({}), retrying (attempt {}/{})",
                    e,
                    attempts,
                    job.max_retries + 1
                );
            }
            (RetryDecision::Abort, AttemptFailure::Service(e)) => {
                error!("Completion service error: {}", e);
                return Err(GenerationFailure::Service(e));
            }
            (_, AttemptFailure::Format(e)) => {
                error!("Failed to get valid JSON from model after {} attempts", attempts);
                return Err(GenerationFailure::Exhausted {
                    attempts,
                    last_error: e,
                });
            }
            (_, AttemptFailure::Service(e)) => return Err(GenerationFailure::Service(e)),
        }
    }
}
