//! OpenAI client configuration with sensible defaults.

use crate::config::LlmSettings;
use crate::error::{CourseGenError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client from the LLM settings.
///
/// The API key falls back to `OPENAI_API_KEY` when not set in the config file.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::default();
    if let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) {
        config = config.with_api_key(key);
    }
    if let Some(base) = settings.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(config, Duration::from_secs(settings.timeout_secs))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CourseGenError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_retry_backoff()))
}

/// Backoff policy that never retries.
///
/// Rate limits are service failures for the caller to handle, so the client
/// must report the first 429 instead of sleeping on it.
fn no_retry_backoff() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}
