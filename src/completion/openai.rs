//! OpenAI chat-completion implementation.

use super::{CompletionError, CompletionRequest, CompletionService};
use crate::config::LlmSettings;
use crate::error::Result;
use crate::openai::create_client;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// Chat-completion service backed by the OpenAI API (or a compatible endpoint).
pub struct OpenAICompletion {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    timeout_secs: u64,
}

impl OpenAICompletion {
    /// Create a completion service from the LLM settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
            timeout_secs: settings.timeout_secs,
        })
    }

    /// Model name used for every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn classify(&self, err: OpenAIError) -> CompletionError {
        match err {
            OpenAIError::Reqwest(e) if e.is_timeout() => CompletionError::Timeout(self.timeout_secs),
            OpenAIError::Reqwest(e) => CompletionError::Network(e.to_string()),
            OpenAIError::ApiError(api) => classify_api_error(api.r#type.as_deref(), &api.message),
            other => CompletionError::Api(other.to_string()),
        }
    }
}

/// Map an API error body onto the service-failure taxonomy.
fn classify_api_error(error_type: Option<&str>, message: &str) -> CompletionError {
    let lower = message.to_lowercase();
    match error_type {
        Some("insufficient_quota") | Some("rate_limit_exceeded") | Some("requests")
        | Some("tokens") => CompletionError::RateLimited(message.to_string()),
        _ if lower.contains("rate limit") || lower.contains("quota") => {
            CompletionError::RateLimited(message.to_string())
        }
        _ if lower.contains("api key") || lower.contains("authentication") => {
            CompletionError::Auth(message.to_string())
        }
        _ => CompletionError::Api(message.to_string()),
    }
}

#[async_trait]
impl CompletionService for OpenAICompletion {
    #[allow(deprecated)]
    #[instrument(skip(self, request), fields(model = %self.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, CompletionError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| CompletionError::Api(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.clone())
                .build()
                .map_err(|e| CompletionError::Api(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .build()
            .map_err(|e| CompletionError::Api(e.to_string()))?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            let classified = self.classify(e);
            warn!("Completion call failed: {}", classified);
            classified
        })?;

        // A missing message body is treated as empty text; it fails JSON parsing downstream
        // and is retried like any other unusable answer.
        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!("Completion returned {} chars", content.len());
        Ok(content.trim().to_string())
    }
}
