//! OpenAI-compatible chat completions client.

use super::TextGenerationClient;
use crate::error::{Result, SporError};
use async_openai::config::OpenAIConfig;
use async_openai::error::{ApiError, OpenAIError};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::instrument;

/// Text generation over the OpenAI chat completions API.
pub struct OpenAIChatClient {
    client: Client<OpenAIConfig>,
}

impl OpenAIChatClient {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }
}

/// Map an API error body onto the error taxonomy.
fn classify_api_error(err: &ApiError) -> SporError {
    let code = err.code.as_deref().unwrap_or_default();
    let kind = err.r#type.as_deref().unwrap_or_default();

    if code == "model_not_found" {
        SporError::ModelNotFound(err.message.clone())
    } else if matches!(code, "insufficient_quota" | "rate_limit_exceeded")
        || matches!(kind, "insufficient_quota" | "requests" | "tokens")
    {
        SporError::QuotaExceeded(err.message.clone())
    } else {
        SporError::GenerationFailed(err.message.clone())
    }
}

fn classify_error(err: OpenAIError) -> SporError {
    match err {
        OpenAIError::ApiError(api) => classify_api_error(&api),
        other => SporError::GenerationFailed(other.to_string()),
    }
}

#[async_trait]
impl TextGenerationClient for OpenAIChatClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| SporError::GenerationFailed(e.to_string()))?;
        let messages: Vec<ChatCompletionRequestMessage> = vec![message.into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .build()
            .map_err(|e| SporError::GenerationFailed(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(classify_error)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SporError::GenerationFailed("Empty response from LLM".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: Option<&str>, kind: Option<&str>) -> ApiError {
        ApiError {
            message: "boom".to_string(),
            r#type: kind.map(|s| s.to_string()),
            param: None,
            code: code.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_classify_model_not_found() {
        let err = classify_api_error(&api_error(Some("model_not_found"), Some("invalid_request_error")));
        assert!(matches!(err, SporError::ModelNotFound(_)));
    }

    #[test]
    fn test_classify_quota() {
        assert!(matches!(
            classify_api_error(&api_error(Some("insufficient_quota"), None)),
            SporError::QuotaExceeded(_)
        ));
        assert!(matches!(
            classify_api_error(&api_error(Some("rate_limit_exceeded"), Some("requests"))),
            SporError::QuotaExceeded(_)
        ));
    }

    #[test]
    fn test_classify_other() {
        assert!(matches!(
            classify_api_error(&api_error(Some("invalid_api_key"), Some("invalid_request_error"))),
            SporError::GenerationFailed(_)
        ));
        assert!(matches!(
            classify_error(OpenAIError::InvalidArgument("bad".to_string())),
            SporError::GenerationFailed(_)
        ));
    }
}
