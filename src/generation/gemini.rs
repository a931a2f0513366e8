//! Google Gemini `generateContent` client.

use super::TextGenerationClient;
use crate::error::{Result, SporError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Text generation over the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, api_base: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SporError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            api_base: api_base
                .unwrap_or(GEMINI_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:generateContent", self.api_base, model)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Map a failed Gemini response onto the error taxonomy.
fn classify_error(status: u16, body: &str, model: &str) -> SporError {
    let (api_status, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => (env.error.status, env.error.message),
        Err(_) => (String::new(), body.trim().to_string()),
    };

    if status == 404 || api_status == "NOT_FOUND" {
        SporError::ModelNotFound(format!("'{}' was rejected by the service: {}", model, message))
    } else if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
        SporError::QuotaExceeded(format!("API rate limit exceeded: {}", message))
    } else {
        SporError::GenerationFailed(format!("HTTP {}: {}", status, message))
    }
}

/// Pull the generated text out of a successful response.
fn extract_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(SporError::GenerationFailed(format!(
            "Prompt was blocked: {}",
            reason
        )));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| SporError::GenerationFailed("No candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(SporError::GenerationFailed(format!(
            "Empty response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

#[async_trait]
impl TextGenerationClient for GeminiClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SporError::GenerationFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SporError::GenerationFailed(format!("Failed to read response: {}", e)))?;
        debug!("Gemini responded with HTTP {}", status);

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &text, model));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| SporError::GenerationFailed(format!("Unexpected response: {}", e)))?;

        extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("key", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("gemini-1.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(
            client.endpoint("models/gemini-pro"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );

        let custom = GeminiClient::new("key", Some("http://localhost:8080/"), Duration::from_secs(5)).unwrap();
        assert_eq!(
            custom.endpoint("m"),
            "http://localhost:8080/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn test_classify_not_found() {
        let body = r#"{"error": {"code": 404, "message": "models/gemini-9 is not found", "status": "NOT_FOUND"}}"#;
        assert!(matches!(classify_error(404, body, "gemini-9"), SporError::ModelNotFound(_)));
    }

    #[test]
    fn test_classify_quota() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(classify_error(429, body, "m"), SporError::QuotaExceeded(_)));
        // Status field alone is enough.
        let body = r#"{"error": {"code": 400, "message": "quota", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(classify_error(400, body, "m"), SporError::QuotaExceeded(_)));
    }

    #[test]
    fn test_classify_other() {
        let err = classify_error(500, "<html>oops</html>", "m");
        match err {
            SporError::GenerationFailed(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_extract_text() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "there"}], "role": "model"}, "finishReason": "STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hello there");
    }

    #[test]
    fn test_extract_text_blocked() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#,
        )
        .unwrap();
        assert!(matches!(extract_text(response), Err(SporError::GenerationFailed(_))));

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(extract_text(empty), Err(SporError::GenerationFailed(_))));
    }
}
