//! Core `GenerationClient` trait and the Gemini REST implementation.
//!
//! `GeminiClient` calls `POST {base_url}/v1beta/models/{model}:generateContent`.
//! The model is chosen per call; connection details come from
//! [`GenerationConfig`].

use async_trait::async_trait;
use thiserror::Error;

use crate::config::GenerationConfig;

// ---------------------------------------------------------------------------
// GenerationError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating text.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No API key is configured. Raised before any network traffic.
    #[error("generation API key is not configured")]
    MissingApiKey,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("generation request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse generation response: {0}")]
    Parse(String),

    /// The service returned no usable text.
    #[error("generation service returned an empty response")]
    EmptyResponse,
}

impl GenerationError {
    /// `true` for server misconfiguration as opposed to a runtime failure.
    pub fn is_configuration(&self) -> bool {
        matches!(self, GenerationError::MissingApiKey)
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Request(e.to_string())
        }
    }
}

/// Reply produced by a [`GenerationClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
}

// ---------------------------------------------------------------------------
// GenerationClient trait
// ---------------------------------------------------------------------------

/// Async capability for turning a prompt into text.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn GenerationClient>`. Implementations make at most one outbound
/// call and never retry.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        model_id: &str,
    ) -> Result<GenerationResult, GenerationError>;
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Calls the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl GeminiClient {
    /// Build a `GeminiClient` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`. A default client is used if the builder fails.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(GenerationError::MissingApiKey)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    /// Send `prompt` to `model_id` and return the reply text verbatim.
    async fn generate(
        &self,
        prompt: &str,
        model_id: &str,
    ) -> Result<GenerationResult, GenerationError> {
        let key = self.api_key()?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model_id
        );

        let body = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        log::debug!("generation: POST {url} (prompt len={})", prompt.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        extract_text(&json).map(|text| GenerationResult { text })
    }
}

/// Concatenate every text part of the first candidate.
fn extract_text(json: &serde_json::Value) -> Result<String, GenerationError> {
    let parts = json["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or(GenerationError::EmptyResponse)?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    Ok(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
