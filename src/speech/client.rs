//! Core `SpeechClient` trait and the ElevenLabs REST implementation.
//!
//! `ElevenLabsClient` calls `POST {base_url}/v1/text-to-speech/{voice_id}`
//! and drains the streamed MPEG body into one buffer. A call either returns
//! the complete audio or fails; partial audio is never handed out.

use async_trait::async_trait;
use futures_util::StreamExt;
use thiserror::Error;

use crate::config::SpeechConfig;
use crate::persona::{Mode, ModeRegistry};

/// MIME type of every synthesized clip.
pub const AUDIO_MPEG: &str = "audio/mpeg";

// ---------------------------------------------------------------------------
// SpeechResult
// ---------------------------------------------------------------------------

/// A fully received audio clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechResult {
    pub audio_bytes: Vec<u8>,
    pub mime_type: String,
}

impl SpeechResult {
    pub fn mpeg(audio_bytes: Vec<u8>) -> Self {
        Self {
            audio_bytes,
            mime_type: AUDIO_MPEG.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Coarse classification a caller uses to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechErrorKind {
    /// The request had no text to speak.
    MissingInput,
    /// The server is missing credentials.
    Misconfigured,
    /// Network or upstream failure; a later attempt may succeed.
    Transient,
}

/// Errors that can occur during speech synthesis.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Missing text")]
    MissingText,

    /// No API key is configured. Raised before any network traffic.
    #[error("speech API key is not configured")]
    MissingApiKey,

    /// HTTP transport, connection or mid-stream error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("speech request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("speech service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The stream finished without a single byte of audio.
    #[error("speech service returned no audio")]
    EmptyAudio,
}

impl SpeechError {
    pub fn kind(&self) -> SpeechErrorKind {
        match self {
            SpeechError::MissingText => SpeechErrorKind::MissingInput,
            SpeechError::MissingApiKey => SpeechErrorKind::Misconfigured,
            _ => SpeechErrorKind::Transient,
        }
    }
}

impl From<reqwest::Error> for SpeechError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SpeechError::Timeout
        } else {
            SpeechError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechClient trait
// ---------------------------------------------------------------------------

/// Async capability for turning text into audio in a persona's voice.
#[async_trait]
pub trait SpeechClient: Send + Sync {
    async fn synthesize(&self, text: &str, mode: Mode) -> Result<SpeechResult, SpeechError>;
}

// ---------------------------------------------------------------------------
// ElevenLabsClient
// ---------------------------------------------------------------------------

/// Calls the ElevenLabs text-to-speech endpoint.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    config: SpeechConfig,
}

impl ElevenLabsClient {
    pub fn from_config(config: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, SpeechError> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(SpeechError::MissingApiKey)
    }
}

#[async_trait]
impl SpeechClient for ElevenLabsClient {
    async fn synthesize(&self, text: &str, mode: Mode) -> Result<SpeechResult, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::MissingText);
        }
        let key = self.api_key()?;

        let voice_id = ModeRegistry::voice_for(mode);
        log::info!("speech: using voice for mode {mode} -> {voice_id}");

        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice_id
        );

        let body = serde_json::json!({
            "text": text,
            "model_id": self.config.model_id,
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", key)
            .header(reqwest::header::ACCEPT, AUDIO_MPEG)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Drain every chunk before handing anything back.
        let mut audio = Vec::new();
        let mut chunks = 0usize;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            audio.extend_from_slice(&chunk?);
            chunks += 1;
        }

        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }

        log::debug!("speech: received {} bytes in {chunks} chunks", audio.len());
        Ok(SpeechResult::mpeg(audio))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_upstream;
    use axum::body::{Body, Bytes};
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    fn make_config(base_url: &str, api_key: Option<&str>) -> SpeechConfig {
        SpeechConfig {
            base_url: base_url.into(),
            api_key: api_key.map(|s| s.to_string()),
            timeout_secs: 5,
            ..SpeechConfig::default()
        }
    }

    /// Streams the voice id, key, model and text back as four separate chunks.
    async fn chunked_tts(
        Path(voice): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        let key = headers
            .get("xi-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let pieces = vec![
            format!("{voice};"),
            format!("{key};"),
            format!("{};", body["model_id"].as_str().unwrap_or("")),
            body["text"].as_str().unwrap_or("").to_string(),
        ];
        let stream = futures_util::stream::iter(
            pieces
                .into_iter()
                .map(|p| Ok::<_, std::io::Error>(Bytes::from(p))),
        );
        ([("content-type", AUDIO_MPEG)], Body::from_stream(stream))
    }

    #[test]
    fn error_kinds_are_distinguishable() {
        assert_eq!(SpeechError::MissingText.kind(), SpeechErrorKind::MissingInput);
        assert_eq!(SpeechError::MissingApiKey.kind(), SpeechErrorKind::Misconfigured);
        assert_eq!(SpeechError::Timeout.kind(), SpeechErrorKind::Transient);
        assert_eq!(
            SpeechError::Status { status: 502, body: String::new() }.kind(),
            SpeechErrorKind::Transient
        );
    }

    #[tokio::test]
    async fn missing_text_is_rejected_first() {
        let client = ElevenLabsClient::from_config(&make_config("http://127.0.0.1:1", None));
        let err = client.synthesize("   ", Mode::Savage).await.unwrap_err();
        assert!(matches!(err, SpeechError::MissingText));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = ElevenLabsClient::from_config(&make_config("http://127.0.0.1:1", None));
        let err = client.synthesize("hello", Mode::Therapy).await.unwrap_err();
        assert!(matches!(err, SpeechError::MissingApiKey));
    }

    #[tokio::test]
    async fn reassembles_chunks_in_order() {
        let base = spawn_upstream(
            Router::new().route("/v1/text-to-speech/:voice", post(chunked_tts)),
        )
        .await;

        let client = ElevenLabsClient::from_config(&make_config(&base, Some("xi-key")));
        let result = client.synthesize("once upon a time", Mode::Storytelling).await.unwrap();

        assert_eq!(result.mime_type, "audio/mpeg");
        assert_eq!(
            String::from_utf8(result.audio_bytes).unwrap(),
            "KTPVrSVAEUSJRClDzBw7;xi-key;eleven_turbo_v2;once upon a time"
        );
    }

    #[tokio::test]
    async fn empty_body_is_an_error() {
        let base = spawn_upstream(Router::new().route(
            "/v1/text-to-speech/:voice",
            post(|| async { ([("content-type", AUDIO_MPEG)], Body::empty()) }),
        ))
        .await;

        let client = ElevenLabsClient::from_config(&make_config(&base, Some("k")));
        let err = client.synthesize("hi", Mode::Savage).await.unwrap_err();
        assert!(matches!(err, SpeechError::EmptyAudio));
    }

    #[tokio::test]
    async fn broken_stream_returns_no_partial_audio() {
        let base = spawn_upstream(Router::new().route(
            "/v1/text-to-speech/:voice",
            post(|| async {
                let stream = futures_util::stream::iter(vec![
                    Ok(Bytes::from_static(b"ID3-first-half")),
                    Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "upstream reset")),
                ]);
                ([("content-type", AUDIO_MPEG)], Body::from_stream(stream))
            }),
        ))
        .await;

        let client = ElevenLabsClient::from_config(&make_config(&base, Some("k")));
        let result = client.synthesize("hi", Mode::Savage).await;

        let err = result.expect_err("a truncated body must not yield audio");
        assert!(matches!(err, SpeechError::Request(_)), "got {err:?}");
        assert_eq!(err.kind(), SpeechErrorKind::Transient);
    }

    #[tokio::test]
    async fn slow_service_is_a_timeout() {
        let base = spawn_upstream(Router::new().route(
            "/v1/text-to-speech/:voice",
            post(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                ([("content-type", AUDIO_MPEG)], "late audio")
            }),
        ))
        .await;

        let mut config = make_config(&base, Some("k"));
        config.timeout_secs = 1;
        let client = ElevenLabsClient::from_config(&config);

        let err = client.synthesize("hi", Mode::Savage).await.unwrap_err();
        assert!(matches!(err, SpeechError::Timeout), "got {err:?}");
        assert_eq!(err.kind(), SpeechErrorKind::Transient);
    }

    #[tokio::test]
    async fn upstream_rejection_is_transient() {
        let base = spawn_upstream(Router::new().route(
            "/v1/text-to-speech/:voice",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid_api_key") }),
        ))
        .await;

        let client = ElevenLabsClient::from_config(&make_config(&base, Some("wrong")));
        let err = client.synthesize("hi", Mode::Savage).await.unwrap_err();

        assert_eq!(err.kind(), SpeechErrorKind::Transient);
        assert!(matches!(err, SpeechError::Status { status: 401, .. }));
    }
}
