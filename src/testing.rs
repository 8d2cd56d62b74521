//! Test-only helpers shared by the client and server test modules.

use async_trait::async_trait;
use axum::Router;
use tokio::sync::Notify;

use crate::generation::{GenerationClient, GenerationError, GenerationResult};
use crate::persona::Mode;
use crate::speech::{SpeechClient, SpeechError, SpeechResult};

/// Serve `router` on an ephemeral local port and return its base URL.
///
/// The server task lives until the test runtime shuts down.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake upstream");
    });

    format!("http://{addr}")
}

/// Generation backend with a canned reply. `None` simulates an outage.
pub struct FixedGeneration(pub Option<&'static str>);

#[async_trait]
impl GenerationClient for FixedGeneration {
    async fn generate(
        &self,
        _prompt: &str,
        _model_id: &str,
    ) -> Result<GenerationResult, GenerationError> {
        self.0
            .map(|text| GenerationResult {
                text: text.to_string(),
            })
            .ok_or_else(|| GenerationError::Request("connection refused".into()))
    }
}

/// Generation backend that blocks until `gate` is notified, then replies
/// "finally".
#[derive(Default)]
pub struct GatedGeneration {
    pub gate: Notify,
}

#[async_trait]
impl GenerationClient for GatedGeneration {
    async fn generate(
        &self,
        _prompt: &str,
        _model_id: &str,
    ) -> Result<GenerationResult, GenerationError> {
        self.gate.notified().await;
        Ok(GenerationResult {
            text: "finally".to_string(),
        })
    }
}

/// Speech backend with canned audio. `None` simulates a missing API key.
pub struct FixedSpeech(pub Option<&'static str>);

#[async_trait]
impl SpeechClient for FixedSpeech {
    async fn synthesize(&self, text: &str, _mode: Mode) -> Result<SpeechResult, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::MissingText);
        }
        self.0
            .map(|audio| SpeechResult::mpeg(audio.as_bytes().to_vec()))
            .ok_or(SpeechError::MissingApiKey)
    }
}
