//! Route handlers.
//!
//! | Method | Path                | Purpose                                 |
//! |--------|---------------------|-----------------------------------------|
//! | GET    | `/api/modes`        | persona display metadata                |
//! | POST   | `/api/reveal`       | run the full reveal pipeline            |
//! | POST   | `/api/tts`          | synthesize speech for arbitrary text    |
//! | GET    | `/api/model`        | current model tier                      |
//! | PUT    | `/api/model`        | change and persist the model tier       |
//! | POST   | `/api/playback`     | audio player start/end notifications    |
//! | GET    | `/api/session/:id`  | session progress                        |

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::capture::{Recognition, TranscriptAssembler, TranscriptSegment};
use crate::config::ModelTier;
use crate::persona::ModeRegistry;
use crate::pipeline::{
    GenerationRequest, PlaybackEvent, RevealError, RevealIssue, RevealOutcome, RevealState,
};
use crate::speech::SpeechErrorKind;

use super::{SharedContext, DEFAULT_SESSION};

pub fn router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/api/modes", get(list_modes))
        .route("/api/reveal", post(reveal))
        .route("/api/tts", post(tts))
        .route("/api/model", get(get_model).put(put_model))
        .route("/api/playback", post(playback))
        .route("/api/session/:id", get(session_status))
        .with_state(ctx)
}

// ---------------------------------------------------------------------------
// /api/modes
// ---------------------------------------------------------------------------

async fn list_modes() -> Response {
    Json(ModeRegistry::all()).into_response()
}

// ---------------------------------------------------------------------------
// /api/reveal
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RevealBody {
    session: Option<String>,
    mode: Option<String>,
    question: Option<String>,
    /// Speech-recognition output, used when `question` is blank.
    #[serde(default)]
    transcript: Vec<TranscriptSegment>,
    flavor: Option<String>,
    model: Option<ModelTier>,
    recognition: Option<Recognition>,
}

#[derive(Debug, Serialize)]
struct RevealResponse {
    state: RevealState,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue: Option<RevealIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<&'static str>,
}

impl RevealResponse {
    fn new(outcome: RevealOutcome, notice: Option<&'static str>) -> Self {
        let (audio_base64, mime_type) = match outcome.speech {
            Some(speech) => (
                Some(base64::engine::general_purpose::STANDARD.encode(&speech.audio_bytes)),
                Some(speech.mime_type),
            ),
            None => (None, None),
        };
        Self {
            state: outcome.state,
            text: outcome.text,
            audio_base64,
            mime_type,
            issue: outcome.issue,
            notice,
        }
    }
}

async fn reveal(State(ctx): State<SharedContext>, Json(body): Json<RevealBody>) -> Response {
    let notice = body.recognition.and_then(|r| r.notice());

    let question = body
        .question
        .filter(|q| !q.trim().is_empty())
        .unwrap_or_else(|| TranscriptAssembler::assemble(&body.transcript));

    let request = GenerationRequest {
        mode: ModeRegistry::resolve(body.mode.as_deref().unwrap_or_default()).mode,
        user_input: question,
        flavor: body.flavor,
        model: body.model,
    };

    let session = ctx.session(body.session.as_deref().unwrap_or(DEFAULT_SESSION));

    match session.reveal(request).await {
        Ok(outcome) => {
            let status = if outcome.issue == Some(RevealIssue::GenerationMisconfigured) {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (status, Json(RevealResponse::new(outcome, notice))).into_response()
        }
        Err(RevealError::Validation(e)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string(), "notice": notice })),
        )
            .into_response(),
        Err(e @ RevealError::Busy) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// /api/tts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TtsBody {
    #[serde(default)]
    text: String,
    mode: Option<String>,
}

async fn tts(State(ctx): State<SharedContext>, Json(body): Json<TtsBody>) -> Response {
    let mode = ModeRegistry::resolve(body.mode.as_deref().unwrap_or_default()).mode;

    match ctx.speech().synthesize(&body.text, mode).await {
        Ok(speech) => (
            [(header::CONTENT_TYPE, speech.mime_type)],
            speech.audio_bytes,
        )
            .into_response(),
        Err(e) => match e.kind() {
            SpeechErrorKind::MissingInput => {
                (StatusCode::BAD_REQUEST, "Missing text").into_response()
            }
            SpeechErrorKind::Misconfigured => {
                log::error!("tts: ELEVENLABS_API_KEY missing");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server misconfiguration: Missing API key",
                )
                    .into_response()
            }
            SpeechErrorKind::Transient => {
                log::error!("tts: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error generating speech: {e}"),
                )
                    .into_response()
            }
        },
    }
}

// ---------------------------------------------------------------------------
// /api/model
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ModelBody {
    model: ModelTier,
}

fn model_json(model: ModelTier) -> Json<serde_json::Value> {
    Json(json!({ "model": model, "model_id": model.model_id() }))
}

async fn get_model(State(ctx): State<SharedContext>) -> Response {
    model_json(ctx.model()).into_response()
}

async fn put_model(State(ctx): State<SharedContext>, Json(body): Json<ModelBody>) -> Response {
    match ctx.set_model(body.model) {
        Ok(()) => model_json(body.model).into_response(),
        Err(e) => {
            log::error!("model: failed to persist selection: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "could not save model selection" })),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// /api/playback
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PlaybackBody {
    session: Option<String>,
    event: PlaybackEvent,
}

/// Only sessions that already ran a reveal can report playback.
async fn playback(State(ctx): State<SharedContext>, Json(body): Json<PlaybackBody>) -> Response {
    let id = body.session.as_deref().unwrap_or(DEFAULT_SESSION);
    match ctx.existing_session(id) {
        Some(session) => {
            session.on_playback(body.event);
            StatusCode::NO_CONTENT.into_response()
        }
        None => unknown_session(id),
    }
}

fn unknown_session(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("unknown session {id:?}") })),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// /api/session/:id
// ---------------------------------------------------------------------------

async fn session_status(State(ctx): State<SharedContext>, Path(id): Path<String>) -> Response {
    let Some(session) = ctx.existing_session(&id) else {
        return unknown_session(&id);
    };

    let st = session.snapshot();
    Json(json!({
        "state": st.stage,
        "label": st.stage.label(),
        "busy": st.stage.is_busy(),
        "speaking": st.speaking,
        "last_text": st.last_text,
        "error": st.error_message,
        "model": st.model,
    }))
    .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
