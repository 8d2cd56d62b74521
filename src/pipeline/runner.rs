//! Reveal orchestrator: drives prompt → generation → speech for one session.
//!
//! # Flow
//!
//! ```text
//! reveal(request)
//!   └─▶ busy? ─────────────────────────────▶ Err(Busy), state untouched
//!   └─▶ Validating
//!         ├─ blank input / flavor ─────────▶ Failed, Err(Validation)
//!         └─▶ PromptBuilder::build
//!               └─▶ AwaitingGeneration: generation.generate
//!                     ├─ Err ──────────────▶ Failed, fallback text, no speech
//!                     └─▶ AwaitingSpeech: speech.synthesize
//!                           ├─ Ok  ────────▶ Done, text + audio
//!                           └─ Err ────────▶ Done, text only
//! ```
//!
//! Generation and speech run one after the other because speech needs the
//! generated text. The session lock is only held between awaits.
//!
//! A reveal whose future is dropped mid-flight (client disconnect, aborted
//! task) leaves the session `Failed`, never stuck in a busy stage.

use std::sync::{Arc, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;

use crate::config::ModelTier;
use crate::generation::GenerationClient;
use crate::persona::{Mode, ModeRegistry, PromptBuilder};
use crate::speech::{SpeechClient, SpeechErrorKind, SpeechResult};

use super::state::{PlaybackEvent, RevealState, SessionState, SharedState};

/// Shown in place of generated text when the generation service fails.
pub const FALLBACK_MESSAGE: &str =
    "⚠️ The lore well ran dry. Something went wrong, please try again.";

/// Recorded as the session error when an in-flight reveal is dropped.
pub const CANCELLED_MESSAGE: &str = "reveal cancelled before it finished";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A user-supplied field is missing. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please ask something first.")]
    MissingInput,
    #[error("Please pick a flavor (a show, game, or book) first.")]
    MissingFlavor,
}

/// Reasons a reveal is refused outright.
///
/// Upstream failures are not errors here; they are reported through
/// [`RevealOutcome::issue`].
#[derive(Debug, Error)]
pub enum RevealError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another reveal is still in flight for this session.
    #[error("a reveal is already in progress")]
    Busy,
}

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

/// One user action. Lives only for the duration of the reveal.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: Mode,
    pub user_input: String,
    pub flavor: Option<String>,
    /// Switch the session to this tier before generating.
    pub model: Option<ModelTier>,
}

impl GenerationRequest {
    pub fn new(mode: Mode, user_input: impl Into<String>) -> Self {
        Self {
            mode,
            user_input: user_input.into(),
            flavor: None,
            model: None,
        }
    }

    pub fn with_flavor(mut self, flavor: impl Into<String>) -> Self {
        self.flavor = Some(flavor.into());
        self
    }

    pub fn with_model(mut self, model: ModelTier) -> Self {
        self.model = Some(model);
        self
    }

    fn validate(&self, require_flavor: bool) -> Result<(), ValidationError> {
        if self.user_input.trim().is_empty() {
            return Err(ValidationError::MissingInput);
        }
        let flavor_blank = self.flavor.as_deref().map_or(true, |f| f.trim().is_empty());
        if require_flavor && flavor_blank {
            return Err(ValidationError::MissingFlavor);
        }
        Ok(())
    }
}

/// What went wrong upstream, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealIssue {
    GenerationUnavailable,
    GenerationMisconfigured,
    SpeechUnavailable,
    SpeechMisconfigured,
}

/// Result of a reveal that got past validation.
#[derive(Debug, Clone)]
pub struct RevealOutcome {
    /// `Done` or `Failed`.
    pub state: RevealState,
    /// Generated text, or [`FALLBACK_MESSAGE`] when generation failed.
    pub text: String,
    pub speech: Option<SpeechResult>,
    pub issue: Option<RevealIssue>,
}

// ---------------------------------------------------------------------------
// RevealOrchestrator
// ---------------------------------------------------------------------------

/// Runs reveals for a single session.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use lorify::config::AppConfig;
/// use lorify::generation::GeminiClient;
/// use lorify::persona::Mode;
/// use lorify::pipeline::{new_shared_state, GenerationRequest, RevealOrchestrator};
/// use lorify::speech::ElevenLabsClient;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let orchestrator = RevealOrchestrator::new(
///     new_shared_state(config.generation.model),
///     Arc::new(GeminiClient::from_config(&config.generation)),
///     Arc::new(ElevenLabsClient::from_config(&config.speech)),
///     config.ui.require_flavor,
/// );
///
/// let request = GenerationRequest::new(Mode::Savage, "my boss yelled at me")
///     .with_flavor("The Office");
/// let outcome = orchestrator.reveal(request).await.unwrap();
/// println!("{}", outcome.text);
/// # }
/// ```
pub struct RevealOrchestrator {
    state: SharedState,
    generation: Arc<dyn GenerationClient>,
    speech: Arc<dyn SpeechClient>,
    require_flavor: bool,
}

impl RevealOrchestrator {
    /// Create a new orchestrator.
    ///
    /// * `state`         : the session's shared state.
    /// * `generation`    : text backend (e.g. `GeminiClient`).
    /// * `speech`        : audio backend (e.g. `ElevenLabsClient`).
    /// * `require_flavor`: reject reveals with a blank flavor.
    pub fn new(
        state: SharedState,
        generation: Arc<dyn GenerationClient>,
        speech: Arc<dyn SpeechClient>,
        require_flavor: bool,
    ) -> Self {
        Self {
            state,
            generation,
            speech,
            require_flavor,
        }
    }

    /// Copy of the current session state.
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    /// Use `model` for this session's subsequent reveals.
    pub fn select_model(&self, model: ModelTier) {
        self.lock().model = model;
    }

    pub fn on_playback(&self, event: PlaybackEvent) {
        log::debug!("pipeline: playback {event:?}");
        self.lock().on_playback(event);
    }

    // -----------------------------------------------------------------------
    // reveal
    // -----------------------------------------------------------------------

    /// Run one reveal to completion.
    ///
    /// Returns `Err` only for a busy session or invalid input; upstream
    /// failures still produce an outcome.
    pub async fn reveal(&self, request: GenerationRequest) -> Result<RevealOutcome, RevealError> {
        let claim = self.begin()?;

        // ── 1. Validate ──────────────────────────────────────────────────
        if let Err(e) = request.validate(self.require_flavor) {
            log::warn!("pipeline: rejected reveal: {e}");
            claim.finish(RevealState::Failed, None, Some(e.to_string()));
            return Err(e.into());
        }

        // ── 2. Build prompt ──────────────────────────────────────────────
        let model = {
            let mut st = self.lock();
            if let Some(model) = request.model {
                st.model = model;
            }
            st.stage = RevealState::AwaitingGeneration;
            st.model
        };

        let persona = ModeRegistry::get(request.mode);
        let prompt = PromptBuilder::build(persona, &request.user_input, request.flavor.as_deref());
        log::debug!(
            "pipeline: {} → generating with {}",
            request.mode,
            model.model_id()
        );

        // ── 3. Generate ──────────────────────────────────────────────────
        let generated = match self.generation.generate(&prompt, model.model_id()).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("pipeline: generation failed: {e}");
                let issue = if e.is_configuration() {
                    RevealIssue::GenerationMisconfigured
                } else {
                    RevealIssue::GenerationUnavailable
                };
                claim.finish(
                    RevealState::Failed,
                    Some(FALLBACK_MESSAGE.to_string()),
                    Some(e.to_string()),
                );
                return Ok(RevealOutcome {
                    state: RevealState::Failed,
                    text: FALLBACK_MESSAGE.to_string(),
                    speech: None,
                    issue: Some(issue),
                });
            }
        };

        // ── 4. Speak ─────────────────────────────────────────────────────
        self.lock().stage = RevealState::AwaitingSpeech;

        let (speech, issue, speech_error) =
            match self.speech.synthesize(&generated.text, request.mode).await {
                Ok(audio) => (Some(audio), None, None),
                Err(e) => {
                    // Text is still delivered; only playback is skipped.
                    log::warn!("pipeline: speech failed, delivering text only: {e}");
                    let issue = match e.kind() {
                        SpeechErrorKind::Misconfigured => RevealIssue::SpeechMisconfigured,
                        _ => RevealIssue::SpeechUnavailable,
                    };
                    (None, Some(issue), Some(e.to_string()))
                }
            };

        // ── 5. Finalise ──────────────────────────────────────────────────
        claim.finish(RevealState::Done, Some(generated.text.clone()), speech_error);

        Ok(RevealOutcome {
            state: RevealState::Done,
            text: generated.text,
            speech,
            issue,
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    /// Claim the session for a new reveal, or refuse if one is running.
    fn begin(&self) -> Result<RevealClaim<'_>, RevealError> {
        let mut st = self.lock();
        if st.stage.is_busy() {
            log::debug!("pipeline: reveal refused, session is {}", st.stage.label());
            return Err(RevealError::Busy);
        }
        st.stage = RevealState::Validating;
        st.error_message = None;
        Ok(RevealClaim {
            state: &self.state,
            settled: false,
        })
    }
}

fn lock_state(state: &SharedState) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hold on a session's busy stage for the duration of one reveal.
///
/// Dropping an unsettled claim moves a still-busy session to `Failed`.
struct RevealClaim<'a> {
    state: &'a SharedState,
    settled: bool,
}

impl RevealClaim<'_> {
    fn finish(mut self, stage: RevealState, text: Option<String>, error: Option<String>) {
        self.settled = true;
        let mut st = lock_state(self.state);
        st.stage = stage;
        if text.is_some() {
            st.last_text = text;
        }
        st.error_message = error;
    }
}

impl Drop for RevealClaim<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut st = lock_state(self.state);
        if st.stage.is_busy() {
            log::warn!("pipeline: reveal dropped while {}", st.stage.label());
            st.stage = RevealState::Failed;
            st.error_message = Some(CANCELLED_MESSAGE.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
