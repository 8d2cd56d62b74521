//! Reveal state machine and per-session state.
//!
//! [`RevealState`] drives the orchestrator's state machine. The HTTP layer
//! reads it via [`SharedState`] to report progress and to refuse a second
//! reveal while one is in flight.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<SessionState>>`, cheap to
//! clone and safe to share across tasks.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::config::ModelTier;

// ---------------------------------------------------------------------------
// RevealState
// ---------------------------------------------------------------------------

/// States of one reveal.
///
/// ```text
/// Idle ──reveal──▶ Validating ──ok──▶ AwaitingGeneration ──ok──▶ AwaitingSpeech ──▶ Done
///                      │                      │
///                      └──invalid──▶ Failed ◀─┘ generation error
/// Done / Failed ──next reveal──▶ Validating
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    /// Nothing has been asked yet in this session.
    Idle,
    /// Checking the user-supplied fields; no network calls yet.
    Validating,
    /// The prompt is with the generation service.
    AwaitingGeneration,
    /// Generated text is with the speech service.
    AwaitingSpeech,
    /// Text is available; audio may or may not be.
    Done,
    /// Validation or generation failed.
    Failed,
}

impl RevealState {
    /// Returns `true` while a reveal is in flight.
    ///
    /// The front end disables the reveal button while busy.
    ///
    /// ```
    /// use lorify::pipeline::RevealState;
    ///
    /// assert!(!RevealState::Idle.is_busy());
    /// assert!(RevealState::AwaitingGeneration.is_busy());
    /// assert!(RevealState::AwaitingSpeech.is_busy());
    /// assert!(!RevealState::Done.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            RevealState::Validating | RevealState::AwaitingGeneration | RevealState::AwaitingSpeech
        )
    }

    /// A short human-readable label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            RevealState::Idle => "Idle",
            RevealState::Validating => "Validating",
            RevealState::AwaitingGeneration => "Summoning",
            RevealState::AwaitingSpeech => "Finding a voice",
            RevealState::Done => "Done",
            RevealState::Failed => "Failed",
        }
    }
}

impl Default for RevealState {
    fn default() -> Self {
        RevealState::Idle
    }
}

// ---------------------------------------------------------------------------
// PlaybackEvent
// ---------------------------------------------------------------------------

/// Notifications from the audio player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackEvent {
    Started,
    Ended,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Everything one session's front end needs to render.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Current phase of the reveal state machine.
    pub stage: RevealState,

    /// The most recent reply (or fallback message). `None` before the first
    /// reveal completes.
    pub last_text: Option<String>,

    /// Message describing the last failure, cleared when a new reveal starts.
    pub error_message: Option<String>,

    /// `true` between playback start and end notifications.
    pub speaking: bool,

    /// Model tier used for this session's reveals.
    pub model: ModelTier,
}

impl SessionState {
    pub fn new(model: ModelTier) -> Self {
        Self {
            stage: RevealState::Idle,
            last_text: None,
            error_message: None,
            speaking: false,
            model,
        }
    }

    /// Apply a playback notification.
    pub fn on_playback(&mut self, event: PlaybackEvent) {
        self.speaking = matches!(event, PlaybackEvent::Started);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(ModelTier::default())
    }
}

/// Thread-safe handle to [`SessionState`].
///
/// Lock for a short critical section; never hold the lock across `.await`.
pub type SharedState = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedState`] for a fresh session.
pub fn new_shared_state(model: ModelTier) -> SharedState {
    Arc::new(Mutex::new(SessionState::new(model)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_in_flight_states_are_busy() {
        assert!(!RevealState::Idle.is_busy());
        assert!(RevealState::Validating.is_busy());
        assert!(RevealState::AwaitingGeneration.is_busy());
        assert!(RevealState::AwaitingSpeech.is_busy());
        assert!(!RevealState::Done.is_busy());
        assert!(!RevealState::Failed.is_busy());
    }

    #[test]
    fn labels() {
        assert_eq!(RevealState::Idle.label(), "Idle");
        assert_eq!(RevealState::AwaitingGeneration.label(), "Summoning");
        assert_eq!(RevealState::Done.label(), "Done");
        assert_eq!(RevealState::Failed.label(), "Failed");
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&RevealState::AwaitingSpeech).unwrap();
        assert_eq!(json, "\"awaiting_speech\"");
    }

    #[test]
    fn new_session_is_idle_and_silent() {
        let state = SessionState::new(ModelTier::Pro);
        assert_eq!(state.stage, RevealState::Idle);
        assert!(state.last_text.is_none());
        assert!(state.error_message.is_none());
        assert!(!state.speaking);
        assert_eq!(state.model, ModelTier::Pro);
    }

    #[test]
    fn playback_toggles_speaking() {
        let mut state = SessionState::default();
        state.on_playback(PlaybackEvent::Started);
        assert!(state.speaking);
        state.on_playback(PlaybackEvent::Ended);
        assert!(!state.speaking);
    }

    #[test]
    fn shared_state_can_be_cloned_and_mutated() {
        let state = new_shared_state(ModelTier::Flash);
        let state2 = Arc::clone(&state);

        state.lock().unwrap().stage = RevealState::AwaitingSpeech;
        assert_eq!(state2.lock().unwrap().stage, RevealState::AwaitingSpeech);
    }
}
