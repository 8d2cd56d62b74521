//! Reveal pipeline for Lorify.
//!
//! This module wires prompt building, text generation and speech synthesis
//! into the single `reveal` operation and exposes the per-session state the
//! HTTP layer reports.
//!
//! # Architecture
//!
//! ```text
//! POST /api/reveal
//!        │
//!        ▼
//! RevealOrchestrator::reveal()
//!        │
//!        ├─ validate input / flavor            → Validating
//!        ├─ PromptBuilder::build
//!        ├─ GenerationClient::generate         → AwaitingGeneration
//!        └─ SpeechClient::synthesize           → AwaitingSpeech
//!                                              → Done / Failed
//!
//! SharedState (Arc<Mutex<SessionState>>) ←─── read by the status route
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{
    GenerationRequest, RevealError, RevealIssue, RevealOrchestrator, RevealOutcome,
    ValidationError, CANCELLED_MESSAGE, FALLBACK_MESSAGE,
};
pub use state::{new_shared_state, PlaybackEvent, RevealState, SessionState, SharedState};
