//! Speech synthesis.
//!
//! * [`SpeechClient`]: async trait implemented by every backend.
//! * [`ElevenLabsClient`]: ElevenLabs REST backend with streamed-body
//!   reassembly.
//! * [`SpeechResult`]: a complete `audio/mpeg` clip.
//! * [`SpeechError`] / [`SpeechErrorKind`]: failures and their coarse class.

pub mod client;

pub use client::{
    ElevenLabsClient, SpeechClient, SpeechError, SpeechErrorKind, SpeechResult, AUDIO_MPEG,
};
