//! Lorify: persona replies with a voice.
//!
//! A question, a persona and an optional flavor reference go in; generated
//! text and matching speech come out.
//!
//! * [`persona`]: mode registry and prompt builder.
//! * [`generation`]: text generation client (Gemini).
//! * [`speech`]: speech synthesis client (ElevenLabs).
//! * [`pipeline`]: the reveal orchestrator and session state.
//! * [`capture`]: speech-recognition transcript assembly.
//! * [`server`]: axum HTTP interface.
//! * [`config`]: settings file and environment secrets.

pub mod capture;
pub mod config;
pub mod generation;
pub mod persona;
pub mod pipeline;
pub mod server;
pub mod speech;

#[cfg(test)]
mod testing;
