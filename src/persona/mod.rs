//! Personas and prompt construction.
//!
//! * [`Mode`] / [`ModeConfig`] / [`ModeRegistry`]: the persona table with its
//!   savage fallback.
//! * [`PromptBuilder`]: turns a persona, the user's text and an optional
//!   flavor reference into a generation prompt.

pub mod prompt;
pub mod registry;

pub use prompt::PromptBuilder;
pub use registry::{Mode, ModeConfig, ModeRegistry};
