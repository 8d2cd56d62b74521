//! Configuration module for Lorify.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each service,
//! `AppPaths` for the cross-platform config directory, and TOML persistence
//! via `AppConfig::load_from` / `AppConfig::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, GenerationConfig, ModelTier, ServerConfig, SpeechConfig, UiConfig,
};
