//! Application entry point for Lorify.
//!
//! # Startup sequence
//!
//! 1. Load `.env` (if present) and initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Overlay API keys and bind address from the environment.
//! 4. Build the Gemini and ElevenLabs clients.
//! 5. Serve the HTTP interface until the process is stopped.
//!
//! Missing API keys are not fatal: the affected feature reports a
//! configuration error per request.

use std::sync::Arc;

use lorify::config::{AppConfig, AppPaths};
use lorify::server::{self, AppContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment + logging
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Lorify starting up");

    // 2. Configuration
    let paths = AppPaths::new();
    let mut config = AppConfig::load_from(&paths.settings_file).unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Secrets
    config.apply_env();
    if config.generation.api_key.is_none() {
        log::warn!("GEMINI_API_KEY is not set; reveals will return the fallback message");
    }
    if config.speech.api_key.is_none() {
        log::warn!("ELEVENLABS_API_KEY is not set; replies will have no audio");
    }
    log::info!(
        "Generation model: {}, speech model: {}",
        config.generation.model.model_id(),
        config.speech.model_id
    );

    // 4. Clients
    let addr = config.server.bind_address.clone();
    let ctx = Arc::new(AppContext::from_config(config, Some(paths.settings_file)));

    // 5. Serve
    server::serve(ctx, &addr).await
}
