//! HTTP interface for the browser front end.
//!
//! [`AppContext`] owns the service clients, the live configuration and one
//! [`RevealOrchestrator`] per session id. At most `server.max_sessions` are
//! kept; the least recently used idle session makes room for a new one. [`router`] exposes it through axum;
//! the route handlers live in [`routes`].

pub mod routes;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};

use crate::config::{AppConfig, ModelTier};
use crate::generation::{GeminiClient, GenerationClient};
use crate::pipeline::{new_shared_state, RevealOrchestrator};
use crate::speech::{ElevenLabsClient, SpeechClient};

pub use routes::router;

/// Session used when a request does not name one.
pub const DEFAULT_SESSION: &str = "default";

/// Shared server state handed to every handler.
pub type SharedContext = Arc<AppContext>;

pub struct AppContext {
    generation: Arc<dyn GenerationClient>,
    speech: Arc<dyn SpeechClient>,
    config: Mutex<AppConfig>,
    /// Where model selections are persisted; `None` keeps them in memory.
    settings_path: Option<PathBuf>,
    sessions: Mutex<Sessions>,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<String, SessionEntry>,
    /// Bumped on every lookup; orders entries by recency.
    tick: u64,
}

struct SessionEntry {
    orchestrator: Arc<RevealOrchestrator>,
    last_used: u64,
}

impl Sessions {
    fn touch(&mut self, id: &str) -> Option<Arc<RevealOrchestrator>> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(id).map(|entry| {
            entry.last_used = tick;
            Arc::clone(&entry.orchestrator)
        })
    }

    /// Drop the least recently used session that has no reveal in flight.
    fn evict_idle(&mut self) {
        let victim = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.orchestrator.snapshot().stage.is_busy())
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(id, _)| id.clone());

        match victim {
            Some(id) => {
                log::debug!("server: evicting idle session {id:?}");
                self.entries.remove(&id);
            }
            None => log::warn!(
                "server: all {} sessions are busy; exceeding the session limit",
                self.entries.len()
            ),
        }
    }
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        generation: Arc<dyn GenerationClient>,
        speech: Arc<dyn SpeechClient>,
        settings_path: Option<PathBuf>,
    ) -> Self {
        Self {
            generation,
            speech,
            config: Mutex::new(config),
            settings_path,
            sessions: Mutex::new(Sessions::default()),
        }
    }

    /// Build the production Gemini and ElevenLabs clients from `config`.
    pub fn from_config(config: AppConfig, settings_path: Option<PathBuf>) -> Self {
        let generation = Arc::new(GeminiClient::from_config(&config.generation));
        let speech = Arc::new(ElevenLabsClient::from_config(&config.speech));
        Self::new(config, generation, speech, settings_path)
    }

    pub fn speech(&self) -> &Arc<dyn SpeechClient> {
        &self.speech
    }

    /// Orchestrator for `id`, created on first use.
    pub fn session(&self, id: &str) -> Arc<RevealOrchestrator> {
        let (model, require_flavor, max_sessions) = {
            let config = self.config();
            (
                config.generation.model,
                config.ui.require_flavor,
                config.server.max_sessions,
            )
        };

        let mut sessions = lock(&self.sessions);
        if let Some(orchestrator) = sessions.touch(id) {
            return orchestrator;
        }

        if sessions.entries.len() >= max_sessions {
            sessions.evict_idle();
        }

        log::debug!("server: new session {id:?}");
        let orchestrator = Arc::new(RevealOrchestrator::new(
            new_shared_state(model),
            Arc::clone(&self.generation),
            Arc::clone(&self.speech),
            require_flavor,
        ));
        let last_used = sessions.tick;
        sessions.entries.insert(
            id.to_string(),
            SessionEntry {
                orchestrator: Arc::clone(&orchestrator),
                last_used,
            },
        );
        orchestrator
    }

    /// Existing orchestrator for `id`, if the session has been used and not
    /// evicted since.
    pub fn existing_session(&self, id: &str) -> Option<Arc<RevealOrchestrator>> {
        lock(&self.sessions).touch(id)
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).entries.len()
    }

    pub fn model(&self) -> ModelTier {
        self.config().generation.model
    }

    /// Persist `model`, then switch every session to it.
    ///
    /// The settings file is re-read and only the model field changes, so
    /// secrets taken from the environment are never written to disk. If the
    /// file cannot be written nothing changes in memory either.
    pub fn set_model(&self, model: ModelTier) -> Result<()> {
        if let Some(path) = &self.settings_path {
            let mut on_disk = AppConfig::load_from(path)
                .with_context(|| format!("reading {}", path.display()))?;
            on_disk.generation.model = model;
            on_disk
                .save_to(path)
                .with_context(|| format!("writing {}", path.display()))?;
        }

        self.config().generation.model = model;
        for entry in lock(&self.sessions).entries.values() {
            entry.orchestrator.select_model(model);
        }

        log::info!("server: model set to {}", model.model_id());
        Ok(())
    }

    fn config(&self) -> MutexGuard<'_, AppConfig> {
        lock(&self.config)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(ctx: SharedContext, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    log::info!("Lorify listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}
