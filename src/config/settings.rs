//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//!
//! Secrets normally arrive through the environment rather than the file; see
//! [`AppConfig::apply_env`].

use anyhow::Result;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ModelTier
// ---------------------------------------------------------------------------

/// Quality/speed tier of the generation model.
///
/// | Variant   | Model id                | Trade-off          |
/// |-----------|-------------------------|--------------------|
/// | FlashLite | `gemini-2.5-flash-lite` | fastest            |
/// | Flash     | `gemini-2.5-flash`      | balanced (default) |
/// | Pro       | `gemini-2.5-pro`        | best quality       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelTier {
    FlashLite,
    Flash,
    Pro,
}

impl ModelTier {
    /// Model identifier sent to the generation service.
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelTier::FlashLite => "gemini-2.5-flash-lite",
            ModelTier::Flash => "gemini-2.5-flash",
            ModelTier::Pro => "gemini-2.5-pro",
        }
    }
}

impl Default for ModelTier {
    fn default() -> Self {
        Self::Flash
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// HTTP interface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the axum server binds to, e.g. `"127.0.0.1:3000"`.
    pub bind_address: String,
    /// Sessions kept in memory. The least recently used idle session is
    /// evicted when a new one would exceed this.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_sessions() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".into(),
            max_sessions: default_max_sessions(),
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Settings for the text-generation service (Gemini REST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    /// API key. `None` until supplied by the file or `GEMINI_API_KEY`.
    pub api_key: Option<String>,
    /// Selected model tier; persisted when the user changes it.
    pub model: ModelTier,
    /// Maximum seconds to wait for a generation response.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            model: ModelTier::default(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-synthesis service (ElevenLabs REST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    /// API key. `None` until supplied by the file or `ELEVENLABS_API_KEY`.
    pub api_key: Option<String>,
    /// Synthesis model identifier used for every request.
    pub model_id: String,
    /// Maximum seconds to wait for the full audio stream.
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            api_key: None,
            model_id: "eleven_turbo_v2".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Front-end behaviour the server enforces on its behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Reject a reveal whose flavor field is blank.
    pub require_flavor: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            require_flavor: true,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use lorify::config::{AppConfig, AppPaths};
///
/// let path = AppPaths::new().settings_file;
///
/// // Load (returns Default when file is missing)
/// let mut config = AppConfig::load_from(&path).unwrap();
///
/// // Modify and save
/// config.ui.require_flavor = false;
/// config.save_to(&path).unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP interface settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Generation service settings.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Speech service settings.
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Front-end behaviour.
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load from `path`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay values from the process environment.
    ///
    /// Recognised variables: `GEMINI_API_KEY`, `ELEVENLABS_API_KEY`,
    /// `LORIFY_BIND_ADDRESS`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Overlay values from an arbitrary lookup. Blank values are ignored so an
    /// empty `GEMINI_API_KEY=` line never masks a key from the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY") {
            self.generation.api_key = Some(key);
        }
        if let Some(key) = get("ELEVENLABS_API_KEY") {
            self.speech.api_key = Some(key);
        }
        if let Some(addr) = get("LORIFY_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.server.bind_address = "0.0.0.0:8080".into();
        cfg.generation.model = ModelTier::Pro;
        cfg.generation.timeout_secs = 5;
        cfg.speech.model_id = "eleven_multilingual_v2".into();
        cfg.ui.require_flavor = false;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.server.bind_address, "0.0.0.0:8080");
        assert_eq!(loaded.generation.model, ModelTier::Pro);
        assert_eq!(loaded.generation.timeout_secs, 5);
        assert_eq!(loaded.speech.model_id, "eleven_multilingual_v2");
        assert!(!loaded.ui.require_flavor);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.generation.model, ModelTier::Flash);
        assert!(config.generation.api_key.is_none());
        assert!(config.speech.api_key.is_none());
    }

    #[test]
    fn partial_file_fills_remaining_sections_with_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[ui]\nrequire_flavor = false\n").unwrap();

        let config = AppConfig::load_from(&path).expect("load");
        assert!(!config.ui.require_flavor);
        assert_eq!(config.speech.model_id, "eleven_turbo_v2");
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.server.max_sessions, 256);
    }

    #[test]
    fn server_section_without_session_limit_uses_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "[server]\nbind_address = \"0.0.0.0:4000\"\n").unwrap();

        let config = AppConfig::load_from(&path).expect("load");
        assert_eq!(config.server.bind_address, "0.0.0.0:4000");
        assert_eq!(config.server.max_sessions, 256);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.server.bind_address, "127.0.0.1:3000");
        assert_eq!(
            cfg.generation.base_url,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(cfg.generation.model.model_id(), "gemini-2.5-flash");
        assert_eq!(cfg.speech.base_url, "https://api.elevenlabs.io");
        assert_eq!(cfg.speech.model_id, "eleven_turbo_v2");
        assert!(cfg.ui.require_flavor);
    }

    #[test]
    fn model_tier_uses_kebab_case_names() {
        let json = serde_json::to_string(&ModelTier::FlashLite).unwrap();
        assert_eq!(json, "\"flash-lite\"");
        let tier: ModelTier = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(tier, ModelTier::Pro);
    }

    #[test]
    fn overrides_set_keys_and_address() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("GEMINI_API_KEY", "gem-key"),
            ("ELEVENLABS_API_KEY", "xi-key"),
            ("LORIFY_BIND_ADDRESS", "0.0.0.0:9000"),
        ]);

        let mut cfg = AppConfig::default();
        cfg.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(cfg.generation.api_key.as_deref(), Some("gem-key"));
        assert_eq!(cfg.speech.api_key.as_deref(), Some("xi-key"));
        assert_eq!(cfg.server.bind_address, "0.0.0.0:9000");
    }

    #[test]
    fn blank_override_keeps_existing_key() {
        let mut cfg = AppConfig::default();
        cfg.generation.api_key = Some("from-file".into());
        cfg.apply_overrides(|name| (name == "GEMINI_API_KEY").then(|| "  ".to_string()));

        assert_eq!(cfg.generation.api_key.as_deref(), Some("from-file"));
    }
}
