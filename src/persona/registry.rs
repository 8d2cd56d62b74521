//! Persona table: the single source of truth for every mode's prompt
//! template, voice and display metadata.
//!
//! Lookups never fail. Any identifier that does not match a known mode
//! (case-insensitively) resolves to the savage persona.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// The three personas Lorify can speak as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Savage,
    Storytelling,
    Therapy,
}

impl Mode {
    /// Lowercase identifier used on the wire.
    pub fn id(&self) -> &'static str {
        match self {
            Mode::Savage => "savage",
            Mode::Storytelling => "storytelling",
            Mode::Therapy => "therapy",
        }
    }

    /// Parse a mode identifier, ignoring case and surrounding whitespace.
    ///
    /// ```
    /// use lorify::persona::Mode;
    ///
    /// assert_eq!(Mode::parse(" Therapy "), Some(Mode::Therapy));
    /// assert_eq!(Mode::parse("poetry"), None);
    /// ```
    pub fn parse(id: &str) -> Option<Mode> {
        let id = id.trim();
        [Mode::Savage, Mode::Storytelling, Mode::Therapy]
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(id))
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Savage
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// ---------------------------------------------------------------------------
// ModeConfig
// ---------------------------------------------------------------------------

/// Everything attached to one persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeConfig {
    pub mode: Mode,
    /// Display name shown on the mode switcher.
    pub label: &'static str,
    pub emoji: &'static str,
    /// Persona instructions; `{input}` marks where the user's text goes.
    #[serde(skip)]
    pub template: &'static str,
    /// Speech-synthesis voice identifier.
    #[serde(skip)]
    pub voice_id: &'static str,
    /// Placeholder text for the question box.
    pub placeholder: &'static str,
    /// Caption of the reveal button.
    pub action_label: &'static str,
}

/// Slot in [`ModeConfig::template`] replaced by the user's input.
pub const INPUT_SLOT: &str = "{input}";

static MODES: [ModeConfig; 3] = [
    ModeConfig {
        mode: Mode::Savage,
        label: "Savage",
        emoji: "😈",
        template: "You are the Savage Lorify: brutally honest, funny, and self-aware. \
                   Respond with bluntness, a little cruel but very witty. \
                   Input: \"{input}\"",
        voice_id: "Ybqj6CIlqb6M85s9Bl4n",
        placeholder: "What do you want to know? Spit it out!",
        action_label: "🔥 Bring It",
    },
    ModeConfig {
        mode: Mode::Storytelling,
        label: "Storytelling",
        emoji: "📖",
        template: "You are the Storytelling Lorify: mythic, cinematic, and creative. \
                   Tell a short story based on: \"{input}\"",
        voice_id: "KTPVrSVAEUSJRClDzBw7",
        placeholder: "Tell me your story... What adventure awaits?",
        action_label: "✨ Tell My Story",
    },
    ModeConfig {
        mode: Mode::Therapy,
        label: "Therapy",
        emoji: "🛋️",
        template: "You are the Therapy Lorify: gentle, wise, and warm. \
                   Offer thoughtful reflection on: \"{input}\"",
        voice_id: "EXAVITQu4vr4xnSDxMaL",
        placeholder: "Share what's on your mind. I'm here to listen.",
        action_label: "💭 Reflect",
    },
];

// ---------------------------------------------------------------------------
// ModeRegistry
// ---------------------------------------------------------------------------

/// Read-only access to the persona table.
pub struct ModeRegistry;

impl ModeRegistry {
    /// All personas in display order.
    pub fn all() -> &'static [ModeConfig] {
        &MODES
    }

    /// Config for a known mode.
    pub fn get(mode: Mode) -> &'static ModeConfig {
        match mode {
            Mode::Savage => &MODES[0],
            Mode::Storytelling => &MODES[1],
            Mode::Therapy => &MODES[2],
        }
    }

    /// Resolve an arbitrary identifier; unknown ids fall back to savage.
    pub fn resolve(mode_id: &str) -> &'static ModeConfig {
        Self::get(Mode::parse(mode_id).unwrap_or_default())
    }

    /// Voice identifier for `mode`.
    pub fn voice_for(mode: Mode) -> &'static str {
        Self::get(mode).voice_id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_ids_case_insensitively() {
        assert_eq!(ModeRegistry::resolve("savage").mode, Mode::Savage);
        assert_eq!(ModeRegistry::resolve("STORYTELLING").mode, Mode::Storytelling);
        assert_eq!(ModeRegistry::resolve("TheRapy").mode, Mode::Therapy);
    }

    #[test]
    fn unknown_ids_fall_back_to_savage() {
        for id in ["", "poetry", "savage!", "story", "   ", "🛋️"] {
            assert_eq!(ModeRegistry::resolve(id).mode, Mode::Savage, "id = {id:?}");
        }
    }

    #[test]
    fn table_entries_are_indexed_by_their_own_mode() {
        for config in ModeRegistry::all() {
            assert_eq!(ModeRegistry::get(config.mode), config);
        }
    }

    #[test]
    fn every_template_has_an_input_slot() {
        for config in ModeRegistry::all() {
            assert_eq!(
                config.template.matches(INPUT_SLOT).count(),
                1,
                "{} template must contain exactly one slot",
                config.mode
            );
        }
    }

    #[test]
    fn voices_are_distinct_per_mode() {
        assert_eq!(ModeRegistry::voice_for(Mode::Savage), "Ybqj6CIlqb6M85s9Bl4n");
        assert_eq!(
            ModeRegistry::voice_for(Mode::Storytelling),
            "KTPVrSVAEUSJRClDzBw7"
        );
        assert_eq!(ModeRegistry::voice_for(Mode::Therapy), "EXAVITQu4vr4xnSDxMaL");
    }

    #[test]
    fn display_order_is_savage_storytelling_therapy() {
        let order: Vec<Mode> = ModeRegistry::all().iter().map(|c| c.mode).collect();
        assert_eq!(order, vec![Mode::Savage, Mode::Storytelling, Mode::Therapy]);
    }

    #[test]
    fn serialized_config_hides_template_and_voice() {
        let json = serde_json::to_value(ModeRegistry::get(Mode::Therapy)).unwrap();
        assert_eq!(json["mode"], "therapy");
        assert_eq!(json["action_label"], "💭 Reflect");
        assert!(json.get("template").is_none());
        assert!(json.get("voice_id").is_none());
    }
}
