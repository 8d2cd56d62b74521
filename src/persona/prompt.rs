//! Prompt builder for persona replies.
//!
//! [`PromptBuilder::build`] produces a single flat prompt string:
//!
//! 1. The persona template with the user's input in its slot
//! 2. A flavor clause, only when a non-blank flavor reference is given
//!
//! The output depends on nothing but the arguments.

use crate::persona::registry::{ModeConfig, INPUT_SLOT};

/// Builds generation prompts from a persona and the user's text.
///
/// # Example
/// ```rust
/// use lorify::persona::{ModeRegistry, PromptBuilder};
///
/// let savage = ModeRegistry::resolve("savage");
/// let prompt = PromptBuilder::build(savage, "my boss yelled at me", Some("The Office"));
/// assert!(prompt.contains("my boss yelled at me"));
/// assert!(prompt.contains("The Office"));
/// ```
pub struct PromptBuilder;

impl PromptBuilder {
    /// Interpolate `user_input` into the persona template and append the
    /// flavor clause when `flavor` is non-blank.
    ///
    /// `user_input` is inserted verbatim. Callers validate that it is not
    /// blank before getting here.
    pub fn build(mode: &ModeConfig, user_input: &str, flavor: Option<&str>) -> String {
        let mut prompt = String::with_capacity(mode.template.len() + user_input.len() + 128);
        prompt.push_str(&mode.template.replacen(INPUT_SLOT, user_input, 1));

        if let Some(flavor) = flavor.map(str::trim).filter(|f| !f.is_empty()) {
            prompt.push_str(&format!(
                "\n\nFrame your entire response in the context of \"{flavor}\": \
                 use its characters, places, and references as the lens for your reply."
            ));
        }

        prompt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
