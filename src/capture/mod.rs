//! Speech-recognition capture boundary.
//!
//! Capture itself happens in the browser. The server only sees the resulting
//! recognition segments and joins them into the question text. A client that
//! cannot recognise speech at all reports [`Recognition::Unsupported`], which
//! is shown to the user as a notice and never treated as an error.

use serde::{Deserialize, Serialize};

/// One recognition result, interim or final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub transcript: String,
    #[serde(default)]
    pub is_final: bool,
}

/// Whether the client can capture speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recognition {
    Available,
    Unsupported,
}

impl Recognition {
    /// User-visible notice, if any.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Recognition::Available => None,
            Recognition::Unsupported => Some("Speech recognition not supported in this browser."),
        }
    }
}

/// Joins recognition segments into one transcript.
pub struct TranscriptAssembler;

impl TranscriptAssembler {
    /// Concatenate every segment in order. Interim segments are included so
    /// the text tracks what the user sees while still speaking.
    pub fn assemble(segments: &[TranscriptSegment]) -> String {
        segments.iter().map(|s| s.transcript.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, is_final: bool) -> TranscriptSegment {
        TranscriptSegment {
            transcript: text.into(),
            is_final,
        }
    }

    #[test]
    fn joins_segments_without_separator() {
        let segments = [seg("my boss", true), seg(" yelled", true), seg(" at me", false)];
        assert_eq!(TranscriptAssembler::assemble(&segments), "my boss yelled at me");
    }

    #[test]
    fn no_segments_is_empty() {
        assert_eq!(TranscriptAssembler::assemble(&[]), "");
    }

    #[test]
    fn is_final_defaults_to_false() {
        let segment: TranscriptSegment = serde_json::from_str(r#"{"transcript":"hi"}"#).unwrap();
        assert!(!segment.is_final);
    }

    #[test]
    fn only_unsupported_has_a_notice() {
        assert!(Recognition::Available.notice().is_none());
        assert_eq!(
            Recognition::Unsupported.notice(),
            Some("Speech recognition not supported in this browser.")
        );
    }
}
