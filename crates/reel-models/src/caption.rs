//! Caption and voice-over payloads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Generated social caption plus hashtags, in reply order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaptionResult {
    pub caption: String,
    pub hashtags: Vec<String>,
}

/// Text to be spoken over the edited clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VoiceoverRequest {
    pub text: String,
}

impl VoiceoverRequest {
    /// Use the caption as given unless it is empty, else a line built from
    /// the filename. A whitespace-only caption is still spoken as-is.
    pub fn from_caption(caption: &str, original_filename: &str) -> Self {
        let text = if caption.is_empty() {
            format!("Voiceover for {}", file_stem(original_filename))
        } else {
            caption.to_string()
        };
        Self { text }
    }
}

/// Filename without directories or extension.
pub fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
