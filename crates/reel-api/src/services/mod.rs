//! Adapters between the HTTP layer and the pipeline crates.

pub mod voiceover;

pub use voiceover::SpeechVoiceover;
