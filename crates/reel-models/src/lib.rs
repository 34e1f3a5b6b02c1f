//! Shared data models for the AutoReel video pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Trim windows and the user-facing edit parameters
//! - The ordered transform specification both pipeline backends realize
//! - Encoding configuration
//! - Caption and voice-over payloads exchanged with the inference provider

pub mod caption;
pub mod edit;
pub mod encoding;
pub mod transform;
pub mod trim;

// Re-export common types
pub use caption::{CaptionResult, VoiceoverRequest};
pub use edit::{EditRequest, RawEditFields, FLAG_ENABLED};
pub use encoding::EncodingConfig;
pub use transform::{TransformSpec, TransformStage, TARGET_HEIGHT, TARGET_WIDTH, WATERMARK_MARGIN};
pub use trim::TrimWindow;
