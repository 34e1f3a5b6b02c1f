//! Inference-provider client.
//!
//! Talks to an OpenAI-compatible HTTP API for two things:
//! - chat completion turned into a caption plus hashtags
//! - speech synthesis returning audio/mpeg bytes

pub mod caption;
pub mod client;
pub mod error;

pub use caption::{build_caption_prompt, caption_prompt_for_file, parse_caption_reply};
pub use client::{AiClientConfig, InferenceClient};
pub use error::{AiError, AiResult};
