//! Caption generation handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use reel_ai::caption_prompt_for_file;
use reel_models::CaptionResult;

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_ai_request;
use crate::state::AppState;

/// Caption request body.
///
/// `filename` is a shortcut for clients that only know the processed file;
/// an explicit `prompt` wins.
#[derive(Debug, Default, Deserialize)]
pub struct CaptionRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl CaptionRequest {
    fn effective_prompt(&self) -> Option<String> {
        let prompt = self.prompt.as_deref().map(str::trim).filter(|p| !p.is_empty());
        match prompt {
            Some(prompt) => Some(prompt.to_string()),
            None => self
                .filename
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(caption_prompt_for_file),
        }
    }
}

/// POST /api/generate-caption
pub async fn generate_caption(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<CaptionResult>> {
    // An unreadable body is treated like an empty one
    let request: CaptionRequest = serde_json::from_slice(&body).unwrap_or_default();
    let prompt = request
        .effective_prompt()
        .ok_or_else(|| ApiError::bad_request("prompt required"))?;

    let result = state.ai.generate_caption(&prompt).await;
    record_ai_request("caption", result.is_ok());

    result
        .map(Json)
        .map_err(|e| ApiError::from_ai(e, "OpenAI API error"))
}
