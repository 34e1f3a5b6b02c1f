//! Speech synthesis handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_ai_request;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Base64-encoded audio/mpeg.
#[derive(Debug, Serialize)]
pub struct TtsResponse {
    pub audio: String,
}

/// POST /api/tts
pub async fn tts(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<TtsResponse>> {
    let request: TtsRequest = serde_json::from_slice(&body).unwrap_or_default();
    let text = request
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("text required"))?;

    let result = state.ai.synthesize_speech(&text).await;
    record_ai_request("speech", result.is_ok());

    let audio = result.map_err(|e| ApiError::from_ai(e, "TTS generation failed"))?;
    Ok(Json(TtsResponse {
        audio: STANDARD.encode(audio),
    }))
}
