//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use reel_media::check_ffmpeg;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub backend: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub ffmpeg: CheckStatus,
    pub watermark: CheckStatus,
    pub inference: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckStatus {
    fn ok(detail: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            detail: Some(detail.into()),
        }
    }

    fn missing(detail: impl Into<String>) -> Self {
        Self {
            status: "missing".to_string(),
            detail: Some(detail.into()),
        }
    }
}

/// Readiness check endpoint (readiness probe).
///
/// Only a missing transcoder makes the service unready; a missing watermark
/// or credential just narrows what requests can do.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let ffmpeg = match check_ffmpeg(&state.config.ffmpeg_path) {
        Ok(path) => CheckStatus::ok(path.display().to_string()),
        Err(e) => CheckStatus::missing(e.to_string()),
    };

    let watermark_path = state.watermark.path().display().to_string();
    let watermark = if state.watermark.is_available().await {
        CheckStatus::ok(watermark_path)
    } else {
        CheckStatus::missing(format!("{watermark_path} not found, overlay disabled"))
    };

    let inference = if state.ai.is_configured() {
        CheckStatus::ok("credential configured")
    } else {
        CheckStatus::missing("OPENAI_API_KEY not configured")
    };

    let is_ready = ffmpeg.status == "ok";

    let response = ReadinessResponse {
        status: if is_ready { "ready" } else { "degraded" }.to_string(),
        backend: state.pipeline.backend_name().to_string(),
        checks: ReadinessChecks {
            ffmpeg,
            watermark,
            inference,
        },
    };

    if is_ready {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
