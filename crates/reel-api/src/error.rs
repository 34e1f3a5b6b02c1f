//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reel_ai::AiError;
use reel_media::MediaError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned to HTTP clients as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input; the message is shown as-is.
    #[error("{0}")]
    BadRequest(String),

    #[error("Upload exceeds the configured size limit")]
    PayloadTooLarge,

    /// A required credential is absent; nothing was sent upstream.
    #[error("{0}")]
    NotConfigured(String),

    /// The inference provider failed; details stay in the logs.
    #[error("{0}")]
    Upstream(String),

    /// The transcoder rejected the input or failed mid-run.
    #[error("{0}")]
    Transform(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Map an inference failure, replacing provider detail with `public_message`.
    pub fn from_ai(err: AiError, public_message: &str) -> Self {
        match err {
            AiError::NotConfigured(_) => Self::NotConfigured("OpenAI API key not configured".to_string()),
            other => {
                error!(error = %other, "Inference call failed");
                Self::Upstream(public_message.to_string())
            }
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotConfigured(_)
            | ApiError::Upstream(_)
            | ApiError::Transform(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match &err {
            MediaError::InvalidVideo(_) => ApiError::BadRequest(err.to_string()),
            _ if err.is_transform_failure() => ApiError::Transform(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Generic message shown instead of internal detail in production.
pub const REDACTED_INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Response extension marking a body that carries internal error detail.
///
/// `redact_internal_errors` swaps such bodies for a generic message when the
/// server runs in production.
#[derive(Debug, Clone, Copy)]
pub struct InternalErrorDetail;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let is_internal = matches!(self, ApiError::Internal(_));

        let mut response = (status, Json(ErrorResponse { error: self.to_string() })).into_response();
        if is_internal {
            response.extensions_mut().insert(InternalErrorDetail);
        }
        response
    }
}

/// Body used when internal detail must not leave the server.
pub fn redacted_response(status: StatusCode) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: REDACTED_INTERNAL_MESSAGE.to_string(),
        }),
    )
        .into_response()
}
