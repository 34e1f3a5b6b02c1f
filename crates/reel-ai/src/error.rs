//! Error types for the inference client.

use thiserror::Error;

/// Result type for inference calls.
pub type AiResult<T> = Result<T, AiError>;

/// Errors from the inference provider.
#[derive(Debug, Error)]
pub enum AiError {
    /// No credential; raised before any request is sent.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("Request to inference provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Inference provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl AiError {
    /// Whether the error happened before contacting the provider.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, AiError::NotConfigured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_message() {
        let err = AiError::NotConfigured("OPENAI_API_KEY");
        assert_eq!(err.to_string(), "OPENAI_API_KEY not configured");
        assert!(err.is_not_configured());
        assert!(!AiError::EmptyResponse.is_not_configured());
    }
}
