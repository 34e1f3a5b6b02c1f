//! Axum HTTP API server.
//!
//! This crate provides:
//! - `/api/process-video`: multipart upload in, edited mp4 out
//! - `/api/generate-caption` and `/api/tts` over the inference provider
//! - Health/readiness probes, rate limiting, security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
