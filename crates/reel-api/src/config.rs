//! API configuration.

use std::path::PathBuf;

use reel_media::command::DEFAULT_FFMPEG_PROGRAM;
use reel_media::watermark::DEFAULT_WATERMARK_PATH;
use reel_media::BackendKind;
use tracing::warn;

/// Default upload limit: 512 MiB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Max request body size (uploads included)
    pub max_upload_bytes: usize,
    /// Parent directory for per-request scratch space
    pub work_dir: PathBuf,
    /// Watermark image location
    pub watermark_path: PathBuf,
    /// Transcoder binary
    pub ffmpeg_path: String,
    /// Pipeline backend
    pub backend: BackendKind,
    /// Environment (development/production)
    pub environment: String,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            work_dir: default_work_dir(),
            watermark_path: PathBuf::from(DEFAULT_WATERMARK_PATH),
            ffmpeg_path: DEFAULT_FFMPEG_PROGRAM.to_string(),
            backend: BackendKind::Process,
            environment: "development".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_work_dir()),
            watermark_path: std::env::var("WATERMARK_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_WATERMARK_PATH)),
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or_else(|_| DEFAULT_FFMPEG_PROGRAM.to_string()),
            backend: std::env::var("PIPELINE_BACKEND")
                .ok()
                .and_then(|s| {
                    s.parse()
                        .map_err(|e| warn!(error = %e, "Invalid PIPELINE_BACKEND, using process"))
                        .ok()
                })
                .unwrap_or_default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("autoreel")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_upload_bytes, 536_870_912);
        assert_eq!(config.backend, BackendKind::Process);
        assert_eq!(config.watermark_path, PathBuf::from("public/watermark.png"));
        assert!(config.work_dir.ends_with("autoreel"));
        assert!(!config.is_production());
    }

    #[test]
    fn test_production_flag() {
        let config = ApiConfig {
            environment: "Production".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.is_production());
    }
}
