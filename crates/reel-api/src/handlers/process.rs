//! Video processing handler.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info};

use reel_media::{run_pipeline, PipelineRequest, SourceMedia, StatusReporter};
use reel_models::{EditRequest, RawEditFields};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the video.
const FILE_FIELD: &str = "file";

/// Name used when the upload carries no filename.
const FALLBACK_FILENAME: &str = "upload.mp4";

/// POST /api/process-video
///
/// Multipart form with a `file` field plus optional `start`, `end`,
/// `useVoice`, `enableWatermark` and `caption` text fields. Responds with
/// the edited clip as `video/mp4`.
pub async fn process_video(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Response> {
    let mut raw = RawEditFields::default();
    let mut source: Option<SourceMedia> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == FILE_FIELD {
            let filename = field
                .file_name()
                .filter(|n| !n.is_empty())
                .unwrap_or(FALLBACK_FILENAME)
                .to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            source = Some(SourceMedia::new(filename, bytes.to_vec()));
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            if !raw.set(&name, value) {
                debug!(field = %name, "Ignoring unknown form field");
            }
        }
    }

    let source = source
        .filter(|s| !s.bytes.is_empty())
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let request = PipelineRequest {
        source,
        edit: EditRequest::derive(&raw),
    };

    let output = run_pipeline(state.pipeline.as_ref(), &request, &StatusReporter::silent()).await?;

    info!(
        filename = %request.source.filename,
        size = output.bytes.len(),
        "Processed video"
    );

    Ok(([(header::CONTENT_TYPE, output.content_type())], output.bytes).into_response())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}
