//! Pipeline contract shared by both backends.
//!
//! A `VideoPipeline` takes an uploaded clip and its edit parameters and
//! returns the finished mp4. Implementations differ only in where the
//! transcoder runs; the stage list comes from `TransformSpec::build` and the
//! commands from `EncodePlan`, so both produce the same output.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use reel_models::encoding::OUTPUT_CONTENT_TYPE;
use reel_models::{EditRequest, TransformSpec, VoiceoverRequest};

use crate::error::{MediaError, MediaResult};
use crate::status::{PipelineStatus, StatusReporter};

/// Uploaded video bytes plus the name the client gave them.
#[derive(Debug, Clone)]
pub struct SourceMedia {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SourceMedia {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// One pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub source: SourceMedia,
    pub edit: EditRequest,
}

/// Finished video, owned by the caller.
#[derive(Debug, Clone)]
pub struct OutputMedia {
    pub bytes: Vec<u8>,
    /// Stages that were actually applied.
    pub spec: TransformSpec,
}

impl OutputMedia {
    pub fn content_type(&self) -> &'static str {
        OUTPUT_CONTENT_TYPE
    }
}

/// Source of synthesized voice-over audio (audio/mpeg bytes).
#[async_trait]
pub trait VoiceoverProvider: Send + Sync {
    async fn synthesize(&self, request: &VoiceoverRequest) -> MediaResult<Vec<u8>>;
}

/// A strategy that executes the transform pipeline.
#[async_trait]
pub trait VideoPipeline: Send + Sync {
    /// Short backend name for logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Execute all stages for one request.
    async fn process(
        &self,
        request: &PipelineRequest,
        status: &StatusReporter,
    ) -> MediaResult<OutputMedia>;
}

/// Run one invocation and translate its outcome into a terminal status.
///
/// Either the full output is returned or nothing is: any stage failure
/// becomes a single `Error: <message>` status and an `Err`.
pub async fn run_pipeline(
    pipeline: &dyn VideoPipeline,
    request: &PipelineRequest,
    status: &StatusReporter,
) -> MediaResult<OutputMedia> {
    let invocation_id = Uuid::new_v4();
    let backend = pipeline.backend_name();
    let span = info_span!("pipeline", %invocation_id, backend);

    async move {
        if request.source.bytes.is_empty() {
            let err = MediaError::InvalidVideo("uploaded file is empty".to_string());
            status.report(PipelineStatus::Error(err.to_string()));
            return Err(err);
        }

        info!(
            filename = %request.source.filename,
            size = request.source.bytes.len(),
            start = request.edit.trim.start,
            duration = request.edit.trim.duration(),
            use_voice = request.edit.use_voice,
            enable_watermark = request.edit.enable_watermark,
            "Pipeline started"
        );

        match pipeline.process(request, status).await {
            Ok(output) => {
                info!(
                    stages = %output.spec.summary(),
                    size = output.bytes.len(),
                    "Pipeline completed"
                );
                metrics::counter!("reel_pipelines_total", "backend" => backend, "outcome" => "success")
                    .increment(1);
                status.report(PipelineStatus::Done);
                Ok(output)
            }
            Err(e) => {
                error!(error = %e, "Pipeline failed");
                metrics::counter!("reel_pipelines_total", "backend" => backend, "outcome" => "failure")
                    .increment(1);
                status.report(PipelineStatus::Error(e.to_string()));
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Fetch voice-over audio if the request asks for it.
///
/// Failure here only narrows the output: any error or empty payload is
/// logged and `None` is returned so the pipeline continues without audio.
pub(crate) async fn obtain_voiceover(
    provider: Option<&Arc<dyn VoiceoverProvider>>,
    request: &PipelineRequest,
    status: &StatusReporter,
) -> Option<Vec<u8>> {
    if !request.edit.use_voice {
        return None;
    }

    let Some(provider) = provider else {
        warn!("Voice-over requested but no provider is configured");
        record_degradation("voiceover");
        return None;
    };

    status.report(PipelineStatus::SynthesizingVoice);
    let voice_request = VoiceoverRequest::from_caption(&request.edit.caption, &request.source.filename);

    match provider.synthesize(&voice_request).await {
        Ok(audio) if !audio.is_empty() => Some(audio),
        Ok(_) => {
            warn!("Voice-over provider returned no audio, continuing without voice");
            record_degradation("voiceover");
            None
        }
        Err(e) => {
            warn!(error = %e, "Voice-over synthesis failed, continuing without voice");
            record_degradation("voiceover");
            None
        }
    }
}

/// Count a soft degradation (`watermark` or `voiceover`).
pub(crate) fn record_degradation(kind: &'static str) {
    metrics::counter!("reel_soft_degradations_total", "kind" => kind).increment(1);
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedVoice;
    use super::*;
    use reel_models::{RawEditFields, TrimWindow};
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    fn request(use_voice: bool, caption: &str) -> PipelineRequest {
        PipelineRequest {
            source: SourceMedia::new("beach.mp4", vec![1, 2, 3]),
            edit: EditRequest {
                trim: TrimWindow::default(),
                use_voice,
                enable_watermark: false,
                caption: caption.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_voiceover_not_requested() {
        let voice = ScriptedVoice::new(Ok(vec![9]));
        let provider: Arc<dyn VoiceoverProvider> = voice.clone();
        let audio = obtain_voiceover(Some(&provider), &request(false, ""), &StatusReporter::silent()).await;
        assert!(audio.is_none());
        assert_eq!(voice.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_voiceover_uses_caption_then_filename() {
        let voice = ScriptedVoice::new(Ok(vec![9]));
        let provider: Arc<dyn VoiceoverProvider> = voice.clone();
        let audio = obtain_voiceover(Some(&provider), &request(true, ""), &StatusReporter::silent()).await;
        assert_eq!(audio, Some(vec![9]));
        assert_eq!(voice.texts.lock().unwrap()[0], "Voiceover for beach");
    }

    #[tokio::test]
    async fn test_voiceover_failure_is_soft() {
        let voice = ScriptedVoice::new(Err(MediaError::voiceover("provider down")));
        let provider: Arc<dyn VoiceoverProvider> = voice.clone();
        let audio = obtain_voiceover(Some(&provider), &request(true, "Hi"), &StatusReporter::silent()).await;
        assert!(audio.is_none());
        assert_eq!(voice.texts.lock().unwrap()[0], "Hi");

        let empty = ScriptedVoice::new(Ok(Vec::new()));
        let provider: Arc<dyn VoiceoverProvider> = empty;
        assert!(obtain_voiceover(Some(&provider), &request(true, "Hi"), &StatusReporter::silent())
            .await
            .is_none());

        assert!(obtain_voiceover(None, &request(true, "Hi"), &StatusReporter::silent())
            .await
            .is_none());
    }

    struct FailingPipeline;

    #[async_trait]
    impl VideoPipeline for FailingPipeline {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        async fn process(&self, _: &PipelineRequest, _: &StatusReporter) -> MediaResult<OutputMedia> {
            Err(MediaError::ffmpeg_failed("moov atom not found", None, Some(1)))
        }
    }

    #[tokio::test]
    async fn test_run_pipeline_reports_terminal_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let reporter = StatusReporter::new(Arc::new(move |s: &PipelineStatus| {
            sink_seen.lock().unwrap().push(s.clone());
        }));

        let err = run_pipeline(&FailingPipeline, &request(false, ""), &reporter)
            .await
            .unwrap_err();
        assert!(err.is_transform_failure());

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.last().unwrap().to_string(),
            "Error: FFmpeg command failed: moov atom not found"
        );
    }

    #[tokio::test]
    async fn test_empty_upload_rejected_before_processing() {
        let mut req = request(false, "");
        req.source.bytes.clear();
        let err = run_pipeline(&FailingPipeline, &req, &StatusReporter::silent())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));
        // Derivation defaults survive the round trip through the raw fields
        assert_eq!(EditRequest::derive(&RawEditFields::default()).trim.end, 15.0);
    }
}
