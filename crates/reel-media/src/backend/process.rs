//! Server-side backend: spawns the transcoder as a child process.
//!
//! Each invocation gets its own scratch directory under the configured work
//! dir. Uploads and intermediates live there and are removed when the
//! invocation ends, whether it succeeded or not.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use reel_models::{EncodingConfig, TransformSpec};

use crate::command::{FfmpegRunner, DEFAULT_FFMPEG_PROGRAM};
use crate::error::MediaResult;
use crate::pipeline::{
    obtain_voiceover, record_degradation, OutputMedia, PipelineRequest, VideoPipeline, VoiceoverProvider,
};
use crate::plan::{source_file_name, EncodePlan, MediaFiles, VOICEOVER_FILE};
use crate::status::{PipelineStatus, StatusReporter};
use crate::watermark::WatermarkAsset;

/// Settings for the process backend.
#[derive(Debug, Clone)]
pub struct ProcessPipelineConfig {
    /// Parent of the per-invocation scratch directories
    pub work_dir: PathBuf,
    pub encoding: EncodingConfig,
    /// Transcoder binary name or path
    pub ffmpeg_program: String,
}

impl Default for ProcessPipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("autoreel"),
            encoding: EncodingConfig::default(),
            ffmpeg_program: DEFAULT_FFMPEG_PROGRAM.to_string(),
        }
    }
}

/// Pipeline running `ffmpeg` on the host.
pub struct ProcessPipeline {
    config: ProcessPipelineConfig,
    watermark: WatermarkAsset,
    voiceover: Option<Arc<dyn VoiceoverProvider>>,
}

impl ProcessPipeline {
    pub fn new(config: ProcessPipelineConfig, watermark: WatermarkAsset) -> Self {
        Self {
            config,
            watermark,
            voiceover: None,
        }
    }

    /// Attach a voice-over provider.
    pub fn with_voiceover(mut self, provider: Arc<dyn VoiceoverProvider>) -> Self {
        self.voiceover = Some(provider);
        self
    }

    fn runner(&self) -> FfmpegRunner {
        FfmpegRunner::new().with_program(&self.config.ffmpeg_program)
    }

    /// Create the scratch directory for one invocation.
    async fn scratch_dir(&self) -> MediaResult<TempDir> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let prefix = format!("reel-{}-", chrono::Utc::now().timestamp_millis());
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(&self.config.work_dir)?;
        debug!(dir = %dir.path().display(), "Created scratch directory");
        Ok(dir)
    }

    async fn run_in(
        &self,
        dir: &Path,
        request: &PipelineRequest,
        status: &StatusReporter,
    ) -> MediaResult<OutputMedia> {
        status.report(PipelineStatus::Uploading);
        let source_name = source_file_name(&request.source.filename);
        let mut files = MediaFiles::in_dir(dir, &source_name);
        tokio::fs::write(&files.source, &request.source.bytes).await?;

        let watermark_present = self.watermark.is_available().await;
        if request.edit.enable_watermark && !watermark_present {
            warn!(
                path = %self.watermark.path().display(),
                "Watermark requested but asset is missing, skipping overlay"
            );
            record_degradation("watermark");
        }

        let voice = obtain_voiceover(self.voiceover.as_ref(), request, status).await;
        if let Some(audio) = &voice {
            let path = dir.join(VOICEOVER_FILE);
            tokio::fs::write(&path, audio).await?;
            files = files.with_voiceover(path);
        }

        let spec = TransformSpec::build(&request.edit, watermark_present, voice.is_some());
        if spec.has_watermark() {
            files = files.with_watermark(self.watermark.path());
        }
        info!(stages = %spec.summary(), "Planned transform");

        let plan = EncodePlan::new(&spec, &files, &self.config.encoding)?;
        let runner = self.runner();

        status.report(PipelineStatus::Encoding);
        let on_event = status.event_callback();
        runner
            .run_with_progress(&plan.edit, move |event| on_event(event))
            .await?;

        if let Some(merge) = &plan.merge {
            status.report(PipelineStatus::Finalizing);
            let on_event = status.event_callback();
            runner
                .run_with_progress(merge, move |event| on_event(event))
                .await?;
        }

        let bytes = tokio::fs::read(plan.output_path()).await?;
        Ok(OutputMedia { bytes, spec })
    }
}

#[async_trait]
impl VideoPipeline for ProcessPipeline {
    fn backend_name(&self) -> &'static str {
        "process"
    }

    async fn process(
        &self,
        request: &PipelineRequest,
        status: &StatusReporter,
    ) -> MediaResult<OutputMedia> {
        let dir = self.scratch_dir().await?;
        let result = self.run_in(dir.path(), request, status).await;

        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            warn!(dir = %path.display(), error = %e, "Failed to remove scratch directory");
        }

        result
    }
}
