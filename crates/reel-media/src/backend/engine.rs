//! Engine backend: an in-process transcoder with its own private filesystem.
//!
//! Inputs are written into the engine's filesystem by name, the same command
//! plan as the process backend is executed against those names, and the
//! result is read back out. The engine is loaded on first use and then
//! shared; one invocation holds it at a time. Files stay in the engine
//! filesystem until the engine is dropped and are overwritten by the next
//! invocation.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tracing::{debug, info, warn};

use reel_models::{EncodingConfig, TransformSpec};

use crate::command::{check_ffmpeg, FfmpegRunner, DEFAULT_FFMPEG_PROGRAM};
use crate::error::{MediaError, MediaResult};
use crate::pipeline::{
    obtain_voiceover, record_degradation, OutputMedia, PipelineRequest, VideoPipeline, VoiceoverProvider,
};
use crate::plan::{source_file_name, EncodePlan, MediaFiles, OUTPUT_FILE, VOICEOVER_FILE, WATERMARK_FILE};
use crate::progress::EventCallback;
use crate::status::{PipelineStatus, StatusReporter};
use crate::watermark::WatermarkAsset;

/// A loaded transcoder with a private, name-addressed filesystem.
#[async_trait]
pub trait TranscodeEngine: Send {
    /// Store `data` under `name`, replacing any previous file.
    async fn write_file(&mut self, name: &str, data: &[u8]) -> MediaResult<()>;

    /// Read back the file stored under `name`.
    async fn read_file(&mut self, name: &str) -> MediaResult<Vec<u8>>;

    /// Run one transcoder command; `args` refer to files by name.
    async fn exec(&mut self, args: Vec<String>, on_event: EventCallback) -> MediaResult<()>;
}

/// Produces an engine the first time one is needed.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    type Engine: TranscodeEngine + 'static;

    async fn load(&self) -> MediaResult<Self::Engine>;
}

/// Lazily loaded engine shared across invocations.
///
/// A failed load leaves the cell empty so the next invocation retries.
pub struct SharedEngine<L: EngineLoader> {
    loader: L,
    engine: OnceCell<Mutex<L::Engine>>,
}

impl<L: EngineLoader> SharedEngine<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            engine: OnceCell::new(),
        }
    }

    /// Whether the engine has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    /// Load if needed, then take exclusive use of the engine.
    pub async fn acquire(&self, status: &StatusReporter) -> MediaResult<MutexGuard<'_, L::Engine>> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                status.report(PipelineStatus::LoadingEngine);
                info!("Loading transcoding engine");
                let engine = self.loader.load().await?;
                info!("Transcoding engine loaded");
                Ok::<_, MediaError>(Mutex::new(engine))
            })
            .await?;

        Ok(engine.lock().await)
    }
}

/// Pipeline running against a [`SharedEngine`].
pub struct EnginePipeline<L: EngineLoader> {
    engine: SharedEngine<L>,
    watermark: WatermarkAsset,
    encoding: EncodingConfig,
    voiceover: Option<Arc<dyn VoiceoverProvider>>,
}

impl<L: EngineLoader> EnginePipeline<L> {
    pub fn new(loader: L, watermark: WatermarkAsset, encoding: EncodingConfig) -> Self {
        Self {
            engine: SharedEngine::new(loader),
            watermark,
            encoding,
            voiceover: None,
        }
    }

    /// Attach a voice-over provider.
    pub fn with_voiceover(mut self, provider: Arc<dyn VoiceoverProvider>) -> Self {
        self.voiceover = Some(provider);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_loaded()
    }
}

#[async_trait]
impl<L: EngineLoader + 'static> VideoPipeline for EnginePipeline<L> {
    fn backend_name(&self) -> &'static str {
        "engine"
    }

    async fn process(
        &self,
        request: &PipelineRequest,
        status: &StatusReporter,
    ) -> MediaResult<OutputMedia> {
        let mut engine = self.engine.acquire(status).await?;

        status.report(PipelineStatus::Uploading);
        let source_name = source_file_name(&request.source.filename);
        engine.write_file(&source_name, &request.source.bytes).await?;
        let mut files = MediaFiles::in_dir("", &source_name);

        let mut watermark_present = false;
        if request.edit.enable_watermark {
            match self.watermark.read().await {
                Ok(image) => {
                    engine.write_file(WATERMARK_FILE, &image).await?;
                    watermark_present = true;
                }
                Err(e) => {
                    warn!(error = %e, "Watermark unavailable, skipping overlay");
                    record_degradation("watermark");
                }
            }
        }

        let voice = obtain_voiceover(self.voiceover.as_ref(), request, status).await;
        if let Some(audio) = &voice {
            engine.write_file(VOICEOVER_FILE, audio).await?;
            files = files.with_voiceover(VOICEOVER_FILE);
        }

        let spec = TransformSpec::build(&request.edit, watermark_present, voice.is_some());
        if spec.has_watermark() {
            files = files.with_watermark(WATERMARK_FILE);
        }
        info!(stages = %spec.summary(), "Planned transform");

        let plan = EncodePlan::new(&spec, &files, &self.encoding)?;

        status.report(PipelineStatus::Encoding);
        engine.exec(plan.edit.build_args(), status.event_callback()).await?;

        if let Some(merge) = &plan.merge {
            status.report(PipelineStatus::Finalizing);
            engine.exec(merge.build_args(), status.event_callback()).await?;
        }

        let bytes = engine.read_file(OUTPUT_FILE).await?;
        Ok(OutputMedia { bytes, spec })
    }
}

/// Engine backed by the local `ffmpeg` binary, sandboxed to a private
/// directory that lives as long as the engine.
pub struct SandboxEngine {
    root: TempDir,
    runner: FfmpegRunner,
}

impl SandboxEngine {
    fn resolve(&self, name: &str) -> MediaResult<PathBuf> {
        validate_file_name(name)?;
        Ok(self.root.path().join(name))
    }
}

#[async_trait]
impl TranscodeEngine for SandboxEngine {
    async fn write_file(&mut self, name: &str, data: &[u8]) -> MediaResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, data).await?;
        debug!(name, size = data.len(), "Engine file written");
        Ok(())
    }

    async fn read_file(&mut self, name: &str) -> MediaResult<Vec<u8>> {
        let path = self.resolve(name)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::FileNotFound(PathBuf::from(name))
            } else {
                MediaError::Io(e)
            }
        })
    }

    async fn exec(&mut self, args: Vec<String>, on_event: EventCallback) -> MediaResult<()> {
        self.runner.run_args(args, move |event| on_event(event)).await
    }
}

/// Loads a [`SandboxEngine`].
#[derive(Debug, Clone)]
pub struct SandboxLoader {
    ffmpeg_program: String,
    scratch_root: PathBuf,
}

impl Default for SandboxLoader {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG_PROGRAM, std::env::temp_dir())
    }
}

impl SandboxLoader {
    pub fn new(ffmpeg_program: impl Into<String>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_program: ffmpeg_program.into(),
            scratch_root: scratch_root.into(),
        }
    }
}

#[async_trait]
impl EngineLoader for SandboxLoader {
    type Engine = SandboxEngine;

    async fn load(&self) -> MediaResult<SandboxEngine> {
        check_ffmpeg(&self.ffmpeg_program).map_err(|e| MediaError::engine_load(e.to_string()))?;

        tokio::fs::create_dir_all(&self.scratch_root)
            .await
            .map_err(|e| MediaError::engine_load(format!("cannot create engine filesystem: {e}")))?;
        let root = tempfile::Builder::new()
            .prefix("reel-engine-")
            .tempdir_in(&self.scratch_root)
            .map_err(|e| MediaError::engine_load(format!("cannot create engine filesystem: {e}")))?;

        let runner = FfmpegRunner::new()
            .with_program(&self.ffmpeg_program)
            .with_current_dir(root.path());

        Ok(SandboxEngine { root, runner })
    }
}

/// Engine file names are flat: no separators, no parent references.
fn validate_file_name(name: &str) -> MediaResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(MediaError::SecurityViolation(format!("invalid engine file name: {name:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::ScriptedVoice;
    use crate::pipeline::{run_pipeline, SourceMedia};
    use reel_models::{EditRequest, TrimWindow};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct EngineLog {
        writes: Vec<String>,
        execs: Vec<Vec<String>>,
    }

    struct FakeEngine {
        files: HashMap<String, Vec<u8>>,
        log: Arc<StdMutex<EngineLog>>,
        fail_exec: bool,
    }

    #[async_trait]
    impl TranscodeEngine for FakeEngine {
        async fn write_file(&mut self, name: &str, data: &[u8]) -> MediaResult<()> {
            self.log.lock().unwrap().writes.push(name.to_string());
            self.files.insert(name.to_string(), data.to_vec());
            Ok(())
        }

        async fn read_file(&mut self, name: &str) -> MediaResult<Vec<u8>> {
            self.files
                .get(name)
                .cloned()
                .ok_or_else(|| MediaError::FileNotFound(PathBuf::from(name)))
        }

        async fn exec(&mut self, args: Vec<String>, _on_event: EventCallback) -> MediaResult<()> {
            self.log.lock().unwrap().execs.push(args.clone());
            if self.fail_exec {
                return Err(MediaError::ffmpeg_failed("Invalid data found when processing input", None, Some(1)));
            }
            let output = args.last().cloned().unwrap_or_default();
            self.files.insert(output.clone(), format!("encoded:{output}").into_bytes());
            Ok(())
        }
    }

    struct FakeLoader {
        loads: Arc<AtomicUsize>,
        failures_left: AtomicUsize,
        log: Arc<StdMutex<EngineLog>>,
        fail_exec: bool,
    }

    impl FakeLoader {
        fn new(failures: usize, fail_exec: bool) -> (Self, Arc<AtomicUsize>, Arc<StdMutex<EngineLog>>) {
            let loads = Arc::new(AtomicUsize::new(0));
            let log = Arc::new(StdMutex::new(EngineLog::default()));
            let loader = Self {
                loads: Arc::clone(&loads),
                failures_left: AtomicUsize::new(failures),
                log: Arc::clone(&log),
                fail_exec,
            };
            (loader, loads, log)
        }
    }

    #[async_trait]
    impl EngineLoader for FakeLoader {
        type Engine = FakeEngine;

        async fn load(&self) -> MediaResult<FakeEngine> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(MediaError::engine_load("network error"));
            }
            Ok(FakeEngine {
                files: HashMap::new(),
                log: Arc::clone(&self.log),
                fail_exec: self.fail_exec,
            })
        }
    }

    fn request(enable_watermark: bool, use_voice: bool) -> PipelineRequest {
        PipelineRequest {
            source: SourceMedia::new("holiday.mov", b"source".to_vec()),
            edit: EditRequest {
                trim: TrimWindow::new(2.0, 12.0),
                use_voice,
                enable_watermark,
                caption: "Sunny day".to_string(),
            },
        }
    }

    fn missing_watermark() -> WatermarkAsset {
        WatermarkAsset::new("/nonexistent/watermark.png")
    }

    #[tokio::test]
    async fn test_engine_loaded_once_and_reused() {
        let (loader, loads, _log) = FakeLoader::new(0, false);
        let pipeline = EnginePipeline::new(loader, missing_watermark(), EncodingConfig::default());
        assert!(!pipeline.is_loaded());

        for _ in 0..2 {
            pipeline
                .process(&request(false, false), &StatusReporter::silent())
                .await
                .unwrap();
        }

        assert!(pipeline.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let (loader, loads, _log) = FakeLoader::new(1, false);
        let pipeline = EnginePipeline::new(loader, missing_watermark(), EncodingConfig::default());

        let err = pipeline
            .process(&request(false, false), &StatusReporter::silent())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EngineLoad(_)));
        assert!(!pipeline.is_loaded());

        pipeline
            .process(&request(false, false), &StatusReporter::silent())
            .await
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_pass_without_voiceover() {
        let (loader, _loads, log) = FakeLoader::new(0, false);
        let pipeline = EnginePipeline::new(loader, missing_watermark(), EncodingConfig::default());

        let output = pipeline
            .process(&request(false, false), &StatusReporter::silent())
            .await
            .unwrap();
        assert_eq!(output.bytes, b"encoded:output.mp4");
        assert_eq!(output.content_type(), "video/mp4");

        let log = log.lock().unwrap();
        assert_eq!(log.writes, vec!["input.mov"]);
        assert_eq!(log.execs.len(), 1);

        let edit = &log.execs[0];
        assert!(edit.contains(&"input.mov".to_string()));
        assert!(edit.contains(&"-an".to_string()));
        assert_eq!(edit[edit.iter().position(|a| a == "-t").unwrap() + 1], "10.000");
        assert_eq!(edit.last().unwrap(), "output.mp4");
    }

    #[tokio::test]
    async fn test_missing_watermark_skips_overlay() {
        let (loader, _loads, log) = FakeLoader::new(0, false);
        let pipeline = EnginePipeline::new(loader, missing_watermark(), EncodingConfig::default());

        let output = pipeline
            .process(&request(true, false), &StatusReporter::silent())
            .await
            .unwrap();
        assert!(!output.spec.has_watermark());

        let log = log.lock().unwrap();
        assert!(!log.writes.contains(&WATERMARK_FILE.to_string()));
        assert!(!log.execs[0].contains(&"-filter_complex".to_string()));
    }

    #[tokio::test]
    async fn test_present_watermark_is_overlaid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("watermark.png");
        std::fs::write(&path, b"png").unwrap();

        let (loader, _loads, log) = FakeLoader::new(0, false);
        let pipeline = EnginePipeline::new(loader, WatermarkAsset::new(&path), EncodingConfig::default());

        let output = pipeline
            .process(&request(true, false), &StatusReporter::silent())
            .await
            .unwrap();
        assert!(output.spec.has_watermark());

        let log = log.lock().unwrap();
        assert_eq!(log.writes, vec!["input.mov", "watermark.png"]);
        let edit = &log.execs[0];
        assert!(edit.contains(&"-filter_complex".to_string()));
        assert!(edit.contains(&"watermark.png".to_string()));
    }

    #[tokio::test]
    async fn test_voiceover_merged_when_available() {
        let (loader, _loads, log) = FakeLoader::new(0, false);
        let voice = ScriptedVoice::new(Ok(b"mp3".to_vec()));
        let pipeline = EnginePipeline::new(loader, missing_watermark(), EncodingConfig::default())
            .with_voiceover(voice.clone());

        let output = pipeline
            .process(&request(false, true), &StatusReporter::silent())
            .await
            .unwrap();
        assert!(output.spec.has_audio_merge());
        assert_eq!(voice.texts.lock().unwrap()[0], "Sunny day");

        let log = log.lock().unwrap();
        assert!(log.writes.contains(&VOICEOVER_FILE.to_string()));
        assert_eq!(log.execs.len(), 2);
        assert_eq!(log.execs[0].last().unwrap(), "edited.mp4");
        let merge = &log.execs[1];
        assert!(merge.contains(&"edited.mp4".to_string()));
        assert!(merge.contains(&"voice.mp3".to_string()));
        assert!(merge.contains(&"-shortest".to_string()));
        assert_eq!(merge.last().unwrap(), "output.mp4");
    }

    #[tokio::test]
    async fn test_voiceover_failure_produces_silent_video() {
        let (loader, _loads, log) = FakeLoader::new(0, false);
        let voice = ScriptedVoice::new(Err(MediaError::voiceover("quota exceeded")));
        let pipeline = EnginePipeline::new(loader, missing_watermark(), EncodingConfig::default())
            .with_voiceover(voice);

        let output = pipeline
            .process(&request(false, true), &StatusReporter::silent())
            .await
            .unwrap();
        assert!(!output.spec.has_audio_merge());

        let log = log.lock().unwrap();
        assert!(!log.writes.contains(&VOICEOVER_FILE.to_string()));
        assert_eq!(log.execs.len(), 1);
        assert!(log.execs[0].contains(&"-an".to_string()));
    }

    #[tokio::test]
    async fn test_exec_failure_reports_error_status() {
        let (loader, _loads, log) = FakeLoader::new(0, true);
        let pipeline = EnginePipeline::new(loader, missing_watermark(), EncodingConfig::default());

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let reporter = StatusReporter::new(Arc::new(move |s: &PipelineStatus| {
            sink_seen.lock().unwrap().push(s.clone());
        }));

        let err = run_pipeline(&pipeline, &request(false, false), &reporter)
            .await
            .unwrap_err();
        assert!(err.is_transform_failure());

        // Stops at the first failing command
        assert_eq!(log.lock().unwrap().execs.len(), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&PipelineStatus::LoadingEngine));
        assert!(seen.contains(&PipelineStatus::Encoding));
        assert!(!seen.contains(&PipelineStatus::Finalizing));
        assert_eq!(
            seen.last().unwrap().to_string(),
            "Error: FFmpeg command failed: Invalid data found when processing input"
        );
    }

    #[test]
    fn test_engine_file_names_are_flat() {
        assert!(validate_file_name("input.mp4").is_ok());
        assert!(validate_file_name("../etc/passwd").is_err());
        assert!(validate_file_name("a/b.mp4").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("").is_err());
    }

    #[tokio::test]
    async fn test_sandbox_loader_requires_binary() {
        let dir = TempDir::new().unwrap();
        let loader = SandboxLoader::new("definitely-not-ffmpeg-binary", dir.path());
        assert!(matches!(loader.load().await, Err(MediaError::EngineLoad(_))));
    }
}
