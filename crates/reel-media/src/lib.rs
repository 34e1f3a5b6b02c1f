#![deny(unreachable_patterns)]
//! FFmpeg-driven video transform pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a progress-parsing runner
//! - The encode plan (edit pass, then an optional audio merge) derived from a `TransformSpec`
//! - A process backend and an engine backend behind one `VideoPipeline` trait
//! - Status reporting for display surfaces

pub mod backend;
pub mod command;
pub mod error;
pub mod filters;
pub mod pipeline;
pub mod plan;
pub mod probe;
pub mod progress;
pub mod status;
pub mod watermark;

pub use backend::{
    BackendKind, EngineLoader, EnginePipeline, ProcessPipeline, ProcessPipelineConfig, SandboxEngine,
    SandboxLoader, SharedEngine, TranscodeEngine,
};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use pipeline::{run_pipeline, OutputMedia, PipelineRequest, SourceMedia, VideoPipeline, VoiceoverProvider};
pub use plan::{EncodePlan, MediaFiles};
pub use probe::{probe_video, VideoInfo};
pub use progress::{EventCallback, FfmpegEvent, FfmpegProgress};
pub use status::{PipelineStatus, StatusReporter, StatusSink};
pub use watermark::WatermarkAsset;
