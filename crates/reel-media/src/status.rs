//! Human-readable pipeline status lines.
//!
//! Status lines are a side channel for display only; nothing in the
//! pipeline branches on them.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::progress::{EventCallback, FfmpegEvent};

/// A status update emitted during one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStatus {
    LoadingEngine,
    Uploading,
    SynthesizingVoice,
    Encoding,
    Finalizing,
    /// Progress block reported by the transcoder.
    Progress(String),
    /// Log line reported by the transcoder.
    Log(String),
    Done,
    /// Terminal failure.
    Error(String),
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStatus::LoadingEngine => f.write_str("Loading transcoder..."),
            PipelineStatus::Uploading => f.write_str("Uploading..."),
            PipelineStatus::SynthesizingVoice => f.write_str("Generating voice-over..."),
            PipelineStatus::Encoding => f.write_str("Encoding video..."),
            PipelineStatus::Finalizing => f.write_str("Finalizing audio..."),
            PipelineStatus::Progress(line) | PipelineStatus::Log(line) => f.write_str(line),
            PipelineStatus::Done => f.write_str("Done"),
            PipelineStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

impl From<FfmpegEvent> for PipelineStatus {
    fn from(event: FfmpegEvent) -> Self {
        match event {
            FfmpegEvent::Progress(progress) => PipelineStatus::Progress(progress.status_line()),
            FfmpegEvent::Log(line) => PipelineStatus::Log(line),
        }
    }
}

/// Receives status updates.
pub type StatusSink = Arc<dyn Fn(&PipelineStatus) + Send + Sync + 'static>;

/// Fan-out point for status updates; silent when no sink is attached.
#[derive(Clone, Default)]
pub struct StatusReporter {
    sink: Option<StatusSink>,
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}

impl StatusReporter {
    /// Reporter that only traces.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Reporter forwarding to `sink`.
    pub fn new(sink: StatusSink) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn report(&self, status: PipelineStatus) {
        debug!(status = %status, "Pipeline status");
        if let Some(sink) = &self.sink {
            sink(&status);
        }
    }

    /// Transcoder event callback forwarding into this reporter.
    pub fn event_callback(&self) -> EventCallback {
        let reporter = self.clone();
        Arc::new(move |event: FfmpegEvent| reporter.report(event.into()))
    }
}
