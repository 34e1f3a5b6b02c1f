//! Pipeline backends.
//!
//! - `process`: runs `ffmpeg` as a child process on the host
//! - `engine`: runs against a lazily loaded, shared transcoding engine

pub mod engine;
pub mod process;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use engine::{EngineLoader, EnginePipeline, SandboxEngine, SandboxLoader, SharedEngine, TranscodeEngine};
pub use process::{ProcessPipeline, ProcessPipelineConfig};

/// Which backend executes the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Process,
    Engine,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Process => "process",
            BackendKind::Engine => "engine",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "process" | "server" => Ok(BackendKind::Process),
            "engine" | "client" => Ok(BackendKind::Engine),
            other => Err(format!("unknown pipeline backend: {other}")),
        }
    }
}
