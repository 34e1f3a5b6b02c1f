//! Transcoder command planning.
//!
//! Turns a `TransformSpec` into the FFmpeg invocations every backend runs:
//! an edit pass (trim, scale/pad, optional overlay, audio dropped) and, when
//! a voice-over is ready, a merge pass (shortest-stream truncation).
//! Backends only differ in how the file references are resolved.

use std::path::{Path, PathBuf};

use reel_models::{EncodingConfig, TransformSpec};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::{build_edit_filter, EditFilter};

/// File references used by a plan.
///
/// Paths are absolute for the process backend and bare names inside the
/// engine's private filesystem for the engine backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFiles {
    pub source: PathBuf,
    pub watermark: Option<PathBuf>,
    pub voiceover: Option<PathBuf>,
    pub edited: PathBuf,
    pub output: PathBuf,
}

impl MediaFiles {
    /// Standard file names rooted at `dir` (empty for engine-relative names).
    pub fn in_dir(dir: impl Into<PathBuf>, source_name: &str) -> Self {
        let dir = dir.into();
        Self {
            source: dir.join(source_name),
            watermark: None,
            voiceover: None,
            edited: dir.join(EDITED_FILE),
            output: dir.join(OUTPUT_FILE),
        }
    }

    pub fn with_watermark(mut self, path: impl Into<PathBuf>) -> Self {
        self.watermark = Some(path.into());
        self
    }

    pub fn with_voiceover(mut self, path: impl Into<PathBuf>) -> Self {
        self.voiceover = Some(path.into());
        self
    }
}

/// Name of the watermark copy inside a working directory.
pub const WATERMARK_FILE: &str = "watermark.png";
/// Name of the synthesized voice-over file.
pub const VOICEOVER_FILE: &str = "voice.mp3";
/// Name of the intermediate video-only file.
pub const EDITED_FILE: &str = "edited.mp4";
/// Name of the final output file.
pub const OUTPUT_FILE: &str = "output.mp4";

/// Input file name for an upload, keeping a sane extension.
pub fn source_file_name(original_filename: &str) -> String {
    let ext = std::path::Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "mp4".to_string());
    format!("input.{ext}")
}

/// The invocations realizing a spec.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePlan {
    /// Trim, scale/pad, optional watermark; source audio dropped.
    pub edit: FfmpegCommand,
    /// Voice-over merge, present only when the spec has an audio stage.
    pub merge: Option<FfmpegCommand>,
}

impl EncodePlan {
    /// Plan the commands for `spec` against `files`.
    pub fn new(spec: &TransformSpec, files: &MediaFiles, encoding: &EncodingConfig) -> MediaResult<Self> {
        let (start, duration) = spec.trim();
        let (width, height) = spec.frame_size();
        let merge_codec = spec.audio_merge_codec();

        // Without a merge pass the edit pass writes the final file
        let edit_output = if merge_codec.is_some() { &files.edited } else { &files.output };
        let mut edit = FfmpegCommand::new(edit_output).trimmed_input(&files.source, start, duration);

        if spec.has_watermark() {
            let watermark = files.watermark.as_ref().ok_or_else(|| {
                MediaError::internal("watermark stage planned without a watermark file")
            })?;
            edit = edit.input(watermark);
        }

        edit = match build_edit_filter(width, height, spec.watermark_margin()) {
            EditFilter::Simple(vf) => edit.video_filter(vf),
            EditFilter::Complex { graph, output_label } => edit.filter_complex(graph).map(output_label),
        };

        edit = edit.output_args(encoding.video_args()).no_audio();

        let merge = match merge_codec {
            Some(codec) => {
                let voiceover = files.voiceover.as_ref().ok_or_else(|| {
                    MediaError::internal("audio merge planned without a voice-over file")
                })?;
                let merge = FfmpegCommand::new(&files.output)
                    .input(&files.edited)
                    .input(voiceover)
                    .map("0:v:0")
                    .map("1:a:0")
                    .video_codec("copy")
                    .audio_codec(codec)
                    .shortest();
                Some(merge)
            }
            None => None,
        };

        let (edit, merge) = match (encoding.faststart, merge) {
            (true, Some(merge)) => (edit, Some(merge.faststart())),
            (true, None) => (edit.faststart(), None),
            (false, merge) => (edit, merge),
        };

        Ok(Self { edit, merge })
    }

    /// Commands in execution order.
    pub fn commands(&self) -> Vec<&FfmpegCommand> {
        std::iter::once(&self.edit).chain(self.merge.as_ref()).collect()
    }

    /// File holding the finished video once every command has run.
    pub fn output_path(&self) -> &Path {
        self.merge
            .as_ref()
            .map(FfmpegCommand::output_path)
            .unwrap_or_else(|| self.edit.output_path())
    }
}
