//! Ordered transform specification.
//!
//! `TransformSpec` is the single description of what happens to an upload.
//! Both pipeline backends plan their transcoder commands from it, so the
//! stage order cannot differ between them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::edit::EditRequest;
use crate::encoding::DEFAULT_AUDIO_CODEC;

/// Output frame width (portrait 9:16)
pub const TARGET_WIDTH: u32 = 1080;
/// Output frame height (portrait 9:16)
pub const TARGET_HEIGHT: u32 = 1920;
/// Gap between the watermark and the right/bottom frame edges, in pixels
pub const WATERMARK_MARGIN: u32 = 10;

/// One media-editing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum TransformStage {
    /// Cut `duration` seconds starting at `start`.
    Trim { start: f64, duration: f64 },
    /// Fit inside the target frame keeping aspect ratio, pad centered, square pixels.
    ScalePad { width: u32, height: u32 },
    /// Composite the watermark at native size in the bottom-right corner.
    OverlayWatermark { margin: u32 },
    /// Attach the voice-over as the only audio stream, capped to the shorter stream.
    MergeAudio { codec: String, shortest: bool },
}

impl TransformStage {
    /// Short stage name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            TransformStage::Trim { .. } => "trim",
            TransformStage::ScalePad { .. } => "scale_pad",
            TransformStage::OverlayWatermark { .. } => "overlay_watermark",
            TransformStage::MergeAudio { .. } => "merge_audio",
        }
    }
}

impl fmt::Display for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of stages: trim, scale-pad, optional overlay, optional audio merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransformSpec {
    stages: Vec<TransformStage>,
}

impl TransformSpec {
    /// Build the stage list for one invocation.
    ///
    /// * `watermark_present` - the watermark asset was found at invocation time
    /// * `voiceover_ready` - synthesized audio is available to merge
    pub fn build(request: &EditRequest, watermark_present: bool, voiceover_ready: bool) -> Self {
        let mut stages = vec![
            TransformStage::Trim {
                start: request.trim.start,
                duration: request.trim.duration(),
            },
            TransformStage::ScalePad {
                width: TARGET_WIDTH,
                height: TARGET_HEIGHT,
            },
        ];

        if request.enable_watermark && watermark_present {
            stages.push(TransformStage::OverlayWatermark {
                margin: WATERMARK_MARGIN,
            });
        }

        if request.use_voice && voiceover_ready {
            stages.push(TransformStage::MergeAudio {
                codec: DEFAULT_AUDIO_CODEC.to_string(),
                shortest: true,
            });
        }

        Self { stages }
    }

    /// Stages in execution order.
    pub fn stages(&self) -> &[TransformStage] {
        &self.stages
    }

    /// Trim start and duration.
    pub fn trim(&self) -> (f64, f64) {
        self.stages
            .iter()
            .find_map(|s| match s {
                TransformStage::Trim { start, duration } => Some((*start, *duration)),
                _ => None,
            })
            .unwrap_or((0.0, crate::trim::MIN_DURATION_SECS))
    }

    /// Target frame size of the scale-pad stage.
    pub fn frame_size(&self) -> (u32, u32) {
        self.stages
            .iter()
            .find_map(|s| match s {
                TransformStage::ScalePad { width, height } => Some((*width, *height)),
                _ => None,
            })
            .unwrap_or((TARGET_WIDTH, TARGET_HEIGHT))
    }

    /// Watermark margin when the overlay stage is present.
    pub fn watermark_margin(&self) -> Option<u32> {
        self.stages.iter().find_map(|s| match s {
            TransformStage::OverlayWatermark { margin } => Some(*margin),
            _ => None,
        })
    }

    /// Audio codec when the merge stage is present.
    pub fn audio_merge_codec(&self) -> Option<&str> {
        self.stages.iter().find_map(|s| match s {
            TransformStage::MergeAudio { codec, .. } => Some(codec.as_str()),
            _ => None,
        })
    }

    pub fn has_watermark(&self) -> bool {
        self.watermark_margin().is_some()
    }

    pub fn has_audio_merge(&self) -> bool {
        self.audio_merge_codec().is_some()
    }

    /// Stage names joined with arrows, for logs.
    pub fn summary(&self) -> String {
        self.stages
            .iter()
            .map(TransformStage::name)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
