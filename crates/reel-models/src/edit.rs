//! Edit parameters derived from raw form fields.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::trim::{TrimWindow, DEFAULT_END_SECS, DEFAULT_START_SECS};

/// Sentinel value that turns a boolean form flag on.
pub const FLAG_ENABLED: &str = "1";

/// Form fields exactly as the caller sent them.
///
/// Every field is optional; `EditRequest::derive` applies the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawEditFields {
    pub start: Option<String>,
    pub end: Option<String>,
    pub use_voice: Option<String>,
    pub enable_watermark: Option<String>,
    pub caption: Option<String>,
}

impl RawEditFields {
    /// Record a named form field. Unknown names are ignored, and a repeated
    /// field keeps its first value.
    ///
    /// Returns `true` if the name was recognised.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let slot = match name {
            "start" => &mut self.start,
            "end" => &mut self.end,
            "useVoice" => &mut self.use_voice,
            "enableWatermark" => &mut self.enable_watermark,
            "caption" => &mut self.caption,
            _ => return false,
        };
        if slot.is_none() {
            *slot = Some(value.into());
        }
        true
    }
}

/// Validated edit parameters for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EditRequest {
    pub trim: TrimWindow,
    pub use_voice: bool,
    pub enable_watermark: bool,
    pub caption: String,
}

impl Default for EditRequest {
    fn default() -> Self {
        Self::derive(&RawEditFields::default())
    }
}

impl EditRequest {
    /// Turn raw form fields into edit parameters.
    ///
    /// Never fails: missing or non-numeric times take their defaults and
    /// flags are only on for an exact `"1"`.
    pub fn derive(raw: &RawEditFields) -> Self {
        let start = parse_seconds(raw.start.as_deref()).unwrap_or(DEFAULT_START_SECS);
        let end = parse_seconds(raw.end.as_deref()).unwrap_or(DEFAULT_END_SECS);

        Self {
            trim: TrimWindow::new(start, end),
            use_voice: is_flag_set(raw.use_voice.as_deref()),
            enable_watermark: is_flag_set(raw.enable_watermark.as_deref()),
            caption: raw.caption.clone().unwrap_or_default(),
        }
    }
}

fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn is_flag_set(value: Option<&str>) -> bool {
    value == Some(FLAG_ENABLED)
}
