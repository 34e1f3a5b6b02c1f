//! Trim window definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Start used when the caller supplies nothing usable.
pub const DEFAULT_START_SECS: f64 = 0.0;
/// End used when the caller supplies nothing usable.
pub const DEFAULT_END_SECS: f64 = 15.0;
/// Shortest encode duration ever handed to the transcoder.
pub const MIN_DURATION_SECS: f64 = 1.0;

/// Time range cut out of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrimWindow {
    /// Start offset in seconds (never negative)
    pub start: f64,
    /// Requested end offset in seconds
    pub end: f64,
}

impl Default for TrimWindow {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_SECS,
            end: DEFAULT_END_SECS,
        }
    }
}

impl TrimWindow {
    /// Create a trim window. Negative or non-finite starts collapse to zero.
    pub fn new(start: f64, end: f64) -> Self {
        let start = if start.is_finite() { start.max(0.0) } else { DEFAULT_START_SECS };
        let end = if end.is_finite() { end } else { DEFAULT_END_SECS };
        Self { start, end }
    }

    /// Encode duration, floored at one second.
    ///
    /// A degenerate window (`end <= start`) still yields a one second clip
    /// instead of a transcoder failure.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(MIN_DURATION_SECS)
    }
}
