//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Human-readable status line.
    pub fn status_line(&self) -> String {
        if self.is_complete {
            return format!("frame={} done", self.frame);
        }
        format!(
            "frame={} time={} speed={:.2}x",
            self.frame,
            if self.out_time.is_empty() { "N/A" } else { &self.out_time },
            self.speed
        )
    }
}

/// Something the transcoder reported while running.
#[derive(Debug, Clone, PartialEq)]
pub enum FfmpegEvent {
    /// A complete `-progress` block.
    Progress(FfmpegProgress),
    /// Any other stderr line.
    Log(String),
}

/// Callback type for transcoder events.
pub type EventCallback = Arc<dyn Fn(FfmpegEvent) + Send + Sync + 'static>;

/// Result of feeding one stderr line to the parser.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParsedLine {
    /// A progress block finished.
    Block(FfmpegProgress),
    /// A progress key that updated state.
    Partial,
    /// Not part of the progress protocol.
    Other,
}

const PROGRESS_KEYS: &[&str] = &[
    "frame",
    "fps",
    "bitrate",
    "total_size",
    "out_time_us",
    "out_time_ms",
    "out_time",
    "dup_frames",
    "drop_frames",
    "speed",
    "progress",
];

/// Parse a line from FFmpeg's `-progress pipe:2` output.
pub(crate) fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> ParsedLine {
    let line = line.trim();

    let Some((key, value)) = line.split_once('=') else {
        return ParsedLine::Other;
    };
    if !PROGRESS_KEYS.contains(&key) && !key.starts_with("stream_") {
        return ParsedLine::Other;
    }

    match key {
        "out_time_ms" | "out_time_us" => {
            // Both keys carry microseconds in current FFmpeg builds
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "out_time" => current.out_time = value.to_string(),
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "fps" => {
            if let Ok(fps) = value.parse() {
                current.fps = fps;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            current.is_complete = value == "end";
            return ParsedLine::Block(current.clone());
        }
        _ => {}
    }

    ParsedLine::Partial
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        assert_eq!(parse_progress_line("out_time_us=5000000", &mut progress), ParsedLine::Partial);
        assert_eq!(progress.out_time_ms, 5000);

        parse_progress_line("speed=1.5x", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        parse_progress_line("speed=N/A", &mut progress);
        assert!((progress.speed - 1.5).abs() < 0.01);

        match parse_progress_line("progress=end", &mut progress) {
            ParsedLine::Block(block) => assert!(block.is_complete),
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn test_non_progress_lines() {
        let mut progress = FfmpegProgress::default();
        assert_eq!(
            parse_progress_line("input.mp4: Invalid data found when processing input", &mut progress),
            ParsedLine::Other
        );
        assert_eq!(
            parse_progress_line("[libx264 @ 0x1] crf=23.0 mode", &mut progress),
            ParsedLine::Other
        );
        assert_eq!(parse_progress_line("stream_0_0_q=28.0", &mut progress), ParsedLine::Partial);
    }

    #[test]
    fn test_status_line() {
        let progress = FfmpegProgress {
            frame: 42,
            out_time: "00:00:01.400000".to_string(),
            speed: 2.0,
            ..Default::default()
        };
        assert_eq!(progress.status_line(), "frame=42 time=00:00:01.400000 speed=2.00x");
    }
}
