//! Engine progress parsing (`-progress pipe:2` key/value stream).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Progress information reported while the engine runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscodeProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

/// Callback type for progress updates.
pub type ProgressCallback = Arc<dyn Fn(TranscodeProgress) + Send + Sync + 'static>;

/// What a single stderr line turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressLine {
    /// A `key=value` pair that was folded into the running progress
    Field,
    /// End of a progress block; carries the accumulated snapshot
    Snapshot(TranscodeProgress),
    /// Anything else (engine diagnostics)
    Diagnostic,
}

/// Parse a line from the engine's progress output into `current`.
pub fn parse_progress_line(line: &str, current: &mut TranscodeProgress) -> ProgressLine {
    let line = line.trim();

    let Some((key, value)) = line.split_once('=') else {
        return ProgressLine::Diagnostic;
    };
    if key.is_empty() || key.contains(char::is_whitespace) {
        return ProgressLine::Diagnostic;
    }

    match key {
        "out_time_ms" | "out_time_us" => {
            // Despite the name, ffmpeg reports out_time_ms in microseconds as well
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
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
            // Format: "1.5x" or "N/A"
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            return ProgressLine::Snapshot(current.clone());
        }
        _ => {}
    }

    ProgressLine::Field
}
