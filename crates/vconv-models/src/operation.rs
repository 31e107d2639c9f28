//! Operation identifiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Every transcoding operation the toolbox exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Drop the audio stream, copy video as-is
    MuteVideo,
    /// Extract the audio track to MP3
    Mp4ToMp3,
    /// Convert a clip to an animated GIF
    VideoToGif,
    /// Convert an animated GIF to MP4
    GifToMp4,
    /// Cut a segment without re-encoding
    TrimVideo,
    /// Speed up or slow down playback
    SpeedVideo,
    /// Fit into a target box, letterboxing as needed
    ResizeVideo,
    /// Re-encode at a lower quality tier
    CompressVideo,
    /// Rotate by a multiple of 90 degrees
    RotateVideo,
    /// Mirror horizontally or vertically
    FlipVideo,
    MovToMp4,
    WebmToMp4,
    MkvToMp4,
    AviToMp4,
    Mp4ToWebm,
}

impl Operation {
    /// All operations, in catalogue order.
    pub const ALL: &'static [Operation] = &[
        Operation::MuteVideo,
        Operation::Mp4ToMp3,
        Operation::VideoToGif,
        Operation::GifToMp4,
        Operation::TrimVideo,
        Operation::SpeedVideo,
        Operation::ResizeVideo,
        Operation::CompressVideo,
        Operation::RotateVideo,
        Operation::FlipVideo,
        Operation::MovToMp4,
        Operation::WebmToMp4,
        Operation::MkvToMp4,
        Operation::AviToMp4,
        Operation::Mp4ToWebm,
    ];

    /// Returns the wire identifier (also used in output filenames).
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::MuteVideo => "mute-video",
            Operation::Mp4ToMp3 => "mp4-to-mp3",
            Operation::VideoToGif => "video-to-gif",
            Operation::GifToMp4 => "gif-to-mp4",
            Operation::TrimVideo => "trim-video",
            Operation::SpeedVideo => "speed-video",
            Operation::ResizeVideo => "resize-video",
            Operation::CompressVideo => "compress-video",
            Operation::RotateVideo => "rotate-video",
            Operation::FlipVideo => "flip-video",
            Operation::MovToMp4 => "mov-to-mp4",
            Operation::WebmToMp4 => "webm-to-mp4",
            Operation::MkvToMp4 => "mkv-to-mp4",
            Operation::AviToMp4 => "avi-to-mp4",
            Operation::Mp4ToWebm => "mp4-to-webm",
        }
    }

    /// Whether the operation takes no user parameters.
    pub fn is_fixed_preset(&self) -> bool {
        matches!(
            self,
            Operation::MuteVideo
                | Operation::Mp4ToMp3
                | Operation::GifToMp4
                | Operation::MovToMp4
                | Operation::WebmToMp4
                | Operation::MkvToMp4
                | Operation::AviToMp4
                | Operation::Mp4ToWebm
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| OperationError::Unsupported(s.to_string()))
    }
}

/// Errors raised while turning caller input into a typed operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid parameters for {operation}: {message}")]
    InvalidParams {
        operation: Operation,
        message: String,
    },
}
