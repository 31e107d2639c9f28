//! Encoding presets and per-operation parameter defaults.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF for container re-encodes
pub const DEFAULT_CRF: u8 = 23;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// WebM target codecs
pub const WEBM_VIDEO_CODEC: &str = "libvpx-vp9";
pub const WEBM_AUDIO_CODEC: &str = "libopus";
pub const WEBM_CRF: u8 = 30;

/// MP3 extraction settings (VBR quality tier)
pub const MP3_AUDIO_CODEC: &str = "libmp3lame";
pub const MP3_QUALITY: &str = "2";

/// GIF export defaults
pub const DEFAULT_GIF_FPS: u32 = 10;
pub const DEFAULT_GIF_WIDTH: u32 = 480;
pub const MAX_GIF_FPS: u32 = 60;

/// Trim defaults (seconds, passed through verbatim)
pub const DEFAULT_TRIM_START: &str = "0";
pub const DEFAULT_TRIM_DURATION: &str = "10";

/// Speed change defaults. Inside the inclusive range audio is kept and
/// re-timed with `atempo`; outside it audio is dropped.
pub const DEFAULT_SPEED: f64 = 1.5;
pub const SPEED_WITH_AUDIO_MIN: f64 = 0.5;
pub const SPEED_WITH_AUDIO_MAX: f64 = 2.0;

/// Resize target box
pub const DEFAULT_RESIZE_WIDTH: u32 = 1280;
pub const DEFAULT_RESIZE_HEIGHT: u32 = 720;

/// Smallest frame dimension accepted by the scale filters
pub const MIN_DIMENSION: u32 = 2;

/// Compression tiers (CRF)
pub const COMPRESS_CRF_LOW: u8 = 35;
pub const COMPRESS_CRF_MEDIUM: u8 = 28;
pub const COMPRESS_CRF_HIGH: u8 = 18;
pub const COMPRESS_PRESET: &str = "medium";

/// Video encoding configuration used by the re-encoding operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264", "libvpx-vp9")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium"). Ignored by codecs without presets.
    #[serde(default)]
    pub preset: Option<String>,

    /// Constant Rate Factor (quality, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Move the moov atom to the front for progressive playback
    #[serde(default)]
    pub faststart: bool,

    /// Use constant-quality mode (`-b:v 0`), required by VP9 for CRF to apply
    #[serde(default)]
    pub constant_quality: bool,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: Some(DEFAULT_PRESET.to_string()),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            faststart: false,
            constant_quality: false,
        }
    }
}

impl EncodingConfig {
    /// H.264/AAC profile playable nearly everywhere, used by the `*-to-mp4` operations.
    pub fn compatible_mp4() -> Self {
        Self {
            faststart: true,
            ..Default::default()
        }
    }

    /// VP9/Opus profile for WebM output.
    pub fn webm() -> Self {
        Self {
            codec: WEBM_VIDEO_CODEC.to_string(),
            preset: None,
            crf: WEBM_CRF,
            audio_codec: WEBM_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            faststart: false,
            constant_quality: true,
        }
    }

    /// Profile used by `compress-video`; only the CRF varies between tiers.
    pub fn for_compression(crf: u8) -> Self {
        Self::default()
            .with_crf(crf)
            .with_preset(COMPRESS_PRESET)
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Returns a new config with updated preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }
}
