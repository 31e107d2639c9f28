//! Typed per-operation parameters.
//!
//! Callers (form fields, query strings, CLI flags) rarely agree on whether a
//! number arrives as `10` or `"10"`, so every scalar field accepts both, and
//! `null` or a blank string means "use the default". Enum style fields
//! (`quality`, `rotation`, `direction`) never fail to parse: unrecognized
//! values of any type resolve to the documented fallback tier.

use schemars::JsonSchema;
use serde::de::{DeserializeOwned, Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

use crate::encoding::{
    COMPRESS_CRF_HIGH, COMPRESS_CRF_LOW, COMPRESS_CRF_MEDIUM, DEFAULT_GIF_FPS, DEFAULT_GIF_WIDTH,
    DEFAULT_RESIZE_HEIGHT, DEFAULT_RESIZE_WIDTH, DEFAULT_SPEED, DEFAULT_TRIM_DURATION,
    DEFAULT_TRIM_START,
};
use crate::operation::{Operation, OperationError};

/// A JSON value as sent by loosely typed callers.
///
/// `Other` absorbs anything that is not a number or string (including
/// `null`) so enum-style fields can fall back instead of failing.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Absent, `null` and blank values resolve to `None` (the field default).
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None | Some(Scalar::Other(_)) => Ok(None),
        Some(Scalar::Int(i)) => Ok(Some(i.to_string())),
        Some(Scalar::Float(f)) => Ok(Some(f.to_string())),
        Some(Scalar::Text(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let invalid = |shown: String| {
        D::Error::custom(format!("expected a non-negative integer, got {}", shown))
    };
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(Scalar::Int(i)) => u32::try_from(i).map(Some).map_err(|_| invalid(i.to_string())),
        Some(Scalar::Float(f)) if f.is_finite() && (0.0..=u32::MAX as f64).contains(&f) => {
            Ok(Some(f.round() as u32))
        }
        Some(Scalar::Float(f)) => Err(invalid(f.to_string())),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| invalid(format!("{:?}", s))),
        Some(Scalar::Other(_)) => Err(invalid("a non-numeric value".to_string())),
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<Scalar>::deserialize(d)? {
        None => Ok(None),
        Some(Scalar::Int(i)) => Ok(Some(i as f64)),
        Some(Scalar::Float(f)) => Ok(Some(f)),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a number, got {:?}", s))),
        Some(Scalar::Other(_)) => Err(D::Error::custom("expected a number")),
    }
}

fn de_gif_fps<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(lenient_u32(d)?.unwrap_or(DEFAULT_GIF_FPS))
}

fn de_gif_width<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(lenient_u32(d)?.unwrap_or(DEFAULT_GIF_WIDTH))
}

fn de_trim_start<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_string(d)?.unwrap_or_else(|| DEFAULT_TRIM_START.to_string()))
}

fn de_trim_duration<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_string(d)?.unwrap_or_else(|| DEFAULT_TRIM_DURATION.to_string()))
}

fn de_speed<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(lenient_f64(d)?.unwrap_or(DEFAULT_SPEED))
}

fn de_resize_width<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(lenient_u32(d)?.unwrap_or(DEFAULT_RESIZE_WIDTH))
}

fn de_resize_height<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(lenient_u32(d)?.unwrap_or(DEFAULT_RESIZE_HEIGHT))
}

/// Parameters for `video-to-gif`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct GifParams {
    /// Output frame rate
    #[serde(deserialize_with = "de_gif_fps")]
    #[schemars(with = "u32")]
    pub fps: u32,
    /// Output width in pixels; height follows the aspect ratio
    #[serde(deserialize_with = "de_gif_width")]
    #[schemars(with = "u32")]
    pub width: u32,
}

impl Default for GifParams {
    fn default() -> Self {
        Self {
            fps: DEFAULT_GIF_FPS,
            width: DEFAULT_GIF_WIDTH,
        }
    }
}

/// Parameters for `trim-video`. Times are passed to the engine verbatim, so
/// both plain seconds (`"12.5"`) and `HH:MM:SS` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TrimParams {
    #[serde(deserialize_with = "de_trim_start")]
    #[schemars(with = "String")]
    pub start_time: String,
    #[serde(deserialize_with = "de_trim_duration")]
    #[schemars(with = "String")]
    pub duration: String,
}

impl Default for TrimParams {
    fn default() -> Self {
        Self {
            start_time: DEFAULT_TRIM_START.to_string(),
            duration: DEFAULT_TRIM_DURATION.to_string(),
        }
    }
}

/// Parameters for `speed-video`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeedParams {
    /// Playback multiplier (2.0 = twice as fast)
    #[serde(deserialize_with = "de_speed")]
    #[schemars(with = "f64")]
    pub speed: f64,
}

impl Default for SpeedParams {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
        }
    }
}

/// Parameters for `resize-video`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ResizeParams {
    #[serde(deserialize_with = "de_resize_width")]
    #[schemars(with = "u32")]
    pub width: u32,
    #[serde(deserialize_with = "de_resize_height")]
    #[schemars(with = "u32")]
    pub height: u32,
}

impl Default for ResizeParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_RESIZE_WIDTH,
            height: DEFAULT_RESIZE_HEIGHT,
        }
    }
}

/// Compression tier for `compress-video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Scalar", into = "String")]
pub enum CompressionQuality {
    /// Smallest output
    Low,
    #[default]
    Medium,
    /// Closest to the source
    High,
}

impl CompressionQuality {
    /// Constant rate factor for this tier.
    pub fn crf(&self) -> u8 {
        match self {
            CompressionQuality::Low => COMPRESS_CRF_LOW,
            CompressionQuality::Medium => COMPRESS_CRF_MEDIUM,
            CompressionQuality::High => COMPRESS_CRF_HIGH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionQuality::Low => "low",
            CompressionQuality::Medium => "medium",
            CompressionQuality::High => "high",
        }
    }
}

impl From<&str> for CompressionQuality {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => CompressionQuality::Low,
            "high" => CompressionQuality::High,
            _ => CompressionQuality::Medium,
        }
    }
}

impl From<String> for CompressionQuality {
    fn from(value: String) -> Self {
        CompressionQuality::from(value.as_str())
    }
}

impl From<Scalar> for CompressionQuality {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => CompressionQuality::from(s.as_str()),
            _ => CompressionQuality::default(),
        }
    }
}

impl From<CompressionQuality> for String {
    fn from(value: CompressionQuality) -> Self {
        value.as_str().to_string()
    }
}

/// Parameters for `compress-video`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CompressParams {
    #[schemars(with = "String")]
    pub quality: CompressionQuality,
}

/// Clockwise rotation for `rotate-video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Scalar", into = "u32")]
pub enum Rotation {
    #[default]
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

impl From<u32> for Rotation {
    fn from(degrees: u32) -> Self {
        match degrees {
            180 => Rotation::Deg180,
            270 => Rotation::Deg270,
            _ => Rotation::Deg90,
        }
    }
}

impl From<Scalar> for Rotation {
    fn from(value: Scalar) -> Self {
        let degrees = match value {
            Scalar::Int(i) => i,
            Scalar::Float(f) if f.is_finite() => f.round() as i64,
            Scalar::Float(_) => 0,
            Scalar::Text(s) => s.trim().parse::<i64>().unwrap_or(0),
            Scalar::Other(_) => 0,
        };
        Rotation::from(u32::try_from(degrees).unwrap_or(0))
    }
}

impl From<Rotation> for u32 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}

/// Parameters for `rotate-video`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RotateParams {
    #[schemars(with = "u32")]
    pub rotation: Rotation,
}

/// Mirror axis for `flip-video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Scalar", into = "String")]
pub enum FlipDirection {
    #[default]
    Horizontal,
    Vertical,
}

impl FlipDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlipDirection::Horizontal => "horizontal",
            FlipDirection::Vertical => "vertical",
        }
    }
}

impl From<&str> for FlipDirection {
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("vertical") {
            FlipDirection::Vertical
        } else {
            FlipDirection::Horizontal
        }
    }
}

impl From<String> for FlipDirection {
    fn from(value: String) -> Self {
        FlipDirection::from(value.as_str())
    }
}

impl From<Scalar> for FlipDirection {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => FlipDirection::from(s.as_str()),
            _ => FlipDirection::default(),
        }
    }
}

impl From<FlipDirection> for String {
    fn from(value: FlipDirection) -> Self {
        value.as_str().to_string()
    }
}

/// Parameters for `flip-video`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FlipParams {
    #[schemars(with = "String")]
    pub direction: FlipDirection,
}

/// An operation together with its typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", content = "params", rename_all = "kebab-case")]
pub enum OperationParams {
    MuteVideo,
    Mp4ToMp3,
    VideoToGif(GifParams),
    GifToMp4,
    TrimVideo(TrimParams),
    SpeedVideo(SpeedParams),
    ResizeVideo(ResizeParams),
    CompressVideo(CompressParams),
    RotateVideo(RotateParams),
    FlipVideo(FlipParams),
    MovToMp4,
    WebmToMp4,
    MkvToMp4,
    AviToMp4,
    Mp4ToWebm,
}

impl OperationParams {
    /// The operation with every parameter at its default.
    pub fn defaults(operation: Operation) -> Self {
        match operation {
            Operation::MuteVideo => Self::MuteVideo,
            Operation::Mp4ToMp3 => Self::Mp4ToMp3,
            Operation::VideoToGif => Self::VideoToGif(GifParams::default()),
            Operation::GifToMp4 => Self::GifToMp4,
            Operation::TrimVideo => Self::TrimVideo(TrimParams::default()),
            Operation::SpeedVideo => Self::SpeedVideo(SpeedParams::default()),
            Operation::ResizeVideo => Self::ResizeVideo(ResizeParams::default()),
            Operation::CompressVideo => Self::CompressVideo(CompressParams::default()),
            Operation::RotateVideo => Self::RotateVideo(RotateParams::default()),
            Operation::FlipVideo => Self::FlipVideo(FlipParams::default()),
            Operation::MovToMp4 => Self::MovToMp4,
            Operation::WebmToMp4 => Self::WebmToMp4,
            Operation::MkvToMp4 => Self::MkvToMp4,
            Operation::AviToMp4 => Self::AviToMp4,
            Operation::Mp4ToWebm => Self::Mp4ToWebm,
        }
    }

    /// Parse an operation identifier and its JSON parameter object.
    ///
    /// `null` means "all defaults". Fixed-preset operations ignore whatever
    /// parameters they are handed.
    pub fn from_parts(
        operation: &str,
        params: serde_json::Value,
    ) -> Result<Self, OperationError> {
        let operation: Operation = operation.parse()?;
        Self::from_value(operation, params)
    }

    /// Build typed parameters for a known operation from a JSON object.
    pub fn from_value(
        operation: Operation,
        params: serde_json::Value,
    ) -> Result<Self, OperationError> {
        if operation.is_fixed_preset() {
            return Ok(Self::defaults(operation));
        }

        let params = if params.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            params
        };

        Ok(match operation {
            Operation::VideoToGif => Self::VideoToGif(typed(operation, params)?),
            Operation::TrimVideo => Self::TrimVideo(typed(operation, params)?),
            Operation::SpeedVideo => Self::SpeedVideo(typed(operation, params)?),
            Operation::ResizeVideo => Self::ResizeVideo(typed(operation, params)?),
            Operation::CompressVideo => Self::CompressVideo(typed(operation, params)?),
            Operation::RotateVideo => Self::RotateVideo(typed(operation, params)?),
            Operation::FlipVideo => Self::FlipVideo(typed(operation, params)?),
            fixed => Self::defaults(fixed),
        })
    }

    /// The operation these parameters belong to.
    pub fn operation(&self) -> Operation {
        match self {
            Self::MuteVideo => Operation::MuteVideo,
            Self::Mp4ToMp3 => Operation::Mp4ToMp3,
            Self::VideoToGif(_) => Operation::VideoToGif,
            Self::GifToMp4 => Operation::GifToMp4,
            Self::TrimVideo(_) => Operation::TrimVideo,
            Self::SpeedVideo(_) => Operation::SpeedVideo,
            Self::ResizeVideo(_) => Operation::ResizeVideo,
            Self::CompressVideo(_) => Operation::CompressVideo,
            Self::RotateVideo(_) => Operation::RotateVideo,
            Self::FlipVideo(_) => Operation::FlipVideo,
            Self::MovToMp4 => Operation::MovToMp4,
            Self::WebmToMp4 => Operation::WebmToMp4,
            Self::MkvToMp4 => Operation::MkvToMp4,
            Self::AviToMp4 => Operation::AviToMp4,
            Self::Mp4ToWebm => Operation::Mp4ToWebm,
        }
    }
}

fn typed<T: DeserializeOwned>(
    operation: Operation,
    params: serde_json::Value,
) -> Result<T, OperationError> {
    serde_json::from_value(params).map_err(|e| OperationError::InvalidParams {
        operation,
        message: e.to_string(),
    })
}
