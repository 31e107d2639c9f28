//! Operation catalogue: maps typed operation parameters to engine pipelines.
//!
//! Every function here is pure. Identical inputs always produce identical
//! pipelines, and nothing in this module touches the engine.

use vconv_models::encoding::{
    MAX_GIF_FPS, MIN_DIMENSION, MP3_AUDIO_CODEC, MP3_QUALITY, SPEED_WITH_AUDIO_MAX,
    SPEED_WITH_AUDIO_MIN,
};
use vconv_models::{
    CompressParams, EncodingConfig, FlipParams, GifParams, Operation, OperationParams,
    ResizeParams, RotateParams, SpeedParams, TrimParams,
};

use crate::command::{CommandPipeline, PipelineBuilder};
use crate::filters;

/// Build the engine pipeline for `params`, reading `input` and writing `output`.
pub fn build_command(params: &OperationParams, input: &str, output: &str) -> CommandPipeline {
    let builder = PipelineBuilder::new(input, output);
    let builder = match params {
        OperationParams::MuteVideo => builder.video_codec("copy").no_audio(),
        OperationParams::Mp4ToMp3 => builder
            .no_video()
            .output_args(["-acodec", MP3_AUDIO_CODEC, "-q:a", MP3_QUALITY]),
        OperationParams::VideoToGif(p) => video_to_gif(builder, p),
        OperationParams::GifToMp4 => builder
            .faststart()
            .output_args(["-pix_fmt", "yuv420p"])
            .video_filter(filters::FILTER_EVEN_DIMENSIONS),
        OperationParams::TrimVideo(p) => trim(builder, p),
        OperationParams::SpeedVideo(p) => speed(builder, p),
        OperationParams::ResizeVideo(p) => resize(builder, p),
        OperationParams::CompressVideo(p) => compress(builder, p),
        OperationParams::RotateVideo(p) => rotate(builder, p),
        OperationParams::FlipVideo(p) => flip(builder, p),
        OperationParams::MovToMp4
        | OperationParams::WebmToMp4
        | OperationParams::MkvToMp4
        | OperationParams::AviToMp4 => builder.encoding(&EncodingConfig::compatible_mp4()),
        OperationParams::Mp4ToWebm => builder.encoding(&EncodingConfig::webm()),
    };
    builder.build()
}

/// Extension assumed for the input when the source name does not carry one.
pub fn input_extension(operation: Operation) -> &'static str {
    match operation {
        Operation::GifToMp4 => "gif",
        Operation::MovToMp4 => "mov",
        Operation::WebmToMp4 => "webm",
        Operation::MkvToMp4 => "mkv",
        Operation::AviToMp4 => "avi",
        _ => "mp4",
    }
}

/// Which branch `speed-video` takes for a given multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedBranch {
    /// Video and audio are both retimed
    VideoAndAudio,
    /// Audio is dropped; `atempo` cannot reach this multiplier in one pass
    VideoOnly,
}

impl SpeedBranch {
    pub fn for_speed(speed: f64) -> Self {
        if (SPEED_WITH_AUDIO_MIN..=SPEED_WITH_AUDIO_MAX).contains(&speed) {
            SpeedBranch::VideoAndAudio
        } else {
            SpeedBranch::VideoOnly
        }
    }
}

/// Speed actually applied: non-finite or non-positive values use the default.
pub fn effective_speed(params: &SpeedParams) -> f64 {
    if params.speed.is_finite() && params.speed > 0.0 {
        params.speed
    } else {
        SpeedParams::default().speed
    }
}

fn video_to_gif(builder: PipelineBuilder, params: &GifParams) -> PipelineBuilder {
    let fps = params.fps.clamp(1, MAX_GIF_FPS);
    let width = params.width.max(MIN_DIMENSION);
    builder
        .video_filter(filters::filter_gif(fps, width))
        .output_args(["-loop", "0"])
}

fn trim(builder: PipelineBuilder, params: &TrimParams) -> PipelineBuilder {
    builder
        .seek(params.start_time.as_str())
        .duration(params.duration.as_str())
        .stream_copy()
}

fn speed(builder: PipelineBuilder, params: &SpeedParams) -> PipelineBuilder {
    let speed = effective_speed(params);
    match SpeedBranch::for_speed(speed) {
        SpeedBranch::VideoAndAudio => builder
            .filter_complex(filters::filter_speed_with_audio(speed))
            .map("[v]")
            .map("[a]"),
        SpeedBranch::VideoOnly => builder
            .output_arg("-filter:v")
            .output_arg(filters::filter_setpts(speed))
            .no_audio(),
    }
}

fn resize(builder: PipelineBuilder, params: &ResizeParams) -> PipelineBuilder {
    let width = params.width.max(MIN_DIMENSION);
    let height = params.height.max(MIN_DIMENSION);
    builder
        .video_filter(filters::filter_fit_and_pad(width, height))
        .audio_codec("copy")
}

fn compress(builder: PipelineBuilder, params: &CompressParams) -> PipelineBuilder {
    let config = EncodingConfig::for_compression(params.quality.crf());
    builder
        .video_codec(config.codec.as_str())
        .crf(config.crf)
        .preset(config.preset.as_deref().unwrap_or_default())
        .audio_codec(config.audio_codec.as_str())
        .audio_bitrate(config.audio_bitrate.as_str())
}

fn rotate(builder: PipelineBuilder, params: &RotateParams) -> PipelineBuilder {
    builder
        .video_filter(filters::filter_rotate(params.rotation))
        .audio_codec("copy")
}

fn flip(builder: PipelineBuilder, params: &FlipParams) -> PipelineBuilder {
    builder
        .video_filter(filters::filter_flip(params.direction))
        .audio_codec("copy")
}
