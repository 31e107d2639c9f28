//! FFmpeg filter graph definitions used by the operation catalogue.

use vconv_models::{FlipDirection, Rotation};

/// Round odd frame sizes down to even; H.264 with yuv420p rejects odd dimensions.
pub const FILTER_EVEN_DIMENSIONS: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";

/// Clockwise quarter turn.
pub const FILTER_TRANSPOSE_CW: &str = "transpose=1";

/// Counter-clockwise quarter turn (equivalent to 270° clockwise).
pub const FILTER_TRANSPOSE_CCW: &str = "transpose=2";

/// GIF frame sampling and scaling with Lanczos resampling.
pub fn filter_gif(fps: u32, width: u32) -> String {
    format!("fps={},scale={}:-1:flags=lanczos", fps, width)
}

/// Fit inside `width`x`height` without distortion and pad to the exact box.
pub fn filter_fit_and_pad(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = width,
        h = height
    )
}

/// Rotation filter; 180° is two clockwise quarter turns.
pub fn filter_rotate(rotation: Rotation) -> String {
    match rotation {
        Rotation::Deg90 => FILTER_TRANSPOSE_CW.to_string(),
        Rotation::Deg180 => format!("{},{}", FILTER_TRANSPOSE_CW, FILTER_TRANSPOSE_CW),
        Rotation::Deg270 => FILTER_TRANSPOSE_CCW.to_string(),
    }
}

/// Mirror filter.
pub fn filter_flip(direction: FlipDirection) -> &'static str {
    match direction {
        FlipDirection::Horizontal => "hflip",
        FlipDirection::Vertical => "vflip",
    }
}

/// Video timestamp scaling for a playback speed multiplier.
pub fn filter_setpts(speed: f64) -> String {
    format!("setpts={}*PTS", 1.0 / speed)
}

/// Audio tempo change; `atempo` accepts 0.5..=2.0 in a single instance.
pub fn filter_atempo(speed: f64) -> String {
    format!("atempo={}", speed)
}

/// Filter graph retiming video and audio together.
pub fn filter_speed_with_audio(speed: f64) -> String {
    format!(
        "[0:v]{}[v];[0:a]{}[a]",
        filter_setpts(speed),
        filter_atempo(speed)
    )
}
