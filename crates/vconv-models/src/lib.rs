//! Shared data models for the vconv transcoding toolbox.
//!
//! This crate provides Serde-serializable types for:
//! - Operation identifiers and their typed parameters
//! - Encoding presets and parameter defaults
//! - Transcode requests and results

pub mod encoding;
pub mod operation;
pub mod params;
pub mod request;

// Re-export common types
pub use encoding::EncodingConfig;
pub use operation::{Operation, OperationError};
pub use params::{
    CompressParams, CompressionQuality, FlipDirection, FlipParams, GifParams, OperationParams,
    ResizeParams, RotateParams, Rotation, SpeedParams, TrimParams,
};
pub use request::{TranscodeOutput, TranscodeRequest, TranscodeResult};
