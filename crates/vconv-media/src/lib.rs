#![deny(unreachable_patterns)]
//! In-process media transcoding orchestration.
//!
//! This crate provides:
//! - Size-based admission control ahead of any engine work
//! - The operation catalog that turns typed parameters into command pipelines
//! - Lazy, single-flight engine lifecycle shared by concurrent requests
//! - Request execution against request-scoped virtual files with guaranteed cleanup
//! - Output packaging (MIME type and download filename)

pub mod catalog;
pub mod command;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod filters;
pub mod logging;
pub mod metrics;
pub mod naming;
pub mod packager;
pub mod progress;
pub mod size_gate;

pub use catalog::build_command;
pub use command::{CommandPipeline, PipelineBuilder};
pub use coordinator::TranscodeCoordinator;
pub use engine::{
    EngineHandle, EngineLifecycle, EngineLoader, EngineResources, EngineState, FfmpegEngine,
    FfmpegEngineLoader, TranscodeEngine,
};
pub use error::{EngineError, EngineLoadError, EngineResult, MediaError, MediaResult};
pub use logging::RequestLogger;
pub use naming::VirtualFiles;
pub use packager::{OutputFormat, ResultPackager};
pub use progress::{ProgressCallback, TranscodeProgress};
pub use size_gate::{Admission, SizeGate, MAX_SOURCE_BYTES};
