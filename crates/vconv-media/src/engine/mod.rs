//! Transcoding engine abstraction.
//!
//! An engine owns a working storage of named virtual files and runs command
//! pipelines against it. Engines are constructed by an [`EngineLoader`] and
//! shared through an [`EngineHandle`]; [`EngineLifecycle`] makes sure at most
//! one construction is in flight.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;

use crate::command::CommandPipeline;
use crate::error::{EngineLoadError, EngineResult};

pub mod ffmpeg;
pub mod lifecycle;

pub use ffmpeg::{EngineResources, FfmpegEngine, FfmpegEngineLoader};
pub use lifecycle::{EngineLifecycle, EngineState};

/// Primitives every transcoding engine provides.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Create or replace a virtual file.
    async fn write_file(&self, name: &str, data: &[u8]) -> EngineResult<()>;

    /// Read a virtual file.
    async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>>;

    /// Delete a virtual file.
    async fn delete_file(&self, name: &str) -> EngineResult<()>;

    /// Names of every virtual file currently in working storage.
    async fn list_files(&self) -> EngineResult<Vec<String>>;

    /// Run a pipeline to completion.
    async fn exec(&self, pipeline: &CommandPipeline) -> EngineResult<()>;
}

/// Shared handle to a constructed engine.
#[derive(Clone)]
pub struct EngineHandle(Arc<dyn TranscodeEngine>);

impl EngineHandle {
    pub fn new(engine: impl TranscodeEngine + 'static) -> Self {
        Self(Arc::new(engine))
    }

    pub fn from_arc(engine: Arc<dyn TranscodeEngine>) -> Self {
        Self(engine)
    }

    /// Whether both handles point at the same engine instance.
    pub fn same_engine(&self, other: &EngineHandle) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

impl Deref for EngineHandle {
    type Target = dyn TranscodeEngine;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EngineHandle").field(&self.0.name()).finish()
    }
}

/// Constructs engines. Injected into [`EngineLifecycle`].
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<EngineHandle, EngineLoadError>;
}
