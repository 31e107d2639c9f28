//! Error types for media operations.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use vconv_models::{Operation, OperationError};

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Result type for engine primitives.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced to callers of the coordinator.
///
/// Oversized input is not an error: it is reported as
/// [`TranscodeResult::Fallback`](vconv_models::TranscodeResult::Fallback).
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("No source file was provided")]
    InputMissing,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid parameters for {operation}: {message}")]
    InvalidParams {
        operation: Operation,
        message: String,
    },

    #[error("Transcoding engine unavailable: {0}")]
    EngineLoad(#[from] EngineLoadError),

    #[error("{operation} failed: {source}")]
    TranscodeExecution {
        operation: Operation,
        #[source]
        source: EngineError,
    },
}

impl MediaError {
    /// Wrap an engine failure that happened while running `operation`.
    pub fn transcode_failed(operation: Operation, source: EngineError) -> Self {
        Self::TranscodeExecution { operation, source }
    }

    /// Short, stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaError::InputMissing => "input_missing",
            MediaError::UnsupportedOperation(_) => "unsupported_operation",
            MediaError::InvalidParams { .. } => "invalid_params",
            MediaError::EngineLoad(_) => "engine_load",
            MediaError::TranscodeExecution { .. } => "transcode_execution",
        }
    }
}

impl From<OperationError> for MediaError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::Unsupported(id) => MediaError::UnsupportedOperation(id),
            OperationError::InvalidParams { operation, message } => {
                MediaError::InvalidParams { operation, message }
            }
        }
    }
}

/// Underlying cause of a failed engine load, shared between every caller
/// that waited on the same attempt.
#[derive(Clone)]
pub struct LoadCause(Arc<dyn std::error::Error + Send + Sync>);

impl LoadCause {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(std::io::Error::other(message.into()))
    }
}

impl fmt::Debug for LoadCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for LoadCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

/// Engine construction failures.
#[derive(Debug, Clone, Error)]
pub enum EngineLoadError {
    /// The environment cannot host the engine at all (e.g. no binary installed).
    #[error("engine is not supported in this environment: {0}")]
    Unsupported(String),

    /// Loading was attempted and failed.
    #[error("failed to load engine resource {resource}: {cause}")]
    Failed { resource: String, cause: LoadCause },
}

impl EngineLoadError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported(reason.into())
    }

    pub fn failed(
        resource: impl fmt::Display,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Failed {
            resource: resource.to_string(),
            cause: LoadCause::new(cause),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, EngineLoadError::Unsupported(_))
    }
}

/// Failures of individual engine primitives (working storage and exec).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("working storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("virtual file not found: {0}")]
    FileNotFound(String),

    #[error("invalid virtual file name: {0}")]
    InvalidFileName(String),

    #[error("engine exited with {}: {diagnostics}", exit_label(.exit_code))]
    ProcessFailed {
        exit_code: Option<i32>,
        diagnostics: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

impl EngineError {
    pub fn process_failed(exit_code: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            diagnostics: diagnostics.into(),
        }
    }
}
