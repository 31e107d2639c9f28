//! Transcode request and result types.

use crate::operation::{Operation, OperationError};
use crate::params::OperationParams;

/// A single transcoding request as handed over by the calling tool.
#[derive(Debug, Clone)]
pub struct TranscodeRequest {
    /// Source media bytes. `None` when the caller never attached a file.
    pub source: Option<Vec<u8>>,
    /// Original filename of the source, used for the input extension
    pub source_name: String,
    /// Size reported for the source in bytes
    pub source_size: u64,
    /// Operation and its parameters
    pub params: OperationParams,
}

impl TranscodeRequest {
    /// Create a request from an in-memory buffer; the size is the buffer length.
    pub fn new(source: Vec<u8>, source_name: impl Into<String>, params: OperationParams) -> Self {
        let source_size = source.len() as u64;
        Self {
            source: Some(source),
            source_name: source_name.into(),
            source_size,
            params,
        }
    }

    /// Create a request from loosely typed caller input.
    pub fn from_parts(
        source: Option<Vec<u8>>,
        source_name: impl Into<String>,
        source_size: u64,
        operation: &str,
        params: serde_json::Value,
    ) -> Result<Self, OperationError> {
        Ok(Self {
            source,
            source_name: source_name.into(),
            source_size,
            params: OperationParams::from_parts(operation, params)?,
        })
    }

    /// Override the reported source size.
    pub fn with_source_size(mut self, size: u64) -> Self {
        self.source_size = size;
        self
    }

    pub fn operation(&self) -> Operation {
        self.params.operation()
    }
}

/// Output bytes plus the metadata a caller needs to offer a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutput {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
}

/// Outcome of a request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeResult {
    Success(TranscodeOutput),
    /// The request was declined; `message` tells the user what to do instead.
    Fallback { message: String },
}

impl TranscodeResult {
    pub fn is_fallback(&self) -> bool {
        matches!(self, TranscodeResult::Fallback { .. })
    }

    /// Returns the output if the request succeeded.
    pub fn into_output(self) -> Option<TranscodeOutput> {
        match self {
            TranscodeResult::Success(output) => Some(output),
            TranscodeResult::Fallback { .. } => None,
        }
    }
}
