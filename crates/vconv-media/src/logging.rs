//! Structured request logging.
//!
//! Every log line emitted on behalf of a request carries its request ID and
//! operation, so concurrent requests can be told apart in the output.

use tracing::{error, info, warn, Span};
use vconv_models::Operation;

/// Request logger with consistent contextual fields.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    request_id: String,
    operation: Operation,
}

impl RequestLogger {
    pub fn new(request_id: impl Into<String>, operation: Operation) -> Self {
        Self {
            request_id: request_id.into(),
            operation,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Transcode started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Transcode progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Transcode warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Transcode error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Transcode completed: {}", message
        );
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Span covering the whole request.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "transcode",
            request_id = %self.request_id,
            operation = %self.operation
        )
    }
}
