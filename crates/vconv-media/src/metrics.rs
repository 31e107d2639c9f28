//! Metrics for transcoding requests and engine lifecycle.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.

use metrics::{counter, histogram};
use vconv_models::Operation;

/// Metric names as constants for consistency.
pub mod names {
    pub const TRANSCODE_REQUESTS_TOTAL: &str = "vconv_transcode_requests_total";
    pub const TRANSCODE_FALLBACKS_TOTAL: &str = "vconv_transcode_fallbacks_total";
    pub const TRANSCODE_FAILURES_TOTAL: &str = "vconv_transcode_failures_total";
    pub const TRANSCODE_DURATION_SECONDS: &str = "vconv_transcode_duration_seconds";

    pub const ENGINE_LOADS_TOTAL: &str = "vconv_engine_loads_total";
    pub const ENGINE_LOAD_DURATION_SECONDS: &str = "vconv_engine_load_duration_seconds";

    pub const CLEANUP_FAILURES_TOTAL: &str = "vconv_virtual_file_cleanup_failures_total";
}

/// Record a request entering the coordinator.
pub fn record_request(operation: Operation) {
    let labels = [("operation", operation.as_str())];
    counter!(names::TRANSCODE_REQUESTS_TOTAL, &labels).increment(1);
}

/// Record a request declined by the size gate.
pub fn record_fallback(operation: Operation) {
    let labels = [("operation", operation.as_str())];
    counter!(names::TRANSCODE_FALLBACKS_TOTAL, &labels).increment(1);
}

/// Record a failed request.
pub fn record_failure(operation: Operation, kind: &'static str) {
    let labels = [("operation", operation.as_str()), ("kind", kind)];
    counter!(names::TRANSCODE_FAILURES_TOTAL, &labels).increment(1);
}

/// Record wall time of a completed engine run.
pub fn record_transcode_duration(operation: Operation, duration_secs: f64) {
    let labels = [("operation", operation.as_str())];
    histogram!(names::TRANSCODE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an engine load attempt and its outcome.
pub fn record_engine_load(outcome: &'static str, duration_secs: f64) {
    let labels = [("outcome", outcome)];
    counter!(names::ENGINE_LOADS_TOTAL, &labels).increment(1);
    histogram!(names::ENGINE_LOAD_DURATION_SECONDS).record(duration_secs);
}

/// Record a virtual file that could not be deleted.
pub fn record_cleanup_failure() {
    counter!(names::CLEANUP_FAILURES_TOTAL).increment(1);
}
