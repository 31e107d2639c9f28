//! End-to-end execution of a single transcode request.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, Instrument};
use vconv_models::{OperationParams, TranscodeRequest, TranscodeResult};

use crate::catalog;
use crate::command::CommandPipeline;
use crate::engine::{EngineHandle, EngineLifecycle};
use crate::error::{EngineError, EngineResult, MediaError, MediaResult};
use crate::logging::RequestLogger;
use crate::metrics;
use crate::naming::VirtualFiles;
use crate::packager::ResultPackager;
use crate::size_gate::{Admission, SizeGate};

/// Runs requests against the shared engine.
///
/// Cheap to clone; clones share the same [`EngineLifecycle`].
#[derive(Debug, Clone)]
pub struct TranscodeCoordinator {
    lifecycle: Arc<EngineLifecycle>,
    gate: SizeGate,
}

impl TranscodeCoordinator {
    pub fn new(lifecycle: Arc<EngineLifecycle>) -> Self {
        Self {
            lifecycle,
            gate: SizeGate::new(),
        }
    }

    pub fn lifecycle(&self) -> &Arc<EngineLifecycle> {
        &self.lifecycle
    }

    /// The pipeline a request with these parameters would run, using
    /// placeholder file names. Does not touch the engine.
    pub fn preview_pipeline(params: &OperationParams, source_name: &str) -> CommandPipeline {
        let files =
            VirtualFiles::with_request_id("preview".to_string(), params.operation(), source_name);
        catalog::build_command(params, files.input(), files.output())
    }

    /// Execute one request.
    ///
    /// Oversized sources come back as [`TranscodeResult::Fallback`] without
    /// the engine being loaded. Both virtual files are deleted on every path
    /// that reaches the engine; deletion failures are logged and never change
    /// the returned outcome.
    pub async fn execute(&self, request: TranscodeRequest) -> MediaResult<TranscodeResult> {
        let operation = request.operation();
        let files = VirtualFiles::for_request(operation, &request.source_name);
        let logger = RequestLogger::new(files.request_id(), operation);
        let span = logger.create_span();

        metrics::record_request(operation);
        let started = Instant::now();

        let outcome = self.run(request, &files, &logger).instrument(span).await;

        match &outcome {
            Ok(TranscodeResult::Success(output)) => {
                let elapsed = started.elapsed();
                metrics::record_transcode_duration(operation, elapsed.as_secs_f64());
                logger.log_completion(&format!(
                    "{} ({} bytes) in {} ms",
                    output.filename,
                    output.bytes.len(),
                    elapsed.as_millis()
                ));
            }
            Ok(TranscodeResult::Fallback { .. }) => {}
            Err(err) => {
                metrics::record_failure(operation, err.kind());
                logger.log_error(&err.to_string());
            }
        }

        outcome
    }

    async fn run(
        &self,
        request: TranscodeRequest,
        files: &VirtualFiles,
        logger: &RequestLogger,
    ) -> MediaResult<TranscodeResult> {
        let operation = request.operation();

        let source = match request.source {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(MediaError::InputMissing),
        };

        // The reported size may undercount what was actually attached
        let source_size = request.source_size.max(source.len() as u64);
        if let Admission::Fallback { message } = self.gate.check(source_size) {
            metrics::record_fallback(operation);
            logger.log_warning(&format!("source of {} bytes declined", source_size));
            return Ok(TranscodeResult::Fallback { message });
        }

        logger.log_start(&format!("{} ({} bytes)", request.source_name, source_size));

        let engine = self.lifecycle.ensure_ready().await?;
        let pipeline = catalog::build_command(&request.params, files.input(), files.output());
        debug!(pipeline = %pipeline, "Built command pipeline");

        let outcome = run_pipeline(&engine, &source, &pipeline, files, logger).await;
        cleanup(&engine, files, logger).await;

        let bytes = outcome.map_err(|e| MediaError::transcode_failed(operation, e))?;
        Ok(TranscodeResult::Success(ResultPackager::package(
            bytes, operation,
        )))
    }
}

async fn run_pipeline(
    engine: &EngineHandle,
    source: &[u8],
    pipeline: &CommandPipeline,
    files: &VirtualFiles,
    logger: &RequestLogger,
) -> EngineResult<Vec<u8>> {
    engine.write_file(files.input(), source).await?;
    logger.log_progress("source staged, running engine");
    engine.exec(pipeline).await?;
    engine.read_file(files.output()).await
}

/// Delete both virtual files, swallowing failures.
async fn cleanup(engine: &EngineHandle, files: &VirtualFiles, logger: &RequestLogger) {
    for name in [files.input(), files.output()] {
        match engine.delete_file(name).await {
            Ok(()) => {}
            // Never created, e.g. the engine failed before writing output
            Err(EngineError::FileNotFound(_)) => {}
            Err(e) => {
                metrics::record_cleanup_failure();
                logger.log_warning(&format!("failed to delete {}: {}", name, e));
            }
        }
    }
}
