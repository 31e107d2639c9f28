//! In-memory engine and loaders used by the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vconv_media::{
    CommandPipeline, EngineError, EngineHandle, EngineLoadError, EngineLoader, EngineResult,
    TranscodeEngine,
};

/// Bytes the in-memory engine writes as output of every successful run.
pub const ENGINE_OUTPUT: &[u8] = b"transcoded";

/// Engine whose working storage is a map and whose `exec` copies a fixed
/// payload to the pipeline's output name.
#[derive(Default)]
pub struct MemoryEngine {
    files: Mutex<HashMap<String, Vec<u8>>>,
    pipelines: Mutex<Vec<CommandPipeline>>,
    fail_exec: bool,
    skip_output: bool,
    fail_delete: bool,
    delete_attempts: AtomicUsize,
    exec_delay: Option<Duration>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `exec` exits with a non-zero status.
    pub fn failing() -> Self {
        Self {
            fail_exec: true,
            ..Default::default()
        }
    }

    /// `exec` succeeds but never produces the output file.
    pub fn without_output() -> Self {
        Self {
            skip_output: true,
            ..Default::default()
        }
    }

    /// Every `delete_file` fails with an I/O error and leaves the file in place.
    pub fn with_failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }

    pub fn with_exec_delay(mut self, delay: Duration) -> Self {
        self.exec_delay = Some(delay);
        self
    }

    pub fn pipelines(&self) -> Vec<CommandPipeline> {
        self.pipelines.lock().unwrap().clone()
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl TranscodeEngine for MemoryEngine {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> EngineResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::FileNotFound(name.to_string()))
    }

    async fn delete_file(&self, name: &str) -> EngineResult<()> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(EngineError::Io(std::io::Error::other("resource busy")));
        }
        self.files
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::FileNotFound(name.to_string()))
    }

    async fn list_files(&self) -> EngineResult<Vec<String>> {
        Ok(self.file_names())
    }

    async fn exec(&self, pipeline: &CommandPipeline) -> EngineResult<()> {
        self.pipelines.lock().unwrap().push(pipeline.clone());

        if let Some(delay) = self.exec_delay {
            tokio::time::sleep(delay).await;
        }

        let input = pipeline
            .value_of("-i")
            .ok_or_else(|| EngineError::process_failed(Some(1), "no input given"))?;
        if !self.files.lock().unwrap().contains_key(input) {
            return Err(EngineError::process_failed(
                Some(1),
                format!("{}: No such file or directory", input),
            ));
        }

        if self.fail_exec {
            return Err(EngineError::process_failed(
                Some(1),
                "Conversion failed!",
            ));
        }

        if !self.skip_output {
            let output = pipeline.args().last().cloned().unwrap_or_default();
            self.files
                .lock()
                .unwrap()
                .insert(output, ENGINE_OUTPUT.to_vec());
        }
        Ok(())
    }
}

/// Loader handing out a prepared engine, counting how often it is invoked.
pub struct CountingLoader {
    engine: Arc<MemoryEngine>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
    failures_left: AtomicUsize,
    unsupported: bool,
}

impl CountingLoader {
    pub fn new(engine: Arc<MemoryEngine>) -> Self {
        Self {
            engine,
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
            failures_left: AtomicUsize::new(0),
            unsupported: false,
        }
    }

    /// Sleep this long inside every load, widening the window for waiters.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the first `count` loads.
    pub fn failing_first(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    /// Every load reports an unsupported environment.
    pub fn unsupported(mut self) -> Self {
        self.unsupported = true;
        self
    }

    /// Shared counter of loader invocations.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl EngineLoader for CountingLoader {
    async fn load(&self) -> Result<EngineHandle, EngineLoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.unsupported {
            return Err(EngineLoadError::unsupported("no engine binary available"));
        }

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(EngineLoadError::failed(
                "ffmpeg",
                std::io::Error::other("connection reset"),
            ));
        }

        let engine: Arc<dyn TranscodeEngine> = self.engine.clone();
        Ok(EngineHandle::from_arc(engine))
    }
}
