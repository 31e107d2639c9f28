//! FFmpeg-backed engine.
//!
//! Working storage is a private temporary directory created when the engine
//! loads and removed when the last handle is dropped. Pipelines run with that
//! directory as the working directory, so virtual file names resolve inside it.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::fs;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use super::{EngineHandle, EngineLoader, TranscodeEngine};
use crate::command::CommandPipeline;
use crate::error::{EngineError, EngineLoadError, EngineResult};
use crate::naming::validate_virtual_name;
use crate::progress::{parse_progress_line, ProgressCallback, ProgressLine, TranscodeProgress};

/// Diagnostic lines kept from a failed run.
const MAX_DIAGNOSTIC_LINES: usize = 20;

/// Where the engine comes from and where it keeps its working storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResources {
    /// Executable name (looked up on PATH) or absolute path
    pub binary: String,
    /// Directory under which per-engine working storage is created
    pub work_root: PathBuf,
    /// FFmpeg `-v` level
    pub log_level: String,
}

impl Default for EngineResources {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            work_root: std::env::temp_dir().join("vconv"),
            log_level: "error".to_string(),
        }
    }
}

impl EngineResources {
    /// Read `VCONV_FFMPEG_PATH`, `VCONV_WORK_DIR` and `VCONV_LOG_LEVEL`,
    /// falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            binary: std::env::var("VCONV_FFMPEG_PATH").unwrap_or(defaults.binary),
            work_root: std::env::var("VCONV_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_root),
            log_level: std::env::var("VCONV_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }
}

/// Engine running the FFmpeg CLI against a private working directory.
pub struct FfmpegEngine {
    binary: PathBuf,
    workdir: TempDir,
    log_level: String,
    progress: Option<ProgressCallback>,
}

impl FfmpegEngine {
    fn resolve(&self, name: &str) -> EngineResult<PathBuf> {
        validate_virtual_name(name)?;
        Ok(self.workdir.path().join(name))
    }

    fn build_args(&self, pipeline: &CommandPipeline) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-nostdin".to_string(),
            "-v".to_string(),
            self.log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ];
        args.extend(pipeline.args().iter().cloned());
        args
    }
}

/// Read one line, replacing invalid UTF-8. `None` at end of stream.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf.as_slice());
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn not_found_as_missing(name: &str, err: std::io::Error) -> EngineError {
    if err.kind() == std::io::ErrorKind::NotFound {
        EngineError::FileNotFound(name.to_string())
    } else {
        EngineError::Io(err)
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> EngineResult<()> {
        let path = self.resolve(name)?;
        fs::write(&path, data).await?;
        Ok(())
    }

    async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
        let path = self.resolve(name)?;
        fs::read(&path).await.map_err(|e| not_found_as_missing(name, e))
    }

    async fn delete_file(&self, name: &str) -> EngineResult<()> {
        let path = self.resolve(name)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| not_found_as_missing(name, e))
    }

    async fn list_files(&self) -> EngineResult<Vec<String>> {
        let mut entries = fs::read_dir(self.workdir.path()).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn exec(&self, pipeline: &CommandPipeline) -> EngineResult<()> {
        let args = self.build_args(pipeline);
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .current_dir(self.workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("engine stderr not captured"))?;
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();

        let started = Instant::now();
        let mut current = TranscodeProgress::default();
        let mut diagnostics: VecDeque<String> = VecDeque::with_capacity(MAX_DIAGNOSTIC_LINES);

        // Metadata tags in diagnostics are not guaranteed to be UTF-8
        while let Some(line) = read_line_lossy(&mut reader, &mut buf).await? {
            match parse_progress_line(&line, &mut current) {
                ProgressLine::Snapshot(snapshot) => {
                    if let Some(callback) = &self.progress {
                        callback(snapshot);
                    }
                }
                ProgressLine::Field => {}
                ProgressLine::Diagnostic => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if diagnostics.len() == MAX_DIAGNOSTIC_LINES {
                        diagnostics.pop_front();
                    }
                    diagnostics.push_back(line.to_string());
                }
            }
        }

        let status = child.wait().await?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            exit_code = ?status.code(),
            "FFmpeg finished"
        );

        if status.success() {
            Ok(())
        } else {
            let diagnostics = Vec::from(diagnostics).join("\n");
            Err(EngineError::process_failed(status.code(), diagnostics))
        }
    }
}

/// Builds [`FfmpegEngine`]s from [`EngineResources`].
#[derive(Clone, Default)]
pub struct FfmpegEngineLoader {
    resources: EngineResources,
    progress: Option<ProgressCallback>,
}

impl FfmpegEngineLoader {
    pub fn new(resources: EngineResources) -> Self {
        Self {
            resources,
            progress: None,
        }
    }

    /// Forward progress snapshots from every run to `callback`.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn resources(&self) -> &EngineResources {
        &self.resources
    }
}

#[async_trait]
impl EngineLoader for FfmpegEngineLoader {
    async fn load(&self) -> Result<EngineHandle, EngineLoadError> {
        let resources = &self.resources;

        let binary = which::which(&resources.binary).map_err(|e| {
            EngineLoadError::unsupported(format!("{} not found: {}", resources.binary, e))
        })?;

        let output = Command::new(&binary)
            .arg("-hide_banner")
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineLoadError::failed(binary.display(), e))?;
        if !output.status.success() {
            return Err(EngineLoadError::failed(
                binary.display(),
                std::io::Error::other(format!(
                    "-version exited with {:?}",
                    output.status.code()
                )),
            ));
        }
        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        fs::create_dir_all(&resources.work_root)
            .await
            .map_err(|e| EngineLoadError::failed(resources.work_root.display(), e))?;
        let workdir = tempfile::Builder::new()
            .prefix("engine-")
            .tempdir_in(&resources.work_root)
            .map_err(|e| EngineLoadError::failed(resources.work_root.display(), e))?;

        info!(
            binary = %binary.display(),
            workdir = %workdir.path().display(),
            version = %version,
            "FFmpeg engine loaded"
        );

        Ok(EngineHandle::new(FfmpegEngine {
            binary,
            workdir,
            log_level: resources.log_level.clone(),
            progress: self.progress.clone(),
        }))
    }
}
