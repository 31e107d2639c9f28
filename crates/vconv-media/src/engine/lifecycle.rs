//! Engine lifecycle: lazy, single-flight construction of the shared engine.
//!
//! State lives in a `watch` channel. Claiming a load is a check-and-set under
//! the channel's lock, so exactly one caller constructs the engine while every
//! other caller parks on the channel and observes the same outcome.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{EngineHandle, EngineLoader};
use crate::error::EngineLoadError;
use crate::metrics;

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unloaded,
    Loading,
    Ready,
    /// The last attempt failed; the next caller starts a fresh load.
    LoadFailed,
}

#[derive(Clone)]
enum Slot {
    Unloaded,
    Loading,
    Ready(EngineHandle),
    LoadFailed(EngineLoadError),
}

impl Slot {
    fn state(&self) -> EngineState {
        match self {
            Slot::Unloaded => EngineState::Unloaded,
            Slot::Loading => EngineState::Loading,
            Slot::Ready(_) => EngineState::Ready,
            Slot::LoadFailed(_) => EngineState::LoadFailed,
        }
    }
}

enum Claim {
    Ready(EngineHandle),
    Load,
    Wait,
}

/// Owns the engine handle and its load/ready state machine.
pub struct EngineLifecycle {
    loader: Arc<dyn EngineLoader>,
    slot: watch::Sender<Slot>,
    load_attempts: AtomicU64,
}

impl EngineLifecycle {
    pub fn new(loader: impl EngineLoader + 'static) -> Self {
        Self::with_loader(Arc::new(loader))
    }

    pub fn with_loader(loader: Arc<dyn EngineLoader>) -> Self {
        let (slot, _) = watch::channel(Slot::Unloaded);
        Self {
            loader,
            slot,
            load_attempts: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> EngineState {
        self.slot.borrow().state()
    }

    /// Number of times the loader has been invoked.
    pub fn load_attempts(&self) -> u64 {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// Return the ready engine, loading it first if nobody has.
    ///
    /// Callers arriving while a load is in flight wait for that load and
    /// share its outcome instead of starting their own.
    pub async fn ensure_ready(&self) -> Result<EngineHandle, EngineLoadError> {
        loop {
            match self.claim() {
                Claim::Ready(handle) => return Ok(handle),
                Claim::Load => return self.load().await,
                Claim::Wait => {
                    debug!("Engine load in progress, waiting");
                    let mut rx = self.slot.subscribe();
                    let settled = match rx.wait_for(|slot| !matches!(slot, Slot::Loading)).await {
                        Ok(slot) => slot.clone(),
                        Err(_) => Slot::Unloaded,
                    };
                    match settled {
                        Slot::Ready(handle) => return Ok(handle),
                        Slot::LoadFailed(err) => return Err(err),
                        // Torn down or abandoned: evaluate again
                        Slot::Unloaded | Slot::Loading => continue,
                    }
                }
            }
        }
    }

    /// Release the engine. In-flight requests keep their handle until they finish.
    ///
    /// Returns `false` if the engine was not ready.
    pub fn teardown(&self) -> bool {
        let released = self.slot.send_if_modified(|slot| {
            if matches!(slot, Slot::Ready(_)) {
                *slot = Slot::Unloaded;
                true
            } else {
                false
            }
        });
        if released {
            info!("Transcoding engine released");
        }
        released
    }

    fn claim(&self) -> Claim {
        let mut claim = Claim::Wait;
        self.slot.send_if_modified(|slot| match slot {
            Slot::Ready(handle) => {
                claim = Claim::Ready(handle.clone());
                false
            }
            Slot::Loading => {
                claim = Claim::Wait;
                false
            }
            Slot::Unloaded | Slot::LoadFailed(_) => {
                *slot = Slot::Loading;
                claim = Claim::Load;
                true
            }
        });
        claim
    }

    async fn load(&self) -> Result<EngineHandle, EngineLoadError> {
        let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = LoadingGuard {
            slot: &self.slot,
            armed: true,
        };

        info!(attempt, "Loading transcoding engine");
        let started = Instant::now();
        let outcome = self.loader.load().await;
        let elapsed = started.elapsed();
        guard.armed = false;

        match outcome {
            Ok(handle) => {
                info!(
                    attempt,
                    engine = handle.name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Transcoding engine ready"
                );
                metrics::record_engine_load("ready", elapsed.as_secs_f64());
                self.slot.send_replace(Slot::Ready(handle.clone()));
                Ok(handle)
            }
            Err(err) => {
                warn!(attempt, error = %err, "Transcoding engine failed to load");
                let outcome = if err.is_unsupported() {
                    "unsupported"
                } else {
                    "failed"
                };
                metrics::record_engine_load(outcome, elapsed.as_secs_f64());
                self.slot.send_replace(Slot::LoadFailed(err.clone()));
                Err(err)
            }
        }
    }
}

impl fmt::Debug for EngineLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineLifecycle")
            .field("state", &self.state())
            .field("load_attempts", &self.load_attempts())
            .finish()
    }
}

/// Resets `Loading` to `Unloaded` if the loading future is dropped midway,
/// so waiters re-evaluate instead of parking forever.
struct LoadingGuard<'a> {
    slot: &'a watch::Sender<Slot>,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.slot.send_if_modified(|slot| {
            if matches!(slot, Slot::Loading) {
                *slot = Slot::Unloaded;
                true
            } else {
                false
            }
        });
    }
}
