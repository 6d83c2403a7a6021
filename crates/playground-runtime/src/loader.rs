//! Runtime loading and the readiness state machine.
//!
//! [`RuntimeLoader`] performs the one-shot load of the guest module and
//! publishes [`RuntimeReadiness`] over a watch channel. Consumers get an
//! explicit signal instead of guessing with a delay, and the loaded handle
//! is installed *before* `Ready` is published so that a `Ready` observation
//! always implies the execute entry point exists.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{error, info, instrument};

use crate::{GuestModule, WasmEngine};
use playground_common::{PlaygroundError, RuntimeConfig};

/// Lifecycle state of the local runtime.
///
/// Transitions `NotLoaded → Loading → {Ready, Failed}` exactly once per
/// session; the terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeReadiness {
    /// Load has not been attempted.
    NotLoaded,
    /// Load is in progress.
    Loading,
    /// The runtime is started and its entry point is installed.
    Ready,
    /// Load failed; no entry point exists.
    Failed,
}

impl RuntimeReadiness {
    /// Returns `true` for the two terminal states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

type RuntimeSlot = Arc<RwLock<Option<Arc<LoadedRuntime>>>>;

/// One-shot loader for the local runtime.
///
/// Owns the readiness channel (single writer) and the slot the loaded
/// runtime is installed into. Hand out [`RuntimeHandle`]s to consumers.
pub struct RuntimeLoader {
    engine: WasmEngine,
    readiness: watch::Sender<RuntimeReadiness>,
    slot: RuntimeSlot,
}

impl RuntimeLoader {
    /// Create a new loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the Wasmtime engine cannot be created.
    pub fn new(config: &RuntimeConfig) -> Result<Self, PlaygroundError> {
        let engine = WasmEngine::new(config)?;
        let (readiness, _) = watch::channel(RuntimeReadiness::NotLoaded);

        Ok(Self {
            engine,
            readiness,
            slot: Arc::new(RwLock::new(None)),
        })
    }

    /// Get a consumer handle for readiness checks and runtime access.
    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            readiness: self.readiness.subscribe(),
            slot: Arc::clone(&self.slot),
        }
    }

    /// Current readiness state.
    pub fn readiness(&self) -> RuntimeReadiness {
        *self.readiness.borrow()
    }

    /// Load the guest module from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the module fails to
    /// compile or start, or a load was already attempted. Any failure after
    /// the transition to `Loading` leaves the state `Failed`.
    #[instrument(skip(self, path))]
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Arc<LoadedRuntime>, PlaygroundError> {
        let path = path.as_ref();
        self.begin()?;

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let e = std::io::Error::new(e.kind(), format!("{}: {e}", path.display()));
                return Err(self.fail(PlaygroundError::Io(e)));
            }
        };

        self.finish(GuestModule::from_bytes(&self.engine, &bytes)).await
    }

    /// Load the guest module from raw Wasm bytes.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`RuntimeLoader::load`].
    pub async fn load_bytes(&self, bytes: &[u8]) -> Result<Arc<LoadedRuntime>, PlaygroundError> {
        self.begin()?;
        self.finish(GuestModule::from_bytes(&self.engine, bytes)).await
    }

    /// Load the guest module from WAT text. Primarily for testing.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`RuntimeLoader::load`].
    pub async fn load_wat(&self, wat: &str) -> Result<Arc<LoadedRuntime>, PlaygroundError> {
        self.begin()?;
        self.finish(GuestModule::from_wat(&self.engine, wat)).await
    }

    /// Transition `NotLoaded → Loading`, rejecting repeat attempts.
    fn begin(&self) -> Result<(), PlaygroundError> {
        let started = self.readiness.send_if_modified(|state| {
            if *state == RuntimeReadiness::NotLoaded {
                *state = RuntimeReadiness::Loading;
                true
            } else {
                false
            }
        });

        if started {
            info!("Runtime load started");
            Ok(())
        } else {
            Err(PlaygroundError::load_failed(
                "runtime load already attempted this session",
            ))
        }
    }

    /// Start the compiled module and publish the terminal state.
    async fn finish(
        &self,
        compiled: Result<GuestModule, PlaygroundError>,
    ) -> Result<Arc<LoadedRuntime>, PlaygroundError> {
        let module = match compiled {
            Ok(module) => module,
            Err(e) => return Err(self.fail(e)),
        };

        // Starting the module also validates the ABI: the examples export is
        // called once and its catalog snapshot kept for the session.
        let examples = match module.examples(&self.engine).await {
            Ok(examples) => examples,
            Err(e) => return Err(self.fail(e)),
        };

        let runtime = Arc::new(LoadedRuntime {
            engine: self.engine.clone(),
            module,
            examples,
        });

        // Install the handle before publishing Ready: readiness must never
        // claim more than the slot holds.
        *self.slot.write() = Some(Arc::clone(&runtime));
        self.readiness.send_replace(RuntimeReadiness::Ready);

        info!(
            examples = runtime.examples.len(),
            content_hash = %runtime.module.content_hash(),
            "Runtime ready"
        );

        Ok(runtime)
    }

    fn fail(&self, e: PlaygroundError) -> PlaygroundError {
        error!(error = %e, "Runtime load failed");
        self.readiness.send_replace(RuntimeReadiness::Failed);
        e
    }
}

impl std::fmt::Debug for RuntimeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeLoader")
            .field("readiness", &self.readiness())
            .finish_non_exhaustive()
    }
}

/// Consumer-side view of the loader.
///
/// Cheap to clone; holds the readiness receiver and the shared runtime slot.
#[derive(Clone)]
pub struct RuntimeHandle {
    readiness: watch::Receiver<RuntimeReadiness>,
    slot: RuntimeSlot,
}

impl RuntimeHandle {
    /// Current readiness state.
    pub fn readiness(&self) -> RuntimeReadiness {
        *self.readiness.borrow()
    }

    /// Get the loaded runtime, if the entry point exists.
    ///
    /// Presence of the handle is the authoritative readiness check; callers
    /// must prefer it over the flag to avoid racing the installation.
    pub fn runtime(&self) -> Option<Arc<LoadedRuntime>> {
        self.slot.read().clone()
    }

    /// Wait until the loader reaches a terminal state.
    ///
    /// Returns the terminal state; if the channel closes first, the last
    /// observed state.
    pub async fn wait_terminal(&mut self) -> RuntimeReadiness {
        loop {
            let state = *self.readiness.borrow_and_update();
            if state.is_terminal() {
                return state;
            }
            if self.readiness.changed().await.is_err() {
                return *self.readiness.borrow();
            }
        }
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("readiness", &self.readiness())
            .finish_non_exhaustive()
    }
}

/// A started runtime: the compiled guest module plus the immutable example
/// catalog snapshot taken at load time.
pub struct LoadedRuntime {
    engine: WasmEngine,
    module: GuestModule,
    examples: BTreeMap<String, String>,
}

impl LoadedRuntime {
    /// Run `source` through the guest and return its textual output.
    ///
    /// Language-level failures (syntax errors, runtime errors of the
    /// executed program) are part of the returned text; an `Err` here means
    /// the runtime itself misbehaved (trap, ABI violation).
    ///
    /// # Errors
    ///
    /// Returns an error if instantiation fails or the guest traps.
    pub async fn execute(&self, source: &str) -> Result<String, PlaygroundError> {
        self.module.execute(&self.engine, source).await
    }

    /// The example catalog, keyed in ascending identifier order.
    pub fn examples(&self) -> &BTreeMap<String, String> {
        &self.examples
    }
}

impl std::fmt::Debug for LoadedRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedRuntime")
            .field("examples", &self.examples.len())
            .field("content_hash", &self.module.content_hash())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_is_terminal() {
        assert!(!RuntimeReadiness::NotLoaded.is_terminal());
        assert!(!RuntimeReadiness::Loading.is_terminal());
        assert!(RuntimeReadiness::Ready.is_terminal());
        assert!(RuntimeReadiness::Failed.is_terminal());
    }

    #[test]
    fn test_loader_starts_not_loaded() {
        let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
        assert_eq!(loader.readiness(), RuntimeReadiness::NotLoaded);
        assert!(loader.handle().runtime().is_none());
    }

    #[tokio::test]
    async fn test_failed_load_publishes_failed_and_no_handle() {
        let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
        let handle = loader.handle();

        let result = loader.load_bytes(b"not wasm at all").await;

        assert!(result.is_err());
        assert_eq!(loader.readiness(), RuntimeReadiness::Failed);
        assert!(handle.runtime().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_module_file_is_io_error() {
        let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();

        let result = loader.load("./no-such-module.wasm").await;

        match result {
            Err(PlaygroundError::Io(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
                assert!(e.to_string().contains("no-such-module.wasm"));
            }
            other => panic!("expected an IO error, got {other:?}"),
        }
        assert_eq!(loader.readiness(), RuntimeReadiness::Failed);
    }

    #[tokio::test]
    async fn test_load_is_single_shot() {
        let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();

        let _ = loader.load_bytes(b"bad").await;
        let second = loader.load_bytes(b"bad").await;

        assert!(matches!(second, Err(PlaygroundError::LoadFailed { .. })));
        // Still terminal, not flipped back
        assert_eq!(loader.readiness(), RuntimeReadiness::Failed);
    }
}
