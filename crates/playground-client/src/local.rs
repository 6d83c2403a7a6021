//! Local-mode backend over the in-process Wasm runtime.

use async_trait::async_trait;
use tracing::debug;

use crate::backend::{ExecutionBackend, ExecutionOutcome};
use playground_common::PlaygroundError;
use playground_runtime::{LoadedRuntime, RuntimeHandle};

use std::sync::Arc;

/// Execution backend backed by a Wasm runtime loaded into this process.
///
/// Every operation is guarded by the presence of the loaded runtime handle:
/// if the entry point does not exist yet (or the load failed), the call is
/// rejected with [`PlaygroundError::RuntimeNotReady`] instead of being
/// attempted. The catalog is served from the immutable snapshot taken at
/// load time, so example lookups never suspend on anything external.
pub struct LocalBackend {
    handle: RuntimeHandle,
}

impl LocalBackend {
    /// Create a backend over a loader handle.
    ///
    /// The handle may be taken before the load completes; operations simply
    /// fail with `RuntimeNotReady` until it does.
    pub fn new(handle: RuntimeHandle) -> Self {
        Self { handle }
    }

    /// Handle presence is the authoritative readiness check.
    fn runtime(&self) -> Result<Arc<LoadedRuntime>, PlaygroundError> {
        self.handle.runtime().ok_or(PlaygroundError::RuntimeNotReady)
    }
}

#[async_trait]
impl ExecutionBackend for LocalBackend {
    async fn list_examples(&self) -> Result<Vec<String>, PlaygroundError> {
        let runtime = self.runtime()?;
        Ok(runtime.examples().keys().cloned().collect())
    }

    async fn fetch_example(&self, id: &str) -> Result<String, PlaygroundError> {
        let runtime = self.runtime()?;
        match runtime.examples().get(id) {
            Some(source) => Ok(source.clone()),
            None => Err(PlaygroundError::guest_interface(format!(
                "example '{id}' not in the catalog"
            ))),
        }
    }

    async fn run(&self, source: &str) -> Result<ExecutionOutcome, PlaygroundError> {
        let runtime = self.runtime()?;

        debug!(source_len = source.len(), "Running source locally");

        // Local mode has no transport failure class: whatever the guest
        // returns, including its own error text, is a successful outcome.
        let output = runtime.execute(source).await?;
        Ok(ExecutionOutcome::success(output))
    }

    fn is_ready(&self) -> bool {
        self.handle.runtime().is_some()
    }
}

impl std::fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_common::RuntimeConfig;
    use playground_runtime::RuntimeLoader;

    #[tokio::test]
    async fn test_operations_rejected_before_load() {
        let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
        let backend = LocalBackend::new(loader.handle());

        assert!(!backend.is_ready());
        assert!(matches!(
            backend.run("print 1").await,
            Err(PlaygroundError::RuntimeNotReady)
        ));
        assert!(matches!(
            backend.list_examples().await,
            Err(PlaygroundError::RuntimeNotReady)
        ));
        assert!(matches!(
            backend.fetch_example("hello.tao").await,
            Err(PlaygroundError::RuntimeNotReady)
        ));
    }
}
