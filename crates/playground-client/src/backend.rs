//! The uniform backend contract of the execution bridge.

use async_trait::async_trait;

use playground_common::PlaygroundError;

/// Result of running source text through a backend.
///
/// Execution failure is a normal, expected outcome: a non-200 response (or,
/// locally, error text produced by the executed program) still resolves to
/// an outcome, with the body text carried verbatim. Only transport-level and
/// readiness failures surface as [`PlaygroundError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// The backend's textual output, success or not.
    pub output: String,
    /// Whether the execution succeeded (remote: HTTP 200; local: always).
    pub succeeded: bool,
}

impl ExecutionOutcome {
    /// A successful outcome carrying `output`.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            succeeded: true,
        }
    }

    /// A failed outcome carrying the backend's error text.
    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            succeeded: false,
        }
    }
}

/// One interface, two implementations: the capability set of a playground
/// deployment, chosen once at composition time.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// List the available example identifiers.
    ///
    /// Order is whatever the backend produces; display sorting is the
    /// controller's responsibility.
    async fn list_examples(&self) -> Result<Vec<String>, PlaygroundError>;

    /// Fetch the source text of one example.
    ///
    /// Membership is not validated here; unknown identifiers are the
    /// backend's concern.
    async fn fetch_example(&self, id: &str) -> Result<String, PlaygroundError>;

    /// Run source text and resolve to an outcome.
    async fn run(&self, source: &str) -> Result<ExecutionOutcome, PlaygroundError>;

    /// Whether the run operation may be invoked right now.
    ///
    /// Remote backends are always ready; the local backend reports whether
    /// its execute entry point exists yet.
    fn is_ready(&self) -> bool {
        true
    }
}
