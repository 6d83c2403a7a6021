//! Remote-mode backend: client for the HTTP execution service.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::backend::{ExecutionBackend, ExecutionOutcome};
use playground_common::{PlaygroundError, RemoteConfig};

/// The execute request wire format.
#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    source: &'a str,
}

/// Execution backend reaching a playground service over HTTP.
///
/// Failure classes, never conflated:
/// - an execute request completed with *any* status → an
///   [`ExecutionOutcome`] whose `succeeded` flag is `status == 200` and
///   whose output is the body text verbatim (the service puts a usable
///   error message in the body)
/// - a catalog request completed outside the success class →
///   [`PlaygroundError::UnexpectedStatus`]
/// - the request never completed → [`PlaygroundError::Transport`]
pub struct RemoteBackend {
    client: Client,
    base: Url,
}

impl RemoteBackend {
    /// Create a backend for the configured service.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &RemoteConfig) -> Result<Self, PlaygroundError> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            PlaygroundError::invalid_config(format!("Invalid base URL '{}': {e}", config.base_url))
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("playground/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PlaygroundError::invalid_config(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, base })
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, PlaygroundError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| PlaygroundError::invalid_config("base URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ExecutionBackend for RemoteBackend {
    async fn list_examples(&self) -> Result<Vec<String>, PlaygroundError> {
        let url = self.endpoint(&["v1", "examples"])?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PlaygroundError::transport(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                PlaygroundError::transport(format!("GET {url}: unreadable body: {e}"))
            })?;
            return Err(PlaygroundError::unexpected_status(status.as_u16(), body));
        }

        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| PlaygroundError::transport(format!("GET {url}: invalid body: {e}")))
    }

    async fn fetch_example(&self, id: &str) -> Result<String, PlaygroundError> {
        let url = self.endpoint(&["v1", "examples", id])?;

        debug!(id = %id, "Fetching example");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PlaygroundError::transport(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                PlaygroundError::transport(format!("GET {url}: unreadable body: {e}"))
            })?;
            return Err(PlaygroundError::unexpected_status(status.as_u16(), body));
        }

        response
            .text()
            .await
            .map_err(|e| PlaygroundError::transport(format!("GET {url}: unreadable body: {e}")))
    }

    async fn run(&self, source: &str) -> Result<ExecutionOutcome, PlaygroundError> {
        let url = self.endpoint(&["v1", "execute"])?;

        let body = serde_json::to_string(&ExecuteRequest { source })
            .map_err(|e| PlaygroundError::transport(format!("request encoding failed: {e}")))?;

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json;charset=UTF-8")
            .body(body)
            .send()
            .await
            .map_err(|e| PlaygroundError::transport(format!("POST {url}: {e}")))?;

        // Any completed response resolves to an outcome; the body is
        // human-readable text on both paths.
        let succeeded = response.status().as_u16() == 200;
        let output = response
            .text()
            .await
            .map_err(|e| PlaygroundError::transport(format!("POST {url}: unreadable body: {e}")))?;

        info!(succeeded, output_len = output.len(), "Execution completed");

        Ok(ExecutionOutcome { output, succeeded })
    }
}

impl std::fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}
