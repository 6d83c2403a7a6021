//! Request handlers for the execution service.
//!
//! Response bodies are human-readable text on both the success and failure
//! paths; clients render them verbatim. Only the example listing is JSON.

use std::io;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::state::AppState;

/// The execute request wire format.
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    /// The source text to run.
    pub source: String,
}

/// Execute submitted source through the Wasm runtime.
///
/// Returns 200 with the program's output text, or 500 with error text when
/// the execution itself failed (trap, deadline). The body is a usable
/// message either way.
#[instrument(skip(state, req))]
pub async fn execute(
    State(state): State<AppState>,
    Json(req): Json<ExecuteRequest>,
) -> impl IntoResponse {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id = %request_id,
        source_len = req.source.len(),
        "Handling execute request"
    );

    let result = tokio::time::timeout(state.exec_timeout(), state.runtime().execute(&req.source));

    match result.await {
        Ok(Ok(output)) => {
            info!(
                request_id = %request_id,
                duration_ms = start.elapsed().as_millis(),
                output_len = output.len(),
                "Execution completed"
            );
            (StatusCode::OK, output)
        }
        Ok(Err(e)) => {
            error!(
                request_id = %request_id,
                error = %e,
                duration_ms = start.elapsed().as_millis(),
                "Execution failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(_elapsed) => {
            warn!(
                request_id = %request_id,
                timeout_ms = state.exec_timeout().as_millis(),
                "Execution deadline exceeded"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "execution timed out after {}ms",
                    state.exec_timeout().as_millis()
                ),
            )
        }
    }
}

/// List the available example identifiers.
///
/// The order is whatever the directory listing produced; display sorting is
/// the client's job.
pub async fn list_examples(State(state): State<AppState>) -> impl IntoResponse {
    match state.examples().list().await {
        Ok(names) => (StatusCode::OK, Json(names)).into_response(),
        Err(e) => {
            error!(error = %e, "Example listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to list examples: {e}"),
            )
                .into_response()
        }
    }
}

/// Fetch one example's source text.
#[instrument(skip(state))]
pub async fn fetch_example(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.examples().read(&name).await {
        Ok(source) => (StatusCode::OK, source),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(name = %name, "Example not found");
            (StatusCode::NOT_FOUND, format!("example not found: {name}"))
        }
        Err(e) => {
            error!(name = %name, error = %e, "Example read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to read example: {e}"),
            )
        }
    }
}

/// Health check handler.
///
/// Returns 200 OK if the server is running.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
