//! HTTP router configuration.
//!
//! This module provides the function to build the Axum router with all
//! routes and middleware.

use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{execute, fetch_example, health_check, list_examples};
use crate::state::AppState;

/// Build the application router.
///
/// Routes:
/// - `POST /v1/execute` - Run submitted source
/// - `GET /v1/examples` - List example identifiers
/// - `GET /v1/examples/:name` - Fetch one example's source text
/// - `GET /health` - Health check
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let api_routes = Router::new()
        .route("/v1/execute", post(execute))
        .route("/v1/examples", get(list_examples))
        .route("/v1/examples/:name", get(fetch_example));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
