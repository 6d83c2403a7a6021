//! HTTP execution service for the playground's remote mode.
//!
//! This crate exposes the versioned execution surface backed by the same
//! in-process Wasm runtime local mode uses:
//!
//! - `POST /v1/execute` — run submitted source, body text either way
//! - `GET /v1/examples` — JSON array of example identifiers
//! - `GET /v1/examples/{name}` — one example's source text
//! - `GET /health` — liveness check
//!
//! # Quick Start
//!
//! ```ignore
//! use playground_common::{ExamplesConfig, RuntimeConfig};
//! use playground_runtime::RuntimeLoader;
//! use playground_server::{AppState, PlaygroundServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = RuntimeLoader::new(&RuntimeConfig::default())?;
//!     let runtime = loader.load("./playground.wasm").await?;
//!
//!     let state = AppState::new(runtime, &ExamplesConfig::default(), &RuntimeConfig::default());
//!     PlaygroundServer::new(state, ServerConfig::default()).run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use router::build_router;
pub use server::{PlaygroundServer, ServerConfig, TestHandle};
pub use state::{AppState, ExampleStore};
