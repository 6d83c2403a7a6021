//! Execution bridge and form controller for the playground.
//!
//! This crate is the client side of the playground: one uniform backend
//! contract with two implementations, and the controller that keeps the
//! source field, the example selector, and the result field coherent.
//!
//! - [`ExecutionBackend`]: the capability set `{list_examples, fetch_example,
//!   run}` — the mode is selected once when the backend is constructed, never
//!   by inline conditionals in UI code
//! - [`LocalBackend`]: in-process Wasm runtime, readiness-guarded
//! - [`RemoteBackend`]: HTTP execution service client
//! - [`PlaygroundController`]: the form/selection state machine with
//!   last-writer-wins ordering on both fields

pub mod backend;
pub mod controller;
pub mod local;
pub mod remote;

pub use backend::{ExecutionBackend, ExecutionOutcome};
pub use controller::{PlaygroundController, ResultField, SourceField, WAITING_PLACEHOLDER};
pub use local::LocalBackend;
pub use remote::RemoteBackend;
