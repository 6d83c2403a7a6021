//! In-process Wasm runtime for the playground's local mode.
//!
//! This crate provides the local execution backend's foundation:
//! - [`WasmEngine`]: Configured Wasmtime engine
//! - [`GuestModule`]: Compiled playground guest module and its call ABI
//! - [`RuntimeLoader`]: One-shot loader publishing an explicit readiness signal
//! - [`LoadedRuntime`]: The started runtime, with its example catalog snapshot
//!
//! # Lifecycle
//!
//! ```text
//! NotLoaded ──load()──▶ Loading ──┬──▶ Ready   (handle installed)
//!                                 └──▶ Failed  (no handle, terminal)
//! ```
//!
//! Readiness transitions exactly once per session. Consumers subscribe to the
//! readiness channel or check handle presence; handle presence is the
//! authoritative signal that the execute entry point exists.

pub mod engine;
pub mod guest;
pub mod loader;

pub use engine::WasmEngine;
pub use guest::GuestModule;
pub use loader::{LoadedRuntime, RuntimeHandle, RuntimeLoader, RuntimeReadiness};
