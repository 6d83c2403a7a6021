//! Common types, errors, and configuration for the playground workspace.
//!
//! This crate provides shared functionality used across the playground crates:
//! - Error types using `thiserror` for type-safe error handling
//! - Configuration structures for runtime, backend, and server settings
//! - TOML configuration file loading

pub mod config;
pub mod config_file;
pub mod error;

pub use config::{BackendConfig, ExamplesConfig, LocalConfig, RemoteConfig, RuntimeConfig};
pub use config_file::{ConfigFile, ConfigFileError, ServerConfigFile};
pub use error::PlaygroundError;
