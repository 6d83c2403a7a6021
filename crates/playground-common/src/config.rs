//! Configuration structures for the playground.
//!
//! This module defines configuration options for the runtime and the two
//! delivery modes:
//! - [`RuntimeConfig`]: Wasmtime engine and per-execution limits
//! - [`BackendConfig`]: composition-time choice between local and remote mode
//! - [`ExamplesConfig`]: where the execution service finds example sources

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Wasm runtime configuration.
///
/// These settings control the engine and the resource limits applied to each
/// execution of user-submitted source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// Enable fuel metering.
    ///
    /// When enabled, each execution is bounded by `max_fuel`, so a runaway
    /// program traps instead of spinning forever.
    #[serde(default = "defaults::fuel_metering")]
    pub fuel_metering: bool,

    /// Maximum fuel (CPU instructions) per execution.
    #[serde(default = "defaults::max_fuel")]
    pub max_fuel: u64,

    /// Execution timeout in milliseconds.
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fuel_metering: defaults::fuel_metering(),
            max_fuel: defaults::max_fuel(),
            timeout_ms: defaults::timeout_ms(),
        }
    }
}

impl RuntimeConfig {
    /// Get the execution timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Backend selection: the deployment is either local-only or remote-only.
///
/// This is a composition-time choice, not a runtime fallback. In TOML:
///
/// ```toml
/// [backend]
/// mode = "remote"
/// base_url = "http://localhost:3826"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Execution by a Wasm module loaded into this process.
    Local(LocalConfig),
    /// Execution by an HTTP-reachable service.
    Remote(RemoteConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Local(LocalConfig::default())
    }
}

/// Local mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalConfig {
    /// Path to the Wasm runtime module.
    #[serde(default = "defaults::module_path")]
    pub module_path: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            module_path: defaults::module_path(),
        }
    }
}

/// Remote mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Base URL of the execution service (e.g., "http://localhost:3826").
    pub base_url: String,

    /// Overall request timeout in milliseconds.
    #[serde(default = "defaults::request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Connection timeout in milliseconds.
    #[serde(default = "defaults::connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl RemoteConfig {
    /// Create a config for the given base URL with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_ms: defaults::request_timeout_ms(),
            connect_timeout_ms: defaults::connect_timeout_ms(),
        }
    }

    /// Get the request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get the connection timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Example catalog configuration for the execution service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExamplesConfig {
    /// Directory containing example source files.
    #[serde(default = "defaults::examples_dir")]
    pub dir: String,

    /// File extension identifying example sources (without the dot).
    #[serde(default = "defaults::example_extension")]
    pub extension: String,
}

impl Default for ExamplesConfig {
    fn default() -> Self {
        Self {
            dir: defaults::examples_dir(),
            extension: defaults::example_extension(),
        }
    }
}

/// Default value functions for serde.
mod defaults {
    pub const fn fuel_metering() -> bool {
        true
    }

    pub const fn max_fuel() -> u64 {
        10_000_000
    }

    pub const fn timeout_ms() -> u64 {
        1_000
    }

    pub fn module_path() -> String {
        "./playground.wasm".to_string()
    }

    pub const fn request_timeout_ms() -> u64 {
        30_000
    }

    pub const fn connect_timeout_ms() -> u64 {
        10_000
    }

    pub fn examples_dir() -> String {
        "./web/examples".to_string()
    }

    pub fn example_extension() -> String {
        "tao".to_string()
    }
}
