//! Wasmtime engine configuration and creation.

use std::sync::Arc;

use tracing::info;
use wasmtime::{Config, Engine};

use playground_common::{PlaygroundError, RuntimeConfig};

/// Thread-safe WebAssembly engine wrapper.
///
/// The engine is created once per process and shared by every execution.
/// It carries no per-execution state.
///
/// # Configuration
///
/// - **Async Support**: all guest calls suspend the caller instead of
///   blocking the event loop
/// - **Fuel Metering**: bounds the instructions a submitted program may
///   execute before trapping
/// - **Cranelift optimizations**: compiled for speed
#[derive(Clone)]
pub struct WasmEngine {
    engine: Arc<Engine>,
    config: RuntimeConfig,
}

impl WasmEngine {
    /// Create a new WebAssembly engine with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Wasmtime configuration is invalid.
    pub fn new(config: &RuntimeConfig) -> Result<Self, PlaygroundError> {
        let mut wasmtime_config = Config::new();

        // Enable async support so guest calls suspend instead of blocking
        wasmtime_config.async_support(true);

        // Enable fuel metering for deterministic CPU limiting
        wasmtime_config.consume_fuel(config.fuel_metering);

        // Enable Cranelift optimizations
        wasmtime_config.cranelift_opt_level(wasmtime::OptLevel::Speed);

        let engine = Engine::new(&wasmtime_config).map_err(|e| {
            PlaygroundError::invalid_config(format!("Failed to create Wasmtime engine: {e}"))
        })?;

        info!(
            fuel_metering = config.fuel_metering,
            max_fuel = config.max_fuel,
            "Wasmtime engine initialized"
        );

        Ok(Self {
            engine: Arc::new(engine),
            config: config.clone(),
        })
    }

    /// Get a reference to the inner Wasmtime engine.
    pub fn inner(&self) -> &Engine {
        &self.engine
    }

    /// Get the runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Check if fuel metering is enabled.
    pub fn is_fuel_metering_enabled(&self) -> bool {
        self.config.fuel_metering
    }
}

impl std::fmt::Debug for WasmEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmEngine")
            .field("fuel_metering", &self.config.fuel_metering)
            .field("max_fuel", &self.config.max_fuel)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_creation_default() {
        let config = RuntimeConfig::default();
        let engine = WasmEngine::new(&config);

        assert!(engine.is_ok());
        let engine = engine.unwrap();
        assert!(engine.is_fuel_metering_enabled());
    }

    #[test]
    fn test_engine_creation_no_fuel() {
        let config = RuntimeConfig {
            fuel_metering: false,
            ..Default::default()
        };
        let engine = WasmEngine::new(&config);

        assert!(engine.is_ok());
        assert!(!engine.unwrap().is_fuel_metering_enabled());
    }

    #[test]
    fn test_engine_debug() {
        let config = RuntimeConfig::default();
        let engine = WasmEngine::new(&config).unwrap();

        let debug_str = format!("{engine:?}");
        assert!(debug_str.contains("WasmEngine"));
        assert!(debug_str.contains("fuel_metering"));
    }
}
