//! Guest module compilation and the playground call ABI.
//!
//! A playground guest module is a Wasm module that implements the executed
//! language. Once started it must expose:
//!
//! - an exported linear `memory`
//! - `alloc(len: i32) -> i32` — reserve `len` bytes of guest memory
//! - `execute(ptr: i32, len: i32) -> i64` — run the UTF-8 source at
//!   `ptr..ptr+len`; the return value packs the output region as
//!   `ptr << 32 | len`. Language-level errors come back as output text.
//! - `examples() -> i64` — packed region holding a JSON object mapping
//!   example identifier to example source
//!
//! Each call instantiates a fresh store, so executions are isolated and the
//! module itself stays immutable and shareable.

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Instant;

use tracing::{debug, info, instrument};
use wasmtime::{Instance, Linker, Memory, Module, Store, Trap};

use crate::WasmEngine;
use playground_common::PlaygroundError;

/// A compiled playground guest module.
///
/// Thread-safe; the underlying Wasmtime module is shared across calls.
#[derive(Clone)]
pub struct GuestModule {
    module: Module,
    content_hash: String,
}

impl GuestModule {
    /// Compile a guest module from WebAssembly bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid Wasm module.
    #[instrument(skip(engine, bytes), fields(bytes_len = bytes.len()))]
    pub fn from_bytes(engine: &WasmEngine, bytes: &[u8]) -> Result<Self, PlaygroundError> {
        let start = Instant::now();

        Self::validate_wasm_header(bytes)?;

        let module = Module::new(engine.inner(), bytes)
            .map_err(|e| PlaygroundError::load_failed(format!("Module compilation failed: {e}")))?;

        let content_hash = compute_hash(bytes);

        info!(
            content_hash = %content_hash,
            duration_ms = start.elapsed().as_millis(),
            "Guest module compiled"
        );

        Ok(Self {
            module,
            content_hash,
        })
    }

    /// Compile a guest module from WAT (WebAssembly Text Format).
    ///
    /// This is primarily for testing purposes.
    ///
    /// # Errors
    ///
    /// Returns an error if compilation fails.
    #[instrument(skip(engine, wat))]
    pub fn from_wat(engine: &WasmEngine, wat: &str) -> Result<Self, PlaygroundError> {
        let module = Module::new(engine.inner(), wat)
            .map_err(|e| PlaygroundError::load_failed(format!("WAT compilation failed: {e}")))?;

        Ok(Self {
            module,
            content_hash: compute_hash(wat.as_bytes()),
        })
    }

    /// Get the content hash of the original module bytes.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Run the guest's `execute` entry point over `source`.
    ///
    /// Instantiates the module with a fresh fuel-limited store, copies the
    /// source into guest memory via `alloc`, and reads the output region
    /// back out.
    ///
    /// # Errors
    ///
    /// Returns an error if instantiation fails, the ABI exports are missing
    /// or mistyped, the guest traps, or the output region is invalid.
    pub async fn execute(
        &self,
        engine: &WasmEngine,
        source: &str,
    ) -> Result<String, PlaygroundError> {
        let len = i32::try_from(source.len())
            .map_err(|_| PlaygroundError::guest_interface("source exceeds guest address space"))?;

        let (mut store, instance) = self.instantiate(engine).await?;
        let memory = exported_memory(&instance, &mut store)?;

        let alloc = instance
            .get_typed_func::<i32, i32>(&mut store, "alloc")
            .map_err(|_| missing_export("alloc"))?;
        let execute = instance
            .get_typed_func::<(i32, i32), i64>(&mut store, "execute")
            .map_err(|_| missing_export("execute"))?;

        // Copy the source into guest memory
        let ptr = alloc
            .call_async(&mut store, len)
            .await
            .map_err(map_call_error)?;
        write_region(&mut store, &memory, ptr, source.as_bytes())?;

        debug!(source_len = source.len(), "Executing guest entry point");

        let packed = execute
            .call_async(&mut store, (ptr, len))
            .await
            .map_err(map_call_error)?;

        read_packed_string(&store, &memory, packed)
    }

    /// Read the guest's example catalog.
    ///
    /// Calls the `examples` export and parses the returned JSON object into
    /// an identifier → source mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the export is missing, the guest traps, or the
    /// returned region is not a valid JSON object of strings.
    pub async fn examples(
        &self,
        engine: &WasmEngine,
    ) -> Result<BTreeMap<String, String>, PlaygroundError> {
        let (mut store, instance) = self.instantiate(engine).await?;
        let memory = exported_memory(&instance, &mut store)?;

        let examples = instance
            .get_typed_func::<(), i64>(&mut store, "examples")
            .map_err(|_| missing_export("examples"))?;

        let packed = examples
            .call_async(&mut store, ())
            .await
            .map_err(map_call_error)?;

        let json = read_packed_string(&store, &memory, packed)?;
        serde_json::from_str(&json).map_err(|e| {
            PlaygroundError::guest_interface(format!("examples export returned invalid JSON: {e}"))
        })
    }

    /// Instantiate the module with a fresh store.
    async fn instantiate(
        &self,
        engine: &WasmEngine,
    ) -> Result<(Store<()>, Instance), PlaygroundError> {
        let mut store = Store::new(engine.inner(), ());

        if engine.is_fuel_metering_enabled() {
            let config = engine.config();
            store.set_fuel(config.max_fuel).map_err(|e| {
                PlaygroundError::invalid_config(format!("Failed to set fuel: {e}"))
            })?;
            // Yield to the executor periodically so timeouts can fire
            store
                .fuel_async_yield_interval(Some(10_000))
                .map_err(|e| {
                    PlaygroundError::invalid_config(format!("Failed to set yield interval: {e}"))
                })?;
        }

        let linker: Linker<()> = Linker::new(engine.inner());
        let instance = linker
            .instantiate_async(&mut store, &self.module)
            .await
            .map_err(|e| PlaygroundError::load_failed(format!("Instantiation failed: {e}")))?;

        Ok((store, instance))
    }

    /// Validate WebAssembly header (magic number).
    fn validate_wasm_header(bytes: &[u8]) -> Result<(), PlaygroundError> {
        if bytes.len() < 8 {
            return Err(PlaygroundError::load_failed("Invalid Wasm: file too small"));
        }

        // Check magic number: \0asm
        if &bytes[0..4] != b"\0asm" {
            return Err(PlaygroundError::load_failed(
                "Invalid Wasm: bad magic number",
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for GuestModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestModule")
            .field("content_hash", &self.content_hash)
            .finish_non_exhaustive()
    }
}

/// Get the guest's exported linear memory.
fn exported_memory(
    instance: &Instance,
    store: &mut Store<()>,
) -> Result<Memory, PlaygroundError> {
    instance
        .get_memory(store, "memory")
        .ok_or_else(|| missing_export("memory"))
}

fn missing_export(name: &str) -> PlaygroundError {
    PlaygroundError::guest_interface(format!("export `{name}` missing or mistyped"))
}

/// Map a Wasmtime call error to a playground error.
fn map_call_error(error: wasmtime::Error) -> PlaygroundError {
    if let Some(trap) = error.downcast_ref::<Trap>() {
        if *trap == Trap::OutOfFuel {
            return PlaygroundError::trap("fuel exhausted: CPU limit exceeded");
        }
    }
    PlaygroundError::trap(error.to_string())
}

/// Copy host bytes into a guest memory region.
fn write_region(
    store: &mut Store<()>,
    memory: &Memory,
    ptr: i32,
    bytes: &[u8],
) -> Result<(), PlaygroundError> {
    let start = ptr as u32 as usize;
    let end = start
        .checked_add(bytes.len())
        .ok_or_else(|| PlaygroundError::guest_interface("allocated region overflows"))?;

    let data = memory.data_mut(store);
    if end > data.len() {
        return Err(PlaygroundError::guest_interface(
            "guest allocator returned an out-of-bounds region",
        ));
    }

    data[start..end].copy_from_slice(bytes);
    Ok(())
}

/// Decode a packed `ptr << 32 | len` region into a UTF-8 string.
fn read_packed_string(
    store: &Store<()>,
    memory: &Memory,
    packed: i64,
) -> Result<String, PlaygroundError> {
    let packed = packed as u64;
    let start = (packed >> 32) as usize;
    let len = (packed & 0xffff_ffff) as usize;

    let end = start
        .checked_add(len)
        .ok_or_else(|| PlaygroundError::guest_interface("result region overflows"))?;

    let data = memory.data(store);
    if end > data.len() {
        return Err(PlaygroundError::guest_interface(
            "result region out of bounds",
        ));
    }

    String::from_utf8(data[start..end].to_vec())
        .map_err(|_| PlaygroundError::guest_interface("result region is not valid UTF-8"))
}

/// Compute a hash of the given bytes.
fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
