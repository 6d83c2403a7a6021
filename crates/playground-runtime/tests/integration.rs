//! Integration tests for playground-runtime.
//!
//! These tests drive the complete local-mode pipeline with WAT guest
//! modules: load, readiness publication, example catalog snapshot, and
//! execution through the alloc/execute/examples ABI.

use playground_common::{PlaygroundError, RuntimeConfig};
use playground_runtime::{RuntimeLoader, RuntimeReadiness};

/// A guest that echoes the submitted source back as its output and ships a
/// two-entry example catalog.
const ECHO_GUEST: &str = r#"
    (module
        (memory (export "memory") 1)
        (global $head (mut i32) (i32.const 4096))
        (func (export "alloc") (param $len i32) (result i32)
            (local $ptr i32)
            (local.set $ptr (global.get $head))
            (global.set $head (i32.add (global.get $head) (local.get $len)))
            (local.get $ptr))
        (func (export "execute") (param $ptr i32) (param $len i32) (result i64)
            (i64.or
                (i64.shl (i64.extend_i32_u (local.get $ptr)) (i64.const 32))
                (i64.extend_i32_u (local.get $len))))
        (data (i32.const 0) "{\"fib.tao\":\"print fib\",\"hello.tao\":\"print hi\"}")
        (func (export "examples") (result i64)
            (i64.const 46)))
"#;

/// A guest whose execute entry point always traps.
const TRAPPING_GUEST: &str = r#"
    (module
        (memory (export "memory") 1)
        (func (export "alloc") (param i32) (result i32)
            (i32.const 4096))
        (func (export "execute") (param i32) (param i32) (result i64)
            unreachable)
        (data (i32.const 0) "{}")
        (func (export "examples") (result i64)
            (i64.const 2)))
"#;

/// A guest whose execute entry point never terminates.
const SPINNING_GUEST: &str = r#"
    (module
        (memory (export "memory") 1)
        (func (export "alloc") (param i32) (result i32)
            (i32.const 4096))
        (func (export "execute") (param i32) (param i32) (result i64)
            (loop $spin (br $spin))
            (i64.const 0))
        (data (i32.const 0) "{}")
        (func (export "examples") (result i64)
            (i64.const 2)))
"#;

// ============================================================================
// Test: Load and readiness
// ============================================================================

#[tokio::test]
async fn test_load_publishes_ready_after_handle() {
    let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
    let mut handle = loader.handle();

    let runtime = loader.load_wat(ECHO_GUEST).await.unwrap();

    assert_eq!(handle.wait_terminal().await, RuntimeReadiness::Ready);
    assert_eq!(loader.readiness(), RuntimeReadiness::Ready);
    // Ready implies the handle is installed
    assert!(handle.runtime().is_some());
    assert_eq!(runtime.examples().len(), 2);
}

#[tokio::test]
async fn test_catalog_snapshot_is_sorted() {
    let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
    let runtime = loader.load_wat(ECHO_GUEST).await.unwrap();

    let ids: Vec<&String> = runtime.examples().keys().collect();
    assert_eq!(ids, vec!["fib.tao", "hello.tao"]);
    assert_eq!(runtime.examples()["hello.tao"], "print hi");
    assert_eq!(runtime.examples()["fib.tao"], "print fib");
}

#[tokio::test]
async fn test_missing_examples_export_fails_load() {
    let wat = r#"(module (func (export "execute") (param i32 i32) (result i64) (i64.const 0)))"#;

    let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
    let result = loader.load_wat(wat).await;

    assert!(matches!(
        result,
        Err(PlaygroundError::GuestInterface { .. })
    ));
    assert_eq!(loader.readiness(), RuntimeReadiness::Failed);
    assert!(loader.handle().runtime().is_none());
}

// ============================================================================
// Test: Execution
// ============================================================================

#[tokio::test]
async fn test_execute_round_trips_bytes() {
    let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
    let runtime = loader.load_wat(ECHO_GUEST).await.unwrap();

    let source = "func main() {\n    println(42);\n}\n";
    let output = runtime.execute(source).await.unwrap();

    assert_eq!(output, source);
}

#[tokio::test]
async fn test_execute_example_source_unchanged() {
    let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
    let runtime = loader.load_wat(ECHO_GUEST).await.unwrap();

    // Submitting a catalog entry's exact text must return it byte-identical
    let source = runtime.examples()["hello.tao"].clone();
    let output = runtime.execute(&source).await.unwrap();

    assert_eq!(output, source);
}

#[tokio::test]
async fn test_executions_are_isolated() {
    let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
    let runtime = loader.load_wat(ECHO_GUEST).await.unwrap();

    // Each call gets a fresh store; the bump allocator starts over
    assert_eq!(runtime.execute("first").await.unwrap(), "first");
    assert_eq!(runtime.execute("second").await.unwrap(), "second");
    assert_eq!(runtime.execute("").await.unwrap(), "");
}

#[tokio::test]
async fn test_trap_is_a_runtime_error() {
    let loader = RuntimeLoader::new(&RuntimeConfig::default()).unwrap();
    let runtime = loader.load_wat(TRAPPING_GUEST).await.unwrap();

    let result = runtime.execute("anything").await;

    assert!(matches!(result, Err(PlaygroundError::Trap { .. })));
    // A trap does not unload the runtime
    assert_eq!(loader.readiness(), RuntimeReadiness::Ready);
}

#[tokio::test]
async fn test_runaway_execution_exhausts_fuel() {
    let config = RuntimeConfig {
        max_fuel: 100_000,
        ..Default::default()
    };
    let loader = RuntimeLoader::new(&config).unwrap();
    let runtime = loader.load_wat(SPINNING_GUEST).await.unwrap();

    let result = runtime.execute("spin").await;

    match result {
        Err(PlaygroundError::Trap { message }) => {
            assert!(message.contains("fuel"), "unexpected trap: {message}");
        }
        other => panic!("expected fuel trap, got {other:?}"),
    }
}
