//! End-to-end tests over a live HTTP server.
//!
//! Each test starts the service on an ephemeral port, drives it through
//! [`RemoteBackend`] (the same client remote mode uses), and shuts it down.

use std::sync::Arc;

use playground_client::{ExecutionBackend, PlaygroundController, RemoteBackend, ResultField};
use playground_common::{ExamplesConfig, PlaygroundError, RemoteConfig, RuntimeConfig};
use playground_runtime::RuntimeLoader;
use playground_server::{AppState, PlaygroundServer, TestHandle};

/// A guest that echoes the submitted source back as its output.
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
        (data (i32.const 0) "{}")
        (func (export "examples") (result i64)
            (i64.const 2)))
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

async fn start_server(guest: &str, files: &[(&str, &str)]) -> (tempfile::TempDir, TestHandle) {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    let runtime_config = RuntimeConfig::default();
    let loader = RuntimeLoader::new(&runtime_config).unwrap();
    let runtime = loader.load_wat(guest).await.unwrap();

    let examples = ExamplesConfig {
        dir: dir.path().to_string_lossy().into_owned(),
        extension: "tao".to_string(),
    };
    let state = AppState::new(runtime, &examples, &runtime_config);
    let handle = PlaygroundServer::start_test(state).await.unwrap();

    (dir, handle)
}

fn backend_for(handle: &TestHandle) -> RemoteBackend {
    let config = RemoteConfig::new(handle.url());
    RemoteBackend::new(&config).unwrap()
}

#[tokio::test]
async fn test_list_examples_over_http() {
    let (_dir, handle) = start_server(
        ECHO_GUEST,
        &[
            ("fib.tao", "print fib"),
            ("hello.tao", "print hi"),
            ("notes.txt", "not an example"),
        ],
    )
    .await;
    let backend = backend_for(&handle);

    let mut names = backend.list_examples().await.unwrap();
    names.sort();

    assert_eq!(names, vec!["fib.tao", "hello.tao"]);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_fetch_example_round_trips_bytes() {
    let source = "let a = 1;\nprintln(a);\n";
    let (_dir, handle) = start_server(ECHO_GUEST, &[("prog.tao", source)]).await;
    let backend = backend_for(&handle);

    let fetched = backend.fetch_example("prog.tao").await.unwrap();
    assert_eq!(fetched, source);

    // Echo guest: submitting the fetched text returns it unchanged
    let outcome = backend.run(&fetched).await.unwrap();
    assert!(outcome.succeeded);
    assert_eq!(outcome.output, source);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_fetch_example_with_space_in_name() {
    let (_dir, handle) = start_server(ECHO_GUEST, &[("hello world.tao", "print hi")]).await;
    let backend = backend_for(&handle);

    let fetched = backend.fetch_example("hello world.tao").await.unwrap();
    assert_eq!(fetched, "print hi");

    handle.shutdown().await;
}

#[tokio::test]
async fn test_missing_example_is_a_status_error_not_transport() {
    let (_dir, handle) = start_server(ECHO_GUEST, &[]).await;
    let backend = backend_for(&handle);

    // The request completed; the 404 must carry its status, not be filed
    // as a transport failure
    let err = backend.fetch_example("nope.tao").await.unwrap_err();
    assert!(!err.is_transport());
    match err {
        PlaygroundError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("nope.tao"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }

    handle.shutdown().await;
}

#[tokio::test]
async fn test_execution_failure_is_an_outcome_not_an_error() {
    let (_dir, handle) = start_server(TRAPPING_GUEST, &[]).await;
    let backend = backend_for(&handle);

    // The server answers 500 with error text; the client maps that to a
    // failed outcome, not a transport error.
    let outcome = backend.run("print 1").await.unwrap();
    assert!(!outcome.succeeded);
    assert!(!outcome.output.is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_controller_over_live_server() {
    let (_dir, handle) = start_server(
        ECHO_GUEST,
        &[("b.tao", "print b"), ("a.tao", "print a")],
    )
    .await;
    let backend = Arc::new(backend_for(&handle));

    let ctrl = PlaygroundController::new(backend);
    ctrl.init().await;

    assert_eq!(ctrl.catalog(), vec!["a.tao", "b.tao"]);
    assert_eq!(ctrl.selected().as_deref(), Some("a.tao"));

    ctrl.submit().await;
    assert_eq!(
        ctrl.result(),
        ResultField::Shown {
            text: "print a".into(),
            succeeded: true,
        }
    );

    handle.shutdown().await;
}
