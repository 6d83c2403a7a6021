//! Shared application state.
//!
//! This module provides [`AppState`], which holds the resources shared by
//! all HTTP request handlers, and [`ExampleStore`], the directory-backed
//! example catalog.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use playground_common::{ExamplesConfig, RuntimeConfig};
use playground_runtime::LoadedRuntime;

/// Shared state across all request handlers.
///
/// Cloned per request; everything mutable-looking is behind `Arc` and in
/// fact immutable for the lifetime of the process.
#[derive(Clone)]
pub struct AppState {
    /// The started Wasm runtime (shared across all requests).
    runtime: Arc<LoadedRuntime>,

    /// Directory-backed example catalog.
    examples: Arc<ExampleStore>,

    /// Per-execution deadline.
    exec_timeout: Duration,
}

impl AppState {
    /// Create new application state over a started runtime.
    pub fn new(
        runtime: Arc<LoadedRuntime>,
        examples: &ExamplesConfig,
        runtime_config: &RuntimeConfig,
    ) -> Self {
        Self {
            runtime,
            examples: Arc::new(ExampleStore::new(&examples.dir, &examples.extension)),
            exec_timeout: runtime_config.timeout(),
        }
    }

    /// Get the runtime.
    pub fn runtime(&self) -> &LoadedRuntime {
        &self.runtime
    }

    /// Get the example store.
    pub fn examples(&self) -> &ExampleStore {
        &self.examples
    }

    /// Get the per-execution deadline.
    pub fn exec_timeout(&self) -> Duration {
        self.exec_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("exec_timeout", &self.exec_timeout)
            .finish_non_exhaustive()
    }
}

/// Example sources stored as files in one directory.
///
/// Identifiers are file names including the extension, exactly as listed.
/// The listing is returned in storage order; clients sort for display.
pub struct ExampleStore {
    dir: PathBuf,
    extension: String,
}

impl ExampleStore {
    /// Create a store over `dir`, serving files with `extension`.
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// List example file names.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub async fn list(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let matches = path
                .extension()
                .is_some_and(|ext| ext == self.extension.as_str());
            if matches {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Read one example's source text.
    ///
    /// Names containing path separators or parent components are rejected:
    /// the catalog is flat and traversal out of the directory is not a
    /// lookup miss but an invalid name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for invalid or missing names, and any other I/O
    /// error from reading the file.
    pub async fn read(&self, name: &str) -> io::Result<String> {
        if !Self::is_valid_name(name) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("invalid example name: {name}"),
            ));
        }

        tokio::fs::read_to_string(self.dir.join(name)).await
    }

    fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && !name.contains('/')
            && !name.contains('\\')
            && name != "."
            && name != ".."
    }
}

impl std::fmt::Debug for ExampleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExampleStore")
            .field("dir", &self.dir)
            .field("extension", &self.extension)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn store_with_files(files: &[(&str, &str)]) -> (tempfile::TempDir, ExampleStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let store = ExampleStore::new(dir.path(), "tao");
        (dir, store)
    }

    #[tokio::test]
    async fn test_list_filters_by_extension() {
        let (_dir, store) = store_with_files(&[
            ("fib.tao", "print fib"),
            ("hello.tao", "print hi"),
            ("notes.txt", "not an example"),
        ]);

        let mut names = store.list().await.unwrap();
        names.sort();

        assert_eq!(names, vec!["fib.tao", "hello.tao"]);
    }

    #[tokio::test]
    async fn test_read_returns_exact_contents() {
        let (_dir, store) = store_with_files(&[("hello.tao", "print hi\n")]);

        assert_eq!(store.read("hello.tao").await.unwrap(), "print hi\n");
    }

    #[tokio::test]
    async fn test_read_missing_example() {
        let (_dir, store) = store_with_files(&[]);

        let err = store.read("nope.tao").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_rejects_traversal() {
        let (_dir, store) = store_with_files(&[("hello.tao", "print hi")]);

        for name in ["../hello.tao", "a/b.tao", "..", "", "a\\b.tao"] {
            let err = store.read(name).await.unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::NotFound, "name: {name:?}");
        }
    }
}
