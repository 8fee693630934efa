//! Test harness for `Coordinator` integration tests.
//!
//! Writes fixture files directly into a temp dir and builds a `Coordinator`
//! over it — no subprocess, no real filesystem watcher unless a test
//! explicitly starts one.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use prism_core::config::PrismConfig;
use prism_core::coordinator::Coordinator;
use tempfile::TempDir;

pub struct TestHarness {
    pub coordinator: Arc<Coordinator>,
    _temp_dir: TempDir,
}

impl TestHarness {
    /// Builds an empty project in a fresh temp dir. Call `write` to populate
    /// it, then `init` to build the index.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config = PrismConfig::new(temp_dir.path());
        let coordinator = Arc::new(Coordinator::new(config));
        Self { coordinator, _temp_dir: temp_dir }
    }

    /// Builds a project from `(relative_path, contents)` pairs and runs
    /// `init()` immediately.
    pub fn from_files(files: &[(&str, &str)]) -> Self {
        let harness = Self::new();
        for (path, contents) in files {
            harness.write(path, contents);
        }
        harness.coordinator.init().expect("init failed");
        harness
    }

    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    pub fn write(&self, rel_path: &str, contents: &str) {
        let full = self.root().join(rel_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, contents).unwrap();
    }

    pub fn remove(&self, rel_path: &str) {
        fs::remove_file(self.root().join(rel_path)).unwrap();
    }
}
