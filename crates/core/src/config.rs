//! Runtime configuration.
//!
//! Every default here matches a number spec.md names explicitly. None of
//! these are read from a config file in the MVP — path filtering in
//! particular is fixed at compile time (see [`crate::filter`]) — but
//! bundling the tunables in one struct gives tests a single seam to
//! override, instead of scattering `cfg(test)` constants through the crate.

use std::path::PathBuf;
use std::time::Duration;

/// State directory name under a project root, e.g. `<root>/.prism/index.json`.
pub const STATE_DIR_NAME: &str = ".prism";

/// Expected snapshot format version. Bumping this forces every existing
/// on-disk snapshot to be discarded and rebuilt on next load.
pub const SNAPSHOT_VERSION: &str = "2.0";

#[derive(Debug, Clone)]
pub struct PrismConfig {
    /// Project root being indexed.
    pub root: PathBuf,
    /// Files larger than this are logged and skipped by the scanner.
    pub max_file_bytes: u64,
    /// Default result limit when a caller does not specify one.
    pub default_search_limit: usize,
    /// Hard ceiling on the `limit` argument to `search`.
    pub max_search_limit: usize,
    /// Hard ceiling on query length in characters.
    pub max_query_chars: usize,
    /// Capacity of the LRU result cache.
    pub cache_capacity: usize,
    /// Filesystem events for the same path collapse within this window.
    pub debounce_window: Duration,
    /// Save a snapshot after at most this many applied watcher dispatches...
    pub save_every_n_dispatches: u32,
    /// ...or after this much wall-clock time, whichever comes first.
    pub save_every_duration: Duration,
    /// Serialized snapshot bodies at or above this size are gzip-compressed.
    pub compression_threshold_bytes: usize,
}

impl PrismConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_bytes: 1024 * 1024,
            default_search_limit: 10,
            max_search_limit: 100,
            max_query_chars: 10_000,
            cache_capacity: 100,
            debounce_window: Duration::from_millis(500),
            save_every_n_dispatches: 20,
            save_every_duration: Duration::from_secs(30),
            compression_threshold_bytes: 8 * 1024,
        }
    }

    /// The `.prism/` state directory under the project root.
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR_NAME)
    }

    /// Path to the single snapshot artifact.
    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir().join("index.snapshot")
    }
}
