//! Error kinds surfaced by prism-core.
//!
//! Per the propagation policy: the core recovers from everything except
//! [`PrismError::RootInaccessible`]. Most variants here are returned only
//! from the handful of operations that document them (see each module);
//! everything else (a single file's I/O failure during a walk, a watcher
//! dispatch panic) is logged and reflected in [`crate::coordinator::Stats`]
//! rather than propagated.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PrismError {
    /// Query rejected by validation (too long). Caller's responsibility.
    #[error("query too long: {len} characters (max {max})")]
    InvalidQuery { len: usize, max: usize },

    /// Requested path or symbol is not present in the index.
    #[error("not found: {0}")]
    NotFound(String),

    /// A single file could not be read. Logged and skipped by callers that
    /// scan many files; returned directly by single-file operations such as
    /// `update_file`.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The on-disk snapshot failed to parse.
    #[error("snapshot at {path} is corrupt: {reason}")]
    SnapshotCorrupt { path: PathBuf, reason: String },

    /// The on-disk snapshot parsed but carries an unexpected version tag.
    #[error("snapshot at {path} has version {found}, expected {expected}")]
    SnapshotStale { path: PathBuf, found: String, expected: String },

    /// The filesystem watcher could not be started. Non-fatal: the daemon
    /// continues to serve the in-memory index without incremental updates.
    #[error("failed to start file watcher: {0}")]
    WatcherInitFailed(String),

    /// The project root could not be accessed. The only fatal error kind —
    /// initialization aborts when this is returned.
    #[error("project root {0} is not accessible")]
    RootInaccessible(PathBuf),
}

pub type PrismResult<T> = Result<T, PrismError>;
