//! Coordinator (C10) — the only component allowed to mutate the index.
//!
//! Every write path (full rebuild, incremental reconcile, a single watcher
//! dispatch, an explicit `update_file`/`remove_file` call) takes the writer
//! lock, builds a new [`IndexStore`] by cloning the current one and applying
//! its changes, then swaps it into the [`SearchEngine`] in one atomic store
//! (spec.md §5: "single-writer, many-reader"). Readers never see a
//! partially-mutated store.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::CacheStats;
use crate::config::PrismConfig;
use crate::delta;
use crate::error::{PrismError, PrismResult};
use crate::model::LineRecord;
use crate::scanner::{self, ScanOutcome};
use crate::search::SearchEngine;
use crate::snapshot;
use crate::store::{hash_bytes, IndexStore};
use crate::watcher::{self, WatchEvent, WatcherHandle};

/// Summary returned by any operation that rebuilds or reconciles the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReindexSummary {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub file_count: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub file_count: usize,
    pub chunk_count: usize,
    pub term_count: usize,
    pub posting_count: usize,
    pub cache: CacheStats,
}

/// Owns the index's single-writer discipline and orchestrates the scanner,
/// delta planner, snapshot codec, and watcher around the [`SearchEngine`].
pub struct Coordinator {
    config: PrismConfig,
    engine: SearchEngine,
    writer_lock: Mutex<()>,
    watcher: Mutex<Option<WatcherHandle>>,
    dispatch_count: Mutex<u32>,
    last_save: Mutex<std::time::Instant>,
    shutdown_requested: AtomicBool,
}

impl Coordinator {
    /// Builds a coordinator over an empty index. Call [`Coordinator::init`]
    /// to populate it from disk before serving searches.
    pub fn new(config: PrismConfig) -> Self {
        let empty = IndexStore::new(
            crate::config::SNAPSHOT_VERSION,
            now_iso8601(),
            config.root.display().to_string(),
        );
        let engine = SearchEngine::new(empty, config.clone());
        Self {
            config,
            engine,
            writer_lock: Mutex::new(()),
            watcher: Mutex::new(None),
            dispatch_count: Mutex::new(0),
            last_save: Mutex::new(std::time::Instant::now()),
            shutdown_requested: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    /// Loads the on-disk snapshot, if any, then reconciles it against the
    /// current filesystem. Falls back to [`Coordinator::full_rebuild`] when
    /// no snapshot is present or it fails to load (wrong version, corrupt
    /// body — spec.md §6).
    pub fn init(&self) -> PrismResult<ReindexSummary> {
        match snapshot::load(&self.config.snapshot_path()) {
            Some(loaded) => {
                self.engine.swap_store(loaded);
                self.incremental_reconcile()
            }
            None => {
                tracing::info!(root = %self.config.root.display(), "no usable snapshot, running full rebuild");
                self.full_rebuild()
            }
        }
    }

    /// Walks the project root from scratch and replaces the entire index.
    /// Used by `init` when there is nothing to reconcile against, and by
    /// the public `reindex` operation when the caller wants a clean slate.
    pub fn full_rebuild(&self) -> PrismResult<ReindexSummary> {
        let _writer = self.writer_lock.lock().unwrap();

        let (scanned, outcome) = scanner::walk(&self.config.root, &self.config)?;

        // Shutdown is interruptible only at this boundary (spec.md §5): a
        // signal that arrived while the walk was running discards this
        // rebuild's results entirely rather than swapping in a store built
        // from a walk that was meant to be abandoned.
        if self.shutdown_requested.load(Ordering::SeqCst) {
            return Ok(ReindexSummary::default());
        }

        let mut store = IndexStore::new(
            crate::config::SNAPSHOT_VERSION,
            now_iso8601(),
            self.config.root.display().to_string(),
        );
        for file in &scanned {
            store.insert_or_replace_file(&file.rel_path, &file.bytes);
        }

        let summary = ReindexSummary {
            added: scanned.len(),
            modified: 0,
            deleted: 0,
            unchanged: 0,
            file_count: store.file_count(),
            skipped: skipped_count(&outcome),
        };

        self.engine.swap_store(store);
        self.persist(true)?;
        Ok(summary)
    }

    /// Walks the project root and applies only what changed since the
    /// current in-memory store, via content-hash comparison (spec.md §4.7).
    pub fn incremental_reconcile(&self) -> PrismResult<ReindexSummary> {
        let _writer = self.writer_lock.lock().unwrap();

        let (scanned, outcome) = scanner::walk(&self.config.root, &self.config)?;
        let current = self.engine.load_store();
        let plan = delta::classify(&current, &scanned);

        let mut next = (**current).clone();
        drop(current);

        for file in plan.added.iter().chain(plan.modified.iter()) {
            next.insert_or_replace_file(&file.rel_path, &file.bytes);
        }
        for path in &plan.deleted {
            next.remove_file(path);
        }

        let summary = ReindexSummary {
            added: plan.added.len(),
            modified: plan.modified.len(),
            deleted: plan.deleted.len(),
            unchanged: plan.unchanged,
            file_count: next.file_count(),
            skipped: skipped_count(&outcome),
        };

        let changed = summary.added + summary.modified + summary.deleted > 0;
        self.engine.swap_store(next);
        self.persist(changed)?;
        Ok(summary)
    }

    /// Public `reindex` operation (spec.md §6): re-walks the filesystem and
    /// reconciles against the live index without discarding unchanged files.
    pub fn reindex(&self) -> PrismResult<ReindexSummary> {
        self.incremental_reconcile()
    }

    /// Reads `rel_path` from disk and upserts it into the index. Returns
    /// `true` if this replaced an existing record, `false` if it was new.
    pub fn update_file(&self, rel_path: &str) -> PrismResult<bool> {
        let abs_path = self.config.root.join(rel_path);
        let bytes = std::fs::read(&abs_path).map_err(|e| PrismError::ReadError { path: abs_path.clone(), source: e })?;

        let _writer = self.writer_lock.lock().unwrap();
        let current = self.engine.load_store();
        let existed = current.index_of(rel_path).is_some();
        let mut next = (**current).clone();
        drop(current);

        next.insert_or_replace_file(rel_path, &bytes);
        self.engine.swap_store(next);
        self.persist(true)?;
        Ok(existed)
    }

    /// Removes `rel_path` from the index. Returns `false` if it wasn't
    /// present.
    pub fn remove_file(&self, rel_path: &str) -> PrismResult<bool> {
        let _writer = self.writer_lock.lock().unwrap();
        let current = self.engine.load_store();
        let mut next = (**current).clone();
        drop(current);

        let removed = next.remove_file(rel_path);
        if removed {
            self.engine.swap_store(next);
            self.persist(true)?;
        }
        Ok(removed)
    }

    /// Returns the lines of the file at `rel_path` as currently indexed.
    pub fn get_file_context(&self, rel_path: &str) -> PrismResult<Vec<LineRecord>> {
        let store = self.engine.load_store();
        store
            .get_file(rel_path)
            .map(|f| f.lines.clone())
            .ok_or_else(|| PrismError::NotFound(rel_path.to_string()))
    }

    pub fn stats(&self) -> Stats {
        let store = self.engine.load_store();
        Stats {
            file_count: store.file_count(),
            chunk_count: store.chunk_count(),
            term_count: store.term_count(),
            posting_count: store.posting_count(),
            cache: self.engine.cache_stats(),
        }
    }

    /// Starts the filesystem watcher, wiring its debounced dispatches back
    /// into the single-writer path via [`Coordinator::apply_dispatch`].
    /// `self` must be held behind an `Arc` so the watcher thread can call
    /// back into it after this method returns.
    pub fn start_watcher(self: &Arc<Self>) -> PrismResult<()> {
        let mut slot = self.watcher.lock().unwrap();
        if slot.is_some() {
            return Ok(());
        }
        let coordinator = Arc::clone(self);
        let handle = watcher::start_watcher(&self.config.root, &self.config, move |events| {
            coordinator.apply_dispatch(events);
        })?;
        *slot = Some(handle);
        Ok(())
    }

    pub fn stop_watcher(&self) {
        if let Some(handle) = self.watcher.lock().unwrap().take() {
            handle.stop();
        }
    }

    /// Stops the watcher and flushes a final snapshot if there is anything
    /// un-persisted. Idempotent.
    pub fn shutdown(&self) -> PrismResult<()> {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        self.stop_watcher();
        self.persist(true)
    }

    /// Applies one debounced batch of watcher events (spec.md §4.9) under
    /// the writer lock, then saves the snapshot at most once per
    /// `save_every_n_dispatches` applied batches or `save_every_duration`,
    /// whichever comes first.
    fn apply_dispatch(&self, events: Vec<WatchEvent>) {
        if events.is_empty() {
            return;
        }

        let _writer = self.writer_lock.lock().unwrap();
        let current = self.engine.load_store();
        let mut next = (**current).clone();
        drop(current);

        for event in events {
            match event {
                WatchEvent::Upserted(abs_path) => {
                    let rel_path = match abs_path.strip_prefix(&self.config.root) {
                        Ok(p) => p.to_string_lossy().replace('\\', "/"),
                        Err(_) => continue,
                    };
                    match std::fs::read(&abs_path) {
                        Ok(bytes) => {
                            next.insert_or_replace_file(&rel_path, &bytes);
                        }
                        Err(e) => {
                            tracing::warn!(path = %rel_path, error = %e, "watcher: failed to read upserted file");
                        }
                    }
                }
                WatchEvent::Removed(abs_path) => {
                    let rel_path = match abs_path.strip_prefix(&self.config.root) {
                        Ok(p) => p.to_string_lossy().replace('\\', "/"),
                        Err(_) => continue,
                    };
                    next.remove_file(&rel_path);
                }
            }
        }

        self.engine.swap_store(next);

        let mut count = self.dispatch_count.lock().unwrap();
        *count += 1;
        let due_by_count = *count >= self.config.save_every_n_dispatches;
        let due_by_time = self.last_save.lock().unwrap().elapsed() >= self.config.save_every_duration;

        if due_by_count || due_by_time {
            *count = 0;
            drop(count);
            if let Err(e) = self.persist(true) {
                tracing::warn!(error = %e, "watcher: failed to persist snapshot after dispatch");
            }
        }
    }

    /// Saves the current store to disk when `changed` is true, resetting
    /// the save-throttle clock either way.
    fn persist(&self, changed: bool) -> PrismResult<()> {
        *self.last_save.lock().unwrap() = std::time::Instant::now();
        if !changed {
            return Ok(());
        }
        let store = self.engine.load_store();
        snapshot::save(&store, &self.config.snapshot_path(), &self.config)
            .map_err(|e| PrismError::ReadError { path: self.config.snapshot_path(), source: e })
    }
}

fn skipped_count(outcome: &ScanOutcome) -> usize {
    outcome.skipped_too_large + outcome.skipped_unreadable
}

fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Exposed for the `delta reindex` scenario in spec.md §8: hashing a byte
/// slice the same way the store does, without constructing a full
/// coordinator, for callers that only need to compare content.
pub fn content_hash(bytes: &[u8]) -> String {
    hash_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn init_with_no_snapshot_runs_full_rebuild() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.py", "def hello():\n    return 1\n");

        let coordinator = Coordinator::new(PrismConfig::new(tmp.path()));
        let summary = coordinator.init().unwrap();

        assert_eq!(summary.file_count, 1);
        assert!(coordinator.config.snapshot_path().exists());
    }

    #[test]
    fn init_after_prior_save_reconciles_instead_of_rebuilding_from_scratch() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.py", "alpha\n");

        let first = Coordinator::new(PrismConfig::new(tmp.path()));
        first.init().unwrap();

        write_file(tmp.path(), "b.py", "beta\n");

        let second = Coordinator::new(PrismConfig::new(tmp.path()));
        let summary = second.init().unwrap();

        assert_eq!(summary.added, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.file_count, 2);
    }

    #[test]
    fn update_file_is_visible_to_search_immediately() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.py", "def hello():\n");

        let coordinator = Coordinator::new(PrismConfig::new(tmp.path()));
        coordinator.init().unwrap();

        write_file(tmp.path(), "a.py", "def hello():\n    marker_value = 1\n");
        let replaced = coordinator.update_file("a.py").unwrap();
        assert!(replaced);

        let results = coordinator.engine().search("marker_value", 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn remove_file_drops_it_from_the_index() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.py", "alpha\n");
        write_file(tmp.path(), "b.py", "beta\n");

        let coordinator = Coordinator::new(PrismConfig::new(tmp.path()));
        coordinator.init().unwrap();

        let removed = coordinator.remove_file("b.py").unwrap();
        assert!(removed);
        assert_eq!(coordinator.stats().file_count, 1);
        assert!(!coordinator.remove_file("b.py").unwrap());
    }

    #[test]
    fn get_file_context_returns_not_found_for_unindexed_path() {
        let tmp = TempDir::new().unwrap();
        let coordinator = Coordinator::new(PrismConfig::new(tmp.path()));
        coordinator.init().unwrap();

        let err = coordinator.get_file_context("missing.py").unwrap_err();
        assert!(matches!(err, PrismError::NotFound(_)));
    }

    #[test]
    fn stats_reports_cache_hits_after_repeated_search() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.py", "def hello():\n");

        let coordinator = Coordinator::new(PrismConfig::new(tmp.path()));
        coordinator.init().unwrap();
        coordinator.engine().search("hello", 10).unwrap();
        coordinator.engine().search("hello", 10).unwrap();

        assert_eq!(coordinator.stats().cache.hits, 1);
    }

    #[test]
    fn reindex_after_external_edit_picks_up_the_change() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.py", "alpha\n");

        let coordinator = Coordinator::new(PrismConfig::new(tmp.path()));
        coordinator.init().unwrap();

        write_file(tmp.path(), "a.py", "alpha\nbravo\n");
        let summary = coordinator.reindex().unwrap();

        assert_eq!(summary.modified, 1);
        assert!(coordinator.engine().search("bravo", 10).unwrap().len() == 1);
    }
}
