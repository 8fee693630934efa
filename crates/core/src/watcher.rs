//! Watcher Integrator (C9) — debounces filesystem events and drives
//! single-file upsert/remove against the `IndexStore` via the Coordinator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::PrismConfig;
use crate::error::{PrismError, PrismResult};
use crate::filter;

/// A single debounced dispatch handed to the coordinator.
pub enum WatchEvent {
    Upserted(PathBuf),
    Removed(PathBuf),
}

/// Keeps the `notify` watcher and debounce thread alive. Dropping — or
/// calling [`WatcherHandle::stop`] — tears both down.
pub struct WatcherHandle {
    _watcher: RecommendedWatcher,
    stop_tx: mpsc::Sender<()>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl WatcherHandle {
    pub fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

/// Starts watching `root` recursively. Each debounced batch of changed
/// paths is handed to `on_dispatch`, which is expected to apply the change
/// through the single-writer Coordinator path.
pub fn start_watcher(
    root: &Path,
    config: &PrismConfig,
    on_dispatch: impl Fn(Vec<WatchEvent>) + Send + 'static,
) -> PrismResult<WatcherHandle> {
    let (event_tx, event_rx) = mpsc::channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = event_tx.send(event);
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| PrismError::WatcherInitFailed(e.to_string()))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| PrismError::WatcherInitFailed(e.to_string()))?;

    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let debounce_window = config.debounce_window;
    let root = root.to_path_buf();

    let join = std::thread::spawn(move || {
        debounce_loop(event_rx, stop_rx, root, debounce_window, Arc::new(on_dispatch));
    });

    Ok(WatcherHandle { _watcher: watcher, stop_tx, join: Some(join) })
}

fn debounce_loop(
    event_rx: mpsc::Receiver<Event>,
    stop_rx: mpsc::Receiver<()>,
    root: PathBuf,
    debounce_window: Duration,
    on_dispatch: Arc<dyn Fn(Vec<WatchEvent>) + Send + Sync>,
) {
    let mut pending: HashMap<PathBuf, (Instant, bool)> = HashMap::new(); // bool: true = removed

    loop {
        if stop_rx.try_recv().is_ok() {
            return;
        }

        match event_rx.recv_timeout(debounce_window) {
            Ok(event) => {
                let removed = matches!(event.kind, EventKind::Remove(_));
                let relevant = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                );
                if !relevant {
                    continue;
                }
                let now = Instant::now();
                for path in event.paths {
                    let rel = match path.strip_prefix(&root) {
                        Ok(r) => r,
                        Err(_) => continue,
                    };
                    if !filter::eligible(rel) {
                        continue;
                    }
                    pending.insert(path, (now, removed));
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if pending.is_empty() {
                    continue;
                }
                let cutoff = Instant::now() - debounce_window;
                let ready: Vec<PathBuf> =
                    pending.iter().filter(|(_, (t, _))| *t <= cutoff).map(|(p, _)| p.clone()).collect();
                if ready.is_empty() {
                    continue;
                }

                let mut batch = Vec::with_capacity(ready.len());
                for path in ready {
                    if let Some((_, removed)) = pending.remove(&path) {
                        batch.push(if removed || !path.exists() {
                            WatchEvent::Removed(path)
                        } else {
                            WatchEvent::Upserted(path)
                        });
                    }
                }
                on_dispatch(batch);
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}
