//! Change watcher for the in-memory backend.
//!
//! Adapted from the configuration hot-reload pattern: a `notify` watcher
//! pushes events into an unbounded channel and a tokio task applies them.
//!
//! # Lifecycle
//! ```text
//! spawn()  → watcher thread + refresh task running
//! close()  → watcher dropped, stop sent, task awaited
//! ```
//! `close` consumes the handle, so a watcher is closed at most once.

use std::path::PathBuf;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::fs::memory::MemoryFs;

/// Owner of a running watcher.
pub struct WatchHandle {
    root: PathBuf,
    watcher: RecommendedWatcher,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Start watching `fs.root()` recursively. Must be called from within a
/// tokio runtime.
pub fn spawn(fs: MemoryFs) -> Result<WatchHandle, notify::Error> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(e) => tracing::error!(error = %e, "Watch error"),
        },
        Config::default(),
    )?;
    watcher.watch(fs.root(), RecursiveMode::Recursive)?;

    let root = fs.root().to_path_buf();
    let (stop, mut stop_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                event = event_rx.recv() => match event {
                    Some(event) => apply(&fs, event).await,
                    None => break,
                },
            }
        }
        tracing::debug!(root = %fs.root().display(), "Refresh task stopped");
    });

    tracing::info!(root = %root.display(), "Watching document root for changes");
    Ok(WatchHandle {
        root,
        watcher,
        stop,
        task,
    })
}

async fn apply(fs: &MemoryFs, event: Event) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }
    for path in event.paths {
        let Some(key) = fs.key_for(&path) else {
            continue;
        };
        let snapshot = fs.clone();
        let refresh_key = key.clone();
        match tokio::task::spawn_blocking(move || snapshot.refresh(&refresh_key)).await {
            Ok(Ok(())) => tracing::debug!(path = %key, kind = ?event.kind, "Refreshed"),
            Ok(Err(e)) => tracing::warn!(path = %key, error = %e, "Failed to refresh"),
            Err(e) => tracing::error!(path = %key, error = %e, "Refresh panicked"),
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle").field("root", &self.root).finish_non_exhaustive()
    }
}

impl WatchHandle {
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Stop the watcher and wait for the refresh task to exit.
    pub async fn close(self) {
        let WatchHandle {
            root,
            watcher,
            stop,
            task,
        } = self;
        drop(watcher);
        let _ = stop.send(());
        if let Err(e) = task.await {
            tracing::warn!(root = %root.display(), error = %e, "Refresh task failed");
        }
        tracing::info!(root = %root.display(), "Watcher closed");
    }
}
