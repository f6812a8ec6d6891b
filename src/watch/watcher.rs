// src/watch/watcher.rs

use std::path::PathBuf;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::watch::patterns::relative_path;
use crate::watch::registrar::TriggerRouter;

/// Keeps the OS watcher alive; dropping it stops file watching and ends the
/// forwarding task.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    root: PathBuf,
}

impl WatcherHandle {
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Watch `root` recursively and forward every changed path to `router`.
///
/// Paths are made root-relative before matching. Pure access events are
/// ignored so tools that only read watched files do not cause re-runs.
pub fn spawn_watcher(root: impl Into<PathBuf>, router: TriggerRouter) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // notify calls back on its own thread; bridge into tokio.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("watchflow: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("watchflow: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    let loop_root = root.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in &event.paths {
                match relative_path(&loop_root, path) {
                    Some(rel) => {
                        let hits = router.notify_path(&rel);
                        if hits > 0 {
                            debug!(path = %rel, bindings = hits, "change routed");
                        }
                    }
                    None => warn!(
                        "could not relativize path {:?} against root {:?}",
                        path, loop_root
                    ),
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        root,
    })
}
