//! File watching for hot reload. A thin polled wrapper over notify: the
//! OS watcher feeds a channel, `poll` drains it for at most the given
//! timeout and invokes the registered callback per event.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::{Duration, SystemTime};

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};

/// Filesystem change categories surfaced to callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsEventKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

/// One observed filesystem change.
#[derive(Clone, Debug)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
    pub timestamp: SystemTime,
}

type EventCallback = Box<dyn FnMut(&FsEvent)>;

/// A polled file watcher.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<notify::Event>>,
    callback: Option<EventCallback>,
}

impl FileWatcher {
    pub fn new() -> notify::Result<Self> {
        let (tx, rx) = channel();
        let watcher = notify::recommended_watcher(tx)?;
        Ok(Self {
            watcher,
            rx,
            callback: None,
        })
    }

    /// Register the callback invoked once per event during `poll`.
    pub fn on_event<F>(&mut self, callback: F)
    where
        F: FnMut(&FsEvent) + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    /// Watch a path. Returns false when the path cannot be watched.
    pub fn add_path(&mut self, path: &Path, recursive: bool) -> bool {
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        match self.watcher.watch(path, mode) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), "watch failed: {e}");
                false
            }
        }
    }

    /// Block for at most `timeout_ms`, then drain whatever has arrived.
    /// Returns the number of events processed.
    pub fn poll(&mut self, timeout_ms: u64) -> usize {
        let mut processed = 0;
        let mut pending = Vec::new();

        match self.rx.recv_timeout(Duration::from_millis(timeout_ms)) {
            Ok(event) => pending.push(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
        // Anything else already queued comes along for free.
        while let Ok(event) = self.rx.try_recv() {
            pending.push(event);
        }

        for result in pending {
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("watch error: {e}");
                    continue;
                }
            };
            let Some(kind) = map_kind(&event.kind) else {
                continue;
            };
            let timestamp = SystemTime::now();
            for path in event.paths {
                let fs_event = FsEvent {
                    path,
                    kind,
                    timestamp,
                };
                if let Some(callback) = &mut self.callback {
                    callback(&fs_event);
                }
                processed += 1;
            }
        }
        processed
    }
}

fn map_kind(kind: &notify::EventKind) -> Option<FsEventKind> {
    use notify::event::ModifyKind;
    use notify::EventKind;
    match kind {
        EventKind::Create(_) => Some(FsEventKind::Created),
        EventKind::Remove(_) => Some(FsEventKind::Deleted),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FsEventKind::Moved),
        EventKind::Modify(_) => Some(FsEventKind::Modified),
        _ => None,
    }
}
