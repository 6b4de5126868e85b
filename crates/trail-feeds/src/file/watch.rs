//! Change feeds: how a tail session learns that it should look at the file
//! again.
//!
//! Both feeds answer the same question with a bounded wait, so the session
//! treats a native notification and a poll tick alike: either way it stats the
//! file and reads whatever is new.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::TailError;

/// Result of one [`ChangeFeed::wait_for_change`].
#[derive(Debug)]
pub enum WatchEvent {
    Changed,
    TimedOut,
    /// The feed is broken; the caller should stop using it.
    Failed(TailError),
}

pub trait ChangeFeed: Send + 'static {
    /// Wait at most `timeout` for a change to the watched file.
    fn wait_for_change(&mut self, timeout: Duration) -> impl Future<Output = WatchEvent> + Send;
}

/// Sleeps out the timeout every time. Used when native notification is
/// unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollFeed;

impl ChangeFeed for PollFeed {
    fn wait_for_change(&mut self, timeout: Duration) -> impl Future<Output = WatchEvent> + Send {
        async move {
            tokio::time::sleep(timeout).await;
            WatchEvent::TimedOut
        }
    }
}

/// Native notification via `notify`.
///
/// The parent directory is watched rather than the file itself, so the feed
/// works before the file exists and keeps working across rotation. Events for
/// other entries of the directory are filtered out. Dropping the feed drops
/// the watch registration.
pub struct NotifyFeed {
    path: PathBuf,
    rx: mpsc::Receiver<notify::Result<()>>,
    _watcher: RecommendedWatcher,
}

impl NotifyFeed {
    pub fn new(path: &Path) -> Result<Self, TailError> {
        let watch_error = |source| TailError::Watch {
            path: path.to_path_buf(),
            source,
        };

        let (tx, rx) = mpsc::channel(16);
        let target = path.file_name().map(ToOwned::to_owned);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let msg = match res {
                Ok(event) if is_relevant(&event, target.as_deref()) => Ok(()),
                Ok(_) => return,
                Err(err) => Err(err),
            };
            // A full channel already holds a pending wake-up.
            let _ = tx.try_send(msg);
        })
        .map_err(watch_error)?;

        let dir = watch_dir(path);
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;
        tracing::debug!(path = %path.display(), dir = %dir.display(), "watching for changes");

        Ok(Self {
            path: path.to_path_buf(),
            rx,
            _watcher: watcher,
        })
    }
}

impl ChangeFeed for NotifyFeed {
    fn wait_for_change(&mut self, timeout: Duration) -> impl Future<Output = WatchEvent> + Send {
        async move {
            let first = match tokio::time::timeout(timeout, self.rx.recv()).await {
                Err(_) => return WatchEvent::TimedOut,
                Ok(None) => {
                    return WatchEvent::Failed(TailError::WatchClosed {
                        path: self.path.clone(),
                    })
                }
                Ok(Some(msg)) => msg,
            };

            // Coalesce a burst of events into one wake-up.
            let mut outcome = first;
            while let Ok(msg) = self.rx.try_recv() {
                if outcome.is_ok() {
                    outcome = msg;
                }
            }

            match outcome {
                Ok(()) => WatchEvent::Changed,
                Err(source) => WatchEvent::Failed(TailError::Watch {
                    path: self.path.clone(),
                    source,
                }),
            }
        }
    }
}

fn is_relevant(event: &notify::Event, target: Option<&std::ffi::OsStr>) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.is_empty() || event.paths.iter().any(|p| p.file_name() == target)
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
