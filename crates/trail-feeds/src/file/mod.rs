//! Follows one log file and delivers each completed line.
//!
//! # Session loop
//!
//! ```text
//!   ┌──────────────► step (spawn_blocking) ── lines ──► LineHandler::on_line
//!   │                  │ io error
//!   │                  ▼
//!   │        backoff sleep ── max_retries reached ──► RetriesExhausted (exit)
//!   │
//!   └── wait_for_change(poll_interval) ◄── NotifyFeed, or PollFeed after a
//!                                          watch failure
//! ```
//!
//! Every wait is raced against the session's cancellation token. The watcher
//! is owned by the session task, so it is released on every exit path.

pub mod cursor;
pub mod fs;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use trail_core::config::TailConfig;

use crate::error::TailError;
use cursor::TailCursor;
use fs::{FileSystem, OsFileSystem};
use watch::{ChangeFeed, NotifyFeed, PollFeed, WatchEvent};

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Receives the lines of one tail session, in file order, one call at a time.
///
/// Any `FnMut(String) + Send + 'static` closure is a handler; implement the
/// trait directly to receive errors as well.
pub trait LineHandler: Send + 'static {
    fn on_line(&mut self, line: String);

    /// Out-of-band error channel. Terminal errors (see
    /// [`TailError::is_terminal`]) are the last call the handler receives.
    fn on_error(&mut self, err: &TailError) {
        tracing::warn!(error = %err, "tail error");
    }
}

impl<F> LineHandler for F
where
    F: FnMut(String) + Send + 'static,
{
    fn on_line(&mut self, line: String) {
        self(line)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Totals for a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailSummary {
    pub lines: u64,
    pub truncations: u64,
    pub rotations: u64,
}

/// Handle to a running tail. Dropping it cancels the session; [`stop`]
/// cancels and waits until the file watch has been released.
///
/// [`stop`]: TailSession::stop
#[derive(Debug)]
pub struct TailSession {
    path: PathBuf,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<TailSummary, TailError>>>,
}

/// Follow `path` with the real filesystem and native change notification.
///
/// Must be called from within a tokio runtime. Never fails here: a watch that
/// cannot be registered is reported to `handler.on_error` and the session
/// polls instead.
pub fn start_tail<H: LineHandler>(
    path: impl Into<PathBuf>,
    config: &TailConfig,
    mut handler: H,
) -> TailSession {
    let path = path.into();
    let feed = match NotifyFeed::new(&path) {
        Ok(feed) => Some(feed),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "native watch unavailable; polling");
            handler.on_error(&err);
            None
        }
    };
    TailSession::spawn_with(path, config, Arc::new(OsFileSystem), feed, handler)
}

impl TailSession {
    /// Start a session over any [`FileSystem`] and [`ChangeFeed`]. `feed:
    /// None` polls every `poll_interval_ms`.
    pub fn spawn_with<F, C, H>(
        path: PathBuf,
        config: &TailConfig,
        fs: Arc<F>,
        feed: Option<C>,
        handler: H,
    ) -> TailSession
    where
        F: FileSystem,
        C: ChangeFeed,
        H: LineHandler,
    {
        let cancel = CancellationToken::new();
        let cursor = TailCursor::new(path.clone(), config);
        let task = tokio::spawn(run_session(
            cursor,
            fs,
            feed,
            handler,
            config.clone(),
            cancel.clone(),
        ));
        TailSession {
            path,
            cancel,
            task: Some(task),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` once the session task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel the session and wait for it to wind down.
    pub async fn stop(mut self) -> Result<TailSummary, TailError> {
        self.cancel.cancel();
        self.wait().await
    }

    /// Wait for the session to end on its own (only terminal errors end it).
    pub async fn join(mut self) -> Result<TailSummary, TailError> {
        self.wait().await
    }

    async fn wait(&mut self) -> Result<TailSummary, TailError> {
        let Some(task) = self.task.take() else {
            return Err(TailError::TaskFailed("session already joined".to_string()));
        };
        task.await
            .map_err(|err| TailError::TaskFailed(err.to_string()))?
    }
}

impl Drop for TailSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

async fn run_session<F, C, H>(
    mut cursor: TailCursor,
    fs: Arc<F>,
    mut feed: Option<C>,
    mut handler: H,
    config: TailConfig,
    cancel: CancellationToken,
) -> Result<TailSummary, TailError>
where
    F: FileSystem,
    C: ChangeFeed,
    H: LineHandler,
{
    let path = cursor.path().to_path_buf();
    let max_retries = config.max_retries.max(1);
    let mut backoff = Backoff::new(config.backoff_initial(), config.backoff_max());
    let mut failures = 0u32;
    let mut delivered = 0u64;

    tracing::debug!(path = %path.display(), native_watch = feed.is_some(), "tail session started");

    loop {
        let fs_ref = Arc::clone(&fs);
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = cursor.step(fs_ref.as_ref());
            (cursor, result)
        })
        .await
        .map_err(|err| TailError::TaskFailed(err.to_string()))?;
        cursor = returned;

        let pause = match result {
            Ok(step) => {
                failures = 0;
                backoff.reset();
                for line in step.lines {
                    handler.on_line(line);
                    delivered += 1;
                }
                if step.more {
                    if cancel.is_cancelled() {
                        break;
                    }
                    continue;
                }
                None
            }
            Err(source) => {
                failures += 1;
                if failures >= max_retries {
                    let err = TailError::RetriesExhausted {
                        path: path.clone(),
                        attempts: failures,
                        last: source,
                    };
                    tracing::error!(path = %path.display(), error = %err, "tail session terminated");
                    handler.on_error(&err);
                    return Err(err);
                }
                let delay = backoff.next_delay();
                let err = TailError::FileAccess {
                    path: path.clone(),
                    source,
                };
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    attempt = failures,
                    retry_in_ms = delay.as_millis() as u64,
                    "tail read failed; retrying"
                );
                handler.on_error(&err);
                Some(delay)
            }
        };

        let event = match pause {
            Some(delay) => tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => WatchEvent::TimedOut,
            },
            None => tokio::select! {
                _ = cancel.cancelled() => break,
                event = next_wake(&mut feed, config.poll_interval()) => event,
            },
        };

        if let WatchEvent::Failed(err) = event {
            tracing::warn!(path = %path.display(), error = %err, "file watch failed; falling back to polling");
            handler.on_error(&err);
            feed = None;
        }
    }

    tracing::debug!(path = %path.display(), lines = delivered, "tail session stopped");
    Ok(TailSummary {
        lines: delivered,
        truncations: cursor.truncations(),
        rotations: cursor.rotations(),
    })
}

async fn next_wake<C: ChangeFeed>(feed: &mut Option<C>, timeout: Duration) -> WatchEvent {
    match feed {
        Some(feed) => feed.wait_for_change(timeout).await,
        None => PollFeed.wait_for_change(timeout).await,
    }
}

/// Exponential retry delay, doubling from `initial` up to `max`.
#[derive(Debug)]
struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            next: initial,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.next = self.initial;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
