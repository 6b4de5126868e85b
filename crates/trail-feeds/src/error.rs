//! Errors raised by tail sessions.
//!
//! All of them are delivered out of band through
//! [`LineHandler::on_error`](crate::file::LineHandler::on_error); only
//! [`TailError::RetriesExhausted`] and [`TailError::TaskFailed`] end a session.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TailError {
    /// The file exists but could not be read. Retried with backoff.
    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Native change notification could not be set up or reported an error.
    /// The session falls back to polling.
    #[error("file watch on {} failed: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The notification backend went away. The session falls back to polling.
    #[error("file watch on {} stopped delivering events", path.display())]
    WatchClosed { path: PathBuf },

    /// Too many consecutive I/O failures; the session has terminated.
    #[error("giving up on {} after {attempts} consecutive failures", path.display())]
    RetriesExhausted {
        path: PathBuf,
        attempts: u32,
        #[source]
        last: io::Error,
    },

    /// The session task panicked or was aborted.
    #[error("tail task failed: {0}")]
    TaskFailed(String),
}

impl TailError {
    /// `true` when the session that reported this error has stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TailError::RetriesExhausted { .. } | TailError::TaskFailed(_))
    }
}
