//! The synchronous state machine behind a tail session.
//!
//! Each [`TailCursor::step`] stats the path, compares the result with what the
//! cursor last saw, and reads whatever is new:
//!
//! | Observation                      | Action                                  |
//! |----------------------------------|-----------------------------------------|
//! | nothing at the path              | wait (not an error)                     |
//! | first sighting                   | start at EOF or 0 per [`StartAt`]       |
//! | identity changed                 | rotation: drop partial line, offset 0   |
//! | same identity, `len < offset`    | truncation: drop partial line, offset 0 |
//! | same identity, `len > offset`    | append: read the new bytes              |
//!
//! The cursor never touches a runtime, so the rules above are tested against
//! an in-memory [`FileSystem`].

use std::io;
use std::path::{Path, PathBuf};

use trail_core::config::{StartAt, TailConfig};
use trail_core::LineSplitter;

use super::fs::{FileId, FileSystem};

#[derive(Debug, Clone, Copy)]
struct Position {
    id: FileId,
    offset: u64,
}

/// Outcome of one [`TailCursor::step`].
#[derive(Debug, Default)]
pub struct Step {
    /// Completed lines, in file order.
    pub lines: Vec<String>,
    /// More bytes may be waiting; step again without sleeping.
    pub more: bool,
}

#[derive(Debug)]
pub struct TailCursor {
    path: PathBuf,
    start_at: StartAt,
    read_chunk_bytes: usize,
    position: Option<Position>,
    splitter: LineSplitter,
    /// No step has run yet; `start_at` only applies to a file seen here.
    first_step: bool,
    missing_reported: bool,
    truncations: u64,
    rotations: u64,
}

impl TailCursor {
    pub fn new(path: impl Into<PathBuf>, config: &TailConfig) -> Self {
        Self {
            path: path.into(),
            start_at: config.start_at,
            read_chunk_bytes: config.read_chunk_bytes.max(1),
            position: None,
            splitter: LineSplitter::new(),
            first_step: true,
            missing_reported: false,
            truncations: 0,
            rotations: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next read, once a file has been seen.
    pub fn offset(&self) -> Option<u64> {
        self.position.map(|p| p.offset)
    }

    pub fn truncations(&self) -> u64 {
        self.truncations
    }

    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Check the file once and return any lines completed by new bytes.
    ///
    /// A missing file is not an error. Any other I/O failure is returned
    /// untouched and leaves the cursor as it was, so the step can be retried.
    pub fn step<F: FileSystem + ?Sized>(&mut self, fs: &F) -> io::Result<Step> {
        let stat = fs.stat(&self.path)?;
        let first_step = std::mem::replace(&mut self.first_step, false);

        let Some(stat) = stat else {
            if !self.missing_reported {
                self.missing_reported = true;
                if self.position.is_some() {
                    tracing::warn!(path = %self.path.display(), "log file removed; waiting for it to reappear");
                } else {
                    tracing::debug!(path = %self.path.display(), "log file does not exist yet; waiting");
                }
            }
            return Ok(Step::default());
        };
        self.missing_reported = false;

        let position = match self.position {
            None => {
                let offset = match self.start_at {
                    StartAt::End if first_step => stat.len,
                    _ => 0,
                };
                tracing::debug!(path = %self.path.display(), offset, "opened log file");
                Position { id: stat.id, offset }
            }
            Some(pos) if pos.id != stat.id => {
                self.rotations += 1;
                self.discard_partial("rotation");
                tracing::warn!(path = %self.path.display(), "log file rotated; reading new file from the start");
                Position { id: stat.id, offset: 0 }
            }
            Some(pos) if stat.len < pos.offset => {
                self.truncations += 1;
                self.discard_partial("truncation");
                tracing::warn!(
                    path = %self.path.display(),
                    previous_offset = pos.offset,
                    current_size = stat.len,
                    "log file truncated; re-reading from the start"
                );
                Position { id: pos.id, offset: 0 }
            }
            Some(pos) => pos,
        };
        self.position = Some(position);

        if stat.len <= position.offset {
            return Ok(Step::default());
        }

        let Some(chunk) = fs.read_from(&self.path, position.offset, self.read_chunk_bytes)? else {
            return Ok(Step::default());
        };
        if chunk.stat.id != position.id || chunk.stat.len < position.offset {
            // Replaced or truncated between stat and open; look again.
            return Ok(Step {
                lines: Vec::new(),
                more: true,
            });
        }

        let offset = position.offset + chunk.bytes.len() as u64;
        self.position = Some(Position {
            id: position.id,
            offset,
        });
        let lines: Vec<String> = self.splitter.push(&chunk.bytes).collect();
        tracing::trace!(
            path = %self.path.display(),
            bytes = chunk.bytes.len(),
            lines = lines.len(),
            offset,
            "read appended bytes"
        );

        Ok(Step {
            lines,
            more: !chunk.bytes.is_empty() && offset < chunk.stat.len,
        })
    }

    fn discard_partial(&mut self, reason: &str) {
        let dropped = self.splitter.reset();
        if dropped > 0 {
            tracing::warn!(path = %self.path.display(), dropped, reason, "discarding unterminated line");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
