//! Live record pipeline: tail a file and hand every normalised record to a
//! consumer.
//!
//! Blank lines are skipped without comment. A line that fails to normalise is
//! reported to [`RecordConsumer::on_rejected`] and the session carries on.

use std::path::PathBuf;

use trail_core::config::TailConfig;
use trail_core::{CanonicalRecord, IdGenerator, ParseError, RecordNormalizer};
use trail_feeds::{start_tail, LineHandler, TailError, TailSession};

/// Receives the output of [`tail_records`], one call at a time, in file order.
///
/// Any `FnMut(CanonicalRecord) + Send + 'static` closure is a consumer that
/// logs rejected lines and tail errors.
pub trait RecordConsumer: Send + 'static {
    fn on_record(&mut self, record: CanonicalRecord);

    fn on_rejected(&mut self, line: &str, error: ParseError) {
        tracing::warn!(%error, len = line.len(), "rejected log line");
    }

    fn on_tail_error(&mut self, error: &TailError) {
        if error.is_terminal() {
            tracing::error!(%error, "tail session ended");
        } else {
            tracing::warn!(%error, "tail error");
        }
    }
}

impl<F> RecordConsumer for F
where
    F: FnMut(CanonicalRecord) + Send + 'static,
{
    fn on_record(&mut self, record: CanonicalRecord) {
        self(record)
    }
}

/// Follow `path` and deliver one normalised record per completed line.
///
/// Must be called from within a tokio runtime.
pub fn tail_records<G, C>(
    path: impl Into<PathBuf>,
    config: &TailConfig,
    normalizer: RecordNormalizer<G>,
    consumer: C,
) -> TailSession
where
    G: IdGenerator + 'static,
    C: RecordConsumer,
{
    start_tail(path, config, Normalizing { normalizer, consumer })
}

/// Adapts a [`RecordConsumer`] into the tailer's [`LineHandler`].
struct Normalizing<G, C> {
    normalizer: RecordNormalizer<G>,
    consumer: C,
}

impl<G, C> LineHandler for Normalizing<G, C>
where
    G: IdGenerator + 'static,
    C: RecordConsumer,
{
    fn on_line(&mut self, line: String) {
        if line.trim().is_empty() {
            return;
        }
        match self.normalizer.normalize(&line) {
            Ok(record) => self.consumer.on_record(record),
            Err(error) => self.consumer.on_rejected(&line, error),
        }
    }

    fn on_error(&mut self, err: &TailError) {
        self.consumer.on_tail_error(err);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
