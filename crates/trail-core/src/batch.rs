//! One-shot batch path: read a whole access log, split it, normalise every
//! line.
//!
//! File errors propagate to the caller. Line errors never abort the batch;
//! they are logged and collected in [`ParsedBatch::errors`].

use std::path::Path;

use crate::error::{IngestError, ParseError};
use crate::lines::LineSplitter;
use crate::normalizer::{IdGenerator, RecordNormalizer};
use crate::types::CanonicalRecord;

/// Read `path` fully and return its non-blank lines in file order.
pub fn read_log_file(path: &Path) -> Result<Vec<String>, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    let mut splitter = LineSplitter::new();
    let mut lines: Vec<String> = splitter.push(&bytes).collect();
    lines.extend(splitter.finish());
    lines.retain(|line| !line.trim().is_empty());

    tracing::debug!(path = %path.display(), bytes = bytes.len(), lines = lines.len(), "read log file");
    Ok(lines)
}

/// A line that failed to normalise, with its 1-based position in the batch.
/// Blank lines dropped by [`read_log_file`] are not counted.
#[derive(Debug)]
pub struct LineError {
    pub line_number: usize,
    pub error: ParseError,
}

/// Result of normalising a batch: every good record plus the rejected lines.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub records: Vec<CanonicalRecord>,
    pub errors: Vec<LineError>,
}

/// Normalise each line independently, keeping input order.
pub fn parse_logs<G, I>(normalizer: &RecordNormalizer<G>, lines: I) -> ParsedBatch
where
    G: IdGenerator,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut batch = ParsedBatch::default();
    for (idx, line) in lines.into_iter().enumerate() {
        match normalizer.normalize(line.as_ref()) {
            Ok(record) => batch.records.push(record),
            Err(error) => {
                tracing::warn!(line = idx + 1, %error, "skipping unparseable log line");
                batch.errors.push(LineError {
                    line_number: idx + 1,
                    error,
                });
            }
        }
    }
    batch
}
