//! Error taxonomy for the parsing and batch-read layers.
//!
//! Line-level failures ([`ParseError`]) are recoverable: callers skip the
//! offending line and keep going. File-level failures ([`IngestError`]) abort
//! a one-shot batch read and are returned to the caller.

use std::path::PathBuf;

/// Why a single raw line could not be turned into a record.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The line is not structured data at all (bad JSON, or JSON that is not
    /// an object).
    #[error("malformed log line: {reason}")]
    Malformed { reason: String },

    /// The line is a JSON object but a required field is missing or has the
    /// wrong type.
    #[error("schema violation in field `{field}`: {reason}")]
    SchemaViolation { field: &'static str, reason: String },
}

impl ParseError {
    pub(crate) fn violation(field: &'static str, reason: impl Into<String>) -> Self {
        ParseError::SchemaViolation {
            field,
            reason: reason.into(),
        }
    }

    /// `true` for [`ParseError::Malformed`].
    pub fn is_malformed(&self) -> bool {
        matches!(self, ParseError::Malformed { .. })
    }

    /// The offending field for a schema violation.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ParseError::SchemaViolation { field, .. } => Some(*field),
            ParseError::Malformed { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Malformed {
            reason: err.to_string(),
        }
    }
}

/// A file-level failure during a one-shot batch read.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("cannot read log file {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
