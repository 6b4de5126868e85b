//! Core types for trail-core.
//!
//! This module defines the data structures shared by every stage of the
//! ingestion pipeline: the normalised [`CanonicalRecord`] and its severity
//! [`Level`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A normalised access-log record produced by the normalizer.
///
/// One raw JSON line maps to exactly one record. Every field except `id` is a
/// pure function of the input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    /// Identifier assigned at parse time. Never derived from the line.
    pub id: Uuid,
    /// HTTP method token, passed through unvalidated.
    pub method: String,
    pub host: String,
    pub pathname: String,
    /// Severity derived from `status`.
    pub level: Level,
    /// Request duration in whole milliseconds (floor of the nanosecond value).
    pub latency_ms: u64,
    /// Downstream status code.
    pub status: u16,
    /// Request start time (UTC).
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Captured request headers. Always contains `protocol` and `scheme`.
    pub headers: BTreeMap<String, String>,
    /// The human-readable message, if the line carried a non-empty one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Severity of a record, derived from its HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    /// Classify a status code: `[200, 400)` is success, `[400, 500)` is a
    /// warning, everything else (informational and 5xx included) is an error.
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=399 => Level::Success,
            400..=499 => Level::Warning,
            _ => Level::Error,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Success => write!(f, "success"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
