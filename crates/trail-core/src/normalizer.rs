//! Maps one raw Traefik JSON access-log line into a
//! [`CanonicalRecord`].
//!
//! # Raw schema
//!
//! Required keys: `RequestMethod`, `RequestHost`, `RequestPath`,
//! `DownstreamStatus`, `Duration` (nanoseconds), `StartUTC`,
//! `RequestProtocol`, `RequestScheme`. `msg` carries the message. Every key
//! starting with `request_` is a captured request header. Everything else
//! (router, service and client metadata) is ignored.
//!
//! # Headers
//!
//! `protocol` and `scheme` are inserted first, then captured headers in
//! document order. A captured `request_protocol` / `request_scheme` therefore
//! overrides the synthesized value, and among duplicate names the last one in
//! the line wins.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ParseError;
use crate::types::{CanonicalRecord, Level};

const HEADER_PREFIX: &str = "request_";
const NANOS_PER_MILLI: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Identifier generation
// ---------------------------------------------------------------------------

/// Source of record identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random v4 UUIDs. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic ids `1, 2, 3, …` encoded as UUIDs. Useful when output must be
/// reproducible.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(n))
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Turns raw lines into [`CanonicalRecord`]s. Stateless apart from the id
/// generator, so one instance can be shared across a whole batch or session.
#[derive(Debug, Default)]
pub struct RecordNormalizer<G = RandomIds> {
    ids: G,
}

impl RecordNormalizer<RandomIds> {
    pub fn new() -> Self {
        Self { ids: RandomIds }
    }
}

impl<G: IdGenerator> RecordNormalizer<G> {
    pub fn with_ids(ids: G) -> Self {
        Self { ids }
    }

    /// Parse and normalise one line.
    ///
    /// Fails with [`ParseError::Malformed`] when the line is not a JSON object
    /// and with [`ParseError::SchemaViolation`] when a required field is
    /// missing or mistyped. Required fields are never defaulted.
    pub fn normalize(&self, raw_line: &str) -> Result<CanonicalRecord, ParseError> {
        let raw = match serde_json::from_str::<Value>(raw_line)? {
            Value::Object(raw) => raw,
            other => {
                return Err(ParseError::Malformed {
                    reason: format!("expected a JSON object, found {}", json_kind(&other)),
                })
            }
        };

        let status = required_status(&raw)?;
        let duration_ns = required_u64(&raw, "Duration")?;
        let timestamp = required_timestamp(&raw, "StartUTC")?;
        let method = required_str(&raw, "RequestMethod")?.to_string();
        let host = required_str(&raw, "RequestHost")?.to_string();
        let pathname = required_str(&raw, "RequestPath")?.to_string();
        let headers = extract_headers(&raw)?;
        let message = message(&raw)?;

        // Only accepted lines consume an id.
        Ok(CanonicalRecord {
            id: self.ids.next_id(),
            method,
            host,
            pathname,
            level: Level::from_status(status),
            latency_ms: duration_ns / NANOS_PER_MILLI,
            status,
            timestamp,
            headers,
            message,
        })
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn field<'a>(raw: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value, ParseError> {
    match raw.get(key) {
        None | Some(Value::Null) => Err(ParseError::violation(key, "missing")),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(raw: &'a Map<String, Value>, key: &'static str) -> Result<&'a str, ParseError> {
    let value = field(raw, key)?;
    value
        .as_str()
        .ok_or_else(|| ParseError::violation(key, format!("expected string, found {}", json_kind(value))))
}

fn required_u64(raw: &Map<String, Value>, key: &'static str) -> Result<u64, ParseError> {
    let value = field(raw, key)?;
    value.as_u64().ok_or_else(|| {
        ParseError::violation(
            key,
            format!("expected non-negative integer, found {value}"),
        )
    })
}

fn required_status(raw: &Map<String, Value>) -> Result<u16, ParseError> {
    const KEY: &str = "DownstreamStatus";
    let status = required_u64(raw, KEY)?;
    match u16::try_from(status) {
        Ok(status) if status > 0 => Ok(status),
        _ => Err(ParseError::violation(KEY, format!("status {status} out of range"))),
    }
}

fn required_timestamp(
    raw: &Map<String, Value>,
    key: &'static str,
) -> Result<chrono::DateTime<chrono::Utc>, ParseError> {
    let text = required_str(raw, key)?;
    chrono::DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&chrono::Utc))
        .map_err(|err| ParseError::violation(key, format!("invalid timestamp {text:?}: {err}")))
}

fn message(raw: &Map<String, Value>) -> Result<Option<String>, ParseError> {
    match raw.get("msg") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(msg)) if msg.is_empty() => Ok(None),
        Some(Value::String(msg)) => Ok(Some(msg.clone())),
        Some(other) => Err(ParseError::violation(
            "msg",
            format!("expected string, found {}", json_kind(other)),
        )),
    }
}

fn extract_headers(raw: &Map<String, Value>) -> Result<BTreeMap<String, String>, ParseError> {
    let mut headers = BTreeMap::new();
    headers.insert(
        "protocol".to_string(),
        required_str(raw, "RequestProtocol")?.to_string(),
    );
    headers.insert(
        "scheme".to_string(),
        required_str(raw, "RequestScheme")?.to_string(),
    );

    for (key, value) in raw {
        let Some(name) = key.strip_prefix(HEADER_PREFIX) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let value = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        headers.insert(name.to_string(), value);
    }
    Ok(headers)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
