//! Test builders — ergonomic constructors for raw access-log lines and log
//! files on disk.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// RawLine
// ---------------------------------------------------------------------------

/// Fluent builder for one raw Traefik JSON access-log line.
///
/// Starts from a complete, valid line; every setter overrides one key.
///
/// # Example
///
/// ```rust
/// let line = RawLine::new()
///     .status(404)
///     .header("User-Agent", "curl/8.5.0")
///     .build();
/// ```
pub struct RawLine {
    fields: Map<String, Value>,
}

impl RawLine {
    pub fn new() -> Self {
        let mut fields = Map::new();
        for (key, value) in [
            ("DownstreamStatus", Value::from(200)),
            ("Duration", Value::from(1_000_000u64)),
            ("RequestHost", Value::from("example.com")),
            ("RequestMethod", Value::from("GET")),
            ("RequestPath", Value::from("/")),
            ("RequestProtocol", Value::from("HTTP/1.1")),
            ("RequestScheme", Value::from("https")),
            ("StartUTC", Value::from("2025-03-01T12:00:00Z")),
        ] {
            fields.insert(key.to_string(), value);
        }
        Self { fields }
    }

    pub fn status(self, status: u16) -> Self {
        self.set("DownstreamStatus", status)
    }

    pub fn duration_ns(self, nanos: u64) -> Self {
        self.set("Duration", nanos)
    }

    pub fn host(self, host: &str) -> Self {
        self.set("RequestHost", host)
    }

    pub fn method(self, method: &str) -> Self {
        self.set("RequestMethod", method)
    }

    pub fn path(self, path: &str) -> Self {
        self.set("RequestPath", path)
    }

    pub fn start(self, rfc3339: &str) -> Self {
        self.set("StartUTC", rfc3339)
    }

    pub fn msg(self, msg: &str) -> Self {
        self.set("msg", msg)
    }

    /// Add a captured request header (`request_<name>`).
    pub fn header(self, name: &str, value: &str) -> Self {
        self.set(&format!("request_{name}"), value)
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.fields.remove(key);
        self
    }

    pub fn build(self) -> String {
        Value::Object(self.fields).to_string()
    }
}

impl Default for RawLine {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Append `lines`, each newline-terminated, to `path` (created if missing).
pub fn append_lines<S: AsRef<str>>(path: &Path, lines: &[S]) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .expect("open log file for append");
    for line in lines {
        writeln!(file, "{}", line.as_ref()).expect("append line");
    }
    file.flush().expect("flush log file");
}

/// Append raw bytes with no newline handling.
pub fn append_raw(path: &Path, bytes: &str) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .expect("open log file for append");
    file.write_all(bytes.as_bytes()).expect("append bytes");
}
