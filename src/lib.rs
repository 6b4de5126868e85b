//! trail — follow, normalise and cache Traefik JSON access logs.
//!
//! This crate ties the workspace together so that the binary, integration
//! tests and benches can import everything from one place.
//!
//! # Architecture
//!
//! ```text
//! live:   start_tail ──► LineSplitter ──► RecordNormalizer ──► RecordConsumer
//!                        (trail-feeds)      (trail-core)        (pipeline)
//!
//! batch:  ParsedLogCache::get_or_load ──► read_log_file ──► parse_logs
//! ```
//!
//! A tail session runs on its own tokio task and calls its consumer one
//! record at a time; the batch path is synchronous.

pub mod pipeline;

pub use trail_core::{
    config, CachePolicy, CanonicalRecord, IngestError, Level, ParseError, ParsedLogCache,
    RecordNormalizer,
};
pub use trail_feeds::{TailError, TailSession, TailSummary};

pub use pipeline::{tail_records, RecordConsumer};
