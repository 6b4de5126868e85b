//! trail-core — shared types and the synchronous half of the trail pipeline.
//!
//! # Architecture
//!
//! ```text
//! FileTailer (trail-feeds) ──► LineSplitter ──► RecordNormalizer ──► consumer
//!
//! read_log_file ──► LineSplitter ──► parse_logs ──► ParsedLogCache ──► caller
//! ```
//!
//! Everything in this crate is runtime-agnostic; the async tailer lives in
//! `trail-feeds`.

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod lines;
pub mod normalizer;
pub mod types;

pub use batch::{parse_logs, read_log_file, LineError, ParsedBatch};
pub use cache::{CachePolicy, FsLoader, LogLoader, ParsedLogCache};
pub use error::{IngestError, ParseError};
pub use lines::LineSplitter;
pub use normalizer::{IdGenerator, RandomIds, RecordNormalizer, SequentialIds};
pub use types::{CanonicalRecord, Level};
