//! trail-feeds — the live-tail half of the trail pipeline.
//!
//! [`file::start_tail`] follows an append-only log file through truncation
//! and rotation and hands every completed line to a [`file::LineHandler`],
//! one at a time, on a single background task per file.

pub mod error;
pub mod file;

pub use error::TailError;
pub use file::{start_tail, LineHandler, TailSession, TailSummary};
