//! Data models for database server log lines.
//!
//! This module contains the structured JSON log record, the captures taken
//! from plain-text lines, and the timestamp arithmetic shared by both.

pub mod log;
pub mod timestamp;

pub use log::{JsonLogRecord, RecordError, TextLogMatch};
pub use timestamp::{
    event_start, format_timestamp, parse_timestamp, EventDuration, TimestampError,
};
