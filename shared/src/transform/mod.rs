//! Line-at-a-time log transformer.
//!
//! Each raw input line is sanitized and checked against two independent
//! branches:
//!
//! - JSON log lines are reshaped to `{st, t, [dms], ...}` with a derived
//!   event start time
//! - plain-text lines ending in `<n>ms` are reformatted as
//!   `<start> => <completion> <n>ms <body> <n>ms`
//!
//! Both branches may fire on the same line; their outputs are written in
//! that order. Nothing is carried from one line to the next except counters.

mod sanitize;
mod stats;

pub use sanitize::sanitize;
pub use stats::TransformStats;

use crate::config::SuppressionRules;
use crate::models::{
    event_start, parse_timestamp, EventDuration, JsonLogRecord, RecordError, TextLogMatch,
    TimestampError,
};
use crate::parser::{is_json_log_line, match_text_line};
use serde_json::Value;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that end a transform run.
///
/// Every variant is fatal: the caller stops reading input.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A timestamp could not be parsed or shifted.
    ///
    /// The display text is the diagnostic written to standard output.
    #[error("Exception in log line:\n{line}")]
    Timestamp {
        /// The sanitized input line.
        line: String,
        /// What went wrong with the timestamp.
        #[source]
        source: TimestampError,
    },

    /// A JSON log line is not valid JSON.
    #[error("Invalid JSON log record: {source}\n{line}")]
    Json {
        /// The sanitized input line.
        line: String,
        /// The JSON parser's error.
        #[source]
        source: serde_json::Error,
    },

    /// A JSON log record has fields of unexpected types.
    #[error("Malformed JSON log record ({reason})\n{line}")]
    MalformedRecord {
        /// The sanitized input line.
        line: String,
        /// Which field was wrong.
        reason: String,
    },

    /// Output could not be written.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// Exit status for a run ended by this error.
    ///
    /// Timestamp failures exit with 1; everything else exits with 2.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Timestamp { .. } => 1,
            Self::Json { .. } | Self::MalformedRecord { .. } | Self::Io(_) => 2,
        }
    }

    /// Returns true if the error's display text belongs on standard output.
    #[must_use]
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Timestamp { .. })
    }

    fn timestamp(line: &str, source: TimestampError) -> Self {
        Self::Timestamp {
            line: line.to_string(),
            source,
        }
    }
}

/// Transforms database server log lines one at a time.
///
/// # Example
///
/// ```
/// use shared::config::SuppressionRules;
/// use shared::transform::LineTransformer;
///
/// let mut transformer = LineTransformer::new(SuppressionRules::default());
/// let mut out = Vec::new();
///
/// transformer
///     .process_line(
///         br#"{"t":{"$date":"2024-01-01T00:00:10.000Z"},"attr":{"durationMillis":1000}}"#,
///         &mut out,
///     )
///     .unwrap();
///
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "{\"st\":\"2024-01-01T00:00:09.000+0000\",\"t\":{\"$date\":\"2024-01-01T00:00:10.000Z\"},\"dms\":1000,\"attr\":{\"durationMillis\":1000}}\n"
/// );
/// assert_eq!(transformer.stats().json_records, 1);
/// ```
#[derive(Debug)]
pub struct LineTransformer {
    suppressions: SuppressionRules,
    stats: TransformStats,
}

impl LineTransformer {
    /// Creates a transformer using the given suppression rules.
    #[must_use]
    pub fn new(suppressions: SuppressionRules) -> Self {
        Self {
            suppressions,
            stats: TransformStats::default(),
        }
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> &TransformStats {
        &self.stats
    }

    /// Transforms one raw input line, writing zero, one, or two output lines.
    ///
    /// A single trailing `\n` is removed before matching; a `\r` before it is
    /// kept and prevents a plain-text match, exactly as an end-of-line anchor
    /// would.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError`] when a timestamp cannot be parsed, when a
    /// JSON log line is malformed, or when writing fails. All of these are
    /// fatal for the run.
    pub fn process_line<W: Write>(&mut self, raw: &[u8], out: &mut W) -> Result<(), TransformError> {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let line = sanitize(raw);
        self.stats.lines_read += 1;
        trace!(line_number = self.stats.lines_read, "processing line");

        if is_json_log_line(&line) {
            self.transform_json(&line, out)?;
        }

        if let Some(captured) = match_text_line(&line) {
            self.transform_text(&line, &captured, out)?;
        }

        Ok(())
    }

    fn transform_json<W: Write>(&mut self, line: &str, out: &mut W) -> Result<(), TransformError> {
        let record = JsonLogRecord::parse(line).map_err(|source| TransformError::Json {
            line: line.to_string(),
            source,
        })?;

        let reshaped = record.reshape().map_err(|err| match err {
            RecordError::Timestamp(source) => TransformError::timestamp(line, source),
            RecordError::Malformed(reason) => TransformError::MalformedRecord {
                line: line.to_string(),
                reason,
            },
        })?;

        writeln!(out, "{}", Value::Object(reshaped))?;
        self.stats.json_records += 1;
        Ok(())
    }

    fn transform_text<W: Write>(
        &mut self,
        line: &str,
        captured: &TextLogMatch<'_>,
        out: &mut W,
    ) -> Result<(), TransformError> {
        let completed = parse_timestamp(captured.completed)
            .map_err(|source| TransformError::timestamp(line, source))?;

        // Suppressed lines never reach the duration arithmetic.
        if let Some(rule) = self.suppressions.find_match(line) {
            debug!(
                line_number = self.stats.lines_read,
                source = %rule.source(),
                pattern = rule.as_str(),
                "suppressed plain-text line"
            );
            self.stats.suppressed += 1;
            return Ok(());
        }

        let duration = EventDuration::from_digits(captured.duration)
            .map_err(|source| TransformError::timestamp(line, source))?;
        let started = event_start(&completed, duration)
            .map_err(|source| TransformError::timestamp(line, source))?;

        writeln!(out, "{}", captured.render(&started, &completed))?;
        self.stats.text_events += 1;
        Ok(())
    }
}
