//! Log record models.
//!
//! Defines the structured [`JsonLogRecord`] emitted by the database server's
//! JSON log output and the [`TextLogMatch`] captured from plain-text lines.

use super::timestamp::{
    event_start, format_timestamp, parse_timestamp, EventDuration, TimestampError,
};
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key holding the completion timestamp object (`{"$date": ...}`).
pub const TIMESTAMP_KEY: &str = "t";

/// Key inside [`TIMESTAMP_KEY`] holding the ISO-8601 completion time.
pub const DATE_KEY: &str = "$date";

/// Key holding the record's attribute object.
pub const ATTR_KEY: &str = "attr";

/// Key inside [`ATTR_KEY`] holding how long the operation took.
pub const DURATION_KEY: &str = "durationMillis";

/// Derived key: when the event started.
pub const START_KEY: &str = "st";

/// Derived key: the duration, copied from the attributes.
pub const DURATION_OUT_KEY: &str = "dms";

/// Errors that can occur while reshaping a JSON log record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record's fields do not have the expected types.
    #[error("{0}")]
    Malformed(String),

    /// The completion timestamp could not be parsed or shifted.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

/// A structured log record parsed from a JSON log line.
///
/// Field order is preserved exactly as it appeared in the input.
///
/// # Example
///
/// ```
/// use shared::models::JsonLogRecord;
///
/// let record = JsonLogRecord::parse(
///     r#"{"t":{"$date":"2024-01-01T00:00:10.000Z"},"msg":"Slow query","attr":{"durationMillis":1000}}"#,
/// )
/// .unwrap();
///
/// let reshaped = record.reshape().unwrap();
/// let keys: Vec<&str> = reshaped.keys().map(String::as_str).collect();
/// assert_eq!(keys, ["st", "t", "dms", "msg", "attr"]);
/// assert_eq!(reshaped["st"], "2024-01-01T00:00:09.000+0000");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonLogRecord {
    fields: Map<String, Value>,
}

impl JsonLogRecord {
    /// Parses a complete JSON log line.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if the line is not a JSON object.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(line)?;
        Ok(Self { fields })
    }

    /// Returns the record's fields in input order.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns the raw value at `t.$date`, if present.
    #[must_use]
    pub fn completion_date(&self) -> Option<&Value> {
        self.fields.get(TIMESTAMP_KEY)?.get(DATE_KEY)
    }

    /// Returns the raw value at `attr.durationMillis`, if present.
    ///
    /// An `attr` field that is not an object carries no duration.
    #[must_use]
    pub fn duration(&self) -> Option<&Value> {
        self.fields
            .get(ATTR_KEY)
            .and_then(Value::as_object)?
            .get(DURATION_KEY)
    }

    /// Reorders the record into `{st, t, [dms], ...remaining fields}`.
    ///
    /// With a duration, `st` is the derived start time and `dms` the duration
    /// exactly as logged. Without one, `st` is the raw `t.$date` value passed
    /// through untouched. The remaining fields follow in their original order
    /// with `t` removed; a remaining `st` or `dms` field overwrites the derived
    /// value in place.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration is present but is not a number, if
    /// `t.$date` is not a string, or if the timestamp cannot be parsed.
    pub fn reshape(self) -> Result<Map<String, Value>, RecordError> {
        let mut reshaped = Map::with_capacity(self.fields.len() + 2);
        let timestamp = self
            .fields
            .get(TIMESTAMP_KEY)
            .cloned()
            .unwrap_or(Value::Null);

        if let Some(raw_duration) = self.duration() {
            let duration = EventDuration::from_json(raw_duration).ok_or_else(|| {
                RecordError::Malformed(format!("{DURATION_KEY} is not a number: {raw_duration}"))
            })?;
            let date = self
                .completion_date()
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    RecordError::Malformed(format!(
                        "{TIMESTAMP_KEY}.{DATE_KEY} is not a timestamp string"
                    ))
                })?;

            let completed = parse_timestamp(date)?;
            let started = event_start(&completed, duration)?;

            reshaped.insert(
                START_KEY.to_string(),
                Value::String(format_timestamp(&started)),
            );
            reshaped.insert(TIMESTAMP_KEY.to_string(), timestamp);
            reshaped.insert(DURATION_OUT_KEY.to_string(), raw_duration.clone());
        } else {
            let date = self.completion_date().cloned().unwrap_or(Value::Null);
            reshaped.insert(START_KEY.to_string(), date);
            reshaped.insert(TIMESTAMP_KEY.to_string(), timestamp);
        }

        for (key, value) in self.fields {
            if key != TIMESTAMP_KEY {
                reshaped.insert(key, value);
            }
        }

        Ok(reshaped)
    }
}

/// Captures from a plain-text line ending in a duration annotation.
///
/// All captures borrow from the sanitized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLogMatch<'a> {
    /// The leading completion timestamp.
    pub completed: &'a str,
    /// Everything between the timestamp and the trailing duration.
    pub body: &'a str,
    /// The duration digits, exactly as written.
    pub duration: &'a str,
}

impl TextLogMatch<'_> {
    /// Renders the reformatted line.
    ///
    /// Both timestamps are right-aligned to 28 columns, and the duration
    /// appears both before and after the body.
    #[must_use]
    pub fn render(
        &self,
        started: &DateTime<FixedOffset>,
        completed: &DateTime<FixedOffset>,
    ) -> String {
        format!(
            "{:>28} => {:>28} {duration}ms {body} {duration}ms",
            format_timestamp(started),
            format_timestamp(completed),
            duration = self.duration,
            body = self.body,
        )
    }
}
