//! Timestamp parsing, formatting, and event start arithmetic.
//!
//! Durations are applied as exact integer offsets so that adding the
//! duration back to a derived start time reproduces the completion time.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

/// Output format for every emitted timestamp, e.g. `2024-01-01T00:00:09.500+0000`.
pub const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Input format accepted for offsets written without a colon (`+0000`).
const COMPACT_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Input format for timestamps that carry no offset at all; read as UTC.
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Errors that can occur while parsing timestamps or deriving start times.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// The text is not a recognizable calendar timestamp.
    #[error("Unparseable timestamp: '{0}'")]
    Unparseable(String),

    /// The duration cannot be represented as a time offset.
    #[error("Duration out of range: {0}")]
    DurationOutOfRange(String),

    /// Subtracting the duration leaves the representable calendar range.
    #[error("Event start for '{timestamp}' is out of range")]
    StartOutOfRange {
        /// The completion timestamp the duration was subtracted from.
        timestamp: String,
    },
}

/// How long an event took, as logged next to its completion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDuration {
    /// A whole number of milliseconds.
    Millis(i64),
    /// A fractional millisecond count, held as nanoseconds.
    Nanos(i64),
}

impl EventDuration {
    /// Reads a duration from a JSON number.
    ///
    /// Integers are taken as exact milliseconds. Floating point values are
    /// rounded to the nearest nanosecond. Anything else yields `None`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let Value::Number(number) = value else {
            return None;
        };

        if let Some(millis) = number.as_i64() {
            return Some(Self::Millis(millis));
        }
        if number.is_u64() {
            // Larger than i64::MAX milliseconds.
            return None;
        }

        let nanos = number.as_f64()? * 1_000_000.0;
        if !nanos.is_finite() || nanos.abs() >= 9.0e18 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let nanos = nanos.round() as i64;
        Some(Self::Nanos(nanos))
    }

    /// Parses a run of ASCII digits captured from a plain-text line.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::DurationOutOfRange`] when the digits do not
    /// fit a signed 64-bit millisecond count.
    pub fn from_digits(digits: &str) -> Result<Self, TimestampError> {
        digits
            .parse::<i64>()
            .map(Self::Millis)
            .map_err(|_| TimestampError::DurationOutOfRange(format!("{digits}ms")))
    }

    /// Converts the duration to a chrono offset.
    #[must_use]
    pub fn to_delta(self) -> Option<TimeDelta> {
        match self {
            Self::Millis(millis) => TimeDelta::try_milliseconds(millis),
            Self::Nanos(nanos) => Some(TimeDelta::nanoseconds(nanos)),
        }
    }
}

impl std::fmt::Display for EventDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Millis(millis) => write!(f, "{millis}ms"),
            Self::Nanos(nanos) => write!(f, "{nanos}ns"),
        }
    }
}

/// Parses a timezone-aware calendar timestamp.
///
/// Accepts RFC 3339 (`Z` or `+HH:MM` offsets), compact `+HHMM` offsets, and
/// any number of fractional second digits after either `.` or `,`. A
/// timestamp without an offset is read as UTC.
///
/// # Errors
///
/// Returns [`TimestampError::Unparseable`] if no accepted form matches.
///
/// # Examples
///
/// ```
/// use shared::models::timestamp::parse_timestamp;
///
/// let ts = parse_timestamp("2024-01-01T00:00:10.000+0100").unwrap();
/// assert_eq!(ts.offset().local_minus_utc(), 3600);
/// ```
pub fn parse_timestamp(input: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    let normalized = normalize_fraction_separator(input);
    let text = normalized.as_ref();

    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, COMPACT_OFFSET_FORMAT))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, NAIVE_FORMAT)
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .map_err(|_| TimestampError::Unparseable(input.to_string()))
}

/// Rewrites a `,` between seconds and fraction (`10,000`) as `.`.
fn normalize_fraction_separator(input: &str) -> Cow<'_, str> {
    // `YYYY-MM-DDTHH:MM:SS` is 19 ASCII bytes; the separator follows it.
    match input.as_bytes().get(19) {
        Some(b',') if input.is_char_boundary(19) => {
            Cow::Owned(format!("{}.{}", &input[..19], &input[20..]))
        }
        _ => Cow::Borrowed(input),
    }
}

/// Derives when an event started from its completion time and duration.
///
/// The result keeps the completion timestamp's offset.
///
/// # Errors
///
/// Returns an error if the duration or the resulting start time cannot be
/// represented.
pub fn event_start(
    completed: &DateTime<FixedOffset>,
    duration: EventDuration,
) -> Result<DateTime<FixedOffset>, TimestampError> {
    let delta = duration
        .to_delta()
        .ok_or_else(|| TimestampError::DurationOutOfRange(duration.to_string()))?;

    completed
        .checked_sub_signed(delta)
        .ok_or_else(|| TimestampError::StartOutOfRange {
            timestamp: completed.to_rfc3339(),
        })
}

/// Formats a timestamp with millisecond precision and a compact numeric offset.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format(OUTPUT_FORMAT).to_string()
}
