//! Line classification for database server logs.
//!
//! Every sanitized line is checked against two independent triggers:
//!
//! - a JSON log line starts with the literal prefix `{"t":{"$date":`
//! - a plain-text line matches
//!   `<timestamp> <body> <digits>ms` anchored at both ends
//!
//! # Example
//!
//! ```
//! use shared::parser::{is_json_log_line, match_text_line};
//!
//! assert!(is_json_log_line(r#"{"t":{"$date":"2024-01-01T00:00:00.000Z"}}"#));
//!
//! let captured = match_text_line("2024-01-01T00:00:10.000+0000 did something 500ms").unwrap();
//! assert_eq!(captured.body, "did something");
//! assert_eq!(captured.duration, "500");
//! ```

mod text;

pub use text::match_text_line;

/// Literal prefix identifying a JSON log line.
pub const JSON_LOG_PREFIX: &str = r#"{"t":{"$date":"#;

/// Returns true if the line is a JSON log record.
#[must_use]
pub fn is_json_log_line(line: &str) -> bool {
    line.starts_with(JSON_LOG_PREFIX)
}
