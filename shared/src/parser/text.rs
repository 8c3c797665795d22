//! Plain-text completion line tokenizer using nom.
//!
//! Recognizes lines like:
//! - `2024-01-01T00:00:10.000+0000 did something 500ms`
//! - `2023-06-15T12:30:45.123456-05:00 [conn12] command test.coll took 1500ms`

use crate::models::TextLogMatch;
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{anychar, char, one_of},
    combinator::{recognize, verify},
    error::Error,
    IResult, Parser,
};

/// Matches a plain-text line ending in a millisecond duration.
///
/// The line must start with an ISO-8601 timestamp carrying 3 to 6 fractional
/// digits and a numeric offset, followed by a single space, the body, a
/// single space, ASCII digits, and the literal `ms` at the very end.
///
/// Returns `None` when the line does not have that shape. The timestamp is
/// only tokenized here; it may still fail to parse as a calendar date.
#[must_use]
pub fn match_text_line(line: &str) -> Option<TextLogMatch<'_>> {
    let (rest, completed) = completion_timestamp(line).ok()?;
    let rest = rest.strip_prefix(' ')?;
    let rest = rest.strip_suffix("ms")?;

    // The duration cannot contain a space, so it starts after the last one.
    let (body, duration) = rest.rsplit_once(' ')?;
    if duration.is_empty() || !duration.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if body.contains('\n') {
        return None;
    }

    Some(TextLogMatch {
        completed,
        body,
        duration,
    })
}

// ============================================================================
// Timestamp token
// ============================================================================

fn completion_timestamp(input: &str) -> IResult<&str, &str> {
    recognize((
        digits(4),
        char('-'),
        digits(2),
        char('-'),
        digits(2),
        char('T'),
        digits(2),
        char(':'),
        digits(2),
        char(':'),
        digits(2),
        // Any separator before the fraction, not only '.'.
        verify(anychar, |c: &char| *c != '\n'),
        take_while_m_n(3, 6, |c: char| c.is_ascii_digit()),
        one_of("+-"),
        take_while_m_n(4, 5, |c: char| c.is_ascii_digit() || c == ':'),
    ))
    .parse(input)
}

fn digits<'a>(count: usize) -> impl Parser<&'a str, Output = &'a str, Error = Error<&'a str>> {
    take_while_m_n(count, count, |c: char| c.is_ascii_digit())
}
