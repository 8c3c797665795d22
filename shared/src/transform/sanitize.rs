//! Encoding cleanup for raw input lines.

use std::borrow::Cow;

/// Removes every invalid UTF-8 sequence from a raw line.
///
/// Valid characters keep their order and value. Lines that are already valid
/// are borrowed without copying.
///
/// # Example
///
/// ```
/// use shared::transform::sanitize;
///
/// assert_eq!(sanitize(b"caf\xC3\xA9 \xFFok"), "café ok");
/// ```
#[must_use]
pub fn sanitize(raw: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(raw) {
        Ok(valid) => Cow::Borrowed(valid),
        Err(_) => Cow::Owned(raw.utf8_chunks().map(|chunk| chunk.valid()).collect()),
    }
}
