//! Counters describing one transform run.

use serde::Serialize;

/// Counts of what the transformer saw and emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    /// Input lines read.
    pub lines_read: u64,
    /// JSON log records reshaped and emitted.
    pub json_records: u64,
    /// Plain-text lines reformatted and emitted.
    pub text_events: u64,
    /// Plain-text lines matched but suppressed.
    pub suppressed: u64,
}

impl TransformStats {
    /// Total output lines written, excluding diagnostics.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.json_records + self.text_events
    }
}
