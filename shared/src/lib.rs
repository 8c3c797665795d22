//! Slowops Shared Library
//!
//! This crate contains the log line models, tokenizer, and transformer used
//! by the `slowops` command-line tool to derive event start times from
//! database server logs.
//!
//! # Modules
//!
//! - [`models`] - JSON log records, plain-text matches, and timestamp arithmetic
//! - [`parser`] - Line classification and the plain-text line tokenizer
//! - [`config`] - Suppression rules for noisy plain-text lines
//! - [`transform`] - The line-at-a-time transformer and its statistics
//!
//! # Example
//!
//! ```
//! use shared::config::SuppressionRules;
//! use shared::transform::LineTransformer;
//!
//! let mut transformer = LineTransformer::new(SuppressionRules::default());
//! let mut out = Vec::new();
//! transformer
//!     .process_line(b"2024-01-01T00:00:10.000+0000 did something 500ms\n", &mut out)
//!     .unwrap();
//!
//! let text = String::from_utf8(out).unwrap();
//! assert!(text.contains("2024-01-01T00:00:09.500+0000"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod models;
pub mod parser;
pub mod transform;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde_json;
