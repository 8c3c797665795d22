//! Configuration module for Slowops.
//!
//! This module contains the rules deciding which plain-text lines are
//! suppressed instead of being reformatted.

pub mod suppression;

pub use suppression::{
    ConfigError, RuleSource, SuppressionConfig, SuppressionRule, SuppressionRules,
    BUILTIN_PATTERNS, MAINTENANCE_PATTERNS,
};
