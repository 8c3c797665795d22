//! Suppression rules for plain-text log lines.
//!
//! A matched plain-text line whose full text matches any rule produces no
//! output. Rules are regular expressions checked against the sanitized line.

use regex::Regex;
use thiserror::Error;

/// Lines that report waiting rather than work. Always suppressed.
pub const BUILTIN_PATTERNS: &[&str] = &[
    r"sleeping for [0-9]+ms$",
    r"timeout was set to [0-9]+ms$",
];

/// Routine background maintenance lines. Suppressed on request.
pub const MAINTENANCE_PATTERNS: &[&str] = &[
    r"Finding the split vector for.*took [0-9]+ms$",
    r"task: UnusedLockCleaner took: [0-9]+ms$",
    r"WiredTiger record store oplog truncation finished in: [0-9]+ms",
];

/// Errors that can occur while building suppression rules.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A pattern is not a valid regular expression.
    #[error("Invalid suppression pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Why the regex engine rejected it.
        #[source]
        source: regex::Error,
    },
}

/// Where a suppression rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSource {
    /// One of [`BUILTIN_PATTERNS`].
    Builtin,
    /// One of [`MAINTENANCE_PATTERNS`].
    Maintenance,
    /// Supplied by the user.
    Custom,
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin => write!(f, "builtin"),
            Self::Maintenance => write!(f, "maintenance"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Which suppression rules to enable, before compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionConfig {
    /// Also suppress [`MAINTENANCE_PATTERNS`].
    pub include_maintenance: bool,
    /// Additional user-supplied patterns, checked after the built-in ones.
    pub extra_patterns: Vec<String>,
}

impl SuppressionConfig {
    /// Creates a configuration with only the built-in rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the maintenance rules.
    #[must_use]
    pub fn with_maintenance(mut self, enabled: bool) -> Self {
        self.include_maintenance = enabled;
        self
    }

    /// Adds a user-supplied pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.extra_patterns.push(pattern.into());
        self
    }

    /// Compiles the configuration into matchable rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for the first pattern that is
    /// not a valid regular expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use shared::config::SuppressionConfig;
    ///
    /// let rules = SuppressionConfig::new()
    ///     .with_maintenance(true)
    ///     .with_pattern(r"checkpoint took [0-9]+ms$")
    ///     .compile()
    ///     .unwrap();
    /// assert_eq!(rules.len(), 6);
    /// ```
    pub fn compile(&self) -> Result<SuppressionRules, ConfigError> {
        let maintenance: &[&str] = if self.include_maintenance {
            MAINTENANCE_PATTERNS
        } else {
            &[]
        };

        let rules = BUILTIN_PATTERNS
            .iter()
            .map(|pattern| SuppressionRule::new(RuleSource::Builtin, pattern))
            .chain(
                maintenance
                    .iter()
                    .map(|pattern| SuppressionRule::new(RuleSource::Maintenance, pattern)),
            )
            .chain(
                self.extra_patterns
                    .iter()
                    .map(|pattern| SuppressionRule::new(RuleSource::Custom, pattern)),
            )
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SuppressionRules { rules })
    }
}

/// A single compiled suppression rule.
#[derive(Debug, Clone)]
pub struct SuppressionRule {
    source: RuleSource,
    pattern: Regex,
}

impl SuppressionRule {
    /// Compiles a rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] if the pattern does not compile.
    pub fn new(source: RuleSource, pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { source, pattern })
    }

    /// Where the rule came from.
    #[must_use]
    pub fn source(&self) -> RuleSource {
        self.source
    }

    /// The rule's pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns true if the line matches this rule.
    #[must_use]
    pub fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// An ordered set of compiled suppression rules.
#[derive(Debug, Clone)]
pub struct SuppressionRules {
    rules: Vec<SuppressionRule>,
}

impl SuppressionRules {
    /// Returns the first rule matching the line, if any.
    #[must_use]
    pub fn find_match(&self, line: &str) -> Option<&SuppressionRule> {
        self.rules.iter().find(|rule| rule.is_match(line))
    }

    /// Number of rules in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates the rules in match order.
    pub fn iter(&self) -> impl Iterator<Item = &SuppressionRule> {
        self.rules.iter()
    }
}

impl Default for SuppressionRules {
    /// Returns the built-in rules only.
    fn default() -> Self {
        SuppressionConfig::new()
            .compile()
            .expect("built-in suppression patterns are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_builtin() {
        let rules = SuppressionRules::default();
        assert_eq!(rules.len(), BUILTIN_PATTERNS.len());
        assert!(rules.iter().all(|r| r.source() == RuleSource::Builtin));
    }

    #[test]
    fn test_builtin_sleeping_and_timeout() {
        let rules = SuppressionRules::default();

        let rule = rules
            .find_match("2024-01-01T00:00:10.000+0000 [ftdc] sleeping for 100ms")
            .unwrap();
        assert_eq!(rule.as_str(), r"sleeping for [0-9]+ms$");

        assert!(rules
            .find_match("2024-01-01T00:00:10.000+0000 cursor timeout was set to 600000ms")
            .is_some());
    }

    #[test]
    fn test_builtin_rules_are_end_anchored() {
        let rules = SuppressionRules::default();
        assert!(rules
            .find_match("2024-01-01T00:00:10.000+0000 sleeping for 100ms then ran 5ms")
            .is_none());
        assert!(rules
            .find_match("2024-01-01T00:00:10.000+0000 query took 100ms")
            .is_none());
    }

    #[test]
    fn test_maintenance_rules_opt_in() {
        let line = "2024-01-01T00:00:10.000+0000 task: UnusedLockCleaner took: 12ms";
        assert!(SuppressionRules::default().find_match(line).is_none());

        let rules = SuppressionConfig::new().with_maintenance(true).compile().unwrap();
        let rule = rules.find_match(line).unwrap();
        assert_eq!(rule.source(), RuleSource::Maintenance);
    }

    #[test]
    fn test_maintenance_oplog_truncation_not_end_anchored() {
        let rules = SuppressionConfig::new().with_maintenance(true).compile().unwrap();
        assert!(rules
            .find_match("x WiredTiger record store oplog truncation finished in: 3ms, more 9ms")
            .is_some());
    }

    #[test]
    fn test_custom_pattern() {
        let rules = SuppressionConfig::new()
            .with_pattern("conn[0-9]+")
            .compile()
            .unwrap();
        let rule = rules.find_match("2024-01-01T00:00:10.000+0000 [conn42] x 5ms").unwrap();
        assert_eq!(rule.source(), RuleSource::Custom);
        assert_eq!(rule.source().to_string(), "custom");
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let result = SuppressionConfig::new().with_pattern("took (").compile();
        match result {
            Err(ConfigError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "took ("),
            Ok(_) => panic!("expected invalid pattern error"),
        }
    }
}
