//! Path exclusion rules.
//!
//! Evaluated before any hashing or scanning work is spent on a path; the
//! per-file work dominates cycle cost, so filtering must come first.

use regex_lite::Regex;

use crate::error::ConfigError;

/// Built-in exclusions: logs, pid files, editor droppings, session
/// artifacts, compiled caches, vendored trees, and the engine's own state
/// directory.
const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    r"\.log$",
    r"\.pid$",
    r"\.tmp$",
    r"\.swp$",
    r"\.pyc$",
    r"(^|/)__pycache__/",
    r"(^|/)sessions/",
    r"(^|/)node_modules/",
    r"(^|/)target/",
    r"(^|/)\.graphis(/|$)",
];

/// Decides whether a path is excluded from consideration.
pub struct IgnoreClassifier {
    rules: Vec<Regex>,
}

impl IgnoreClassifier {
    /// Compile the built-in rules plus operator-supplied extras.
    ///
    /// An invalid extra pattern is a configuration error, not a silently
    /// skipped rule.
    pub fn new(extra_patterns: &[String]) -> Result<Self, ConfigError> {
        let mut rules: Vec<Regex> = DEFAULT_IGNORE_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("Invalid regex"))
            .collect();

        for pattern in extra_patterns {
            let rule = Regex::new(pattern).map_err(|source| ConfigError::InvalidIgnorePattern {
                pattern: pattern.clone(),
                source,
            })?;
            rules.push(rule);
        }

        Ok(Self { rules })
    }

    /// Pure match against the rule set; no filesystem access.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.rules.iter().any(|r| r.is_match(path))
    }
}
