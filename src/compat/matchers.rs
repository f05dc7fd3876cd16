//! Name comparison primitives for compatibility rules
//!
//! Rules compare knob names, plugin identifiers and choice option
//! labels with one of a closed set of comparison kinds. A closed enum
//! dispatched through a `match` keeps the set explicit and the rule
//! tables serializable.

use serde::{Deserialize, Serialize};

/// How a candidate string is compared against a rule pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    /// Byte-for-byte equality
    #[default]
    Exact,
    /// ASCII case-insensitive equality
    CaseInsensitive,
    /// Pattern occurs anywhere in the candidate
    Substring,
    /// Candidate starts with the pattern
    Prefix,
    /// Candidate ends with the pattern
    Suffix,
}

impl MatchKind {
    pub fn matches(&self, candidate: &str, pattern: &str) -> bool {
        match self {
            MatchKind::Exact => candidate == pattern,
            MatchKind::CaseInsensitive => candidate.eq_ignore_ascii_case(pattern),
            MatchKind::Substring => candidate.contains(pattern),
            MatchKind::Prefix => candidate.starts_with(pattern),
            MatchKind::Suffix => candidate.ends_with(pattern),
        }
    }
}

/// A pattern plus the comparison used to apply it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePattern {
    pub pattern: String,
    #[serde(default)]
    pub compare: MatchKind,
}

impl NamePattern {
    pub fn new(pattern: impl Into<String>, compare: MatchKind) -> Self {
        Self {
            pattern: pattern.into(),
            compare,
        }
    }

    pub fn exact(pattern: impl Into<String>) -> Self {
        Self::new(pattern, MatchKind::Exact)
    }

    pub fn case_insensitive(pattern: impl Into<String>) -> Self {
        Self::new(pattern, MatchKind::CaseInsensitive)
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.compare.matches(candidate, &self.pattern)
    }
}
