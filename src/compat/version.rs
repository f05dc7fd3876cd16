//! Version triples and applicability windows
//!
//! Compatibility rules are gated on host-application versions. Both the
//! rule bounds and the caller-supplied version use -1 as an "unbounded"
//! sentinel: an axis is only constrained when the rule bound *and* the
//! caller value are real, each axis independently.

use serde::{Deserialize, Serialize};

/// A (major, minor, revision) triple where -1 leaves an axis open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMatch {
    #[serde(default = "unbounded")]
    pub major: i32,
    #[serde(default = "unbounded")]
    pub minor: i32,
    #[serde(default = "unbounded")]
    pub rev: i32,
}

fn unbounded() -> i32 {
    -1
}

impl Default for VersionMatch {
    fn default() -> Self {
        VersionMatch::ANY
    }
}

impl VersionMatch {
    /// Matches every version on every axis.
    pub const ANY: VersionMatch = VersionMatch {
        major: -1,
        minor: -1,
        rev: -1,
    };

    pub fn new(major: i32, minor: i32, rev: i32) -> Self {
        Self { major, minor, rev }
    }

    /// Bound only the major axis.
    pub fn major(major: i32) -> Self {
        Self {
            major,
            minor: -1,
            rev: -1,
        }
    }
}

/// Inclusive min/max window over [`VersionMatch`] triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionRange {
    #[serde(default)]
    pub min: VersionMatch,
    #[serde(default)]
    pub max: VersionMatch,
}

impl VersionRange {
    /// The unconstrained window.
    pub const ANY: VersionRange = VersionRange {
        min: VersionMatch::ANY,
        max: VersionMatch::ANY,
    };

    pub fn up_to(max: VersionMatch) -> Self {
        Self {
            min: VersionMatch::ANY,
            max,
        }
    }

    pub fn from(min: VersionMatch) -> Self {
        Self {
            min,
            max: VersionMatch::ANY,
        }
    }

    /// Whether the supplied version falls inside the window. Each axis
    /// is checked independently; -1 on either side of a comparison
    /// disables that comparison.
    pub fn contains(&self, major: i32, minor: i32, rev: i32) -> bool {
        if major != -1 && self.min.major != -1 && major < self.min.major {
            return false;
        }
        if major != -1 && self.max.major != -1 && major > self.max.major {
            return false;
        }
        if minor != -1 && self.min.minor != -1 && minor < self.min.minor {
            return false;
        }
        if minor != -1 && self.max.minor != -1 && minor > self.max.minor {
            return false;
        }
        if rev != -1 && self.min.rev != -1 && rev < self.min.rev {
            return false;
        }
        if rev != -1 && self.max.rev != -1 && rev > self.max.rev {
            return false;
        }
        true
    }
}
