//! Compatibility rule tables and the name-rewrite algorithm
//!
//! When an older project is loaded, knob names (and choice option
//! labels) saved under a legacy naming scheme must be translated to
//! their current canonical names before lookup. Rules are evaluated in
//! declaration order; the first rule whose application-version window,
//! plugin scoping and name pattern all hold rewrites the name and stops
//! evaluation.
//!
//! The built-in table carries the sunset renames of the historical
//! single-letter channel-process knobs (`r`, `g`, `b`, `a` and their
//! `doRed`/`doGreen`/`doBlue`/`doAlpha` long forms), which only apply to
//! projects written by application major versions up to 1. Hosts can
//! load additional rules from a TOML config.

use crate::compat::matchers::{MatchKind, NamePattern};
use crate::compat::version::{VersionMatch, VersionRange};
use crate::error::{KnobLinkError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Canonical name of the red channel-process knob.
pub const PROCESS_RED: &str = "processR";
/// Canonical name of the green channel-process knob.
pub const PROCESS_GREEN: &str = "processG";
/// Canonical name of the blue channel-process knob.
pub const PROCESS_BLUE: &str = "processB";
/// Canonical name of the alpha channel-process knob.
pub const PROCESS_ALPHA: &str = "processA";

fn unbounded() -> i32 {
    -1
}

fn case_insensitive() -> MatchKind {
    MatchKind::CaseInsensitive
}

/// Scopes a rule to one plugin identifier, optionally within a plugin
/// version window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMatch {
    pub plugin_id: String,

    /// Comparison used against the caller's plugin identifier.
    #[serde(default = "case_insensitive")]
    pub compare: MatchKind,

    /// Minimal plugin version the rule applies to; -1 = no lower bound.
    #[serde(default = "unbounded")]
    pub version_major_min: i32,
    #[serde(default = "unbounded")]
    pub version_minor_min: i32,

    /// Plugin version up to which the rule applies; -1 = no upper bound.
    #[serde(default = "unbounded")]
    pub version_major_max: i32,
    #[serde(default = "unbounded")]
    pub version_minor_max: i32,
}

impl PluginMatch {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            compare: MatchKind::CaseInsensitive,
            version_major_min: -1,
            version_minor_min: -1,
            version_major_max: -1,
            version_minor_max: -1,
        }
    }

    pub fn versions(mut self, major_min: i32, minor_min: i32, major_max: i32, minor_max: i32) -> Self {
        self.version_major_min = major_min;
        self.version_minor_min = minor_min;
        self.version_major_max = major_max;
        self.version_minor_max = minor_max;
        self
    }
}

/// One match group of a rule: an optional plugin scope plus the name
/// pattern itself. A rule applies when at least one of its groups does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnobMatch {
    /// Plugins this group applies to. Empty = any plugin.
    #[serde(default)]
    pub plugins: Vec<PluginMatch>,
    pub name: NamePattern,
}

/// A knob rename rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnobNameFilter {
    /// Match groups; if any one of them matches, the rule applies.
    pub matches: Vec<KnobMatch>,

    /// The canonical name that replaces a matched legacy name.
    pub replacement: String,

    /// Application-version window the rule is gated on.
    #[serde(default)]
    pub app_version: VersionRange,
}

impl KnobNameFilter {
    pub fn new(replacement: impl Into<String>) -> Self {
        Self {
            matches: Vec::new(),
            replacement: replacement.into(),
            app_version: VersionRange::ANY,
        }
    }

    /// Add a plugin-agnostic match group.
    pub fn match_name(mut self, name: NamePattern) -> Self {
        self.matches.push(KnobMatch {
            plugins: Vec::new(),
            name,
        });
        self
    }

    /// Add a match group scoped to the given plugins.
    pub fn match_plugin_name(mut self, plugins: Vec<PluginMatch>, name: NamePattern) -> Self {
        self.matches.push(KnobMatch { plugins, name });
        self
    }

    pub fn app_version_min(mut self, min: VersionMatch) -> Self {
        self.app_version.min = min;
        self
    }

    pub fn app_version_max(mut self, max: VersionMatch) -> Self {
        self.app_version.max = max;
        self
    }
}

/// A choice-option relabel rule: matched against the owning knob's name
/// via `matches` and against the persisted option label via `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnobChoiceOptionFilter {
    /// Match groups over the owning knob's name. Empty = any knob.
    #[serde(default)]
    pub matches: Vec<KnobMatch>,

    /// Patterns over the persisted option label.
    pub options: Vec<NamePattern>,

    /// The label that replaces a matched legacy option.
    pub replacement: String,

    #[serde(default)]
    pub app_version: VersionRange,
}

/// Immutable, ordered rule tables.
///
/// The table is constructed once and never mutated afterwards, so it is
/// safe to share between concurrent readers without locking. Prefer
/// passing a table explicitly (deterministic tests, host-specific
/// rules); [`CompatibilityRules::builtin`] provides the process-wide
/// default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityRules {
    #[serde(default, rename = "name_filter")]
    pub name_filters: Vec<KnobNameFilter>,
    #[serde(default, rename = "choice_option_filter")]
    pub choice_option_filters: Vec<KnobChoiceOptionFilter>,
}

impl CompatibilityRules {
    /// An empty table that never rewrites anything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in rule table, constructed on first use and read-only
    /// thereafter.
    pub fn builtin() -> &'static CompatibilityRules {
        static BUILTIN: OnceLock<CompatibilityRules> = OnceLock::new();
        BUILTIN.get_or_init(builtin_rules)
    }

    /// Parse a rule table from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let rules: CompatibilityRules =
            toml::from_str(text).map_err(|e| KnobLinkError::Config(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load a rule table from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.name_filters.iter().any(|f| f.replacement.is_empty())
            || self.choice_option_filters.iter().any(|f| f.replacement.is_empty())
        {
            return Err(KnobLinkError::Config(
                "rule with empty replacement name".to_string(),
            ));
        }
        Ok(())
    }

    /// Translate a legacy knob name to its canonical current name.
    ///
    /// `name` is rewritten in place when the first applicable rule (in
    /// declaration order) matches; the return value tells whether a
    /// rewrite occurred. Version arguments use -1 for "unknown", which
    /// disables the corresponding window checks.
    #[allow(clippy::too_many_arguments)]
    pub fn filter_knob_name_compat(
        &self,
        plugin_id: &str,
        plugin_version_major: i32,
        plugin_version_minor: i32,
        app_version_major: i32,
        app_version_minor: i32,
        app_version_rev: i32,
        name: &mut String,
    ) -> bool {
        for filter in &self.name_filters {
            debug_assert!(!filter.replacement.is_empty());
            if filter_applies(
                &filter.matches,
                &filter.app_version,
                plugin_id,
                plugin_version_major,
                plugin_version_minor,
                app_version_major,
                app_version_minor,
                app_version_rev,
                name,
            ) {
                *name = filter.replacement.clone();
                return true;
            }
        }
        false
    }

    /// Translate a legacy choice option label of the knob named
    /// `knob_name` to its canonical current label. Same ordering and
    /// windowing semantics as [`Self::filter_knob_name_compat`].
    #[allow(clippy::too_many_arguments)]
    pub fn filter_knob_choice_option_compat(
        &self,
        plugin_id: &str,
        plugin_version_major: i32,
        plugin_version_minor: i32,
        app_version_major: i32,
        app_version_minor: i32,
        app_version_rev: i32,
        knob_name: &str,
        option: &mut String,
    ) -> bool {
        for filter in &self.choice_option_filters {
            debug_assert!(!filter.replacement.is_empty());
            if !filter_applies(
                &filter.matches,
                &filter.app_version,
                plugin_id,
                plugin_version_major,
                plugin_version_minor,
                app_version_major,
                app_version_minor,
                app_version_rev,
                knob_name,
            ) {
                continue;
            }
            if filter.options.iter().any(|p| p.matches(option)) {
                *option = filter.replacement.clone();
                return true;
            }
        }
        false
    }
}

/// Evaluate the shared applicability conditions of a rule: application
/// version window, plugin scoping, then the name pattern.
///
/// A match group whose plugin identifier matches but whose plugin
/// version is out of window rejects the whole rule, it does not fall
/// through to the remaining groups.
#[allow(clippy::too_many_arguments)]
fn filter_applies(
    matches: &[KnobMatch],
    app_version: &VersionRange,
    plugin_id: &str,
    plugin_version_major: i32,
    plugin_version_minor: i32,
    app_version_major: i32,
    app_version_minor: i32,
    app_version_rev: i32,
    name: &str,
) -> bool {
    if !app_version.contains(app_version_major, app_version_minor, app_version_rev) {
        return false;
    }

    if matches.is_empty() {
        return true;
    }

    for group in matches {
        if !group.plugins.is_empty() {
            let mut plugin_matched = false;
            for plugin in &group.plugins {
                if !plugin.compare.matches(plugin_id, &plugin.plugin_id) {
                    continue;
                }
                if plugin_version_major != -1
                    && plugin.version_major_min != -1
                    && plugin_version_major < plugin.version_major_min
                {
                    return false;
                }
                if plugin_version_major != -1
                    && plugin.version_major_max != -1
                    && plugin_version_major > plugin.version_major_max
                {
                    return false;
                }
                if plugin_version_minor != -1
                    && plugin.version_minor_min != -1
                    && plugin_version_minor < plugin.version_minor_min
                {
                    return false;
                }
                if plugin_version_minor != -1
                    && plugin.version_minor_max != -1
                    && plugin_version_minor > plugin.version_minor_max
                {
                    return false;
                }
                plugin_matched = true;
                break;
            }
            if !plugin_matched {
                continue;
            }
        }

        if group.name.matches(name) {
            return true;
        }
    }

    false
}

/// Translate a legacy knob name using the built-in rule table.
#[allow(clippy::too_many_arguments)]
pub fn filter_knob_name_compat(
    plugin_id: &str,
    plugin_version_major: i32,
    plugin_version_minor: i32,
    app_version_major: i32,
    app_version_minor: i32,
    app_version_rev: i32,
    name: &mut String,
) -> bool {
    CompatibilityRules::builtin().filter_knob_name_compat(
        plugin_id,
        plugin_version_major,
        plugin_version_minor,
        app_version_major,
        app_version_minor,
        app_version_rev,
        name,
    )
}

/// Translate a legacy choice option label using the built-in rule table.
#[allow(clippy::too_many_arguments)]
pub fn filter_knob_choice_option_compat(
    plugin_id: &str,
    plugin_version_major: i32,
    plugin_version_minor: i32,
    app_version_major: i32,
    app_version_minor: i32,
    app_version_rev: i32,
    knob_name: &str,
    option: &mut String,
) -> bool {
    CompatibilityRules::builtin().filter_knob_choice_option_compat(
        plugin_id,
        plugin_version_major,
        plugin_version_minor,
        app_version_major,
        app_version_minor,
        app_version_rev,
        knob_name,
        option,
    )
}

/// The sunset renames of the historical channel-process knob names,
/// applicable to projects saved by application major versions up to 1.
fn builtin_rules() -> CompatibilityRules {
    let channel_renames = [
        (PROCESS_RED, "r", "doRed"),
        (PROCESS_GREEN, "g", "doGreen"),
        (PROCESS_BLUE, "b", "doBlue"),
        (PROCESS_ALPHA, "a", "doAlpha"),
    ];

    let name_filters = channel_renames
        .into_iter()
        .map(|(replacement, short, long)| {
            KnobNameFilter::new(replacement)
                .match_name(NamePattern::exact(short))
                .match_name(NamePattern::exact(long))
                .app_version_max(VersionMatch::major(1))
        })
        .collect();

    CompatibilityRules {
        name_filters,
        choice_option_filters: Vec::new(),
    }
}
