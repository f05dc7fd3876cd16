//! Cross-version and cross-plugin compatibility shims
//!
//! Rule-based renaming of legacy knob names and choice option labels,
//! gated on plugin identity/version and host-application version.

mod matchers;
mod rules;
mod version;

pub use matchers::{MatchKind, NamePattern};
pub use rules::{
    filter_knob_choice_option_compat, filter_knob_name_compat, CompatibilityRules,
    KnobChoiceOptionFilter, KnobMatch, KnobNameFilter, PluginMatch, PROCESS_ALPHA, PROCESS_BLUE,
    PROCESS_GREEN, PROCESS_RED,
};
pub use version::{VersionMatch, VersionRange};
