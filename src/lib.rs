//! # knoblink-rs: parameter persistence for node compositing graphs
//!
//! Persists and restores the parameter ("knob") state of a node-based
//! compositing application, including cross-version compatibility shims
//! and the re-resolution of cross-node links after a load.
//!
//! ## Architecture
//!
//! - **model**: the live graph collaborators (knobs, nodes, tracker
//!   markers) the engine operates on
//! - **serialization**: per-knob records captured at save time, the
//!   load-time knob factory, and the link/expression restoration pass
//! - **compat**: ordered rule tables that rewrite legacy knob names and
//!   choice option labels, gated on plugin and application versions
//! - **scripting**: the expression-engine seam (Rhai-backed by default)
//!   used to validate restored expressions
//! - **log**: the error log sink restoration diagnostics are routed to
//!
//! File-format framing is out of scope: records are plain serde data,
//! and the host decides how they are stored.
//!
//! ## Example
//!
//! ```
//! use knoblink_rs::{
//!     attach_knob, create_knob, CompatibilityRules, Knob, KnobKind, KnobSerialization,
//!     MemoryLogSink, NameMapping, Node, RhaiExpressionEngine,
//! };
//!
//! // Save side: capture a knob into a record.
//! let node = Node::create("Blur1");
//! let size = Knob::new(KnobKind::Double, "size", 2).into_handle();
//! attach_knob(&node, size.clone());
//! let record = KnobSerialization::capture(&size).unwrap();
//!
//! // Load side: translate legacy names, rebuild the knob, restore links.
//! let mut name = record.name.clone();
//! CompatibilityRules::builtin().filter_knob_name_compat("", -1, -1, 2, 0, 0, &mut name);
//! let restored = create_knob(&record.type_name, record.dimension).unwrap();
//! restored.write().unwrap().set_name(name);
//!
//! let all_nodes = vec![node];
//! let engine = RhaiExpressionEngine::new();
//! let log = MemoryLogSink::new();
//! record.restore_knob_links(&restored, &all_nodes, &NameMapping::new()).unwrap();
//! record.restore_expressions(&restored, &NameMapping::new(), &engine, &log).unwrap();
//! ```

pub mod compat;
pub mod error;
pub mod log;
pub mod model;
pub mod scripting;
pub mod serialization;

// Re-export commonly used types
pub use compat::{
    filter_knob_choice_option_compat, filter_knob_name_compat, CompatibilityRules, KnobNameFilter,
    MatchKind, NamePattern, PluginMatch, VersionMatch, VersionRange,
};
pub use error::{KnobLinkError, Result};
pub use log::{ErrorLogSink, MemoryLogSink, TracingLogSink};
pub use model::{
    attach_knob, attach_marker_knob, Knob, KnobHandle, KnobKind, KnobValue, Node, NodeHandle,
    TrackMarker,
};
pub use scripting::{ExpressionEngine, NullExpressionEngine, RhaiExpressionEngine};
pub use serialization::{
    create_knob, find_master, KnobSerialization, MasterSerialization, NameMapping,
    ValueSerialization,
};
