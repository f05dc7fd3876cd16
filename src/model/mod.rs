//! Live-graph model: knobs, nodes and tracker markers
//!
//! These are the collaborators the persistence engine operates on. The
//! serialization layer holds only names and weak references into this
//! model; it never owns graph objects.

mod knob;
mod node;

pub use knob::{
    Expression, Knob, KnobHandle, KnobKind, KnobOwner, KnobValue, KnobWeak, MasterBinding,
};
pub use node::{
    attach_knob, attach_marker_knob, find_node_by_script_name, MarkerHandle, MarkerWeak, Node,
    NodeHandle, NodeWeak, TrackMarker, TrackerContext,
};
