//! Node and tracker model
//!
//! A node owns an ordered list of knobs and, for tracker nodes, a
//! tracking context whose markers carry their own knob sets. Link
//! restoration addresses everything by script name: nodes inside the
//! project, markers inside a node's tracking context, knobs inside
//! either.

use crate::model::knob::{KnobHandle, KnobOwner};
use std::sync::{Arc, RwLock, Weak};

/// Shared handle to a live node
pub type NodeHandle = Arc<RwLock<Node>>;
/// Non-owning handle to a live node
pub type NodeWeak = Weak<RwLock<Node>>;
/// Shared handle to a tracker marker
pub type MarkerHandle = Arc<RwLock<TrackMarker>>;
/// Non-owning handle to a tracker marker
pub type MarkerWeak = Weak<RwLock<TrackMarker>>;

/// One node of the project graph.
#[derive(Debug)]
pub struct Node {
    script_name: String,
    knobs: Vec<KnobHandle>,
    tracker: Option<TrackerContext>,
}

impl Node {
    /// Create a node and wrap it into a shared handle.
    pub fn create(script_name: impl Into<String>) -> NodeHandle {
        Arc::new(RwLock::new(Node {
            script_name: script_name.into(),
            knobs: Vec::new(),
            tracker: None,
        }))
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    pub fn set_script_name(&mut self, name: impl Into<String>) {
        self.script_name = name.into();
    }

    pub fn knobs(&self) -> &[KnobHandle] {
        &self.knobs
    }

    /// First knob whose name matches, regardless of persistence.
    pub fn knob_by_name(&self, name: &str) -> Option<KnobHandle> {
        self.knobs
            .iter()
            .find(|k| k.read().map(|k| k.name() == name).unwrap_or(false))
            .cloned()
    }

    pub fn tracker(&self) -> Option<&TrackerContext> {
        self.tracker.as_ref()
    }

    pub fn tracker_mut(&mut self) -> &mut TrackerContext {
        self.tracker.get_or_insert_with(TrackerContext::default)
    }
}

/// Attach `knob` to `node`, recording the node as its owner.
pub fn attach_knob(node: &NodeHandle, knob: KnobHandle) {
    if let Ok(mut k) = knob.write() {
        k.set_owner(KnobOwner::Node(Arc::downgrade(node)));
    }
    if let Ok(mut n) = node.write() {
        n.knobs.push(knob);
    }
}

/// Tracking context of a tracker node: markers addressed by script name.
#[derive(Debug, Default)]
pub struct TrackerContext {
    markers: Vec<MarkerHandle>,
}

impl TrackerContext {
    pub fn markers(&self) -> &[MarkerHandle] {
        &self.markers
    }

    pub fn marker_by_name(&self, name: &str) -> Option<MarkerHandle> {
        self.markers
            .iter()
            .find(|m| m.read().map(|m| m.script_name() == name).unwrap_or(false))
            .cloned()
    }
}

/// One tracking marker: its own knob set plus a back-reference to the
/// node whose tracking context contains it.
#[derive(Debug)]
pub struct TrackMarker {
    script_name: String,
    knobs: Vec<KnobHandle>,
    node: NodeWeak,
}

impl TrackMarker {
    /// Create a marker inside `node`'s tracking context.
    pub fn create(script_name: impl Into<String>, node: &NodeHandle) -> MarkerHandle {
        let marker = Arc::new(RwLock::new(TrackMarker {
            script_name: script_name.into(),
            knobs: Vec::new(),
            node: Arc::downgrade(node),
        }));
        if let Ok(mut n) = node.write() {
            n.tracker_mut().markers.push(marker.clone());
        }
        marker
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    pub fn knob_by_name(&self, name: &str) -> Option<KnobHandle> {
        self.knobs
            .iter()
            .find(|k| k.read().map(|k| k.name() == name).unwrap_or(false))
            .cloned()
    }

    /// The node owning this marker's tracking context, if still alive.
    pub fn node(&self) -> Option<NodeHandle> {
        self.node.upgrade()
    }
}

/// Attach `knob` to `marker`, recording the marker as its owner.
pub fn attach_marker_knob(marker: &MarkerHandle, knob: KnobHandle) {
    if let Ok(mut k) = knob.write() {
        k.set_owner(KnobOwner::TrackerMarker(Arc::downgrade(marker)));
    }
    if let Ok(mut m) = marker.write() {
        m.knobs.push(knob);
    }
}

/// Linear scan of the full node list for an exact script-name match.
pub fn find_node_by_script_name(all_nodes: &[NodeHandle], script_name: &str) -> Option<NodeHandle> {
    all_nodes
        .iter()
        .find(|n| n.read().map(|n| n.script_name() == script_name).unwrap_or(false))
        .cloned()
}
