//! Per-dimension value serialization
//!
//! At save time each knob dimension is captured into a
//! [`ValueSerialization`]: the raw value, the master-link metadata (as a
//! name triple, since live handles cannot be persisted) and the
//! expression text. Records are immutable once captured and die with
//! the owning knob record.

use crate::model::{KnobHandle, KnobOwner, KnobValue, KnobWeak};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sentinel dimension meaning "no master recorded".
pub const NO_MASTER: i32 = -1;

/// Persisted form of a master link.
///
/// Written at save time, read once during link restoration, never
/// mutated afterwards. A knob owned by a tracker marker is addressed by
/// the marker's name plus the marker's owning node's name; the knob's
/// own node name is not recorded in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSerialization {
    /// Dimension of the master knob this dimension follows, or
    /// [`NO_MASTER`].
    pub master_dimension: i32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub master_node_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub master_knob_name: String,

    /// Set when the master knob belongs to a tracker marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_track_name: Option<String>,
}

impl Default for MasterSerialization {
    fn default() -> Self {
        Self {
            master_dimension: NO_MASTER,
            master_node_name: String::new(),
            master_knob_name: String::new(),
            master_track_name: None,
        }
    }
}

impl MasterSerialization {
    pub fn has_master(&self) -> bool {
        self.master_dimension != NO_MASTER
    }

    /// Record the master link of `dimension` as a name triple. Returns
    /// the no-master sentinel when the target is gone or unnamed.
    fn capture(knob: &KnobHandle, dimension: usize) -> Self {
        let Ok(guard) = knob.read() else {
            return Self::default();
        };

        if guard.is_masters_persistence_ignored() {
            return Self::default();
        }
        let Some(binding) = guard.master(dimension) else {
            return Self::default();
        };
        let Some(master) = binding.master.upgrade() else {
            return Self::default();
        };
        let Ok(master) = master.read() else {
            return Self::default();
        };

        Self::from_target(&master, binding.master_dimension as i32)
    }

    /// Capture a whole-knob alias target (the per-knob alias link is
    /// stored in the first dimension slot of the record).
    pub(crate) fn capture_alias(target: &KnobHandle) -> Self {
        match target.read() {
            Ok(target) => Self::from_target(&target, 0),
            Err(_) => Self::default(),
        }
    }

    /// Resolve the target knob's owner into the persisted name triple.
    fn from_target(target: &crate::model::Knob, master_dimension: i32) -> Self {
        let mut out = MasterSerialization {
            master_dimension,
            master_knob_name: target.name().to_string(),
            ..Self::default()
        };

        match target.owner() {
            Some(KnobOwner::TrackerMarker(marker)) => {
                if let Some(marker) = marker.upgrade() {
                    if let Ok(marker) = marker.read() {
                        out.master_track_name = Some(marker.script_name().to_string());
                        out.master_node_name = marker
                            .node()
                            .and_then(|n| n.read().map(|n| n.script_name().to_string()).ok())
                            .unwrap_or_default();
                    }
                }
            }
            Some(KnobOwner::Node(node)) => {
                out.master_node_name = node
                    .upgrade()
                    .and_then(|n| n.read().map(|n| n.script_name().to_string()).ok())
                    .unwrap_or_default();
            }
            None => {
                // A live master without an owner should not occur;
                // tolerated as an empty node name rather than propagated.
                debug_assert!(false, "master knob has no owner");
            }
        }

        out
    }
}

/// Everything persisted for one (knob, dimension) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueSerialization {
    /// The live knob this record was captured from. Not persisted;
    /// rebound on load so restoration helpers can reach the instance.
    #[serde(skip)]
    knob: Option<KnobWeak>,

    pub dimension: usize,

    #[serde(default)]
    pub value: KnobValue,

    #[serde(default)]
    pub master: MasterSerialization,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expression: String,

    #[serde(default)]
    pub expr_has_ret_var: bool,
}

impl ValueSerialization {
    /// An unbound, empty record for the given dimension index.
    pub fn new(dimension: usize) -> Self {
        Self {
            knob: None,
            dimension,
            value: KnobValue::default(),
            master: MasterSerialization::default(),
            expression: String::new(),
            expr_has_ret_var: false,
        }
    }

    /// Capture one dimension of a live knob for saving.
    ///
    /// The expression text is passed in by the owning record (which
    /// reads it off the knob) so the capture of value and master state
    /// stays in one place.
    pub fn init_for_save(
        knob: &KnobHandle,
        dimension: usize,
        expr_has_ret_var: bool,
        expression: &str,
    ) -> Self {
        let value = knob
            .read()
            .ok()
            .and_then(|k| k.value(dimension).cloned())
            .unwrap_or_default();

        Self {
            knob: Some(Arc::downgrade(knob)),
            dimension,
            value,
            master: MasterSerialization::capture(knob, dimension),
            expression: expression.to_string(),
            expr_has_ret_var,
        }
    }

    /// Bind a deserialized record to the freshly created live knob.
    pub fn init_for_load(&mut self, knob: &KnobHandle, dimension: usize) {
        self.knob = Some(Arc::downgrade(knob));
        self.dimension = dimension;
    }

    /// The live knob this record is bound to, if any.
    pub fn live_knob(&self) -> Option<KnobHandle> {
        self.knob.as_ref().and_then(|k| k.upgrade())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{attach_knob, attach_marker_knob, Knob, KnobKind, Node, TrackMarker};

    #[test]
    fn test_capture_without_master() {
        let node = Node::create("Blur1");
        let knob = Knob::new(KnobKind::Double, "size", 2).into_handle();
        attach_knob(&node, knob.clone());

        let v = ValueSerialization::init_for_save(&knob, 0, false, "");
        assert!(!v.master.has_master());
        assert_eq!(v.master.master_dimension, NO_MASTER);
        assert!(v.live_knob().is_some());
    }

    #[test]
    fn test_capture_node_master() {
        let node = Node::create("Grade1");
        let master = Knob::new(KnobKind::Double, "gain", 1).into_handle();
        attach_knob(&node, master.clone());

        let slave_node = Node::create("Grade2");
        let knob = Knob::new(KnobKind::Double, "gain", 1).into_handle();
        attach_knob(&slave_node, knob.clone());
        knob.write().unwrap().slave_to(0, &master, 0).unwrap();

        let v = ValueSerialization::init_for_save(&knob, 0, false, "");
        assert_eq!(v.master.master_dimension, 0);
        assert_eq!(v.master.master_node_name, "Grade1");
        assert_eq!(v.master.master_knob_name, "gain");
        assert_eq!(v.master.master_track_name, None);
    }

    #[test]
    fn test_capture_marker_master_addresses_marker_not_node() {
        let tracker = Node::create("Tracker1");
        let marker = TrackMarker::create("track3", &tracker);
        let center = Knob::new(KnobKind::Double, "center", 2).into_handle();
        attach_marker_knob(&marker, center.clone());

        let node = Node::create("CornerPin1");
        let knob = Knob::new(KnobKind::Double, "to1", 2).into_handle();
        attach_knob(&node, knob.clone());
        knob.write().unwrap().slave_to(0, &center, 0).unwrap();

        let v = ValueSerialization::init_for_save(&knob, 0, false, "");
        assert_eq!(v.master.master_track_name.as_deref(), Some("track3"));
        assert_eq!(v.master.master_node_name, "Tracker1");
        assert_eq!(v.master.master_knob_name, "center");
    }

    #[test]
    fn test_suppressed_persistence_records_sentinel() {
        let node = Node::create("Grade1");
        let master = Knob::new(KnobKind::Double, "gain", 1).into_handle();
        attach_knob(&node, master.clone());

        let knob = Knob::new(KnobKind::Double, "gain", 1).into_handle();
        attach_knob(&node, knob.clone());
        {
            let mut k = knob.write().unwrap();
            k.set_masters_persistence_ignored(true);
            k.slave_to(0, &master, 0).unwrap();
        }

        let v = ValueSerialization::init_for_save(&knob, 0, false, "");
        assert!(!v.master.has_master());
    }

    #[test]
    fn test_json_round_trip_skips_live_handle() {
        let node = Node::create("Blur1");
        let knob = Knob::new(KnobKind::Double, "size", 1).into_handle();
        attach_knob(&node, knob.clone());
        let v = ValueSerialization::init_for_save(&knob, 0, true, "ret = value * 2.0");

        let json = serde_json::to_string(&v).unwrap();
        let mut back: ValueSerialization = serde_json::from_str(&json).unwrap();
        assert!(back.live_knob().is_none());
        assert_eq!(back.expression, "ret = value * 2.0");
        assert!(back.expr_has_ret_var);

        back.init_for_load(&knob, 0);
        assert!(back.live_knob().is_some());
    }
}
