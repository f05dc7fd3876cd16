//! Post-load link and expression restoration
//!
//! Master links, aliases and expressions are saved as textual
//! references. After the whole project graph has been rebuilt they are
//! re-resolved here against the fresh node list. Copy/paste renames
//! nodes to avoid script-name collisions, so an old→new name map is
//! consulted before lookup (and substituted into expression text).
//!
//! Nothing in this pass may abort a project load: an unresolved
//! reference or a rejected expression degrades to a diagnostic, the
//! link stays absent and restoration moves on.

use crate::error::{KnobLinkError, Result};
use crate::log::ErrorLogSink;
use crate::model::{find_node_by_script_name, KnobHandle, NodeHandle};
use crate::scripting::ExpressionEngine;
use crate::serialization::knob::KnobSerialization;
use chrono::Utc;
use std::collections::BTreeMap;

/// Old→new script-name remapping, populated by the caller when nodes
/// were renamed during load (copy/paste collision avoidance). Ordered
/// so expression substitution is deterministic.
pub type NameMapping = BTreeMap<String, String>;

/// Locate the live knob a saved master reference points at.
///
/// The saved node name is first remapped through `old_new_names`, then
/// resolved by exact script-name scan over `all_nodes`. When a tracker
/// marker name was recorded the knob is looked up inside the marker's
/// own knob set, never the node's. Plain node references only see
/// persistent knobs. Unresolved references yield `None` and a
/// diagnostic; they are never an error.
pub fn find_master(
    knob_name: &str,
    all_nodes: &[NodeHandle],
    master_knob_name: &str,
    master_node_name: &str,
    master_track_name: Option<&str>,
    old_new_names: &NameMapping,
) -> Option<KnobHandle> {
    let node_name_to_find = old_new_names
        .get(master_node_name)
        .map(String::as_str)
        .unwrap_or(master_node_name);

    let Some(master_node) = find_node_by_script_name(all_nodes, node_name_to_find) else {
        tracing::warn!(
            knob = %knob_name,
            node = %node_name_to_find,
            "Link slave/master failed to restore the following linkage"
        );
        return None;
    };

    if let Some(track_name) = master_track_name.filter(|t| !t.is_empty()) {
        if let Ok(node) = master_node.read() {
            if let Some(tracker) = node.tracker() {
                if let Some(marker) = tracker.marker_by_name(track_name) {
                    if let Ok(marker) = marker.read() {
                        if let Some(knob) = marker.knob_by_name(master_knob_name) {
                            return Some(knob);
                        }
                    }
                }
            }
        }
    } else if let Ok(node) = master_node.read() {
        for other in node.knobs() {
            if let Ok(k) = other.read() {
                if k.name() == master_knob_name && k.is_persistent() {
                    return Some(other.clone());
                }
            }
        }
    }

    tracing::warn!(
        knob = %knob_name,
        node = %node_name_to_find,
        master_knob = %master_knob_name,
        "Link slave/master failed to restore the following linkage"
    );
    None
}

impl KnobSerialization {
    /// Re-establish master/alias links of `knob` against the rebuilt
    /// node list.
    ///
    /// In alias mode only the first recorded entry is meaningful and
    /// binds the whole knob; otherwise every dimension with a recorded
    /// master (non-sentinel) is slaved individually. Unresolved
    /// references are skipped.
    pub fn restore_knob_links(
        &self,
        knob: &KnobHandle,
        all_nodes: &[NodeHandle],
        old_new_names: &NameMapping,
    ) -> Result<()> {
        let knob_name = knob
            .read()
            .map_err(|e| KnobLinkError::Lock(e.to_string()))?
            .name()
            .to_string();

        if self.master_is_alias {
            // values can be empty, for example when a group was expanded
            // and the slaved knobs are no longer slaves
            if let Some(first) = self.values.first() {
                let m = &first.master;
                if let Some(alias) = find_master(
                    &knob_name,
                    all_nodes,
                    &m.master_knob_name,
                    &m.master_node_name,
                    m.master_track_name.as_deref(),
                    old_new_names,
                ) {
                    knob.write()
                        .map_err(|e| KnobLinkError::Lock(e.to_string()))?
                        .set_alias_of(&alias);
                }
            }
        } else {
            for (dim, value) in self.values.iter().enumerate() {
                let m = &value.master;
                if !m.has_master() {
                    continue;
                }
                let Some(master) = find_master(
                    &knob_name,
                    all_nodes,
                    &m.master_knob_name,
                    &m.master_node_name,
                    m.master_track_name.as_deref(),
                    old_new_names,
                ) else {
                    continue;
                };
                let slaved = knob
                    .write()
                    .map_err(|e| KnobLinkError::Lock(e.to_string()))?
                    .slave_to(dim, &master, m.master_dimension as usize);
                if let Err(e) = slaved {
                    tracing::warn!(knob = %knob_name, dimension = dim, error = %e,
                        "Skipping master link on out-of-range dimension");
                }
            }
        }

        Ok(())
    }

    /// Re-install recorded expressions onto the live knob.
    ///
    /// Only the dimensions both the record and the live knob share are
    /// visited. Every old name in the remap table is substituted into
    /// the expression text before installation; the substitution is
    /// plain (not token-aware), so an old name that happens to be a
    /// substring of an unrelated identifier is rewritten too.
    ///
    /// An expression the engine rejects is logged to `log` with the
    /// knob's name and a timestamp; later dimensions are still visited.
    pub fn restore_expressions(
        &self,
        live_knob: &KnobHandle,
        old_new_names: &NameMapping,
        engine: &dyn ExpressionEngine,
        log: &dyn ErrorLogSink,
    ) -> Result<()> {
        let (live_dims, knob_name) = {
            let guard = live_knob
                .read()
                .map_err(|e| KnobLinkError::Lock(e.to_string()))?;
            (guard.dimension(), guard.name().to_string())
        };
        let dims = live_dims.min(self.dimension).min(self.values.len());

        for value in self.values.iter().take(dims) {
            if value.expression.is_empty() {
                continue;
            }

            let mut expr = value.expression.clone();
            for (old, new) in old_new_names {
                expr = expr.replace(old.as_str(), new.as_str());
            }

            let installed = live_knob
                .write()
                .map_err(|e| KnobLinkError::Lock(e.to_string()))?
                .restore_expression(value.dimension, &expr, value.expr_has_ret_var, engine);
            if let Err(e) = installed {
                log.log_error(
                    &knob_name,
                    Utc::now(),
                    &format!("Failed to restore expression: {e}"),
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLogSink;
    use crate::model::{attach_knob, attach_marker_knob, Knob, KnobKind, Node, TrackMarker};
    use crate::scripting::{MockExpressionEngine, NullExpressionEngine, RhaiExpressionEngine};
    use crate::serialization::value::{MasterSerialization, ValueSerialization};

    fn make_knob(node: &NodeHandle, name: &str, dims: usize) -> KnobHandle {
        let knob = Knob::new(KnobKind::Double, name, dims).into_handle();
        attach_knob(node, knob.clone());
        knob
    }

    fn record_with_masters(dims: usize, masters: Vec<(usize, MasterSerialization)>) -> KnobSerialization {
        let mut values: Vec<ValueSerialization> = (0..dims).map(ValueSerialization::new).collect();
        for (dim, master) in masters {
            values[dim].master = master;
        }
        KnobSerialization {
            name: "mix".to_string(),
            type_name: "Double".to_string(),
            dimension: dims,
            master_is_alias: false,
            values,
            choice_extra_string: None,
        }
    }

    fn master_ref(node: &str, knob: &str, dimension: i32) -> MasterSerialization {
        MasterSerialization {
            master_dimension: dimension,
            master_node_name: node.to_string(),
            master_knob_name: knob.to_string(),
            master_track_name: None,
        }
    }

    #[test]
    fn test_find_master_via_remap_table() {
        let node = Node::create("Blur2");
        let size = make_knob(&node, "size", 1);
        let nodes = vec![node];

        let mut map = NameMapping::new();
        map.insert("Blur1".to_string(), "Blur2".to_string());

        // "Blur1" only exists through the remap table
        let found = find_master("mix", &nodes, "size", "Blur1", None, &map).unwrap();
        assert!(std::sync::Arc::ptr_eq(&found, &size));

        let empty = NameMapping::new();
        assert!(find_master("mix", &nodes, "size", "Blur1", None, &empty).is_none());
    }

    #[test]
    fn test_find_master_skips_non_persistent() {
        let node = Node::create("Grade1");
        let hidden = make_knob(&node, "gain", 1);
        hidden.write().unwrap().set_persistent(false);
        let visible = make_knob(&node, "gain", 1);
        let nodes = vec![node];

        let found = find_master("mix", &nodes, "gain", "Grade1", None, &NameMapping::new()).unwrap();
        assert!(std::sync::Arc::ptr_eq(&found, &visible));
    }

    #[test]
    fn test_find_master_prefers_marker_knob_set() {
        let node = Node::create("Tracker1");
        // same-named knob on the node itself must be ignored
        let node_center = make_knob(&node, "center", 2);
        let marker = TrackMarker::create("track1", &node);
        let marker_center = Knob::new(KnobKind::Double, "center", 2).into_handle();
        attach_marker_knob(&marker, marker_center.clone());
        let nodes = vec![node];

        let found = find_master(
            "to1",
            &nodes,
            "center",
            "Tracker1",
            Some("track1"),
            &NameMapping::new(),
        )
        .unwrap();
        assert!(std::sync::Arc::ptr_eq(&found, &marker_center));
        assert!(!std::sync::Arc::ptr_eq(&found, &node_center));

        // missing marker is unresolved, no fallback to the node's knobs
        assert!(find_master(
            "to1",
            &nodes,
            "center",
            "Tracker1",
            Some("track9"),
            &NameMapping::new()
        )
        .is_none());
    }

    #[test]
    fn test_restore_links_per_dimension_sentinels() {
        let master_node = Node::create("Grade1");
        let master = make_knob(&master_node, "gain", 3);
        let slave_node = Node::create("Grade2");
        let knob = make_knob(&slave_node, "mix", 3);
        let nodes = vec![master_node, slave_node];

        // masters recorded for dimensions 0 and 2 only
        let record = record_with_masters(
            3,
            vec![
                (0, master_ref("Grade1", "gain", 1)),
                (2, master_ref("Grade1", "gain", 0)),
            ],
        );
        record.restore_knob_links(&knob, &nodes, &NameMapping::new()).unwrap();

        let knob = knob.read().unwrap();
        assert_eq!(knob.master(0).unwrap().master_dimension, 1);
        assert!(knob.master(1).is_none());
        assert_eq!(knob.master(2).unwrap().master_dimension, 0);
        assert!(std::sync::Arc::ptr_eq(&knob.master(0).unwrap().master.upgrade().unwrap(), &master));
    }

    #[test]
    fn test_restore_links_unresolved_is_skipped() {
        let slave_node = Node::create("Grade2");
        let knob = make_knob(&slave_node, "mix", 1);
        let nodes = vec![slave_node];

        let record = record_with_masters(1, vec![(0, master_ref("Ghost1", "gain", 0))]);
        // must not error out, the link just stays absent
        record.restore_knob_links(&knob, &nodes, &NameMapping::new()).unwrap();
        assert!(knob.read().unwrap().master(0).is_none());
    }

    #[test]
    fn test_restore_links_alias_mode() {
        let group = Node::create("Group1");
        let target = make_knob(&group, "size", 2);
        let node = Node::create("Blur1");
        let knob = make_knob(&node, "sizeAlias", 2);
        let nodes = vec![group, node];

        let mut record = record_with_masters(
            2,
            vec![
                (0, master_ref("Group1", "size", 0)),
                // a second entry must be ignored in alias mode
                (1, master_ref("Ghost1", "nothing", 0)),
            ],
        );
        record.master_is_alias = true;
        record.restore_knob_links(&knob, &nodes, &NameMapping::new()).unwrap();

        let knob = knob.read().unwrap();
        assert!(std::sync::Arc::ptr_eq(&knob.alias().unwrap(), &target));
        assert!(knob.master(1).is_none());
    }

    #[test]
    fn test_restore_expressions_rewrites_every_map_entry() {
        let node = Node::create("Blur1");
        let knob = make_knob(&node, "size", 1);

        let mut record = record_with_masters(1, Vec::new());
        record.values[0].expression = "Blur1.size + Tracker1.center".to_string();

        let mut map = NameMapping::new();
        map.insert("Blur1".to_string(), "Blur3".to_string());
        map.insert("Tracker1".to_string(), "Tracker2".to_string());

        record
            .restore_expressions(&knob, &map, &NullExpressionEngine, &MemoryLogSink::new())
            .unwrap();

        let expr = knob.read().unwrap().expression(0).cloned().unwrap();
        assert_eq!(expr.text, "Blur3.size + Tracker2.center");
    }

    #[test]
    fn test_restore_expressions_dimension_mismatch() {
        let node = Node::create("Blur1");
        // saved with 3 dimensions, live knob only has 2
        let knob = make_knob(&node, "size", 2);

        let mut record = record_with_masters(3, Vec::new());
        for value in &mut record.values {
            value.expression = "value * 2.0".to_string();
        }

        let mut engine = MockExpressionEngine::new();
        engine.expect_validate().times(2).returning(|_, _| Ok(()));
        record
            .restore_expressions(&knob, &NameMapping::new(), &engine, &MemoryLogSink::new())
            .unwrap();

        let knob = knob.read().unwrap();
        assert!(knob.expression(0).is_some());
        assert!(knob.expression(1).is_some());
    }

    #[test]
    fn test_restore_expressions_failure_logged_and_isolated() {
        let node = Node::create("Blur1");
        let knob = make_knob(&node, "size", 2);

        let mut record = record_with_masters(2, Vec::new());
        record.values[0].expression = "value * ".to_string(); // broken
        record.values[1].expression = "value * 2.0".to_string();

        let sink = MemoryLogSink::new();
        record
            .restore_expressions(&knob, &NameMapping::new(), &RhaiExpressionEngine::new(), &sink)
            .unwrap();

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].identifier, "size");
        assert!(entries[0].message.contains("Failed to restore expression"));

        // the broken dimension stays expression-free, the next one went through
        let knob = knob.read().unwrap();
        assert!(knob.expression(0).is_none());
        assert!(knob.expression(1).is_some());
    }
}
