//! Per-knob serialization record
//!
//! A [`KnobSerialization`] is the persisted form of one knob: its name,
//! type name, dimension count and one [`ValueSerialization`] per
//! dimension. The record carries no live handles across a save/load
//! cycle; link restoration re-resolves the recorded names against the
//! reconstructed graph (see the `restore` module).

use crate::error::{KnobLinkError, Result};
use crate::model::KnobHandle;
use crate::serialization::value::{MasterSerialization, ValueSerialization};
use serde::{Deserialize, Serialize};

/// Persisted record for one knob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnobSerialization {
    pub name: String,

    /// Type name consumed by the factory at load time.
    pub type_name: String,

    /// Dimension count at save time. The live knob reconstructed at
    /// load time may have a different count; restoration only touches
    /// the dimensions both sides share.
    pub dimension: usize,

    /// When set, the first value's master entry names the alias target
    /// of the whole knob instead of a per-dimension master.
    #[serde(default)]
    pub master_is_alias: bool,

    pub values: Vec<ValueSerialization>,

    /// Active option label of a Choice knob, recorded so the index can
    /// be reconciled when entries were reordered between versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_extra_string: Option<String>,
}

impl KnobSerialization {
    /// Capture a live knob into a record.
    pub fn capture(knob: &KnobHandle) -> Result<Self> {
        let (name, type_name, dimension, alias, choice_extra_string) = {
            let guard = knob.read().map_err(|e| KnobLinkError::Lock(e.to_string()))?;
            (
                guard.name().to_string(),
                guard.kind().type_name().to_string(),
                guard.dimension(),
                guard.alias(),
                guard.choice_active_option().map(str::to_string),
            )
        };

        let mut values = Vec::with_capacity(dimension);
        for dim in 0..dimension {
            let (expression, has_ret_var) = knob
                .read()
                .ok()
                .and_then(|k| k.expression(dim).cloned())
                .map(|e| (e.text, e.has_ret_var))
                .unwrap_or_default();
            values.push(ValueSerialization::init_for_save(knob, dim, has_ret_var, &expression));
        }

        let master_is_alias = alias.is_some();
        if let Some(target) = alias {
            // The alias covers the whole knob; only the first entry is
            // meaningful in alias mode.
            if let Some(first) = values.first_mut() {
                first.master = MasterSerialization::capture_alias(&target);
            }
        }

        Ok(Self {
            name,
            type_name,
            dimension,
            master_is_alias,
            values,
            choice_extra_string,
        })
    }

    /// Rebind a freshly deserialized record to the live knob created
    /// for it.
    pub fn bind_to(&mut self, knob: &KnobHandle) {
        for (dim, value) in self.values.iter_mut().enumerate() {
            value.init_for_load(knob, dim);
        }
    }

    /// Record the active option label of a Choice knob.
    pub fn set_choice_extra_string(&mut self, label: impl Into<String>) {
        self.choice_extra_string = Some(label.into());
    }
}
