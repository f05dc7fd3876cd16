//! Knob (parameter) model
//!
//! A knob is one parameter of a node: a name, a kind, and one or more
//! dimensions each holding a value, an optional master link and an
//! optional expression. Knobs are shared between the owning node and the
//! serialization layer as [`KnobHandle`]s; back-references (owner, alias
//! target, master target) are weak so the graph stays acyclic for
//! ownership purposes.

use crate::error::{KnobLinkError, Result};
use crate::model::node::{MarkerWeak, NodeWeak};
use crate::scripting::ExpressionEngine;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, Weak};

/// Shared handle to a live knob
pub type KnobHandle = Arc<RwLock<Knob>>;
/// Non-owning handle to a live knob
pub type KnobWeak = Weak<RwLock<Knob>>;

/// Closed set of supported parameter kinds.
///
/// The persisted type name of each kind is matched by exact equality at
/// load time; an unknown name yields no instance and the caller skips
/// the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnobKind {
    Int,
    Bool,
    Double,
    Choice,
    String,
    Color,
    Path,
    File,
    OutputFile,
    Layers,
    Button,
    Separator,
    Group,
    Page,
    Parametric,
}

impl KnobKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [KnobKind; 15] = [
        KnobKind::Int,
        KnobKind::Bool,
        KnobKind::Double,
        KnobKind::Choice,
        KnobKind::String,
        KnobKind::Color,
        KnobKind::Path,
        KnobKind::File,
        KnobKind::OutputFile,
        KnobKind::Layers,
        KnobKind::Button,
        KnobKind::Separator,
        KnobKind::Group,
        KnobKind::Page,
        KnobKind::Parametric,
    ];

    /// The canonical type name written into serialized records.
    pub fn type_name(&self) -> &'static str {
        match self {
            KnobKind::Int => "Int",
            KnobKind::Bool => "Bool",
            KnobKind::Double => "Double",
            KnobKind::Choice => "Choice",
            KnobKind::String => "String",
            KnobKind::Color => "Color",
            KnobKind::Path => "Path",
            KnobKind::File => "File",
            KnobKind::OutputFile => "OutputFile",
            KnobKind::Layers => "Layers",
            KnobKind::Button => "Button",
            KnobKind::Separator => "Separator",
            KnobKind::Group => "Group",
            KnobKind::Page => "Page",
            KnobKind::Parametric => "Parametric",
        }
    }

    /// Exact-match lookup over the closed set. Unknown names return
    /// `None`, never an error.
    pub fn from_type_name(name: &str) -> Option<KnobKind> {
        KnobKind::ALL.iter().copied().find(|k| k.type_name() == name)
    }

    /// Default per-dimension value allocated by [`Knob::populate`].
    fn default_value(&self) -> KnobValue {
        match self {
            KnobKind::Int | KnobKind::Choice => KnobValue::Int(0),
            KnobKind::Bool | KnobKind::Button | KnobKind::Separator | KnobKind::Group | KnobKind::Page => {
                KnobValue::Bool(false)
            }
            KnobKind::Double | KnobKind::Color | KnobKind::Parametric => KnobValue::Double(0.0),
            KnobKind::String
            | KnobKind::Path
            | KnobKind::File
            | KnobKind::OutputFile
            | KnobKind::Layers => KnobValue::String(String::new()),
        }
    }
}

/// A single persisted dimension value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnobValue {
    Int(i64),
    Bool(bool),
    Double(f64),
    String(String),
}

impl Default for KnobValue {
    fn default() -> Self {
        KnobValue::Double(0.0)
    }
}

/// An expression attached to one dimension. `has_ret_var` selects the
/// multi-statement flavor that assigns a `ret` variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub text: String,
    pub has_ret_var: bool,
}

/// A live master link: this dimension follows `master_dimension` of the
/// target knob.
#[derive(Debug, Clone)]
pub struct MasterBinding {
    pub master_dimension: usize,
    pub master: KnobWeak,
}

/// The entity a knob belongs to. Replaces runtime type inspection with a
/// tagged variant: a knob owned by a tracker marker is addressed through
/// the marker's name at restore time, not the node's.
#[derive(Debug, Clone)]
pub enum KnobOwner {
    Node(NodeWeak),
    TrackerMarker(MarkerWeak),
}

#[derive(Debug, Clone, Default)]
struct DimensionState {
    value: KnobValue,
    master: Option<MasterBinding>,
    expression: Option<Expression>,
}

/// A live parameter instance.
#[derive(Debug)]
pub struct Knob {
    name: String,
    kind: KnobKind,
    declared_dimension: usize,
    dimensions: Vec<DimensionState>,
    persistent: bool,
    masters_persistence_ignored: bool,
    owner: Option<KnobOwner>,
    alias: Option<KnobWeak>,
    /// Active option label of a Choice knob, carried alongside the index
    /// so entry reordering between versions can be reconciled.
    choice_active_option: Option<String>,
}

impl Knob {
    /// Create an unbound, unpopulated knob. Call [`Knob::populate`] to
    /// allocate per-dimension storage before use.
    pub fn new(kind: KnobKind, name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            declared_dimension: dimension,
            dimensions: Vec::new(),
            persistent: true,
            masters_persistence_ignored: false,
            owner: None,
            alias: None,
            choice_active_option: None,
        }
    }

    /// Allocate per-dimension storage appropriate to this knob's kind.
    pub fn populate(&mut self) {
        self.dimensions = (0..self.declared_dimension)
            .map(|_| DimensionState {
                value: self.kind.default_value(),
                master: None,
                expression: None,
            })
            .collect();
    }

    /// Wrap a populated knob into a shared handle.
    pub fn into_handle(mut self) -> KnobHandle {
        if self.dimensions.len() != self.declared_dimension {
            self.populate();
        }
        Arc::new(RwLock::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> KnobKind {
        self.kind
    }

    pub fn dimension(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// When set, master links of this knob are not written into
    /// serialization records.
    pub fn is_masters_persistence_ignored(&self) -> bool {
        self.masters_persistence_ignored
    }

    pub fn set_masters_persistence_ignored(&mut self, ignored: bool) {
        self.masters_persistence_ignored = ignored;
    }

    pub fn owner(&self) -> Option<&KnobOwner> {
        self.owner.as_ref()
    }

    pub fn set_owner(&mut self, owner: KnobOwner) {
        self.owner = Some(owner);
    }

    pub fn value(&self, dimension: usize) -> Option<&KnobValue> {
        self.dimensions.get(dimension).map(|d| &d.value)
    }

    pub fn set_value(&mut self, dimension: usize, value: KnobValue) -> Result<()> {
        let dim = self.dimension_state_mut(dimension)?;
        dim.value = value;
        Ok(())
    }

    /// Current master link of a dimension, if any.
    pub fn master(&self, dimension: usize) -> Option<MasterBinding> {
        self.dimensions.get(dimension).and_then(|d| d.master.clone())
    }

    /// Slave `dimension` of this knob to `master_dimension` of `master`.
    pub fn slave_to(&mut self, dimension: usize, master: &KnobHandle, master_dimension: usize) -> Result<()> {
        let dim = self.dimension_state_mut(dimension)?;
        dim.master = Some(MasterBinding {
            master_dimension,
            master: Arc::downgrade(master),
        });
        Ok(())
    }

    pub fn unslave(&mut self, dimension: usize) -> Result<()> {
        let dim = self.dimension_state_mut(dimension)?;
        dim.master = None;
        Ok(())
    }

    /// Bind this knob as a transparent alias of `target`. The alias
    /// covers the whole knob, not a single dimension.
    pub fn set_alias_of(&mut self, target: &KnobHandle) {
        self.alias = Some(Arc::downgrade(target));
    }

    pub fn alias(&self) -> Option<KnobHandle> {
        self.alias.as_ref().and_then(|a| a.upgrade())
    }

    pub fn has_alias(&self) -> bool {
        self.alias.is_some()
    }

    pub fn expression(&self, dimension: usize) -> Option<&Expression> {
        self.dimensions.get(dimension).and_then(|d| d.expression.as_ref())
    }

    /// Attach raw expression text without validation. Save-side setup;
    /// restoration goes through [`Knob::restore_expression`].
    pub fn set_expression(&mut self, dimension: usize, text: impl Into<String>, has_ret_var: bool) -> Result<()> {
        let dim = self.dimension_state_mut(dimension)?;
        dim.expression = Some(Expression {
            text: text.into(),
            has_ret_var,
        });
        Ok(())
    }

    /// Validate `text` against the expression engine, then install it on
    /// `dimension`. On rejection the dimension is left expression-free.
    pub fn restore_expression(
        &mut self,
        dimension: usize,
        text: &str,
        has_ret_var: bool,
        engine: &dyn ExpressionEngine,
    ) -> Result<()> {
        engine.validate(text, has_ret_var)?;
        self.set_expression(dimension, text, has_ret_var)
    }

    pub fn clear_expression(&mut self, dimension: usize) -> Result<()> {
        let dim = self.dimension_state_mut(dimension)?;
        dim.expression = None;
        Ok(())
    }

    pub fn choice_active_option(&self) -> Option<&str> {
        self.choice_active_option.as_deref()
    }

    pub fn set_choice_active_option(&mut self, label: impl Into<String>) {
        self.choice_active_option = Some(label.into());
    }

    fn dimension_state_mut(&mut self, dimension: usize) -> Result<&mut DimensionState> {
        let count = self.dimensions.len();
        self.dimensions.get_mut(dimension).ok_or_else(|| {
            KnobLinkError::Model(format!(
                "dimension {dimension} out of range for knob with {count} dimensions"
            ))
        })
    }
}
