//! Knob factory for load-time reconstruction
//!
//! Records carry the knob's type name as a string; the factory maps it
//! back to a live instance. Unknown names are not an error: the caller
//! skips records whose type this build does not support.

use crate::model::{Knob, KnobHandle, KnobKind};

/// Create an unbound, populated knob of the given persisted type name
/// and dimension count. Returns `None` for unsupported type names.
pub fn create_knob(type_name: &str, dimension: usize) -> Option<KnobHandle> {
    let kind = KnobKind::from_type_name(type_name)?;
    let mut knob = Knob::new(kind, String::new(), dimension);
    knob.populate();
    Some(knob.into_handle())
}
