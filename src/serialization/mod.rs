//! Persisted knob records, capture, factory and restoration
//!
//! Save side: [`KnobSerialization::capture`] snapshots a live knob into
//! plain-data records. Load side: [`create_knob`] rebuilds a typed
//! instance from the recorded type name, then once the whole graph is
//! up, `restore_knob_links`/`restore_expressions` re-attach the saved
//! references.

mod factory;
mod knob;
mod restore;
mod value;

pub use factory::create_knob;
pub use knob::KnobSerialization;
pub use restore::{find_master, NameMapping};
pub use value::{MasterSerialization, ValueSerialization, NO_MASTER};
