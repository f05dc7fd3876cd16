//! Expression engine seam
//!
//! Knob expressions are persisted as text and re-installed after a
//! project load. The actual evaluation engine belongs to the host
//! application; this module defines the seam ([`ExpressionEngine`]) plus
//! a Rhai-backed implementation used as the default validator.

mod engine;

pub use engine::{NullExpressionEngine, RhaiExpressionEngine};

use crate::error::Result;

/// Validates expression text before it is attached to a knob dimension.
///
/// `has_ret_var` distinguishes the two persisted expression flavors: a
/// multi-statement script that assigns the `ret` variable, versus a bare
/// single expression whose value is the result.
#[cfg_attr(test, mockall::automock)]
pub trait ExpressionEngine: Send + Sync {
    /// Check that `expr` is syntactically acceptable to the engine.
    /// A rejected expression must not be installed on a knob.
    fn validate(&self, expr: &str, has_ret_var: bool) -> Result<()>;
}
