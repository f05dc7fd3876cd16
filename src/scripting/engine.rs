//! Rhai-backed expression validation
//!
//! Expressions attached to knob dimensions are short numeric snippets
//! (`curve(frame) * 0.5`, `lerp(a, b, frame / 100.0)`, ...). Before a
//! restored expression is accepted onto a live knob it is compiled once;
//! a parse failure keeps the dimension expression-free and is reported
//! through the error log sink by the caller.

use crate::error::{KnobLinkError, Result};
use crate::scripting::ExpressionEngine;
use rhai::Engine;

/// Expression validator backed by an embedded Rhai engine.
pub struct RhaiExpressionEngine {
    engine: Engine,
}

impl RhaiExpressionEngine {
    /// Create a new engine with safety limits suitable for untrusted
    /// project files.
    pub fn new() -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine);
        Self { engine }
    }

    fn configure_engine(engine: &mut Engine) {
        // Set safety limits
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(10_000);
        engine.set_max_string_size(10_000);

        // Helpers commonly used by parameter expressions
        engine.register_fn("clamp", |x: f64, min: f64, max: f64| x.clamp(min, max));
        engine.register_fn("lerp", |a: f64, b: f64, t: f64| a + (b - a) * t);
        engine.register_fn("smoothstep", |edge0: f64, edge1: f64, x: f64| {
            let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
            t * t * (3.0 - 2.0 * t)
        });
        engine.register_fn("min", |a: f64, b: f64| a.min(b));
        engine.register_fn("max", |a: f64, b: f64| a.max(b));
    }

    /// Get a reference to the underlying Rhai engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Default for RhaiExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEngine for RhaiExpressionEngine {
    fn validate(&self, expr: &str, has_ret_var: bool) -> Result<()> {
        if has_ret_var {
            // Multi-statement script assigning `ret`
            self.engine
                .compile(expr)
                .map(|_| ())
                .map_err(KnobLinkError::from_rhai_error)
        } else {
            // Bare expression, statements rejected
            self.engine
                .compile_expression(expr)
                .map(|_| ())
                .map_err(KnobLinkError::from_rhai_error)
        }
    }
}

impl std::fmt::Debug for RhaiExpressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhaiExpressionEngine").finish()
    }
}

/// Engine that accepts every expression, for hosts that defer
/// evaluation (and validation) until first use.
#[derive(Debug, Default)]
pub struct NullExpressionEngine;

impl ExpressionEngine for NullExpressionEngine {
    fn validate(&self, _expr: &str, _has_ret_var: bool) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_expression() {
        let engine = RhaiExpressionEngine::new();
        assert!(engine.validate("value * 2.0", false).is_ok());
        assert!(engine.validate("clamp(value, 0.0, 1.0)", false).is_ok());
    }

    #[test]
    fn test_invalid_expression() {
        let engine = RhaiExpressionEngine::new();
        assert!(engine.validate("value * ", false).is_err());
    }

    #[test]
    fn test_ret_var_flavor_allows_statements() {
        let engine = RhaiExpressionEngine::new();
        let script = "let x = 2.0; let ret = x * 3.0;";

        // Statements are only valid in the ret-var flavor
        assert!(engine.validate(script, true).is_ok());
        assert!(engine.validate(script, false).is_err());
    }

    #[test]
    fn test_null_engine_accepts_garbage() {
        let engine = NullExpressionEngine;
        assert!(engine.validate("not even ( close to valid", false).is_ok());
    }
}
