//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use knoblink_rs::{ErrorLogSink, KnobLinkError, Result};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing once per test binary, honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Expression engine that rejects everything, for exercising the
/// log-and-continue path.
pub struct RejectingEngine;

impl knoblink_rs::ExpressionEngine for RejectingEngine {
    fn validate(&self, expr: &str, _has_ret_var: bool) -> Result<()> {
        Err(KnobLinkError::Expression(format!("rejected: {expr}")))
    }
}

/// Assert that a sink recorded exactly `count` diagnostics.
pub fn assert_log_count(sink: &knoblink_rs::MemoryLogSink, count: usize) {
    let entries = sink.entries();
    assert_eq!(
        entries.len(),
        count,
        "expected {} log entries, got: {:?}",
        count,
        entries
    );
}

/// A sink that drops everything, for tests that don't inspect logs.
pub struct NullSink;

impl ErrorLogSink for NullSink {
    fn log_error(&self, _identifier: &str, _timestamp: chrono::DateTime<chrono::Utc>, _message: &str) {}
}
