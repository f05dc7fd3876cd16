//! Error log sink for restoration diagnostics
//!
//! Link and expression restoration never abort a project load; instead
//! every failure is routed to an [`ErrorLogSink`] together with the name
//! of the affected knob and a timestamp. The host application decides
//! where the entries end up (status bar, log panel, file).

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Destination for restoration diagnostics.
///
/// Implementations must be safe to call from the restoration pass and
/// must never block on the caller's behalf.
pub trait ErrorLogSink: Send + Sync {
    /// Record one diagnostic entry. `identifier` names the knob (or other
    /// entity) the message is about.
    fn log_error(&self, identifier: &str, timestamp: DateTime<Utc>, message: &str);
}

/// Sink that forwards entries to the `tracing` infrastructure.
#[derive(Debug, Default)]
pub struct TracingLogSink;

impl ErrorLogSink for TracingLogSink {
    fn log_error(&self, identifier: &str, timestamp: DateTime<Utc>, message: &str) {
        tracing::warn!(
            identifier = %identifier,
            timestamp = %timestamp.to_rfc3339(),
            "{message}"
        );
    }
}

/// One buffered diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub identifier: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Sink that buffers entries in memory, mainly for tests and for hosts
/// that surface load diagnostics in a dialog after the load finishes.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries recorded so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }
}

impl ErrorLogSink for MemoryLogSink {
    fn log_error(&self, identifier: &str, timestamp: DateTime<Utc>, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                identifier: identifier.to_string(),
                timestamp,
                message: message.to_string(),
            });
        }
    }
}
