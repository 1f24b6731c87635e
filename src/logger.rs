//! Narration sink for store operations.
//!
//! The store reports what it does through a [`Logger`] instead of printing.
//! [`TracingLogger`] forwards to `tracing`; [`MemoryLogger`] keeps entries in
//! memory so tests can assert on them.

use crate::types::Severity;
use parking_lot::Mutex;

/// Receives `(severity, message)` pairs from a store.
pub trait Logger: Send + Sync {
    fn log(&self, severity: Severity, message: &str);
}

/// Forwards messages to `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, severity: Severity, message: &str) {
        let tag = severity.as_str();
        match severity {
            Severity::Fatal => tracing::error!(severity = tag, "{}", message),
            Severity::Warn => tracing::warn!(severity = tag, "{}", message),
            Severity::Info | Severity::Success => tracing::info!(severity = tag, "{}", message),
            Severity::Wait => tracing::debug!(severity = tag, "{}", message),
        }
    }
}

/// Captures every message in order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured entries.
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().clone()
    }

    /// Messages logged at `severity`.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.lock().iter().filter(|(s, _)| *s == severity).count()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, severity: Severity, message: &str) {
        self.entries.lock().push((severity, message.to_string()));
    }
}
