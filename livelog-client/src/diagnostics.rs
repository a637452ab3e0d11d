//! Where non-fatal subscription failures are reported.

use livelog_types::InstanceUuid;
use std::sync::{Arc, Mutex};

/// Receives failures that do not change the subscription status.
pub trait DiagnosticsSink: Send + Sync {
    /// A buffer fetch for `target` failed.
    fn report_fetch_failure(&self, target: &InstanceUuid, error: &str);
}

/// Reports through `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report_fetch_failure(&self, target: &InstanceUuid, error: &str) {
        tracing::error!(instance = %target, %error, "console buffer fetch failed");
    }
}

/// Keeps reports in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemoryDiagnostics {
    reports: Arc<Mutex<Vec<(InstanceUuid, String)>>>,
}

impl MemoryDiagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports so far, oldest first.
    pub fn reports(&self) -> Vec<(InstanceUuid, String)> {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl DiagnosticsSink for MemoryDiagnostics {
    fn report_fetch_failure(&self, target: &InstanceUuid, error: &str) {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((target.clone(), error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_shares_reports_across_clones() {
        let sink = MemoryDiagnostics::new();
        let other = sink.clone();
        other.report_fetch_failure(&InstanceUuid::from("abc"), "boom");

        assert_eq!(
            sink.reports(),
            vec![(InstanceUuid::from("abc"), "boom".to_string())]
        );
    }
}
