use core::time::Duration;
use docket::{Error, Monitor, Operation};

/// Reports allocator operations as `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingMonitor;

impl Monitor for TracingMonitor {
    fn success(&self, op: Operation, elapsed: Duration) {
        tracing::debug!(%op, elapsed_us = elapsed.as_micros() as u64, "operation succeeded");
    }

    fn failure(&self, op: Operation, elapsed: Duration, error: &Error) {
        tracing::warn!(
            %op,
            elapsed_us = elapsed.as_micros() as u64,
            %error,
            "operation failed"
        );
    }
}
