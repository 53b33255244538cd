use core::{fmt, future::Future, time::Duration};
use std::{sync::Arc, time::Instant};

use crate::{Error, Result};

/// The storage-facing operations the allocator reports on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// "Latest case of the year" query.
    WatermarkRefresh,
    /// Point read of one candidate.
    ExistenceCheck,
    /// Count of the year's records.
    GapCheck,
    /// The whole quick probe, spanning its existence checks.
    QuickProbe,
    /// Bulk read of the year's identifiers.
    FullScan,
    /// A full `preview_next_identifier` call.
    Preview,
    /// One create-if-absent attempt.
    Claim,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WatermarkRefresh => "watermark-refresh",
            Self::ExistenceCheck => "existence-check",
            Self::GapCheck => "gap-check",
            Self::QuickProbe => "quick-probe",
            Self::FullScan => "full-scan",
            Self::Preview => "preview",
            Self::Claim => "claim",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observer for allocator operations.
///
/// Every method has an empty default body, so an implementation only needs
/// the hooks it cares about.
pub trait Monitor: Send + Sync {
    fn start(&self, _op: Operation) {}

    fn success(&self, _op: Operation, _elapsed: Duration) {}

    fn failure(&self, _op: Operation, _elapsed: Duration, _error: &Error) {}
}

impl<M: Monitor + ?Sized> Monitor for Arc<M> {
    fn start(&self, op: Operation) {
        (**self).start(op);
    }

    fn success(&self, op: Operation, elapsed: Duration) {
        (**self).success(op, elapsed);
    }

    fn failure(&self, op: Operation, elapsed: Duration, error: &Error) {
        (**self).failure(op, elapsed, error);
    }
}

/// A [`Monitor`] that ignores everything. The allocator's default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMonitor;

impl Monitor for NoopMonitor {}

/// Runs `fut`, reporting its start and outcome to `monitor`.
pub(crate) async fn observe<T>(
    monitor: &dyn Monitor,
    op: Operation,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    monitor.start(op);
    let started = Instant::now();
    let out = fut.await;
    match &out {
        Ok(_) => monitor.success(op, started.elapsed()),
        Err(err) => monitor.failure(op, started.elapsed(), err),
    }
    out
}
