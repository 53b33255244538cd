use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    allocator::Shared,
    store::{ChangeEvent, ChangeStream, YearRange},
};

/// Handle to the single live subscription on "latest case of the year".
///
/// The subscription runs as a spawned task that feeds every reported
/// identifier into the shared watermark and evicts a cached preview that
/// someone else just took. Cancelling the token (or dropping the handle)
/// detaches it.
#[derive(Debug)]
pub struct ChangeWatcher {
    range: YearRange,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ChangeWatcher {
    /// Spawns the watch task on the current Tokio runtime.
    pub fn spawn(changes: ChangeStream, range: YearRange, shared: Arc<Mutex<Shared>>) -> Self {
        let token = CancellationToken::new();
        let task = tokio::spawn(watch_loop(changes, range, shared, token.clone()));
        Self { range, token, task }
    }

    pub const fn range(&self) -> YearRange {
        self.range
    }

    /// `false` once the subscription failed, ended or was cancelled.
    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn watch_loop(
    mut changes: ChangeStream,
    range: YearRange,
    shared: Arc<Mutex<Shared>>,
    token: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::debug!(%range, "change watcher started");

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = changes.next() => match next {
                Some(Ok(ChangeEvent::Added(id) | ChangeEvent::Modified(id))) => {
                    if range.contains(id) && shared.lock().observe_insert(id) {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(%id, "watermark advanced by change feed");
                    }
                }
                Some(Ok(ChangeEvent::Removed(_id))) => {
                    // A deletion leaves a gap; the gap check finds it.
                    #[cfg(feature = "tracing")]
                    tracing::trace!(id = %_id, "case removed");
                }
                Some(Err(_e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        error = %_e,
                        "change watcher failed, falling back to direct queries"
                    );
                    break;
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("change feed closed");
                    break;
                }
            },
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(%range, "change watcher stopped");
}
