use core::{
    future::Future,
    marker::PhantomData,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    Error, Result,
    futures::{SleepProvider, TokioSleep},
    id::CaseId,
    monitor::{Monitor, Operation, observe},
    retry::RetryPolicy,
    store::{CaseStore, StoreError, StoreErrorCode, YearRange},
};

/// Authenticated, retried and monitored access to a [`CaseStore`].
///
/// This is the single place where the allocator touches storage. Each call
/// checks the session first, so an anonymous caller gets
/// [`Error::AuthRequired`] instead of a silent `false` or an empty result.
pub struct StoreClient<'a, S, P = TokioSleep> {
    store: &'a S,
    retry: RetryPolicy,
    monitor: &'a dyn Monitor,
    _sleep: PhantomData<fn() -> P>,
}

impl<'a, S, P> StoreClient<'a, S, P>
where
    S: CaseStore,
    P: SleepProvider,
{
    pub fn new(store: &'a S, retry: RetryPolicy, monitor: &'a dyn Monitor) -> Self {
        Self {
            store,
            retry,
            monitor,
            _sleep: PhantomData,
        }
    }

    /// Point read: does a record keyed by `id` exist?
    ///
    /// # Errors
    ///
    /// [`Error::AuthRequired`] without a session, or the retried storage
    /// failure.
    pub async fn exists(&self, id: CaseId) -> Result<bool> {
        self.call(Operation::ExistenceCheck, || self.store.exists(id))
            .await
    }

    /// Highest identifier stored for `range`.
    ///
    /// # Errors
    ///
    /// See [`StoreClient::exists`].
    pub async fn latest(&self, range: YearRange) -> Result<Option<CaseId>> {
        self.call(Operation::WatermarkRefresh, || {
            self.store.latest_in_range(range)
        })
        .await
    }

    /// Number of records stored for `range`.
    ///
    /// # Errors
    ///
    /// See [`StoreClient::exists`].
    pub async fn count(&self, range: YearRange) -> Result<u32> {
        self.call(Operation::GapCheck, || self.store.count_in_range(range))
            .await
    }

    /// Every identifier stored for `range`.
    ///
    /// # Errors
    ///
    /// See [`StoreClient::exists`].
    pub async fn ids(&self, range: YearRange) -> Result<Vec<CaseId>> {
        self.call(Operation::FullScan, || self.store.ids_in_range(range))
            .await
    }

    /// Create-if-absent. Returns `Ok(false)` when the key is already taken.
    ///
    /// A transient failure is retried, but after one the earlier write may
    /// have landed without an acknowledgement. From then on a key reported
    /// as taken, or a spent retry budget, is ambiguous and surfaces as
    /// [`Error::ClaimUnconfirmed`].
    ///
    /// # Errors
    ///
    /// See [`StoreClient::exists`].
    pub async fn insert(&self, id: CaseId) -> Result<bool> {
        let interrupted = AtomicBool::new(false);
        let op = Operation::Claim;
        observe(self.monitor, op, async {
            let flag = &interrupted;
            let store = self.store;
            let out = self
                .attempt(op, move || async move {
                    match store.insert(id).await {
                        Ok(()) => Ok(true),
                        Err(err) if err.code == StoreErrorCode::AlreadyExists => Ok(false),
                        Err(err) => {
                            if err.is_recoverable() {
                                flag.store(true, Ordering::Relaxed);
                            }
                            Err(err)
                        }
                    }
                })
                .await;
            match out {
                Ok(false) | Err(Error::AllocationUnavailable { .. })
                    if interrupted.load(Ordering::Relaxed) =>
                {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%id, "insert outcome unknown after a lost acknowledgement");
                    Err(Error::ClaimUnconfirmed { id })
                }
                out => out,
            }
        })
        .await
    }

    async fn call<T, Fut>(&self, op: Operation, f: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        observe(self.monitor, op, self.attempt(op, f)).await
    }

    async fn attempt<T, Fut>(&self, op: Operation, f: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        if !self.store.is_authenticated() {
            #[cfg(feature = "tracing")]
            tracing::warn!(%op, "no active session");
            return Err(Error::AuthRequired);
        }
        self.retry.run::<P, _, _>(op, f).await
    }
}
