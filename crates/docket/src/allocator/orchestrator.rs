use core::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    Error, Result,
    allocator::{
        AllocationCache, AllocatorConfig, ChangeWatcher, FullRangeScanner, QuickRangeProbe,
        Shared, StoreClient,
    },
    futures::{SleepProvider, TokioSleep},
    id::CaseId,
    monitor::{Monitor, NoopMonitor, Operation, observe},
    status::{AllocatorState, Preview, PreviewSource, Unverified},
    store::{CaseStore, YearRange},
    time::{SystemClock, TimeSource},
};

/// Produces the next free `YYYYSSS` case number for the current year.
///
/// A preview is computed in up to three steps, each cheaper than the next:
///
/// 1. a cached preview younger than the configured TTL is returned as is;
/// 2. otherwise the few numbers right after the watermark are point-read
///    ([`QuickRangeProbe`]);
/// 3. if those are all taken, or the record count proves a gap below the
///    watermark, the whole year is read in one query ([`FullRangeScanner`])
///    and the lowest free number wins.
///
/// Previews are advisory: another client may take the number first. Use
/// [`claim`](Self::claim) for the authoritative create-if-absent write.
///
/// The allocator owns exactly one live subscription on the store's "latest
/// case of the year" query, which keeps the watermark current and evicts a
/// preview as soon as someone else takes it. Construct one instance per
/// session and share it (it is `Sync`); call [`cleanup`](Self::cleanup) on
/// sign-out.
///
/// ```
/// use docket::{AllocatorConfig, CaseIdAllocator, MemoryCaseStore};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let config = AllocatorConfig::default().with_years(2000..=2099);
/// let allocator = CaseIdAllocator::new(MemoryCaseStore::new(), config);
///
/// let preview = allocator.preview_next_identifier().await.unwrap();
/// let claimed = allocator.claim(Some(preview.id)).await.unwrap();
/// assert_eq!(claimed, preview.id);
/// allocator.cleanup();
/// # });
/// ```
pub struct CaseIdAllocator<S, T = SystemClock, P = TokioSleep> {
    store: S,
    clock: T,
    config: AllocatorConfig,
    monitor: Arc<dyn Monitor>,
    shared: Arc<Mutex<Shared>>,
    watcher: Mutex<Option<ChangeWatcher>>,
    _sleep: PhantomData<fn() -> P>,
}

impl<S> CaseIdAllocator<S>
where
    S: CaseStore,
{
    /// Creates an allocator on the system clock with Tokio timer backoff.
    pub fn new(store: S, config: AllocatorConfig) -> Self {
        Self::with_clock(store, config, SystemClock::new())
    }
}

impl<S, T> CaseIdAllocator<S, T>
where
    S: CaseStore,
    T: TimeSource,
{
    /// Creates an allocator reading time from `clock`.
    pub fn with_clock(store: S, config: AllocatorConfig, clock: T) -> Self {
        let cache = AllocationCache::new(config.cache_ttl());
        Self {
            store,
            clock,
            config,
            monitor: Arc::new(NoopMonitor),
            shared: Arc::new(Mutex::new(Shared::new(cache))),
            watcher: Mutex::new(None),
            _sleep: PhantomData,
        }
    }
}

impl<S, T, P> CaseIdAllocator<S, T, P>
where
    S: CaseStore,
    T: TimeSource + Send + Sync,
    P: SleepProvider,
{
    /// Switches the retry backoff to another [`SleepProvider`].
    pub fn with_sleep<Q: SleepProvider>(self) -> CaseIdAllocator<S, T, Q> {
        CaseIdAllocator {
            store: self.store,
            clock: self.clock,
            config: self.config,
            monitor: self.monitor,
            shared: self.shared,
            watcher: self.watcher,
            _sleep: PhantomData,
        }
    }

    #[must_use]
    pub fn with_monitor(mut self, monitor: impl Monitor + 'static) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn state(&self) -> AllocatorState {
        self.shared.lock().state
    }

    /// Highest identifier known to be used or reserved this year.
    pub fn watermark(&self) -> Option<CaseId> {
        self.shared.lock().watermark()
    }

    /// Whether the change subscription is currently live.
    pub fn is_watching(&self) -> bool {
        self.watcher
            .lock()
            .as_ref()
            .is_some_and(ChangeWatcher::is_live)
    }

    pub const fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Loads the watermark and subscribes to changes. Calling it again once
    /// ready does nothing.
    ///
    /// Previews initialize lazily, so calling this up front only moves the
    /// first round trips out of the first preview.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthRequired`] before sign-in; the allocator stays
    ///   uninitialized and may be initialized later
    /// - [`Error::YearOutOfRange`] if the clock is outside the configured
    ///   window
    /// - [`Error::Disposed`] after [`cleanup`](Self::cleanup)
    /// - the translated failure of the watermark query
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_initialized().await.map(|_| ())
    }

    /// Computes the lowest free case number of the current year.
    ///
    /// Two calls within the cache TTL with no intervening inserts return the
    /// same identifier.
    ///
    /// # Errors
    ///
    /// - [`Error::NamespaceExhausted`] when all 999 numbers are used
    /// - [`Error::AllocationUnavailable`] when storage kept failing; the
    ///   caller should let the server assign the number
    /// - [`Error::ClaimConflict`] when every search result was taken by
    ///   another client before it could be returned
    /// - any error listed on [`initialize`](Self::initialize)
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub async fn preview_next_identifier(&self) -> Result<Preview> {
        observe(&*self.monitor, Operation::Preview, self.preview()).await
    }

    /// Marks `id` as taken locally so the next preview does not offer it
    /// again, e.g. when the user dismissed a candidate.
    ///
    /// This creates no record and guarantees nothing across clients.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedIdentifier`] if `id` is outside the year window
    /// - [`Error::WrongYear`] if `id` is not from the clock's current year
    /// - [`Error::YearOutOfRange`] if the clock is outside the window
    /// - [`Error::Disposed`] after [`cleanup`](Self::cleanup)
    pub fn reserve_watermark(&self, id: CaseId) -> Result<()> {
        self.config.format().format(id.year(), id.sequence())?;

        let year = self.sync_year()?;
        if id.year() != year {
            #[cfg(feature = "tracing")]
            tracing::debug!(%id, year, "rejecting reservation for another year");
            return Err(Error::WrongYear {
                year: id.year(),
                current: year,
            });
        }

        let mut shared = self.shared.lock();
        if shared.state == AllocatorState::Disposed {
            return Err(Error::Disposed);
        }
        shared.reserve(id);
        #[cfg(feature = "tracing")]
        tracing::debug!(%id, "watermark reserved");
        Ok(())
    }

    /// Creates the record for `candidate`, or for a fresh preview when
    /// `None`, and returns the identifier that was actually written.
    ///
    /// If the number was taken in the meantime, the lowest free number is
    /// recomputed with a full scan and tried next, up to the retry policy's
    /// attempt budget. A candidate from another year is ignored.
    ///
    /// A write whose acknowledgement was lost is never retried blindly: if a
    /// retry then finds the key taken, the record may be ours, so the claim
    /// stops with [`Error::ClaimUnconfirmed`] instead of writing a second one.
    ///
    /// # Errors
    ///
    /// - [`Error::ClaimConflict`] if every attempt lost the race
    /// - [`Error::ClaimUnconfirmed`] if the outcome of a write is unknown
    /// - any error listed on
    ///   [`preview_next_identifier`](Self::preview_next_identifier)
    pub async fn claim(&self, candidate: Option<CaseId>) -> Result<CaseId> {
        self.ensure_initialized().await?;
        let year = self.sync_year()?;

        let mut next = match candidate {
            Some(id) if id.year() == year => id,
            _ => self.preview_next_identifier().await?.id,
        };

        let client = self.client();
        let attempts = self.config.retry().max_attempts();
        for attempt in 1..=attempts {
            let created = client.insert(next).await?;
            self.shared.lock().observe_insert(next);
            if created {
                #[cfg(feature = "tracing")]
                tracing::info!(id = %next, attempt, "case number claimed");
                return Ok(next);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(id = %next, attempt, "case number already taken");
            if attempt < attempts {
                let reserved = self.shared.lock().reserved.clone();
                next = FullRangeScanner.find(&client, year, &reserved).await?;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(attempts, "giving up on contended case number");
        Err(Error::ClaimConflict { attempts })
    }

    /// Watermark plus one, computed without any store access.
    ///
    /// # Errors
    ///
    /// - [`Error::YearOutOfRange`] if the clock is outside the window
    /// - [`Error::NamespaceExhausted`] if the watermark is the year's last
    ///   number
    /// - [`Error::Disposed`] after [`cleanup`](Self::cleanup)
    pub fn estimate_next(&self) -> Result<Unverified<CaseId>> {
        let year = self.current_year()?;
        let shared = self.shared.lock();
        if shared.state == AllocatorState::Disposed {
            return Err(Error::Disposed);
        }

        let next = match shared.watermark() {
            Some(watermark) if shared.year == Some(year) => watermark.successor(),
            _ => CaseId::new(year, 1).ok(),
        };
        next.map(Unverified::new)
            .ok_or(Error::NamespaceExhausted { year })
    }

    /// Re-queries the watermark now and returns it.
    ///
    /// # Errors
    ///
    /// See [`initialize`](Self::initialize).
    pub async fn refresh(&self) -> Result<Option<CaseId>> {
        if !self.ensure_initialized().await? {
            let year = self.sync_year()?;
            self.ensure_watcher(year);
            self.refresh_watermark(year).await?;
        }
        Ok(self.watermark())
    }

    /// Detaches the change subscription and drops all cached state. Every
    /// later call fails with [`Error::Disposed`].
    pub fn cleanup(&self) {
        self.stop_watcher();
        self.shared.lock().dispose();
        #[cfg(feature = "tracing")]
        tracing::info!("case number allocator disposed");
    }

    fn client(&self) -> StoreClient<'_, S, P> {
        StoreClient::new(&self.store, *self.config.retry(), &*self.monitor)
    }

    /// Returns `true` if this call performed the initial load.
    async fn ensure_initialized(&self) -> Result<bool> {
        match self.state() {
            AllocatorState::Disposed => Err(Error::Disposed),
            AllocatorState::Ready | AllocatorState::Refreshing => Ok(false),
            AllocatorState::Uninitialized => self.load().await.map(|()| true),
        }
    }

    async fn load(&self) -> Result<()> {
        if !self.store.is_authenticated() {
            #[cfg(feature = "tracing")]
            tracing::warn!("initialize called before sign-in");
            return Err(Error::AuthRequired);
        }

        let year = self.sync_year()?;
        self.ensure_watcher(year);
        self.refresh_watermark(year).await?;

        let disposed = {
            let mut shared = self.shared.lock();
            if shared.state == AllocatorState::Uninitialized {
                shared.state = AllocatorState::Ready;
            }
            shared.state == AllocatorState::Disposed
        };
        if disposed {
            self.stop_watcher();
            return Err(Error::Disposed);
        }

        #[cfg(feature = "tracing")]
        tracing::info!(year, watermark = ?self.watermark(), "case number allocator ready");
        Ok(())
    }

    async fn preview(&self) -> Result<Preview> {
        let loaded = self.ensure_initialized().await?;
        let year = self.sync_year()?;
        let watching = self.is_watching();
        self.ensure_watcher(year);
        if !loaded && (self.config.refresh_on_preview() || !watching) {
            self.refresh_watermark(year).await?;
        }

        let cached = self.shared.lock().cache.get(self.clock.current_millis());
        if let Some(id) = cached {
            #[cfg(feature = "tracing")]
            tracing::debug!(%id, "preview served from cache");
            return Ok(Preview {
                id,
                source: PreviewSource::Cache,
            });
        }

        let attempts = self.config.retry().max_attempts();
        let mut attempt = 1;
        loop {
            let preview = self.search(year).await?;
            {
                let mut shared = self.shared.lock();
                if !shared.is_taken(preview.id) {
                    if shared.year == Some(year) && shared.state != AllocatorState::Disposed {
                        shared.cache.set(preview.id, self.clock.current_millis());
                    }
                    return Ok(preview);
                }
            }

            // Another client took the candidate while the search was running.
            #[cfg(feature = "tracing")]
            tracing::debug!(id = %preview.id, attempt, "preview taken during search");
            if attempt >= attempts {
                return Err(Error::ClaimConflict { attempts });
            }
            attempt += 1;
        }
    }

    async fn search(&self, year: u16) -> Result<Preview> {
        let client = self.client();
        let range = YearRange::new(year);
        let (latest, after, reserved) = {
            let shared = self.shared.lock();
            let after = shared.watermark().map_or(0, |id| id.sequence());
            (shared.latest, after, shared.reserved.clone())
        };

        let gap_below = match latest {
            Some(latest) if self.config.detect_gaps() => {
                client.count(range).await? < u32::from(latest.sequence())
            }
            _ => false,
        };

        if gap_below {
            #[cfg(feature = "tracing")]
            tracing::debug!(year, "gap below the watermark, scanning the year");
        } else {
            let probe = QuickRangeProbe::new(self.config.probe_budget());
            let found = observe(
                &*self.monitor,
                Operation::QuickProbe,
                probe.find(&client, year, after),
            )
            .await?;
            if let Some(id) = found {
                return Ok(Preview {
                    id,
                    source: PreviewSource::QuickProbe,
                });
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(year, "quick probe exhausted, falling back to full scan");
        }

        let id = FullRangeScanner.find(&client, year, &reserved).await?;
        Ok(Preview {
            id,
            source: PreviewSource::FullScan,
        })
    }

    async fn refresh_watermark(&self, year: u16) -> Result<()> {
        let was_ready = {
            let mut shared = self.shared.lock();
            let ready = shared.state == AllocatorState::Ready;
            if ready {
                shared.state = AllocatorState::Refreshing;
            }
            ready
        };

        let latest = self.client().latest(YearRange::new(year)).await;

        let mut shared = self.shared.lock();
        if was_ready && shared.state == AllocatorState::Refreshing {
            shared.state = AllocatorState::Ready;
        }
        let latest = latest?;
        if shared.year == Some(year) {
            shared.observe_latest(latest);
        }
        Ok(())
    }

    fn current_year(&self) -> Result<u16> {
        let year = self.clock.current_year();
        if self.config.format().contains_year(year) {
            Ok(year)
        } else {
            #[cfg(feature = "tracing")]
            tracing::error!(year, years = ?self.config.format().years(), "clock year outside the configured window");
            Err(Error::YearOutOfRange { year })
        }
    }

    /// Scopes the shared state to the clock's year, resetting it on rollover.
    fn sync_year(&self) -> Result<u16> {
        let year = self.current_year()?;
        let rolled_over = {
            let mut shared = self.shared.lock();
            if shared.state == AllocatorState::Disposed {
                return Err(Error::Disposed);
            }
            let previous = shared.year;
            shared.roll_to(year) && previous.is_some()
        };
        if rolled_over {
            #[cfg(feature = "tracing")]
            tracing::info!(year, "year rolled over, starting a fresh sequence");
            self.stop_watcher();
        }
        Ok(year)
    }

    /// Keeps exactly one live subscription, for `year`.
    fn ensure_watcher(&self, year: u16) {
        let mut slot = self.watcher.lock();
        if slot
            .as_ref()
            .is_some_and(|w| w.is_live() && w.range().year() == year)
        {
            return;
        }
        if let Some(stale) = slot.take() {
            stale.cancel();
        }

        let range = YearRange::new(year);
        match self.store.watch_latest(range) {
            Ok(changes) => {
                *slot = Some(ChangeWatcher::spawn(changes, range, Arc::clone(&self.shared)));
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, %range, "cannot watch for changes, using direct queries");
            }
        }
    }

    fn stop_watcher(&self) {
        if let Some(watcher) = self.watcher.lock().take() {
            watcher.cancel();
        }
    }
}
