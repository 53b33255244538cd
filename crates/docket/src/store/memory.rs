use std::{
    collections::BTreeSet,
    sync::atomic::{AtomicBool, Ordering},
};

use futures::{StreamExt, future, stream};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::{
    id::CaseId,
    store::{CaseStore, ChangeEvent, ChangeStream, StoreError, YearRange},
};

const CHANGE_FEED_CAPACITY: usize = 256;

/// An in-process [`CaseStore`] backed by an ordered set.
///
/// Inserts are atomic with respect to each other, so it doubles as the
/// authoritative create-if-absent path in single-process deployments and in
/// tests. Every insert and removal is broadcast to live subscriptions.
pub struct MemoryCaseStore {
    ids: Mutex<BTreeSet<CaseId>>,
    events: broadcast::Sender<ChangeEvent>,
    authenticated: AtomicBool,
}

impl Default for MemoryCaseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCaseStore {
    /// Creates an empty, authenticated store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            ids: Mutex::new(BTreeSet::new()),
            events,
            authenticated: AtomicBool::new(true),
        }
    }

    /// Creates a store that already holds `ids`.
    pub fn with_ids(ids: impl IntoIterator<Item = CaseId>) -> Self {
        let store = Self::new();
        store.ids.lock().extend(ids);
        store
    }

    /// Toggles the simulated session.
    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::Release);
    }

    /// Deletes a record, leaving a reusable gap. Returns `false` if it did not
    /// exist.
    pub fn remove(&self, id: CaseId) -> bool {
        let removed = self.ids.lock().remove(&id);
        if removed {
            let _ = self.events.send(ChangeEvent::Removed(id));
        }
        removed
    }

    pub fn contains(&self, id: CaseId) -> bool {
        self.ids.lock().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.authenticated.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::unauthenticated("no active session"))
        }
    }

    fn latest(&self, range: YearRange) -> Option<CaseId> {
        self.ids
            .lock()
            .iter()
            .rev()
            .find(|id| range.contains(**id))
            .copied()
    }
}

impl CaseStore for MemoryCaseStore {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    async fn exists(&self, id: CaseId) -> Result<bool, StoreError> {
        self.guard()?;
        Ok(self.contains(id))
    }

    async fn latest_in_range(&self, range: YearRange) -> Result<Option<CaseId>, StoreError> {
        self.guard()?;
        Ok(self.latest(range))
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn count_in_range(&self, range: YearRange) -> Result<u32, StoreError> {
        self.guard()?;
        Ok(self.ids.lock().iter().filter(|id| range.contains(**id)).count() as u32)
    }

    async fn ids_in_range(&self, range: YearRange) -> Result<Vec<CaseId>, StoreError> {
        self.guard()?;
        Ok(self
            .ids
            .lock()
            .iter()
            .filter(|id| range.contains(**id))
            .copied()
            .collect())
    }

    fn watch_latest(&self, range: YearRange) -> Result<ChangeStream, StoreError> {
        self.guard()?;

        // Subscribe before taking the snapshot so an insert racing with the
        // subscription is reported at least once.
        let rx = self.events.subscribe();
        let initial = self.latest(range).map(ChangeEvent::Added);

        let live = BroadcastStream::new(rx).filter_map(move |event| {
            future::ready(match event {
                Ok(event) if range.contains(event.id()) => Some(Ok(event)),
                // Lagged receivers only lose intermediate maxima; later events
                // still carry the newest identifier.
                _ => None,
            })
        });

        Ok(stream::iter(initial.map(Ok)).chain(live).boxed())
    }

    async fn insert(&self, id: CaseId) -> Result<(), StoreError> {
        self.guard()?;
        let inserted = self.ids.lock().insert(id);
        if !inserted {
            return Err(StoreError::already_exists(format!("case {id} already exists")));
        }
        let _ = self.events.send(ChangeEvent::Added(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorCode;

    fn id(s: &str) -> CaseId {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn latest_is_scoped_to_the_year() {
        let store = MemoryCaseStore::with_ids([id("2024998"), id("2025003"), id("2025010")]);
        assert_eq!(
            store.latest_in_range(YearRange::new(2025)).await,
            Ok(Some(id("2025010")))
        );
        assert_eq!(
            store.latest_in_range(YearRange::new(2024)).await,
            Ok(Some(id("2024998")))
        );
        assert_eq!(store.latest_in_range(YearRange::new(2026)).await, Ok(None));
        assert_eq!(store.count_in_range(YearRange::new(2025)).await, Ok(2));
    }

    #[tokio::test]
    async fn insert_is_create_if_absent() {
        let store = MemoryCaseStore::new();
        store.insert(id("2025001")).await.unwrap();
        let err = store.insert(id("2025001")).await.unwrap_err();
        assert_eq!(err.code, StoreErrorCode::AlreadyExists);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unauthenticated_calls_fail() {
        let store = MemoryCaseStore::with_ids([id("2025001")]);
        store.set_authenticated(false);
        assert!(!store.is_authenticated());
        let err = store.exists(id("2025001")).await.unwrap_err();
        assert_eq!(err.code, StoreErrorCode::Unauthenticated);
        assert!(store.watch_latest(YearRange::new(2025)).is_err());
    }

    #[tokio::test]
    async fn watch_reports_snapshot_then_inserts_in_range() {
        let store = MemoryCaseStore::with_ids([id("2025004")]);
        let mut changes = store.watch_latest(YearRange::new(2025)).unwrap();

        assert_eq!(
            changes.next().await,
            Some(Ok(ChangeEvent::Added(id("2025004"))))
        );

        store.insert(id("2024500")).await.unwrap();
        store.insert(id("2025005")).await.unwrap();
        assert!(store.remove(id("2025004")));

        assert_eq!(
            changes.next().await,
            Some(Ok(ChangeEvent::Added(id("2025005"))))
        );
        assert_eq!(
            changes.next().await,
            Some(Ok(ChangeEvent::Removed(id("2025004"))))
        );
    }
}
