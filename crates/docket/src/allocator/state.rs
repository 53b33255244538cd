use std::collections::BTreeSet;

use crate::{allocator::AllocationCache, id::CaseId, status::AllocatorState};

/// Mutable allocator state, shared between the orchestrator and its
/// [`ChangeWatcher`] task.
///
/// Always accessed through a short-lived lock; no guard is ever held across
/// an await point.
///
/// [`ChangeWatcher`]: crate::allocator::ChangeWatcher
#[derive(Debug)]
pub struct Shared {
    pub state: AllocatorState,
    /// Year every field below is scoped to. `None` until first use.
    pub year: Option<u16>,
    /// Highest identifier the store is known to hold for `year`.
    pub latest: Option<CaseId>,
    /// Identifiers handed out through `reserve_watermark` and not yet seen in
    /// the store.
    pub reserved: BTreeSet<CaseId>,
    /// Identifiers seen in the store for `year`, by the watcher, a refresh or
    /// a claim.
    pub seen: BTreeSet<CaseId>,
    pub cache: AllocationCache,
}

impl Shared {
    pub const fn new(cache: AllocationCache) -> Self {
        Self {
            state: AllocatorState::Uninitialized,
            year: None,
            latest: None,
            reserved: BTreeSet::new(),
            seen: BTreeSet::new(),
            cache,
        }
    }

    /// The highest identifier known to be used or reserved for the year.
    pub fn watermark(&self) -> Option<CaseId> {
        self.latest.max(self.reserved.last().copied())
    }

    /// Records an identifier known to exist in the store, from the watcher or
    /// a successful claim. Returns `true` if it raised the watermark.
    pub fn observe_insert(&mut self, id: CaseId) -> bool {
        if self.year != Some(id.year()) {
            return false;
        }
        self.reserved.remove(&id);
        self.seen.insert(id);
        self.cache.invalidate_from(id);
        if self.latest.is_none_or(|latest| id > latest) {
            self.latest = Some(id);
            true
        } else {
            false
        }
    }

    /// Merges the result of a direct "latest in year" query. The stored
    /// watermark never moves backwards within a year.
    pub fn observe_latest(&mut self, latest: Option<CaseId>) {
        if let Some(id) = latest {
            self.observe_insert(id);
        }
    }

    /// Whether `id` is known to be used or reserved. A search result that
    /// turns out taken here went stale while the search was in flight.
    pub fn is_taken(&self, id: CaseId) -> bool {
        self.seen.contains(&id) || self.reserved.contains(&id)
    }

    /// Marks `id` as taken locally without touching the store.
    pub fn reserve(&mut self, id: CaseId) {
        self.cache.invalidate_from(id);
        self.reserved.insert(id);
    }

    /// Re-scopes the state to `year`, dropping everything learned about the
    /// previous one. Returns `true` if the year changed.
    pub fn roll_to(&mut self, year: u16) -> bool {
        if self.year == Some(year) {
            return false;
        }
        self.year = Some(year);
        self.latest = None;
        self.reserved.clear();
        self.seen.clear();
        self.cache.clear();
        true
    }

    pub fn dispose(&mut self) {
        self.state = AllocatorState::Disposed;
        self.year = None;
        self.latest = None;
        self.reserved.clear();
        self.seen.clear();
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;

    fn id(s: &str) -> CaseId {
        s.parse().unwrap()
    }

    fn shared(year: u16) -> Shared {
        let mut shared = Shared::new(AllocationCache::new(Duration::from_secs(30)));
        shared.roll_to(year);
        shared
    }

    #[test]
    fn watermark_only_moves_forward() {
        let mut shared = shared(2025);
        assert_eq!(shared.watermark(), None);

        assert!(shared.observe_insert(id("2025010")));
        assert!(!shared.observe_insert(id("2025004")));
        shared.observe_latest(Some(id("2025008")));
        assert_eq!(shared.watermark(), Some(id("2025010")));
    }

    #[test]
    fn other_years_are_ignored() {
        let mut shared = shared(2025);
        assert!(!shared.observe_insert(id("2024999")));
        assert_eq!(shared.watermark(), None);
    }

    #[test]
    fn reservations_raise_the_watermark_until_seen() {
        let mut shared = shared(2025);
        shared.observe_insert(id("2025042"));
        shared.cache.set(id("2025043"), 0);

        shared.reserve(id("2025043"));
        assert_eq!(shared.watermark(), Some(id("2025043")));
        assert_eq!(shared.cache.peek(), None);

        // A stale refresh must not undo the reservation.
        shared.observe_latest(Some(id("2025042")));
        assert_eq!(shared.watermark(), Some(id("2025043")));

        shared.observe_insert(id("2025043"));
        assert!(shared.reserved.is_empty());
        assert_eq!(shared.watermark(), Some(id("2025043")));
    }

    #[test]
    fn rollover_resets_year_scoped_state() {
        let mut shared = shared(2025);
        shared.observe_insert(id("2025100"));
        shared.reserve(id("2025101"));
        shared.cache.set(id("2025102"), 0);

        assert!(!shared.roll_to(2025));
        assert!(shared.roll_to(2026));
        assert_eq!(shared.watermark(), None);
        assert_eq!(shared.cache.peek(), None);
        assert!(!shared.is_taken(id("2025100")));
    }

    #[test]
    fn inserts_below_the_watermark_are_still_taken() {
        let mut shared = shared(2025);
        shared.observe_insert(id("2025010"));
        assert!(!shared.observe_insert(id("2025003")));

        assert!(shared.is_taken(id("2025003")));
        assert!(shared.is_taken(id("2025010")));
        assert!(!shared.is_taken(id("2025004")));

        shared.reserve(id("2025004"));
        assert!(shared.is_taken(id("2025004")));
    }
}
