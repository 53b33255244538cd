use core::time::Duration;

use crate::id::CaseId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CacheEntry {
    id: CaseId,
    computed_at: u64,
}

/// Single-slot cache for the last computed preview.
///
/// Timestamps are passed in by the caller from its [`TimeSource`].
///
/// [`TimeSource`]: crate::TimeSource
#[derive(Clone, Debug)]
pub struct AllocationCache {
    ttl_millis: u64,
    entry: Option<CacheEntry>,
}

impl AllocationCache {
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl_millis: ttl.as_millis() as u64,
            entry: None,
        }
    }

    /// Returns the cached identifier if it is at most `ttl` old, evicting it
    /// otherwise.
    pub fn get(&mut self, now: u64) -> Option<CaseId> {
        let entry = self.entry?;
        if now.saturating_sub(entry.computed_at) <= self.ttl_millis {
            Some(entry.id)
        } else {
            self.entry = None;
            None
        }
    }

    pub fn set(&mut self, id: CaseId, now: u64) {
        self.entry = Some(CacheEntry {
            id,
            computed_at: now,
        });
    }

    /// Drops the entry if `seen` is at or beyond it: someone else just took
    /// the cached number, or one after it.
    ///
    /// Returns `true` if an entry was evicted.
    pub fn invalidate_from(&mut self, seen: CaseId) -> bool {
        match self.entry {
            Some(entry) if seen >= entry.id => {
                self.entry = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub const fn peek(&self) -> Option<CaseId> {
        match self.entry {
            Some(entry) => Some(entry.id),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CaseId {
        s.parse().unwrap()
    }

    #[test]
    fn serves_within_ttl_and_evicts_after() {
        let mut cache = AllocationCache::new(Duration::from_secs(30));
        assert_eq!(cache.get(0), None);

        cache.set(id("2025043"), 1_000);
        assert_eq!(cache.get(1_000), Some(id("2025043")));
        assert_eq!(cache.get(31_000), Some(id("2025043")));
        assert_eq!(cache.get(31_001), None);
        assert_eq!(cache.peek(), None);
    }

    #[test]
    fn invalidates_on_equal_or_greater_insert() {
        let mut cache = AllocationCache::new(Duration::from_secs(30));
        cache.set(id("2025043"), 0);

        assert!(!cache.invalidate_from(id("2025042")));
        assert_eq!(cache.peek(), Some(id("2025043")));

        assert!(cache.invalidate_from(id("2025043")));
        assert_eq!(cache.peek(), None);

        cache.set(id("2025043"), 0);
        assert!(cache.invalidate_from(id("2025050")));
        assert!(!cache.invalidate_from(id("2025050")));
    }

    #[test]
    fn clock_going_backwards_does_not_panic() {
        let mut cache = AllocationCache::new(Duration::from_secs(30));
        cache.set(id("2025001"), 10_000);
        assert_eq!(cache.get(5_000), Some(id("2025001")));
    }
}
