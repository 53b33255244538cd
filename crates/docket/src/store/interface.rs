use core::{fmt, future::Future};
use std::sync::Arc;

use futures::stream::BoxStream;

use crate::{
    id::{CaseId, MAX_SEQUENCE},
    store::StoreError,
};

/// The identifiers of one calendar year: `[YYYY000, YYYY999]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct YearRange {
    year: u16,
}

impl YearRange {
    pub const fn new(year: u16) -> Self {
        Self { year }
    }

    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Inclusive lower bound as the integer `YYYY000`.
    pub const fn lower(&self) -> u32 {
        self.year as u32 * 1000
    }

    /// Inclusive upper bound as the integer `YYYY999`.
    pub const fn upper(&self) -> u32 {
        self.lower() + MAX_SEQUENCE as u32
    }

    pub const fn contains(&self, id: CaseId) -> bool {
        id.year() == self.year
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:07}, {:07}]", self.lower(), self.upper())
    }
}

/// A change observed on the live "latest case of the year" query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    Added(CaseId),
    Modified(CaseId),
    Removed(CaseId),
}

impl ChangeEvent {
    pub const fn id(&self) -> CaseId {
        match self {
            Self::Added(id) | Self::Modified(id) | Self::Removed(id) => *id,
        }
    }
}

/// Stream of change notifications produced by [`CaseStore::watch_latest`].
///
/// Dropping the stream detaches the subscription.
pub type ChangeStream = BoxStream<'static, Result<ChangeEvent, StoreError>>;

/// The document collection holding one record per case, keyed by its
/// [`CaseId`].
///
/// Only record keys are ever read; payloads are opaque. Implementations
/// translate their native failures into [`StoreError`] codes, which decide
/// whether an operation is retried.
pub trait CaseStore: Send + Sync {
    /// Whether the current caller holds a valid session.
    fn is_authenticated(&self) -> bool;

    /// Point read by primary key.
    fn exists(&self, id: CaseId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// The highest identifier inside `range` (descending order, limit 1).
    fn latest_in_range(
        &self,
        range: YearRange,
    ) -> impl Future<Output = Result<Option<CaseId>, StoreError>> + Send;

    /// Number of records inside `range` (an aggregation query; no documents
    /// are transferred).
    fn count_in_range(
        &self,
        range: YearRange,
    ) -> impl Future<Output = Result<u32, StoreError>> + Send;

    /// Every identifier inside `range`, projecting only the key field.
    ///
    /// Order is unspecified.
    fn ids_in_range(
        &self,
        range: YearRange,
    ) -> impl Future<Output = Result<Vec<CaseId>, StoreError>> + Send;

    /// Subscribes to the live "latest identifier in `range`" query.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    fn watch_latest(&self, range: YearRange) -> Result<ChangeStream, StoreError>;

    /// Atomically creates the record for `id`, failing with
    /// [`StoreErrorCode::AlreadyExists`] if it is taken.
    ///
    /// [`StoreErrorCode::AlreadyExists`]: crate::StoreErrorCode::AlreadyExists
    fn insert(&self, id: CaseId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: CaseStore + ?Sized> CaseStore for Arc<S> {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn exists(&self, id: CaseId) -> impl Future<Output = Result<bool, StoreError>> + Send {
        (**self).exists(id)
    }

    fn latest_in_range(
        &self,
        range: YearRange,
    ) -> impl Future<Output = Result<Option<CaseId>, StoreError>> + Send {
        (**self).latest_in_range(range)
    }

    fn count_in_range(
        &self,
        range: YearRange,
    ) -> impl Future<Output = Result<u32, StoreError>> + Send {
        (**self).count_in_range(range)
    }

    fn ids_in_range(
        &self,
        range: YearRange,
    ) -> impl Future<Output = Result<Vec<CaseId>, StoreError>> + Send {
        (**self).ids_in_range(range)
    }

    fn watch_latest(&self, range: YearRange) -> Result<ChangeStream, StoreError> {
        (**self).watch_latest(range)
    }

    fn insert(&self, id: CaseId) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).insert(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_range_bounds() {
        let range = YearRange::new(2025);
        assert_eq!(range.lower(), 2_025_000);
        assert_eq!(range.upper(), 2_025_999);
        assert_eq!(range.to_string(), "[2025000, 2025999]");
        assert!(range.contains(CaseId::new(2025, 1).unwrap()));
        assert!(!range.contains(CaseId::new(2024, 999).unwrap()));
    }
}
