use core::fmt;

use crate::id::CaseId;

/// Where a preview came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreviewSource {
    /// Served from the short-lived preview cache.
    Cache,
    /// Found by probing the few numbers right after the watermark.
    QuickProbe,
    /// Found by the bulk scan of the year's identifiers.
    FullScan,
}

/// An advisory, non-binding candidate identifier.
///
/// A preview was free when it was computed but is not reserved: another
/// client may claim it first. Only [`CaseIdAllocator::claim`] assigns a
/// number.
///
/// [`CaseIdAllocator::claim`]: crate::CaseIdAllocator::claim
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Preview {
    pub id: CaseId,
    pub source: PreviewSource,
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

/// A value computed without consulting the store.
///
/// Useful for display only; never persist it as an assigned number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Unverified<T>(T);

impl<T> Unverified<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(value)
    }

    /// Takes the value out, acknowledging that it was never checked.
    pub fn into_unverified(self) -> T {
        self.0
    }

    pub const fn as_unverified(&self) -> &T {
        &self.0
    }
}

/// Lifecycle of a [`CaseIdAllocator`].
///
/// ```text
/// Uninitialized ──initialize──▶ Ready ◀──▶ Refreshing
///        │                        │
///        └──────── cleanup ───────┴──▶ Disposed
/// ```
///
/// [`CaseIdAllocator`]: crate::CaseIdAllocator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocatorState {
    Uninitialized,
    Ready,
    Refreshing,
    Disposed,
}
