use crate::{
    id::{CaseId, IdError},
    store::StoreError,
};

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors the allocator surfaces to callers.
///
/// Raw storage failures never cross this boundary untranslated: they are
/// retried when recoverable and otherwise mapped onto one of these variants.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller has no valid session, or lost permission on the collection.
    /// Retrying will not help until the user signs in again.
    #[error("authentication required")]
    AuthRequired,

    /// Storage kept failing after the retry budget was spent, or failed in a
    /// way that is not worth retrying. The caller should let the server assign
    /// the number instead.
    #[error("allocation unavailable after {attempts} attempt(s): {source}")]
    AllocationUnavailable {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// Every sequence number of `year` is taken.
    #[error("all 999 case numbers for {year} are in use")]
    NamespaceExhausted { year: u16 },

    /// A value is not a valid case identifier.
    #[error("malformed case identifier: {0}")]
    MalformedIdentifier(#[from] IdError),

    /// The clock reports a year outside the configured window.
    #[error("current year {year} is outside the configured window")]
    YearOutOfRange { year: u16 },

    /// Another client took the candidate on every attempt.
    #[error("case number still contended after {attempts} attempt(s)")]
    ClaimConflict { attempts: u32 },

    /// A create-if-absent write for `id` failed in transit and may or may not
    /// have landed. Look the record up before claiming another number.
    #[error("claim of {id} is unconfirmed: the write may have been applied")]
    ClaimUnconfirmed { id: CaseId },

    /// An identifier from `year` was used while the allocator works on
    /// `current`.
    #[error("case identifier is from {year}, not the current year {current}")]
    WrongYear { year: u16, current: u16 },

    /// The allocator was used after [`cleanup`](crate::CaseIdAllocator::cleanup).
    #[error("allocator has been disposed")]
    Disposed,
}

impl Error {
    /// Returns `true` when the user must sign in again.
    pub const fn requires_reauth(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }
}
