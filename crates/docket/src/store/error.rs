use core::fmt;

/// Status codes a backing store reports, mirroring the codes of common
/// hosted document databases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StoreErrorCode {
    /// The service is temporarily unreachable.
    Unavailable,
    /// The request did not complete before its deadline.
    DeadlineExceeded,
    /// A quota or rate limit was hit.
    ResourceExhausted,
    /// The caller lacks rights on the collection.
    PermissionDenied,
    /// The caller has no valid session.
    Unauthenticated,
    /// A create-if-absent write found the key already taken.
    AlreadyExists,
    /// Anything else.
    Other,
}

impl StoreErrorCode {
    /// Returns `true` for failures that may succeed on a later attempt.
    pub const fn is_recoverable(self) -> bool {
        matches!(
            self,
            Self::Unavailable | Self::DeadlineExceeded | Self::ResourceExhausted
        )
    }

    /// Returns `true` when the caller must sign in again before retrying.
    pub const fn requires_reauth(self) -> bool {
        matches!(self, Self::PermissionDenied | Self::Unauthenticated)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::ResourceExhausted => "resource-exhausted",
            Self::PermissionDenied => "permission-denied",
            Self::Unauthenticated => "unauthenticated",
            Self::AlreadyExists => "already-exists",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error reported by a [`CaseStore`].
///
/// [`CaseStore`]: crate::CaseStore
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Unavailable, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Unauthenticated, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::AlreadyExists, message)
    }

    pub const fn is_recoverable(&self) -> bool {
        self.code.is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_codes() {
        use StoreErrorCode::*;

        for code in [Unavailable, DeadlineExceeded, ResourceExhausted] {
            assert!(code.is_recoverable(), "{code}");
            assert!(!code.requires_reauth(), "{code}");
        }
        for code in [PermissionDenied, Unauthenticated] {
            assert!(!code.is_recoverable(), "{code}");
            assert!(code.requires_reauth(), "{code}");
        }
        for code in [AlreadyExists, Other] {
            assert!(!code.is_recoverable(), "{code}");
            assert!(!code.requires_reauth(), "{code}");
        }
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = StoreError::unavailable("backend restarting");
        assert_eq!(err.to_string(), "unavailable: backend restarting");
    }
}
