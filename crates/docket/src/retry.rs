use core::{future::Future, time::Duration};

use crate::{Error, Operation, futures::SleepProvider, store::StoreError};

/// Default number of attempts per storage operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff unit. Attempt `n` waits `n * base_delay` before retrying.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Retry wrapper for storage operations.
///
/// Failures are classified by [`StoreErrorCode`]:
///
/// - `unavailable`, `deadline-exceeded`, `resource-exhausted`: retried with a
///   linearly growing backoff until `max_attempts` is reached, then surfaced
///   as [`Error::AllocationUnavailable`].
/// - `permission-denied`, `unauthenticated`: surfaced immediately as
///   [`Error::AuthRequired`].
/// - anything else: surfaced immediately as [`Error::AllocationUnavailable`].
///
/// [`StoreErrorCode`]: crate::StoreErrorCode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least one.
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// The pause after failed attempt number `attempt` (1-based).
    pub const fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Runs `f` until it succeeds, fails permanently, or the attempt budget
    /// is spent, sleeping with `S` between attempts.
    ///
    /// # Errors
    ///
    /// Returns the translated [`Error`] of the last failed attempt.
    pub async fn run<S, T, Fut>(&self, op: Operation, mut f: impl FnMut() -> Fut) -> Result<T, Error>
    where
        S: SleepProvider,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_recoverable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        %op,
                        attempt,
                        code = %err.code,
                        delay_ms = delay.as_millis() as u64,
                        "storage call failed, retrying"
                    );
                    #[cfg(not(feature = "tracing"))]
                    let _ = op;
                    S::sleep_for(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!(%op, attempt, error = %err, "storage call failed");
                    return Err(translate(err, attempt));
                }
            }
        }
    }
}

fn translate(err: StoreError, attempts: u32) -> Error {
    if err.code.requires_reauth() {
        Error::AuthRequired
    } else {
        Error::AllocationUnavailable {
            attempts,
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::{
        futures::TokioYield,
        store::{StoreError, StoreErrorCode},
    };

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1000))
    }

    async fn failing_then<T>(
        calls: &AtomicU32,
        failures: &[StoreErrorCode],
        value: T,
    ) -> Result<T, StoreError> {
        let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
        match failures.get(n) {
            Some(code) => Err(StoreError::new(*code, "injected")),
            None => Ok(value),
        }
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = policy();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let failures = [StoreErrorCode::Unavailable, StoreErrorCode::DeadlineExceeded];
        let out = policy()
            .run::<TokioYield, _, _>(Operation::ExistenceCheck, || {
                failing_then(&calls, &failures, 7)
            })
            .await;
        assert_eq!(out, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let failures = [StoreErrorCode::ResourceExhausted; 5];
        let out = policy()
            .run::<TokioYield, _, _>(Operation::FullScan, || failing_then(&calls, &failures, ()))
            .await;
        assert!(matches!(
            out,
            Err(Error::AllocationUnavailable { attempts: 3, ref source })
                if source.code == StoreErrorCode::ResourceExhausted
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permission_errors_fail_fast() {
        for code in [StoreErrorCode::PermissionDenied, StoreErrorCode::Unauthenticated] {
            let calls = AtomicU32::new(0);
            let failures = [code];
            let out = policy()
                .run::<TokioYield, _, _>(Operation::WatermarkRefresh, || {
                    failing_then(&calls, &failures, ())
                })
                .await;
            assert_eq!(out, Err(Error::AuthRequired));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn unknown_errors_fail_closed() {
        let calls = AtomicU32::new(0);
        let failures = [StoreErrorCode::Other];
        let out = policy()
            .run::<TokioYield, _, _>(Operation::Preview, || failing_then(&calls, &failures, ()))
            .await;
        assert!(matches!(
            out,
            Err(Error::AllocationUnavailable { attempts: 1, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
