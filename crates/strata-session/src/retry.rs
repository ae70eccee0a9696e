// SPDX-FileCopyrightText: 2026 Strata Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deadlock retry wrapper.
//!
//! Re-executes an operation after a transient lock-contention failure, up to
//! a fixed invocation budget with a fixed delay between attempts. Retries are
//! not transactional: a retried statement must be safe to re-apply, which is
//! a caller obligation for non-idempotent statements.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use strata_core::StrataError;

/// Invoke `op`, retrying transient lock errors.
///
/// `budget` is the total invocation count: an operation that always fails
/// transiently is invoked exactly `budget` times and the final error is
/// surfaced unmodified. Successful results and non-transient errors return
/// immediately without retry. A budget of zero is treated as one.
pub async fn with_deadlock_retry<T, F, Fut>(
    budget: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, StrataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StrataError>>,
{
    let mut remaining = budget.max(1);
    loop {
        match op().await {
            Err(err) if err.is_transient() => {
                remaining -= 1;
                if remaining == 0 {
                    return Err(err);
                }
                warn!(error = %err, remaining, "transient lock error, retrying");
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn deadlock() -> StrataError {
        StrataError::TransientLock {
            code: "ER_LOCK_DEADLOCK".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn always_transient_uses_exact_budget() {
        let calls = AtomicU32::new(0);
        let err = with_deadlock_retry(5, Duration::from_millis(10), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(deadlock()) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(err.is_transient(), "final error surfaced unmodified");
    }

    #[tokio::test]
    async fn non_transient_error_is_invoked_exactly_once() {
        let calls = AtomicU32::new(0);
        let err = with_deadlock_retry(5, Duration::from_millis(10), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(StrataError::Validation("bad".into())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, StrataError::Validation(_)));
    }

    #[tokio::test]
    async fn success_returns_without_retry() {
        let calls = AtomicU32::new(0);
        let value = with_deadlock_retry(5, Duration::from_millis(10), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, StrataError>(42) }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let value = with_deadlock_retry(5, Duration::from_millis(10), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(deadlock())
                } else {
                    Ok("ok")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_budget_still_invokes_once() {
        let calls = AtomicU32::new(0);
        let _ = with_deadlock_retry(0, Duration::from_millis(10), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(deadlock()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
