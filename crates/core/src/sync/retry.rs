//! Retry wrapper for remote host calls
//!
//! Only errors classified as retryable (network failures, timeouts, 5xx) are
//! retried. The delay after failed attempt `n` (0-indexed) is
//! `base * 2^n` plus a uniform jitter in `[0, 1000ms)`.

use std::future::Future;
use std::time::Duration;

use loadplan_common::resilience::policies::RetryTransient;
use loadplan_common::resilience::{BackoffStrategy, Jitter, RetryConfig, RetryError, RetryExecutor};
use loadplan_domain::constants::BACKOFF_JITTER_MS;
use loadplan_domain::{LoadplanError, Result};

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Backoff configuration for remote calls
pub fn remote_retry_config(max_attempts: u32, base_backoff: Duration) -> RetryConfig {
    RetryConfig {
        max_attempts,
        backoff: BackoffStrategy::Exponential {
            initial_delay: base_backoff,
            base: 2.0,
            max_delay: MAX_BACKOFF,
        },
        jitter: Jitter::Additive { max: Duration::from_millis(BACKOFF_JITTER_MS) },
    }
}

/// Run `op` until it succeeds, fails terminally or runs out of attempts.
/// The error of the final attempt is returned unchanged.
pub async fn fetch_with_retry<F, Fut, T>(
    op: F,
    max_attempts: u32,
    base_backoff: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let executor =
        RetryExecutor::new(remote_retry_config(max_attempts, base_backoff), RetryTransient);
    executor.execute(op).await.map_err(|err| match err {
        RetryError::AttemptsExhausted { source, .. } | RetryError::NonRetryable { source } => {
            source
        }
        RetryError::InvalidConfiguration { message } => LoadplanError::Internal(message),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counted<T: Clone>(
        calls: &Arc<AtomicU32>,
        results: Vec<Result<T>>,
    ) -> impl FnMut() -> std::future::Ready<Result<T>> {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
            std::future::ready(results[n.min(results.len() - 1)].clone())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = counted(&calls, vec![Err(LoadplanError::Network("reset".into())), Ok(7)]);

        let value = fetch_with_retry(op, 3, Duration::from_millis(10)).await;
        assert_eq!(value, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_terminal() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = counted::<u8>(&calls, vec![Err(LoadplanError::from_status(403, "forbidden"))]);

        let result = fetch_with_retry(op, 3, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(LoadplanError::Request { status: 403, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let op = counted::<u8>(
            &calls,
            vec![
                Err(LoadplanError::Network("first".into())),
                Err(LoadplanError::Network("second".into())),
                Err(LoadplanError::from_status(502, "third")),
            ],
        );

        let result = fetch_with_retry(op, 3, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(LoadplanError::Network(m)) if m.contains("third")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    /// Validates the backoff schedule.
    ///
    /// Assertions:
    /// - Delay `n` lies in `[base * 2^n, base * 2^n + 1000ms)`
    #[tokio::test(start_paused = true)]
    async fn backoff_delays_double_with_bounded_jitter() {
        let executor = RetryExecutor::new(
            remote_retry_config(4, Duration::from_millis(100)),
            RetryTransient,
        );
        let outcome = executor
            .execute_with_outcome(|| async { Err::<(), _>(LoadplanError::Network("down".into())) })
            .await;

        assert_eq!(outcome.delays.len(), 3);
        for (n, delay) in outcome.delays.iter().enumerate() {
            let floor = Duration::from_millis(100 * 2u64.pow(n as u32));
            assert!(*delay >= floor, "delay {n} below floor: {delay:?}");
            let ceiling = floor + Duration::from_millis(BACKOFF_JITTER_MS);
            assert!(*delay < ceiling, "delay {n} above ceiling: {delay:?}");
        }
    }
}
