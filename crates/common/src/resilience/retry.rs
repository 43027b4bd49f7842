//! Retry loop for async operations
//!
//! A [`RetryPolicy`] classifies each failure, the [`BackoffStrategy`] and
//! [`Jitter`] decide how long to wait, and [`RetryExecutor`] runs the loop.
//! Terminal outcomes carry the error of the last attempt untouched.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::ErrorClassification;

#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; `source` is the final failure
    #[error("gave up after {attempts} attempts: {source}")]
    AttemptsExhausted { attempts: u32, source: E },

    /// The policy refused to retry `source`
    #[error("not retryable: {source}")]
    NonRetryable { source: E },

    #[error("invalid retry config: {message}")]
    InvalidConfiguration { message: String },
}

impl<E> RetryError<E> {
    /// The failure of the last attempt, when one ran
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::AttemptsExhausted { source, .. } | Self::NonRetryable { source } => Some(source),
            Self::InvalidConfiguration { .. } => None,
        }
    }
}

pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Result of a run plus the attempts made and the sleeps between them
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    pub attempts: u32,
    pub delays: Vec<Duration>,
}

/// Decides whether a failed attempt is worth another try
pub trait RetryPolicy<E> {
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

impl<E, F> RetryPolicy<E> for F
where
    F: Fn(&E, u32) -> RetryDecision,
{
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
        self(error, attempt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the configured backoff, then retry
    Retry,
    /// Sleep for exactly this long, then retry
    RetryAfter(Duration),
    Stop,
}

/// Base delay before the next attempt, before jitter
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    Fixed(Duration),
    /// `initial_delay * base^attempt`, never above `max_delay`
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Delay after failed attempt `attempt`, counted from 0
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let millis = initial_delay.as_millis() as f64 * base.powi(exponent);
                let capped = millis.min(max_delay.as_millis() as f64);
                Duration::from_millis(capped as u64)
            }
        }
    }
}

/// Random spread applied on top of the backoff delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Jitter {
    None,
    /// `delay + U[0, max)`
    Additive { max: Duration },
    /// `U[0, delay)`
    Full,
}

impl Jitter {
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            Self::None => delay,
            Self::Additive { max } => delay + uniform_below(*max),
            Self::Full => uniform_below(delay),
        }
    }
}

fn uniform_below(bound: Duration) -> Duration {
    match u64::try_from(bound.as_millis()).unwrap_or(u64::MAX) {
        0 => Duration::ZERO,
        max => Duration::from_millis(rand::thread_rng().gen_range(0..max)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts including the first one
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_secs(1),
                base: 2.0,
                max_delay: Duration::from_secs(60),
            },
            jitter: Jitter::Additive { max: Duration::from_secs(1) },
        }
    }
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), RetryError<()>> {
        let invalid = |message: &str| {
            Err(RetryError::InvalidConfiguration { message: message.to_string() })
        };
        if self.max_attempts == 0 {
            return invalid("max_attempts must be at least 1");
        }
        match self.backoff {
            BackoffStrategy::Exponential { base, .. } if base <= 0.0 => {
                invalid("exponential base must be positive")
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    pub fn fixed_backoff(self, delay: Duration) -> Self {
        self.backoff(BackoffStrategy::Fixed(delay))
    }

    pub fn exponential_backoff(self, initial_delay: Duration, base: f64, max: Duration) -> Self {
        self.backoff(BackoffStrategy::Exponential { initial_delay, base, max_delay: max })
    }

    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.config.backoff = backoff;
        self
    }

    pub fn no_jitter(self) -> Self {
        self.jitter(Jitter::None)
    }

    pub fn additive_jitter(self, max: Duration) -> Self {
        self.jitter(Jitter::Additive { max })
    }

    pub fn full_jitter(self) -> Self {
        self.jitter(Jitter::Full)
    }

    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.config.jitter = jitter;
        self
    }

    pub fn build(self) -> Result<RetryConfig, RetryError<()>> {
        self.config.validate().map(|()| self.config)
    }
}

/// Runs operations under a [`RetryConfig`] and a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    #[instrument(skip_all, fields(max_attempts = self.config.max_attempts))]
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.result
    }

    /// Like [`execute`](Self::execute), also reporting attempts and sleeps
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut delays = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            let attempts = attempt + 1;
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempts, "operation recovered");
                    }
                    return RetryOutcome { result: Ok(value), attempts, delays };
                }
                Err(error) => error,
            };

            let delay = match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => {
                    debug!(attempts, %error, "failure is not retryable");
                    let result = Err(RetryError::NonRetryable { source: error });
                    return RetryOutcome { result, attempts, delays };
                }
                RetryDecision::Retry => {
                    self.config.jitter.apply(self.config.backoff.calculate_delay(attempt))
                }
                RetryDecision::RetryAfter(delay) => delay,
            };

            if attempts >= max_attempts {
                warn!(attempts, %error, "retry budget exhausted");
                let result = Err(RetryError::AttemptsExhausted { attempts, source: error });
                return RetryOutcome { result, attempts, delays };
            }

            warn!(attempts, ?delay, %error, "attempt failed; backing off");
            tokio::time::sleep(delay).await;
            delays.push(delay);
            attempt = attempts;
        }
    }
}

pub mod policies {
    use super::{ErrorClassification, RetryDecision, RetryPolicy};

    /// Retries errors that classify themselves as retryable, honoring
    /// their `retry_after` hint
    #[derive(Debug, Clone, Copy, Default)]
    pub struct RetryTransient;

    impl<E: ErrorClassification> RetryPolicy<E> for RetryTransient {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            match (error.is_retryable(), error.retry_after()) {
                (false, _) => RetryDecision::Stop,
                (true, Some(delay)) => RetryDecision::RetryAfter(delay),
                (true, None) => RetryDecision::Retry,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::policies::RetryTransient;
    use super::*;
    use crate::error::ErrorSeverity;

    #[derive(Debug)]
    struct Flaky {
        transient: bool,
    }

    impl fmt::Display for Flaky {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "flaky(transient={})", self.transient)
        }
    }

    impl ErrorClassification for Flaky {
        fn is_retryable(&self) -> bool {
            self.transient
        }

        fn severity(&self) -> ErrorSeverity {
            ErrorSeverity::Warning
        }

        fn is_critical(&self) -> bool {
            false
        }

        fn retry_after(&self) -> Option<Duration> {
            None
        }
    }

    fn always<E>(_: &E, _: u32) -> RetryDecision {
        RetryDecision::Retry
    }

    fn never<E>(_: &E, _: u32) -> RetryDecision {
        RetryDecision::Stop
    }

    fn instant(attempts: u32) -> RetryConfig {
        RetryConfig::builder()
            .max_attempts(attempts)
            .fixed_backoff(Duration::from_millis(1))
            .no_jitter()
            .build()
            .expect("valid config")
    }

    /// Counts calls and fails the first `failures` of them
    fn failing(
        calls: &Arc<AtomicU32>,
        failures: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, String>> {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < failures { Err(format!("failure #{n}")) } else { Ok(n) })
        }
    }

    #[test]
    fn exponential_backoff_doubles_then_caps() {
        let backoff = BackoffStrategy::Exponential {
            initial_delay: Duration::from_millis(250),
            base: 2.0,
            max_delay: Duration::from_secs(60),
        };

        let delays: Vec<_> = (0..3).map(|n| backoff.calculate_delay(n)).collect();
        assert_eq!(delays, [250, 500, 1_000].map(Duration::from_millis));
        assert_eq!(backoff.calculate_delay(30), Duration::from_secs(60));
    }

    /// Validates the jitter variants.
    ///
    /// Assertions:
    /// - Additive jitter stays within `[delay, delay + max)`
    /// - Full jitter stays below the delay and maps zero to zero
    #[test]
    fn jitter_stays_in_window() {
        let delay = Duration::from_millis(4_000);
        let additive = Jitter::Additive { max: Duration::from_millis(1_000) };
        for _ in 0..500 {
            let jittered = additive.apply(delay);
            assert!(jittered >= delay && jittered < delay + Duration::from_millis(1_000));
        }

        assert_eq!(Jitter::None.apply(delay), delay);
        assert!(Jitter::Full.apply(delay) < delay);
        assert_eq!(Jitter::Full.apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn builder_rejects_invalid_configs() {
        assert!(RetryConfig::builder().max_attempts(0).build().is_err());
        let flat = RetryConfig::builder().exponential_backoff(
            Duration::from_millis(1),
            0.0,
            Duration::from_secs(1),
        );
        assert!(flat.build().is_err());
        assert_eq!(RetryConfig::builder().build().expect("default"), RetryConfig::default());
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let outcome = RetryExecutor::new(instant(3), always::<String>)
            .execute_with_outcome(failing(&calls, 2))
            .await;

        assert_eq!((outcome.attempts, outcome.delays.len()), (3, 2));
        assert_eq!(outcome.result.expect("third attempt succeeds"), 2);
    }

    /// Validates that exhaustion keeps the last error.
    ///
    /// Assertions:
    /// - The operation runs exactly `max_attempts` times
    /// - `AttemptsExhausted` carries the final failure
    #[tokio::test]
    async fn exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = RetryExecutor::new(instant(3), always::<String>)
            .execute(failing(&calls, u32::MAX))
            .await;

        match result {
            Err(RetryError::AttemptsExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert_eq!(source, "failure #2");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stop_decision_ends_after_one_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let result =
            RetryExecutor::new(instant(5), never::<String>).execute(failing(&calls, 1)).await;

        assert!(matches!(result, Err(RetryError::NonRetryable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_policy_stops_on_terminal_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = RetryExecutor::new(instant(5), RetryTransient)
            .execute(|| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err::<(), _>(Flaky { transient: n < 1 }))
            })
            .await;

        match result {
            Err(RetryError::NonRetryable { source }) => assert!(!source.transient),
            other => panic!("expected terminal error, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    /// Validates the sleep schedule under paused time.
    ///
    /// Assertions:
    /// - Delay n lies in `[base * 2^n, base * 2^n + 1000ms)`
    #[tokio::test(start_paused = true)]
    async fn backoff_schedule_with_additive_jitter() {
        let config = RetryConfig::builder()
            .max_attempts(4)
            .exponential_backoff(Duration::from_millis(500), 2.0, Duration::from_secs(60))
            .additive_jitter(Duration::from_millis(1_000))
            .build()
            .expect("valid config");

        let outcome = RetryExecutor::new(config, always::<&str>)
            .execute_with_outcome(|| async { Err::<(), _>("down") })
            .await;

        assert_eq!((outcome.attempts, outcome.delays.len()), (4, 3));
        for (n, delay) in outcome.delays.iter().enumerate() {
            let floor = Duration::from_millis(500 << n);
            assert!(*delay >= floor && *delay < floor + Duration::from_millis(1_000));
        }
        assert!(outcome.delays.iter().sum::<Duration>() >= Duration::from_millis(3_500));
    }

    #[test]
    fn into_source_unwraps_operation_errors() {
        let err: RetryError<&str> = RetryError::AttemptsExhausted { attempts: 2, source: "x" };
        assert_eq!(err.into_source(), Some("x"));
        let err: RetryError<&str> = RetryError::InvalidConfiguration { message: "m".into() };
        assert_eq!(err.into_source(), None);
    }
}
