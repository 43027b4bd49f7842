//! Resilience patterns for transient failures
//!
//! - **Retry Logic**: configurable retry strategies with exponential backoff
//!   and jitter, generic over the operation's error type
//!
//! Policies decide *whether* to retry; the executor owns *when*. Callers that
//! already classify their errors can use [`policies::RetryTransient`].

pub mod retry;

pub use retry::{
    policies, BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
