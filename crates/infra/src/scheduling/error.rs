//! Scheduler error types

use std::time::Duration;

use loadplan_domain::LoadplanError;
use thiserror::Error;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The watcher task did not finish within the join timeout
    #[error("Watcher did not stop within {duration:?}")]
    Timeout { duration: Duration },

    /// The watcher task panicked or was aborted
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<tokio::task::JoinError> for SchedulerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoinFailed(err.to_string())
    }
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        InfraError(LoadplanError::Internal(err.to_string()))
    }
}

impl From<SchedulerError> for LoadplanError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
