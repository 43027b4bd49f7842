//! Error types used throughout the application

use std::time::Duration;

use loadplan_common::error::{ErrorClassification, ErrorSeverity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for loadplan
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LoadplanError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failures, timeouts and 5xx responses
    #[error("Network error: {0}")]
    Network(String),

    /// 4xx responses; never retried
    #[error("Request rejected with status {status}: {message}")]
    Request { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// Every file was processed but none produced records
    #[error("No data found: {0}")]
    NoData(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoadplanError {
    /// Stable label used in log fields and error events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Request { .. } => "request",
            Self::Parse(_) => "parse",
            Self::NoData(_) => "no_data",
            Self::Persistence(_) => "persistence",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }

    /// Classify an HTTP status code into the network/request split
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status >= 500 {
            Self::Network(format!("server error {status}: {message}"))
        } else {
            Self::Request { status, message }
        }
    }
}

impl ErrorClassification for LoadplanError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Network(_) | Self::Persistence(_) | Self::Parse(_) => ErrorSeverity::Warning,
            Self::NoData(_) | Self::InvalidInput(_) => ErrorSeverity::Info,
            Self::Config(_) | Self::Request { .. } => ErrorSeverity::Error,
            Self::Internal(_) => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Result type alias for loadplan operations
pub type Result<T> = std::result::Result<T, LoadplanError>;
