//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use loadplan_domain::LoadplanError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LoadplanError);

impl From<InfraError> for LoadplanError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LoadplanError> for InfraError {
    fn from(value: LoadplanError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoLoadplanError {
    fn into_loadplan(self) -> LoadplanError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LoadplanError */
/* -------------------------------------------------------------------------- */

impl IntoLoadplanError for HttpError {
    fn into_loadplan(self) -> LoadplanError {
        if self.is_timeout() {
            return LoadplanError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return LoadplanError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let reason = status.canonical_reason().unwrap_or("unknown status");
            return LoadplanError::from_status(status.as_u16(), reason);
        }

        if self.is_decode() {
            return LoadplanError::Parse(format!("failed to decode HTTP body: {self}"));
        }

        if self.is_builder() {
            return LoadplanError::Config(format!("invalid HTTP request: {self}"));
        }

        LoadplanError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_loadplan())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → LoadplanError */
/* -------------------------------------------------------------------------- */

impl IntoLoadplanError for JsonError {
    fn into_loadplan(self) -> LoadplanError {
        if self.is_io() {
            return LoadplanError::Persistence(format!("JSON I/O failure: {self}"));
        }
        LoadplanError::Parse(format!(
            "invalid JSON at line {} column {}: {self}",
            self.line(),
            self.column()
        ))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_loadplan())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → LoadplanError */
/* -------------------------------------------------------------------------- */

impl IntoLoadplanError for IoError {
    fn into_loadplan(self) -> LoadplanError {
        match self.kind() {
            ErrorKind::PermissionDenied => {
                LoadplanError::Persistence(format!("permission denied: {self}"))
            }
            ErrorKind::NotFound => LoadplanError::Persistence(format!("not found: {self}")),
            _ => LoadplanError::Persistence(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_loadplan())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
