//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ALL_FACTORIES_SCOPE, DEFAULT_BASE_BACKOFF_MS, DEFAULT_CRITICAL_DAYS, DEFAULT_DRIVE_BASE_URL,
    DEFAULT_FOCUS_STALENESS_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_PARSE_TIMEOUT_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RESULT_CACHE_CAPACITY, DEFAULT_SNAPSHOT_DIR,
    DEFAULT_WARNING_DAYS, DEV_POLL_INTERVAL_MS, PROD_POLL_INTERVAL_MS,
};
use crate::impl_domain_status_conversions;
use crate::{LoadplanError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub classification: ClassificationThresholds,
}

/// Remote file host access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub folder_id: Option<String>,
    pub base_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { api_key: None, folder_id: None, base_url: DEFAULT_DRIVE_BASE_URL.to_string() }
    }
}

impl RemoteConfig {
    /// API key and folder id, or a configuration error naming what is missing
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let key = self.api_key.as_deref().filter(|k| !k.trim().is_empty());
        let folder = self.folder_id.as_deref().filter(|f| !f.trim().is_empty());
        match (key, folder) {
            (Some(key), Some(folder)) => Ok((key, folder)),
            (None, Some(_)) => Err(LoadplanError::Config("remote API key is not set".into())),
            (Some(_), None) => Err(LoadplanError::Config("remote folder id is not set".into())),
            (None, None) => {
                Err(LoadplanError::Config("remote API key and folder id are not set".into()))
            }
        }
    }
}

/// Deployment environment; selects the default poll interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl_domain_status_conversions!(Environment {
    Development => "development",
    Production => "production",
});

/// Sync orchestration timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub environment: Environment,
    /// Overrides the per-environment default when set
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_ms: u64,
    pub parse_timeout_ms: u64,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub focus_staleness_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            poll_interval_ms: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            parse_timeout_ms: DEFAULT_PARSE_TIMEOUT_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
            focus_staleness_ms: DEFAULT_FOCUS_STALENESS_MS,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        let millis = self.poll_interval_ms.unwrap_or(match self.environment {
            Environment::Development => DEV_POLL_INTERVAL_MS,
            Environment::Production => PROD_POLL_INTERVAL_MS,
        });
        Duration::from_millis(millis)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn parse_timeout(&self) -> Duration {
        Duration::from_millis(self.parse_timeout_ms)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn focus_staleness(&self) -> Duration {
        Duration::from_millis(self.focus_staleness_ms)
    }
}

/// Result cache and secondary snapshot cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub snapshot_dir: PathBuf,
    pub scope_tag: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_RESULT_CACHE_CAPACITY,
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            scope_tag: ALL_FACTORIES_SCOPE.to_string(),
        }
    }
}

/// Day windows used by the warning/critical classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationThresholds {
    pub warning_days: i64,
    pub critical_days: i64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self { warning_days: DEFAULT_WARNING_DAYS, critical_days: DEFAULT_CRITICAL_DAYS }
    }
}

impl Config {
    /// Check internal consistency. Missing credentials are not an error here;
    /// they only disable the remote host.
    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            return Err(LoadplanError::Config("cache capacity must be greater than 0".into()));
        }
        if self.sync.max_attempts == 0 {
            return Err(LoadplanError::Config("max_attempts must be greater than 0".into()));
        }
        if self.sync.poll_interval_ms == Some(0) {
            return Err(LoadplanError::Config("poll interval must be greater than 0".into()));
        }
        let ClassificationThresholds { warning_days, critical_days } = self.classification;
        if critical_days < 0 || warning_days < critical_days {
            return Err(LoadplanError::Config(format!(
                "thresholds must satisfy 0 <= critical ({critical_days}) \
                 <= warning ({warning_days})"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_defaults_per_environment() {
        let mut sync = SyncConfig::default();
        assert_eq!(sync.poll_interval(), Duration::from_millis(DEV_POLL_INTERVAL_MS));

        sync.environment = Environment::Production;
        assert_eq!(sync.poll_interval(), Duration::from_millis(PROD_POLL_INTERVAL_MS));

        sync.poll_interval_ms = Some(1_500);
        assert_eq!(sync.poll_interval(), Duration::from_millis(1_500));
    }

    #[test]
    fn credentials_report_what_is_missing() {
        let mut remote = RemoteConfig::default();
        assert!(matches!(remote.credentials(), Err(LoadplanError::Config(m)) if m.contains("and")));

        remote.folder_id = Some("folder".into());
        assert!(matches!(remote.credentials(), Err(LoadplanError::Config(m)) if m.contains("key")));

        remote.api_key = Some("key".into());
        assert_eq!(remote.credentials().expect("complete"), ("key", "folder"));
    }

    #[test]
    fn validate_rejects_inverted_thresholds() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.classification = ClassificationThresholds { warning_days: 2, critical_days: 3 };
        assert!(config.validate().is_err());

        config.classification = ClassificationThresholds::default();
        config.cache.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_style_input_fills_defaults() {
        let json = r#"{"sync": {"environment": "production"}, "cache": {"capacity": 5}}"#;
        let config: Config = serde_json::from_str(json).expect("valid json");
        assert_eq!(config.sync.environment, Environment::Production);
        assert_eq!(config.sync.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.cache.capacity, 5);
        assert_eq!(config.cache.scope_tag, ALL_FACTORIES_SCOPE);
    }
}
