//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Load from `LOADPLAN_*` environment variables when the remote
//!    credentials are present there
//! 2. Otherwise load from the first config file found by
//!    [`probe_config_paths`] (JSON or TOML, by extension)
//! 3. With neither, fall back to defaults; the remote host then stays
//!    unconfigured and syncs report a configuration error
//!
//! ## Environment Variables
//! - `LOADPLAN_API_KEY`, `LOADPLAN_FOLDER_ID` (required for env loading)
//! - `LOADPLAN_BASE_URL`
//! - `LOADPLAN_ENV` (`development` | `production`)
//! - `LOADPLAN_POLL_INTERVAL_MS`, `LOADPLAN_REQUEST_TIMEOUT_MS`,
//!   `LOADPLAN_PARSE_TIMEOUT_MS`, `LOADPLAN_MAX_ATTEMPTS`,
//!   `LOADPLAN_BASE_BACKOFF_MS`, `LOADPLAN_FOCUS_STALENESS_MS`
//! - `LOADPLAN_CACHE_CAPACITY`, `LOADPLAN_SNAPSHOT_DIR`, `LOADPLAN_SCOPE_TAG`
//! - `LOADPLAN_WARNING_DAYS`, `LOADPLAN_CRITICAL_DAYS`

use std::path::{Path, PathBuf};
use std::str::FromStr;

use loadplan_domain::{Config, Environment, LoadplanError, Result};

const FILE_STEMS: [&str; 2] = ["loadplan", "config"];
const FILE_EXTENSIONS: [&str; 2] = ["toml", "json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `LoadplanError::Config` when a source is found but invalid.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            return Ok(config);
        }
        Err(e) => tracing::debug!(error = %e, "Environment incomplete, trying config file"),
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::warn!("No configuration found; using defaults without a remote host");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `LOADPLAN_API_KEY` and `LOADPLAN_FOLDER_ID` must be set; every other
/// variable is optional and falls back to its default.
///
/// # Errors
/// Returns `LoadplanError::Config` if a required variable is missing or a
/// value does not parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.remote.api_key = Some(env_var("LOADPLAN_API_KEY")?);
    config.remote.folder_id = Some(env_var("LOADPLAN_FOLDER_ID")?);
    if let Some(base_url) = env_opt("LOADPLAN_BASE_URL") {
        config.remote.base_url = base_url;
    }

    if let Some(environment) = env_opt("LOADPLAN_ENV") {
        config.sync.environment =
            environment.parse::<Environment>().map_err(LoadplanError::Config)?;
    }
    if let Some(interval) = env_parse::<u64>("LOADPLAN_POLL_INTERVAL_MS")? {
        config.sync.poll_interval_ms = Some(interval);
    }
    override_with(&mut config.sync.request_timeout_ms, "LOADPLAN_REQUEST_TIMEOUT_MS")?;
    override_with(&mut config.sync.parse_timeout_ms, "LOADPLAN_PARSE_TIMEOUT_MS")?;
    override_with(&mut config.sync.max_attempts, "LOADPLAN_MAX_ATTEMPTS")?;
    override_with(&mut config.sync.base_backoff_ms, "LOADPLAN_BASE_BACKOFF_MS")?;
    override_with(&mut config.sync.focus_staleness_ms, "LOADPLAN_FOCUS_STALENESS_MS")?;

    override_with(&mut config.cache.capacity, "LOADPLAN_CACHE_CAPACITY")?;
    if let Some(dir) = env_opt("LOADPLAN_SNAPSHOT_DIR") {
        config.cache.snapshot_dir = PathBuf::from(dir);
    }
    if let Some(scope) = env_opt("LOADPLAN_SCOPE_TAG") {
        config.cache.scope_tag = scope;
    }

    override_with(&mut config.classification.warning_days, "LOADPLAN_WARNING_DAYS")?;
    override_with(&mut config.classification.critical_days, "LOADPLAN_CRITICAL_DAYS")?;

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `LoadplanError::Config` if the file is missing, unreadable, in
/// an unsupported format, or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LoadplanError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LoadplanError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LoadplanError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration; format is chosen by extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LoadplanError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LoadplanError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(LoadplanError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations
///
/// Searches the working directory and the executable's directory for
/// `loadplan.{toml,json}` then `config.{toml,json}`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| {
            FILE_STEMS.iter().flat_map(move |stem| {
                FILE_EXTENSIONS.iter().map(move |ext| root.join(format!("{stem}.{ext}")))
            })
        })
        .find(|path| path.exists())
}

/// Required, non-empty environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        LoadplanError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| LoadplanError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

fn override_with<T>(slot: &mut T, key: &str) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = env_parse(key)? {
        *slot = value;
    }
    Ok(())
}
