//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Remote host
pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const SPREADSHEET_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

// Sync timing
pub const DEV_POLL_INTERVAL_MS: u64 = 60_000;
pub const PROD_POLL_INTERVAL_MS: u64 = 300_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PARSE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1_000;
/// Upper bound (exclusive) of the random jitter added to each backoff
pub const BACKOFF_JITTER_MS: u64 = 1_000;
pub const DEFAULT_FOCUS_STALENESS_MS: u64 = 300_000;

// Result cache
pub const DEFAULT_RESULT_CACHE_CAPACITY: usize = 50;
/// Bump whenever a filter field is added or its canonical form changes
pub const FILTER_KEY_SCHEMA: &str = "v1";

// Secondary cache
pub const ALL_FACTORIES_SCOPE: &str = "ALL_FACTORIES";
pub const DEFAULT_SNAPSHOT_DIR: &str = ".loadplan-cache";

// Classification
pub const DEFAULT_WARNING_DAYS: i64 = 7;
pub const DEFAULT_CRITICAL_DAYS: i64 = 3;

// Parsing
pub const UNKNOWN_DESTINATION: &str = "Unknown";
/// Placeholder some exports write into empty date cells
pub const NULL_TIME_PLACEHOLDER: &str = "00:00:00";
