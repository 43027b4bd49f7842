//! Remote sync state and reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;
use uuid::Uuid;

use crate::constants::SPREADSHEET_EXTENSIONS;
use crate::impl_domain_status_conversions;
use crate::types::order::OrderRecord;
use crate::types::stats::ParseStatistics;

/// A file discovered on the remote host
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    /// RFC 3339 modification time as reported by the host
    #[serde(default)]
    pub modified_time: String,
    /// The host reports sizes as decimal strings
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub size: Option<u64>,
}

impl RemoteFile {
    /// Lowercase extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        self.name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
    }

    pub fn is_spreadsheet(&self) -> bool {
        self.extension().is_some_and(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
    }
}

/// Output of parsing one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    pub orders: Vec<OrderRecord>,
    pub statistics: ParseStatistics,
}

/* -------------------------------------------------------------------------- */
/* Sync State */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum SyncMode {
    #[default]
    Idle,
    Syncing,
    Watching,
    Error,
}

impl_domain_status_conversions!(SyncMode {
    Idle => "idle",
    Syncing => "syncing",
    Watching => "watching",
    Error => "error",
});

/// One file that could not be downloaded or parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file: String,
    pub kind: String,
    pub message: String,
}

/// Summary of one completed sync run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub sync_id: Uuid,
    pub signature: String,
    pub files_total: usize,
    pub files_ok: usize,
    pub files_failed: Vec<FileFailure>,
    pub orders: usize,
    pub parse_statistics: ParseStatistics,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Whether the secondary cache accepted the snapshot
    pub cache_written: bool,
}

/// Observable orchestrator state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub mode: SyncMode,
    pub last_signature: Option<String>,
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub files: Vec<RemoteFile>,
    pub last_report: Option<SyncReport>,
}

/// Result of a `sync()` call that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Refreshed(SyncReport),
    /// Remote signature matched the stored one; nothing was downloaded
    Unchanged,
    /// Another sync was already in flight
    AlreadyRunning,
}

impl SyncOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed(_))
    }

    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Refreshed(report) => Some(report),
            _ => None,
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Provenance */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Remote,
    SecondaryCache,
}

impl_domain_status_conversions!(DataSource {
    Remote => "remote",
    SecondaryCache => "secondary_cache",
});

/// Where the current record set came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: DataSource,
    pub fetched_at: DateTime<Utc>,
    pub file_count: usize,
    pub signature: Option<String>,
}

/// Records persisted by the secondary cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub scope: String,
    pub saved_at: DateTime<Utc>,
    pub records: Vec<OrderRecord>,
}
