//! JSON-file secondary cache
//!
//! One file per scope (`<dir>/<scope>.json`) holding `{scope, saved_at,
//! records}`. Writes go to a sibling temp file that is renamed into place,
//! so readers never observe a half-written snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use loadplan_common::time::Clock;
use loadplan_core::sync::SecondaryCache;
use loadplan_domain::{CachedSnapshot, LoadplanError, OrderRecord, Result};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::InfraError;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    scope: &'a str,
    saved_at: chrono::DateTime<chrono::Utc>,
    records: &'a [OrderRecord],
}

/// Secondary cache persisted as JSON files in a directory
pub struct JsonSnapshotCache {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl JsonSnapshotCache {
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self { dir: dir.into(), clock }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `scope`'s snapshot. Characters outside `[A-Za-z0-9_-]`
    /// are replaced so a scope can never escape the directory.
    pub fn path_for(&self, scope: &str) -> PathBuf {
        let file_stem: String = scope
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let file_stem = if file_stem.is_empty() { "_".to_string() } else { file_stem };
        self.dir.join(format!("{file_stem}.json"))
    }
}

fn io_error(err: std::io::Error) -> LoadplanError {
    InfraError::from(err).into()
}

#[async_trait]
impl SecondaryCache for JsonSnapshotCache {
    async fn store(&self, scope: &str, records: &[OrderRecord]) -> Result<()> {
        let snapshot = SnapshotRef { scope, saved_at: self.clock.utc_now(), records };
        let body = serde_json::to_vec(&snapshot)
            .map_err(|err| LoadplanError::from(InfraError::from(err)))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;
        let target = self.path_for(scope);
        let temp = target.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));

        if let Err(err) = tokio::fs::write(&temp, &body).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(io_error(err));
        }
        if let Err(err) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(io_error(err));
        }

        debug!(scope, records = records.len(), path = %target.display(), "snapshot written");
        Ok(())
    }

    async fn load(&self, scope: &str) -> Result<Option<CachedSnapshot>> {
        let path = self.path_for(scope);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(err)),
        };

        match serde_json::from_slice::<CachedSnapshot>(&bytes) {
            Ok(snapshot) if snapshot.scope == scope => Ok(Some(snapshot)),
            Ok(snapshot) => {
                warn!(expected = scope, found = %snapshot.scope, "snapshot scope mismatch");
                Ok(None)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding unreadable snapshot");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for JsonSnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSnapshotCache").field("dir", &self.dir).finish_non_exhaustive()
    }
}
