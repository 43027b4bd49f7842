//! Port interfaces for remote sync

use async_trait::async_trait;
use loadplan_domain::{CachedSnapshot, OrderRecord, ParsedFile, RemoteFile, Result};

/// Shared-file host holding the loadplan spreadsheets
#[async_trait]
pub trait RemoteFileHost: Send + Sync {
    /// List every file in the configured folder
    async fn list_files(&self) -> Result<Vec<RemoteFile>>;

    /// Download the raw bytes of one file
    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>>;
}

/// Converts raw file bytes into order records
pub trait FileParser: Send + Sync {
    fn parse(&self, bytes: &[u8], filename: &str) -> Result<ParsedFile>;
}

/// Durable copy of the last good record set
#[async_trait]
pub trait SecondaryCache: Send + Sync {
    async fn store(&self, scope: &str, records: &[OrderRecord]) -> Result<()>;

    async fn load(&self, scope: &str) -> Result<Option<CachedSnapshot>>;
}
