//! Shared test helpers for `loadplan-core` integration tests.
//!
//! In-memory implementations of the sync ports plus record builders, so
//! orchestrator and engine tests can focus on behaviour instead of wiring.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use loadplan_common::time::MockClock;
use loadplan_core::events::EventBus;
use loadplan_core::store::RecordStore;
use loadplan_core::sync::{FileParser, RemoteFileHost, SecondaryCache, SyncOrchestrator};
use loadplan_domain::{
    CachedSnapshot, Factory, LoadplanError, OrderRecord, ParseStatistics, ParsedFile,
    RemoteFile, Result, Stage, StageProgress, SyncConfig,
};
use parking_lot::Mutex;

/// Wall-clock start used by every fixture: 2025-03-12 09:00 UTC
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).single().expect("valid fixture time")
}

pub fn order(po: &str, factory: Factory, quantity: u64, crd: &str) -> OrderRecord {
    OrderRecord {
        po_number: po.into(),
        factory,
        destination: "Germany".into(),
        vendor: "V1".into(),
        quantity,
        crd: crd.into(),
        sdd_value: crd.into(),
        ..OrderRecord::default()
    }
}

pub fn shipped(mut record: OrderRecord) -> OrderRecord {
    record.production.insert(Stage::WhOut, StageProgress::completed_all(record.quantity));
    record
}

pub fn json_bytes(records: &[OrderRecord]) -> Vec<u8> {
    serde_json::to_vec(records).expect("records serialize")
}

pub fn remote_file(id: &str, name: &str, modified: &str) -> RemoteFile {
    RemoteFile {
        id: id.into(),
        name: name.into(),
        mime_type: "text/csv".into(),
        modified_time: modified.into(),
        size: None,
    }
}

#[derive(Clone)]
enum Body {
    Bytes(Vec<u8>),
    Fail(LoadplanError),
}

/// Scripted remote host
#[derive(Default)]
pub struct MockFileHost {
    files: Mutex<Vec<RemoteFile>>,
    bodies: Mutex<HashMap<String, Body>>,
    listing_error: Mutex<Option<LoadplanError>>,
    list_calls: AtomicUsize,
    download_calls: Mutex<HashMap<String, usize>>,
}

impl MockFileHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, file: RemoteFile, bytes: Vec<u8>) {
        self.bodies.lock().insert(file.id.clone(), Body::Bytes(bytes));
        self.upsert(file);
    }

    pub fn put_failing(&self, file: RemoteFile, error: LoadplanError) {
        self.bodies.lock().insert(file.id.clone(), Body::Fail(error));
        self.upsert(file);
    }

    fn upsert(&self, file: RemoteFile) {
        let mut files = self.files.lock();
        files.retain(|existing| existing.id != file.id);
        files.push(file);
    }

    pub fn fail_listing(&self, error: Option<LoadplanError>) {
        *self.listing_error.lock() = error;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn downloads_of(&self, id: &str) -> usize {
        self.download_calls.lock().get(id).copied().unwrap_or(0)
    }

    pub fn total_downloads(&self) -> usize {
        self.download_calls.lock().values().sum()
    }
}

#[async_trait]
impl RemoteFileHost for MockFileHost {
    async fn list_files(&self) -> Result<Vec<RemoteFile>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.listing_error.lock().clone() {
            return Err(error);
        }
        Ok(self.files.lock().clone())
    }

    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>> {
        *self.download_calls.lock().entry(file.id.clone()).or_default() += 1;
        match self.bodies.lock().get(&file.id).cloned() {
            Some(Body::Bytes(bytes)) => Ok(bytes),
            Some(Body::Fail(error)) => Err(error),
            None => Err(LoadplanError::from_status(404, format!("no such file {}", file.id))),
        }
    }
}

/// Parses a JSON array of records; anything else is a parse error
#[derive(Debug, Default)]
pub struct JsonRecordParser;

impl FileParser for JsonRecordParser {
    fn parse(&self, bytes: &[u8], filename: &str) -> Result<ParsedFile> {
        let orders: Vec<OrderRecord> = serde_json::from_slice(bytes)
            .map_err(|err| LoadplanError::Parse(format!("{filename}: {err}")))?;
        let count = orders.len() as u64;
        let statistics = ParseStatistics {
            rows_read: count,
            records: count,
            ..ParseStatistics::default()
        };
        Ok(ParsedFile { orders, statistics })
    }
}

/// In-memory secondary cache
#[derive(Default)]
pub struct MemorySecondaryCache {
    snapshots: Mutex<HashMap<String, CachedSnapshot>>,
    fail_writes: Mutex<bool>,
    writes: AtomicUsize,
}

impl MemorySecondaryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, scope: &str, saved_at: DateTime<Utc>, records: Vec<OrderRecord>) {
        self.snapshots
            .lock()
            .insert(scope.into(), CachedSnapshot { scope: scope.into(), saved_at, records });
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn stored(&self, scope: &str) -> Option<CachedSnapshot> {
        self.snapshots.lock().get(scope).cloned()
    }
}

#[async_trait]
impl SecondaryCache for MemorySecondaryCache {
    async fn store(&self, scope: &str, records: &[OrderRecord]) -> Result<()> {
        if *self.fail_writes.lock() {
            return Err(LoadplanError::Persistence("disk full".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.seed(scope, fixture_now(), records.to_vec());
        Ok(())
    }

    async fn load(&self, scope: &str) -> Result<Option<CachedSnapshot>> {
        Ok(self.stored(scope))
    }
}

/// Fast retry settings so paused-time tests stay short
pub fn test_sync_config() -> SyncConfig {
    SyncConfig { max_attempts: 3, base_backoff_ms: 10, ..SyncConfig::default() }
}

pub struct Harness {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub host: Arc<MockFileHost>,
    pub secondary: Arc<MemorySecondaryCache>,
    pub clock: Arc<MockClock>,
    pub store: Arc<RecordStore>,
    pub bus: EventBus,
}

pub fn harness() -> Harness {
    let store = Arc::new(RecordStore::new());
    let bus = EventBus::new();
    let clock = Arc::new(MockClock::at_utc(fixture_now()));
    let host = MockFileHost::new();
    let secondary = MemorySecondaryCache::new();
    let orchestrator = SyncOrchestrator::new(
        Arc::clone(&store),
        bus.clone(),
        Arc::new(JsonRecordParser),
        clock.clone(),
        test_sync_config(),
        "ALL_FACTORIES",
    )
    .with_host(host.clone())
    .with_secondary_cache(secondary.clone());

    Harness { orchestrator: Arc::new(orchestrator), host, secondary, clock, store, bus }
}
