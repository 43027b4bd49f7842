//! Remote sync orchestrator - core business logic
//!
//! Pulls the loadplan files from the remote host, reconciles them into one
//! record set and publishes it to the record store. Failures never discard
//! the last-known-good data.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use loadplan_common::time::Clock;
use loadplan_domain::{
    DataSource, Factory, FileFailure, LoadplanError, OrderRecord, ParseStatistics, Provenance,
    RemoteFile, Result, SyncConfig, SyncMode, SyncOutcome, SyncReport, SyncState,
};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::ports::{FileParser, RemoteFileHost, SecondaryCache};
use super::retry::fetch_with_retry;
use crate::events::{EventBus, SyncEvent};
use crate::store::RecordStore;

/// Combined signature of a file listing: modification times, sorted and
/// joined. Any added, removed or touched file changes it.
pub fn combined_signature(files: &[RemoteFile]) -> String {
    let mut stamps: Vec<&str> = files.iter().map(|file| file.modified_time.as_str()).collect();
    stamps.sort_unstable();
    stamps.join("|")
}

/// Spreadsheet files in processing order (by name)
fn sync_candidates(files: &[RemoteFile]) -> Vec<RemoteFile> {
    let mut candidates: Vec<RemoteFile> =
        files.iter().filter(|file| file.is_spreadsheet()).cloned().collect();
    candidates.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    candidates
}

/// Fill `Unknown` factories from the file name
fn attribute_factory(records: &mut [OrderRecord], file_name: &str) {
    let Some(factory) = Factory::from_file_name(file_name) else {
        return;
    };
    for record in records.iter_mut().filter(|record| record.factory == Factory::Unknown) {
        record.factory = factory;
    }
}

struct Collected {
    orders: Vec<OrderRecord>,
    statistics: ParseStatistics,
    files_ok: usize,
    failures: Vec<FileFailure>,
}

/// Remote sync orchestrator
pub struct SyncOrchestrator {
    store: Arc<RecordStore>,
    bus: EventBus,
    parser: Arc<dyn FileParser>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    scope_tag: String,
    host: Option<Arc<dyn RemoteFileHost>>,
    secondary: Option<Arc<dyn SecondaryCache>>,
    in_flight: tokio::sync::Mutex<()>,
    watching: AtomicBool,
    state: RwLock<SyncState>,
}

impl SyncOrchestrator {
    /// Create an orchestrator without a remote host or secondary cache
    pub fn new(
        store: Arc<RecordStore>,
        bus: EventBus,
        parser: Arc<dyn FileParser>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
        scope_tag: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bus,
            parser,
            clock,
            config,
            scope_tag: scope_tag.into(),
            host: None,
            secondary: None,
            in_flight: tokio::sync::Mutex::new(()),
            watching: AtomicBool::new(false),
            state: RwLock::new(SyncState::default()),
        }
    }

    /// Attach the remote file host
    pub fn with_host(mut self, host: Arc<dyn RemoteFileHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Attach the secondary cache used for fallback data
    pub fn with_secondary_cache(mut self, cache: Arc<dyn SecondaryCache>) -> Self {
        self.secondary = Some(cache);
        self
    }

    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    pub fn state(&self) -> SyncState {
        self.state.read().clone()
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::Acquire)
    }

    /// Flag whether a background watcher is driving syncs
    pub fn set_watching(&self, watching: bool) {
        self.watching.store(watching, Ordering::Release);
        let mut state = self.state.write();
        match (state.mode, watching) {
            (SyncMode::Idle, true) => state.mode = SyncMode::Watching,
            (SyncMode::Watching, false) => state.mode = SyncMode::Idle,
            _ => {}
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc_now()
    }

    fn settled_mode(&self) -> SyncMode {
        if self.is_watching() {
            SyncMode::Watching
        } else {
            SyncMode::Idle
        }
    }

    /// Fetch, reconcile and publish the remote record set.
    ///
    /// A call made while another sync is in flight returns
    /// [`SyncOutcome::AlreadyRunning`] without touching the network.
    #[instrument(skip(self), fields(sync_id = tracing::field::Empty))]
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("sync already in flight");
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let sync_id = Uuid::now_v7();
        tracing::Span::current().record("sync_id", tracing::field::display(sync_id));
        let started_at = self.now();
        {
            let mut state = self.state.write();
            state.mode = SyncMode::Syncing;
            state.last_fetch_at = Some(started_at);
        }

        match self.run(sync_id, started_at).await {
            Ok(outcome) => {
                let mut state = self.state.write();
                state.mode = self.settled_mode();
                state.last_error = None;
                if let SyncOutcome::Refreshed(report) = &outcome {
                    state.last_report = Some(report.clone());
                }
                Ok(outcome)
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "sync failed");
                {
                    let mut state = self.state.write();
                    state.mode = SyncMode::Error;
                    state.last_error = Some(err.to_string());
                }
                self.bus.emit(&SyncEvent::Error {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                    context: "sync".to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run(&self, sync_id: Uuid, started_at: DateTime<Utc>) -> Result<SyncOutcome> {
        let host = self
            .host
            .as_ref()
            .ok_or_else(|| LoadplanError::Config("remote host is not configured".into()))?;

        let listing = fetch_with_retry(
            || host.list_files(),
            self.config.max_attempts,
            self.config.base_backoff(),
        )
        .await?;
        let files = sync_candidates(&listing);
        let signature = combined_signature(&files);
        debug!(listed = listing.len(), spreadsheets = files.len(), "remote listing fetched");

        let unchanged = {
            let mut state = self.state.write();
            state.files = files.clone();
            let unchanged = state.last_signature.as_deref() == Some(signature.as_str());
            // a confirmed match is as fresh as a full refresh
            if unchanged {
                state.last_success_at = Some(self.now());
            }
            unchanged
        };
        if unchanged {
            debug!("remote signature unchanged");
            return Ok(SyncOutcome::Unchanged);
        }

        let collected = self.collect(host.as_ref(), &files).await;
        if collected.orders.is_empty() {
            return Err(LoadplanError::NoData(format!(
                "{} file(s) listed, {} parsed, 0 records",
                files.len(),
                collected.files_ok
            )));
        }

        let order_count = collected.orders.len();
        let finished_at = self.now();
        self.store.replace(
            collected.orders,
            Provenance {
                source: DataSource::Remote,
                fetched_at: finished_at,
                file_count: collected.files_ok,
                signature: Some(signature.clone()),
            },
        );
        {
            let mut state = self.state.write();
            state.last_signature = Some(signature.clone());
            state.last_success_at = Some(finished_at);
        }

        let cache_written = self.write_secondary().await;

        let report = SyncReport {
            sync_id,
            signature: signature.clone(),
            files_total: files.len(),
            files_ok: collected.files_ok,
            files_failed: collected.failures,
            orders: order_count,
            parse_statistics: collected.statistics,
            started_at,
            finished_at,
            cache_written,
        };
        info!(
            orders = report.orders,
            files_ok = report.files_ok,
            files_failed = report.files_failed.len(),
            "sync refreshed record store"
        );
        self.bus.emit(&SyncEvent::Refreshed {
            orders: report.orders,
            files_ok: report.files_ok,
            files_failed: report.files_failed.len(),
            signature,
        });
        Ok(SyncOutcome::Refreshed(report))
    }

    /// Download and parse each file in order; failures are logged and skipped
    async fn collect(&self, host: &dyn RemoteFileHost, files: &[RemoteFile]) -> Collected {
        let mut collected = Collected {
            orders: Vec::new(),
            statistics: ParseStatistics::default(),
            files_ok: 0,
            failures: Vec::new(),
        };

        for file in files {
            match self.fetch_file(host, file).await {
                Ok(parsed) => {
                    let mut orders = parsed.orders;
                    attribute_factory(&mut orders, &file.name);
                    debug!(file = %file.name, records = orders.len(), "file parsed");
                    collected.statistics.merge(&parsed.statistics);
                    collected.orders.extend(orders);
                    collected.files_ok += 1;
                }
                Err(err) => {
                    warn!(file = %file.name, error = %err, kind = err.kind(), "skipping file");
                    collected.failures.push(FileFailure {
                        file: file.name.clone(),
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }
        collected
    }

    async fn fetch_file(
        &self,
        host: &dyn RemoteFileHost,
        file: &RemoteFile,
    ) -> Result<loadplan_domain::ParsedFile> {
        let bytes = fetch_with_retry(
            || host.download(file),
            self.config.max_attempts,
            self.config.base_backoff(),
        )
        .await?;

        let parse_started = self.clock.now();
        let parsed = self.parser.parse(&bytes, &file.name)?;
        let elapsed = self.clock.now().saturating_duration_since(parse_started);
        if elapsed > self.config.parse_timeout() {
            warn!(file = %file.name, ?elapsed, "parse exceeded its time budget");
        }
        Ok(parsed)
    }

    async fn write_secondary(&self) -> bool {
        let Some(cache) = &self.secondary else {
            return false;
        };
        let records = self.store.snapshot();
        match cache.store(&self.scope_tag, &records).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, scope = %self.scope_tag, "secondary cache write failed");
                false
            }
        }
    }

    /// Forget the stored signature so the next sync downloads everything
    pub async fn manual_sync(&self) -> Result<SyncOutcome> {
        self.state.write().last_signature = None;
        self.bus.emit(&SyncEvent::Invalidated { reason: "manual sync requested".into() });
        self.sync().await
    }

    /// Sync when the data is older than the staleness threshold (or was
    /// never fetched). Returns `None` when the data is fresh.
    pub async fn on_window_focus(&self) -> Result<Option<SyncOutcome>> {
        let last_success = self.state.read().last_success_at;
        let age = last_success.and_then(|at| (self.now() - at).to_std().ok());
        let stale = age.map_or(true, |age| age > self.config.focus_staleness());
        if !stale {
            debug!(?age, "data fresh on focus");
            return Ok(None);
        }

        self.bus.emit(&SyncEvent::DataStale { age });
        self.sync().await.map(Some)
    }

    /// Serve the secondary cache snapshot while the store is still empty.
    /// Returns whether the store was hydrated.
    pub async fn hydrate_from_cache(&self) -> Result<bool> {
        if !self.store.is_empty() {
            return Ok(false);
        }
        let Some(cache) = &self.secondary else {
            return Ok(false);
        };
        let Some(snapshot) = cache.load(&self.scope_tag).await? else {
            debug!(scope = %self.scope_tag, "no secondary cache snapshot");
            return Ok(false);
        };
        if snapshot.records.is_empty() {
            return Ok(false);
        }

        let count = snapshot.records.len();
        self.store.replace(
            snapshot.records,
            Provenance {
                source: DataSource::SecondaryCache,
                fetched_at: snapshot.saved_at,
                file_count: 0,
                signature: None,
            },
        );
        info!(records = count, saved_at = %snapshot.saved_at, "hydrated from secondary cache");
        self.bus.emit(&SyncEvent::Invalidated { reason: "hydrated from secondary cache".into() });
        Ok(true)
    }
}

impl std::fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("scope_tag", &self.scope_tag)
            .field("has_host", &self.host.is_some())
            .field("has_secondary", &self.secondary.is_some())
            .field("mode", &self.state.read().mode)
            .finish_non_exhaustive()
    }
}
