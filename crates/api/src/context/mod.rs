//! Application context - dependency injection container

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use loadplan_common::time::{Clock, SystemClock};
use loadplan_core::{EventBus, QueryEngine, RecordStore, SyncEvent, SyncOrchestrator};
use loadplan_domain::{Config, Result, SyncMode};
use loadplan_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
use loadplan_infra::{config, DriveFileHost, HttpClient, JsonSnapshotCache, LoadplanParser};
use tracing::{info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub events: EventBus,
    pub store: Arc<RecordStore>,
    pub query: Arc<QueryEngine>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub sync_scheduler: Arc<SyncScheduler>,

    /// Why the remote host could not be built, if it could not
    config_error: Option<String>,
    config_error_reported: AtomicBool,
}

impl AppContext {
    /// Create a context from the loaded configuration (env, then file)
    pub async fn new() -> Result<Self> {
        Self::new_with_config(config::load()?).await
    }

    /// Create a context with custom configuration
    pub async fn new_with_config(config: Config) -> Result<Self> {
        Self::new_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Create a context with a custom clock
    ///
    /// Tests use this to pin "today" for classification and the parser's
    /// season year.
    pub async fn new_with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new();
        let store = Arc::new(RecordStore::new());
        let query = Arc::new(QueryEngine::new(
            Arc::clone(&store),
            &config.cache,
            config.classification,
            Arc::clone(&clock),
        )?);

        let today = clock.utc_now().date_naive();
        let parser = Arc::new(LoadplanParser::for_day(today));
        info!(%today, season_base_year = parser.base_year(), "parser configured");

        let snapshot_cache =
            Arc::new(JsonSnapshotCache::new(&config.cache.snapshot_dir, Arc::clone(&clock)));

        let mut orchestrator = SyncOrchestrator::new(
            Arc::clone(&store),
            events.clone(),
            parser,
            Arc::clone(&clock),
            config.sync.clone(),
            config.cache.scope_tag.clone(),
        )
        .with_secondary_cache(snapshot_cache);

        let config_error = match build_remote_host(&config) {
            Ok(host) => {
                orchestrator = orchestrator.with_host(Arc::new(host));
                None
            }
            Err(err) => {
                warn!(error = %err, "remote host unavailable; syncing is disabled");
                Some(err.to_string())
            }
        };

        let orchestrator = Arc::new(orchestrator);
        let sync_scheduler = Arc::new(SyncScheduler::new(
            Arc::clone(&orchestrator),
            SyncSchedulerConfig::default(),
        ));

        Ok(Self {
            config,
            clock,
            events,
            store,
            query,
            orchestrator,
            sync_scheduler,
            config_error,
            config_error_reported: AtomicBool::new(false),
        })
    }

    /// Bring the engine up: serve cached data, sync once, then watch.
    ///
    /// Without a remote host the configuration error is published once on
    /// the event bus and the watcher is not started. A failed first sync is
    /// reported through events and state and leaves the watcher stopped;
    /// `manual_sync` or `start_watching` recover from there.
    pub async fn start(&self) -> Result<()> {
        if let Err(err) = self.orchestrator.hydrate_from_cache().await {
            warn!(error = %err, "secondary cache could not be loaded");
        }

        if let Some(message) = &self.config_error {
            if !self.config_error_reported.swap(true, Ordering::AcqRel) {
                self.events.emit(&SyncEvent::Error {
                    kind: "config".into(),
                    message: message.clone(),
                    context: "startup".into(),
                });
            }
            return Ok(());
        }

        match self.orchestrator.sync().await {
            Ok(_) => {
                self.sync_scheduler.start_watching(self.config.sync.poll_interval()).await;
            }
            Err(err) => warn!(error = %err, "initial sync failed; watcher not started"),
        }
        Ok(())
    }

    /// Configuration problem that disabled syncing, if any
    pub fn config_error(&self) -> Option<&str> {
        self.config_error.as_deref()
    }

    /// Summarize component health
    pub fn health_check(&self) -> HealthStatus {
        let state = self.orchestrator.state();
        let mut status = HealthStatus::new(self.clock.utc_now());

        status = status.add_component(match &self.config_error {
            None => ComponentHealth::healthy("remote_host"),
            Some(message) => ComponentHealth::unhealthy("remote_host", message.clone()),
        });

        status = status.add_component(match self.store.provenance() {
            Some(provenance) => ComponentHealth::healthy("record_store").note(format!(
                "{} orders from {}",
                self.store.len(),
                provenance.source
            )),
            None => ComponentHealth::unhealthy("record_store", "no data loaded"),
        });

        status = status.add_component(match (state.mode, &state.last_error) {
            (SyncMode::Error, Some(message)) => {
                ComponentHealth::unhealthy("last_sync", message.clone())
            }
            _ => ComponentHealth::healthy("last_sync").note(state.mode.to_string()),
        });

        status = status.add_component(
            ComponentHealth::healthy("sync_scheduler")
                .note(if self.sync_scheduler.is_running() { "watching" } else { "stopped" }),
        );

        status.calculate_score();
        status
    }

    /// Stop the watcher.
    ///
    /// A sync already in flight is allowed to finish in the background.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");
        self.sync_scheduler.stop_watching().await?;
        Ok(())
    }
}

fn build_remote_host(config: &Config) -> Result<DriveFileHost> {
    let http = HttpClient::builder().timeout(config.sync.request_timeout()).build()?;
    DriveFileHost::new(&config.remote, http)
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("records", &self.store.len())
            .field("config_error", &self.config_error)
            .finish_non_exhaustive()
    }
}
