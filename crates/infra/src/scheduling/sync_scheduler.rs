//! Polling watcher for remote syncs
//!
//! One background task calls [`SyncOrchestrator::sync`] every `interval`.
//! Starting twice is a no-op. Stopping cancels future ticks; a sync that is
//! already running is left to finish on its own.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use loadplan_core::SyncOrchestrator;
//! use loadplan_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
//!
//! # async fn example(orchestrator: Arc<SyncOrchestrator>) -> loadplan_domain::Result<()> {
//! let scheduler = SyncScheduler::new(orchestrator, SyncSchedulerConfig::default());
//! scheduler.start_watching(Duration::from_secs(60)).await;
//! // ... application runs ...
//! scheduler.stop_watching().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use loadplan_core::SyncOrchestrator;
use loadplan_domain::SyncOutcome;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the sync scheduler
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// How long `stop_watching` waits for the task before detaching it
    pub join_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self { join_timeout: Duration::from_secs(5) }
    }
}

/// Periodic sync driver
pub struct SyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    config: SyncSchedulerConfig,
    cancellation_token: SyncMutex<CancellationToken>,
    task_handle: TaskHandle,
}

impl SyncScheduler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, config: SyncSchedulerConfig) -> Self {
        Self {
            orchestrator,
            config,
            cancellation_token: SyncMutex::new(CancellationToken::new()),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start calling `sync()` every `interval`. The first tick fires one
    /// interval from now.
    ///
    /// Returns `false` without side effects when a watcher is already active.
    #[instrument(skip(self))]
    pub async fn start_watching(&self, interval: Duration) -> bool {
        let mut slot = self.task_handle.lock().await;
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("watcher already running");
            return false;
        }

        // Fresh token so a stopped scheduler can be restarted.
        let cancel = CancellationToken::new();
        *self.cancellation_token.lock() = cancel.clone();

        let orchestrator = Arc::clone(&self.orchestrator);
        orchestrator.set_watching(true);
        *slot = Some(tokio::spawn(Self::watch_loop(orchestrator, interval, cancel)));

        info!(interval_ms = interval.as_millis() as u64, "sync watcher started");
        true
    }

    /// Cancel future ticks and wait (bounded) for the task to exit.
    ///
    /// Not running is not an error. When the task is mid-sync and does not
    /// finish within the join timeout it is detached, not aborted, and
    /// [`SchedulerError::Timeout`] is returned.
    #[instrument(skip(self))]
    pub async fn stop_watching(&self) -> SchedulerResult<()> {
        self.cancellation_token.lock().cancel();
        self.orchestrator.set_watching(false);

        let Some(mut handle) = self.task_handle.lock().await.take() else {
            return Ok(());
        };

        match tokio::time::timeout(self.config.join_timeout, &mut handle).await {
            Ok(joined) => {
                joined?;
                info!("sync watcher stopped");
                Ok(())
            }
            Err(_) => {
                warn!("watcher still finishing a sync; detaching");
                Err(SchedulerError::Timeout { duration: self.config.join_timeout })
            }
        }
    }

    /// Whether a watcher task is active
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn watch_loop(
        orchestrator: Arc<SyncOrchestrator>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("watch loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    // Runs outside the select so cancellation never interrupts a sync.
                    match orchestrator.sync().await {
                        Ok(SyncOutcome::Refreshed(report)) => {
                            debug!(orders = report.orders, "watcher tick refreshed data");
                        }
                        Ok(outcome) => debug!(?outcome, "watcher tick"),
                        Err(e) => warn!(error = %e, kind = e.kind(), "watcher tick failed"),
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for SyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncScheduler")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Ensure the watcher stops when the scheduler is dropped
impl Drop for SyncScheduler {
    fn drop(&mut self) {
        let token = self.cancellation_token.lock();
        if !token.is_cancelled() {
            debug!("SyncScheduler dropped; cancelling watcher");
            token.cancel();
        }
    }
}
