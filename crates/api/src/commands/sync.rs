//! Sync commands and status

use chrono::{DateTime, Utc};
use loadplan_domain::{LoadplanError, Provenance, Result, SyncOutcome, SyncState};
use serde::Serialize;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// What a caller needs to render sync status
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub state: SyncState,
    pub provenance: Option<Provenance>,
    pub record_count: usize,
    pub watching: bool,
    pub config_error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Result of a sync command in serializable form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncCommandResult {
    Refreshed { orders: usize, files_ok: usize, files_failed: usize },
    Unchanged,
    AlreadyRunning,
    /// Data was fresh enough; no sync was started
    Skipped,
}

impl From<SyncOutcome> for SyncCommandResult {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Refreshed(report) => Self::Refreshed {
                orders: report.orders,
                files_ok: report.files_ok,
                files_failed: report.files_failed.len(),
            },
            SyncOutcome::Unchanged => Self::Unchanged,
            SyncOutcome::AlreadyRunning => Self::AlreadyRunning,
        }
    }
}

/// Sync now, skipping downloads when the remote listing is unchanged
pub async fn sync_now(ctx: &AppContext) -> Result<SyncCommandResult> {
    execute_command("sync::sync_now", move || async move {
        Ok(ctx.orchestrator.sync().await?.into())
    })
    .await
}

/// Forget the stored signature and sync, re-downloading every file
pub async fn manual_sync(ctx: &AppContext) -> Result<SyncCommandResult> {
    execute_command("sync::manual_sync", move || async move {
        Ok(ctx.orchestrator.manual_sync().await?.into())
    })
    .await
}

/// Window regained focus: sync only if data is stale
pub async fn window_focused(ctx: &AppContext) -> Result<SyncCommandResult> {
    execute_command("sync::window_focused", move || async move {
        Ok(ctx.orchestrator.on_window_focus().await?.map_or(SyncCommandResult::Skipped, Into::into))
    })
    .await
}

pub async fn start_watching(ctx: &AppContext) -> Result<bool> {
    execute_command("sync::start_watching", move || async move {
        if let Some(message) = ctx.config_error() {
            return Err(LoadplanError::Config(message.to_string()));
        }
        Ok(ctx.sync_scheduler.start_watching(ctx.config.sync.poll_interval()).await)
    })
    .await
}

pub async fn stop_watching(ctx: &AppContext) -> Result<()> {
    execute_command("sync::stop_watching", move || async move {
        ctx.sync_scheduler.stop_watching().await?;
        Ok(())
    })
    .await
}

pub async fn get_sync_status(ctx: &AppContext) -> Result<SyncStatus> {
    execute_command("sync::get_sync_status", move || async move {
        Ok(SyncStatus {
            state: ctx.orchestrator.state(),
            provenance: ctx.store.provenance(),
            record_count: ctx.store.len(),
            watching: ctx.sync_scheduler.is_running(),
            config_error: ctx.config_error().map(str::to_string),
            checked_at: ctx.clock.utc_now(),
        })
    })
    .await
}
