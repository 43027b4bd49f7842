//! Integration tests for AppContext lifecycle
//!
//! Each test wires a full context (parser, Drive host, snapshot cache,
//! scheduler) against a mock Drive server and drives it through the
//! consumer commands.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use loadplan_common::time::MockClock;
use loadplan_core::EventKind;
use loadplan_domain::{
    Config, DataSource, Factory, Grouping, LoadplanError, RemoteConfig, SyncConfig, SyncMode,
};
use loadplan_lib::context::AppContext;
use loadplan_lib::{
    get_filtered_orders, get_groupings, get_health, get_statistics, get_sync_status,
    manual_sync, set_filters, set_selected_factory, start_watching, sync_now,
    SyncCommandResult,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FACTORY_A_CSV: &str = "\
Unit,Model,Dest,Q.ty,PO,CRD,SDD,WH OUT BAL
U1,RUNNER,Japan,100,PO-1,2025-03-10,2025-03-10,
U1,WALKER,Germany,50,PO-2,2025-03-20,2025-03-25,2025-03-01
";

const FACTORY_B_CSV: &str = "\
Unit,Model,Destination,Quantity,PO,CRD,SDD
U2,TRAIL,United States,40,PO-3,2025-04-02,2025-04-01
";

fn config(server: &MockServer, snapshot_dir: &Path) -> Config {
    let mut config = Config {
        remote: RemoteConfig {
            api_key: Some("test-key".into()),
            folder_id: Some("folder".into()),
            base_url: server.uri(),
        },
        sync: SyncConfig {
            poll_interval_ms: Some(3_600_000),
            max_attempts: 1,
            base_backoff_ms: 1,
            ..SyncConfig::default()
        },
        ..Config::default()
    };
    config.cache.snapshot_dir = snapshot_dir.to_path_buf();
    config
}

async fn context(config: Config) -> AppContext {
    let now = Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).single().expect("valid time");
    AppContext::new_with_clock(config, Arc::new(MockClock::at_utc(now)))
        .await
        .expect("context should build")
}

async fn mount_factory_files(server: &MockServer, stamp: &str) {
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"id": "a", "name": "LOADPLAN FACTORY A.csv", "modifiedTime": stamp},
                {"id": "b", "name": "LOADPLAN FACTORY B.csv", "modifiedTime": stamp}
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FACTORY_A_CSV))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FACTORY_B_CSV))
        .mount(server)
        .await;
}

/// Validates startup against a healthy remote.
///
/// Assertions:
/// - The first sync loads every record and starts the watcher
/// - The snapshot cache receives a copy of the records
/// - Health is reported as healthy
#[tokio::test]
async fn start_syncs_and_watches() {
    let server = MockServer::start().await;
    mount_factory_files(&server, "2025-03-01T00:00:00Z").await;
    let dir = TempDir::new().expect("temp dir");
    let ctx = context(config(&server, dir.path())).await;

    ctx.start().await.expect("start");

    let status = get_sync_status(&ctx).await.expect("status");
    assert_eq!(status.record_count, 3);
    assert!(status.watching);
    assert_eq!(status.state.mode, SyncMode::Watching);
    assert_eq!(status.provenance.map(|p| p.source), Some(DataSource::Remote));
    assert!(dir.path().join("ALL_FACTORIES.json").exists());

    let health = get_health(&ctx).await.expect("health");
    assert!(health.is_healthy, "unexpected health: {health:?}");

    ctx.shutdown().await.expect("shutdown");
    assert!(!get_sync_status(&ctx).await.expect("status").watching);
}

#[tokio::test]
async fn commands_filter_scope_and_group() {
    let server = MockServer::start().await;
    mount_factory_files(&server, "2025-03-01T00:00:00Z").await;
    let dir = TempDir::new().expect("temp dir");
    let ctx = context(config(&server, dir.path())).await;
    ctx.start().await.expect("start");

    let shipped = set_filters(&ctx, json!({"status": "shipped"})).await.expect("patch");
    assert!(shipped.filters.status.is_some());
    let orders = get_filtered_orders(&ctx).await.expect("orders");
    let pos: Vec<_> = orders.iter().map(|r| r.po_number.as_str()).collect();
    assert_eq!(pos, vec!["PO-2"]);

    set_filters(&ctx, json!({"status": null})).await.expect("clear");
    set_selected_factory(&ctx, Some("b")).await.expect("scope");
    let stats = get_statistics(&ctx).await.expect("stats");
    assert_eq!(stats.scoped.total.orders, 1);
    assert_eq!(stats.scoped.total.quantity, 40);

    set_selected_factory(&ctx, None).await.expect("unscope");
    let Grouping::Factory(buckets) = get_groupings(&ctx, "factory").await.expect("grouping") else {
        panic!("factory grouping expected");
    };
    assert_eq!(buckets[&Factory::A].total.orders, 2);
    assert_eq!(buckets[&Factory::B].total.orders, 1);

    ctx.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn unknown_tags_are_invalid_input() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("temp dir");
    let ctx = context(config(&server, dir.path())).await;

    let status = set_filters(&ctx, json!({"status": "lost"})).await.expect_err("bad status");
    assert!(matches!(status, LoadplanError::InvalidInput(_)));

    let quick = set_filters(&ctx, json!({"quick": "urgent_30d"})).await.expect_err("bad quick");
    assert!(matches!(quick, LoadplanError::InvalidInput(_)));

    let field = set_filters(&ctx, json!({"colour": "red"})).await.expect_err("bad field");
    assert!(matches!(field, LoadplanError::InvalidInput(_)));

    let grouping = get_groupings(&ctx, "week").await.expect_err("bad grouping");
    assert!(matches!(grouping, LoadplanError::InvalidInput(_)));

    let factory = set_selected_factory(&ctx, Some("Z")).await.expect_err("bad factory");
    assert!(matches!(factory, LoadplanError::InvalidInput(_)));

    assert!(get_filtered_orders(&ctx).await.expect("orders").is_empty());
}

/// Validates behaviour without remote credentials.
///
/// Assertions:
/// - The configuration error is published once on the event bus
/// - The watcher is not started and cannot be started
/// - Syncing reports a configuration error
#[tokio::test]
async fn missing_credentials_disable_sync() {
    let dir = TempDir::new().expect("temp dir");
    let mut config = Config::default();
    config.cache.snapshot_dir = dir.path().to_path_buf();
    let ctx = context(config).await;

    let errors = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&errors);
    let _subscription = ctx.events.on(EventKind::Error, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    ctx.start().await.expect("start");
    ctx.start().await.expect("second start");
    assert_eq!(errors.load(Ordering::SeqCst), 1);

    let status = get_sync_status(&ctx).await.expect("status");
    assert!(!status.watching);
    assert!(status.config_error.as_deref().is_some_and(|m| m.contains("API key")));

    let watch = start_watching(&ctx).await.expect_err("no watcher without host");
    assert!(matches!(watch, LoadplanError::Config(_)));
    let sync = sync_now(&ctx).await.expect_err("no host");
    assert!(matches!(sync, LoadplanError::Config(_)));

    let health = get_health(&ctx).await.expect("health");
    assert!(!health.is_healthy);
}

/// Validates fallback to the snapshot cache.
///
/// Assertions:
/// - A context whose remote fails serves the previously cached records
/// - The failure is visible in sync status while data stays available
/// - The watcher is not started after a failed first sync
#[tokio::test]
async fn failed_remote_serves_cached_snapshot() {
    let dir = TempDir::new().expect("temp dir");

    let healthy = MockServer::start().await;
    mount_factory_files(&healthy, "2025-03-01T00:00:00Z").await;
    let first = context(config(&healthy, dir.path())).await;
    first.start().await.expect("first start");
    first.shutdown().await.expect("first shutdown");

    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&broken)
        .await;
    let second = context(config(&broken, dir.path())).await;
    second.start().await.expect("second start");

    let status = get_sync_status(&second).await.expect("status");
    assert_eq!(status.record_count, 3);
    assert_eq!(status.provenance.map(|p| p.source), Some(DataSource::SecondaryCache));
    assert_eq!(status.state.mode, SyncMode::Error);
    assert!(!status.watching);
    assert!(status.state.last_error.is_some());
    assert_eq!(get_filtered_orders(&second).await.expect("orders").len(), 3);

    second.shutdown().await.expect("second shutdown");
}

#[tokio::test]
async fn manual_sync_redownloads_unchanged_files() {
    let server = MockServer::start().await;
    mount_factory_files(&server, "2025-03-01T00:00:00Z").await;
    let dir = TempDir::new().expect("temp dir");
    let ctx = context(config(&server, dir.path())).await;
    ctx.start().await.expect("start");

    assert_eq!(sync_now(&ctx).await.expect("sync"), SyncCommandResult::Unchanged);
    assert_eq!(
        manual_sync(&ctx).await.expect("manual"),
        SyncCommandResult::Refreshed { orders: 3, files_ok: 2, files_failed: 0 }
    );

    ctx.shutdown().await.expect("shutdown");
}
