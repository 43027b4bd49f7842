//! End-to-end tests: sync into the store, then query through the engine.

mod support;

use std::sync::Arc;

use loadplan_core::query::QueryEngine;
use loadplan_domain::{
    CacheConfig, ClassificationThresholds, Factory, FilterPatch, Grouping, GroupingKind,
    QuickFilter, StatusFilter,
};
use support::{harness, json_bytes, order, remote_file, shipped};

fn engine(h: &support::Harness) -> QueryEngine {
    QueryEngine::new(
        Arc::clone(&h.store),
        &CacheConfig::default(),
        ClassificationThresholds::default(),
        h.clock.clone(),
    )
    .expect("valid cache config")
}

fn seed(h: &support::Harness, stamp: &str) {
    // Fixture day is 2025-03-12.
    h.host.put(
        remote_file("a", "FACTORY A.csv", stamp),
        json_bytes(&[
            order("PO-1", Factory::Unknown, 100, "2025-03-10"),
            order("PO-2", Factory::Unknown, 40, "2025-03-14"),
            shipped(order("PO-3", Factory::Unknown, 60, "2025-03-01")),
        ]),
    );
    h.host.put(
        remote_file("b", "FACTORY B.csv", stamp),
        json_bytes(&[order("PO-4", Factory::B, 25, "2025-04-20")]),
    );
}

/// Validates that a refresh invalidates filtered results.
///
/// Assertions:
/// - Repeating a query is served from the result cache
/// - After a sync replaces the store, the same filter is recomputed
#[tokio::test(start_paused = true)]
async fn refresh_invalidates_cached_results() {
    let h = harness();
    seed(&h, "t1");
    h.orchestrator.sync().await.expect("sync");
    let engine = engine(&h);

    engine.set_filters(FilterPatch {
        status: Some(Some(StatusFilter::Shipped)),
        ..FilterPatch::default()
    });
    assert_eq!(engine.filtered_orders().len(), 1);
    assert_eq!(engine.filtered_orders().len(), 1);
    assert_eq!(engine.memo_stats().filtered_hits, 1);

    h.host.put(
        remote_file("b", "FACTORY B.csv", "t2"),
        json_bytes(&[shipped(order("PO-4", Factory::B, 25, "2025-04-20"))]),
    );
    h.orchestrator.sync().await.expect("second sync");

    assert_eq!(engine.filtered_orders().len(), 2);
    assert_eq!(engine.memo_stats().filtered_misses, 2);
}

#[tokio::test(start_paused = true)]
async fn quick_filters_and_factory_scope_compose() {
    let h = harness();
    seed(&h, "t1");
    h.orchestrator.sync().await.expect("sync");
    let engine = engine(&h);

    engine.set_filters(FilterPatch {
        quick: Some(Some(QuickFilter::UrgentOverdue)),
        ..FilterPatch::default()
    });
    let overdue: Vec<_> =
        engine.filtered_orders().iter().map(|r| r.po_number.clone()).collect();
    assert_eq!(overdue, vec!["PO-1"]);

    engine.set_filters(FilterPatch {
        quick: Some(Some(QuickFilter::Urgent3d)),
        ..FilterPatch::default()
    });
    let soon: Vec<_> = engine.filtered_orders().iter().map(|r| r.po_number.clone()).collect();
    assert_eq!(soon, vec!["PO-2"]);

    engine.reset_filters();
    engine.set_selected_factory(Some(Factory::B));
    let stats = engine.statistics();
    assert_eq!(stats.scoped.total.orders, 1);
    assert_eq!(stats.scoped.total.quantity, 25);
}

#[tokio::test(start_paused = true)]
async fn factory_grouping_reflects_file_attribution() {
    let h = harness();
    seed(&h, "t1");
    h.orchestrator.sync().await.expect("sync");
    let engine = engine(&h);

    let Grouping::Factory(buckets) = engine.groupings(GroupingKind::Factory) else {
        panic!("factory grouping expected");
    };
    assert_eq!(buckets[&Factory::A].total.orders, 3);
    assert_eq!(buckets[&Factory::A].shipped.orders, 1);
    assert_eq!(buckets[&Factory::B].total.orders, 1);
}
