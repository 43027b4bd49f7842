//! Query engine
//!
//! Owns the filter state, date mode and factory selection, and serves
//! filtered orders, statistics and groupings with memoization:
//!
//! - The factory-scoped set is recomputed only when the store generation or
//!   the selected factory changes.
//! - Filtered sets live in the [`ResultCache`] under their canonical key.
//! - Statistics and groupings are recomputed only when the identity of their
//!   input set (`Arc::ptr_eq`), the date mode or the current day changes.
//!
//! A store generation change clears the result cache within the same call
//! that observes it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use loadplan_common::time::Clock;
use loadplan_domain::{
    CacheConfig, ClassificationThresholds, DateMode, Factory, FilterPatch, FilterState, Grouping,
    GroupingKind, OrderRecord, Result, StatisticsPair,
};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use super::aggregate::{aggregate, group_by_destination, group_by_factory, group_by_month};
use super::cache::{cache_key, CachedOrders, ResultCache, ResultCacheStats};
use super::filter::{apply, compile, FilterContext};
use crate::store::RecordStore;

/// Memo hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoStats {
    pub scoped_hits: u64,
    pub scoped_misses: u64,
    pub filtered_hits: u64,
    pub filtered_misses: u64,
    pub statistics_hits: u64,
    pub statistics_misses: u64,
    pub grouping_hits: u64,
    pub grouping_misses: u64,
}

struct ScopedMemo {
    generation: u64,
    factory: Option<Factory>,
    records: CachedOrders,
}

struct StatisticsMemo {
    scoped: CachedOrders,
    filtered: CachedOrders,
    date_mode: DateMode,
    today: NaiveDate,
    value: StatisticsPair,
}

struct GroupingMemo {
    input: CachedOrders,
    date_mode: DateMode,
    value: Grouping,
}

struct EngineState {
    filter: FilterState,
    date_mode: DateMode,
    selected_factory: Option<Factory>,
    observed_generation: Option<u64>,
    observed_day: Option<NaiveDate>,
    scoped: Option<ScopedMemo>,
    statistics: Option<StatisticsMemo>,
    groupings: HashMap<GroupingKind, GroupingMemo>,
    memo: MemoStats,
}

/// Filter evaluation with memoized results
pub struct QueryEngine {
    store: Arc<RecordStore>,
    cache: ResultCache,
    clock: Arc<dyn Clock>,
    thresholds: ClassificationThresholds,
    scope_tag: String,
    state: Mutex<EngineState>,
}

impl QueryEngine {
    pub fn new(
        store: Arc<RecordStore>,
        cache_config: &CacheConfig,
        thresholds: ClassificationThresholds,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(Self {
            store,
            cache: ResultCache::with_capacity(cache_config.capacity)?,
            clock,
            thresholds,
            scope_tag: cache_config.scope_tag.clone(),
            state: Mutex::new(EngineState {
                filter: FilterState::default(),
                date_mode: DateMode::default(),
                selected_factory: None,
                observed_generation: None,
                observed_day: None,
                scoped: None,
                statistics: None,
                groupings: HashMap::new(),
                memo: MemoStats::default(),
            }),
        })
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc_now().date_naive()
    }

    fn factory_scope(&self, factory: Option<Factory>) -> String {
        factory.map_or_else(|| self.scope_tag.clone(), |f| f.code().to_string())
    }

    /// Observe the store generation and the current day; either moving on
    /// drops every cached filter result.
    fn observe(&self, state: &mut EngineState, generation: u64, today: NaiveDate) {
        let generation_moved = state.observed_generation != Some(generation);
        let day_moved = state.observed_day != Some(today);
        if generation_moved || day_moved {
            if !self.cache.is_empty() {
                debug!(generation, %today, "clearing result cache");
            }
            self.cache.clear();
            state.observed_generation = Some(generation);
            state.observed_day = Some(today);
        }
    }

    fn scoped(&self, state: &mut EngineState) -> CachedOrders {
        let (generation, records) = self.store.versioned_snapshot();
        let today = self.today();
        self.observe(state, generation, today);

        if let Some(memo) = &state.scoped {
            if memo.generation == generation && memo.factory == state.selected_factory {
                state.memo.scoped_hits += 1;
                return Arc::clone(&memo.records);
            }
        }

        state.memo.scoped_misses += 1;
        let scoped: CachedOrders = match state.selected_factory {
            Some(factory) => records.iter().filter(|r| r.factory == factory).cloned().collect(),
            None => records.iter().cloned().collect(),
        };
        state.scoped = Some(ScopedMemo {
            generation,
            factory: state.selected_factory,
            records: Arc::clone(&scoped),
        });
        scoped
    }

    fn filtered(&self, state: &mut EngineState) -> (CachedOrders, CachedOrders) {
        let scoped = self.scoped(state);
        let scope = self.factory_scope(state.selected_factory);
        let key = cache_key(&state.filter, state.date_mode, &scope);

        if let Some(hit) = self.cache.get(&key) {
            state.memo.filtered_hits += 1;
            return (scoped, hit);
        }

        state.memo.filtered_misses += 1;
        let today = state.observed_day.unwrap_or_else(|| self.today());
        let ctx = FilterContext::new(today, self.thresholds);
        let predicates = compile(&state.filter, state.date_mode, &ctx);
        let filtered: CachedOrders = if predicates.is_empty() {
            Arc::clone(&scoped)
        } else {
            apply(&scoped, &predicates, state.filter.mode).into()
        };
        debug!(predicates = predicates.len(), matched = filtered.len(), "filter evaluated");
        self.cache.set(key, Arc::clone(&filtered));
        (scoped, filtered)
    }

    /// Orders passing the factory selection and the current filter
    pub fn filtered_orders(&self) -> CachedOrders {
        let mut state = self.state.lock();
        self.filtered(&mut state).1
    }

    /// Statistics for the factory-scoped set and the filtered set
    pub fn statistics(&self) -> StatisticsPair {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let (scoped, filtered) = self.filtered(state);
        let today = state.observed_day.unwrap_or_else(|| self.today());

        if let Some(memo) = &state.statistics {
            if Arc::ptr_eq(&memo.scoped, &scoped)
                && Arc::ptr_eq(&memo.filtered, &filtered)
                && memo.date_mode == state.date_mode
                && memo.today == today
            {
                state.memo.statistics_hits += 1;
                return memo.value.clone();
            }
        }

        state.memo.statistics_misses += 1;
        let scoped_stats = aggregate(&scoped, today, &self.thresholds);
        let filtered_stats = if Arc::ptr_eq(&scoped, &filtered) {
            scoped_stats.clone()
        } else {
            aggregate(&filtered, today, &self.thresholds)
        };
        let value = StatisticsPair { scoped: scoped_stats, filtered: filtered_stats };
        state.statistics = Some(StatisticsMemo {
            scoped,
            filtered,
            date_mode: state.date_mode,
            today,
            value: value.clone(),
        });
        value
    }

    /// Grouping of the filtered set
    pub fn groupings(&self, kind: GroupingKind) -> Grouping {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let (_, filtered) = self.filtered(state);
        let date_mode = state.date_mode;

        if let Some(memo) = state.groupings.get(&kind) {
            if Arc::ptr_eq(&memo.input, &filtered) && memo.date_mode == date_mode {
                state.memo.grouping_hits += 1;
                return memo.value.clone();
            }
        }

        state.memo.grouping_misses += 1;
        let value = match kind {
            GroupingKind::Month => Grouping::Month(group_by_month(&filtered, date_mode)),
            GroupingKind::Destination => Grouping::Destination(group_by_destination(&filtered)),
            GroupingKind::Factory => Grouping::Factory(group_by_factory(&filtered)),
        };
        state
            .groupings
            .insert(kind, GroupingMemo { input: filtered, date_mode, value: value.clone() });
        value
    }

    /// Merge a partial filter update; returns whether the filter changed
    pub fn set_filters(&self, patch: FilterPatch) -> bool {
        let mut state = self.state.lock();
        let changed = state.filter.apply_patch(patch);
        if changed {
            debug!(filter = ?state.filter, "filters updated");
        }
        changed
    }

    pub fn reset_filters(&self) -> bool {
        let mut state = self.state.lock();
        let changed = state.filter != FilterState::default();
        state.filter = FilterState::default();
        changed
    }

    pub fn set_date_mode(&self, mode: DateMode) -> bool {
        let mut state = self.state.lock();
        let changed = state.date_mode != mode;
        state.date_mode = mode;
        changed
    }

    pub fn set_selected_factory(&self, factory: Option<Factory>) -> bool {
        let mut state = self.state.lock();
        let changed = state.selected_factory != factory;
        state.selected_factory = factory;
        changed
    }

    pub fn filter_state(&self) -> FilterState {
        self.state.lock().filter.clone()
    }

    pub fn date_mode(&self) -> DateMode {
        self.state.lock().date_mode
    }

    pub fn selected_factory(&self) -> Option<Factory> {
        self.state.lock().selected_factory
    }

    pub fn memo_stats(&self) -> MemoStats {
        self.state.lock().memo
    }

    pub fn cache_stats(&self) -> ResultCacheStats {
        self.cache.stats()
    }

    /// Record store size; does not touch the memo counters
    pub fn record_count(&self) -> usize {
        self.store.len()
    }
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("scope_tag", &self.scope_tag)
            .field("thresholds", &self.thresholds)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use loadplan_common::time::MockClock;
    use loadplan_domain::{DataSource, Provenance, StatusFilter};

    use super::*;

    fn record(po: &str, factory: Factory, crd: &str, sdd: &str) -> OrderRecord {
        OrderRecord {
            po_number: po.into(),
            factory,
            destination: "Germany".into(),
            quantity: 10,
            crd: crd.into(),
            sdd_value: sdd.into(),
            ..OrderRecord::default()
        }
    }

    fn sample() -> Vec<OrderRecord> {
        vec![
            record("PO-1", Factory::A, "2025-03-01", "2025-03-05"),
            record("PO-2", Factory::A, "2025-03-20", "2025-03-18"),
            record("PO-3", Factory::B, "2025-04-01", "2025-04-01"),
            record("PO-4", Factory::C, "2025-04-10", "2025-04-02"),
        ]
    }

    fn provenance() -> Provenance {
        Provenance {
            source: DataSource::Remote,
            fetched_at: Utc::now(),
            file_count: 1,
            signature: None,
        }
    }

    fn engine_with(records: Vec<OrderRecord>, capacity: usize) -> (QueryEngine, Arc<RecordStore>) {
        let store = Arc::new(RecordStore::new());
        store.replace(records, provenance());
        let clock = MockClock::at_utc(
            Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).single().expect("valid timestamp"),
        );
        let config = CacheConfig { capacity, ..CacheConfig::default() };
        let engine = QueryEngine::new(
            Arc::clone(&store),
            &config,
            ClassificationThresholds::default(),
            Arc::new(clock),
        )
        .expect("valid engine");
        (engine, store)
    }

    fn delayed_patch() -> FilterPatch {
        FilterPatch { status: Some(Some(StatusFilter::Delayed)), ..FilterPatch::default() }
    }

    #[test]
    fn default_filter_serves_scoped_set() {
        let (engine, _) = engine_with(sample(), 50);
        let orders = engine.filtered_orders();

        assert_eq!(orders.len(), 4);
        let stats = engine.statistics();
        assert_eq!(stats.scoped, stats.filtered);
    }

    #[test]
    fn delayed_status_filters_one_record() {
        let (engine, _) = engine_with(sample(), 50);
        assert!(engine.set_filters(delayed_patch()));

        let orders = engine.filtered_orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].po_number, "PO-1");
    }

    /// Validates memoization across repeated reads and no-op patches.
    ///
    /// Assertions:
    /// - Second read is served from cache with the same `Arc`
    /// - A value-equal patch reports no change and keeps the cache warm
    /// - Statistics are computed once for an unchanged input set
    #[test]
    fn repeated_reads_hit_memo() {
        let (engine, _) = engine_with(sample(), 50);
        engine.set_filters(delayed_patch());

        let first = engine.filtered_orders();
        assert!(!engine.set_filters(delayed_patch()));
        let second = engine.filtered_orders();
        assert!(Arc::ptr_eq(&first, &second));

        engine.statistics();
        engine.statistics();
        let memo = engine.memo_stats();
        assert_eq!(memo.filtered_misses, 1);
        assert_eq!(memo.filtered_hits, 3);
        assert_eq!(memo.statistics_misses, 1);
        assert_eq!(memo.statistics_hits, 1);
        assert_eq!(memo.scoped_misses, 1);
    }

    #[test]
    fn store_generation_change_clears_cache() {
        let (engine, store) = engine_with(sample(), 50);
        let before = engine.filtered_orders();
        assert_eq!(engine.cache_stats().size, 1);

        store.replace(sample().into_iter().take(2).collect(), provenance());
        let after = engine.filtered_orders();

        assert_eq!(after.len(), 2);
        assert!(!Arc::ptr_eq(&before, &after));
        let stats = engine.cache_stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hits, 0, "counters reset with the clear");
        assert_eq!(engine.memo_stats().scoped_misses, 2);
    }

    #[test]
    fn factory_selection_narrows_before_filters() {
        let (engine, _) = engine_with(sample(), 50);
        engine.set_selected_factory(Some(Factory::A));
        engine.set_filters(delayed_patch());

        let stats = engine.statistics();
        assert_eq!(stats.scoped.total.orders, 2);
        assert_eq!(stats.filtered.total.orders, 1);

        engine.set_selected_factory(None);
        assert_eq!(engine.statistics().scoped.total.orders, 4);
    }

    #[test]
    fn groupings_follow_date_mode() {
        let (engine, _) = engine_with(sample(), 50);

        let Grouping::Month(by_sdd) = engine.groupings(GroupingKind::Month) else {
            panic!("month grouping expected");
        };
        assert_eq!(by_sdd.len(), 2);

        engine.groupings(GroupingKind::Month);
        assert_eq!(engine.memo_stats().grouping_hits, 1);

        engine.set_date_mode(DateMode::Crd);
        engine.groupings(GroupingKind::Month);
        assert_eq!(engine.memo_stats().grouping_misses, 2);

        let Grouping::Factory(factories) = engine.groupings(GroupingKind::Factory) else {
            panic!("factory grouping expected");
        };
        assert_eq!(factories[&Factory::A].total.orders, 2);
    }

    #[test]
    fn reset_restores_defaults() {
        let (engine, _) = engine_with(sample(), 50);
        engine.set_filters(delayed_patch());
        assert!(engine.reset_filters());
        assert!(!engine.reset_filters());
        assert!(engine.filter_state().is_default());
        assert_eq!(engine.filtered_orders().len(), 4);
    }
}
