//! Aggregation engine
//!
//! Statistics and groupings over a record slice. Each function makes a
//! single pass over its input.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use loadplan_domain::utils::dates::year_month;
use loadplan_domain::{
    ClassificationThresholds, DateMode, DestinationBucket, Factory, FactoryBucket, MonthBucket,
    OrderRecord, OrderStatistics,
};

use crate::classification::{
    in_production, is_completed, is_critical, is_delayed, is_pending, is_shipped, is_warning,
};

/// Counts, quantities and rates for a record set
pub fn aggregate(
    records: &[OrderRecord],
    today: NaiveDate,
    thresholds: &ClassificationThresholds,
) -> OrderStatistics {
    let mut stats = OrderStatistics::default();
    for record in records {
        let quantity = record.quantity;
        stats.total.add(quantity);
        if is_completed(record) {
            stats.completed.add(quantity);
        }
        if is_shipped(record) {
            stats.shipped.add(quantity);
        }
        if is_delayed(record) {
            stats.delayed.add(quantity);
        }
        if is_warning(record, today, thresholds) {
            stats.warning.add(quantity);
        }
        if is_critical(record, today, thresholds) {
            stats.critical.add(quantity);
        }
        if in_production(record) {
            stats.in_production.add(quantity);
        }
        if is_pending(record) {
            stats.pending.add(quantity);
        }
    }
    stats.finalize_rates();
    stats
}

/// Buckets by `YYYY-MM` of the active date, ascending. Records without a
/// parseable date are left out.
pub fn group_by_month(records: &[OrderRecord], date_mode: DateMode) -> Vec<MonthBucket> {
    let mut months: BTreeMap<String, MonthBucket> = BTreeMap::new();
    for record in records {
        let Some(month) = year_month(record.date_for(date_mode)) else {
            continue;
        };
        let bucket = months.entry(month).or_insert_with_key(|month| MonthBucket {
            month: month.clone(),
            ..MonthBucket::default()
        });
        bucket.total.add(record.quantity);
        if is_shipped(record) {
            bucket.shipped.add(record.quantity);
        }
        if is_delayed(record) {
            bucket.delayed.add(record.quantity);
        }
    }
    months.into_values().collect()
}

/// Buckets by destination, largest total quantity first; ties by name
pub fn group_by_destination(records: &[OrderRecord]) -> Vec<DestinationBucket> {
    let mut destinations: HashMap<&str, DestinationBucket> = HashMap::new();
    for record in records {
        let bucket = destinations.entry(record.destination.as_str()).or_insert_with(|| {
            DestinationBucket { destination: record.destination.clone(), ..Default::default() }
        });
        bucket.total.add(record.quantity);
        if is_shipped(record) {
            bucket.shipped.add(record.quantity);
        }
    }

    let mut buckets: Vec<_> = destinations.into_values().collect();
    buckets.sort_by(|a, b| {
        b.total.quantity.cmp(&a.total.quantity).then_with(|| a.destination.cmp(&b.destination))
    });
    buckets
}

/// Buckets by factory
pub fn group_by_factory(records: &[OrderRecord]) -> BTreeMap<Factory, FactoryBucket> {
    let mut factories: BTreeMap<Factory, FactoryBucket> = BTreeMap::new();
    for record in records {
        let bucket = factories.entry(record.factory).or_default();
        bucket.total.add(record.quantity);
        if is_completed(record) {
            bucket.completed.add(record.quantity);
        }
        if is_shipped(record) {
            bucket.shipped.add(record.quantity);
        }
        if is_delayed(record) {
            bucket.delayed.add(record.quantity);
        }
    }
    factories
}
