//! Statistics types produced by the aggregation engine
//!
//! This module centralizes the summary structs served to consumers:
//! - Order statistics (counts, quantities, rates)
//! - Grouping buckets (month, destination, factory)
//! - Parse statistics reported per file

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use crate::impl_domain_status_conversions;
use crate::types::order::Factory;

/* -------------------------------------------------------------------------- */
/* Order Statistics */
/* -------------------------------------------------------------------------- */

/// Count and summed quantity of one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct Tally {
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub orders: u64,
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub quantity: u64,
}

impl Tally {
    pub fn add(&mut self, quantity: u64) {
        self.orders += 1;
        self.quantity += quantity;
    }
}

/// Summary of one record set
///
/// Rates are percentages of the order count, `0.0` for an empty set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct OrderStatistics {
    /// All orders in the set
    pub total: Tally,
    pub completed: Tally,
    pub shipped: Tally,
    pub delayed: Tally,
    pub warning: Tally,
    pub critical: Tally,
    pub in_production: Tally,
    pub pending: Tally,

    pub completion_rate: f64,
    pub shipped_rate: f64,
    pub delay_rate: f64,
}

impl OrderStatistics {
    /// Fill the rate fields from the tallies
    pub fn finalize_rates(&mut self) {
        let total = self.total.orders;
        self.completion_rate = percent(self.completed.orders, total);
        self.shipped_rate = percent(self.shipped.orders, total);
        self.delay_rate = percent(self.delayed.orders, total);
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = part as f64 / total as f64;
        ratio * 100.0
    }
}

/// Statistics for the factory-scoped set and for the filtered subset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct StatisticsPair {
    pub scoped: OrderStatistics,
    pub filtered: OrderStatistics,
}

/* -------------------------------------------------------------------------- */
/* Groupings */
/* -------------------------------------------------------------------------- */

/// Orders sharing one `YYYY-MM` of the active date field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct MonthBucket {
    pub month: String,
    pub total: Tally,
    pub shipped: Tally,
    pub delayed: Tally,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct DestinationBucket {
    pub destination: String,
    pub total: Tally,
    pub shipped: Tally,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct FactoryBucket {
    pub total: Tally,
    pub completed: Tally,
    pub shipped: Tally,
    pub delayed: Tally,
}

/// Which grouping to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingKind {
    Month,
    Destination,
    Factory,
}

impl_domain_status_conversions!(GroupingKind {
    Month => "month",
    Destination => "destination",
    Factory => "factory",
});

/// A computed grouping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "buckets", rename_all = "lowercase")]
pub enum Grouping {
    Month(Vec<MonthBucket>),
    Destination(Vec<DestinationBucket>),
    Factory(BTreeMap<Factory, FactoryBucket>),
}

impl Grouping {
    pub fn kind(&self) -> GroupingKind {
        match self {
            Self::Month(_) => GroupingKind::Month,
            Self::Destination(_) => GroupingKind::Destination,
            Self::Factory(_) => GroupingKind::Factory,
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Parse Statistics */
/* -------------------------------------------------------------------------- */

/// Row accounting for one parsed file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct ParseStatistics {
    /// Data rows seen after the header
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub rows_read: u64,
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub records: u64,
    /// Repeated headers, total rows and blank rows
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub skipped_rows: u64,
    /// Rows dropped because a required value was invalid
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub error_rows: u64,
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub empty_destinations: u64,
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub invalid_dates: u64,
}

impl ParseStatistics {
    pub fn merge(&mut self, other: &Self) {
        self.rows_read += other.rows_read;
        self.records += other.records;
        self.skipped_rows += other.skipped_rows;
        self.error_rows += other.error_rows;
        self.empty_destinations += other.empty_destinations;
        self.invalid_dates += other.invalid_dates;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_are_zero_for_empty_set() {
        let mut stats = OrderStatistics::default();
        stats.finalize_rates();
        assert!(stats.completion_rate.abs() < f64::EPSILON);
        assert!(stats.delay_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn rates_use_order_counts() {
        let mut stats = OrderStatistics::default();
        stats.total.add(100);
        stats.total.add(300);
        stats.delayed.add(300);
        stats.finalize_rates();

        assert!((stats.delay_rate - 50.0).abs() < 1e-9);
        assert!(stats.shipped_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn grouping_serializes_with_kind_tag() {
        let grouping = Grouping::Destination(vec![DestinationBucket {
            destination: "Germany".into(),
            ..DestinationBucket::default()
        }]);
        let json = serde_json::to_value(&grouping).expect("serialize");

        assert_eq!(json["kind"], "destination");
        assert_eq!(json["buckets"][0]["destination"], "Germany");
        assert_eq!(grouping.kind(), GroupingKind::Destination);
    }
}
