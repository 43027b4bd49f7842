//! Order classification
//!
//! Pure functions of `(record, today, thresholds)`. Nothing here reads a
//! clock; callers pass `today` so results are reproducible in tests.

use chrono::NaiveDate;
use loadplan_domain::utils::dates::parse_date;
use loadplan_domain::{ClassificationThresholds, DateMode, OrderRecord, Stage, StageStatus};
use serde::{Deserialize, Serialize};

/// SDD strictly later than CRD, unless an approval override is present
pub fn is_delayed(record: &OrderRecord) -> bool {
    if record.has_approval_override() {
        return false;
    }
    match (parse_date(&record.sdd_value), parse_date(&record.crd)) {
        (Some(sdd), Some(crd)) => sdd > crd,
        _ => false,
    }
}

/// Warehouse-out covers the full order quantity
pub fn is_shipped(record: &OrderRecord) -> bool {
    record.quantity > 0 && record.stage_completed(Stage::WhOut) >= record.quantity
}

fn crd_within(record: &OrderRecord, today: NaiveDate, days: i64) -> bool {
    if is_shipped(record) {
        return false;
    }
    days_until(record, DateMode::Crd, today).is_some_and(|left| (0..=days).contains(&left))
}

/// CRD falls within the warning window and the order has not shipped
pub fn is_warning(
    record: &OrderRecord,
    today: NaiveDate,
    thresholds: &ClassificationThresholds,
) -> bool {
    crd_within(record, today, thresholds.warning_days)
}

/// CRD falls within the critical window and the order has not shipped
pub fn is_critical(
    record: &OrderRecord,
    today: NaiveDate,
    thresholds: &ClassificationThresholds,
) -> bool {
    crd_within(record, today, thresholds.critical_days)
}

/// Every production stage reports completed
pub fn is_completed(record: &OrderRecord) -> bool {
    record.quantity > 0
        && Stage::ALL.iter().all(|stage| {
            record.stage(*stage).is_some_and(|progress| progress.status == StageStatus::Completed)
        })
}

fn has_progress(record: &OrderRecord) -> bool {
    record.production.values().any(|progress| progress.completed > 0)
}

/// Some stage has progressed but the order has not shipped
pub fn in_production(record: &OrderRecord) -> bool {
    has_progress(record) && !is_shipped(record)
}

/// No stage has progressed yet
pub fn is_pending(record: &OrderRecord) -> bool {
    !has_progress(record)
}

/// Whole days from `today` to the record's date for `mode`; negative when past
pub fn days_until(record: &OrderRecord, mode: DateMode, today: NaiveDate) -> Option<i64> {
    parse_date(record.date_for(mode)).map(|date| (date - today).num_days())
}

/// CRD urgency bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Overdue,
    Within3Days,
    Within7Days,
    Within14Days,
    Later,
    Unscheduled,
}

/// Bucket an order by days left until its CRD
pub fn urgency(record: &OrderRecord, today: NaiveDate) -> Urgency {
    match days_until(record, DateMode::Crd, today) {
        None => Urgency::Unscheduled,
        Some(left) if left < 0 => Urgency::Overdue,
        Some(0..=3) => Urgency::Within3Days,
        Some(4..=7) => Urgency::Within7Days,
        Some(8..=14) => Urgency::Within14Days,
        Some(_) => Urgency::Later,
    }
}
