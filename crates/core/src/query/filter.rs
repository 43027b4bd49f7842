//! Filter compiler
//!
//! Turns a [`FilterState`] into a chain of predicates, one per constraining
//! field, then evaluates the chain under AND or OR semantics.

use chrono::{Datelike, NaiveDate};
use loadplan_domain::utils::dates::{parse_date, week_bounds, year_month};
use loadplan_domain::{
    ClassificationThresholds, DateMode, FilterMode, FilterState, OrderRecord, QuickFilter,
    StatusFilter,
};
use tracing::warn;

use super::regions::parse_region_filter;
use crate::classification::{
    days_until, in_production, is_completed, is_critical, is_delayed, is_pending, is_shipped,
    is_warning,
};

/// A compiled filter field
pub type Predicate = Box<dyn Fn(&OrderRecord) -> bool + Send + Sync>;

/// Evaluation context captured by date-relative predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterContext {
    pub today: NaiveDate,
    pub thresholds: ClassificationThresholds,
}

impl FilterContext {
    pub fn new(today: NaiveDate, thresholds: ClassificationThresholds) -> Self {
        Self { today, thresholds }
    }
}

fn active_date(record: &OrderRecord, mode: DateMode) -> Option<NaiveDate> {
    parse_date(record.date_for(mode))
}

/// Compile every constraining field, in fixed field order
pub fn compile(filter: &FilterState, date_mode: DateMode, ctx: &FilterContext) -> Vec<Predicate> {
    let mut predicates: Vec<Predicate> = Vec::new();

    let search = filter.search.trim().to_lowercase();
    if !search.is_empty() {
        predicates.push(Box::new(move |record: &OrderRecord| {
            [&record.po_number, &record.model, &record.article, &record.destination, &record.vendor]
                .iter()
                .any(|field| field.to_lowercase().contains(&search))
        }));
    }

    let month = filter.month.trim().to_string();
    if !month.is_empty() {
        predicates.push(Box::new(move |record: &OrderRecord| {
            year_month(record.date_for(date_mode)).is_some_and(|ym| ym.starts_with(&month))
        }));
    }

    let destination = filter.destination.trim().to_string();
    if !destination.is_empty() {
        predicates.push(destination_predicate(destination));
    }

    let vendor = filter.vendor.trim().to_string();
    if !vendor.is_empty() {
        predicates.push(Box::new(move |record: &OrderRecord| record.vendor.trim() == vendor));
    }

    if let Some(factory) = filter.factory {
        predicates.push(Box::new(move |record: &OrderRecord| record.factory == factory));
    }

    if let Some(status) = filter.status {
        predicates.push(status_predicate(status, *ctx));
    }

    if let Some(quick) = filter.quick {
        predicates.push(quick_predicate(quick, date_mode, *ctx));
    }

    let range = filter.date_range;
    if !range.is_unbounded() {
        predicates.push(Box::new(move |record: &OrderRecord| {
            active_date(record, date_mode).is_some_and(|date| {
                range.start.map_or(true, |start| date >= start)
                    && range.end.map_or(true, |end| date <= end)
            })
        }));
    }

    let quantity = filter.quantity_range;
    if !quantity.is_unbounded() {
        let min = quantity.min.unwrap_or(0);
        let max = quantity.max.unwrap_or(u64::MAX);
        predicates
            .push(Box::new(move |record: &OrderRecord| (min..=max).contains(&record.quantity)));
    }

    predicates
}

fn destination_predicate(destination: String) -> Predicate {
    match parse_region_filter(&destination) {
        Some(Ok(region)) => {
            Box::new(move |record: &OrderRecord| region.contains(&record.destination))
        }
        Some(Err(err)) => {
            warn!(%destination, error = %err, "unknown region filter matches nothing");
            Box::new(|_: &OrderRecord| false)
        }
        None => Box::new(move |record: &OrderRecord| record.destination.trim() == destination),
    }
}

fn status_predicate(status: StatusFilter, ctx: FilterContext) -> Predicate {
    let FilterContext { today, thresholds } = ctx;
    match status {
        StatusFilter::Delayed => Box::new(is_delayed),
        StatusFilter::Warning => {
            Box::new(move |record: &OrderRecord| is_warning(record, today, &thresholds))
        }
        StatusFilter::Critical => {
            Box::new(move |record: &OrderRecord| is_critical(record, today, &thresholds))
        }
        StatusFilter::Shipped => Box::new(is_shipped),
        StatusFilter::Completed => Box::new(is_completed),
        StatusFilter::InProduction => Box::new(in_production),
        StatusFilter::Pending => Box::new(is_pending),
        StatusFilter::OnTime => Box::new(|record: &OrderRecord| !is_delayed(record)),
    }
}

fn crd_window(days: i64, today: NaiveDate) -> Predicate {
    Box::new(move |record: &OrderRecord| {
        !is_shipped(record)
            && days_until(record, DateMode::Crd, today)
                .is_some_and(|left| (0..=days).contains(&left))
    })
}

fn quick_predicate(quick: QuickFilter, date_mode: DateMode, ctx: FilterContext) -> Predicate {
    let today = ctx.today;
    match quick {
        QuickFilter::Delayed => status_predicate(StatusFilter::Delayed, ctx),
        QuickFilter::Warning => status_predicate(StatusFilter::Warning, ctx),
        QuickFilter::Critical => status_predicate(StatusFilter::Critical, ctx),
        QuickFilter::Today => {
            Box::new(move |record: &OrderRecord| active_date(record, date_mode) == Some(today))
        }
        QuickFilter::Week => {
            let (start, end) = week_bounds(today);
            Box::new(move |record: &OrderRecord| {
                active_date(record, date_mode).is_some_and(|date| date >= start && date <= end)
            })
        }
        QuickFilter::Month => Box::new(move |record: &OrderRecord| {
            active_date(record, date_mode)
                .is_some_and(|date| date.year() == today.year() && date.month() == today.month())
        }),
        QuickFilter::UrgentOverdue => Box::new(move |record: &OrderRecord| {
            !is_shipped(record)
                && days_until(record, DateMode::Crd, today).is_some_and(|left| left < 0)
        }),
        QuickFilter::Urgent3d => crd_window(3, today),
        QuickFilter::Urgent7d => crd_window(7, today),
        QuickFilter::Urgent14d => crd_window(14, today),
        QuickFilter::StatusShipped => Box::new(is_shipped),
        QuickFilter::StatusInProduction => Box::new(in_production),
        QuickFilter::StatusPending => Box::new(is_pending),
    }
}

/// Evaluate a predicate chain. An empty chain returns the input unchanged.
pub fn apply(
    records: &[OrderRecord],
    predicates: &[Predicate],
    mode: FilterMode,
) -> Vec<OrderRecord> {
    if predicates.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| matches(record, predicates, mode))
        .cloned()
        .collect()
}

/// Whether one record passes the chain
pub fn matches(record: &OrderRecord, predicates: &[Predicate], mode: FilterMode) -> bool {
    match mode {
        FilterMode::And => predicates.iter().all(|predicate| predicate(record)),
        FilterMode::Or => predicates.iter().any(|predicate| predicate(record)),
    }
}
