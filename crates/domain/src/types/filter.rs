//! Filter criteria owned by the query engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use crate::impl_domain_status_conversions;
use crate::types::order::Factory;

/// How compiled predicates combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum FilterMode {
    #[default]
    And,
    Or,
}

impl_domain_status_conversions!(FilterMode {
    And => "and",
    Or => "or",
});

/// Which date field drives month/range/quick filters and month grouping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum DateMode {
    #[default]
    Sdd,
    Crd,
}

impl_domain_status_conversions!(DateMode {
    Sdd => "sdd",
    Crd => "crd",
});

/// Named status categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum StatusFilter {
    Delayed,
    Warning,
    Critical,
    Shipped,
    Completed,
    InProduction,
    Pending,
    OnTime,
}

impl_domain_status_conversions!(StatusFilter {
    Delayed => "delayed",
    Warning => "warning",
    Critical => "critical",
    Shipped => "shipped",
    Completed => "completed",
    InProduction => "in_production",
    Pending => "pending",
    OnTime => "on_time",
});

/// Quick-filter tags offered as one-click shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum QuickFilter {
    Delayed,
    Warning,
    Critical,
    Today,
    Week,
    Month,
    UrgentOverdue,
    Urgent3d,
    Urgent7d,
    Urgent14d,
    StatusShipped,
    StatusInProduction,
    StatusPending,
}

impl_domain_status_conversions!(QuickFilter {
    Delayed => "delayed",
    Warning => "warning",
    Critical => "critical",
    Today => "today",
    Week => "week",
    Month => "month",
    UrgentOverdue => "urgent_overdue",
    Urgent3d => "urgent_3d",
    Urgent7d => "urgent_7d",
    Urgent14d => "urgent_14d",
    StatusShipped => "status_shipped",
    StatusInProduction => "status_in_production",
    StatusPending => "status_pending",
});

/// Inclusive date bounds; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Inclusive quantity bounds; `None` means 0 / infinity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct QuantityRange {
    #[cfg_attr(feature = "ts-gen", ts(type = "number | null"))]
    pub min: Option<u64>,
    #[cfg_attr(feature = "ts-gen", ts(type = "number | null"))]
    pub max: Option<u64>,
}

impl QuantityRange {
    /// True when the range admits every quantity
    pub fn is_unbounded(&self) -> bool {
        self.min.unwrap_or(0) == 0 && self.max.is_none()
    }
}

/// User-editable filter criteria. Every field is always present; empty
/// strings and `None` mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    pub search: String,
    /// `YYYY-MM` prefix matched against the active date field
    pub month: String,
    /// Exact destination, or `region:<name>` for a regional group
    pub destination: String,
    pub vendor: String,
    pub factory: Option<Factory>,
    pub status: Option<StatusFilter>,
    pub quick: Option<QuickFilter>,
    pub date_range: DateRange,
    pub quantity_range: QuantityRange,
    pub mode: FilterMode,
}

impl FilterState {
    /// True when no field constrains the result
    pub fn is_default(&self) -> bool {
        self.search.trim().is_empty()
            && self.month.trim().is_empty()
            && self.destination.trim().is_empty()
            && self.vendor.trim().is_empty()
            && self.factory.is_none()
            && self.status.is_none()
            && self.quick.is_none()
            && self.date_range.is_unbounded()
            && self.quantity_range.is_unbounded()
    }

    /// Merge a partial update. Returns whether any field changed value.
    pub fn apply_patch(&mut self, patch: FilterPatch) -> bool {
        let before = self.clone();
        let FilterPatch {
            search,
            month,
            destination,
            vendor,
            factory,
            status,
            quick,
            date_range,
            quantity_range,
            mode,
        } = patch;

        if let Some(search) = search {
            self.search = search;
        }
        if let Some(month) = month {
            self.month = month;
        }
        if let Some(destination) = destination {
            self.destination = destination;
        }
        if let Some(vendor) = vendor {
            self.vendor = vendor;
        }
        if let Some(factory) = factory {
            self.factory = factory;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(quick) = quick {
            self.quick = quick;
        }
        if let Some(date_range) = date_range {
            self.date_range = date_range;
        }
        if let Some(quantity_range) = quantity_range {
            self.quantity_range = quantity_range;
        }
        if let Some(mode) = mode {
            self.mode = mode;
        }

        *self != before
    }
}

/// Partial filter update. Absent fields are left untouched; for optional
/// fields an explicit `null` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct FilterPatch {
    pub search: Option<String>,
    pub month: Option<String>,
    pub destination: Option<String>,
    pub vendor: Option<String>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub factory: Option<Option<Factory>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub status: Option<Option<StatusFilter>>,
    #[serde(with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    pub quick: Option<Option<QuickFilter>>,
    pub date_range: Option<DateRange>,
    pub quantity_range: Option<QuantityRange>,
    pub mode: Option<FilterMode>,
}
