//! Filter, order and statistics commands

use loadplan_core::query::CachedOrders;
use loadplan_domain::{
    DateMode, Factory, FilterPatch, FilterState, Grouping, GroupingKind, LoadplanError, Result,
    StatisticsPair,
};
use serde::Serialize;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Current filter criteria plus the view settings that scope them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSnapshot {
    pub filters: FilterState,
    pub date_mode: DateMode,
    pub selected_factory: Option<Factory>,
}

fn filter_snapshot(ctx: &AppContext) -> FilterSnapshot {
    FilterSnapshot {
        filters: ctx.query.filter_state(),
        date_mode: ctx.query.date_mode(),
        selected_factory: ctx.query.selected_factory(),
    }
}

fn parse_tag<T>(raw: &str, what: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|err| LoadplanError::InvalidInput(format!("{what}: {err}")))
}

/// Orders passing the current filters within the selected factory scope
pub async fn get_filtered_orders(ctx: &AppContext) -> Result<CachedOrders> {
    execute_command("orders::get_filtered_orders", move || async move {
        Ok(ctx.query.filtered_orders())
    })
    .await
}

/// Unfiltered and filtered statistics for the current scope
pub async fn get_statistics(ctx: &AppContext) -> Result<StatisticsPair> {
    execute_command("orders::get_statistics", move || async move { Ok(ctx.query.statistics()) })
        .await
}

/// Group the filtered orders by `kind` (`month`, `destination` or `factory`)
pub async fn get_groupings(ctx: &AppContext, kind: &str) -> Result<Grouping> {
    execute_command("orders::get_groupings", move || async move {
        let kind: GroupingKind = parse_tag(kind, "grouping")?;
        Ok(ctx.query.groupings(kind))
    })
    .await
}

/// Merge a JSON filter patch into the current filters.
///
/// Absent fields are untouched; `null` clears an optional field. Unknown
/// fields and unknown status or quick tags are rejected.
pub async fn set_filters(ctx: &AppContext, patch: serde_json::Value) -> Result<FilterSnapshot> {
    execute_command("orders::set_filters", move || async move {
        let patch: FilterPatch = serde_json::from_value(patch)
            .map_err(|err| LoadplanError::InvalidInput(format!("filter patch: {err}")))?;
        ctx.query.set_filters(patch);
        Ok(filter_snapshot(ctx))
    })
    .await
}

pub async fn reset_filters(ctx: &AppContext) -> Result<FilterSnapshot> {
    execute_command("orders::reset_filters", move || async move {
        ctx.query.reset_filters();
        Ok(filter_snapshot(ctx))
    })
    .await
}

/// Switch the date field driving month, range and quick filters
pub async fn set_date_mode(ctx: &AppContext, mode: &str) -> Result<FilterSnapshot> {
    execute_command("orders::set_date_mode", move || async move {
        ctx.query.set_date_mode(parse_tag(mode, "date mode")?);
        Ok(filter_snapshot(ctx))
    })
    .await
}

/// Scope every query to one factory, or to all factories with `None`
pub async fn set_selected_factory(
    ctx: &AppContext,
    factory: Option<&str>,
) -> Result<FilterSnapshot> {
    execute_command("orders::set_selected_factory", move || async move {
        let factory = factory.map(|raw| parse_tag::<Factory>(raw, "factory")).transpose()?;
        ctx.query.set_selected_factory(factory);
        Ok(filter_snapshot(ctx))
    })
    .await
}

pub async fn get_filters(ctx: &AppContext) -> Result<FilterSnapshot> {
    execute_command("orders::get_filters", move || async move { Ok(filter_snapshot(ctx)) }).await
}
