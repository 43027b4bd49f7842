//! Command execution helpers

use std::future::Future;
use std::time::Instant;

use loadplan_domain::Result as DomainResult;

use crate::utils::logging::log_command_execution;

/// Run a command body, timing it and logging the outcome.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn get_statistics(ctx: &AppContext) -> Result<StatisticsPair> {
///     execute_command("orders::get_statistics", || async {
///         Ok(ctx.query.statistics())
///     })
///     .await
/// }
/// ```
pub async fn execute_command<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command_fn().await;

    let error_kind = result.as_ref().err().map(|err| err.kind());
    log_command_execution(command_name, start.elapsed(), result.is_ok(), error_kind);

    result
}
