//! Health command

use loadplan_domain::Result;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;
use crate::utils::health::HealthStatus;

pub async fn get_health(ctx: &AppContext) -> Result<HealthStatus> {
    execute_command("health::get_health", move || async move { Ok(ctx.health_check()) }).await
}
