//! Loadplan - headless sync and query runner
//!
//! Without flags: load cached data, sync once and print the current
//! statistics as JSON. With `--watch`: keep syncing on the configured poll
//! interval until Ctrl-C.

use anyhow::Context;
use loadplan_lib::utils::logging::{init_tracing, LogFormat};
use loadplan_lib::{get_statistics, get_sync_status, AppContext};

#[derive(Debug, Default)]
struct Options {
    watch: bool,
    help: bool,
}

fn parse_options() -> anyhow::Result<Options> {
    let mut options = Options::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--watch" | "-w" => options.watch = true,
            "--help" | "-h" => options.help = true,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(options)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber reads RUST_LOG / LOADPLAN_LOG_FORMAT.
    let dotenv = dotenvy::dotenv();
    init_tracing(LogFormat::from_env());
    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let options = parse_options()?;
    if options.help {
        println!("usage: loadplan [--watch]");
        return Ok(());
    }

    let context = AppContext::new().await.context("failed to build application context")?;
    context.start().await.context("failed to start application context")?;

    if options.watch {
        tracing::info!(
            interval_ms = context.config.sync.poll_interval().as_millis() as u64,
            "watching for remote changes; press Ctrl-C to stop"
        );
        tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    }

    let status = get_sync_status(&context).await?;
    let statistics = get_statistics(&context).await?;
    let summary = serde_json::json!({ "status": status, "statistics": statistics });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    context.shutdown().await?;
    Ok(())
}
