//! Orchestrator entry point: load config, wire every module together, spawn
//! one worker per queue plus the scheduler, then run until a shutdown
//! signal drains them (spec.md §5, §6).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use weeklybin_model::Config;
use weeklybin_runner::{shutdown, wiring};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("weeklybin=info".parse()?))
        .init();

    info!("weeklybin runner starting");

    let config = Arc::new(Config::from_env());
    let runtime = wiring::Runtime::build(Arc::clone(&config)).await?;

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_listener = tokio::spawn(shutdown::wait_for_shutdown_signal(Arc::clone(&shutdown_flag)));

    runtime.run(shutdown_flag).await;
    let _ = shutdown_listener.await;

    info!("weeklybin runner stopped");
    Ok(())
}
