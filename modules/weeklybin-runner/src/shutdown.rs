//! SIGTERM/SIGINT listener that flips a shared flag (spec.md §5: "on
//! SIGTERM/SIGINT, stop accepting new work in every worker, await in-flight
//! handlers to completion, close the browser last").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

pub async fn wait_for_shutdown_signal(shutdown: Arc<AtomicBool>) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("received SIGINT, shutting down"),
            _ = terminate.recv() => info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("received ctrl-c, shutting down");
    }

    shutdown.store(true, Ordering::Relaxed);
}
