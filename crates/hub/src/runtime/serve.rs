//! Serve — open the listener and accept probe connections until shutdown.

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::conf::HubConfig;
use crate::server::listener;
use crate::state::SharedState;

/// Bind the transport listener and serve until shutdown.
pub async fn serve(state: SharedState, config: HubConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    let addr = listener.local_addr().context("No local address")?;

    info!("");
    info!("========================================");
    info!("LogLens Hub is ready!");
    info!("Listening on: {}", addr);
    info!("Press Ctrl+C to shutdown gracefully");
    info!("========================================");
    info!("");

    tokio::select! {
        _ = listener::run(listener, state) => {}
        _ = shutdown_signal() => {
            info!("Received shutdown signal");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
