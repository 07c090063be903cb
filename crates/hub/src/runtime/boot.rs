//! Boot — logging init, config load, state creation.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::HubConfig;
use crate::state::{HubState, SharedState};

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load config and build shared state.
///
/// Returns `(SharedState, HubConfig)` on success.
pub fn boot() -> Result<(SharedState, HubConfig)> {
    info!("Starting LogLens Hub v{}", env!("CARGO_PKG_VERSION"));

    let config = HubConfig::load().context("Failed to load configuration")?;
    info!("Loaded configuration: bind_address={}", config.bind_address());
    info!(
        "Log store capacity: {} entries; {} path mapping(s), {} workspace root(s)",
        config.max_log_entries,
        config.path_mappings.len(),
        config.workspace_roots.len()
    );

    let state = Arc::new(HubState::new(config.clone()));
    info!("Initialized shared application state");

    Ok((state, config))
}
