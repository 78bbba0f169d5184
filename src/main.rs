//! formgate form-submission gateway.
//!
//! Main entry point for the gateway server. Loads configuration, builds the
//! shared clients, and serves until a shutdown signal arrives.

use anyhow::{Context, Result};
use formgate_api::{AppState, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize tracing with structured logging
    init_tracing(&config.rust_log)?;

    info!("Starting formgate gateway");
    info!(config = ?config, "Configuration loaded");

    let addr = config.parse_server_addr()?;
    let state = AppState::from_config(config)?;
    info!(
        upstream = %state.base_urls.iter().map(|u| u.as_str()).collect::<Vec<_>>().join(", "),
        bot_verification = state.verifier.is_enabled(),
        "Gateway initialized"
    );

    formgate_api::start_server(state, addr).await.context("HTTP server failed")?;

    info!("formgate shutdown complete");
    Ok(())
}

/// Initializes tracing. `RUST_LOG` wins over the configured level.
fn init_tracing(default_filter: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("Invalid log filter")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
    Ok(())
}
