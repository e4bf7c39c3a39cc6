//! ember-server - Ember backend server
//!
//! REST API for wheel ratings, focus sessions and weekly check-ins.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("ember-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::Config::load()?;
    info!("Config loaded from {:?}", config.config_path);

    let state = state::AppState::build(config)?;

    let eviction = services::spawn_eviction_task(
        state.engine.clone(),
        state.config.eviction_interval_secs,
    );

    let listener = TcpListener::bind(&state.config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, routes::create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eviction.abort();
    info!("Shutting down...");

    Ok(())
}

/// Human-readable logs by default; JSON lines when `EMBER_LOG_JSON=1`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ember_server=info,ember_core=info,tower_http=info"));

    let json = std::env::var("EMBER_LOG_JSON")
        .is_ok_and(|v| matches!(v.trim(), "1" | "true" | "TRUE"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
