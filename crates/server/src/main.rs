//! Polygen game server binary.
//!
//! Composition root: reads configuration, installs logging, builds the
//! [`runtime::RoomManager`] and serves the line-delimited JSON gateway until
//! interrupted.

mod config;
mod gateway;
mod logging;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use config::ServerConfig;
use runtime::RoomManager;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env();
    let _log_guard = logging::setup_logging(config.log_dir.as_deref())?;

    let manager =
        RoomManager::new(config.runtime_config()?).context("invalid runtime configuration")?;
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    tracing::info!(addr = %config.addr, "polygen listening");

    tokio::select! {
        result = gateway::serve(listener, manager.clone()) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
    }

    manager.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}
