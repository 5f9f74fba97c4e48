//! # Mostrador API Server
//!
//! ```text
//! env ──► ApiConfig ──► Database (SQLite, migrations) ──┐
//!                  └──► ExchangeRateProvider ───────────┴──► axum::serve
//!                                                              │
//!                                          Ctrl-C / SIGTERM ───┘ graceful
//! ```

use std::sync::Arc;

use anyhow::Context;
use mostrador_api::config::ApiConfig;
use mostrador_api::{app, AppState};
use mostrador_db::{Database, DbConfig};
use mostrador_rates::ExchangeRateProvider;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,mostrador=debug,sqlx=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .init();

    info!("Starting Mostrador API...");

    let config = ApiConfig::load().context("invalid configuration")?;
    info!(
        addr = %config.socket_addr(),
        db = %config.database_path,
        rates_url = %config.rates.url,
        quote = %config.rates.quote,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await
    .context("failed to open database")?;

    let rates = ExchangeRateProvider::new(&config.rates).context("failed to build rate client")?;
    let state = AppState::new(db.clone(), Arc::new(rates));

    let listener = TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.socket_addr()))?;
    info!(addr = %config.socket_addr(), "Listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
