//! HTTP boundary for the weather forecast service.
//!
//! Exposes `GET /api/locations/{city}/?days=N` behind HTTP Basic
//! authentication and maps the core's classified results to responses.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::net::TcpListener;
use tracing::info;
use weather_core::{Config, ForecastService, provider_from_config};

pub use auth::{Credentials, hash_password, verify_password};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let credentials = Credentials::from_config(config);
    if credentials.is_empty() {
        bail!(
            "No API users configured.\n\
             Hint: run `weather add-user <username>` first."
        );
    }

    let provider = provider_from_config(config)?;
    let service = ForecastService::new(Arc::from(provider));
    let app = create_router(AppState::new(service, credentials));

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    info!(addr = %config.server.bind, "weather API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("weather API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
