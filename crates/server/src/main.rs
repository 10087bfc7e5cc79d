mod bootstrap;
mod health;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use forecourt_core::config::{AppConfig, LoadOptions, SessionConfig};
use forecourt_core::SessionStore;

fn init_logging(config: &AppConfig) {
    use forecourt_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    spawn_eviction_sweeper(Arc::clone(&app.sessions), &app.config.session);

    let router = webhook::router(webhook::WebhookState {
        runtime: Arc::clone(&app.runtime),
        sender: Arc::clone(&app.sender),
        verify_token: app.config.messenger.verify_token.clone(),
    })
    .merge(health::router(Arc::clone(&app.engine)));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "forecourt-server started"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "forecourt-server stopping"
    );
    Ok(())
}

/// Periodic inactivity sweep. The store resolves an eviction racing an
/// in-flight mutation as last-write-wins, so the sweeper needs no extra
/// coordination with the webhook path.
fn spawn_eviction_sweeper(sessions: Arc<SessionStore>, config: &SessionConfig) {
    let interval = Duration::from_secs(config.sweep_interval_secs);
    let max_age_hours = config.evict_after_hours;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sessions.evict_inactive(max_age_hours);
        }
    });
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
