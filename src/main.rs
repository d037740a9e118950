// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity-Sync API Server
//!
//! Receives identity provider webhooks and mirrors users into the local
//! store.

use anyhow::Context;
use identity_sync::{
    config::Config,
    db::{MemoryUserStore, PgUserStore, UserStore},
    services::{ClerkClient, IdentityProvider, UserReconciler},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        webhook_path = %config.webhook_path,
        "Starting Identity-Sync API"
    );

    // Initialize the user store
    let pg_store = match &config.database_url {
        Some(url) => {
            let store = PgUserStore::connect(url, config.database_max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            store.migrate().await.context("Failed to run migrations")?;
            Some(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory user store");
            None
        }
    };
    let store: Arc<dyn UserStore> = match &pg_store {
        Some(store) => Arc::new(store.clone()),
        None => Arc::new(MemoryUserStore::new()),
    };

    // Initialize identity provider client
    let provider: Arc<dyn IdentityProvider> = Arc::new(ClerkClient::new(
        &config.clerk_api_url,
        config.clerk_secret_key.clone(),
        config.provider_timeout,
    )?);
    tracing::info!(api_url = %config.clerk_api_url, "Identity provider client initialized");

    let reconciler = UserReconciler::new(provider, store, config.provider_timeout);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        reconciler,
    });

    // Build router
    let app = identity_sync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(store) = pg_store {
        store.close().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("identity_sync=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
