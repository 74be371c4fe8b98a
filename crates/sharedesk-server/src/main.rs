//! `sharedesk` server entry point.
//!
//! Loads configuration, initializes structured logging, and starts the Axum
//! HTTP server with graceful shutdown. Records live in the in-memory store;
//! each builder key gets its own isolated store.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use sharedesk_server::config::ServerConfig;
use sharedesk_server::state::AppState;
use sharedesk_store::MemoryConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(
        network = ?config.default_network,
        max_body_bytes = config.max_body_bytes,
        "sharedesk starting"
    );
    if config.default_network.validate().is_err() {
        info!("no usable default network; requests must send an x-nillion-config header");
    }

    let state = Arc::new(AppState::new(
        Arc::new(MemoryConnector::new()),
        config.default_network.clone(),
    ));
    let app = sharedesk_server::app(state, config.max_body_bytes);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "sharedesk server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("sharedesk server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
}
