//! Shared application state for the `sharedesk` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It holds no store handle: each request resolves
//! its own [`NetworkConfig`] and connects through the connector.

use std::sync::Arc;

use sharedesk_store::{NetworkConfig, StoreConnector};

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Opens record stores for a network configuration.
    pub connector: Arc<dyn StoreConnector>,
    /// Used when a request carries no usable `x-nillion-config` header.
    pub default_network: NetworkConfig,
}

impl AppState {
    pub fn new(connector: Arc<dyn StoreConnector>, default_network: NetworkConfig) -> Self {
        Self {
            connector,
            default_network,
        }
    }
}
