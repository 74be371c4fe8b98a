//! Server configuration for `sharedesk`.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `SHAREDESK_*` environment variables.

use std::net::SocketAddr;

use sharedesk_store::{NetworkConfig, NetworkPreset};

/// Default request body limit: 2 MiB.
const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const DEFAULT_PORT: u16 = 3000;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Network used when a request carries no `x-nillion-config` header.
    pub default_network: NetworkConfig,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` - port to bind on, on all interfaces
    /// - `SHAREDESK_BIND_ADDR` - full bind address (overrides `PORT`, default: `127.0.0.1:3000`)
    /// - `SHAREDESK_LOG_LEVEL` - log filter (default: `info`)
    /// - `SHAREDESK_NETWORK` - `testnet` or `mainnet` (default: `testnet`)
    /// - `SHAREDESK_API_KEY` - builder API key for the default network (default: empty)
    /// - `SHAREDESK_MAX_BODY_BYTES` - request body limit (default: 2 MiB)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        // Priority: SHAREDESK_BIND_ADDR > PORT > default 127.0.0.1:3000
        let bind_addr = if let Some(addr) = var("SHAREDESK_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))
        } else if let Some(port) = var("PORT") {
            SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(DEFAULT_PORT)))
        } else {
            SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT))
        };

        let log_level = var("SHAREDESK_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let preset = var("SHAREDESK_NETWORK")
            .and_then(|name| NetworkPreset::parse(&name))
            .unwrap_or_default();
        let api_key = var("SHAREDESK_API_KEY").unwrap_or_default();

        let max_body_bytes = var("SHAREDESK_MAX_BODY_BYTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        Self {
            bind_addr,
            log_level,
            default_network: NetworkConfig::preset(preset, api_key),
            max_body_bytes,
        }
    }
}
