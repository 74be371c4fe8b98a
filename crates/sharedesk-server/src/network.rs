//! Per-request network resolution.
//!
//! The console sends its network settings as JSON in the `x-nillion-config`
//! header. [`Connected`] turns that header into an open, registered record
//! store for the handler.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use sharedesk_store::{NetworkConfig, RecordStore};

use crate::error::AppError;
use crate::state::AppState;

/// Request header carrying the caller's [`NetworkConfig`] as JSON.
pub const NETWORK_HEADER: &str = "x-nillion-config";

/// Resolve the network for a request.
///
/// A missing or unparseable header falls back to `default`; validation
/// happens when the store is opened.
pub fn network_from_headers(headers: &HeaderMap, default: &NetworkConfig) -> NetworkConfig {
    let Some(raw) = headers.get(NETWORK_HEADER) else {
        return default.clone();
    };
    match raw
        .to_str()
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str(text).map_err(|e| e.to_string()))
    {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!(%error, "ignoring unparseable {NETWORK_HEADER} header");
            default.clone()
        }
    }
}

/// An open record store for the request's network.
pub struct Connected(pub Arc<dyn RecordStore>);

impl FromRequestParts<Arc<AppState>> for Connected {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let config = network_from_headers(&parts.headers, &state.default_network);
        let store = state.connector.connect(&config).await?;
        Ok(Self(store))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use sharedesk_store::NetworkPreset;

    #[test]
    fn header_overrides_default() {
        let custom = NetworkConfig::preset(NetworkPreset::Mainnet, "key");
        let mut headers = HeaderMap::new();
        headers.insert(
            NETWORK_HEADER,
            HeaderValue::from_str(&serde_json::to_string(&custom).unwrap()).unwrap(),
        );
        let default = NetworkConfig::preset(NetworkPreset::Testnet, "");
        assert_eq!(network_from_headers(&headers, &default), custom);
    }

    #[test]
    fn missing_or_garbled_header_uses_default() {
        let default = NetworkConfig::preset(NetworkPreset::Testnet, "fallback");
        assert_eq!(network_from_headers(&HeaderMap::new(), &default), default);

        let mut headers = HeaderMap::new();
        headers.insert(NETWORK_HEADER, HeaderValue::from_static("{not json"));
        assert_eq!(network_from_headers(&headers, &default), default);
    }
}
