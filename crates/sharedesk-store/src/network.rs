//! Network configuration for reaching the storage nodes.
//!
//! A [`NetworkConfig`] is an explicit value handed to a
//! [`StoreConnector`](crate::StoreConnector). Nothing in the workspace keeps
//! a process-wide copy; the server resolves one per request.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::StoreError;

const TESTNET_CHAIN_URL: &str = "http://rpc.testnet.nilchain-rpc-proxy.nilogy.xyz";
const TESTNET_AUTH_URL: &str = "https://nilauth.sandbox.app-cluster.sandbox.nilogy.xyz";
const TESTNET_NODES: [&str; 3] = [
    "https://nildb-stg-n1.nillion.network",
    "https://nildb-stg-n2.nillion.network",
    "https://nildb-stg-n3.nillion.network",
];

const MAINNET_CHAIN_URL: &str = "http://nilchain-rpc.nillion.network";
const MAINNET_AUTH_URL: &str = "https://nilauth-cf7f.nillion.network";
const MAINNET_NODES: [&str; 3] = [
    "https://nildb-5ab1.nillion.network",
    "https://nildb-906d.kjnodes.com",
    "https://nildb-8001.cloudician.xyz",
];

/// Known public endpoint sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPreset {
    /// Public testnet endpoints.
    #[default]
    Testnet,
    /// Public mainnet endpoints.
    Mainnet,
}

impl NetworkPreset {
    /// Parse a preset name, case-insensitively. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "testnet" => Some(Self::Testnet),
            "mainnet" => Some(Self::Mainnet),
            _ => None,
        }
    }
}

/// Endpoints and credentials used to open a record store.
///
/// Field names on the wire match the header format sent by the console
/// front-end (`NILCHAIN_URL`, `NILAUTH_URL`, `NILDB_NODES`, `NILLION_API_KEY`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Chain RPC endpoint.
    #[serde(rename = "NILCHAIN_URL")]
    pub chain_url: String,
    /// Authentication service endpoint.
    #[serde(rename = "NILAUTH_URL")]
    pub auth_url: String,
    /// Storage node endpoints.
    #[serde(rename = "NILDB_NODES")]
    pub db_nodes: Vec<String>,
    /// Builder API key (secret).
    #[serde(rename = "NILLION_API_KEY", default)]
    pub api_key: String,
}

impl NetworkConfig {
    /// Build a config from a preset with the given API key.
    pub fn preset(preset: NetworkPreset, api_key: impl Into<String>) -> Self {
        let (chain, auth, nodes) = match preset {
            NetworkPreset::Testnet => (TESTNET_CHAIN_URL, TESTNET_AUTH_URL, TESTNET_NODES),
            NetworkPreset::Mainnet => (MAINNET_CHAIN_URL, MAINNET_AUTH_URL, MAINNET_NODES),
        };
        Self {
            chain_url: chain.to_owned(),
            auth_url: auth.to_owned(),
            db_nodes: nodes.iter().map(|n| (*n).to_owned()).collect(),
            api_key: api_key.into(),
        }
    }

    /// Check that every value needed to open a store is present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] when the API key is blank, or
    /// when the chain URL, auth URL, or node list is empty.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.api_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig {
                reason: "NILLION_API_KEY is required - please set it in the network configuration"
                    .to_owned(),
            });
        }
        if self.chain_url.is_empty() || self.auth_url.is_empty() || self.db_nodes.is_empty() {
            return Err(StoreError::InvalidConfig {
                reason: "network configuration is incomplete - chain URL, auth URL and at least one node are required"
                    .to_owned(),
            });
        }
        Ok(())
    }

    /// Stable builder identifier derived from the API key.
    ///
    /// The key itself never leaves this struct; only its SHA-256 digest is
    /// exposed.
    pub fn builder_did(&self) -> String {
        let digest = Sha256::digest(self.api_key.as_bytes());
        format!("did:nil:{}", hex::encode(digest))
    }
}

impl std::fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("chain_url", &self.chain_url)
            .field("auth_url", &self.auth_url)
            .field("db_nodes", &self.db_nodes)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn testnet_preset_has_three_nodes() {
        let config = NetworkConfig::preset(NetworkPreset::Testnet, "key");
        assert_eq!(config.db_nodes.len(), 3);
        assert_eq!(config.chain_url, TESTNET_CHAIN_URL);
        config.validate().unwrap();
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let config = NetworkConfig::preset(NetworkPreset::Mainnet, "   ");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig { .. }));
        assert!(err.to_string().contains("NILLION_API_KEY"));
    }

    #[test]
    fn missing_nodes_are_rejected() {
        let mut config = NetworkConfig::preset(NetworkPreset::Testnet, "key");
        config.db_nodes.clear();
        assert!(matches!(
            config.validate(),
            Err(StoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn header_format_deserializes() {
        let raw = r#"{
            "NILCHAIN_URL": "http://chain",
            "NILAUTH_URL": "http://auth",
            "NILDB_NODES": ["http://n1"],
            "NILLION_API_KEY": "abc"
        }"#;
        let config: NetworkConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.db_nodes, vec!["http://n1"]);
        assert_eq!(config.api_key, "abc");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = NetworkConfig::preset(NetworkPreset::Testnet, "super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn builder_did_is_stable_per_key() {
        let a = NetworkConfig::preset(NetworkPreset::Testnet, "one");
        let b = NetworkConfig::preset(NetworkPreset::Mainnet, "one");
        let c = NetworkConfig::preset(NetworkPreset::Testnet, "two");
        assert_eq!(a.builder_did(), b.builder_did());
        assert_ne!(a.builder_did(), c.builder_did());
        assert!(a.builder_did().starts_with("did:nil:"));
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!(NetworkPreset::parse("MainNet"), Some(NetworkPreset::Mainnet));
        assert_eq!(NetworkPreset::parse("testnet"), Some(NetworkPreset::Testnet));
        assert_eq!(NetworkPreset::parse("devnet"), None);
    }
}
