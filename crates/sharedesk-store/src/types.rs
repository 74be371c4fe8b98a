//! Value types exchanged with a record store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record filter: top-level field equality.
pub type Filter = serde_json::Map<String, Value>;

/// Whether the builder or the end user owns a collection's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    /// Records owned by the builder.
    #[default]
    Standard,
    /// Records owned by end users.
    Owned,
}

/// Collection as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub collection_type: CollectionType,
}

/// Everything a store needs to create a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub collection_type: CollectionType,
    pub name: String,
    /// The draft-07 JSON Schema document, stored verbatim.
    pub schema: Value,
}

/// Metadata returned when reading a single collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    #[serde(rename = "_id")]
    pub id: String,
    /// Number of records.
    pub count: u64,
    /// Approximate stored size in bytes.
    pub size: u64,
    /// Time of the most recent write, if any.
    pub last_write: Option<DateTime<Utc>>,
    pub schema: Value,
}

/// The registered builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderProfile {
    #[serde(rename = "_id")]
    pub did: String,
    pub name: String,
    /// Ids of the collections this builder owns.
    pub collections: Vec<String>,
}

/// Builder registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub did: String,
    pub name: String,
}

/// Check whether `record` satisfies every top-level equality in `filter`.
///
/// An empty filter matches every record.
pub fn matches_filter(filter: &Filter, record: &Value) -> bool {
    let Some(fields) = record.as_object() else {
        return filter.is_empty();
    };
    filter
        .iter()
        .all(|(key, expected)| fields.get(key) == Some(expected))
}
