//! In-memory record store for development and testing.
//!
//! All collections live in a `BTreeMap` behind a `RwLock`. Nothing is
//! persistent; data is lost when the process exits. Encrypted fields are
//! not actually secret-shared: an incoming `{"%allot": v}` is kept as
//! `{"%share": v}` so that reads look like they came back from storage
//! nodes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    ALLOT_KEY, BuilderProfile, CollectionDefinition, CollectionMetadata, CollectionSummary,
    Filter, ID_FIELD, NetworkConfig, RecordStore, Registration, SHARE_KEY, StoreConnector,
    StoreError, matches_filter,
};

#[derive(Debug)]
struct StoredCollection {
    summary: CollectionSummary,
    schema: Value,
    records: Vec<Value>,
    last_write: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Inner {
    profile: Option<BuilderProfile>,
    collections: BTreeMap<String, StoredCollection>,
}

/// An in-memory [`RecordStore`].
///
/// Cloning shares state, which makes it convenient to hand one copy to a
/// connector and keep another for assertions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store with no registered builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rewrite every `{"%allot": v}` wrapper into `{"%share": v}`.
fn seal_allotments(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(inner) = map.get(ALLOT_KEY) {
                    let mut sealed = Map::new();
                    sealed.insert(SHARE_KEY.to_owned(), inner.clone());
                    return Value::Object(sealed);
                }
            }
            Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, seal_allotments(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(seal_allotments).collect()),
        other => other,
    }
}

/// Whether `value` holds an encrypted-field wrapper anywhere inside it.
fn contains_encrypted(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.contains_key(ALLOT_KEY)
                || map.contains_key(SHARE_KEY)
                || map.values().any(contains_encrypted)
        }
        Value::Array(items) => items.iter().any(contains_encrypted),
        _ => false,
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .values()
            .map(|c| c.summary.clone())
            .collect())
    }

    async fn create_collection(&self, definition: CollectionDefinition) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.collections.contains_key(&definition.id) {
            return Err(StoreError::Duplicate {
                what: "collection",
                id: definition.id,
            });
        }
        let stored = StoredCollection {
            summary: CollectionSummary {
                id: definition.id.clone(),
                name: definition.name,
                collection_type: definition.collection_type,
            },
            schema: definition.schema,
            records: Vec::new(),
            last_write: None,
        };
        inner.collections.insert(definition.id, stored);
        Ok(())
    }

    async fn delete_collection(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .collections
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::collection_not_found(id))
    }

    async fn read_collection(&self, id: &str) -> Result<CollectionMetadata, StoreError> {
        let inner = self.inner.read().await;
        let stored = inner
            .collections
            .get(id)
            .ok_or_else(|| StoreError::collection_not_found(id))?;

        let size = stored
            .records
            .iter()
            .map(|r| r.to_string().len() as u64)
            .sum();

        Ok(CollectionMetadata {
            id: id.to_owned(),
            count: stored.records.len() as u64,
            size,
            last_write: stored.last_write,
            schema: stored.schema.clone(),
        })
    }

    async fn find_records(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError> {
        let inner = self.inner.read().await;
        let stored = inner
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::collection_not_found(collection))?;

        Ok(stored
            .records
            .iter()
            .filter(|r| matches_filter(filter, r))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn create_records(&self, collection: &str, records: Vec<Value>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::collection_not_found(collection))?;

        // Validate the whole batch before inserting anything.
        let mut incoming: Vec<&str> = Vec::with_capacity(records.len());
        for record in &records {
            let Some(id) = record_id(record) else {
                return Err(StoreError::Rejected {
                    reason: "every record must be an object with a string _id".to_owned(),
                });
            };
            let taken = incoming.contains(&id)
                || stored.records.iter().any(|r| record_id(r) == Some(id));
            if taken {
                return Err(StoreError::Duplicate {
                    what: "record",
                    id: id.to_owned(),
                });
            }
            incoming.push(id);
        }

        stored
            .records
            .extend(records.into_iter().map(seal_allotments));
        stored.last_write = Some(Utc::now());
        Ok(())
    }

    async fn update_records(
        &self,
        collection: &str,
        filter: &Filter,
        update: Value,
    ) -> Result<u64, StoreError> {
        let changes = match update {
            Value::Object(mut map) => match map.remove("$set") {
                Some(Value::Object(set)) => set,
                Some(_) => {
                    return Err(StoreError::Rejected {
                        reason: "$set must be an object".to_owned(),
                    });
                }
                None => map,
            },
            _ => {
                return Err(StoreError::Rejected {
                    reason: "update must be an object".to_owned(),
                });
            }
        };

        if changes.contains_key(ID_FIELD) {
            return Err(StoreError::Rejected {
                reason: "_id cannot be updated".to_owned(),
            });
        }
        if changes.values().any(contains_encrypted) {
            return Err(StoreError::Unsupported {
                collection: collection.to_owned(),
                reason: "encrypted fields cannot be updated in place".to_owned(),
            });
        }

        let mut inner = self.inner.write().await;
        let stored = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::collection_not_found(collection))?;

        let mut touched = 0;
        for record in &mut stored.records {
            if !matches_filter(filter, record) {
                continue;
            }
            if let Value::Object(fields) = record {
                for (key, value) in &changes {
                    fields.insert(key.clone(), value.clone());
                }
                touched += 1;
            }
        }
        if touched > 0 {
            stored.last_write = Some(Utc::now());
        }
        Ok(touched)
    }

    async fn delete_records(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::collection_not_found(collection))?;

        let before = stored.records.len();
        stored.records.retain(|r| !matches_filter(filter, r));
        let removed = (before - stored.records.len()) as u64;
        if removed > 0 {
            stored.last_write = Some(Utc::now());
        }
        Ok(removed)
    }

    async fn read_profile(&self) -> Result<BuilderProfile, StoreError> {
        let inner = self.inner.read().await;
        let mut profile = inner.profile.clone().ok_or_else(|| StoreError::NotFound {
            what: "builder profile",
            id: "current builder".to_owned(),
        })?;
        profile.collections = inner.collections.keys().cloned().collect();
        Ok(profile)
    }

    async fn register(&self, registration: Registration) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = &inner.profile {
            return Err(StoreError::Duplicate {
                what: "builder",
                id: existing.did.clone(),
            });
        }
        inner.profile = Some(BuilderProfile {
            did: registration.did,
            name: registration.name,
            collections: Vec::new(),
        });
        Ok(())
    }
}

/// Builders a [`MemoryConnector`] holds stores for unless told otherwise.
pub const DEFAULT_MAX_BUILDERS: usize = 64;

/// A [`StoreConnector`] handing out one [`MemoryStore`] per builder.
///
/// Builders are told apart by [`NetworkConfig::builder_did`], so two
/// requests with the same API key see the same collections. Stores are
/// never evicted; once `max_builders` distinct keys have connected, new
/// keys are refused. This backend is meant for development only.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    stores: Arc<RwLock<HashMap<String, MemoryStore>>>,
    max_builders: usize,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::with_max_builders(DEFAULT_MAX_BUILDERS)
    }
}

impl MemoryConnector {
    /// Create a connector with no stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connector holding at most `max_builders` stores.
    #[must_use]
    pub fn with_max_builders(max_builders: usize) -> Self {
        Self {
            stores: Arc::default(),
            max_builders,
        }
    }
}

#[async_trait::async_trait]
impl StoreConnector for MemoryConnector {
    async fn open(&self, config: &NetworkConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
        let did = config.builder_did();
        let mut stores = self.stores.write().await;
        if !stores.contains_key(&did) && stores.len() >= self.max_builders {
            warn!(max_builders = self.max_builders, "in-memory builder limit reached");
            return Err(StoreError::Rejected {
                reason: format!("in-memory store holds at most {} builders", self.max_builders),
            });
        }
        let store = stores.entry(did).or_default().clone();
        Ok(Arc::new(store))
    }
}
