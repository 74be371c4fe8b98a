//! Collection and record services.
//!
//! Thin orchestration over a [`RecordStore`]: request validation, id
//! assignment, and the update fallback for records holding encrypted
//! fields. Both services are cheap to clone and hold no state of their own.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use sharedesk_store::{
    ALLOT_KEY, CollectionDefinition, CollectionMetadata, CollectionSummary, CollectionType, Filter, ID_FIELD,
    RecordStore, SHARE_KEY, StoreError,
};

use crate::collection::{Collection, CollectionSchema};
use crate::error::RecordError;

/// Form-submitted marker for a value that must be secret-shared:
/// `{"isSecret": true, "value": ...}`.
const SECRET_MARKER: &str = "isSecret";

/// Collection lifecycle operations.
#[derive(Clone)]
pub struct CollectionService {
    store: Arc<dyn RecordStore>,
}

/// Metadata of one collection plus its listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionDetails {
    pub metadata: CollectionMetadata,
    /// `None` when the collection is missing from the listing.
    pub summary: Option<CollectionSummary>,
}

impl CollectionDetails {
    /// Parse the stored schema document.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Schema`] if the stored document is not a
    /// valid collection schema.
    pub fn schema(&self) -> Result<CollectionSchema, RecordError> {
        Ok(CollectionSchema::validate_upload(&self.metadata.schema)?)
    }
}

impl CollectionService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`RecordError::Store`] if the listing fails.
    pub async fn list(&self) -> Result<Vec<CollectionSummary>, RecordError> {
        Ok(self.store.list_collections().await?)
    }

    /// Create a collection under a fresh UUID.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidRequest`] for a blank name,
    /// [`RecordError::Schema`] if `schema` fails upload validation, or
    /// [`RecordError::Store`] if the store refuses the collection.
    pub async fn create(
        &self,
        name: &str,
        collection_type: CollectionType,
        description: Option<String>,
        schema: &Value,
    ) -> Result<Collection, RecordError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RecordError::invalid("collection name must not be empty"));
        }
        let schema = CollectionSchema::validate_upload(schema)?;
        let id = Uuid::new_v4().to_string();

        self.store
            .create_collection(CollectionDefinition {
                id: id.clone(),
                collection_type,
                name: name.to_owned(),
                schema: schema.to_value(),
            })
            .await?;

        info!(collection = %id, name, "collection created");
        Ok(Collection {
            id,
            name: name.to_owned(),
            collection_type,
            description,
            schema,
            created_at: Utc::now(),
        })
    }

    /// Read a collection's metadata and its listing entry.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Store`] with [`StoreError::NotFound`] if the
    /// collection does not exist.
    pub async fn get(&self, id: &str) -> Result<CollectionDetails, RecordError> {
        let metadata = self.store.read_collection(id).await?;
        let summary = self
            .store
            .list_collections()
            .await?
            .into_iter()
            .find(|c| c.id == id);
        Ok(CollectionDetails { metadata, summary })
    }

    /// # Errors
    ///
    /// Returns [`RecordError::Store`] if the collection does not exist.
    pub async fn delete(&self, id: &str) -> Result<(), RecordError> {
        self.store.delete_collection(id).await?;
        info!(collection = %id, "collection deleted");
        Ok(())
    }
}

/// Record operations within one store.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
}

/// How an update was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum UpdateOutcome {
    /// The store updated matching records in place.
    InPlace { matched: u64 },
    /// The record was deleted and recreated under its old `_id`.
    Replaced { id: String },
}

/// Turn `{"isSecret": true, "value": v}` fields into `{"%allot": v}`.
fn wrap_secret_markers(record: &mut Map<String, Value>) {
    for value in record.values_mut() {
        let Some(field) = value.as_object_mut() else {
            continue;
        };
        if field.get(SECRET_MARKER).and_then(Value::as_bool) != Some(true) {
            continue;
        }
        let inner = field.remove("value").unwrap_or(Value::Null);
        let mut wrapper = Map::new();
        wrapper.insert(ALLOT_KEY.to_owned(), inner);
        *value = Value::Object(wrapper);
    }
}

/// Turn stored `{"%share": v}` wrappers back into submittable `{"%allot": v}`.
fn reallot(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if map.len() == 1 {
                if let Some(inner) = map.remove(SHARE_KEY) {
                    let mut wrapper = Map::new();
                    wrapper.insert(ALLOT_KEY.to_owned(), inner);
                    return Value::Object(wrapper);
                }
            }
            Value::Object(map.into_iter().map(|(k, v)| (k, reallot(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(reallot).collect()),
        other => other,
    }
}

fn has_id(record: &Map<String, Value>) -> bool {
    record
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty())
}

/// The fields an update sets, from either `{"$set": {...}}` or a plain object.
fn update_fields(update: &Value) -> Option<&Map<String, Value>> {
    let fields = update.as_object()?;
    match fields.get("$set") {
        Some(set) => set.as_object(),
        None => Some(fields),
    }
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`RecordError::Store`] if the collection does not exist.
    pub async fn list(&self, collection: &str, filter: &Filter, limit: Option<usize>) -> Result<Vec<Value>, RecordError> {
        let records = self.store.find_records(collection, filter, limit).await?;
        debug!(collection, count = records.len(), "records listed");
        Ok(records)
    }

    /// Insert records, assigning a UUID `_id` to any record without one.
    ///
    /// Returns the records as sent to the store.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidRequest`] if `records` is empty or
    /// holds a non-object, or [`RecordError::Store`] if the insert fails.
    pub async fn add(&self, collection: &str, records: Vec<Value>) -> Result<Vec<Value>, RecordError> {
        if records.is_empty() {
            return Err(RecordError::invalid("no records to add"));
        }

        let mut prepared = Vec::with_capacity(records.len());
        for record in records {
            let Value::Object(mut record) = record else {
                return Err(RecordError::invalid("records must be JSON objects"));
            };
            if !has_id(&record) {
                record.insert(ID_FIELD.to_owned(), Value::from(Uuid::new_v4().to_string()));
            }
            wrap_secret_markers(&mut record);
            prepared.push(Value::Object(record));
        }

        self.store.create_records(collection, prepared.clone()).await?;
        info!(collection, count = prepared.len(), "records added");
        Ok(prepared)
    }

    /// Update the records matching `filter`.
    ///
    /// The store is asked to update in place first. When it reports the
    /// update as unsupported (in-place updates of encrypted fields are not
    /// possible), the record named by the filter's `_id` is deleted and
    /// recreated with `update` applied over its current fields.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidRequest`] for an empty filter or a
    /// non-object update, [`RecordError::Store`] if the in-place update
    /// fails for another reason, and [`RecordError::UpdateFailed`] if the
    /// fallback fails too.
    pub async fn update(&self, collection: &str, filter: &Filter, update: &Value) -> Result<UpdateOutcome, RecordError> {
        if filter.is_empty() {
            return Err(RecordError::invalid("missing filter"));
        }
        let Some(mut fields) = update_fields(update).cloned() else {
            return Err(RecordError::invalid("update must be a JSON object"));
        };
        fields.retain(|key, _| key != ID_FIELD);
        wrap_secret_markers(&mut fields);

        let mut set = Map::new();
        set.insert("$set".to_owned(), Value::Object(fields.clone()));

        match self.store.update_records(collection, filter, Value::Object(set)).await {
            Ok(matched) => {
                info!(collection, matched, "records updated in place");
                Ok(UpdateOutcome::InPlace { matched })
            }
            Err(err @ StoreError::Unsupported { .. }) => {
                debug!(collection, error = %err, "in-place update unsupported, replacing record");
                self.replace(collection, filter, fields)
                    .await
                    .map_err(|fallback| RecordError::UpdateFailed {
                        collection: collection.to_owned(),
                        update: err,
                        fallback,
                    })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete and recreate the record named by the filter's `_id`, with
    /// `fields` laid over its current contents. If the recreate fails the
    /// deleted records are put back.
    async fn replace(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> Result<UpdateOutcome, StoreError> {
        let Some(id) = filter.get(ID_FIELD).and_then(Value::as_str).map(str::to_owned) else {
            return Err(StoreError::Rejected {
                reason: "replacing a record requires an _id filter".to_owned(),
            });
        };

        let current: Vec<Value> = self
            .store
            .find_records(collection, filter, None)
            .await?
            .into_iter()
            .map(reallot)
            .collect();
        let Some(Value::Object(base)) = current.first() else {
            return Err(StoreError::NotFound { what: "record", id });
        };

        let mut merged = base.clone();
        merged.extend(fields);
        merged.insert(ID_FIELD.to_owned(), Value::from(id.clone()));

        let removed = self.store.delete_records(collection, filter).await?;
        if let Err(err) = self.store.create_records(collection, vec![Value::Object(merged)]).await {
            match self.store.create_records(collection, current).await {
                Ok(()) => warn!(collection, record = %id, error = %err, "recreate failed, original restored"),
                Err(restore) => error!(
                    collection,
                    record = %id,
                    removed,
                    error = %err,
                    restore_error = %restore,
                    "recreate failed and original could not be restored"
                ),
            }
            return Err(err);
        }

        info!(collection, record = %id, "record replaced");
        Ok(UpdateOutcome::Replaced { id })
    }

    /// Delete the records matching `filter`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidRequest`] for an empty filter, or
    /// [`RecordError::Store`] if the delete fails.
    pub async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, RecordError> {
        if filter.is_empty() {
            return Err(RecordError::invalid("missing filter"));
        }
        let removed = self.store.delete_records(collection, filter).await?;
        info!(collection, removed, "records deleted");
        Ok(removed)
    }
}
