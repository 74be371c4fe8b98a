//! Record store abstraction for `sharedesk`.
//!
//! This crate defines the [`RecordStore`] trait: the collection and record
//! operations of a secret-sharing document store, consumed as opaque remote
//! calls. It knows nothing about JSON Schema or form state; the schema
//! walker in `sharedesk-core` prepares every record before it reaches this
//! layer.
//!
//! Two pieces ship with the trait:
//!
//! - [`StoreConnector`]: opens a store for an explicit [`NetworkConfig`]
//!   and performs the builder registration handshake
//! - [`MemoryStore`] / [`MemoryConnector`]: in-memory backend, for
//!   development and tests

mod error;
mod memory;
mod network;
mod types;

use std::sync::Arc;

pub use error::StoreError;
pub use memory::{DEFAULT_MAX_BUILDERS, MemoryConnector, MemoryStore};
pub use network::{NetworkConfig, NetworkPreset};
pub use types::{
    BuilderProfile, CollectionDefinition, CollectionMetadata, CollectionSummary, CollectionType,
    Filter, Registration, matches_filter,
};

/// Wire key wrapping a value the client submits for secret sharing.
pub const ALLOT_KEY: &str = "%allot";

/// Wire key wrapping a secret-shared value as held by the storage nodes.
pub const SHARE_KEY: &str = "%share";

/// Name of the record identifier field present in every collection.
pub const ID_FIELD: &str = "_id";

/// The collection/record operations of the document store.
///
/// Records are JSON objects carrying a string `_id`. Encrypted fields arrive
/// wrapped as `{"%allot": value}`; a store may hand them back wrapped as
/// `{"%share": value}`.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// List every collection owned by the builder.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the store cannot be reached.
    async fn list_collections(&self) -> Result<Vec<CollectionSummary>, StoreError>;

    /// Create a collection from its definition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the id is already taken.
    async fn create_collection(&self, definition: CollectionDefinition) -> Result<(), StoreError>;

    /// Delete a collection and all of its records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the collection does not exist.
    async fn delete_collection(&self, id: &str) -> Result<(), StoreError>;

    /// Read collection metadata (record count, size, last write, schema).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the collection does not exist.
    async fn read_collection(&self, id: &str) -> Result<CollectionMetadata, StoreError>;

    /// Find records matching `filter`, returning at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the collection does not exist.
    async fn find_records(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<serde_json::Value>, StoreError>;

    /// Insert records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Rejected`] for records without a string `_id`
    /// and [`StoreError::Duplicate`] when an `_id` already exists.
    async fn create_records(
        &self,
        collection: &str,
        records: Vec<serde_json::Value>,
    ) -> Result<(), StoreError>;

    /// Apply `update` to every record matching `filter`, returning the
    /// number of records touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unsupported`] when the store cannot update the
    /// given fields in place.
    async fn update_records(
        &self,
        collection: &str,
        filter: &Filter,
        update: serde_json::Value,
    ) -> Result<u64, StoreError>;

    /// Delete every record matching `filter`, returning the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the collection does not exist.
    async fn delete_records(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Read the builder profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the builder is not registered.
    async fn read_profile(&self) -> Result<BuilderProfile, StoreError>;

    /// Register the builder.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the builder is already registered.
    async fn register(&self, registration: Registration) -> Result<(), StoreError>;
}

/// Opens [`RecordStore`]s for a given network configuration.
#[async_trait::async_trait]
pub trait StoreConnector: Send + Sync + 'static {
    /// Open a store without validating or registering.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the store cannot be opened.
    async fn open(&self, config: &NetworkConfig) -> Result<Arc<dyn RecordStore>, StoreError>;

    /// Validate `config`, open a store, and make sure the builder is
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] for an incomplete config, or any
    /// error from opening the store or registering the builder.
    async fn connect(&self, config: &NetworkConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
        config.validate()?;
        let store = self.open(config).await?;
        ensure_registered(store.as_ref(), config).await?;
        Ok(store)
    }
}

/// Display name used when the console registers a builder.
pub const BUILDER_NAME: &str = "Sharedesk Builder";

/// Register the builder unless a profile already exists.
///
/// A concurrent registration that lands between the profile read and the
/// register call surfaces as [`StoreError::Duplicate`] and is treated as
/// success.
///
/// # Errors
///
/// Returns any registration error other than a duplicate.
pub async fn ensure_registered(
    store: &dyn RecordStore,
    config: &NetworkConfig,
) -> Result<(), StoreError> {
    if store.read_profile().await.is_ok() {
        return Ok(());
    }

    let did = config.builder_did();
    match store
        .register(Registration {
            did: did.clone(),
            name: BUILDER_NAME.to_owned(),
        })
        .await
    {
        Ok(()) => {
            tracing::info!(did = %did, "builder registered");
            Ok(())
        }
        Err(StoreError::Duplicate { .. }) => {
            tracing::debug!(did = %did, "builder registered concurrently");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
