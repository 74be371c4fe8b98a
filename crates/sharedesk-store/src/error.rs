//! Record store error types.
//!
//! Every error variant carries enough context to diagnose the problem
//! without a debugger. Errors never include API keys, only collection ids,
//! record ids, or operation descriptions.

/// Errors that can occur while talking to a record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The collection, record, or profile does not exist.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// A collection, record, or registration with the same id already exists.
    #[error("duplicate key: {what} '{id}' already exists")]
    Duplicate { what: &'static str, id: String },

    /// The store cannot perform this operation on the given data (for
    /// example an in-place update of an encrypted field).
    #[error("unsupported operation on collection '{collection}': {reason}")]
    Unsupported { collection: String, reason: String },

    /// The network configuration is missing required values.
    #[error("invalid network configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The store rejected the request payload.
    #[error("request rejected: {reason}")]
    Rejected { reason: String },

    /// The backend failed for reasons outside the caller's control.
    #[error("store backend failure: {reason}")]
    Backend { reason: String },
}

impl StoreError {
    /// Shorthand for a missing collection.
    pub fn collection_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            what: "collection",
            id: id.into(),
        }
    }
}
