//! Error types for `sharedesk-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger: schema errors name the JSON path of the offending node,
//! record errors name the collection.

use sharedesk_store::StoreError;

/// Errors from turning JSON Schema text into a [`SchemaNode`](crate::schema::SchemaNode).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A schema node was not a JSON object.
    #[error("schema node at '{path}' must be an object")]
    NotAnObject { path: String },

    /// The node's `type` is missing or not one of the supported kinds.
    #[error("unsupported schema type at '{path}': {found}")]
    UnsupportedType { path: String, found: String },

    /// A keyword had the wrong shape (e.g. `required` not a string array).
    #[error("malformed schema at '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

/// Errors from validating an uploaded or built collection schema.
///
/// These are user-facing: the message is shown as-is next to the upload
/// form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaValidationError {
    /// The uploaded text is not JSON.
    #[error("invalid JSON: {reason}")]
    InvalidJson { reason: String },

    /// `$schema` is missing or is not the draft-07 marker.
    #[error("schema must have \"$schema\": \"{expected}\"")]
    MissingSchemaMarker { expected: &'static str },

    /// The top-level `type` is not `array`.
    #[error("schema \"type\" must be \"array\"")]
    NotAnArray,

    /// The top-level `items` keyword is absent.
    #[error("schema must have \"items\" property")]
    MissingItems,

    /// `items.type` is not `object`.
    #[error("schema items \"type\" must be \"object\"")]
    ItemsNotAnObject,

    /// `items.properties` is absent.
    #[error("schema items must have \"properties\"")]
    MissingProperties,

    /// `items.properties` has no `_id` field.
    #[error("schema items properties must include \"_id\" field")]
    MissingIdField,

    /// `_id` is not listed in `items.required`.
    #[error("schema items must have \"_id\" in required array")]
    IdNotRequired,

    /// A field built from the form has a blank name.
    #[error("all fields must have a name")]
    BlankFieldName,

    /// A property schema could not be parsed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors from collection and record operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The caller's request is incomplete or inconsistent.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The collection's schema failed validation.
    #[error("invalid collection schema: {0}")]
    Schema(#[from] SchemaValidationError),

    /// The record store returned an error.
    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// Both the in-place update and the delete-then-recreate fallback failed.
    #[error("update of collection '{collection}' failed: {update}; fallback failed: {fallback}")]
    UpdateFailed {
        collection: String,
        update: StoreError,
        fallback: StoreError,
    },
}

impl RecordError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}
