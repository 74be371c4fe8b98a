//! Core library for `sharedesk`.
//!
//! Contains the JSON Schema model, the schema tree walker that moves values
//! between their plain, editable form and their storage encoding, collection
//! schema validation, the form-driven schema builder, and the collection and
//! record services. This crate depends on `sharedesk-store` for the
//! [`RecordStore`](sharedesk_store::RecordStore) trait and knows nothing
//! about HTTP.

pub mod builder;
pub mod collection;
pub mod error;
pub mod records;
pub mod schema;
pub mod walker;

/// A JSON value tree. Record values, form state, and wire payloads are all
/// `DataNode`s; the schema decides how they are read.
pub type DataNode = serde_json::Value;

pub use builder::{FieldDefinition, FieldType, build_collection_schema, build_property};
pub use collection::{Collection, CollectionSchema, DRAFT_07};
pub use error::{RecordError, SchemaError, SchemaValidationError};
pub use records::{CollectionDetails, CollectionService, RecordService, UpdateOutcome};
pub use schema::{SchemaKind, SchemaNode, is_leaf};
pub use walker::{encode_for_wire, extract_plain, generate_example, generate_named_example, initialize_blank};
