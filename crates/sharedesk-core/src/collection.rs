//! Collection schemas and record-level helpers.
//!
//! A collection's schema is persisted as a draft-07 document describing an
//! array of record objects:
//!
//! ```json
//! {
//!   "$schema": "http://json-schema.org/draft-07/schema#",
//!   "type": "array",
//!   "items": {"type": "object", "properties": {"_id": {...}, ...}, "required": ["_id", ...]}
//! }
//! ```
//!
//! The record helpers apply the tree walker to each field of a record. The
//! `_id` field is storage bookkeeping and never goes through the walker.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use sharedesk_store::{CollectionType, ID_FIELD};

use crate::error::SchemaValidationError;
use crate::schema::{ObjectSchema, SchemaNode, parse_object};
use crate::walker::{encode_for_wire, extract_plain, generate_named_example, initialize_blank};

/// The `$schema` marker every collection schema must carry.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// A validated collection schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    record: ObjectSchema,
}

/// A collection as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub collection_type: CollectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: CollectionSchema,
    pub created_at: DateTime<Utc>,
}

impl CollectionSchema {
    /// Wrap a record schema, checking it declares a required `_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::MissingIdField`] or
    /// [`SchemaValidationError::IdNotRequired`].
    pub fn new(record: ObjectSchema) -> Result<Self, SchemaValidationError> {
        if !record.properties.contains_key(ID_FIELD) {
            return Err(SchemaValidationError::MissingIdField);
        }
        if !record.required.iter().any(|r| r == ID_FIELD) {
            return Err(SchemaValidationError::IdNotRequired);
        }
        Ok(Self { record })
    }

    /// Validate an uploaded schema document.
    ///
    /// Checks run in a fixed order and the first failure is reported, so
    /// the user fixes one problem at a time.
    ///
    /// # Errors
    ///
    /// Returns the [`SchemaValidationError`] for the first failed check, or
    /// [`SchemaValidationError::Schema`] when a property schema is itself
    /// unsupported.
    pub fn validate_upload(document: &Value) -> Result<Self, SchemaValidationError> {
        if document.get("$schema").and_then(Value::as_str) != Some(DRAFT_07) {
            return Err(SchemaValidationError::MissingSchemaMarker { expected: DRAFT_07 });
        }
        if document.get("type").and_then(Value::as_str) != Some("array") {
            return Err(SchemaValidationError::NotAnArray);
        }
        let Some(items) = document.get("items").filter(|v| !v.is_null()) else {
            return Err(SchemaValidationError::MissingItems);
        };
        let Some(items) = items
            .as_object()
            .filter(|m| m.get("type").and_then(Value::as_str) == Some("object"))
        else {
            return Err(SchemaValidationError::ItemsNotAnObject);
        };
        let Some(properties) = items.get("properties").filter(|v| !v.is_null()) else {
            return Err(SchemaValidationError::MissingProperties);
        };
        if properties.get(ID_FIELD).is_none_or(Value::is_null) {
            return Err(SchemaValidationError::MissingIdField);
        }
        let id_required = items
            .get("required")
            .and_then(Value::as_array)
            .is_some_and(|r| r.iter().any(|n| n.as_str() == Some(ID_FIELD)));
        if !id_required {
            return Err(SchemaValidationError::IdNotRequired);
        }

        Self::new(parse_object(items, "#/items")?)
    }

    /// The record object schema, `_id` included.
    pub fn record(&self) -> &ObjectSchema {
        &self.record
    }

    /// Record fields other than `_id`, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.record
            .properties
            .iter()
            .filter(|(name, _)| name.as_str() != ID_FIELD)
            .map(|(name, node)| (name.as_str(), node))
    }

    /// Serialize back to the persisted draft-07 document.
    pub fn to_value(&self) -> Value {
        let items = SchemaNode::object(self.record.clone()).to_value();
        let mut out = Map::new();
        out.insert("$schema".to_owned(), Value::from(DRAFT_07));
        out.insert("type".to_owned(), Value::from("array"));
        out.insert("items".to_owned(), items);
        Value::Object(out)
    }

    /// A blank form value for a new record.
    pub fn blank_record(&self) -> Value {
        Value::Object(
            self.fields()
                .map(|(name, node)| (name.to_owned(), initialize_blank(node)))
                .collect(),
        )
    }

    /// The editable plain form of a stored record.
    pub fn extract_record(&self, stored: &Value) -> Value {
        Value::Object(
            self.fields()
                .map(|(name, node)| {
                    let value = stored.get(name).unwrap_or(&Value::Null);
                    (name.to_owned(), extract_plain(node, value))
                })
                .collect(),
        )
    }

    /// The storage encoding of a plain record.
    ///
    /// Only fields present in `plain` are encoded; an `_id` is carried over
    /// unchanged.
    pub fn encode_record(&self, plain: &Value) -> Value {
        let mut out = Map::new();
        if let Some(id) = plain.get(ID_FIELD) {
            out.insert(ID_FIELD.to_owned(), id.clone());
        }
        for (name, node) in self.fields() {
            if let Some(value) = plain.get(name) {
                out.insert(name.to_owned(), encode_for_wire(node, value));
            }
        }
        Value::Object(out)
    }

    /// A sample record, ready to be stored once it gets an `_id`.
    pub fn example_record(&self) -> Value {
        Value::Object(
            self.fields()
                .map(|(name, node)| (name.to_owned(), generate_named_example(node, name)))
                .collect(),
        )
    }
}

impl FromStr for CollectionSchema {
    type Err = SchemaValidationError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let document: Value = serde_json::from_str(text).map_err(|e| SchemaValidationError::InvalidJson {
            reason: e.to_string(),
        })?;
        Self::validate_upload(&document)
    }
}

impl Serialize for CollectionSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CollectionSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::validate_upload(&value).map_err(serde::de::Error::custom)
    }
}
