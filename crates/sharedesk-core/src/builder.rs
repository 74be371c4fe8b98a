//! Build collection schemas from form-style field definitions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use sharedesk_store::ID_FIELD;

use crate::collection::CollectionSchema;
use crate::error::SchemaValidationError;
use crate::schema::{ArraySchema, NumericBounds, ObjectSchema, SchemaKind, SchemaNode, StringSchema};

/// Kind of a field as picked in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

/// One field of the schema builder form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub is_secret: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coerce: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Element definition for arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDefinition>>,
    /// Child definitions for objects.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<FieldDefinition>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Self::default()
        }
    }

    /// The `_id` field every collection starts with.
    pub fn id_field() -> Self {
        Self {
            required: true,
            description: Some("Unique identifier".to_owned()),
            ..Self::new(ID_FIELD, FieldType::String)
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn secret(mut self) -> Self {
        self.is_secret = true;
        self
    }

    fn has_blank_name(&self) -> bool {
        self.name.trim().is_empty()
            || self.properties.iter().any(Self::has_blank_name)
            || self.items.as_deref().is_some_and(Self::has_blank_name)
    }
}

/// Build the schema node for one field.
///
/// Secret fields become encrypted leaves. A secret object or array is
/// shared as a single string.
pub fn build_property(field: &FieldDefinition) -> SchemaNode {
    let node = if field.is_secret {
        let share = match field.field_type {
            FieldType::Number => SchemaNode::number(NumericBounds::default()),
            FieldType::Integer => SchemaNode::integer(NumericBounds::default()),
            FieldType::Boolean => SchemaNode::boolean(),
            FieldType::String | FieldType::Object | FieldType::Array => SchemaNode::string(),
        };
        SchemaNode::encrypted(share)
    } else {
        let bounds = NumericBounds {
            minimum: field.minimum,
            maximum: field.maximum,
        };
        SchemaNode::new(match field.field_type {
            FieldType::String => SchemaKind::String(StringSchema {
                format: field.format.clone().filter(|f| !f.is_empty()),
                coerce: field.coerce.filter(|c| *c),
            }),
            FieldType::Number => SchemaKind::Number(bounds),
            FieldType::Integer => SchemaKind::Integer(bounds),
            FieldType::Boolean => SchemaKind::Boolean,
            FieldType::Array => SchemaKind::Array(ArraySchema {
                items: field.items.as_deref().map(|f| Box::new(build_property(f))),
                min_items: field.min_items,
                max_items: field.max_items,
            }),
            FieldType::Object => SchemaKind::Object(build_object(&field.properties)),
        })
    };

    match field.description.as_deref().filter(|d| !d.is_empty()) {
        Some(description) => node.with_description(description),
        None => node,
    }
}

fn build_object(fields: &[FieldDefinition]) -> ObjectSchema {
    let mut properties = IndexMap::with_capacity(fields.len());
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), build_property(field));
        if field.required {
            required.push(field.name.clone());
        }
    }
    ObjectSchema { properties, required }
}

/// Build a collection schema from top-level field definitions.
///
/// # Errors
///
/// Returns [`SchemaValidationError::BlankFieldName`] if any field, nested
/// ones included, has a blank name, and the `_id` errors of
/// [`CollectionSchema::new`] if the `_id` field is missing or optional.
pub fn build_collection_schema(fields: &[FieldDefinition]) -> Result<CollectionSchema, SchemaValidationError> {
    if fields.iter().any(FieldDefinition::has_blank_name) {
        return Err(SchemaValidationError::BlankFieldName);
    }
    CollectionSchema::new(build_object(fields))
}
