//! The schema tree: a restricted JSON Schema as a tagged union.
//!
//! Every [`SchemaNode`] is built through [`SchemaNode::new`], which is where
//! an object of the form `{"properties": {"%share": ...}, "required":
//! ["%share"]}` is reclassified into [`SchemaKind::Encrypted`]. Downstream
//! code never has to re-derive that rule; it asks [`is_leaf`].

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use sharedesk_store::SHARE_KEY;

use crate::error::SchemaError;

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    kind: SchemaKind,
    description: Option<String>,
    /// Keywords this model does not interpret, kept for serialization.
    extra: Map<String, Value>,
}

/// The variant of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String(StringSchema),
    Number(NumericBounds),
    Integer(NumericBounds),
    Boolean,
    Object(ObjectSchema),
    Array(ArraySchema),
    /// A secret-shared scalar. Opaque to every tree walk.
    Encrypted(EncryptedLeaf),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringSchema {
    /// `uuid`, `email`, `uri`, `date`, `date-time`, ...
    pub format: Option<String>,
    pub coerce: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericBounds {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    /// Child schemas in declaration order.
    pub properties: IndexMap<String, SchemaNode>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArraySchema {
    pub items: Option<Box<SchemaNode>>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

/// The `%share` marker object, held whole so it serializes back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedLeaf {
    shape: ObjectSchema,
}

impl ObjectSchema {
    /// Whether this object is the `%share` marker shape.
    fn is_share_shape(&self) -> bool {
        self.properties.contains_key(SHARE_KEY) && self.required.iter().any(|r| r == SHARE_KEY)
    }
}

impl EncryptedLeaf {
    /// Build a leaf whose shared value has the given scalar schema.
    pub fn new(share: SchemaNode) -> Self {
        let mut properties = IndexMap::new();
        properties.insert(SHARE_KEY.to_owned(), share);
        Self {
            shape: ObjectSchema {
                properties,
                required: vec![SHARE_KEY.to_owned()],
            },
        }
    }

    /// Reclassify an object as a leaf if it has the `%share` shape.
    ///
    /// # Errors
    ///
    /// Hands the object back unchanged when it is an ordinary object.
    pub fn try_from_object(object: ObjectSchema) -> Result<Self, ObjectSchema> {
        if object.is_share_shape() {
            Ok(Self { shape: object })
        } else {
            Err(object)
        }
    }

    /// Schema of the value being shared (usually a scalar).
    pub fn share_schema(&self) -> Option<&SchemaNode> {
        self.shape.properties.get(SHARE_KEY)
    }
}

/// The shared leaf predicate. True iff the node is an encrypted leaf.
pub fn is_leaf(schema: &SchemaNode) -> bool {
    schema.as_encrypted_leaf().is_some()
}

impl SchemaNode {
    /// Build a node, reclassifying `%share` objects into encrypted leaves.
    pub fn new(kind: SchemaKind) -> Self {
        let kind = match kind {
            SchemaKind::Object(object) => match EncryptedLeaf::try_from_object(object) {
                Ok(leaf) => SchemaKind::Encrypted(leaf),
                Err(object) => SchemaKind::Object(object),
            },
            other => other,
        };
        Self {
            kind,
            description: None,
            extra: Map::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::String(StringSchema::default()))
    }

    pub fn string_with_format(format: impl Into<String>) -> Self {
        Self::new(SchemaKind::String(StringSchema {
            format: Some(format.into()),
            coerce: None,
        }))
    }

    pub fn number(bounds: NumericBounds) -> Self {
        Self::new(SchemaKind::Number(bounds))
    }

    pub fn integer(bounds: NumericBounds) -> Self {
        Self::new(SchemaKind::Integer(bounds))
    }

    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean)
    }

    pub fn object(object: ObjectSchema) -> Self {
        Self::new(SchemaKind::Object(object))
    }

    pub fn array(array: ArraySchema) -> Self {
        Self::new(SchemaKind::Array(array))
    }

    /// An encrypted leaf sharing a value of the given scalar schema.
    pub fn encrypted(share: SchemaNode) -> Self {
        Self::new(SchemaKind::Encrypted(EncryptedLeaf::new(share)))
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn as_encrypted_leaf(&self) -> Option<&EncryptedLeaf> {
        match &self.kind {
            SchemaKind::Encrypted(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// The JSON Schema `type` keyword for this node.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            SchemaKind::String(_) => "string",
            SchemaKind::Number(_) => "number",
            SchemaKind::Integer(_) => "integer",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Object(_) | SchemaKind::Encrypted(_) => "object",
            SchemaKind::Array(_) => "array",
        }
    }

    /// Parse a JSON Schema node.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] naming the JSON path of the first node that is
    /// not an object, has an unsupported `type`, or has a malformed keyword.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        parse_node(value, "#")
    }

    /// Serialize back to JSON Schema.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".to_owned(), Value::from(self.type_name()));
        if let Some(description) = &self.description {
            out.insert("description".to_owned(), Value::from(description.clone()));
        }
        match &self.kind {
            SchemaKind::String(s) => {
                if let Some(format) = &s.format {
                    out.insert("format".to_owned(), Value::from(format.clone()));
                }
                if let Some(coerce) = s.coerce {
                    out.insert("coerce".to_owned(), Value::Bool(coerce));
                }
            }
            SchemaKind::Number(bounds) | SchemaKind::Integer(bounds) => {
                if let Some(min) = bounds.minimum {
                    out.insert("minimum".to_owned(), number_value(min));
                }
                if let Some(max) = bounds.maximum {
                    out.insert("maximum".to_owned(), number_value(max));
                }
            }
            SchemaKind::Boolean => {}
            SchemaKind::Object(object) => write_object(&mut out, object),
            SchemaKind::Encrypted(leaf) => write_object(&mut out, &leaf.shape),
            SchemaKind::Array(array) => {
                if let Some(items) = &array.items {
                    out.insert("items".to_owned(), items.to_value());
                }
                if let Some(min) = array.min_items {
                    out.insert("minItems".to_owned(), Value::from(min));
                }
                if let Some(max) = array.max_items {
                    out.insert("maxItems".to_owned(), Value::from(max));
                }
            }
        }
        for (key, value) in &self.extra {
            out.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(out)
    }
}

/// A JSON number, integral when `n` has no fractional part.
pub(crate) fn number_value(n: f64) -> Value {
    // 2^53: beyond this f64 no longer represents every integer.
    const EXACT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < EXACT {
        #[allow(clippy::cast_possible_truncation)]
        return Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

fn write_object(out: &mut Map<String, Value>, object: &ObjectSchema) {
    let properties = object
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), v.to_value()))
        .collect();
    out.insert("properties".to_owned(), Value::Object(properties));
    if !object.required.is_empty() {
        out.insert(
            "required".to_owned(),
            Value::Array(object.required.iter().cloned().map(Value::from).collect()),
        );
    }
}

const KNOWN_KEYWORDS: [&str; 11] = [
    "type",
    "description",
    "format",
    "coerce",
    "minimum",
    "maximum",
    "properties",
    "required",
    "items",
    "minItems",
    "maxItems",
];

fn malformed(path: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::Malformed {
        path: path.to_owned(),
        reason: reason.into(),
    }
}

fn parse_node(value: &Value, path: &str) -> Result<SchemaNode, SchemaError> {
    let Some(map) = value.as_object() else {
        return Err(SchemaError::NotAnObject {
            path: path.to_owned(),
        });
    };

    let type_name = match map.get("type") {
        Some(Value::String(t)) => t.as_str(),
        Some(other) => {
            return Err(SchemaError::UnsupportedType {
                path: path.to_owned(),
                found: other.to_string(),
            });
        }
        None => {
            return Err(SchemaError::UnsupportedType {
                path: path.to_owned(),
                found: "<missing>".to_owned(),
            });
        }
    };

    let kind = match type_name {
        "string" => SchemaKind::String(StringSchema {
            format: optional_str(map, "format", path)?,
            coerce: optional_bool(map, "coerce", path)?,
        }),
        "number" => SchemaKind::Number(parse_bounds(map, path)?),
        "integer" => SchemaKind::Integer(parse_bounds(map, path)?),
        "boolean" => SchemaKind::Boolean,
        "object" => SchemaKind::Object(parse_object(map, path)?),
        "array" => SchemaKind::Array(ArraySchema {
            items: match map.get("items") {
                Some(items) => Some(Box::new(parse_node(items, &format!("{path}/items"))?)),
                None => None,
            },
            min_items: optional_u64(map, "minItems", path)?,
            max_items: optional_u64(map, "maxItems", path)?,
        }),
        other => {
            return Err(SchemaError::UnsupportedType {
                path: path.to_owned(),
                found: other.to_owned(),
            });
        }
    };

    let mut node = SchemaNode::new(kind);
    node.description = optional_str(map, "description", path)?;
    node.extra = map
        .iter()
        .filter(|(k, _)| !KNOWN_KEYWORDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(node)
}

/// Parse the `properties`/`required` pair of an object node.
pub(crate) fn parse_object(map: &Map<String, Value>, path: &str) -> Result<ObjectSchema, SchemaError> {
    let properties = match map.get("properties") {
        None => IndexMap::new(),
        Some(Value::Object(props)) => props
            .iter()
            .map(|(name, child)| {
                parse_node(child, &format!("{path}/properties/{name}")).map(|n| (name.clone(), n))
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(malformed(path, "\"properties\" must be an object")),
    };

    let required = match map.get("required") {
        None => Vec::new(),
        Some(Value::Array(names)) => names
            .iter()
            .map(|n| {
                n.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| malformed(path, "\"required\" entries must be strings"))
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(malformed(path, "\"required\" must be an array")),
    };

    Ok(ObjectSchema {
        properties,
        required,
    })
}

fn parse_bounds(map: &Map<String, Value>, path: &str) -> Result<NumericBounds, SchemaError> {
    Ok(NumericBounds {
        minimum: optional_f64(map, "minimum", path)?,
        maximum: optional_f64(map, "maximum", path)?,
    })
}

fn optional_str(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>, SchemaError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(malformed(path, format!("\"{key}\" must be a string"))),
    }
}

fn optional_bool(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<bool>, SchemaError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(malformed(path, format!("\"{key}\" must be a boolean"))),
    }
}

fn optional_f64(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<f64>, SchemaError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| malformed(path, format!("\"{key}\" must be a number"))),
    }
}

fn optional_u64(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<u64>, SchemaError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| malformed(path, format!("\"{key}\" must be a non-negative integer"))),
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}
