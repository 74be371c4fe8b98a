//! Schema tree walker.
//!
//! A single recursive zip over a [`SchemaNode`] tree and an optional data
//! tree. What happens at each node is decided by a [`Visitor`]; the four
//! public operations are four visitors:
//!
//! | operation            | leaf                     | array                   | object                        |
//! |----------------------|--------------------------|-------------------------|-------------------------------|
//! | [`initialize_blank`] | `""`                     | `[]`                    | every property                |
//! | [`extract_plain`]    | unwrap `%allot`/`%share` | map over elements       | every property, gaps defaulted|
//! | [`encode_for_wire`]  | wrap in `%allot`         | map over elements       | only properties present       |
//! | [`generate_example`] | `%allot` sample          | `n` samples, depth < 3  | every property, depth < 3     |
//!
//! The walker alone decides whether a node is a leaf (via [`is_leaf`]) and
//! never hands a leaf's inner `%share` shape to a visitor.

use serde_json::{Map, Value};
use tracing::warn;

use sharedesk_store::{ALLOT_KEY, SHARE_KEY};

use crate::schema::{ArraySchema, NumericBounds, ObjectSchema, SchemaKind, SchemaNode, is_leaf, number_value};

/// Nesting level at which example generation stops descending.
pub const MAX_EXAMPLE_DEPTH: usize = 3;

/// Upper bound on generated elements per example array, whatever the
/// schema's `minItems`/`maxItems` say.
pub const MAX_EXAMPLE_ITEMS: u64 = 10;

const EXAMPLE_UUID: &str = "550e8400-e29b-41d4-a716-446655440000";
const EXAMPLE_DATE: &str = "2024-01-15";
const EXAMPLE_DATE_TIME: &str = "2024-01-15T10:30:00Z";
const EXAMPLE_NUMBER: f64 = 42.5;
const EXAMPLE_INTEGER: i64 = 42;
const EXAMPLE_MIN_ITEMS: u64 = 2;
const EXAMPLE_DEFAULT_MAX_ITEMS: u64 = 3;

/// Field name used for the root of an unnamed example.
const ROOT_FIELD: &str = "value";

/// Where the walk currently is.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    /// Field name, `parent[i]` for array elements.
    field: String,
    depth: usize,
}

impl Cursor {
    fn root(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            depth: 0,
        }
    }

    fn property(&self, key: &str) -> Self {
        Self {
            field: key.to_owned(),
            depth: self.depth + 1,
        }
    }

    fn element(&self, index: usize) -> Self {
        Self {
            field: format!("{}[{index}]", self.field),
            depth: self.depth + 1,
        }
    }
}

/// What a visitor wants done with a container node.
pub(crate) enum Step<T> {
    /// Recurse into these children.
    Descend(T),
    /// Stop here and use this value.
    Emit(Value),
}

type Elements<'v> = Vec<Option<&'v Value>>;
type Fields<'s, 'v> = Vec<(&'s str, &'s SchemaNode, Option<&'v Value>)>;

/// Per-node rules for one transformation.
pub(crate) trait Visitor {
    /// An encrypted leaf. Only the wrapper is visible, never the leaf schema.
    fn leaf(&self, value: Option<&Value>, at: &Cursor) -> Value;

    /// A `string`, `number`, `integer`, or `boolean` node.
    fn scalar(&self, schema: &SchemaNode, value: Option<&Value>, at: &Cursor) -> Value;

    fn elements<'v>(&self, array: &ArraySchema, value: Option<&'v Value>, at: &Cursor) -> Step<Elements<'v>>;

    fn fields<'s, 'v>(&self, object: &'s ObjectSchema, value: Option<&'v Value>, at: &Cursor) -> Step<Fields<'s, 'v>>;
}

pub(crate) fn walk<V: Visitor>(visitor: &V, schema: &SchemaNode, value: Option<&Value>, at: &Cursor) -> Value {
    if is_leaf(schema) {
        return visitor.leaf(value, at);
    }

    match schema.kind() {
        SchemaKind::Array(array) => match visitor.elements(array, value, at) {
            Step::Emit(out) => out,
            Step::Descend(elements) => {
                let Some(items) = array.items.as_deref() else {
                    return Value::Array(Vec::new());
                };
                Value::Array(
                    elements
                        .into_iter()
                        .enumerate()
                        .map(|(i, element)| walk(visitor, items, element, &at.element(i)))
                        .collect(),
                )
            }
        },
        SchemaKind::Object(object) => match visitor.fields(object, value, at) {
            Step::Emit(out) => out,
            Step::Descend(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, child, child_value)| {
                        (key.to_owned(), walk(visitor, child, child_value, &at.property(key)))
                    })
                    .collect(),
            ),
        },
        _ => visitor.scalar(schema, value, at),
    }
}

/// Default value for a scalar kind: `""`, `0`, or `false`.
fn blank_scalar(schema: &SchemaNode) -> Value {
    match schema.kind() {
        SchemaKind::Number(_) | SchemaKind::Integer(_) => Value::from(0),
        SchemaKind::Boolean => Value::Bool(false),
        _ => Value::from(""),
    }
}

fn all_fields<'s, 'v>(object: &'s ObjectSchema, data: Option<&'v Map<String, Value>>) -> Fields<'s, 'v> {
    object
        .properties
        .iter()
        .map(|(key, child)| (key.as_str(), child, data.and_then(|d| d.get(key))))
        .collect()
}

fn is_plain_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

// ── Blank ────────────────────────────────────────────────────────────

struct Blank;

impl Visitor for Blank {
    fn leaf(&self, _value: Option<&Value>, _at: &Cursor) -> Value {
        Value::from("")
    }

    fn scalar(&self, schema: &SchemaNode, _value: Option<&Value>, _at: &Cursor) -> Value {
        blank_scalar(schema)
    }

    fn elements<'v>(&self, _array: &ArraySchema, _value: Option<&'v Value>, _at: &Cursor) -> Step<Elements<'v>> {
        Step::Emit(Value::Array(Vec::new()))
    }

    fn fields<'s, 'v>(&self, object: &'s ObjectSchema, _value: Option<&'v Value>, _at: &Cursor) -> Step<Fields<'s, 'v>> {
        Step::Descend(all_fields(object, None))
    }
}

// ── Extract ──────────────────────────────────────────────────────────

struct Extract;

impl Visitor for Extract {
    fn leaf(&self, value: Option<&Value>, at: &Cursor) -> Value {
        match value {
            None | Some(Value::Null) => Value::from(""),
            Some(v) if is_plain_scalar(v) => v.clone(),
            Some(Value::Object(wrapper)) => [ALLOT_KEY, SHARE_KEY]
                .iter()
                .find_map(|key| wrapper.get(*key).filter(|v| is_plain_scalar(v)))
                .cloned()
                .unwrap_or_else(|| {
                    warn!(field = %at.field, "encrypted field has no readable %allot/%share value");
                    Value::from("")
                }),
            Some(_) => {
                warn!(field = %at.field, "encrypted field holds a non-scalar value");
                Value::from("")
            }
        }
    }

    fn scalar(&self, schema: &SchemaNode, value: Option<&Value>, _at: &Cursor) -> Value {
        match value {
            Some(v) if !v.is_null() => v.clone(),
            _ => blank_scalar(schema),
        }
    }

    fn elements<'v>(&self, array: &ArraySchema, value: Option<&'v Value>, _at: &Cursor) -> Step<Elements<'v>> {
        match (value, &array.items) {
            (Some(Value::Array(items)), Some(_)) => Step::Descend(items.iter().map(Some).collect()),
            _ => Step::Emit(Value::Array(Vec::new())),
        }
    }

    fn fields<'s, 'v>(&self, object: &'s ObjectSchema, value: Option<&'v Value>, _at: &Cursor) -> Step<Fields<'s, 'v>> {
        Step::Descend(all_fields(object, value.and_then(Value::as_object)))
    }
}

// ── Encode ───────────────────────────────────────────────────────────

struct Encode;

impl Visitor for Encode {
    fn leaf(&self, value: Option<&Value>, _at: &Cursor) -> Value {
        let inner = match value {
            None | Some(Value::Null) => Value::from(""),
            Some(v) => v.clone(),
        };
        let mut wrapper = Map::new();
        wrapper.insert(ALLOT_KEY.to_owned(), inner);
        Value::Object(wrapper)
    }

    fn scalar(&self, _schema: &SchemaNode, value: Option<&Value>, _at: &Cursor) -> Value {
        value.cloned().unwrap_or(Value::Null)
    }

    fn elements<'v>(&self, array: &ArraySchema, value: Option<&'v Value>, _at: &Cursor) -> Step<Elements<'v>> {
        match (value, &array.items) {
            (Some(Value::Array(items)), Some(_)) => Step::Descend(items.iter().map(Some).collect()),
            _ => Step::Emit(value.cloned().unwrap_or(Value::Null)),
        }
    }

    fn fields<'s, 'v>(&self, object: &'s ObjectSchema, value: Option<&'v Value>, _at: &Cursor) -> Step<Fields<'s, 'v>> {
        let Some(data) = value.and_then(Value::as_object) else {
            return Step::Emit(Value::Object(Map::new()));
        };
        Step::Descend(
            object
                .properties
                .iter()
                .filter_map(|(key, child)| data.get(key).map(|v| (key.as_str(), child, Some(v))))
                .collect(),
        )
    }
}

// ── Example ──────────────────────────────────────────────────────────

struct Example;

/// JavaScript-style `Math.round`: halves go toward positive infinity.
fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}

fn example_number(bounds: NumericBounds, step: f64, integral: bool) -> Value {
    let n = match (bounds.minimum, bounds.maximum) {
        (Some(min), Some(max)) => {
            let mid = (min + max) / 2.0;
            if integral { round_half_up(mid) } else { mid }
        }
        (Some(min), None) => min + step,
        (None, Some(max)) => max - step,
        (None, None) if integral => return Value::from(EXAMPLE_INTEGER),
        (None, None) => EXAMPLE_NUMBER,
    };
    number_value(n)
}

fn example_string(format: Option<&str>, field: &str) -> Value {
    let sample = match format {
        Some("uuid") => EXAMPLE_UUID.to_owned(),
        Some("email") => format!("{field}@example.com"),
        Some("uri" | "url") => format!("https://example.com/{field}"),
        Some("date") => EXAMPLE_DATE.to_owned(),
        Some("date-time") => EXAMPLE_DATE_TIME.to_owned(),
        _ => format!("example {field}"),
    };
    Value::from(sample)
}

impl Visitor for Example {
    fn leaf(&self, _value: Option<&Value>, at: &Cursor) -> Value {
        let mut wrapper = Map::new();
        wrapper.insert(
            ALLOT_KEY.to_owned(),
            Value::from(format!("example {} (will be encrypted)", at.field)),
        );
        Value::Object(wrapper)
    }

    fn scalar(&self, schema: &SchemaNode, _value: Option<&Value>, at: &Cursor) -> Value {
        match schema.kind() {
            SchemaKind::String(s) => example_string(s.format.as_deref(), &at.field),
            SchemaKind::Number(bounds) => example_number(*bounds, 10.0, false),
            SchemaKind::Integer(bounds) => example_number(*bounds, 1.0, true),
            SchemaKind::Boolean => Value::Bool(true),
            _ => Value::from(format!("example {}", at.field)),
        }
    }

    fn elements<'v>(&self, array: &ArraySchema, _value: Option<&'v Value>, at: &Cursor) -> Step<Elements<'v>> {
        if array.items.is_none() || at.depth >= MAX_EXAMPLE_DEPTH {
            return Step::Emit(Value::Array(Vec::new()));
        }
        let min = array.min_items.unwrap_or(0);
        let max = array.max_items.unwrap_or(EXAMPLE_DEFAULT_MAX_ITEMS);
        let count = EXAMPLE_MIN_ITEMS.max(min).min(max).min(MAX_EXAMPLE_ITEMS);
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        Step::Descend(vec![None; count])
    }

    fn fields<'s, 'v>(&self, object: &'s ObjectSchema, _value: Option<&'v Value>, at: &Cursor) -> Step<Fields<'s, 'v>> {
        if at.depth >= MAX_EXAMPLE_DEPTH {
            return Step::Emit(Value::Object(Map::new()));
        }
        Step::Descend(all_fields(object, None))
    }
}

// ── Public operations ────────────────────────────────────────────────

/// Build a blank form value for `schema`.
///
/// Encrypted leaves and strings become `""`, numbers `0`, booleans `false`,
/// arrays `[]`. Objects get exactly one entry per declared property.
pub fn initialize_blank(schema: &SchemaNode) -> Value {
    walk(&Blank, schema, None, &Cursor::root(ROOT_FIELD))
}

/// Turn a stored record value into an editable plain value.
///
/// Encrypted leaves are unwrapped from `%allot` or `%share` (in that order of
/// preference); a bare scalar is kept as-is. Anything else degrades to `""`
/// with a warning, so one unreadable field never blocks the rest of the
/// record. Objects always come back with their full property set.
pub fn extract_plain(schema: &SchemaNode, wire: &Value) -> Value {
    walk(&Extract, schema, Some(wire), &Cursor::root(ROOT_FIELD))
}

/// Turn a plain value into its storage encoding.
///
/// Encrypted leaves are wrapped as `{"%allot": value}` (an absent or `null`
/// value becomes `""`, the wrapper is never omitted). Object properties the
/// plain value does not carry are left out rather than invented.
pub fn encode_for_wire(schema: &SchemaNode, plain: &Value) -> Value {
    walk(&Encode, schema, Some(plain), &Cursor::root(ROOT_FIELD))
}

/// Generate a deterministic sample value for `schema`.
pub fn generate_example(schema: &SchemaNode) -> Value {
    generate_named_example(schema, ROOT_FIELD)
}

/// Generate a sample value, using `field` to personalize string samples.
pub fn generate_named_example(schema: &SchemaNode, field: &str) -> Value {
    walk(&Example, schema, None, &Cursor::root(field))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn schema(value: Value) -> SchemaNode {
        SchemaNode::from_value(&value).unwrap()
    }

    fn secret() -> Value {
        json!({"type": "object", "properties": {"%share": {"type": "string"}}, "required": ["%share"]})
    }

    fn person() -> SchemaNode {
        schema(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer", "minimum": 0, "maximum": 120},
                "active": {"type": "boolean"},
                "secret": secret(),
                "tags": {"type": "array", "items": {"type": "string"}},
                "address": {
                    "type": "object",
                    "properties": {
                        "city": {"type": "string"},
                        "pin": secret()
                    }
                },
                "cards": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"number": secret(), "limit": {"type": "number"}}
                    }
                }
            }
        }))
    }

    fn keys(value: &Value) -> Vec<&str> {
        value
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn blank_has_defaults_and_full_key_set() {
        let blank = initialize_blank(&person());
        assert_eq!(
            blank,
            json!({
                "name": "",
                "age": 0,
                "active": false,
                "secret": "",
                "tags": [],
                "address": {"city": "", "pin": ""},
                "cards": []
            })
        );
        assert_eq!(
            keys(&blank),
            vec!["name", "age", "active", "secret", "tags", "address", "cards"]
        );
    }

    #[test]
    fn extract_unwraps_share() {
        let s = schema(json!({
            "type": "object",
            "properties": {"name": {"type": "string"}, "secret": secret()}
        }));
        let wire = json!({"name": "Alice", "secret": {"%share": "xyz"}});
        assert_eq!(extract_plain(&s, &wire), json!({"name": "Alice", "secret": "xyz"}));
    }

    #[test]
    fn extract_prefers_allot_over_share() {
        let s = schema(secret());
        assert_eq!(extract_plain(&s, &json!({"%allot": "a", "%share": "b"})), json!("a"));
        assert_eq!(extract_plain(&s, &json!({"%allot": null, "%share": "b"})), json!("b"));
    }

    #[test]
    fn extract_keeps_bare_scalar_leaf() {
        let s = schema(secret());
        assert_eq!(extract_plain(&s, &json!("plain")), json!("plain"));
        assert_eq!(extract_plain(&s, &json!(7)), json!(7));
    }

    #[test]
    fn extract_malformed_leaf_degrades_to_empty_string() {
        let s = schema(json!({
            "type": "object",
            "properties": {"secret": secret(), "name": {"type": "string"}}
        }));
        let wire = json!({"secret": {"unexpected": 1}, "name": "Bob"});
        assert_eq!(extract_plain(&s, &wire), json!({"secret": "", "name": "Bob"}));
        assert_eq!(extract_plain(&schema(secret()), &json!([1, 2])), json!(""));
    }

    #[test]
    fn extract_fills_missing_keys_with_defaults() {
        let wire = json!({"name": "Alice", "address": {"city": "Oslo"}});
        let plain = extract_plain(&person(), &wire);
        assert_eq!(
            plain,
            json!({
                "name": "Alice",
                "age": 0,
                "active": false,
                "secret": "",
                "tags": [],
                "address": {"city": "Oslo", "pin": ""},
                "cards": []
            })
        );
    }

    #[test]
    fn extract_of_anything_has_full_key_set() {
        let s = person();
        for wire in [json!(null), json!(5), json!("x"), json!([1]), json!({"address": 3})] {
            let plain = extract_plain(&s, &wire);
            assert_eq!(keys(&plain), keys(&initialize_blank(&s)));
            assert_eq!(keys(&plain["address"]), vec!["city", "pin"]);
        }
    }

    #[test]
    fn extract_shape_mismatch_array_is_empty() {
        let s = schema(json!({"type": "array", "items": {"type": "string"}}));
        assert_eq!(extract_plain(&s, &json!({"not": "an array"})), json!([]));
    }

    #[test]
    fn extract_walks_arrays_of_objects() {
        let wire = json!({"cards": [{"number": {"%share": "4111"}, "limit": 500}, {"limit": 10}]});
        let plain = extract_plain(&person(), &wire);
        assert_eq!(
            plain["cards"],
            json!([{"number": "4111", "limit": 500}, {"number": "", "limit": 10}])
        );
    }

    #[test]
    fn encode_wraps_leaves() {
        let s = schema(json!({
            "type": "object",
            "properties": {"name": {"type": "string"}, "secret": secret()}
        }));
        let plain = json!({"name": "Alice", "secret": "xyz"});
        assert_eq!(
            encode_for_wire(&s, &plain),
            json!({"name": "Alice", "secret": {"%allot": "xyz"}})
        );
    }

    #[test]
    fn encode_never_omits_the_wrapper() {
        let s = schema(secret());
        assert_eq!(encode_for_wire(&s, &json!(null)), json!({"%allot": ""}));
        assert_eq!(encode_for_wire(&s, &json!("")), json!({"%allot": ""}));
        assert_eq!(encode_for_wire(&s, &json!(0)), json!({"%allot": 0}));
    }

    #[test]
    fn encode_partial_update_does_not_invent_keys() {
        let s = person();
        let partial = json!({"name": "Alice", "address": {"pin": "1234"}});
        let wire = encode_for_wire(&s, &partial);
        assert_eq!(wire, json!({"name": "Alice", "address": {"pin": {"%allot": "1234"}}}));

        let back = extract_plain(&s, &wire);
        assert_eq!(keys(&back), keys(&initialize_blank(&s)));
        assert_eq!(back["address"], json!({"city": "", "pin": "1234"}));
    }

    #[test]
    fn encode_drops_undeclared_keys() {
        let s = schema(json!({"type": "object", "properties": {"a": {"type": "string"}}}));
        assert_eq!(encode_for_wire(&s, &json!({"a": "1", "b": "2"})), json!({"a": "1"}));
    }

    #[test]
    fn encode_passes_through_mismatched_array() {
        let s = schema(json!({"type": "array", "items": secret()}));
        assert_eq!(encode_for_wire(&s, &json!("oops")), json!("oops"));
        assert_eq!(encode_for_wire(&s, &json!(["a"])), json!([{"%allot": "a"}]));
    }

    #[test]
    fn round_trip_restores_plain_value() {
        let s = person();
        let values = [
            initialize_blank(&s),
            json!({
                "name": "Alice",
                "age": 33,
                "active": true,
                "secret": "hunter2",
                "tags": ["a", "b"],
                "address": {"city": "Oslo", "pin": "0042"},
                "cards": [{"number": "4111", "limit": 12.5}, {"number": "", "limit": 0}]
            }),
        ];
        for plain in values {
            assert_eq!(extract_plain(&s, &encode_for_wire(&s, &plain)), plain);
        }
    }

    #[test]
    fn leaf_with_extra_properties_stays_opaque() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "secret": {
                    "type": "object",
                    "properties": {"%share": {"type": "string"}, "hint": {"type": "string"}},
                    "required": ["%share"]
                }
            }
        }));
        assert_eq!(initialize_blank(&s), json!({"secret": ""}));
        assert_eq!(
            extract_plain(&s, &json!({"secret": {"%share": "x", "hint": "h"}})),
            json!({"secret": "x"})
        );
        assert_eq!(
            encode_for_wire(&s, &json!({"secret": "x"})),
            json!({"secret": {"%allot": "x"}})
        );
        assert_eq!(
            generate_example(&s),
            json!({"secret": {"%allot": "example secret (will be encrypted)"}})
        );
    }

    #[test]
    fn example_scenario() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "age": {"type": "integer", "minimum": 0, "maximum": 120},
                "email": {"type": "string", "format": "email"},
                "secret": secret()
            }
        }));
        assert_eq!(
            generate_example(&s),
            json!({
                "age": 60,
                "email": "email@example.com",
                "secret": {"%allot": "example secret (will be encrypted)"}
            })
        );
    }

    #[test]
    fn example_strings_follow_format() {
        let cases = [
            ("uuid", json!(EXAMPLE_UUID)),
            ("email", json!("f@example.com")),
            ("uri", json!("https://example.com/f")),
            ("url", json!("https://example.com/f")),
            ("date", json!("2024-01-15")),
            ("date-time", json!("2024-01-15T10:30:00Z")),
            ("hostname", json!("example f")),
        ];
        for (format, expected) in cases {
            assert_eq!(
                generate_named_example(&SchemaNode::string_with_format(format), "f"),
                expected,
                "format {format}"
            );
        }
        assert_eq!(generate_named_example(&SchemaNode::string(), "f"), json!("example f"));
    }

    #[test]
    fn example_numbers_follow_bounds() {
        let bounds = |minimum, maximum| NumericBounds { minimum, maximum };
        assert_eq!(generate_example(&SchemaNode::number(bounds(None, None))), json!(42.5));
        assert_eq!(generate_example(&SchemaNode::number(bounds(Some(1.0), Some(2.0)))), json!(1.5));
        assert_eq!(generate_example(&SchemaNode::number(bounds(Some(5.0), None))), json!(15));
        assert_eq!(generate_example(&SchemaNode::number(bounds(None, Some(5.0)))), json!(-5));

        assert_eq!(generate_example(&SchemaNode::integer(bounds(None, None))), json!(42));
        assert_eq!(generate_example(&SchemaNode::integer(bounds(Some(1.0), Some(2.0)))), json!(2));
        assert_eq!(generate_example(&SchemaNode::integer(bounds(Some(-3.0), Some(-2.0)))), json!(-2));
        assert_eq!(generate_example(&SchemaNode::integer(bounds(Some(5.0), None))), json!(6));
        assert_eq!(generate_example(&SchemaNode::integer(bounds(None, Some(5.0)))), json!(4));
        assert_eq!(generate_example(&SchemaNode::boolean()), json!(true));
    }

    #[test]
    fn example_array_length_follows_item_bounds() {
        let array = |min_items, max_items| {
            SchemaNode::array(ArraySchema {
                items: Some(Box::new(SchemaNode::string())),
                min_items,
                max_items,
            })
        };
        let len = |s: &SchemaNode| generate_named_example(s, "t").as_array().map_or(0, Vec::len);
        assert_eq!(len(&array(None, None)), 2);
        assert_eq!(len(&array(Some(3), Some(10))), 3);
        assert_eq!(len(&array(None, Some(1))), 1);
        assert_eq!(len(&array(Some(5), None)), 3);
        assert_eq!(
            generate_named_example(&array(None, None), "tags"),
            json!(["example tags[0]", "example tags[1]"])
        );
        assert_eq!(
            generate_example(&SchemaNode::array(ArraySchema::default())),
            json!([])
        );
    }

    #[test]
    fn example_array_length_is_capped() {
        let wide = |items: SchemaNode| {
            SchemaNode::array(ArraySchema {
                items: Some(Box::new(items)),
                min_items: Some(200),
                max_items: Some(200),
            })
        };
        let nested = wide(wide(wide(SchemaNode::string())));
        let example = generate_example(&nested);

        let outer = example.as_array().unwrap();
        assert_eq!(outer.len(), 10);
        let leaves: usize = outer
            .iter()
            .flat_map(|middle| middle.as_array().unwrap())
            .map(|inner| inner.as_array().unwrap().len())
            .sum();
        assert_eq!(leaves, 1000);
    }

    #[test]
    fn example_stops_at_depth_cap() {
        let s = schema(json!({
            "type": "object",
            "properties": {"l1": {"type": "object", "properties": {
                "l2": {"type": "object", "properties": {
                    "l3": {"type": "object", "properties": {
                        "l4": {"type": "string"}
                    }},
                    "list": {"type": "array", "items": {"type": "string"}}
                }}
            }}}
        }));
        assert_eq!(
            generate_example(&s),
            json!({"l1": {"l2": {"l3": {}, "list": []}}})
        );
    }

    #[test]
    fn example_is_deterministic() {
        let s = person();
        assert_eq!(generate_example(&s), generate_example(&s));
    }

    #[test]
    fn every_operation_treats_built_leaf_the_same() {
        let mut properties = IndexMap::new();
        properties.insert("pin".to_owned(), SchemaNode::encrypted(SchemaNode::integer(NumericBounds::default())));
        let s = SchemaNode::object(ObjectSchema {
            properties,
            required: Vec::new(),
        });
        assert_eq!(initialize_blank(&s), json!({"pin": ""}));
        assert_eq!(extract_plain(&s, &json!({"pin": {"%share": 12}})), json!({"pin": 12}));
        assert_eq!(encode_for_wire(&s, &json!({"pin": 12})), json!({"pin": {"%allot": 12}}));
    }
}
