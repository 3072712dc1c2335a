//! OpenAPI schema objects.
//!
//! The mapping keeps only what OpenAPI can express about a schema: types,
//! nesting and required keys. Titles, descriptions and defaults stay in the
//! other documentation formats.

use serde_json::{json, Map, Value};

use crate::error::json_type_name;
use crate::schema::{ObjectShape, PrimitiveType, Schema, SchemaKind};

/// Conversion into an OpenAPI 3.0 schema object.
pub trait ToOpenApiSchema {
    fn to_open_api_schema(&self) -> Value;
}

/// Maps string primitives to their OpenAPI `format`.
pub fn primitive_format(primitive: PrimitiveType) -> Option<&'static str> {
    match primitive {
        PrimitiveType::Email => Some("email"),
        PrimitiveType::Uuidv4 => Some("uuid"),
        PrimitiveType::Base64 => Some("byte"),
        _ => None,
    }
}

impl ToOpenApiSchema for Schema {
    fn to_open_api_schema(&self) -> Value {
        match self.kind() {
            SchemaKind::Object(ObjectShape::Keys(keys)) => {
                let properties: Map<String, Value> = keys
                    .iter()
                    .map(|(key, schema)| (key.clone(), schema.to_open_api_schema()))
                    .collect();
                let required: Vec<&String> = keys
                    .iter()
                    .filter(|(_, schema)| !schema.may_be_absent())
                    .map(|(key, _)| key)
                    .collect();
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                })
            }
            SchemaKind::Object(ObjectShape::Values(_)) => json!({
                "type": "object",
                "properties": {},
            }),
            SchemaKind::Array(items) => json!({
                "type": "array",
                "items": items.to_open_api_schema(),
            }),
            SchemaKind::OneOf(alternatives) => json!({
                "oneOf": alternatives
                    .iter()
                    .map(ToOpenApiSchema::to_open_api_schema)
                    .collect::<Vec<_>>(),
            }),
            SchemaKind::Value(literal) => match literal {
                Value::Null => json!({ "nullable": true }),
                Value::Number(n) if n.is_f64() => json!({ "type": "number" }),
                Value::Number(_) => json!({ "type": "integer" }),
                other => json!({ "type": json_type_name(other) }),
            },
            SchemaKind::Primitive(primitive) => match primitive.open_api_type() {
                Some(kind) => {
                    let mut schema = Map::new();
                    schema.insert("type".into(), kind.into());
                    if let Some(format) = primitive_format(*primitive) {
                        schema.insert("format".into(), format.into());
                    }
                    Value::Object(schema)
                }
                None if *primitive == PrimitiveType::Null => json!({ "nullable": true }),
                None => json!({}),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        any, array, boolean, email, float, int, null, obj, obj_values, one_of, string, value,
    };

    #[test]
    fn test_object_required_keys() {
        let schema = obj([
            ("name", string().default("no name")),
            ("age", int()),
            ("nick", string().optional()),
        ]);
        assert_eq!(
            schema.to_open_api_schema(),
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "age": { "type": "integer" },
                    "nick": { "type": "string" }
                },
                "required": ["age"]
            })
        );
    }

    #[test]
    fn test_required_always_present() {
        let schema = obj([("a", boolean().optional())]);
        assert_eq!(schema.to_open_api_schema()["required"], json!([]));
    }

    #[test]
    fn test_values_object() {
        assert_eq!(
            obj_values(int()).to_open_api_schema(),
            json!({ "type": "object", "properties": {} })
        );
    }

    #[test]
    fn test_array_and_one_of() {
        let schema = array(one_of(vec![value("a"), float()]));
        assert_eq!(
            schema.to_open_api_schema(),
            json!({
                "type": "array",
                "items": { "oneOf": [{ "type": "string" }, { "type": "number" }] }
            })
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(value(3).to_open_api_schema(), json!({ "type": "integer" }));
        assert_eq!(value(true).to_open_api_schema(), json!({ "type": "boolean" }));
        assert_eq!(value(Value::Null).to_open_api_schema(), json!({ "nullable": true }));
    }

    #[test]
    fn test_primitives() {
        assert_eq!(email().to_open_api_schema(), json!({ "type": "string", "format": "email" }));
        assert_eq!(any().to_open_api_schema(), json!({}));
        assert_eq!(null().to_open_api_schema(), json!({ "nullable": true }));
    }
}
