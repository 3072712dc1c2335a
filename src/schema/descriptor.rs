//! Plain-data descriptors.
//!
//! Schemas serialize to a small JSON dialect that documentation consumers
//! read back:
//!
//! ```json
//! { "type": "object", "keys": { "id": { "type": "int", "semantic": "id" } } }
//! ```
//!
//! Literals are the exception and are written as `{ "value": ... }`.
//! Defaults computed by a function have no plain-data form and are left out.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{DefaultValue, Meta, ObjectShape, PrimitiveType, Schema, SchemaKind};

const DESCRIPTOR_KEYS: [&str; 11] = [
    "type",
    "keys",
    "values",
    "items",
    "alternatives",
    "value",
    "semantic",
    "optional",
    "default",
    "title",
    "description",
];

/// Types that have a plain-data descriptor.
pub trait Describe {
    fn to_descriptor(&self) -> Value;
}

/// A descriptor could not be turned back into a schema.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("descriptor must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("descriptor has neither \"type\" nor \"value\"")]
    MissingType,

    #[error("unknown schema type \"{0}\"")]
    UnknownType(String),

    #[error("unknown descriptor key \"{0}\"")]
    UnknownKey(String),

    #[error("\"{field}\" is malformed in a descriptor of type {type_tag}")]
    Malformed {
        type_tag: String,
        field: &'static str,
    },
}

impl Describe for Schema {
    fn to_descriptor(&self) -> Value {
        let mut out = Map::new();
        // literals are written as a bare `{"value": ...}`
        if !matches!(self.kind, SchemaKind::Value(_)) {
            out.insert("type".into(), Value::String(self.type_tag().into()));
        }

        match &self.kind {
            SchemaKind::Object(ObjectShape::Keys(keys)) => {
                let keys = keys
                    .iter()
                    .map(|(k, s)| (k.clone(), s.to_descriptor()))
                    .collect();
                out.insert("keys".into(), Value::Object(keys));
            }
            SchemaKind::Object(ObjectShape::Values(values)) => {
                out.insert("values".into(), values.to_descriptor());
            }
            SchemaKind::Array(items) => {
                out.insert("items".into(), items.to_descriptor());
            }
            SchemaKind::OneOf(alternatives) => {
                out.insert(
                    "alternatives".into(),
                    Value::Array(alternatives.iter().map(Describe::to_descriptor).collect()),
                );
            }
            SchemaKind::Value(literal) => {
                out.insert("value".into(), literal.clone());
            }
            SchemaKind::Primitive(_) => {}
        }

        let meta = &self.meta;
        if let Some(semantic) = &meta.semantic {
            out.insert("semantic".into(), Value::String(semantic.clone()));
        }
        if meta.optional {
            out.insert("optional".into(), Value::Bool(true));
        }
        if let Some(default) = meta.default.as_ref().and_then(DefaultValue::literal) {
            out.insert("default".into(), default.clone());
        }
        if let Some(title) = &meta.title {
            out.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(description) = &meta.description {
            out.insert("description".into(), Value::String(description.clone()));
        }
        Value::Object(out)
    }
}

impl Schema {
    /// Rebuilds a schema from its descriptor.
    ///
    /// ```rust
    /// use apiprep::schema::{int, obj, Describe, Schema};
    ///
    /// let schema = obj([("id", int().semantic("id"))]);
    /// let back = Schema::from_descriptor(&schema.to_descriptor()).unwrap();
    /// assert_eq!(back.to_descriptor(), schema.to_descriptor());
    /// ```
    pub fn from_descriptor(descriptor: &Value) -> Result<Schema, DescriptorError> {
        let map = descriptor
            .as_object()
            .ok_or_else(|| DescriptorError::NotAnObject(descriptor.to_string()))?;
        let tag = match map.get("type") {
            Some(Value::String(tag)) => tag.as_str(),
            None if map.contains_key("value") => "value",
            None => return Err(DescriptorError::MissingType),
            Some(other) => return Err(DescriptorError::UnknownType(other.to_string())),
        };
        if let Some(key) = map.keys().find(|k| !DESCRIPTOR_KEYS.contains(&k.as_str())) {
            return Err(DescriptorError::UnknownKey(key.clone()));
        }
        let malformed = |field| DescriptorError::Malformed {
            type_tag: tag.to_string(),
            field,
        };

        let kind = match tag {
            "object" => match (map.get("keys"), map.get("values")) {
                (Some(Value::Object(keys)), _) => {
                    let keys = keys
                        .iter()
                        .map(|(k, v)| Ok((k.clone(), Schema::from_descriptor(v)?)))
                        .collect::<Result<IndexMap<_, _>, DescriptorError>>()?;
                    SchemaKind::Object(ObjectShape::Keys(keys))
                }
                (None, Some(values)) => {
                    SchemaKind::Object(ObjectShape::Values(Box::new(Schema::from_descriptor(values)?)))
                }
                (None, None) => SchemaKind::Object(ObjectShape::Keys(IndexMap::new())),
                _ => return Err(malformed("keys")),
            },
            "array" => {
                let items = map.get("items").ok_or_else(|| malformed("items"))?;
                SchemaKind::Array(Box::new(Schema::from_descriptor(items)?))
            }
            "oneOf" => {
                let alternatives = map
                    .get("alternatives")
                    .and_then(Value::as_array)
                    .ok_or_else(|| malformed("alternatives"))?;
                SchemaKind::OneOf(
                    alternatives
                        .iter()
                        .map(Schema::from_descriptor)
                        .collect::<Result<_, _>>()?,
                )
            }
            "value" => SchemaKind::Value(map.get("value").cloned().ok_or_else(|| malformed("value"))?),
            // legacy spelling of an int with semantic `id`
            "id" => SchemaKind::Primitive(PrimitiveType::Int),
            other => SchemaKind::Primitive(
                PrimitiveType::from_tag(other)
                    .ok_or_else(|| DescriptorError::UnknownType(other.to_string()))?,
            ),
        };

        let text = |field: &'static str| match map.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(malformed(field)),
        };
        let optional = match map.get("optional") {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(malformed("optional")),
        };
        let mut semantic = text("semantic")?;
        if tag == "id" && semantic.is_none() {
            semantic = Some("id".to_string());
        }

        Ok(Schema {
            kind,
            meta: Meta {
                title: text("title")?,
                description: text("description")?,
                semantic,
                optional,
                default: map.get("default").cloned().map(DefaultValue::Value),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array, int, obj, obj_values, one_of, string, value};
    use serde_json::json;

    #[test]
    fn test_key_order_and_meta() {
        let schema = string()
            .semantic("password")
            .optional()
            .default("x")
            .title("T")
            .description("D");
        let descriptor = schema.to_descriptor();
        let keys: Vec<_> = descriptor.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["type", "semantic", "optional", "default", "title", "description"]
        );
    }

    #[test]
    fn test_nested_shapes() {
        let schema = obj([
            ("list", array(int())),
            ("map", obj_values(string())),
            ("either", one_of(vec![int(), value("x")])),
        ]);
        assert_eq!(
            schema.to_descriptor(),
            json!({
                "type": "object",
                "keys": {
                    "list": { "type": "array", "items": { "type": "int" } },
                    "map": { "type": "object", "values": { "type": "string" } },
                    "either": {
                        "type": "oneOf",
                        "alternatives": [{ "type": "int" }, { "value": "x" }]
                    }
                }
            })
        );
    }

    #[test]
    fn test_function_default_is_omitted() {
        let schema = int().default_with(|| json!(7));
        assert_eq!(schema.to_descriptor(), json!({ "type": "int" }));
    }

    #[test]
    fn test_from_descriptor_rejects_unknown_type() {
        let err = Schema::from_descriptor(&json!({ "type": "bogus" })).unwrap_err();
        assert_eq!(err, DescriptorError::UnknownType("bogus".into()));
    }

    #[test]
    fn test_from_descriptor_rejects_unknown_key() {
        let err = Schema::from_descriptor(&json!({ "type": "int", "min": 3 })).unwrap_err();
        assert_eq!(err, DescriptorError::UnknownKey("min".into()));
    }

    #[test]
    fn test_from_descriptor_legacy_id_tag() {
        let schema = Schema::from_descriptor(&json!({ "type": "id" })).unwrap();
        assert!(schema.check(&json!(3)));
        assert!(!schema.check(&json!(3.5)));
        assert_eq!(schema.type_name(), "id");
        assert_eq!(
            schema.to_descriptor(),
            json!({ "type": "int", "semantic": "id" })
        );
        assert_eq!(schema.to_descriptor(), int().semantic("id").to_descriptor());
    }

    #[test]
    fn test_from_descriptor_requires_type_or_value() {
        let err = Schema::from_descriptor(&json!({ "optional": true })).unwrap_err();
        assert_eq!(err, DescriptorError::MissingType);
        let err = Schema::from_descriptor(&json!({ "type": 3 })).unwrap_err();
        assert_eq!(err, DescriptorError::UnknownType("3".into()));
    }

    #[test]
    fn test_from_descriptor_rejects_wrongly_typed_meta() {
        let err = Schema::from_descriptor(&json!({ "type": "int", "optional": "yes" })).unwrap_err();
        assert_eq!(
            err,
            DescriptorError::Malformed {
                type_tag: "int".into(),
                field: "optional"
            }
        );
        let err = Schema::from_descriptor(&json!({ "type": "string", "title": 3 })).unwrap_err();
        assert_eq!(
            err,
            DescriptorError::Malformed {
                type_tag: "string".into(),
                field: "title"
            }
        );
        let err = Schema::from_descriptor(&json!({ "value": 1, "semantic": [] })).unwrap_err();
        assert!(matches!(err, DescriptorError::Malformed { field: "semantic", .. }));
    }
}
