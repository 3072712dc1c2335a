//! Constructors for every schema shape.

use indexmap::IndexMap;
use serde_json::Value;

use super::{ObjectShape, PrimitiveType, Schema, SchemaKind};

/// An object with a fixed, ordered set of keys.
pub fn obj<K, I>(keys: I) -> Schema
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Schema)>,
{
    let keys: IndexMap<String, Schema> = keys.into_iter().map(|(k, s)| (k.into(), s)).collect();
    Schema::from_kind(SchemaKind::Object(ObjectShape::Keys(keys)))
}

/// An object without keys.
pub fn obj_empty() -> Schema {
    Schema::from_kind(SchemaKind::Object(ObjectShape::Keys(IndexMap::new())))
}

/// An object with arbitrary keys whose values all match `values`.
pub fn obj_values(values: Schema) -> Schema {
    Schema::from_kind(SchemaKind::Object(ObjectShape::Values(Box::new(values))))
}

pub fn array(items: Schema) -> Schema {
    Schema::from_kind(SchemaKind::Array(Box::new(items)))
}

/// Matches if any of the alternatives matches.
pub fn one_of(alternatives: Vec<Schema>) -> Schema {
    Schema::from_kind(SchemaKind::OneOf(alternatives))
}

/// Matches exactly the given literal.
pub fn value(literal: impl Into<Value>) -> Schema {
    Schema::from_kind(SchemaKind::Value(literal.into()))
}

fn primitive(p: PrimitiveType) -> Schema {
    Schema::from_kind(SchemaKind::Primitive(p))
}

/// Matches any value.
pub fn any() -> Schema {
    primitive(PrimitiveType::Any)
}

pub fn int() -> Schema {
    primitive(PrimitiveType::Int)
}

pub fn float() -> Schema {
    primitive(PrimitiveType::Float)
}

pub fn boolean() -> Schema {
    primitive(PrimitiveType::Boolean)
}

pub fn string() -> Schema {
    primitive(PrimitiveType::String)
}

pub fn hex() -> Schema {
    primitive(PrimitiveType::Hex)
}

pub fn base64() -> Schema {
    primitive(PrimitiveType::Base64)
}

pub fn email() -> Schema {
    primitive(PrimitiveType::Email)
}

pub fn uuidv4() -> Schema {
    primitive(PrimitiveType::Uuidv4)
}

pub fn null() -> Schema {
    primitive(PrimitiveType::Null)
}
