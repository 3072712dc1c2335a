//! Schema descriptors.
//!
//! A [`Schema`] describes the shape of a JSON value. The set of shapes is
//! closed: objects with declared keys, objects with free-form keys, arrays,
//! `oneOf` alternatives, literal values, and primitives tagged with a type.
//! Every schema also carries documentation metadata and, when used as an
//! object key, whether it is optional and what its default is.
//!
//! # Example
//!
//! ```rust
//! use apiprep::schema::{array, int, obj, string};
//! use serde_json::json;
//!
//! let schema = obj([
//!     ("name", string().default(json!("no name")).description("A name")),
//!     ("ids", array(int().semantic("id"))),
//! ]);
//!
//! assert!(schema.check(&json!({ "ids": [1, 2] })));
//! assert!(!schema.check(&json!({ "ids": ["1"] })));
//! ```

mod builders;
mod check;
mod descriptor;
mod primitive;

pub use builders::{
    any, array, base64, boolean, email, float, hex, int, null, obj, obj_empty, obj_values, one_of,
    string, uuidv4, value,
};
pub(crate) use check::conform_fields;
pub use descriptor::{Describe, DescriptorError};
pub use primitive::PrimitiveType;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

/// Default value of an object key.
#[derive(Clone)]
pub enum DefaultValue {
    /// A literal, cloned into every request that lacks the key.
    Value(Value),
    /// Evaluated every time the key is absent.
    Fn(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produces the value to insert.
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Fn(f) => f(),
        }
    }

    /// The literal, if this default is representable as plain data.
    pub fn literal(&self) -> Option<&Value> {
        match self {
            DefaultValue::Value(v) => Some(v),
            DefaultValue::Fn(_) => None,
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefaultValue::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

/// How an object schema constrains its keys.
#[derive(Debug, Clone)]
pub enum ObjectShape {
    /// A fixed set of keys, each with its own schema. Order is declaration order.
    Keys(IndexMap<String, Schema>),
    /// Arbitrary keys, all values checked against one schema.
    Values(Box<Schema>),
}

/// The structural part of a schema.
#[derive(Debug, Clone)]
pub enum SchemaKind {
    Object(ObjectShape),
    Array(Box<Schema>),
    OneOf(Vec<Schema>),
    /// A literal that must match exactly.
    Value(Value),
    Primitive(PrimitiveType),
}

/// Documentation and key-level metadata.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub semantic: Option<String>,
    pub optional: bool,
    pub default: Option<DefaultValue>,
}

/// A schema descriptor.
///
/// Schemas are built with the functions in this module ([`obj`], [`int`],
/// [`one_of`], ...) and refined with the chained setters below.
#[derive(Debug, Clone)]
pub struct Schema {
    kind: SchemaKind,
    meta: Meta,
}

impl Schema {
    pub(crate) fn from_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            meta: Meta::default(),
        }
    }

    /// Marks the schema as optional when used as an object key.
    pub fn optional(mut self) -> Self {
        self.meta.optional = true;
        self
    }

    /// Sets a literal default used when the key is absent.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.meta.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Sets a default computed on every request that lacks the key.
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.meta.default = Some(DefaultValue::Fn(Arc::new(f)));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    /// Tags the schema with a meaning such as `id`, `password` or `time`.
    pub fn semantic(mut self, semantic: impl Into<String>) -> Self {
        self.meta.semantic = Some(semantic.into());
        self
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn is_optional(&self) -> bool {
        self.meta.optional
    }

    pub fn has_default(&self) -> bool {
        self.meta.default.is_some()
    }

    /// True if a key with this schema may be left out of an object.
    pub fn may_be_absent(&self) -> bool {
        self.meta.optional || self.meta.default.is_some()
    }

    /// The declared keys if this is an object schema with keys.
    pub fn keys(&self) -> Option<&IndexMap<String, Schema>> {
        match &self.kind {
            SchemaKind::Object(ObjectShape::Keys(keys)) => Some(keys),
            _ => None,
        }
    }

    /// The type tag without considering `semantic`.
    pub fn type_tag(&self) -> &'static str {
        match &self.kind {
            SchemaKind::Object(_) => "object",
            SchemaKind::Array(_) => "array",
            SchemaKind::OneOf(_) => "oneOf",
            SchemaKind::Value(_) => "value",
            SchemaKind::Primitive(p) => p.tag(),
        }
    }

    /// The name used in mismatch messages: the semantic tag if set, else the type tag.
    ///
    /// ```rust
    /// use apiprep::schema::int;
    ///
    /// assert_eq!(int().type_name(), "int");
    /// assert_eq!(int().semantic("id").type_name(), "id");
    /// ```
    pub fn type_name(&self) -> &str {
        self.meta.semantic.as_deref().unwrap_or_else(|| self.type_tag())
    }
}
