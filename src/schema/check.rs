//! The recursive checking engine.
//!
//! One tree walk serves three purposes: [`Schema::check`] only wants a yes/no,
//! [`Schema::explain`] wants every mismatch, and [`Schema::conform`] wants the
//! value back with defaults filled in at every depth. Mismatches are
//! accumulated with stillwater's `Validation` instead of stopping at the
//! first one.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use stillwater::Validation;

use crate::error::{CheckError, CheckErrors};
use crate::path::FieldPath;
use crate::ValidationResult;

use super::{ObjectShape, Schema, SchemaKind};

impl Schema {
    /// Returns true if `value` matches the schema.
    ///
    /// ```rust
    /// use apiprep::schema::{int, obj};
    /// use serde_json::json;
    ///
    /// let schema = obj([("a", int()), ("b", int().optional())]);
    /// assert!(schema.check(&json!({ "a": 1 })));
    /// assert!(schema.check(&json!({ "a": 1, "b": null })));
    /// assert!(!schema.check(&json!({ "a": 1, "c": 2 })));
    /// ```
    pub fn check(&self, value: &Value) -> bool {
        self.walk(value, &FieldPath::root()).is_success()
    }

    /// Checks `value` and reports every mismatch.
    pub fn explain(&self, value: &Value, path: &FieldPath) -> ValidationResult<()> {
        self.walk(value, path).map(|_| ())
    }

    /// Checks `value` and returns it with defaults filled in.
    ///
    /// ```rust
    /// use apiprep::FieldPath;
    /// use apiprep::schema::{obj, string};
    /// use serde_json::json;
    ///
    /// let schema = obj([("deep", obj([("name", string().default("anon"))]))]);
    /// let filled = schema
    ///     .conform(&json!({ "deep": {} }), &FieldPath::root())
    ///     .into_result()
    ///     .unwrap();
    /// assert_eq!(filled, json!({ "deep": { "name": "anon" } }));
    /// ```
    pub fn conform(&self, value: &Value, path: &FieldPath) -> ValidationResult<Value> {
        self.walk(value, path)
    }

    fn walk(&self, value: &Value, path: &FieldPath) -> ValidationResult<Value> {
        match &self.kind {
            SchemaKind::Primitive(p) => {
                if p.matches(value) {
                    Validation::Success(value.clone())
                } else {
                    mismatch(self, value, path)
                }
            }
            SchemaKind::Value(literal) => {
                if literal == value {
                    Validation::Success(value.clone())
                } else {
                    Validation::Failure(CheckErrors::single(
                        CheckError::expected(path.clone(), self.type_name(), value)
                            .with_code("value_mismatch")
                            .with_expected(literal.to_string()),
                    ))
                }
            }
            SchemaKind::Array(items) => match value.as_array() {
                Some(elements) => {
                    let results = elements
                        .iter()
                        .enumerate()
                        .map(|(i, element)| items.walk(element, &path.index(i)));
                    collect(results).map(Value::Array)
                }
                None => mismatch(self, value, path),
            },
            SchemaKind::OneOf(alternatives) => {
                // first alternative that matches decides the filled value
                for alternative in alternatives {
                    if let Validation::Success(v) = alternative.walk(value, path) {
                        return Validation::Success(v);
                    }
                }
                Validation::Failure(CheckErrors::single(
                    CheckError::expected(path.clone(), self.type_name(), value).with_code(
                        "one_of_none_matched",
                    ),
                ))
            }
            SchemaKind::Object(shape) => match value.as_object() {
                Some(given) => match shape {
                    ObjectShape::Keys(keys) => walk_keys(keys, given, path, false),
                    ObjectShape::Values(values) => {
                        let results = given.iter().map(|(k, v)| {
                            values.walk(v, &path.key(k)).map(|v| (k.clone(), v))
                        });
                        collect(results).map(|entries| Value::Object(entries.into_iter().collect()))
                    }
                },
                None => mismatch(self, value, path),
            },
        }
    }
}

/// Checks the top-level fields of one request location.
///
/// Unlike nested objects, request locations tolerate undeclared keys; they
/// are carried through untouched. When `url_encoded` is set, string values
/// are converted to the type their schema asks for before checking.
pub(crate) fn conform_fields(
    keys: &IndexMap<String, Schema>,
    given: &Map<String, Value>,
    path: &FieldPath,
    url_encoded: bool,
) -> ValidationResult<Map<String, Value>> {
    match walk_keys_with(keys, given, path, true, url_encoded) {
        Validation::Success(Value::Object(map)) => Validation::Success(map),
        Validation::Success(_) => Validation::Success(Map::new()),
        Validation::Failure(e) => Validation::Failure(e),
    }
}

fn walk_keys(
    keys: &IndexMap<String, Schema>,
    given: &Map<String, Value>,
    path: &FieldPath,
    tolerate_unknown: bool,
) -> ValidationResult<Value> {
    walk_keys_with(keys, given, path, tolerate_unknown, false)
}

fn walk_keys_with(
    keys: &IndexMap<String, Schema>,
    given: &Map<String, Value>,
    path: &FieldPath,
    tolerate_unknown: bool,
    url_encoded: bool,
) -> ValidationResult<Value> {
    let mut errors = Vec::new();
    let mut out = given.clone();

    for (name, schema) in keys {
        let key_path = path.key(name);
        let present = given
            .get(name)
            .filter(|v| !(v.is_null() && schema.may_be_absent()));

        match present {
            Some(v) => {
                let result = if url_encoded {
                    walk_url_value(schema, v, &key_path)
                } else {
                    schema.walk(v, &key_path)
                };
                match result {
                    Validation::Success(v) => {
                        out.insert(name.clone(), v);
                    }
                    Validation::Failure(e) => errors.extend(e),
                }
            }
            None => {
                if let Some(default) = &schema.meta.default {
                    out.insert(name.clone(), default.produce());
                } else if !schema.meta.optional {
                    errors.push(CheckError::missing(key_path, schema.type_name()));
                }
            }
        }
    }

    if !tolerate_unknown {
        for key in given.keys().filter(|k| !keys.contains_key(*k)) {
            errors.push(
                CheckError::new(path.key(key), format!("unknown key '{}'", key))
                    .with_code("unknown_key"),
            );
        }
    }

    match CheckErrors::from_vec(errors) {
        Some(errors) => Validation::Failure(errors),
        None => Validation::Success(Value::Object(out)),
    }
}

/// Checks a value that arrived URL-encoded.
///
/// The converted value is tried first, then the raw string, so that
/// `oneOf([int(), string()])` accepts both `5` and `Hi!`.
fn walk_url_value(schema: &Schema, value: &Value, path: &FieldPath) -> ValidationResult<Value> {
    let Some(raw) = value.as_str() else {
        return schema.walk(value, path);
    };
    match url_conversion(schema, raw) {
        Some(converted) => match schema.walk(&converted, path) {
            Validation::Success(v) => Validation::Success(v),
            Validation::Failure(e) => match schema.walk(value, path) {
                Validation::Success(v) => Validation::Success(v),
                Validation::Failure(_) => Validation::Failure(e),
            },
        },
        None => schema.walk(value, path),
    }
}

fn url_conversion(schema: &Schema, raw: &str) -> Option<Value> {
    match &schema.kind {
        SchemaKind::Primitive(p) => p.convert_url_string(raw),
        SchemaKind::Object(_) | SchemaKind::Array(_) | SchemaKind::OneOf(_) => {
            serde_json::from_str(raw).ok()
        }
        SchemaKind::Value(literal) if literal.is_string() => None,
        SchemaKind::Value(_) => serde_json::from_str(raw).ok(),
    }
}

fn mismatch(schema: &Schema, value: &Value, path: &FieldPath) -> ValidationResult<Value> {
    Validation::Failure(CheckErrors::single(CheckError::expected(
        path.clone(),
        schema.type_name(),
        value,
    )))
}

fn collect<T>(results: impl Iterator<Item = ValidationResult<T>>) -> ValidationResult<Vec<T>> {
    let mut values = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Validation::Success(v) => values.push(v),
            Validation::Failure(e) => errors.extend(e),
        }
    }
    match CheckErrors::from_vec(errors) {
        Some(errors) => Validation::Failure(errors),
        None => Validation::Success(values),
    }
}
