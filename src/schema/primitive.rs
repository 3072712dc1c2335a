//! Primitive type tags and their format checks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

static HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]*$").expect("hex pattern"));
static BASE64: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
        .expect("base64 pattern")
});
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static UUIDV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("uuidv4 pattern")
});

/// Type tag of a primitive schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `/`, accepts anything.
    Any,
    Int,
    Float,
    Boolean,
    String,
    Hex,
    Base64,
    Email,
    Uuidv4,
    Null,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 10] = [
        PrimitiveType::Any,
        PrimitiveType::Int,
        PrimitiveType::Float,
        PrimitiveType::Boolean,
        PrimitiveType::String,
        PrimitiveType::Hex,
        PrimitiveType::Base64,
        PrimitiveType::Email,
        PrimitiveType::Uuidv4,
        PrimitiveType::Null,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            PrimitiveType::Any => "/",
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::String => "string",
            PrimitiveType::Hex => "hex",
            PrimitiveType::Base64 => "base64",
            PrimitiveType::Email => "email",
            PrimitiveType::Uuidv4 => "uuidv4",
            PrimitiveType::Null => "null",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.tag() == tag)
    }

    /// Returns true if `value` is of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            PrimitiveType::Any => true,
            PrimitiveType::Int => is_integral(value),
            PrimitiveType::Float => value.is_number(),
            PrimitiveType::Boolean => value.is_boolean(),
            PrimitiveType::String => value.is_string(),
            PrimitiveType::Hex => matches_str(value, &HEX),
            PrimitiveType::Base64 => matches_str(value, &BASE64),
            PrimitiveType::Email => matches_str(value, &EMAIL),
            PrimitiveType::Uuidv4 => matches_str(value, &UUIDV4),
            PrimitiveType::Null => value.is_null(),
        }
    }

    /// Converts a raw URL string into the JSON value it denotes for this type.
    ///
    /// Returns `None` when no conversion applies; the raw string is then
    /// checked as-is.
    pub(crate) fn convert_url_string(&self, raw: &str) -> Option<Value> {
        match self {
            PrimitiveType::Int => {
                let trimmed = raw.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Some(Value::Number(n.into()));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            }
            PrimitiveType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            PrimitiveType::Boolean => match raw {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            PrimitiveType::Null => (raw == "null").then_some(Value::Null),
            PrimitiveType::Any => serde_json::from_str(raw).ok(),
            PrimitiveType::String
            | PrimitiveType::Hex
            | PrimitiveType::Base64
            | PrimitiveType::Email
            | PrimitiveType::Uuidv4 => None,
        }
    }

    /// OpenAPI `type` of values of this primitive, if it has one.
    pub(crate) fn open_api_type(&self) -> Option<&'static str> {
        match self {
            PrimitiveType::Int => Some("integer"),
            PrimitiveType::Float => Some("number"),
            PrimitiveType::Boolean => Some("boolean"),
            PrimitiveType::String
            | PrimitiveType::Hex
            | PrimitiveType::Base64
            | PrimitiveType::Email
            | PrimitiveType::Uuidv4 => Some("string"),
            PrimitiveType::Any | PrimitiveType::Null => None,
        }
    }
}

fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}

fn matches_str(value: &Value, pattern: &Regex) -> bool {
    value.as_str().is_some_and(|s| pattern.is_match(s))
}
