//! What handlers return and how routes declare it.
//!
//! A handler answers with an [`Outcome`]: plain data, a deliberate
//! [`HttpError`], a non-200 [`HttpCode`] or a [`Reply`] it built itself.
//! Routes declare the shapes they may answer with as [`ReturnSchema`]s,
//! which feed both documentation and [`ResponseChecker`](crate::ResponseChecker).

use axum::http::StatusCode;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::schema::{obj, string, value, Describe, Schema};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// A deliberate, typed error response.
///
/// ```rust
/// use apiprep::HttpError;
/// use serde_json::json;
///
/// let error = HttpError::from_code(403);
/// assert_eq!(error.message, "Forbidden");
/// assert_eq!(error.body(), json!({ "error": "Forbidden" }));
///
/// let error = HttpError::not_found("User");
/// assert_eq!((error.code, error.message.as_str()), (404, "User not found"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code} {message}")]
pub struct HttpError {
    pub code: u16,
    pub message: String,
    pub description: Option<String>,
}

impl HttpError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            return Self::from_code(code);
        }
        Self {
            code,
            message,
            description: None,
        }
    }

    /// An error with the standard message for `code`.
    pub fn from_code(code: u16) -> Self {
        let message = match code {
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            _ => "Unexpected Error",
        };
        Self {
            code,
            message: message.to_string(),
            description: None,
        }
    }

    pub fn not_found(element: &str) -> Self {
        Self::new(404, format!("{} not found", element))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The JSON body sent to the client.
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("error".into(), Value::String(self.message.clone()));
        if let Some(description) = &self.description {
            body.insert("description".into(), Value::String(description.clone()));
        }
        Value::Object(body)
    }
}

/// A successful response with a status other than 200.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCode {
    pub code: u16,
    pub message: Value,
}

impl HttpCode {
    pub fn new(code: u16, message: impl Into<Value>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A finished HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: String,
    pub body: String,
}

impl Reply {
    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self {
            status,
            content_type: JSON_CONTENT_TYPE.to_string(),
            body: body.to_string(),
        }
    }

    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_CONTENT_TYPE.to_string(),
            body: body.into(),
        }
    }

    /// Parses the body as JSON, if it is JSON.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

impl From<&HttpError> for Reply {
    fn from(error: &HttpError) -> Self {
        Reply::json(status_code(error.code), &error.body())
    }
}

impl From<&HttpCode> for Reply {
    fn from(code: &HttpCode) -> Self {
        Reply::json(status_code(code.code), &code.message)
    }
}

pub(crate) fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// The successful result of a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Sent as JSON with status 200.
    Data(Value),
    Error(HttpError),
    Code(HttpCode),
    /// The handler produced the response itself.
    NoResponse(Reply),
}

impl Outcome {
    pub fn data(value: impl Into<Value>) -> Self {
        Outcome::Data(value.into())
    }
}

impl From<HttpError> for Outcome {
    fn from(error: HttpError) -> Self {
        Outcome::Error(error)
    }
}

impl From<HttpCode> for Outcome {
    fn from(code: HttpCode) -> Self {
        Outcome::Code(code)
    }
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Outcome::NoResponse(reply)
    }
}

/// Why a handler did not produce an [`Outcome`].
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Answered like a returned [`HttpError`].
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Answered with status 500 and logged.
    #[error("{0:?}")]
    Internal(eyre::Report),
}

impl From<eyre::Report> for HandlerError {
    fn from(report: eyre::Report) -> Self {
        HandlerError::Internal(report)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::Internal(eyre::Report::new(e))
    }
}

pub type HandlerResult = Result<Outcome, HandlerError>;

/// A response shape a route may answer with.
#[derive(Debug, Clone)]
pub enum ReturnSchema {
    Data(Schema),
    Error { code: u16, message: String },
    Code { code: u16, schema: Schema },
    NoResponse,
}

/// A 200 response whose body matches `schema`.
pub fn data(schema: Schema) -> ReturnSchema {
    ReturnSchema::Data(schema)
}

/// An [`HttpError`] with the given code and message.
pub fn http_error(code: u16, message: impl Into<String>) -> ReturnSchema {
    ReturnSchema::Error {
        code,
        message: message.into(),
    }
}

/// An [`HttpCode`] whose message matches `schema`.
pub fn http_code(code: u16, schema: Schema) -> ReturnSchema {
    ReturnSchema::Code { code, schema }
}

/// The handler answers on its own.
pub fn no_response() -> ReturnSchema {
    ReturnSchema::NoResponse
}

impl ReturnSchema {
    pub fn status(&self) -> u16 {
        match self {
            ReturnSchema::Data(_) | ReturnSchema::NoResponse => 200,
            ReturnSchema::Error { code, .. } | ReturnSchema::Code { code, .. } => *code,
        }
    }

    /// The schema of the response body.
    pub fn body_schema(&self) -> Option<Schema> {
        match self {
            ReturnSchema::Data(schema) | ReturnSchema::Code { schema, .. } => Some(schema.clone()),
            ReturnSchema::Error { message, .. } => Some(error_body_schema(message)),
            ReturnSchema::NoResponse => None,
        }
    }

    /// The top-level schema, which must not be optional or defaulted.
    pub(crate) fn declared_schema(&self) -> Option<&Schema> {
        match self {
            ReturnSchema::Data(schema) | ReturnSchema::Code { schema, .. } => Some(schema),
            ReturnSchema::Error { .. } | ReturnSchema::NoResponse => None,
        }
    }

    /// The descriptor of the body alone, as listed in documentation.
    pub fn body_descriptor(&self) -> Value {
        match self.body_schema() {
            Some(schema) => schema.to_descriptor(),
            None => json!({ "type": "object", "keys": {} }),
        }
    }

    /// A short label for messages, e.g. `HttpError(401, "Unauthorized")`.
    pub fn label(&self) -> String {
        match self {
            ReturnSchema::Data(schema) => format!("data({})", schema.type_name()),
            ReturnSchema::Error { code, message } => format!("HttpError({}, \"{}\")", code, message),
            ReturnSchema::Code { code, schema } => {
                format!("HttpCode({}, {})", code, schema.type_name())
            }
            ReturnSchema::NoResponse => "DontRespond".to_string(),
        }
    }
}

fn error_body_schema(message: &str) -> Schema {
    obj([
        ("error", value(message)),
        ("description", string().optional()),
    ])
}

fn wrapped(tag: &str, code: u16, message: Value) -> Value {
    json!({
        "type": "object",
        "keys": {
            "code": { "value": code },
            "message": message,
            "type": { "value": tag },
        }
    })
}

impl Describe for ReturnSchema {
    fn to_descriptor(&self) -> Value {
        match self {
            ReturnSchema::Data(schema) => schema.to_descriptor(),
            ReturnSchema::Error { code, message } => {
                wrapped("HttpError", *code, error_body_schema(message).to_descriptor())
            }
            ReturnSchema::Code { code, schema } => wrapped("HttpCode", *code, schema.to_descriptor()),
            ReturnSchema::NoResponse => json!({
                "type": "object",
                "keys": { "type": { "value": "DontRespond" } }
            }),
        }
    }
}
