//! # apiprep
//!
//! Declarative request validation and API documentation for axum routes.
//!
//! ## Overview
//!
//! A route is declared once: the shape of its body, path parameters and
//! query, and every response it may give. [`prepare`] wraps the handler so
//! that it only ever sees requests matching those shapes, with defaults
//! filled in and URL-encoded values converted. The same declarations feed
//! the documentation generators in [`docs`] and the [`ResponseChecker`] used
//! in tests.
//!
//! ## Core Types
//!
//! - [`schema::Schema`]: a type descriptor (object, array, `oneOf`, literal, primitive)
//! - [`CheckError`] / [`CheckErrors`]: every mismatch between a value and a schema
//! - [`RouteOptions`] / [`PreparedRoute`]: a declared and wrapped route
//! - [`Outcome`] / [`HttpError`] / [`HttpCode`]: what handlers answer with
//! - [`docs::Api`]: routes grouped into sections, rendered as JSON, OpenAPI,
//!   Markdown, HTML or React
//!
//! ## Example
//!
//! ```rust
//! use apiprep::schema::{int, obj, string};
//! use apiprep::{data, http_error, prepare, HandlerError, HttpError, Outcome, RouteOptions, RouteRequest};
//! use serde_json::json;
//!
//! let route = prepare(
//!     RouteOptions::new("Get user")
//!         .params(obj([("id", int().semantic("id"))]))
//!         .returns(vec![
//!             data(obj([("id", int()), ("name", string())])),
//!             http_error(404, "User not found"),
//!         ]),
//!     |req: RouteRequest| async move {
//!         match req.params["id"].as_i64() {
//!             Some(1) => Ok(Outcome::data(json!({ "id": 1, "name": "Ada" }))),
//!             _ => Err(HandlerError::from(HttpError::not_found("User"))),
//!         }
//!     },
//! )
//! .unwrap();
//!
//! assert_eq!(route.returns().len(), 3);
//! ```

pub mod auth;
pub mod checks;
pub mod config;
pub mod docs;
pub mod error;
mod http;
pub mod interop;
pub mod path;
pub mod prepare;
pub mod reply;
pub mod schema;

pub use checks::{ResponseCheckError, ResponseChecker};
pub use config::PrepConfig;
pub use error::{CheckError, CheckErrors, DefinitionError};
pub use path::{FieldPath, Location, PathSegment};
pub use prepare::{prepare, prepare_handler, Handler, RouteOptions, RouteRequest, PreparedRoute};
pub use reply::{
    data, http_code, http_error, no_response, HandlerError, HandlerResult, HttpCode, HttpError,
    Outcome, Reply, ReturnSchema,
};

/// Result of checking a value: the value on success, every mismatch otherwise.
pub type ValidationResult<T> = stillwater::Validation<T, CheckErrors>;
