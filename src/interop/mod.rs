//! Interoperability with other schema formats.
//!
//! Schemas can be exported as OpenAPI 3.0 schema objects, which is what
//! [`crate::docs::api_to_open_api`] builds on.

pub mod open_api;

pub use open_api::ToOpenApiSchema;
