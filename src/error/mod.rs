//! Error types.
//!
//! [`CheckError`]/[`CheckErrors`] describe values that do not match a schema.
//! [`DefinitionError`] is raised when a route is declared with schemas that
//! cannot work, before any request is served.

mod check_error;

pub use check_error::{CheckError, CheckErrors};
pub(crate) use check_error::json_type_name;

use thiserror::Error;

/// A route was declared with malformed assertions or return types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DefinitionError {
    /// A `receives` location is not an object schema with declared keys.
    #[error("assertions are not well defined for route \"{route}\": {location} must be an object with keys, got {got}")]
    Assertions {
        route: String,
        location: &'static str,
        got: String,
    },

    /// A return schema is marked optional or carries a default.
    #[error("return types are not well defined for route \"{route}\": return #{index} {problem}")]
    Returns {
        route: String,
        index: usize,
        problem: String,
    },
}
