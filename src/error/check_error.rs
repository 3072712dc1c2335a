//! Check error types.
//!
//! This module provides [`CheckError`] for a single mismatch between a value
//! and a schema and [`CheckErrors`] for accumulating several of them.

use std::fmt::{self, Display};

use serde_json::{json, Value};
use stillwater::prelude::*;

use crate::path::FieldPath;

/// A single mismatch between a value and a schema.
///
/// - **path**: where the mismatch occurred (`body.deep.hasDefault`)
/// - **message**: `missing <type>`, `expected <type>` or a more specific text
/// - **got**: the JSON type of the offending value, if there was one
/// - **expected**: the display name of the expected type
/// - **code**: machine-readable code (`missing`, `invalid_type`, ...)
///
/// # Example
///
/// ```rust
/// use apiprep::{CheckError, FieldPath, Location};
///
/// let error = CheckError::missing(FieldPath::at(Location::Query).key("id"), "id");
/// assert_eq!(error.message, "missing id");
/// assert_eq!(error.code, "missing");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CheckError {
    pub path: FieldPath,
    pub message: String,
    pub got: Option<String>,
    pub expected: Option<String>,
    pub code: String,
}

impl CheckError {
    /// Creates an error with the generic `check_error` code.
    pub fn new(path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            got: None,
            expected: None,
            code: "check_error".to_string(),
        }
    }

    /// A required field is absent and has no default.
    pub fn missing(path: FieldPath, type_name: &str) -> Self {
        Self::new(path, format!("missing {}", type_name))
            .with_code("missing")
            .with_expected(type_name)
    }

    /// A value is present but does not match the expected type.
    pub fn expected(path: FieldPath, type_name: &str, got: &Value) -> Self {
        Self::new(path, format!("expected {}", type_name))
            .with_code("invalid_type")
            .with_expected(type_name)
            .with_got(json_type_name(got))
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_got(mut self, got: impl Into<String>) -> Self {
        self.got = Some(got.into());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Plain-data form of the error, used when explanations are printed.
    pub fn to_json(&self) -> Value {
        let mut out = json!({
            "path": self.path.to_string(),
            "message": self.message,
            "code": self.code,
        });
        if let Some(expected) = &self.expected {
            out["expected"] = json!(expected);
        }
        if let Some(got) = &self.got {
            out["got"] = json!(got);
        }
        out
    }
}

impl Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "(root): {}", self.message)?;
        } else {
            write!(f, "{}: {}", self.path, self.message)?;
        }
        if let Some(ref got) = self.got {
            write!(f, " (got: {})", got)?;
        }
        Ok(())
    }
}

impl std::error::Error for CheckError {}

/// A non-empty collection of check errors.
///
/// `CheckErrors` implements `Semigroup`, so explanations of sibling values
/// combine into one report:
///
/// ```rust
/// use apiprep::{CheckError, CheckErrors, FieldPath};
/// use stillwater::prelude::*;
///
/// let a = CheckErrors::single(CheckError::new(FieldPath::root().key("a"), "expected int"));
/// let b = CheckErrors::single(CheckError::new(FieldPath::root().key("b"), "missing string"));
///
/// assert_eq!(a.combine(b).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CheckErrors(NonEmptyVec<CheckError>);

impl CheckErrors {
    pub fn single(error: CheckError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Builds the collection from a vec, returning `None` when it is empty.
    pub fn from_vec(errors: Vec<CheckError>) -> Option<Self> {
        let mut iter = errors.into_iter();
        let head = NonEmptyVec::singleton(iter.next()?);
        Some(Self(
            iter.fold(head, |acc, e| acc.combine(NonEmptyVec::singleton(e))),
        ))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckError> {
        self.0.iter()
    }

    pub fn first(&self) -> &CheckError {
        self.0.head()
    }

    /// Returns all errors with the given code.
    pub fn with_code(&self, code: &str) -> Vec<&CheckError> {
        self.0.iter().filter(|e| e.code == code).collect()
    }

    /// Returns all errors whose path renders as `path`.
    pub fn at(&self, path: &str) -> Vec<&CheckError> {
        self.0.iter().filter(|e| e.path.to_string() == path).collect()
    }

    pub fn into_vec(self) -> Vec<CheckError> {
        self.0.into_vec()
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.iter().map(CheckError::to_json).collect())
    }
}

impl Semigroup for CheckErrors {
    fn combine(self, other: Self) -> Self {
        CheckErrors(self.0.combine(other.0))
    }
}

impl Display for CheckErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} mismatch(es):", self.len())?;
        for (i, error) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for CheckErrors {}

impl IntoIterator for CheckErrors {
    type Item = CheckError;
    type IntoIter = std::vec::IntoIter<CheckError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

/// Returns the JSON type name of a value.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<CheckErrors>();
    assert_sync::<CheckErrors>();
};
