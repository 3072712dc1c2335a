//! Field paths for locating values inside a request or response.
//!
//! This module provides [`FieldPath`], [`PathSegment`] and [`Location`]. A path
//! starts at an optional request location (`body`, `params`, `query`) and then
//! walks object keys and array indices, e.g. `body.deep.hasDefault`.

use std::fmt::{self, Display};

use serde::Serialize;

/// The part of a request a value was taken from.
///
/// The order of the variants is the order in which a prepared route checks
/// the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// The JSON request body.
    Body,
    /// Path parameters, e.g. `:id` in `/users/:id`.
    Params,
    /// The query string.
    Query,
}

impl Location {
    /// All locations in checking order.
    pub const ALL: [Location; 3] = [Location::Body, Location::Params, Location::Query];

    /// Returns the lowercase name used in messages and documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Body => "body",
            Location::Params => "params",
            Location::Query => "query",
        }
    }

    /// Returns true for locations whose values arrive as URL-encoded strings.
    pub fn is_url_encoded(&self) -> bool {
        !matches!(self, Location::Body)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

/// A path to a value, optionally anchored at a request [`Location`].
///
/// # Example
///
/// ```rust
/// use apiprep::{FieldPath, Location};
///
/// let path = FieldPath::at(Location::Body)
///     .key("users")
///     .index(0)
///     .key("email");
///
/// assert_eq!(path.to_string(), "body.users[0].email");
/// assert_eq!(path.top_key(), Some("users"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    location: Option<Location>,
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Creates an unanchored, empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates an empty path anchored at a request location.
    pub fn at(location: Location) -> Self {
        Self {
            location: Some(location),
            segments: Vec::new(),
        }
    }

    /// Returns a new path with an object key appended.
    pub fn key(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Key(name.into()));
        next
    }

    /// Returns a new path with an array index appended.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }

    /// The request location this path is anchored at, if any.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// The first key below the location.
    ///
    /// This is the name of the request field a mismatch belongs to.
    pub fn top_key(&self) -> Option<&str> {
        match self.segments.first() {
            Some(PathSegment::Key(name)) => Some(name),
            _ => None,
        }
    }

    /// Returns true if the path has neither a location nor segments.
    pub fn is_root(&self) -> bool {
        self.location.is_none() && self.segments.is_empty()
    }

    /// Number of segments below the location.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if let Some(location) = self.location {
            write!(f, "{}", location)?;
            first = false;
        }
        for segment in &self.segments {
            match segment {
                PathSegment::Key(name) => {
                    if !first {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
            first = false;
        }
        Ok(())
    }
}
