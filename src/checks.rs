//! Response checking for tests.
//!
//! A [`ResponseChecker`] holds the routes under test by name. Every response
//! passed to [`ResponseChecker::check_type`] must match one of the route's
//! declared returns, and [`ResponseChecker::all_checked`] fails until every
//! declared return has been seen at least once.
//!
//! ```rust
//! use apiprep::schema::int;
//! use apiprep::{data, prepare, HandlerError, Outcome, ResponseChecker, RouteOptions, RouteRequest};
//! use apiprep::checks::CheckedResponse;
//! use serde_json::json;
//!
//! let route = prepare(
//!     RouteOptions::new("Count").returns(vec![data(int())]),
//!     |_req: RouteRequest| async { Ok::<_, HandlerError>(Outcome::data(3)) },
//! )
//! .unwrap();
//!
//! let checker = ResponseChecker::new([("count", route)]).unwrap();
//! assert!(checker.check_type(&CheckedResponse::new(200, json!(3)), "count", false).unwrap());
//! assert!(checker.all_checked("count").unwrap());
//! ```

use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

use crate::path::FieldPath;
use crate::prepare::{PreparedRoute, FIELD_MISMATCH};
use crate::reply::{Reply, ReturnSchema};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseCheckError {
    #[error("the route container is empty")]
    Empty,

    #[error("route \"{0}\" could not be found, maybe you misspelled it?")]
    UnknownRoute(String),

    #[error(
        "response of \"{route}\" does not match any declared return\nMISMATCH: status {status}, body {body}\nEXPECTED: {expected}"
    )]
    Mismatch {
        route: String,
        status: u16,
        body: String,
        expected: String,
        /// Why each candidate return was rejected, when requested.
        explanation: Vec<String>,
    },

    #[error("not all returns of \"{route}\" have been tested\nMISSING: {missing}")]
    Untested { route: String, missing: String },
}

/// Status and JSON body of a response under test.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedResponse {
    pub status: u16,
    pub body: Value,
}

impl CheckedResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

impl From<&Reply> for CheckedResponse {
    fn from(reply: &Reply) -> Self {
        Self {
            status: reply.status.as_u16(),
            body: reply
                .json_body()
                .unwrap_or_else(|| Value::String(reply.body.clone())),
        }
    }
}

/// False for the `Fieldmissmatch` error every route documents.
pub fn is_not_field_mismatch(ret: &ReturnSchema) -> bool {
    !matches!(
        ret,
        ReturnSchema::Error { code: 400, message } if message == FIELD_MISMATCH
    )
}

/// Tracks which declared returns of a set of routes have been observed.
#[derive(Debug)]
pub struct ResponseChecker {
    routes: IndexMap<String, PreparedRoute>,
    checked: Mutex<HashMap<String, Vec<bool>>>,
}

impl ResponseChecker {
    pub fn new<K, I>(routes: I) -> Result<Self, ResponseCheckError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PreparedRoute)>,
    {
        let routes: IndexMap<String, PreparedRoute> =
            routes.into_iter().map(|(k, r)| (k.into(), r)).collect();
        if routes.is_empty() {
            return Err(ResponseCheckError::Empty);
        }
        Ok(Self {
            routes,
            checked: Mutex::new(HashMap::new()),
        })
    }

    fn returns_of(&self, name: &str) -> Result<Vec<ReturnSchema>, ResponseCheckError> {
        self.routes
            .get(name)
            .map(PreparedRoute::returns)
            .ok_or_else(|| ResponseCheckError::UnknownRoute(name.to_string()))
    }

    /// Checks `response` against the returns of route `name` and marks the
    /// first match as covered.
    ///
    /// A declared [`no_response`](crate::no_response) matches any response,
    /// but only after every other return failed to.
    pub fn check_type(
        &self,
        response: &CheckedResponse,
        name: &str,
        explain: bool,
    ) -> Result<bool, ResponseCheckError> {
        let returns = self.returns_of(name)?;

        let matches = |ret: &ReturnSchema| {
            ret.status() == response.status
                && ret
                    .body_schema()
                    .is_some_and(|schema| schema.check(&response.body))
        };
        let found = returns.iter().position(matches).or_else(|| {
            returns
                .iter()
                .position(|ret| matches!(ret, ReturnSchema::NoResponse))
        });

        if let Some(index) = found {
            let mut checked = self.checked.lock();
            let marks = checked
                .entry(name.to_string())
                .or_insert_with(|| vec![false; returns.len()]);
            marks[index] = true;
            return Ok(true);
        }

        let explanation = if explain {
            returns
                .iter()
                .filter_map(|ret| explain_mismatch(ret, response))
                .collect()
        } else {
            Vec::new()
        };
        for line in &explanation {
            tracing::info!(route = name, "{}", line);
        }

        Err(ResponseCheckError::Mismatch {
            route: name.to_string(),
            status: response.status,
            body: response.body.to_string(),
            expected: descriptors(returns.iter().filter(|r| is_not_field_mismatch(r))),
            explanation,
        })
    }

    /// Ok once every declared return of `name`, except `Fieldmissmatch`, has
    /// been matched by [`check_type`](Self::check_type).
    pub fn all_checked(&self, name: &str) -> Result<bool, ResponseCheckError> {
        let returns = self.returns_of(name)?;
        let checked = self.checked.lock();
        let marks = checked.get(name);
        let missing: Vec<&ReturnSchema> = returns
            .iter()
            .enumerate()
            .filter(|(i, ret)| {
                is_not_field_mismatch(ret) && !marks.is_some_and(|m| m.get(*i).copied().unwrap_or(false))
            })
            .map(|(_, ret)| ret)
            .collect();

        if missing.is_empty() {
            return Ok(true);
        }
        Err(ResponseCheckError::Untested {
            route: name.to_string(),
            missing: descriptors(missing.into_iter()),
        })
    }
}

fn descriptors<'a>(returns: impl Iterator<Item = &'a ReturnSchema>) -> String {
    let list: Vec<Value> = returns.map(ReturnSchema::body_descriptor).collect();
    serde_json::to_string_pretty(&list).unwrap_or_default()
}

fn explain_mismatch(ret: &ReturnSchema, response: &CheckedResponse) -> Option<String> {
    let schema = ret.body_schema()?;
    let mut line = format!(
        "{}: status should be {} and is {}",
        ret.label(),
        ret.status(),
        response.status
    );
    if let stillwater::Validation::Failure(errors) = schema.explain(&response.body, &FieldPath::root()) {
        line.push_str(&format!("; {}", errors));
    }
    Some(line)
}
