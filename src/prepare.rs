//! Route preparation.
//!
//! [`prepare`] wraps a handler with request checking and response
//! serialization. The resulting [`PreparedRoute`] remembers everything it was
//! declared with, so the same declaration drives documentation.
//!
//! # Example
//!
//! ```rust
//! use apiprep::schema::{int, obj, string};
//! use apiprep::{data, prepare, HandlerError, Outcome, RouteOptions, RouteRequest};
//! use axum::http::Method;
//! use serde_json::json;
//!
//! let route = prepare(
//!     RouteOptions::new("Say hello")
//!         .query(obj([("name", string().default("world"))]))
//!         .returns(vec![data(obj([("greeting", string())]))]),
//!     |req: RouteRequest| async move {
//!         let name = req.query["name"].as_str().unwrap_or_default().to_string();
//!         Ok::<_, HandlerError>(Outcome::data(json!({ "greeting": format!("hello {}", name) })))
//!     },
//! )
//! .unwrap();
//!
//! # tokio_test_block(async move {
//! let reply = route.handle(RouteRequest::new(Method::GET, "/hello")).await;
//! assert_eq!(reply.json_body(), Some(json!({ "greeting": "hello world" })));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use stillwater::Validation;
use uuid::Uuid;

use crate::config::{self, PrepConfig};
use crate::error::{CheckErrors, DefinitionError};
use crate::path::{FieldPath, Location};
use crate::reply::{
    http_error, HandlerError, HandlerResult, HttpError, Outcome, Reply, ReturnSchema,
};
use crate::schema::{conform_fields, obj_empty, Schema};

/// The error message of every request that fails its checks.
pub const FIELD_MISMATCH: &str = "Fieldmissmatch";

/// A request as seen by a prepared route, independent of the server.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    /// Path and query as received.
    pub url: String,
    pub params: Map<String, Value>,
    pub query: Map<String, Value>,
    pub body: Value,
    pub headers: HeaderMap,
    pub ip: Option<String>,
}

impl RouteRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Map::new(),
            query: Map::new(),
            body: Value::Object(Map::new()),
            headers: HeaderMap::new(),
            ip: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Adds a header. Values that are not valid header text are ignored.
    pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Returns a header value if it is present and readable.
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Deserializes one request location into `T`.
    ///
    /// Fails with a 400 [`HttpError`] if the checked values do not fit `T`.
    pub fn parse<T: DeserializeOwned>(&self, location: Location) -> Result<T, HandlerError> {
        let value = match location {
            Location::Body => self.body.clone(),
            Location::Params => Value::Object(self.params.clone()),
            Location::Query => Value::Object(self.query.clone()),
        };
        serde_json::from_value(value).map_err(|e| {
            HandlerError::Http(HttpError::new(400, FIELD_MISMATCH).with_description(format!(
                "{} in {}",
                e, location
            )))
        })
    }

    fn location(&self, location: Location) -> Option<&Map<String, Value>> {
        match location {
            Location::Body => match &self.body {
                Value::Object(map) => Some(map),
                _ => None,
            },
            Location::Params => Some(&self.params),
            Location::Query => Some(&self.query),
        }
    }

    fn set_location(&mut self, location: Location, map: Map<String, Value>) {
        match location {
            Location::Body => self.body = Value::Object(map),
            Location::Params => self.params = map,
            Location::Query => self.query = map,
        }
    }
}

/// Something that can answer a checked request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: RouteRequest) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: RouteRequest) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(request))
    }
}

/// Receives a log message together with the request and the reply sent.
pub type LogFn = Arc<dyn Fn(&str, &RouteRequest, &Reply) + Send + Sync>;

/// Schemas for the three request locations.
#[derive(Debug, Clone)]
pub struct Receives {
    pub body: Schema,
    pub params: Schema,
    pub query: Schema,
}

impl Default for Receives {
    fn default() -> Self {
        Self {
            body: obj_empty(),
            params: obj_empty(),
            query: obj_empty(),
        }
    }
}

impl Receives {
    pub fn get(&self, location: Location) -> &Schema {
        match location {
            Location::Body => &self.body,
            Location::Params => &self.params,
            Location::Query => &self.query,
        }
    }

    fn keys(&self, location: Location) -> &IndexMap<String, Schema> {
        static EMPTY: once_cell::sync::Lazy<IndexMap<String, Schema>> =
            once_cell::sync::Lazy::new(IndexMap::new);
        self.get(location).keys().unwrap_or(&EMPTY)
    }
}

/// Everything a route is declared with, except its handler.
#[derive(Clone)]
pub struct RouteOptions {
    pub title: String,
    pub description: Option<String>,
    pub receives: Receives,
    pub returns: Vec<ReturnSchema>,
    /// Label of the authentication scheme, e.g. `Bearer jwt`.
    pub auth: Option<String>,
    /// Drop undeclared request fields before checking.
    pub strap: bool,
    pub log_error: Option<LogFn>,
    pub log_response: Option<LogFn>,
    pub config: Option<PrepConfig>,
}

impl RouteOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            receives: Receives::default(),
            returns: Vec::new(),
            auth: None,
            strap: false,
            log_error: None,
            log_response: None,
            config: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn body(mut self, schema: Schema) -> Self {
        self.receives.body = schema;
        self
    }

    pub fn params(mut self, schema: Schema) -> Self {
        self.receives.params = schema;
        self
    }

    pub fn query(mut self, schema: Schema) -> Self {
        self.receives.query = schema;
        self
    }

    pub fn returns(mut self, returns: Vec<ReturnSchema>) -> Self {
        self.returns = returns;
        self
    }

    pub fn auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }

    pub fn strap(mut self, strap: bool) -> Self {
        self.strap = strap;
        self
    }

    /// Receives `SERVER ERROR <id>` followed by a newline and the JSON error
    /// record whenever the handler fails with an internal error.
    pub fn log_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &RouteRequest, &Reply) + Send + Sync + 'static,
    {
        self.log_error = Some(Arc::new(f));
        self
    }

    pub fn log_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &RouteRequest, &Reply) + Send + Sync + 'static,
    {
        self.log_response = Some(Arc::new(f));
        self
    }

    pub fn config(mut self, config: PrepConfig) -> Self {
        self.config = Some(config);
        self
    }
}

impl fmt::Debug for RouteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteOptions")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("receives", &self.receives)
            .field("returns", &self.returns)
            .field("auth", &self.auth)
            .field("strap", &self.strap)
            .finish_non_exhaustive()
    }
}

struct Inner {
    options: RouteOptions,
    handler: Arc<dyn Handler>,
}

/// A handler wrapped with checks, ready to be mounted.
///
/// Cloning is cheap; clones share the declaration and the handler.
#[derive(Clone)]
pub struct PreparedRoute {
    inner: Arc<Inner>,
}

impl fmt::Debug for PreparedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PreparedRoute").field(&self.inner.options).finish()
    }
}

/// Wraps `handler` so that it only sees requests matching `options.receives`.
///
/// Fails if a request location is not an object schema with keys, or if a
/// return schema is optional or has a default.
pub fn prepare<F, Fut>(options: RouteOptions, handler: F) -> Result<PreparedRoute, DefinitionError>
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    prepare_handler(options, handler)
}

/// Like [`prepare`], for handlers that implement [`Handler`] themselves.
pub fn prepare_handler<H: Handler>(
    options: RouteOptions,
    handler: H,
) -> Result<PreparedRoute, DefinitionError> {
    for location in Location::ALL {
        let schema = options.receives.get(location);
        if schema.keys().is_none() {
            return Err(DefinitionError::Assertions {
                route: options.title.clone(),
                location: location.as_str(),
                got: schema.type_name().to_string(),
            });
        }
    }

    for (index, ret) in options.returns.iter().enumerate() {
        let Some(schema) = ret.declared_schema() else {
            continue;
        };
        let problem = if schema.is_optional() {
            "must not be optional"
        } else if schema.has_default() {
            "must not have a default"
        } else {
            continue;
        };
        return Err(DefinitionError::Returns {
            route: options.title.clone(),
            index,
            problem: problem.to_string(),
        });
    }

    tracing::debug!(route = %options.title, returns = options.returns.len(), "prepared route");

    Ok(PreparedRoute {
        inner: Arc::new(Inner {
            options,
            handler: Arc::new(handler),
        }),
    })
}

impl PreparedRoute {
    pub fn title(&self) -> &str {
        &self.inner.options.title
    }

    pub fn description(&self) -> Option<&str> {
        self.inner.options.description.as_deref()
    }

    pub fn auth(&self) -> Option<&str> {
        self.inner.options.auth.as_deref()
    }

    pub fn receives(&self) -> &Receives {
        &self.inner.options.receives
    }

    /// The declared returns followed by the `Fieldmissmatch` error every
    /// route may answer with.
    pub fn returns(&self) -> Vec<ReturnSchema> {
        let mut returns = self.inner.options.returns.clone();
        returns.push(http_error(400, FIELD_MISMATCH));
        returns
    }

    pub fn config(&self) -> &PrepConfig {
        self.inner.options.config.as_ref().unwrap_or_else(|| config::global())
    }

    /// Runs the full pipeline for one request.
    pub async fn handle(&self, mut request: RouteRequest) -> Reply {
        let options = &self.inner.options;

        if options.strap {
            strap(&options.receives, &mut request);
        }

        for location in Location::ALL {
            let keys = options.receives.keys(location);
            let Some(given) = request.location(location) else {
                let reply = mismatch_reply(format!("expected object in {}", location));
                return self.respond(&request, reply);
            };
            match conform_fields(
                keys,
                given,
                &FieldPath::at(location),
                location.is_url_encoded(),
            ) {
                Validation::Success(map) => request.set_location(location, map),
                Validation::Failure(errors) => {
                    tracing::debug!(
                        route = %options.title,
                        location = %location,
                        errors = %errors,
                        "request rejected"
                    );
                    let reply = mismatch_reply(describe_mismatch(keys, &errors, location));
                    return self.respond(&request, reply);
                }
            }
        }

        let reply = match self.inner.handler.call(request.clone()).await {
            Ok(Outcome::Data(data)) => Reply::json(StatusCode::OK, &data),
            Ok(Outcome::Error(error)) | Err(HandlerError::Http(error)) => Reply::from(&error),
            Ok(Outcome::Code(code)) => Reply::from(&code),
            Ok(Outcome::NoResponse(reply)) => reply,
            Err(HandlerError::Internal(report)) => self.server_error(&request, &report),
        };
        self.respond(&request, reply)
    }

    /// Builds the reply for a request whose body could not be read as JSON.
    pub(crate) fn reject_body(&self, request: &RouteRequest, problem: &str) -> Reply {
        self.respond(request, mismatch_reply(format!("{} in body", problem)))
    }

    fn respond(&self, request: &RouteRequest, reply: Reply) -> Reply {
        match &self.inner.options.log_response {
            Some(log) => log(&reply.body, request, &reply),
            None => tracing::debug!(
                method = %request.method,
                url = %request.url,
                status = reply.status.as_u16(),
                "responded"
            ),
        }
        reply
    }

    fn server_error(&self, request: &RouteRequest, report: &eyre::Report) -> Reply {
        let id = Uuid::now_v7();
        let record = error_record(id, request, report);
        let reply = Reply::text(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!(
                "SERVER ERROR! {} Please consider sending this error-message along with a \
                 description of what happened and what you were doing to this email-address: {}.",
                id,
                self.config().bug_report_email
            ),
        );
        match &self.inner.options.log_error {
            Some(log) => log(&format!("SERVER ERROR {}\n{}", id, record), request, &reply),
            None => tracing::error!(id = %id, record = %record, "SERVER ERROR"),
        }
        reply
    }
}

fn strap(receives: &Receives, request: &mut RouteRequest) {
    for location in Location::ALL {
        let keys = receives.keys(location);
        if let Some(given) = request.location(location) {
            let kept = given
                .iter()
                .filter(|(k, _)| keys.contains_key(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            request.set_location(location, kept);
        }
    }
}

fn mismatch_reply(description: String) -> Reply {
    Reply::from(&HttpError::new(400, FIELD_MISMATCH).with_description(description))
}

/// Renders one `missing T for field "k"` / `expected T for field "k"` per
/// failing top-level field.
fn describe_mismatch(keys: &IndexMap<String, Schema>, errors: &CheckErrors, location: Location) -> String {
    let mut fields: IndexMap<&str, bool> = IndexMap::new();
    for error in errors.iter() {
        let Some(key) = error.path.top_key() else {
            continue;
        };
        let missing = error.code == "missing" && error.path.depth() == 1;
        fields.entry(key).or_insert(missing);
    }

    let parts: Vec<String> = fields
        .into_iter()
        .map(|(key, missing)| {
            let type_name = keys.get(key).map(Schema::type_name).unwrap_or("/");
            let verb = if missing { "missing" } else { "expected" };
            format!("{} {} for field \"{}\"", verb, type_name, key)
        })
        .collect();
    format!("{} in {}", parts.join(", "), location)
}

fn error_record(id: Uuid, request: &RouteRequest, report: &eyre::Report) -> Value {
    let non_empty = |map: Option<&Map<String, Value>>| match map {
        Some(map) if !map.is_empty() => Value::Object(map.clone()),
        _ => Value::Null,
    };
    json!({
        "ID": id.to_string(),
        "USER": request.header(header::AUTHORIZATION).unwrap_or_default(),
        "REQUEST": {
            "body": non_empty(request.body.as_object()),
            "params": non_empty(Some(&request.params)),
            "url": request.url,
            "method": request.method.as_str(),
            "ip": request.ip,
            "ua": request.header(header::USER_AGENT).unwrap_or_default(),
        },
        "TRACE": format!("{:?}", report),
    })
}
