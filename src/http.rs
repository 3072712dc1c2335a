//! Mounting prepared routes on axum.
//!
//! ```rust,no_run
//! use apiprep::docs::Api;
//! use apiprep::{prepare, HandlerError, Outcome, RouteOptions, RouteRequest};
//!
//! # async fn run() -> std::io::Result<()> {
//! let hello = prepare(RouteOptions::new("Hello"), |_req: RouteRequest| async {
//!     Ok::<_, HandlerError>(Outcome::data("hi"))
//! })
//! .unwrap();
//!
//! let mut api = Api::new();
//! api.get("/v/1/hello", hello);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, api.into_router()).await
//! # }
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequestParts, Query, RawPathParams, Request};
use axum::http::{header, request::Parts};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter};
use axum::Router;
use serde_json::{Map, Value};

use crate::docs::{path_to_open_api_path, Api};
use crate::prepare::{PreparedRoute, RouteRequest};
use crate::reply::{HttpError, Reply};

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

async fn path_params(parts: &mut Parts) -> Map<String, Value> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
        Err(_) => Map::new(),
    }
}

fn query_params(parts: &Parts) -> Map<String, Value> {
    match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
        Ok(Query(pairs)) => pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, uri = %parts.uri, "ignoring malformed query string");
            Map::new()
        }
    }
}

impl PreparedRoute {
    /// Reads an axum request and runs it through [`PreparedRoute::handle`].
    ///
    /// Path parameters and query values arrive as strings and are converted
    /// by the declared schemas. An empty body counts as `{}`.
    pub async fn serve(&self, request: Request) -> Reply {
        let (mut parts, body) = request.into_parts();
        let mut route_request = RouteRequest::new(
            parts.method.clone(),
            parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string()),
        );
        route_request.params = path_params(&mut parts).await;
        route_request.query = query_params(&parts);
        route_request.ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        route_request.headers = parts.headers;

        let bytes = match axum::body::to_bytes(body, self.config().body_limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(error = %e, url = %route_request.url, "could not read body");
                return Reply::from(&HttpError::new(413, "Payload Too Large"));
            }
        };
        if !bytes.is_empty() {
            match serde_json::from_slice(&bytes) {
                Ok(body) => route_request.body = body,
                Err(_) => return self.reject_body(&route_request, "invalid JSON"),
            }
        }

        self.handle(route_request).await
    }
}

impl Api {
    /// Builds a router serving every mounted route.
    ///
    /// `:name` path parameters are translated to axum's `{name}` syntax. When
    /// a method and path are mounted twice, the first route wins.
    pub fn into_router(self) -> Router {
        let mut router = Router::new();
        let mut mounted_paths = HashSet::new();
        for mounted in self.mounted() {
            let Ok(filter) = MethodFilter::try_from(mounted.method.clone()) else {
                tracing::warn!(method = %mounted.method, path = %mounted.path, "unsupported method, route skipped");
                continue;
            };
            let path = path_to_open_api_path(&mounted.path);
            if !mounted_paths.insert((mounted.method.clone(), path.clone())) {
                tracing::warn!(method = %mounted.method, path = %mounted.path, "route already mounted, later one skipped");
                continue;
            }
            let route = mounted.route.clone();
            let handler = move |request: Request<Body>| {
                let route = route.clone();
                async move { route.serve(request).await }
            };
            router = router.route(&path, on(filter, handler));
        }
        router
    }
}
