//! OpenAPI 3.0 export.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::{split_status, ApiDoc, DocRoute};
use crate::interop::ToOpenApiSchema;
use crate::schema::{DescriptorError, Schema};

static PATH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z0-9_]+)").expect("valid path parameter regex"));

/// Rewrites `:name` path parameters as `{name}`.
///
/// ```rust
/// use apiprep::docs::path_to_open_api_path;
///
/// assert_eq!(path_to_open_api_path("/v/1/user/:id/mail"), "/v/1/user/{id}/mail");
/// ```
pub fn path_to_open_api_path(path: &str) -> String {
    PATH_PARAM.replace_all(path, "{$1}").into_owned()
}

/// Security scheme documenting an `auth` label, if one applies.
fn security_scheme(auth: &str) -> Option<&'static str> {
    if auth.starts_with("Bearer jwt") {
        Some("ApiToken")
    } else if auth.starts_with("Basic") {
        Some("Password")
    } else if auth.starts_with("Bearer") {
        Some("AuthToken")
    } else {
        None
    }
}

fn security_schemes() -> Value {
    json!({
        "ApiToken": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" },
        "Password": { "type": "http", "scheme": "basic" },
        "AuthToken": { "type": "http", "scheme": "bearer" },
    })
}

fn has_request_body(method: &str) -> bool {
    !matches!(method, "get" | "head" | "delete")
}

fn parameter(name: &str, location: &str, descriptor: &Value) -> Result<Value, DescriptorError> {
    let schema = Schema::from_descriptor(descriptor)?;
    let mut param = Map::new();
    param.insert("name".into(), name.into());
    param.insert("in".into(), location.into());
    if location == "path" {
        param.insert("required".into(), true.into());
    } else {
        let required = !schema.may_be_absent();
        param.insert("required".into(), required.into());
        param.insert("allowEmptyValue".into(), (!required).into());
    }
    param.insert("schema".into(), schema.to_open_api_schema());
    Ok(Value::Object(param))
}

fn json_content(schema: Value) -> Value {
    json!({ "application/json": { "schema": schema } })
}

fn responses(route: &DocRoute) -> Result<Value, DescriptorError> {
    let mut by_status: BTreeMap<u16, Vec<Value>> = BTreeMap::new();
    for ret in &route.returns {
        let (status, body) = split_status(ret);
        let schema = Schema::from_descriptor(&body)?.to_open_api_schema();
        by_status.entry(status).or_default().push(schema);
    }

    let mut out = Map::new();
    for (status, mut schemas) in by_status {
        let schema = if schemas.len() == 1 {
            schemas.remove(0)
        } else {
            json!({ "anyOf": schemas })
        };
        out.insert(
            status.to_string(),
            json!({ "description": "", "content": json_content(schema) }),
        );
    }
    Ok(Value::Object(out))
}

fn operation(route: &DocRoute) -> Result<Value, DescriptorError> {
    let mut parameters = Vec::new();
    for (name, descriptor) in &route.assertions.params {
        parameters.push(parameter(name, "path", descriptor)?);
    }
    for (name, descriptor) in &route.assertions.query {
        parameters.push(parameter(name, "query", descriptor)?);
    }

    let mut op = Map::new();
    op.insert("summary".into(), route.title.clone().into());
    op.insert(
        "description".into(),
        route.description.clone().unwrap_or_default().into(),
    );
    op.insert("parameters".into(), Value::Array(parameters));

    if let Some(scheme) = route.options.auth.as_deref().and_then(security_scheme) {
        let mut requirement = Map::new();
        requirement.insert(scheme.to_string(), json!([]));
        op.insert("security".into(), json!([requirement]));
    }

    if has_request_body(&route.method) {
        let body = json!({ "type": "object", "keys": route.assertions.body });
        let schema = Schema::from_descriptor(&body)?.to_open_api_schema();
        op.insert(
            "requestBody".into(),
            json!({ "content": json_content(schema), "required": true }),
        );
    }

    op.insert("responses".into(), responses(route)?);
    Ok(Value::Object(op))
}

/// Builds an OpenAPI 3.0 document.
///
/// Fails when a documented descriptor cannot be read back, which only
/// happens for hand-edited documentation.
pub fn api_to_open_api(api: &ApiDoc, title: &str) -> Result<Value, DescriptorError> {
    let mut paths: Map<String, Value> = Map::new();
    for route in &api.routes {
        let path = paths
            .entry(path_to_open_api_path(&route.path))
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = path {
            methods.insert(route.method.clone(), operation(route)?);
        }
    }

    tracing::debug!(routes = api.routes.len(), paths = paths.len(), "built OpenAPI document");

    Ok(json!({
        "openapi": "3.0.3",
        "info": { "title": title, "version": "1" },
        "paths": paths,
        "components": { "securitySchemes": security_schemes() },
    }))
}
