//! API documentation.
//!
//! [`Api`] collects prepared routes together with the method and path they
//! are mounted at, grouped into nested sections. [`Api::get_api`] turns that
//! into a plain-data [`ApiDoc`], which the generators in this module render
//! as OpenAPI, Markdown, HTML or a React component.
//!
//! # Example
//!
//! ```rust
//! use apiprep::docs::{Api, ApiDocOptions, SectionDef};
//! use apiprep::{prepare, HandlerError, Outcome, RouteOptions, RouteRequest};
//!
//! let hello = prepare(RouteOptions::new("Hello"), |_req: RouteRequest| async {
//!     Ok::<_, HandlerError>(Outcome::data("hi"))
//! })
//! .unwrap();
//!
//! let mut api = Api::new();
//! api.section(SectionDef::new("Introduction"), |_| {});
//! api.section(SectionDef::new("Greetings"), |api| {
//!     api.get("/v/1/hello", hello.clone());
//! });
//!
//! let doc = api.get_api(&ApiDocOptions::default());
//! assert_eq!(doc.routes[0].options.section.as_deref(), Some("1"));
//! assert_eq!(doc.sections.len(), 2);
//! ```

mod html;
mod markdown;
mod open_api;
mod react;
mod template;

pub use html::api_to_html;
pub use markdown::api_to_md;
pub use open_api::{api_to_open_api, path_to_open_api_path};
pub use react::api_to_react;

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::Location;
use crate::prepare::PreparedRoute;
use crate::schema::Describe;

/// Title, id and description of a documentation section.
#[derive(Debug, Clone, Default)]
pub struct SectionDef {
    pub title: String,
    pub id: Option<String>,
    pub description: Option<String>,
}

impl SectionDef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A documentation section with its nested subsections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSection {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub subsections: Vec<ApiSection>,
}

#[derive(Debug, Clone)]
pub(crate) struct MountedRoute {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) route: PreparedRoute,
    section: Option<String>,
}

/// Routes and sections of an API.
#[derive(Debug, Clone, Default)]
pub struct Api {
    routes: Vec<MountedRoute>,
    sections: Vec<ApiSection>,
}

impl Api {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `route` at `method` and `path`. Path parameters are written
    /// `:name`.
    pub fn route(&mut self, method: Method, path: impl Into<String>, route: PreparedRoute) -> &mut Self {
        self.routes.push(MountedRoute {
            method,
            path: path.into(),
            route,
            section: None,
        });
        self
    }

    pub fn get(&mut self, path: impl Into<String>, route: PreparedRoute) -> &mut Self {
        self.route(Method::GET, path, route)
    }

    pub fn post(&mut self, path: impl Into<String>, route: PreparedRoute) -> &mut Self {
        self.route(Method::POST, path, route)
    }

    pub fn put(&mut self, path: impl Into<String>, route: PreparedRoute) -> &mut Self {
        self.route(Method::PUT, path, route)
    }

    pub fn patch(&mut self, path: impl Into<String>, route: PreparedRoute) -> &mut Self {
        self.route(Method::PATCH, path, route)
    }

    pub fn delete(&mut self, path: impl Into<String>, route: PreparedRoute) -> &mut Self {
        self.route(Method::DELETE, path, route)
    }

    /// Adds a section. Routes and sections registered inside `routes`
    /// belong to it; routes get the section's index prefixed to theirs
    /// (`"1"`, `"1.0"`, ...).
    pub fn section<F>(&mut self, def: SectionDef, routes: F) -> &mut Self
    where
        F: FnOnce(&mut Api),
    {
        let first_route = self.routes.len();
        let outer = std::mem::take(&mut self.sections);
        routes(self);
        let subsections = std::mem::replace(&mut self.sections, outer);

        self.sections.push(ApiSection {
            title: def.title,
            id: def.id,
            description: def.description,
            subsections,
        });
        let index = self.sections.len() - 1;
        for mounted in &mut self.routes[first_route..] {
            mounted.section = Some(match mounted.section.take() {
                Some(inner) => format!("{}.{}", index, inner),
                None => index.to_string(),
            });
        }
        self
    }

    pub(crate) fn mounted(&self) -> &[MountedRoute] {
        &self.routes
    }

    /// Builds the plain-data documentation of the API.
    pub fn get_api(&self, options: &ApiDocOptions) -> ApiDoc {
        let mut routes: Vec<DocRoute> = self.routes.iter().map(MountedRoute::to_doc).collect();
        if let Some(filter) = &options.routes_filter {
            routes.retain(|route| filter(route));
        }

        let Some(filter) = &options.section_filter else {
            return ApiDoc {
                routes,
                sections: self.sections.clone(),
            };
        };

        let mut renumbered = HashMap::new();
        let sections = filter_sections(&self.sections, filter.as_ref(), "", "", &mut renumbered);
        let routes = routes
            .into_iter()
            .filter_map(|mut route| {
                let Some(old) = route.options.section.as_deref() else {
                    return Some(route);
                };
                match renumbered.get(old) {
                    Some(Some(new)) => {
                        route.options.section = Some(new.clone());
                        Some(route)
                    }
                    Some(None) => None,
                    None => Some(route),
                }
            })
            .collect();
        ApiDoc { routes, sections }
    }
}

/// Keeps sections matching `filter`, their subsections, and the sections on
/// the way to them. Records every old index with its new one, or `None` if
/// the section was dropped.
fn filter_sections(
    sections: &[ApiSection],
    filter: &dyn Fn(&ApiSection) -> bool,
    old_prefix: &str,
    new_prefix: &str,
    renumbered: &mut HashMap<String, Option<String>>,
) -> Vec<ApiSection> {
    let mut kept = Vec::new();
    for (index, section) in sections.iter().enumerate() {
        let old_id = format!("{}{}", old_prefix, index);
        let new_id = format!("{}{}", new_prefix, kept.len());
        let matched = filter(section);

        let keep_all = |_: &ApiSection| true;
        let sub_filter: &dyn Fn(&ApiSection) -> bool = if matched { &keep_all } else { filter };
        let subsections = filter_sections(
            &section.subsections,
            sub_filter,
            &format!("{}.", old_id),
            &format!("{}.", new_id),
            renumbered,
        );

        if matched || !subsections.is_empty() {
            renumbered.insert(old_id, Some(new_id));
            kept.push(ApiSection {
                subsections,
                ..section.clone()
            });
        } else {
            renumbered.insert(old_id, None);
        }
    }
    kept
}

/// Filters applied by [`Api::get_api`].
#[derive(Default)]
pub struct ApiDocOptions {
    pub routes_filter: Option<Box<dyn Fn(&DocRoute) -> bool + Send + Sync>>,
    pub section_filter: Option<Box<dyn Fn(&ApiSection) -> bool + Send + Sync>>,
}

impl ApiDocOptions {
    pub fn routes_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&DocRoute) -> bool + Send + Sync + 'static,
    {
        self.routes_filter = Some(Box::new(filter));
        self
    }

    pub fn section_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&ApiSection) -> bool + Send + Sync + 'static,
    {
        self.section_filter = Some(Box::new(filter));
        self
    }
}

impl fmt::Debug for ApiDocOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiDocOptions")
            .field("routes_filter", &self.routes_filter.is_some())
            .field("section_filter", &self.section_filter.is_some())
            .finish()
    }
}

/// Declared request shapes, as maps from field name to descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocAssertions {
    #[serde(default)]
    pub body: Map<String, Value>,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub query: Map<String, Value>,
}

impl DocAssertions {
    pub fn get(&self, location: Location) -> &Map<String, Value> {
        match location {
            Location::Body => &self.body,
            Location::Params => &self.params,
            Location::Query => &self.query,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocRouteOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// One documented route.
///
/// Each entry of `returns` is a descriptor of the response body with its
/// `status` merged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRoute {
    pub method: String,
    pub path: String,
    pub assertions: DocAssertions,
    pub returns: Vec<Value>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub options: DocRouteOptions,
}

/// The plain-data documentation of an API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiDoc {
    pub routes: Vec<DocRoute>,
    pub sections: Vec<ApiSection>,
}

impl MountedRoute {
    fn to_doc(&self) -> DocRoute {
        let receives = self.route.receives();
        let keys_of = |location| {
            receives
                .get(location)
                .keys()
                .map(|keys| {
                    keys.iter()
                        .map(|(k, s)| (k.clone(), s.to_descriptor()))
                        .collect()
                })
                .unwrap_or_default()
        };

        let returns = self
            .route
            .returns()
            .iter()
            .map(|ret| {
                let mut entry = Map::new();
                entry.insert("status".into(), Value::from(ret.status()));
                if let Value::Object(body) = ret.body_descriptor() {
                    entry.extend(body);
                }
                Value::Object(entry)
            })
            .collect();

        DocRoute {
            method: self.method.as_str().to_lowercase(),
            path: self.path.clone(),
            assertions: DocAssertions {
                body: keys_of(Location::Body),
                params: keys_of(Location::Params),
                query: keys_of(Location::Query),
            },
            returns,
            title: self.route.title().to_string(),
            description: self.route.description().map(String::from),
            options: DocRouteOptions {
                auth: self.route.auth().map(String::from),
                section: self.section.clone(),
            },
        }
    }
}

/// Strips the `status` of a documented return, leaving the body descriptor.
pub(crate) fn split_status(ret: &Value) -> (u16, Value) {
    let mut body = ret.as_object().cloned().unwrap_or_default();
    let status = body
        .remove("status")
        .and_then(|s| s.as_u64())
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(200);
    (status, Value::Object(body))
}

/// A short, human-readable type of a descriptor, e.g. `array of int`.
pub(crate) fn type_label(descriptor: &Value) -> String {
    let Some(map) = descriptor.as_object() else {
        return "?".to_string();
    };
    let label = match map.get("type").and_then(Value::as_str) {
        None => return map.get("value").map(Value::to_string).unwrap_or_default(),
        Some("array") => format!("array of {}", nested_label(map, "items")),
        Some("oneOf") => map
            .get("alternatives")
            .and_then(Value::as_array)
            .map(|alts| alts.iter().map(type_label).collect::<Vec<_>>().join(" | "))
            .unwrap_or_default(),
        Some("object") if map.contains_key("values") => {
            format!("object of {}", nested_label(map, "values"))
        }
        Some(tag) => tag.to_string(),
    };
    match map.get("semantic").and_then(Value::as_str) {
        Some(semantic) => format!("{} ({})", label, semantic),
        None => label,
    }
}

fn nested_label(map: &Map<String, Value>, field: &str) -> String {
    map.get(field).map(type_label).unwrap_or_default()
}

/// Whether a key descriptor must be sent.
pub(crate) fn is_required(descriptor: &Value) -> bool {
    let optional = descriptor.get("optional").and_then(Value::as_bool).unwrap_or(false);
    !optional && descriptor.get("default").is_none()
}

/// Section ids are zero-based; headings count from one.
pub(crate) fn display_number(section_id: &str) -> String {
    section_id
        .split('.')
        .map(|part| match part.parse::<usize>() {
            Ok(n) => (n + 1).to_string(),
            Err(_) => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Calls `visit` for every section, depth first, with its dotted index.
pub(crate) fn walk_sections<'a>(
    sections: &'a [ApiSection],
    prefix: &str,
    visit: &mut dyn FnMut(&str, &'a ApiSection),
) {
    for (index, section) in sections.iter().enumerate() {
        let id = format!("{}{}", prefix, index);
        visit(&id, section);
        walk_sections(&section.subsections, &format!("{}.", id), visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::{prepare, RouteOptions, RouteRequest};
    use crate::reply::{data, HandlerError, Outcome};
    use crate::schema::{int, obj, string, value};
    use serde_json::json;

    fn route(title: &str) -> PreparedRoute {
        prepare(RouteOptions::new(title), |_req: RouteRequest| async {
            Ok::<_, HandlerError>(Outcome::data("ok"))
        })
        .unwrap()
    }

    /// Introduction / Some test endpoints { Undecided, Auth { withjwt } } / error
    fn sample() -> Api {
        let mut api = Api::new();
        api.section(SectionDef::new("Introduction").description("Read me"), |_| {});
        api.section(SectionDef::new("Some test endpoints"), |api| {
            api.post("/v/1/endpoint/:id", route("endpoint"));
            api.post("/v/1/typelessendpoint", route("typeless"));
            api.section(SectionDef::new("Undecided"), |_| {});
            api.section(SectionDef::new("Auth"), |api| {
                api.put("/v/1/withjwt", route("jwt"));
            });
        });
        api.get("/v/1/error", route("error"));
        api
    }

    fn sections_of(doc: &ApiDoc) -> Vec<Option<&str>> {
        doc.routes.iter().map(|r| r.options.section.as_deref()).collect()
    }

    #[test]
    fn test_section_indices() {
        let doc = sample().get_api(&ApiDocOptions::default());
        assert_eq!(sections_of(&doc), vec![Some("1"), Some("1"), Some("1.1"), None]);
        assert_eq!(doc.sections[1].subsections.len(), 2);
        assert_eq!(doc.sections[0].description.as_deref(), Some("Read me"));
    }

    #[test]
    fn test_filter_by_parent_section() {
        let doc = sample().get_api(
            &ApiDocOptions::default()
                .routes_filter(|r| r.path == "/v/1/typelessendpoint" || r.title == "jwt")
                .section_filter(|s| s.title == "Some test endpoints"),
        );
        assert_eq!(sections_of(&doc), vec![Some("0"), Some("0.1")]);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].subsections.len(), 2);
    }

    #[test]
    fn test_filter_by_subsection_keeps_path() {
        let doc = sample().get_api(&ApiDocOptions::default().section_filter(|s| s.title == "Auth"));
        assert_eq!(sections_of(&doc), vec![Some("0"), Some("0"), Some("0.0"), None]);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Some test endpoints");
        assert_eq!(doc.sections[0].subsections[0].title, "Auth");
    }

    #[test]
    fn test_filter_drops_routes_of_removed_sections() {
        let doc = sample().get_api(&ApiDocOptions::default().section_filter(|s| s.title == "Introduction"));
        assert_eq!(sections_of(&doc), vec![None]);
        assert_eq!(doc.routes[0].path, "/v/1/error");
    }

    #[test]
    fn test_deep_section_renumbering() {
        let mut api = Api::new();
        api.section(SectionDef::new("a"), |api| {
            api.section(SectionDef::new("a.0"), |_| {});
            api.section(SectionDef::new("a.1"), |api| {
                api.section(SectionDef::new("a.1.0"), |_| {});
                api.section(SectionDef::new("a.1.1"), |api| {
                    api.get("/deep", route("deep"));
                });
            });
        });
        let doc = api.get_api(&ApiDocOptions::default());
        assert_eq!(sections_of(&doc), vec![Some("0.1.1")]);

        let doc = api.get_api(&ApiDocOptions::default().section_filter(|s| s.title == "a.1.1"));
        assert_eq!(sections_of(&doc), vec![Some("0.0.0")]);
    }

    #[test]
    fn test_doc_route_shape() {
        let prepared = prepare(
            RouteOptions::new("Testendpoint")
                .description("Does things")
                .body(obj([("name", string().default("no name").description("A name"))]))
                .params(obj([("id", int().semantic("id"))]))
                .returns(vec![data(value("ok"))]),
            |_req: RouteRequest| async { Ok::<_, HandlerError>(Outcome::data("ok")) },
        )
        .unwrap();
        let mut api = Api::new();
        api.post("/v/1/endpoint/:id", prepared);

        let doc = api.get_api(&ApiDocOptions::default());
        let route = serde_json::to_value(&doc.routes[0]).unwrap();
        assert_eq!(
            route,
            json!({
                "method": "post",
                "path": "/v/1/endpoint/:id",
                "assertions": {
                    "body": {
                        "name": { "type": "string", "default": "no name", "description": "A name" }
                    },
                    "params": { "id": { "type": "int", "semantic": "id" } },
                    "query": {}
                },
                "returns": [
                    { "status": 200, "value": "ok" },
                    {
                        "status": 400,
                        "type": "object",
                        "keys": {
                            "error": { "value": "Fieldmissmatch" },
                            "description": { "type": "string", "optional": true }
                        }
                    }
                ],
                "title": "Testendpoint",
                "description": "Does things",
                "options": {}
            })
        );
    }

    #[test]
    fn test_api_doc_deserializes() {
        let doc = sample().get_api(&ApiDocOptions::default());
        let text = serde_json::to_string(&doc).unwrap();
        let back: ApiDoc = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_type_label() {
        assert_eq!(type_label(&json!({ "type": "array", "items": { "type": "int" } })), "array of int");
        assert_eq!(type_label(&json!({ "value": "ok" })), "\"ok\"");
        assert_eq!(type_label(&json!({ "type": "int", "semantic": "id" })), "int (id)");
        assert_eq!(
            type_label(&json!({ "type": "oneOf", "alternatives": [{ "type": "int" }, { "type": "null" }] })),
            "int | null"
        );
    }

    #[test]
    fn test_display_number() {
        assert_eq!(display_number("0"), "1");
        assert_eq!(display_number("1.0.2"), "2.1.3");
    }

    #[test]
    fn test_split_status() {
        let (status, body) = split_status(&json!({ "status": 401, "value": "x" }));
        assert_eq!(status, 401);
        assert_eq!(body, json!({ "value": "x" }));
    }
}
