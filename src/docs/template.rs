//! Handlebars plumbing shared by the Markdown and HTML exports.
//!
//! Routes are rendered one by one (in parallel) with the `route` template,
//! then placed into the `page` template under their section.

use eyre::{eyre, Result};
use handlebars::Handlebars;
use rayon::prelude::*;
use serde_json::{json, Map, Value};

use super::{display_number, is_required, split_status, type_label, walk_sections, ApiDoc, DocRoute};
use crate::path::Location;

pub(crate) const ROUTE: &str = "route";
pub(crate) const PAGE: &str = "page";

/// Registers the `route` and `page` templates on `handlebars`.
pub(crate) fn register(handlebars: &mut Handlebars<'static>, route: &str, page: &str) -> Result<()> {
    handlebars
        .register_template_string(ROUTE, route)
        .map_err(|e| eyre!("Failed to register route template: {}", e))?;
    handlebars
        .register_template_string(PAGE, page)
        .map_err(|e| eyre!("Failed to register page template: {}", e))?;
    Ok(())
}

fn key_rows(keys: &Map<String, Value>) -> Vec<Value> {
    keys.iter()
        .map(|(key, descriptor)| {
            let description = descriptor
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let default = descriptor.get("default").map(Value::to_string);
            let note = match &default {
                Some(default) if description.is_empty() => format!("(default: `{}`)", default),
                Some(default) => format!("{} (default: `{}`)", description, default),
                None => description.to_string(),
            };
            json!({
                "key": key,
                "type": type_label(descriptor),
                "required": is_required(descriptor),
                "description": description,
                "default": default,
                "note": note,
            })
        })
        .collect()
}

fn route_context(route: &DocRoute) -> Value {
    let level = route
        .options
        .section
        .as_deref()
        .map_or(3, |id| id.split('.').count() + 2)
        .min(6);
    let locations: Vec<Value> = Location::ALL
        .into_iter()
        .filter_map(|location| {
            let keys = route.assertions.get(location);
            (!keys.is_empty()).then(|| json!({ "name": location.as_str(), "keys": key_rows(keys) }))
        })
        .collect();
    let returns: Vec<Value> = route
        .returns
        .iter()
        .map(|ret| {
            let (status, body) = split_status(ret);
            json!({
                "status": status,
                "label": type_label(&body),
                "json": serde_json::to_string_pretty(&body).unwrap_or_default(),
            })
        })
        .collect();

    json!({
        "level": level,
        "hashes": "#".repeat(level),
        "title": route.title,
        "method": route.method,
        "method_upper": route.method.to_uppercase(),
        "path": route.path,
        "description": route.description,
        "auth": route.options.auth,
        "locations": locations,
        "returns": returns,
    })
}

/// Renders every route with the `route` template, then the whole `page`.
///
/// Sections are flattened depth first; each carries its heading level,
/// anchor, display number and the routes rendered inside it. Routes outside
/// every section end up in `other_routes`.
pub(crate) fn render_page(handlebars: &Handlebars<'static>, api: &ApiDoc, title: &str) -> Result<String> {
    let rendered = api
        .routes
        .par_iter()
        .map(|route| handlebars.render(ROUTE, &route_context(route)))
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| eyre!("Failed to render route: {}", e))?;
    let routes_in = |section: Option<&str>| -> Vec<&str> {
        api.routes
            .iter()
            .zip(&rendered)
            .filter(|(route, _)| route.options.section.as_deref() == section)
            .map(|(_, text)| text.as_str())
            .collect()
    };

    let mut sections = Vec::new();
    walk_sections(&api.sections, "", &mut |id, section| {
        let depth = id.split('.').count();
        let level = (depth + 1).min(6);
        sections.push(json!({
            "level": level,
            "hashes": "#".repeat(level),
            "indent": "  ".repeat(depth - 1),
            "margin": (depth - 1) * 2,
            "anchor": format!("section-{}", id.replace('.', "-")),
            "number": display_number(id),
            "title": section.title,
            "description": section.description,
            "routes": routes_in(Some(id)),
        }));
    });

    let context = json!({
        "title": title,
        "sections": sections,
        "other_routes": routes_in(None),
    });
    handlebars
        .render(PAGE, &context)
        .map_err(|e| eyre!("Failed to render page: {}", e))
}
