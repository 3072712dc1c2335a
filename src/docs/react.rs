//! React component export.
//!
//! The generated module has no build step of its own: it uses
//! `React.createElement` directly and embeds the documentation as a JSON
//! literal.

use serde_json::Value;

use super::ApiDoc;

const COMPONENT: &str = r#"const h = React.createElement;

const number = (id) =>
  id.split(".").map((part) => Number(part) + 1).join(".");

function Keys({ name, keys }) {
  const entries = Object.entries(keys || {});
  if (entries.length === 0) return null;
  return h("div", null,
    h("h6", null, name),
    h("table", null,
      h("tbody", null,
        entries.map(([key, d]) =>
          h("tr", { key },
            h("td", null, h("code", null, key)),
            h("td", null, d.type || JSON.stringify(d.value)),
            h("td", null, d.optional || d.default !== undefined ? "no" : "yes"),
            h("td", null, d.description || ""))))));
}

function Route({ route }) {
  return h("article", { className: "route" },
    h("h4", null, route.title),
    h("p", null, h("b", null, route.method.toUpperCase()), " ", h("code", null, route.path)),
    route.description ? h("p", { style: { whiteSpace: "pre-wrap" } }, route.description) : null,
    route.options.auth ? h("p", null, "Authentication: ", h("code", null, route.options.auth)) : null,
    h(Keys, { name: "body", keys: route.assertions.body }),
    h(Keys, { name: "params", keys: route.assertions.params }),
    h(Keys, { name: "query", keys: route.assertions.query }),
    h("h6", null, "Returns"),
    h("ul", null,
      route.returns.map(({ status, ...body }, i) =>
        h("li", { key: i },
          h("code", null, status),
          h("pre", null, JSON.stringify(body, null, 2))))));
}

function Section({ section, id }) {
  const routes = api.routes.filter((r) => r.options.section === id);
  return h("section", { id: "section-" + id.replace(/\./g, "-") },
    h("h3", null, number(id) + " " + section.title),
    section.description ? h("p", { style: { whiteSpace: "pre-wrap" } }, section.description) : null,
    routes.map((route) => h(Route, { key: route.method + route.path, route })),
    (section.subsections || []).map((sub, i) =>
      h(Section, { key: i, section: sub, id: id + "." + i })));
}

export default function ApiDocs() {
  const unsectioned = api.routes.filter((r) => r.options.section === undefined);
  return h("div", null,
    h("h1", null, title),
    api.sections.map((section, i) => h(Section, { key: i, section, id: String(i) })),
    unsectioned.map((route) => h(Route, { key: route.method + route.path, route })));
}
"#;

/// Renders the API as an ES module exporting a React component.
///
/// ```rust
/// use apiprep::docs::{api_to_react, ApiDoc};
///
/// let module = api_to_react(&ApiDoc::default(), "My API").unwrap();
/// assert!(module.contains("export default function ApiDocs()"));
/// assert!(module.contains("const title = \"My API\";"));
/// ```
pub fn api_to_react(api: &ApiDoc, title: &str) -> serde_json::Result<String> {
    let data = serde_json::to_string(api)?;
    let title = serde_json::to_string(&Value::from(title))?;
    Ok(format!(
        "import React from \"react\";\n\nconst api = {};\nconst title = {};\n\n{}",
        data, title, COMPONENT
    ))
}
