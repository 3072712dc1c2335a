//! Standalone HTML export.
//!
//! Handlebars escapes every interpolated value, so titles and descriptions
//! can carry markup characters safely.

use eyre::Result;
use handlebars::Handlebars;

use super::template::{self, register};
use super::ApiDoc;

const ROUTE: &str = r#"<article class="route">
<h{{level}}>{{title}}</h{{level}}>
<p><span class="method">{{method}}</span> <code>{{path}}</code></p>
{{#if description}}<p class="description">{{description}}</p>
{{/if}}{{#if auth}}<p>Authentication: <code>{{auth}}</code></p>
{{/if}}{{#each locations}}<h6>{{name}}</h6><table><tr><th>Key</th><th>Type</th><th>Required</th><th>Description</th></tr>
{{#each keys}}<tr><td><code>{{key}}</code></td><td>{{type}}</td><td>{{#if required}}yes{{else}}no{{/if}}</td><td>{{description}}{{#if default}} (default: <code>{{default}}</code>){{/if}}</td></tr>
{{/each}}</table>
{{/each}}<h6>Returns</h6><ul>
{{#each returns}}<li><code>{{status}}</code> {{label}}<pre>{{json}}</pre></li>
{{/each}}</ul></article>
"#;

const PAGE: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<style>
body{font-family:sans-serif;max-width:60em;margin:auto;padding:1em}
pre{background:#f4f4f4;padding:.5em;overflow:auto}
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.2em .5em}
.method{font-weight:bold;text-transform:uppercase}
.description{white-space:pre-wrap}
</style>
</head>
<body>
<h1>{{title}}</h1>
{{#if sections}}<nav><ul>
{{#each sections}}<li style="margin-left:{{margin}}em"><a href="#{{anchor}}">{{number}} {{title}}</a></li>
{{/each}}</ul></nav>
{{/if}}{{#each sections}}<h{{level}} id="{{anchor}}">{{number}} {{title}}</h{{level}}>
{{#if description}}<p class="description">{{description}}</p>
{{/if}}{{#each routes}}{{{this}}}{{/each}}{{/each}}{{#if other_routes}}{{#if sections}}<h2>Other routes</h2>
{{/if}}{{#each other_routes}}{{{this}}}{{/each}}{{/if}}</body>
</html>
"##;

fn engine() -> Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    register(&mut handlebars, ROUTE, PAGE)?;
    Ok(handlebars)
}

/// Renders the API as a single HTML page with inline styles.
pub fn api_to_html(api: &ApiDoc, title: &str) -> Result<String> {
    template::render_page(&engine()?, api, title)
}
