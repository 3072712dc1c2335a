//! Markdown export.

use eyre::Result;
use handlebars::{handlebars_helper, no_escape, Handlebars};

use super::template::{self, register};
use super::ApiDoc;

handlebars_helper!(cell: |text: str| text.replace('|', "\\|").replace('\n', " "));

const ROUTE: &str = concat!(
    "{{hashes}} {{title}}\n\n`{{method_upper}} {{path}}`\n\n",
    "{{#if description}}{{description}}\n\n",
    "{{/if}}{{#if auth}}Authentication: `{{auth}}`\n\n",
    "{{/if}}{{#each locations}}**{{name}}**\n\n",
    "| Key | Type | Required | Description |\n|---|---|---|---|{{#each keys}}\n",
    "| `{{cell key}}` | {{cell type}} | {{#if required}}yes{{else}}no{{/if}} | {{cell note}} |{{/each}}\n\n",
    "{{/each}}**Returns**{{#each returns}}\n\n",
    "- `{{status}}` {{label}}\n\n```json\n{{json}}\n```{{/each}}\n\n",
);

const PAGE: &str = concat!(
    "# {{title}}\n\n",
    "{{#if sections}}## Contents{{#each sections}}\n",
    "{{indent}}- {{number}} {{title}}{{/each}}\n\n",
    "{{/if}}{{#each sections}}{{hashes}} {{number}} {{title}}\n\n",
    "{{#if description}}{{description}}\n\n",
    "{{/if}}{{#each routes}}{{this}}{{/each}}{{/each}}{{#if other_routes}}{{#if sections}}## Other routes\n\n",
    "{{/if}}{{#each other_routes}}{{this}}{{/each}}{{/if}}",
);

fn engine() -> Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(no_escape);
    handlebars.register_helper("cell", Box::new(cell));
    register(&mut handlebars, ROUTE, PAGE)?;
    Ok(handlebars)
}

/// Renders the API as a Markdown document.
///
/// Sections become numbered headings followed by their routes; routes
/// outside every section are listed at the end.
pub fn api_to_md(api: &ApiDoc, title: &str) -> Result<String> {
    template::render_page(&engine()?, api, title)
}
