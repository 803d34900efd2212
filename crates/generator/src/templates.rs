//! Template loading and management

use crate::documentation::DocConverter;
use sdkgen_common::{naming, GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Templates of a single service crate
const CRATE_TEMPLATES: &[(&str, &str)] = &[
    ("Cargo.toml", include_str!("../templates/Cargo.toml.tera")),
    ("README.md", include_str!("../templates/README.md.tera")),
    ("lib.rs", include_str!("../templates/lib.rs.tera")),
    ("runtime.rs", include_str!("../templates/runtime.rs.tera")),
    ("client.rs", include_str!("../templates/client.rs.tera")),
    ("input.rs", include_str!("../templates/input.rs.tera")),
    ("output.rs", include_str!("../templates/output.rs.tera")),
    ("fields.rs", include_str!("../templates/fields.rs.tera")),
    ("structure.rs", include_str!("../templates/structure.rs.tera")),
    ("enum.rs", include_str!("../templates/enum.rs.tera")),
    ("module.rs", include_str!("../templates/module.rs.tera")),
    ("pagination.rs", include_str!("../templates/pagination.rs.tera")),
    ("waiters.rs", include_str!("../templates/waiters.rs.tera")),
];

/// Templates of the multi-service workspace
const WORKSPACE_TEMPLATES: &[(&str, &str)] = &[
    (
        "workspace_Cargo.toml",
        include_str!("../templates/workspace_Cargo.toml.tera"),
    ),
    (
        "workspace_README.md",
        include_str!("../templates/workspace_README.md.tera"),
    ),
];

/// Load the templates used to generate a service crate
pub fn load_templates() -> Result<Tera> {
    load(CRATE_TEMPLATES)
}

/// Load the templates used to generate a workspace of service crates
pub fn load_workspace_templates() -> Result<Tera> {
    load(WORKSPACE_TEMPLATES)
}

fn load(templates: &[(&str, &str)]) -> Result<Tera> {
    let mut tera = Tera::default();

    // Register custom filters
    let docs = DocConverter::new()?;
    tera.register_filter("rustdoc", move |value: &Value, args: &HashMap<String, Value>| {
        rustdoc_filter(&docs, value, args)
    });
    tera.register_filter("snake_case", snake_case_filter);
    tera.register_filter("pascal_case", pascal_case_filter);
    tera.register_filter("literal", literal_filter);

    for (name, source) in templates {
        tera.add_raw_template(name, source).map_err(|e| {
            GeneratorError::Generation(format!("Failed to load {} template: {}", name, e))
        })?;
    }

    Ok(tera)
}

/// Render a template, mapping tera errors into generation errors
pub fn render(tera: &Tera, name: &str, context: &tera::Context) -> Result<String> {
    tera.render(name, context).map_err(|e| {
        // tera hides the interesting part of the error in its source chain
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        GeneratorError::Generation(format!("Template error in {}: {}", name, message))
    })
}

fn as_str<'a>(value: &'a Value, filter: &str) -> tera::Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{} filter expects a string", filter)))
}

/// Filter turning AWS HTML documentation into `///` lines
///
/// `indent` gives the indentation level (four spaces each).
fn rustdoc_filter(
    docs: &DocConverter,
    value: &Value,
    args: &HashMap<String, Value>,
) -> tera::Result<Value> {
    let indent = args.get("indent").and_then(Value::as_u64).unwrap_or(0) as usize;
    let html = match value {
        Value::Null => None,
        other => Some(as_str(other, "rustdoc")?),
    };
    Ok(Value::String(docs.doc_comment(html, indent)))
}

fn snake_case_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = as_str(value, "snake_case")?;
    Ok(Value::String(naming::to_snake_case(s)))
}

fn pascal_case_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = as_str(value, "pascal_case")?;
    Ok(Value::String(naming::to_pascal_case(s)))
}

/// Filter to quote a value as a Rust string literal
fn literal_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = as_str(value, "literal")?;
    Ok(Value::String(crate::code::literal(s)))
}
