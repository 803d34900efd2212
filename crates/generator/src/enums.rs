//! Enums for string shapes carrying an `enum` list

use crate::context::ServiceContext;
use crate::templates;
use sdkgen_common::{naming, GeneratorError, Result, Shape};
use serde::Serialize;
use std::collections::BTreeSet;
use tera::Tera;

/// Template view of an enum variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct VariantContext {
    pub(crate) name: String,
    pub(crate) value: String,
}

/// Assign a distinct variant name to every value
///
/// `Unknown` is taken by the catch-all variant, values that collapse to the
/// same identifier (`us-east-1` and `US_EAST_1`) get a numeric suffix.
pub(crate) fn variants(values: &[String]) -> Vec<VariantContext> {
    let mut used = BTreeSet::from(["Unknown".to_string()]);
    let mut variants = Vec::with_capacity(values.len());

    for value in values {
        let mut base = naming::variant_ident(value);
        if base.is_empty() {
            base = "Empty".to_string();
        }
        if base == "Unknown" {
            base = "UnknownValue".to_string();
        }

        let mut name = base.clone();
        let mut counter = 2;
        while used.contains(&name) {
            name = format!("{}{}", base, counter);
            counter += 1;
        }
        used.insert(name.clone());

        variants.push(VariantContext {
            name,
            value: value.clone(),
        });
    }

    variants
}

/// Render `types/<module>.rs` for an enum shape
pub(crate) fn render(cx: &ServiceContext<'_>, tera: &Tera, shape_name: &str) -> Result<String> {
    let Shape::Scalar(scalar) = cx.types.shape(shape_name)? else {
        return Err(GeneratorError::Generation(format!(
            "Shape {} is not an enum",
            shape_name
        )));
    };

    let mut context = tera::Context::new();
    context.insert("type_name", &cx.types.type_name(shape_name));
    context.insert("documentation", &scalar.documentation);
    context.insert("variants", &variants(&scalar.enum_values));

    templates::render(tera, "enum.rs", &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::test_support;

    fn names(values: &[&str]) -> Vec<String> {
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        variants(&values).into_iter().map(|v| v.name).collect()
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(names(&["ACTIVE", "CREATING"]), vec!["Active", "Creating"]);
        assert_eq!(names(&["python3.12", "nodejs20.x"]), vec!["Python312", "Nodejs20X"]);
        assert_eq!(names(&["1.0"]), vec!["V10"]);
    }

    #[test]
    fn test_colliding_variant_names() {
        assert_eq!(
            names(&["us-east-1", "US_EAST_1", "Unknown", ""]),
            vec!["UsEast1", "UsEast12", "UnknownValue", "Empty"]
        );
    }

    #[test]
    fn test_render_enum() {
        let service = test_support::service(
            "json",
            r#"{
                "RunInput": { "type": "structure", "members": { "Status": { "shape": "TableStatus" } } },
                "RunOutput": { "type": "structure", "members": {} },
                "TableStatus": {
                    "type": "string",
                    "enum": ["CREATING", "ACTIVE"],
                    "documentation": "<p>Current state of a table.</p>"
                }
            }"#,
        );
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let tera = templates::load_templates().unwrap();

        let source = render(&cx, &tera, "TableStatus").unwrap();
        assert!(source.contains("/// Current state of a table."));
        assert!(source.contains("pub enum TableStatus {"));
        assert!(source.contains("TableStatus::Creating => \"CREATING\","));
        assert!(source.contains("\"ACTIVE\" => TableStatus::Active,"));
        assert!(source.contains("Unknown(String),"));
        assert!(source.contains("&[\"CREATING\", \"ACTIVE\"]"));
    }
}
