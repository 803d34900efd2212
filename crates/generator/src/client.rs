//! The service client: one method per selected operation

use crate::context::ServiceContext;
use crate::input::input_type;
use crate::output::output_type;
use crate::templates;
use sdkgen_common::{naming, Encoding, Operation, Result, ServiceDefinition};
use serde::Serialize;
use tera::Tera;

/// Method names the client itself already uses
const RESERVED_METHODS: &[&str] = &["new", "send", "transport"];

/// Template view of a client method
#[derive(Debug, Clone, Serialize)]
struct MethodContext {
    method: String,
    operation: String,
    input_type: String,
    output_type: Option<String>,
    documentation: Option<String>,
    errors: Vec<String>,
    deprecated: bool,
}

/// Type name of the service client, e.g. `DynamoDbClient`
pub(crate) fn client_name(service: &ServiceDefinition) -> String {
    format!("{}Client", naming::to_pascal_case(&service.metadata.service_id))
}

/// Client method name of an operation
pub(crate) fn method_name(operation: &Operation) -> String {
    let name = naming::field_ident(&operation.name);
    if RESERVED_METHODS.contains(&name.as_str()) {
        format!("{}_operation", name)
    } else {
        name
    }
}

/// Error codes an operation is modeled to return
fn error_codes(service: &ServiceDefinition, operation: &Operation) -> Vec<String> {
    operation
        .errors
        .iter()
        .map(|name| {
            service
                .structure(name)
                .and_then(|s| s.error_code.clone())
                .unwrap_or_else(|| name.clone())
        })
        .collect()
}

/// Render `client.rs`
pub(crate) fn render(cx: &ServiceContext<'_>, tera: &Tera) -> Result<String> {
    let methods: Vec<MethodContext> = cx
        .usage
        .operations
        .iter()
        .filter_map(|name| cx.service.operation(name))
        .map(|operation| MethodContext {
            method: method_name(operation),
            operation: operation.name.clone(),
            input_type: input_type(operation),
            output_type: operation.output.as_ref().map(|_| output_type(operation)),
            documentation: operation.documentation.clone(),
            errors: error_codes(cx.service, operation),
            deprecated: operation.deprecated,
        })
        .collect();

    let error_format = match cx.protocol().response_encoding() {
        Encoding::Json => "Json",
        _ => "Xml",
    };

    let mut context = tera::Context::new();
    context.insert("client_name", &client_name(cx.service));
    context.insert("service_full_name", &cx.service.metadata.service_full_name);
    context.insert("api_version", &cx.service.metadata.api_version);
    context.insert("protocol", &cx.protocol().name());
    context.insert("documentation", &cx.service.documentation);
    context.insert("error_format", error_format);
    context.insert("methods", &methods);

    templates::render(tera, "client.rs", &context)
}
