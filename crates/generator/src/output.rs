//! Operation outputs: response parsing

use crate::code::{literal, Code};
use crate::context::ServiceContext;
use crate::deserialize;
use crate::templates;
use crate::value_object::fields;
use sdkgen_common::{
    naming, Encoding, GeneratorError, Location, Member, Operation, Result, ScalarKind, Shape,
    StructureShape,
};
use tera::Tera;

/// Type name of an operation's output
pub(crate) fn output_type(operation: &Operation) -> String {
    format!("{}Output", naming::type_ident(&operation.name))
}

/// Render `output/<operation>.rs`; operations without an output shape have none
pub(crate) fn render(cx: &ServiceContext<'_>, tera: &Tera, operation: &Operation) -> Result<Option<String>> {
    let Some(output) = cx.service.output_of(operation) else {
        return Ok(None);
    };

    let mut code = Code::new(1);
    from_response(cx, operation, output, &mut code)?;

    let mut context = tera::Context::new();
    context.insert("type_name", &output_type(operation));
    context.insert("operation", &operation.name);
    context.insert("fields", &fields(cx, output)?);
    context.insert("methods", &code.finish());

    templates::render(tera, "output.rs", &context).map(Some)
}

fn from_response(
    cx: &ServiceContext<'_>,
    operation: &Operation,
    output: &StructureShape,
    code: &mut Code,
) -> Result<()> {
    if output.members.is_empty() {
        code.open("pub(crate) fn from_response(_response: &runtime::Response) -> Result<Self, runtime::Error> {");
        code.line("Ok(Self::default())");
        code.close("}");
        return Ok(());
    }

    code.open("pub(crate) fn from_response(response: &runtime::Response) -> Result<Self, runtime::Error> {");
    code.line("let mut output = Self::default();");

    match output.payload_member() {
        Some(member) => payload(cx, output, member, code)?,
        None => body(cx, operation, output, code)?,
    }

    for member in &output.members {
        let field = naming::field_ident(&member.name);
        let format = cx.timestamp_format(&member.shape, Some(member));

        match member.location {
            Location::Header => code.line(format!(
                "output.{} = response.header({}).map(|value| {}).transpose()?;",
                field,
                literal(member.wire_name()),
                deserialize::header_expr(cx, &member.shape, "value", format)?
            )),
            Location::Headers => {
                let Shape::Map(map) = cx.types.shape(&member.shape)? else {
                    return Err(GeneratorError::Generation(format!(
                        "Member {}.{} binds headers to a non-map shape",
                        output.name, member.name
                    )));
                };
                code.line(format!(
                    "let prefixed = response.headers_with_prefix({});",
                    literal(member.wire_name())
                ));
                code.open("if !prefixed.is_empty() {");
                code.line(format!(
                    "output.{} = Some(prefixed.iter().map(|(key, value)| {}.map(|parsed| (key.clone(), parsed))).collect::<Result<_, runtime::Error>>()?);",
                    field,
                    deserialize::text_expr(cx, &map.value.shape, "value", format)?
                ));
                code.close("}");
            }
            Location::StatusCode => {
                code.line(format!("output.{} = Some(response.status.into());", field));
            }
            Location::Body | Location::Uri | Location::Querystring => {}
        }
    }

    code.line("Ok(output)");
    code.close("}");
    Ok(())
}

/// The member bound to the whole body
fn payload(
    cx: &ServiceContext<'_>,
    output: &StructureShape,
    member: &Member,
    code: &mut Code,
) -> Result<()> {
    let field = naming::field_ident(&member.name);
    let boxed = |expr: String| {
        if cx.types.is_boxed(output, member) {
            format!("Box::new({})", expr)
        } else {
            expr
        }
    };

    match cx.types.shape(&member.shape)? {
        Shape::Scalar(scalar) => match scalar.kind {
            ScalarKind::Blob => code.line(format!("output.{} = Some(response.body.clone());", field)),
            ScalarKind::Document => code.line(format!("output.{} = Some(response.json()?);", field)),
            _ if cx.types.is_enum(&member.shape) => code.line(format!(
                "output.{} = Some({}::from(response.text()?));",
                field,
                cx.types.type_path(&member.shape)
            )),
            _ => code.line(format!("output.{} = Some(response.text()?);", field)),
        },
        Shape::Structure(_) => {
            let type_path = cx.types.type_path(&member.shape);
            match cx.protocol().response_encoding() {
                Encoding::Json => code.line(format!(
                    "output.{} = Some({});",
                    field,
                    boxed(format!("{}::from_json(&response.json()?)?", type_path))
                )),
                _ => {
                    code.line("let text = response.text()?;");
                    code.open("if let Some(document) = runtime::xml::parse(&text)? {");
                    code.line(format!(
                        "output.{} = Some({});",
                        field,
                        boxed(format!("{}::from_xml(document.root_element())?", type_path))
                    ));
                    code.close("}");
                }
            }
        }
        Shape::List(_) | Shape::Map(_) => {
            return Err(GeneratorError::Generation(format!(
                "Payload {}.{} must be a structure, blob or string",
                output.name, member.name
            )))
        }
    }

    Ok(())
}

/// Members read from the body of the response
fn body(
    cx: &ServiceContext<'_>,
    operation: &Operation,
    output: &StructureShape,
    code: &mut Code,
) -> Result<()> {
    let members = cx.body_members(output);
    if members.is_empty() {
        return Ok(());
    }

    match cx.protocol().response_encoding() {
        Encoding::Json => {
            code.line("let body = response.json()?;");
            code.line("let object = runtime::json::object(&body)?;");
            for member in members {
                code.line(format!(
                    "output.{} = {};",
                    naming::field_ident(&member.name),
                    deserialize::json::member_expr(cx, output, member, "object")?
                ));
            }
        }
        _ => {
            code.line("let text = response.text()?;");
            code.open("if let Some(document) = runtime::xml::parse(&text)? {");
            match &operation.result_wrapper {
                Some(wrapper) => code.line(format!(
                    "let node = runtime::xml::unwrap_result(document.root_element(), Some({}));",
                    literal(wrapper)
                )),
                None => code.line("let node = document.root_element();"),
            }
            for member in members {
                code.line(format!(
                    "output.{} = {};",
                    naming::field_ident(&member.name),
                    deserialize::xml::member_expr(cx, output, member, "node")?
                ));
            }
            code.close("}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdkgen_parser::ServiceParser;

    fn render_output(protocol: &str, operation: &str, shapes: &str) -> Option<String> {
        let json = format!(
            r#"{{
                "metadata": {{
                    "apiVersion": "2012-11-05",
                    "endpointPrefix": "example",
                    "protocol": "{}",
                    "serviceId": "Example"
                }},
                "operations": {},
                "shapes": {}
            }}"#,
            protocol, operation, shapes
        );
        let service = ServiceParser::from_json(&json).unwrap().parse().unwrap();
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let tera = templates::load_templates().unwrap();
        let operation = service.operations.values().next().unwrap();
        render(&cx, &tera, operation).unwrap()
    }

    #[test]
    fn test_query_result_wrapper() {
        let source = render_output(
            "query",
            r#"{ "CreateQueue": {
                "name": "CreateQueue",
                "output": { "shape": "CreateQueueResult", "resultWrapper": "CreateQueueResult" }
            } }"#,
            r#"{
                "CreateQueueResult": {
                    "type": "structure",
                    "members": { "QueueUrl": { "shape": "Name" } }
                },
                "Name": { "type": "string" }
            }"#,
        )
        .unwrap();

        assert!(source.contains("pub struct CreateQueueOutput {"));
        assert!(source.contains("let node = runtime::xml::unwrap_result(document.root_element(), Some(\"CreateQueueResult\"));"));
        assert!(source.contains("output.queue_url = runtime::xml::child(node, \"QueueUrl\")"));
    }

    #[test]
    fn test_rest_bindings() {
        let source = render_output(
            "rest-xml",
            r#"{ "GetObject": {
                "name": "GetObject",
                "http": { "method": "GET", "requestUri": "/" },
                "output": { "shape": "GetObjectOutput" }
            } }"#,
            r#"{
                "GetObjectOutput": {
                    "type": "structure",
                    "members": {
                        "Body": { "shape": "Body", "streaming": true },
                        "ContentLength": { "shape": "Long", "location": "header", "locationName": "Content-Length" },
                        "Metadata": { "shape": "Metadata", "location": "headers", "locationName": "x-amz-meta-" }
                    },
                    "payload": "Body"
                },
                "Metadata": { "type": "map", "key": { "shape": "Name" }, "value": { "shape": "Name" } },
                "Body": { "type": "blob" },
                "Long": { "type": "long" },
                "Name": { "type": "string" }
            }"#,
        )
        .unwrap();

        assert!(source.contains("output.body = Some(response.body.clone());"));
        assert!(source.contains("output.content_length = response.header(\"Content-Length\").map(|value| runtime::text::number::<i64>(value)).transpose()?;"));
        assert!(source.contains("let prefixed = response.headers_with_prefix(\"x-amz-meta-\");"));
    }

    #[test]
    fn test_status_code_and_json_body() {
        let source = render_output(
            "rest-json",
            r#"{ "Invoke": {
                "name": "Invoke",
                "http": { "method": "POST", "requestUri": "/" },
                "output": { "shape": "InvocationResponse" }
            } }"#,
            r#"{
                "InvocationResponse": {
                    "type": "structure",
                    "members": {
                        "StatusCode": { "shape": "Integer", "location": "statusCode" },
                        "ExecutedVersion": { "shape": "Name" }
                    }
                },
                "Integer": { "type": "integer" },
                "Name": { "type": "string" }
            }"#,
        )
        .unwrap();

        assert!(source.contains("output.status_code = Some(response.status.into());"));
        assert!(source.contains("let object = runtime::json::object(&body)?;"));
        assert!(source.contains("output.executed_version = runtime::json::field(object, \"ExecutedVersion\")"));
    }

    #[test]
    fn test_operation_without_output() {
        let source = render_output(
            "query",
            r#"{ "DeleteQueue": { "name": "DeleteQueue" } }"#,
            "{}",
        );
        assert!(source.is_none());
    }
}
