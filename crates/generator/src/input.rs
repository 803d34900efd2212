//! Operation inputs: builders, validation and request serialization

use crate::code::{literal, Code};
use crate::context::ServiceContext;
use crate::serialize::{self, xml::namespace_arg};
use crate::templates;
use crate::value_object::{fields, validate_method};
use sdkgen_common::{
    naming, Location, Member, Operation, Protocol, Result, ScalarKind, Shape, StructureShape,
};
use tera::Tera;

/// Type name of an operation's input
pub(crate) fn input_type(operation: &Operation) -> String {
    format!("{}Input", naming::type_ident(&operation.name))
}

/// Render `input/<operation>.rs`
pub(crate) fn render(cx: &ServiceContext<'_>, tera: &Tera, operation: &Operation) -> Result<String> {
    let input = cx.service.input_of(operation);

    let mut code = Code::new(1);
    let validates = match input {
        Some(structure) => validate_method(structure, &mut code),
        None => false,
    };
    if validates {
        code.line("");
    }
    request_method(cx, operation, input, validates, &mut code)?;

    let mut context = tera::Context::new();
    context.insert("type_name", &input_type(operation));
    context.insert("operation", &operation.name);
    context.insert(
        "fields",
        &match input {
            Some(structure) => fields(cx, structure)?,
            None => Vec::new(),
        },
    );
    context.insert("methods", &code.finish());

    templates::render(tera, "input.rs", &context)
}

fn request_method(
    cx: &ServiceContext<'_>,
    operation: &Operation,
    input: Option<&StructureShape>,
    validates: bool,
    code: &mut Code,
) -> Result<()> {
    code.line(format!(
        "/// Build the HTTP request of the `{}` operation",
        operation.name
    ));
    code.open("pub fn request(&self) -> Result<runtime::Request, runtime::Error> {");

    if let Some(input) = input {
        idempotency_tokens(input, code);
    }
    if validates {
        code.line("self.validate()?;");
    }

    let path = request_path(cx, operation, input, code)?;

    let mut body = Code::new(2);
    for (key, value) in operation.http.static_query() {
        body.line(format!(
            "request.query_param({}, {});",
            literal(&key),
            literal(&value)
        ));
    }
    if let Some(input) = input {
        if cx.protocol().is_rest() {
            bindings(cx, input, &mut body)?;
        }
    }
    match cx.protocol() {
        Protocol::Json => json_body(cx, operation, input, &mut body)?,
        Protocol::RestJson => rest_json_body(cx, input, &mut body)?,
        Protocol::RestXml => rest_xml_body(cx, input, &mut body)?,
        Protocol::Query | Protocol::Ec2 => query_body(cx, operation, input, &mut body)?,
    }

    let binding = if body.is_empty() { "let request" } else { "let mut request" };
    code.line(format!(
        "{} = runtime::Request::new({}, {});",
        binding,
        literal(&operation.http.method),
        path
    ));
    code.extend(body);
    code.line("Ok(request)");
    code.close("}");
    Ok(())
}

/// Fill unset idempotency tokens on a copy and build that instead
fn idempotency_tokens(input: &StructureShape, code: &mut Code) {
    let tokens: Vec<String> = input
        .members
        .iter()
        .filter(|m| m.idempotency_token)
        .map(|m| naming::field_ident(&m.name))
        .collect();
    if tokens.is_empty() {
        return;
    }

    let condition = tokens
        .iter()
        .map(|field| format!("self.{}.is_none()", field))
        .collect::<Vec<_>>()
        .join(" || ");
    code.open(format!("if {} {{", condition));
    code.line("let mut input = self.clone();");
    for field in &tokens {
        if tokens.len() == 1 {
            code.line(format!("input.{} = Some(runtime::idempotency_token());", field));
        } else {
            code.open(format!("if input.{}.is_none() {{", field));
            code.line(format!("input.{} = Some(runtime::idempotency_token());", field));
            code.close("}");
        }
    }
    code.line("return input.request();");
    code.close("}");
}

/// Emit the URI label bindings and return the path expression
fn request_path(
    cx: &ServiceContext<'_>,
    operation: &Operation,
    input: Option<&StructureShape>,
    code: &mut Code,
) -> Result<String> {
    let placeholders = operation.http.uri_placeholders();
    let path = operation.http.path();
    if placeholders.is_empty() {
        return Ok(literal(path));
    }

    let mut template = path.to_string();
    let mut args = Vec::new();

    for (index, (name, greedy)) in placeholders.iter().enumerate() {
        let member = input
            .and_then(|input| {
                input
                    .members
                    .iter()
                    .find(|m| m.location == Location::Uri && m.wire_name() == name)
            })
            .ok_or_else(|| {
                sdkgen_common::GeneratorError::Generation(format!(
                    "Operation {} has no uri member for {{{}}}",
                    operation.name, name
                ))
            })?;
        let shape_name = input.map(|s| s.name.as_str()).unwrap_or_default();

        let label = format!("label{}", index);
        code.line(format!(
            "let {} = self.{}.as_ref().ok_or(runtime::Error::MissingParameter {{ shape: {}, member: {} }})?;",
            label,
            naming::field_ident(&member.name),
            literal(shape_name),
            literal(&member.name)
        ));

        let placeholder = if *greedy {
            format!("{{{}+}}", name)
        } else {
            format!("{{{}}}", name)
        };
        template = template.replacen(&placeholder, "{}", 1);

        let format = cx.timestamp_format(&member.shape, Some(member));
        args.push(format!(
            "runtime::uri_encode(&{}, {})",
            serialize::scalar_text(cx, &member.shape, &label, format)?,
            greedy
        ));
    }

    Ok(format!("format!({}, {})", literal(&template), args.join(", ")))
}

/// Header, prefixed header map and query string members
fn bindings(cx: &ServiceContext<'_>, input: &StructureShape, code: &mut Code) -> Result<()> {
    for member in &input.members {
        let field = naming::field_ident(&member.name);
        let format = cx.timestamp_format(&member.shape, Some(member));
        let name = literal(member.wire_name());

        match member.location {
            Location::Header => {
                code.open(format!("if let Some(value) = &self.{} {{", field));
                code.line(format!(
                    "request.header({}, {});",
                    name,
                    serialize::header_text(cx, &member.shape, "value", format)?
                ));
                code.close("}");
            }
            Location::Headers => {
                let Shape::Map(map) = cx.types.shape(&member.shape)? else {
                    continue;
                };
                code.open(format!("if let Some(value) = &self.{} {{", field));
                code.open("for (key, item) in value.iter() {");
                code.line(format!(
                    "request.header(format!(\"{{}}{{}}\", {}, key), {});",
                    name,
                    serialize::scalar_text(cx, &map.value.shape, "item", format)?
                ));
                code.close("}");
                code.close("}");
            }
            Location::Querystring => {
                code.open(format!("if let Some(value) = &self.{} {{", field));
                query_string(cx, &member.shape, &name, format, code)?;
                code.close("}");
            }
            Location::Body | Location::Uri | Location::StatusCode => {}
        }
    }

    Ok(())
}

fn query_string(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    name: &str,
    format: sdkgen_common::TimestampFormat,
    code: &mut Code,
) -> Result<()> {
    match cx.types.shape(shape_name)? {
        Shape::List(list) => {
            code.open("for item in value.iter() {");
            code.line(format!(
                "request.query_param({}, {});",
                name,
                serialize::scalar_text(cx, &list.member.shape, "item", format)?
            ));
            code.close("}");
        }
        Shape::Map(map) => {
            code.open("for (key, item) in value.iter() {");
            match cx.types.shape(&map.value.shape)? {
                Shape::List(list) => {
                    code.open("for item in item.iter() {");
                    code.line(format!(
                        "request.query_param(key.clone(), {});",
                        serialize::scalar_text(cx, &list.member.shape, "item", format)?
                    ));
                    code.close("}");
                }
                _ => code.line(format!(
                    "request.query_param(key.clone(), {});",
                    serialize::scalar_text(cx, &map.value.shape, "item", format)?
                )),
            }
            code.close("}");
        }
        _ => code.line(format!(
            "request.query_param({}, {});",
            name,
            serialize::scalar_text(cx, shape_name, "value", format)?
        )),
    }
    Ok(())
}

fn json_body(
    cx: &ServiceContext<'_>,
    operation: &Operation,
    input: Option<&StructureShape>,
    code: &mut Code,
) -> Result<()> {
    let metadata = &cx.service.metadata;
    if let Some(prefix) = &metadata.target_prefix {
        code.line(format!(
            "request.header(\"X-Amz-Target\", {});",
            literal(&format!("{}.{}", prefix, operation.name))
        ));
    }
    code.line(format!(
        "request.header(\"Content-Type\", {});",
        literal(&format!(
            "application/x-amz-json-{}",
            metadata.json_version.as_deref().unwrap_or("1.0")
        ))
    ));

    let members: Vec<&Member> = input.map(|s| cx.body_members(s)).unwrap_or_default();
    serialize::json::write_members(cx, &members, "self", code)?;
    code.line("request.body = runtime::json::to_bytes(&serde_json::Value::Object(object));");
    Ok(())
}

/// Raw blob, string or document payloads shared by the rest protocols
///
/// Returns false when the payload is a structure.
fn raw_payload(
    cx: &ServiceContext<'_>,
    member: &Member,
    field: &str,
    code: &mut Code,
) -> Result<bool> {
    let Shape::Scalar(scalar) = cx.types.shape(&member.shape)? else {
        return Ok(false);
    };

    code.open(format!("if let Some(value) = &self.{} {{", field));
    match scalar.kind {
        ScalarKind::Blob => code.line("request.body = value.clone();"),
        ScalarKind::Document => {
            code.line("request.header(\"Content-Type\", \"application/json\");");
            code.line("request.body = runtime::json::to_bytes(value);");
        }
        _ => code.line("request.body = value.to_string().into_bytes();"),
    }
    code.close("}");
    Ok(true)
}

fn rest_json_body(
    cx: &ServiceContext<'_>,
    input: Option<&StructureShape>,
    code: &mut Code,
) -> Result<()> {
    let Some(input) = input else {
        return Ok(());
    };

    if let Some(member) = input.payload_member() {
        let field = naming::field_ident(&member.name);
        if !raw_payload(cx, member, &field, code)? {
            code.open(format!("if let Some(value) = &self.{} {{", field));
            code.line("request.header(\"Content-Type\", \"application/json\");");
            code.line("request.body = runtime::json::to_bytes(&value.to_json()?);");
            code.close("}");
        }
        return Ok(());
    }

    let members = cx.body_members(input);
    if members.is_empty() {
        return Ok(());
    }
    code.line("request.header(\"Content-Type\", \"application/json\");");
    serialize::json::write_members(cx, &members, "self", code)?;
    code.line("request.body = runtime::json::to_bytes(&serde_json::Value::Object(object));");
    Ok(())
}

fn rest_xml_body(
    cx: &ServiceContext<'_>,
    input: Option<&StructureShape>,
    code: &mut Code,
) -> Result<()> {
    let Some(input) = input else {
        return Ok(());
    };

    if let Some(member) = input.payload_member() {
        let field = naming::field_ident(&member.name);
        if raw_payload(cx, member, &field, code)? {
            return Ok(());
        }

        let structure = cx.service.structure(&member.shape);
        let root = member
            .location_name
            .as_deref()
            .or(structure.and_then(|s| s.location_name.as_deref()))
            .unwrap_or(&member.name);
        let namespace = member
            .xml_namespace
            .as_ref()
            .or(structure.and_then(|s| s.xml_namespace.as_ref()));

        code.open(format!("if let Some(value) = &self.{} {{", field));
        code.line("let mut body = String::new();");
        code.line(format!(
            "value.write_xml({}, {}, &mut body)?;",
            literal(root),
            namespace_arg(namespace)
        ));
        code.line("request.header(\"Content-Type\", \"application/xml\");");
        code.line("request.body = body.into_bytes();");
        code.close("}");
        return Ok(());
    }

    let members = cx.body_members(input);
    if members.is_empty() {
        return Ok(());
    }

    let root = input.location_name.as_deref().unwrap_or(&input.name);
    code.line("let mut body = String::new();");
    code.line("let out = &mut body;");
    code.line(format!("out.push_str({});", literal(&format!("<{}", root))));
    if let Some(namespace) = &input.xml_namespace {
        code.line(format!(
            "out.push_str({});",
            literal(&format!(" {}", namespace.attribute()))
        ));
    }
    serialize::xml::write_attributes(cx, &members, "self", code)?;
    code.line("out.push('>');");
    serialize::xml::write_elements(cx, &members, "self", code)?;
    code.line(format!("out.push_str({});", literal(&format!("</{}>", root))));
    code.line("request.header(\"Content-Type\", \"application/xml\");");
    code.line("request.body = body.into_bytes();");
    Ok(())
}

fn query_body(
    cx: &ServiceContext<'_>,
    operation: &Operation,
    input: Option<&StructureShape>,
    code: &mut Code,
) -> Result<()> {
    let members: Vec<&Member> = input.map(|s| cx.body_members(s)).unwrap_or_default();

    let binding = if members.is_empty() { "let params" } else { "let mut params" };
    code.open(format!("{} = vec![", binding));
    code.line(format!(
        "(\"Action\".to_string(), {}.to_string()),",
        literal(&operation.name)
    ));
    code.line(format!(
        "(\"Version\".to_string(), {}.to_string()),",
        literal(&cx.service.metadata.api_version)
    ));
    code.close("];");
    if !members.is_empty() {
        // Structure members append through `to_query(&key, params)`
        code.line("let params = &mut params;");
    }
    serialize::query::write_members(cx, &members, "self", "\"\"", code)?;
    code.line("request.header(\"Content-Type\", \"application/x-www-form-urlencoded; charset=utf-8\");");
    code.line("request.body = runtime::form_encode(&params).into_bytes();");
    Ok(())
}
