//! Value objects: one struct per structure shape reachable from the selected operations

use crate::code::{literal, Code};
use crate::context::ServiceContext;
use crate::templates;
use crate::{deserialize, serialize};
use sdkgen_common::{naming, Encoding, Member, Result, StructureShape};
use serde::Serialize;
use tera::Tera;

/// Template view of a struct field
#[derive(Debug, Clone, Serialize)]
pub(crate) struct FieldContext {
    pub(crate) ident: String,
    pub(crate) setter: String,
    /// Field type inside the `Option`
    pub(crate) rust_type: String,
    /// Type accepted by the builder method
    pub(crate) value_type: String,
    pub(crate) boxed: bool,
    pub(crate) documentation: Option<String>,
    pub(crate) deprecated: bool,
}

/// Fields of a generated struct, one per member
pub(crate) fn fields(cx: &ServiceContext<'_>, structure: &StructureShape) -> Result<Vec<FieldContext>> {
    structure
        .members
        .iter()
        .map(|member| {
            Ok(FieldContext {
                ident: naming::field_ident(&member.name),
                setter: format!("with_{}", naming::to_snake_case(&member.name)),
                rust_type: cx.types.member_type(structure, member)?,
                value_type: cx.types.rust_type(&member.shape)?,
                boxed: cx.types.is_boxed(structure, member),
                documentation: member.documentation.clone(),
                deprecated: member.deprecated,
            })
        })
        .collect()
}

/// Emit `validate()` over the required members; false when nothing is required
pub(crate) fn validate_method(structure: &StructureShape, code: &mut Code) -> bool {
    let required: Vec<&Member> = structure.members.iter().filter(|m| m.required).collect();
    if required.is_empty() {
        return false;
    }

    code.line("/// Check that every required member is set");
    code.open("pub fn validate(&self) -> Result<(), runtime::Error> {");
    for member in required {
        code.line(format!(
            "runtime::required(&self.{}, {}, {})?;",
            naming::field_ident(&member.name),
            literal(&structure.name),
            literal(&member.name)
        ));
    }
    code.line("Ok(())");
    code.close("}");
    true
}

/// Render `types/<module>.rs` for a structure
pub(crate) fn render(cx: &ServiceContext<'_>, tera: &Tera, structure: &StructureShape) -> Result<String> {
    let mut code = Code::new(1);
    let validates = validate_method(structure, &mut code);
    let members: Vec<&Member> = structure.members.iter().collect();

    if cx.usage.serialized.contains(&structure.name) {
        if !code.is_empty() {
            code.line("");
        }
        match cx.protocol().request_encoding() {
            Encoding::Json => json_writer(cx, &members, validates, &mut code)?,
            Encoding::Xml => xml_writer(cx, &members, validates, &mut code)?,
            Encoding::Query => query_writer(cx, &members, validates, &mut code)?,
        }
    }

    if cx.usage.parsed.contains(&structure.name) {
        if !code.is_empty() {
            code.line("");
        }
        match cx.protocol().response_encoding() {
            Encoding::Json => json_reader(cx, structure, &mut code)?,
            _ => xml_reader(cx, structure, &mut code)?,
        }
    }

    let mut context = tera::Context::new();
    context.insert("type_name", &cx.types.type_name(&structure.name));
    context.insert("shape_name", &structure.name);
    context.insert("documentation", &structure.documentation);
    context.insert("deprecated", &structure.deprecated);
    context.insert("union", &structure.union);
    context.insert("fields", &fields(cx, structure)?);
    context.insert("methods", &code.finish());

    templates::render(tera, "structure.rs", &context)
}

fn json_writer(
    cx: &ServiceContext<'_>,
    members: &[&Member],
    validates: bool,
    code: &mut Code,
) -> Result<()> {
    code.open("pub(crate) fn to_json(&self) -> Result<serde_json::Value, runtime::Error> {");
    if validates {
        code.line("self.validate()?;");
    }
    serialize::json::write_members(cx, members, "self", code)?;
    code.line("Ok(serde_json::Value::Object(object))");
    code.close("}");
    Ok(())
}

fn xml_writer(
    cx: &ServiceContext<'_>,
    members: &[&Member],
    validates: bool,
    code: &mut Code,
) -> Result<()> {
    code.open("pub(crate) fn write_xml(&self, name: &str, xmlns: Option<&str>, out: &mut String) -> Result<(), runtime::Error> {");
    if validates {
        code.line("self.validate()?;");
    }
    code.line("out.push('<');");
    code.line("out.push_str(name);");
    code.open("if let Some(xmlns) = xmlns {");
    code.line("out.push(' ');");
    code.line("out.push_str(xmlns);");
    code.close("}");
    serialize::xml::write_attributes(cx, members, "self", code)?;
    code.line("out.push('>');");
    serialize::xml::write_elements(cx, members, "self", code)?;
    code.line("out.push_str(\"</\");");
    code.line("out.push_str(name);");
    code.line("out.push('>');");
    code.line("Ok(())");
    code.close("}");
    Ok(())
}

fn query_writer(
    cx: &ServiceContext<'_>,
    members: &[&Member],
    validates: bool,
    code: &mut Code,
) -> Result<()> {
    if members.is_empty() {
        code.open("pub(crate) fn to_query(&self, _prefix: &str, _params: &mut Vec<(String, String)>) -> Result<(), runtime::Error> {");
    } else {
        code.open("pub(crate) fn to_query(&self, prefix: &str, params: &mut Vec<(String, String)>) -> Result<(), runtime::Error> {");
    }
    if validates {
        code.line("self.validate()?;");
    }
    serialize::query::write_members(cx, members, "self", "prefix", code)?;
    code.line("Ok(())");
    code.close("}");
    Ok(())
}

fn json_reader(cx: &ServiceContext<'_>, structure: &StructureShape, code: &mut Code) -> Result<()> {
    code.open("pub(crate) fn from_json(value: &serde_json::Value) -> Result<Self, runtime::Error> {");
    if structure.members.is_empty() {
        code.line("runtime::json::object(value)?;");
        code.line("Ok(Self::default())");
    } else {
        code.line("let object = runtime::json::object(value)?;");
        code.open("Ok(Self {");
        for member in &structure.members {
            code.line(format!(
                "{}: {},",
                naming::field_ident(&member.name),
                deserialize::json::member_expr(cx, structure, member, "object")?
            ));
        }
        code.close("})");
    }
    code.close("}");
    Ok(())
}

fn xml_reader(cx: &ServiceContext<'_>, structure: &StructureShape, code: &mut Code) -> Result<()> {
    if structure.members.is_empty() {
        code.open("pub(crate) fn from_xml(_node: roxmltree::Node<'_, '_>) -> Result<Self, runtime::Error> {");
        code.line("Ok(Self::default())");
    } else {
        code.open("pub(crate) fn from_xml(node: roxmltree::Node<'_, '_>) -> Result<Self, runtime::Error> {");
        code.open("Ok(Self {");
        for member in &structure.members {
            code.line(format!(
                "{}: {},",
                naming::field_ident(&member.name),
                deserialize::xml::member_expr(cx, structure, member, "node")?
            ));
        }
        code.close("})");
    }
    code.close("}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::test_support;

    const SHAPES: &str = r#"{
        "RunInput": {
            "type": "structure",
            "members": { "Key": { "shape": "KeySchemaElement" } }
        },
        "RunOutput": {
            "type": "structure",
            "members": { "Table": { "shape": "TableDescription" } }
        },
        "KeySchemaElement": {
            "type": "structure",
            "required": ["AttributeName"],
            "members": {
                "AttributeName": { "shape": "Name", "documentation": "<p>The attribute.</p>" },
                "Type": { "shape": "Name" }
            }
        },
        "TableDescription": {
            "type": "structure",
            "members": { "TableName": { "shape": "Name" } }
        },
        "Name": { "type": "string" }
    }"#;

    #[test]
    fn test_fields() {
        let service = test_support::service("json", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let fields = fields(&cx, service.structure("KeySchemaElement").unwrap()).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].ident, "attribute_name");
        assert_eq!(fields[0].setter, "with_attribute_name");
        assert_eq!(fields[1].ident, "r#type");
        assert_eq!(fields[1].setter, "with_type");
        assert_eq!(fields[1].rust_type, "String");
    }

    #[test]
    fn test_serialized_structure_gets_writer_only() {
        let service = test_support::service("json", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let tera = templates::load_templates().unwrap();

        let source = render(&cx, &tera, service.structure("KeySchemaElement").unwrap()).unwrap();
        assert!(source.contains("pub struct KeySchemaElement {"));
        assert!(source.contains("pub attribute_name: Option<String>,"));
        assert!(source.contains("/// The attribute."));
        assert!(source.contains("pub fn validate(&self) -> Result<(), runtime::Error> {"));
        assert!(source.contains("runtime::required(&self.attribute_name, \"KeySchemaElement\", \"AttributeName\")?;"));
        assert!(source.contains("pub(crate) fn to_json(&self)"));
        assert!(!source.contains("fn from_json"));
    }

    #[test]
    fn test_parsed_structure_gets_reader_only() {
        let service = test_support::service("rest-xml", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let tera = templates::load_templates().unwrap();

        let source = render(&cx, &tera, service.structure("TableDescription").unwrap()).unwrap();
        assert!(source.contains("pub(crate) fn from_xml(node: roxmltree::Node<'_, '_>)"));
        assert!(source.contains("table_name: runtime::xml::child(node, \"TableName\")"));
        assert!(!source.contains("fn write_xml"));
        assert!(!source.contains("fn validate"));
    }

    #[test]
    fn test_query_writer() {
        let service = test_support::service("query", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let tera = templates::load_templates().unwrap();

        let source = render(&cx, &tera, service.structure("KeySchemaElement").unwrap()).unwrap();
        assert!(source.contains("pub(crate) fn to_query(&self, prefix: &str, params: &mut Vec<(String, String)>)"));
        assert!(source.contains("self.validate()?;"));
    }
}
