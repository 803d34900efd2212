//! XML request serialization for the rest-xml protocol

use super::scalar_text;
use crate::code::{literal, Code};
use crate::context::ServiceContext;
use sdkgen_common::{naming, Member, Result, Shape, TimestampFormat, XmlNamespace};

/// Emit statements appending the attribute members of `receiver` to the open tag in `out`
pub(crate) fn write_attributes(
    cx: &ServiceContext<'_>,
    members: &[&Member],
    receiver: &str,
    code: &mut Code,
) -> Result<()> {
    for member in members.iter().filter(|m| m.xml_attribute) {
        let format = cx.timestamp_format(&member.shape, Some(member));
        code.open(format!(
            "if let Some(value) = &{}.{} {{",
            receiver,
            naming::field_ident(&member.name)
        ));
        code.line(format!(
            "runtime::xml_attribute(out, {}, &{});",
            literal(member.wire_name()),
            scalar_text(cx, &member.shape, "value", format)?
        ));
        code.close("}");
    }

    Ok(())
}

/// Emit statements appending the element members of `receiver` to `out`
pub(crate) fn write_elements(
    cx: &ServiceContext<'_>,
    members: &[&Member],
    receiver: &str,
    code: &mut Code,
) -> Result<()> {
    for member in members.iter().filter(|m| !m.xml_attribute) {
        let format = cx.timestamp_format(&member.shape, Some(member));
        let element = Element {
            name: member.wire_name(),
            flattened: member.flattened,
            namespace: member.xml_namespace.as_ref(),
        };

        code.open(format!(
            "if let Some(value) = &{}.{} {{",
            receiver,
            naming::field_ident(&member.name)
        ));
        write_value(cx, &member.shape, "value", &element, format, 0, code)?;
        code.close("}");
    }

    Ok(())
}

/// The element a value is written as
struct Element<'e> {
    name: &'e str,
    flattened: bool,
    namespace: Option<&'e XmlNamespace>,
}

/// `Some("xmlns=…")` / `None` argument of a `write_xml` call
pub(crate) fn namespace_arg(namespace: Option<&XmlNamespace>) -> String {
    match namespace {
        Some(namespace) => format!("Some({})", literal(&namespace.attribute())),
        None => "None".to_string(),
    }
}

fn write_value(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    var: &str,
    element: &Element<'_>,
    format: TimestampFormat,
    depth: usize,
    code: &mut Code,
) -> Result<()> {
    let name = literal(element.name);

    match cx.types.shape(shape_name)? {
        Shape::Structure(structure) => {
            let namespace = element.namespace.or(structure.xml_namespace.as_ref());
            code.line(format!(
                "{}.write_xml({}, {}, out)?;",
                var,
                name,
                namespace_arg(namespace)
            ));
        }
        Shape::List(list) => {
            let item = format!("item{}", depth);
            let item_format = cx.timestamp_format(&list.member.shape, None);
            let flattened = element.flattened || list.flattened;

            // Flattened lists repeat the member's own element name
            let item_name = if flattened {
                element.name
            } else {
                list.member.location_name.as_deref().unwrap_or("member")
            };
            let item_element = Element {
                name: item_name,
                flattened: false,
                namespace: None,
            };

            if !flattened {
                code.line(format!("out.push_str({});", literal(&format!("<{}>", element.name))));
            }
            code.open(format!("for {} in {}.iter() {{", item, var));
            write_value(
                cx,
                &list.member.shape,
                &item,
                &item_element,
                item_format,
                depth + 1,
                code,
            )?;
            code.close("}");
            if !flattened {
                code.line(format!(
                    "out.push_str({});",
                    literal(&format!("</{}>", element.name))
                ));
            }
        }
        Shape::Map(map) => {
            let key = format!("key{}", depth);
            let item = format!("item{}", depth);
            let item_format = cx.timestamp_format(&map.value.shape, None);
            let value_element = Element {
                name: map.value.location_name.as_deref().unwrap_or("value"),
                flattened: false,
                namespace: None,
            };

            // Flattened maps repeat the member's element per entry, without a wrapper
            let flattened = element.flattened || map.flattened;
            let entry = if flattened { element.name } else { "entry" };

            if !flattened {
                code.line(format!("out.push_str({});", literal(&format!("<{}>", element.name))));
            }
            code.open(format!("for ({}, {}) in {}.iter() {{", key, item, var));
            code.line(format!("out.push_str({});", literal(&format!("<{}>", entry))));
            code.line(format!(
                "runtime::xml_element(out, {}, {});",
                literal(map.key.location_name.as_deref().unwrap_or("key")),
                key
            ));
            write_value(
                cx,
                &map.value.shape,
                &item,
                &value_element,
                item_format,
                depth + 1,
                code,
            )?;
            code.line(format!("out.push_str({});", literal(&format!("</{}>", entry))));
            code.close("}");
            if !flattened {
                code.line(format!(
                    "out.push_str({});",
                    literal(&format!("</{}>", element.name))
                ));
            }
        }
        Shape::Scalar(_) => {
            code.line(format!(
                "runtime::xml_element(out, {}, &{});",
                name,
                scalar_text(cx, shape_name, var, format)?
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::test_support;

    const SHAPES: &str = r#"{
        "RunInput": {
            "type": "structure",
            "members": {
                "Tagging": {
                    "shape": "Tagging",
                    "locationName": "Tagging",
                    "xmlNamespace": { "uri": "http://s3.amazonaws.com/doc/2006-03-01/" }
                }
            },
            "payload": "Tagging"
        },
        "RunOutput": { "type": "structure", "members": {} },
        "Tagging": {
            "type": "structure",
            "members": { "TagSet": { "shape": "TagSet" } }
        },
        "TagSet": {
            "type": "list",
            "member": { "shape": "Tag", "locationName": "Tag" }
        },
        "Tag": {
            "type": "structure",
            "members": {
                "Key": { "shape": "Name" },
                "Value": { "shape": "Name" },
                "Type": { "shape": "Name", "locationName": "xsi:type", "xmlAttribute": true }
            }
        },
        "Rules": { "type": "list", "member": { "shape": "Name" }, "flattened": true },
        "Attrs": {
            "type": "map",
            "key": { "shape": "Name", "locationName": "Name" },
            "value": { "shape": "Name", "locationName": "Value" },
            "flattened": true
        },
        "Metadata": { "type": "map", "key": { "shape": "Name" }, "value": { "shape": "Name" } },
        "Name": { "type": "string" }
    }"#;

    #[test]
    fn test_wrapped_list_of_structures() {
        let service = test_support::service("rest-xml", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let tagging = service.structure("Tagging").unwrap();
        let members: Vec<&Member> = tagging.members.iter().collect();

        let mut code = Code::new(0);
        write_elements(&cx, &members, "self", &mut code).unwrap();
        assert_eq!(
            code.finish(),
            [
                "if let Some(value) = &self.tag_set {",
                "    out.push_str(\"<TagSet>\");",
                "    for item0 in value.iter() {",
                "        item0.write_xml(\"Tag\", None, out)?;",
                "    }",
                "    out.push_str(\"</TagSet>\");",
                "}",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_attributes_are_separate() {
        let service = test_support::service("rest-xml", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let tag = service.structure("Tag").unwrap();
        let members: Vec<&Member> = tag.members.iter().collect();

        let mut attributes = Code::new(0);
        write_attributes(&cx, &members, "self", &mut attributes).unwrap();
        let attributes = attributes.finish();
        assert!(attributes.contains("runtime::xml_attribute(out, \"xsi:type\", &value.to_string());"));

        let mut elements = Code::new(0);
        write_elements(&cx, &members, "self", &mut elements).unwrap();
        let elements = elements.finish();
        assert!(elements.contains("runtime::xml_element(out, \"Key\", &value.to_string());"));
        assert!(!elements.contains("xsi:type"));
    }

    #[test]
    fn test_flattened_list_repeats_member_name() {
        let service = test_support::service("rest-xml", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let element = Element {
            name: "Rule",
            flattened: false,
            namespace: None,
        };

        let mut code = Code::new(0);
        write_value(&cx, "Rules", "value", &element, TimestampFormat::Iso8601, 0, &mut code)
            .unwrap();
        let code = code.finish();
        assert!(code.contains("runtime::xml_element(out, \"Rule\", &item0.to_string());"));
        assert!(!code.contains("<Rule>"));
    }

    fn map_code(shape: &str, flattened: bool) -> String {
        let service = test_support::service("rest-xml", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let element = Element {
            name: "Attr",
            flattened,
            namespace: None,
        };

        let mut code = Code::new(0);
        write_value(&cx, shape, "value", &element, TimestampFormat::Iso8601, 0, &mut code)
            .unwrap();
        code.finish()
    }

    #[test]
    fn test_flattened_map_repeats_member_name() {
        assert_eq!(
            map_code("Attrs", false),
            [
                "for (key0, item0) in value.iter() {",
                "    out.push_str(\"<Attr>\");",
                "    runtime::xml_element(out, \"Name\", key0);",
                "    runtime::xml_element(out, \"Value\", &item0.to_string());",
                "    out.push_str(\"</Attr>\");",
                "}",
            ]
            .join("\n")
        );

        // Flattening on the member has the same effect
        let member_flattened = map_code("Metadata", true);
        assert!(member_flattened.starts_with("for (key0, item0) in value.iter() {"));
        assert!(member_flattened.contains("out.push_str(\"<Attr>\");"));
        assert!(!member_flattened.contains("<entry>"));
    }

    #[test]
    fn test_wrapped_map_uses_entry_elements() {
        let code = map_code("Metadata", false);
        assert!(code.starts_with("out.push_str(\"<Attr>\");"));
        assert!(code.contains("out.push_str(\"<entry>\");"));
        assert!(code.contains("runtime::xml_element(out, \"key\", key0);"));
        assert!(code.ends_with("out.push_str(\"</Attr>\");"));
    }

    #[test]
    fn test_namespace_arg() {
        let namespace = XmlNamespace {
            uri: "http://s3.amazonaws.com/doc/2006-03-01/".to_string(),
            prefix: None,
        };
        assert_eq!(
            namespace_arg(Some(&namespace)),
            r#"Some("xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\"")"#
        );
        assert_eq!(namespace_arg(None), "None");
    }
}
