//! Query (form-encoded) request serialization for the query and ec2 protocols

use super::scalar_text;
use crate::code::{literal, Code};
use crate::context::ServiceContext;
use sdkgen_common::{naming, Member, Protocol, Result, Shape, TimestampFormat};

/// Emit statements pushing `members` of `receiver` onto `params`
///
/// `prefix` is a Rust expression of type `&str` holding the key prefix of the
/// enclosing structure (`""` at the top level).
pub(crate) fn write_members(
    cx: &ServiceContext<'_>,
    members: &[&Member],
    receiver: &str,
    prefix: &str,
    code: &mut Code,
) -> Result<()> {
    for member in members {
        let key = format!(
            "runtime::query_key({}, {})",
            prefix,
            literal(&member_key(cx, member)?)
        );
        let format = cx.timestamp_format(&member.shape, Some(member));

        code.open(format!(
            "if let Some(value) = &{}.{} {{",
            receiver,
            naming::field_ident(&member.name)
        ));
        write_value(cx, &member.shape, "value", &key, member.flattened, format, 0, code)?;
        code.close("}");
    }

    Ok(())
}

/// Key segment a member is serialized under
fn member_key(cx: &ServiceContext<'_>, member: &Member) -> Result<String> {
    if cx.protocol() == Protocol::Ec2 {
        if let Some(name) = &member.query_name {
            return Ok(name.clone());
        }
        return Ok(match &member.location_name {
            Some(name) => capitalize(name),
            None => member.name.clone(),
        });
    }

    // A flattened list whose items are named replaces the member's own name
    if let Shape::List(list) = cx.types.shape(&member.shape)? {
        if member.flattened || list.flattened {
            if let Some(name) = &list.member.location_name {
                return Ok(name.clone());
            }
        }
    }

    Ok(member.wire_name().to_string())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Emit statements writing the value referenced by `var` under the key expression `key`
#[allow(clippy::too_many_arguments)]
fn write_value(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    var: &str,
    key: &str,
    flattened: bool,
    format: TimestampFormat,
    depth: usize,
    code: &mut Code,
) -> Result<()> {
    let ec2 = cx.protocol() == Protocol::Ec2;

    match cx.types.shape(shape_name)? {
        Shape::Structure(_) => {
            code.line(format!("{}.to_query(&{}, params)?;", var, key));
        }
        Shape::List(list) => {
            let prefix = format!("prefix{}", depth);
            let index = format!("index{}", depth);
            let item = format!("item{}", depth);

            code.line(format!("let {} = {};", prefix, key));
            if !ec2 {
                code.open(format!("if {}.is_empty() {{", var));
                code.line(format!("params.push(({}.clone(), String::new()));", prefix));
                code.close("}");
            }

            let pattern = if ec2 || flattened || list.flattened {
                "{}.{}".to_string()
            } else {
                format!(
                    "{{}}.{}.{{}}",
                    list.member.location_name.as_deref().unwrap_or("member")
                )
            };
            let item_key = format!("format!({}, {}, {} + 1)", literal(&pattern), prefix, index);
            let item_format = cx.timestamp_format(&list.member.shape, None);

            code.open(format!(
                "for ({}, {}) in {}.iter().enumerate() {{",
                index, item, var
            ));
            write_value(
                cx,
                &list.member.shape,
                &item,
                &item_key,
                false,
                item_format,
                depth + 1,
                code,
            )?;
            code.close("}");
        }
        Shape::Map(map) => {
            let prefix = format!("prefix{}", depth);
            let entry = format!("entry{}", depth);
            let index = format!("index{}", depth);
            let map_key = format!("key{}", depth);
            let item = format!("item{}", depth);

            let pattern = if flattened || map.flattened {
                "{}.{}"
            } else {
                "{}.entry.{}"
            };
            let key_name = map.key.location_name.as_deref().unwrap_or("key");
            let value_name = map.value.location_name.as_deref().unwrap_or("value");
            let item_format = cx.timestamp_format(&map.value.shape, None);

            code.line(format!("let {} = {};", prefix, key));
            code.open(format!(
                "for ({}, ({}, {})) in {}.iter().enumerate() {{",
                index, map_key, item, var
            ));
            code.line(format!(
                "let {} = format!({}, {}, {} + 1);",
                entry,
                literal(pattern),
                prefix,
                index
            ));
            code.line(format!(
                "params.push((runtime::query_key(&{}, {}), {}.clone()));",
                entry,
                literal(key_name),
                map_key
            ));
            let value_key = format!("runtime::query_key(&{}, {})", entry, literal(value_name));
            write_value(
                cx,
                &map.value.shape,
                &item,
                &value_key,
                false,
                item_format,
                depth + 1,
                code,
            )?;
            code.close("}");
        }
        Shape::Scalar(_) => {
            code.line(format!(
                "params.push(({}, {}));",
                key,
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
                "QueueName": { "shape": "Name" },
                "Attributes": { "shape": "AttributeMap", "locationName": "Attribute" },
                "QueueUrls": { "shape": "UrlList" },
                "Names": { "shape": "NameList" }
            }
        },
        "RunOutput": { "type": "structure", "members": {} },
        "AttributeMap": {
            "type": "map",
            "key": { "shape": "Name", "locationName": "Name" },
            "value": { "shape": "Name", "locationName": "Value" },
            "flattened": true
        },
        "UrlList": {
            "type": "list",
            "member": { "shape": "Name", "locationName": "QueueUrl" },
            "flattened": true
        },
        "NameList": { "type": "list", "member": { "shape": "Name" } },
        "Name": { "type": "string" }
    }"#;

    fn emitted(protocol: &str) -> String {
        let service = test_support::service(protocol, SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let input = service.structure("RunInput").unwrap();
        let members: Vec<&Member> = input.members.iter().collect();

        let mut code = Code::new(0);
        write_members(&cx, &members, "self", "\"\"", &mut code).unwrap();
        code.finish()
    }

    #[test]
    fn test_scalar_member() {
        let code = emitted("query");
        assert!(code.contains(
            "params.push((runtime::query_key(\"\", \"QueueName\"), value.to_string()));"
        ));
    }

    #[test]
    fn test_flattened_map_uses_entry_names() {
        let code = emitted("query");
        assert!(code.contains("let prefix0 = runtime::query_key(\"\", \"Attribute\");"));
        assert!(code.contains("let entry0 = format!(\"{}.{}\", prefix0, index0 + 1);"));
        assert!(code.contains("params.push((runtime::query_key(&entry0, \"Name\"), key0.clone()));"));
        assert!(code.contains("runtime::query_key(&entry0, \"Value\")"));
    }

    #[test]
    fn test_flattened_list_takes_item_name() {
        let code = emitted("query");
        assert!(code.contains("let prefix0 = runtime::query_key(\"\", \"QueueUrl\");"));
        assert!(code.contains("format!(\"{}.{}\", prefix0, index0 + 1)"));
    }

    #[test]
    fn test_member_list_and_empty_marker() {
        let code = emitted("query");
        assert!(code.contains("format!(\"{}.member.{}\", prefix0, index0 + 1)"));
        assert!(code.contains("params.push((prefix0.clone(), String::new()));"));
    }

    #[test]
    fn test_ec2_lists_are_flat() {
        let code = emitted("ec2");
        assert!(!code.contains(".member."));
        assert!(!code.contains("String::new()"));
    }
}
