//! XML response parsing for the rest-xml, query and ec2 protocols

use super::text_expr;
use crate::code::literal;
use crate::context::{timestamp_expr, ServiceContext};
use sdkgen_common::{Member, Result, ScalarKind, Shape, StructureShape, TimestampFormat};

/// Expression reading `member` from the element in `node` as an `Option`
pub(crate) fn member_expr(
    cx: &ServiceContext<'_>,
    structure: &StructureShape,
    member: &Member,
    node: &str,
) -> Result<String> {
    let format = cx.timestamp_format(&member.shape, Some(member));

    if member.xml_attribute {
        return Ok(format!(
            "runtime::xml::attribute({}, {}).map(|value| {}).transpose()?",
            node,
            literal(member.wire_name()),
            text_expr(cx, &member.shape, "value", format)?
        ));
    }

    match cx.types.shape(&member.shape)? {
        Shape::List(list) if member.flattened || list.flattened => {
            let name = list
                .member
                .location_name
                .as_deref()
                .unwrap_or(member.wire_name());
            let item_format = cx.timestamp_format(&list.member.shape, None);
            Ok(format!(
                "runtime::xml::flattened({}, {}, |item0| {})?",
                node,
                literal(name),
                value_expr(cx, &list.member.shape, "item0", item_format, 1)?
            ))
        }
        Shape::Map(map) if member.flattened || map.flattened => {
            let item_format = cx.timestamp_format(&map.value.shape, None);
            Ok(format!(
                "runtime::xml::flattened({}, {}, |entry0| {})?.map(|entries| entries.into_iter().collect())",
                node,
                literal(member.wire_name()),
                entry_expr(cx, map, "entry0", item_format, 0)?
            ))
        }
        _ => {
            let boxed = if cx.types.is_boxed(structure, member) {
                ".map(Box::new)"
            } else {
                ""
            };
            Ok(format!(
                "runtime::xml::child({}, {}).map(|value| {}{}).transpose()?",
                node,
                literal(member.wire_name()),
                value_expr(cx, &member.shape, "value", format, 0)?,
                boxed
            ))
        }
    }
}

/// Expression reading one map entry element into a `(String, T)` pair
fn entry_expr(
    cx: &ServiceContext<'_>,
    map: &sdkgen_common::MapShape,
    var: &str,
    format: TimestampFormat,
    depth: usize,
) -> Result<String> {
    let key = format!("key{}", depth);
    let item = format!("item{}", depth);
    let inner = value_expr(cx, &map.value.shape, &item, format, depth + 1)?;
    Ok(format!(
        "runtime::xml::entry({var}, {}, {}).and_then(|({key}, {item})| {inner}.map(|parsed| ({key}, parsed)))",
        literal(map.key.location_name.as_deref().unwrap_or("key")),
        literal(map.value.location_name.as_deref().unwrap_or("value")),
    ))
}

/// Expression reading the `roxmltree::Node` in `var` as a value of the shape
pub(crate) fn value_expr(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    var: &str,
    format: TimestampFormat,
    depth: usize,
) -> Result<String> {
    let shape = cx.types.shape(shape_name)?;

    Ok(match shape {
        Shape::Structure(_) => format!("{}::from_xml({})", cx.types.type_path(shape_name), var),
        Shape::List(list) => {
            let item = format!("item{}", depth);
            let item_format = cx.timestamp_format(&list.member.shape, None);
            let inner = value_expr(cx, &list.member.shape, &item, item_format, depth + 1)?;
            format!(
                "runtime::xml::children({var}, {}).into_iter().map(|{item}| {inner}).collect::<Result<Vec<_>, runtime::Error>>()",
                literal(list.member.location_name.as_deref().unwrap_or("member"))
            )
        }
        Shape::Map(map) => {
            let entry = format!("entry{}", depth);
            let item_format = cx.timestamp_format(&map.value.shape, None);
            let inner = entry_expr(cx, map, &entry, item_format, depth)?;
            format!(
                "runtime::xml::children({var}, \"entry\").into_iter().map(|{entry}| {inner}).collect::<Result<std::collections::BTreeMap<_, _>, runtime::Error>>()"
            )
        }
        Shape::Scalar(_) if shape.is_enum() => format!(
            "runtime::xml::string({}).map({}::from)",
            var,
            cx.types.type_path(shape_name)
        ),
        Shape::Scalar(scalar) => match scalar.kind {
            ScalarKind::String => format!("runtime::xml::string({})", var),
            ScalarKind::Integer => format!("runtime::xml::number::<i32>({})", var),
            ScalarKind::Long => format!("runtime::xml::number::<i64>({})", var),
            ScalarKind::Float => format!("runtime::xml::number::<f32>({})", var),
            ScalarKind::Double => format!("runtime::xml::number::<f64>({})", var),
            ScalarKind::Boolean => format!("runtime::xml::boolean({})", var),
            ScalarKind::Timestamp => format!(
                "runtime::xml::timestamp({}, {})",
                var,
                timestamp_expr(format)
            ),
            ScalarKind::Blob => format!("runtime::xml::blob({})", var),
            ScalarKind::Document => {
                format!("runtime::xml::string({}).map(serde_json::Value::String)", var)
            }
        },
    })
}
