//! JSON response parsing

use crate::code::literal;
use crate::context::{timestamp_expr, ServiceContext};
use sdkgen_common::{Member, Result, ScalarKind, Shape, StructureShape, TimestampFormat};

/// Expression reading `member` from the JSON object in `object` as an `Option`
pub(crate) fn member_expr(
    cx: &ServiceContext<'_>,
    structure: &StructureShape,
    member: &Member,
    object: &str,
) -> Result<String> {
    let format = cx.timestamp_format(&member.shape, Some(member));
    let value = value_expr(cx, &member.shape, "value", format, 0)?;
    let boxed = if cx.types.is_boxed(structure, member) {
        ".map(Box::new)"
    } else {
        ""
    };

    Ok(format!(
        "runtime::json::field({}, {}).map(|value| {}{}).transpose()?",
        object,
        literal(member.wire_name()),
        value,
        boxed
    ))
}

/// Expression reading the `&serde_json::Value` in `var` as a value of the shape
pub(crate) fn value_expr(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    var: &str,
    format: TimestampFormat,
    depth: usize,
) -> Result<String> {
    let shape = cx.types.shape(shape_name)?;

    Ok(match shape {
        Shape::Structure(_) => format!("{}::from_json({})", cx.types.type_path(shape_name), var),
        Shape::List(list) => {
            let items = format!("items{}", depth);
            let item = format!("item{}", depth);
            let item_format = cx.timestamp_format(&list.member.shape, None);
            let inner = value_expr(cx, &list.member.shape, &item, item_format, depth + 1)?;
            format!(
                "runtime::json::array({var}).and_then(|{items}| {items}.iter().map(|{item}| {inner}).collect::<Result<Vec<_>, runtime::Error>>())"
            )
        }
        Shape::Map(map) => {
            let entries = format!("entries{}", depth);
            let key = format!("key{}", depth);
            let item = format!("item{}", depth);
            let item_format = cx.timestamp_format(&map.value.shape, None);
            let inner = value_expr(cx, &map.value.shape, &item, item_format, depth + 1)?;
            format!(
                "runtime::json::object({var}).and_then(|{entries}| {entries}.iter().filter(|(_, {item})| !{item}.is_null()).map(|({key}, {item})| {inner}.map(|parsed| ({key}.clone(), parsed))).collect::<Result<std::collections::BTreeMap<_, _>, runtime::Error>>())"
            )
        }
        Shape::Scalar(_) if shape.is_enum() => format!(
            "runtime::json::string({}).map({}::from)",
            var,
            cx.types.type_path(shape_name)
        ),
        Shape::Scalar(scalar) => match scalar.kind {
            ScalarKind::String => format!("runtime::json::string({})", var),
            ScalarKind::Integer => format!("runtime::json::integer({})", var),
            ScalarKind::Long => format!("runtime::json::long({})", var),
            ScalarKind::Float => format!("runtime::json::float({})", var),
            ScalarKind::Double => format!("runtime::json::double({})", var),
            ScalarKind::Boolean => format!("runtime::json::boolean({})", var),
            ScalarKind::Timestamp => format!(
                "runtime::json::timestamp({}, {})",
                var,
                timestamp_expr(format)
            ),
            ScalarKind::Blob => format!("runtime::json::blob({})", var),
            ScalarKind::Document => format!("runtime::json::document({})", var),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::test_support;

    const SHAPES: &str = r#"{
        "RunInput": { "type": "structure", "members": {} },
        "RunOutput": {
            "type": "structure",
            "members": {
                "Table": { "shape": "TableDescription" },
                "Items": { "shape": "ItemList" }
            }
        },
        "TableDescription": {
            "type": "structure",
            "members": {
                "TableName": { "shape": "Name" },
                "Parent": { "shape": "TableDescription" }
            }
        },
        "ItemList": { "type": "list", "member": { "shape": "AttributeMap" } },
        "AttributeMap": {
            "type": "map",
            "key": { "shape": "Name" },
            "value": { "shape": "Name" }
        },
        "Name": { "type": "string" }
    }"#;

    #[test]
    fn test_member_expr() {
        let service = test_support::service("json", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let output = service.structure("RunOutput").unwrap();

        let table = member_expr(&cx, output, output.member("Table").unwrap(), "object").unwrap();
        assert_eq!(
            table,
            "runtime::json::field(object, \"Table\").map(|value| crate::types::TableDescription::from_json(value)).transpose()?"
        );
    }

    #[test]
    fn test_recursive_member_is_boxed() {
        let service = test_support::service("json", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let table = service.structure("TableDescription").unwrap();

        let parent = member_expr(&cx, table, table.member("Parent").unwrap(), "object").unwrap();
        assert!(parent.ends_with(".map(Box::new)).transpose()?"));
    }

    #[test]
    fn test_list_of_maps() {
        let service = test_support::service("json", SHAPES);
        let cx = ServiceContext::new(&service, &[]).unwrap();

        let items = value_expr(&cx, "ItemList", "value", TimestampFormat::UnixTimestamp, 0).unwrap();
        assert!(items.starts_with("runtime::json::array(value).and_then(|items0| items0.iter().map(|item0| runtime::json::object(item0)"));
        assert!(items.contains("|(key1, item1)| runtime::json::string(item1).map(|parsed| (key1.clone(), parsed))"));
    }
}
