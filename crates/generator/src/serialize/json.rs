//! JSON request serialization

use crate::code::{literal, Code};
use crate::context::{timestamp_expr, ServiceContext};
use sdkgen_common::{naming, Member, Result, ScalarKind, Shape, TimestampFormat};

/// Emit statements building `object`, a `serde_json::Map`, from `members` of `receiver`
pub(crate) fn write_members(
    cx: &ServiceContext<'_>,
    members: &[&Member],
    receiver: &str,
    code: &mut Code,
) -> Result<()> {
    if members.is_empty() {
        code.line("let object = serde_json::Map::new();");
        return Ok(());
    }

    code.line("let mut object = serde_json::Map::new();");
    for member in members {
        let format = cx.timestamp_format(&member.shape, Some(member));
        let value = value_expr(cx, &member.shape, "value", format, 0)?;
        code.open(format!(
            "if let Some(value) = &{}.{} {{",
            receiver,
            naming::field_ident(&member.name)
        ));
        code.line(format!(
            "object.insert({}.to_string(), {});",
            literal(member.wire_name()),
            value
        ));
        code.close("}");
    }

    Ok(())
}

/// Expression producing the `serde_json::Value` of the shape value referenced by `var`
///
/// Structures and collections of structures use `?`, so the expression must
/// appear where `runtime::Error` can propagate.
pub(crate) fn value_expr(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    var: &str,
    format: TimestampFormat,
    depth: usize,
) -> Result<String> {
    let shape = cx.types.shape(shape_name)?;

    Ok(match shape {
        Shape::Structure(_) => format!("{}.to_json()?", var),
        Shape::List(list) => {
            let item = format!("item{}", depth);
            let item_format = cx.timestamp_format(&list.member.shape, None);
            let inner = value_expr(cx, &list.member.shape, &item, item_format, depth + 1)?;
            format!(
                "serde_json::Value::Array({var}.iter().map(|{item}| Ok({inner})).collect::<Result<Vec<_>, runtime::Error>>()?)"
            )
        }
        Shape::Map(map) => {
            let key = format!("key{}", depth);
            let item = format!("item{}", depth);
            let item_format = cx.timestamp_format(&map.value.shape, None);
            let inner = value_expr(cx, &map.value.shape, &item, item_format, depth + 1)?;
            format!(
                "serde_json::Value::Object({var}.iter().map(|({key}, {item})| Ok(({key}.clone(), {inner}))).collect::<Result<serde_json::Map<_, _>, runtime::Error>>()?)"
            )
        }
        Shape::Scalar(_) if shape.is_enum() => {
            format!("serde_json::Value::String({}.as_str().to_string())", var)
        }
        Shape::Scalar(scalar) => match scalar.kind {
            ScalarKind::String => format!("serde_json::Value::String({}.clone())", var),
            ScalarKind::Integer | ScalarKind::Long | ScalarKind::Float | ScalarKind::Double => {
                format!("serde_json::Value::from(*{})", var)
            }
            ScalarKind::Boolean => format!("serde_json::Value::Bool(*{})", var),
            ScalarKind::Timestamp => format!(
                "runtime::json::timestamp_value({}, {})",
                var,
                timestamp_expr(format)
            ),
            ScalarKind::Blob => format!("runtime::json::blob_value({})", var),
            ScalarKind::Document => format!("{}.clone()", var),
        },
    })
}
