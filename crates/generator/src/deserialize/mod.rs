//! Emitters reading shape values out of response messages
//!
//! The walkers return expressions rather than statements: every value
//! expression evaluates to `Result<T, runtime::Error>` and every member
//! expression to `Option<T>` (propagating errors with `?`).

pub(crate) mod json;
pub(crate) mod xml;

use crate::context::{timestamp_expr, ServiceContext};
use sdkgen_common::{GeneratorError, Result, ScalarKind, Shape, TimestampFormat};

/// Expression parsing the `&str` in `var` as a scalar of the given shape
///
/// Used for headers and XML attributes.
pub(crate) fn text_expr(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    var: &str,
    format: TimestampFormat,
) -> Result<String> {
    let shape = cx.types.shape(shape_name)?;
    let Shape::Scalar(scalar) = shape else {
        return Err(GeneratorError::Generation(format!(
            "Shape {} cannot be read from text",
            shape_name
        )));
    };

    if shape.is_enum() {
        return Ok(format!(
            "runtime::text::string({}).map({}::from)",
            var,
            cx.types.type_path(shape_name)
        ));
    }

    Ok(match scalar.kind {
        ScalarKind::String => format!("runtime::text::string({})", var),
        ScalarKind::Integer => format!("runtime::text::number::<i32>({})", var),
        ScalarKind::Long => format!("runtime::text::number::<i64>({})", var),
        ScalarKind::Float => format!("runtime::text::number::<f32>({})", var),
        ScalarKind::Double => format!("runtime::text::number::<f64>({})", var),
        ScalarKind::Boolean => format!("runtime::text::boolean({})", var),
        ScalarKind::Timestamp => {
            format!("runtime::text::timestamp({}, {})", var, timestamp_expr(format))
        }
        ScalarKind::Blob => format!("runtime::text::blob({})", var),
        ScalarKind::Document => format!(
            "serde_json::from_str::<serde_json::Value>({}).map_err(|e| runtime::Error::InvalidResponse(e.to_string()))",
            var
        ),
    })
}

/// Expression reading a header value (`&str` in `var`); lists are comma separated
pub(crate) fn header_expr(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    var: &str,
    format: TimestampFormat,
) -> Result<String> {
    match cx.types.shape(shape_name)? {
        Shape::List(list) => Ok(format!(
            "runtime::text::split({}).map(|item| {}).collect::<Result<Vec<_>, runtime::Error>>()",
            var,
            text_expr(cx, &list.member.shape, "item", format)?
        )),
        _ => text_expr(cx, shape_name, var, format),
    }
}
