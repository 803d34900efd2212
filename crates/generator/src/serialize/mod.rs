//! Emitters writing shape values into request messages
//!
//! Each walker recurses over the shape graph and returns Rust source that
//! writes a value held in a named variable. Variables introduced by nested
//! collections carry the nesting depth (`item0`, `key1`, …) so loops can nest.

pub(crate) mod json;
pub(crate) mod query;
pub(crate) mod xml;

use crate::context::{timestamp_expr, ServiceContext};
use sdkgen_common::{GeneratorError, Result, ScalarKind, Shape, TimestampFormat};

/// Expression producing the text form (a `String`) of a scalar held by reference in `var`
///
/// Used for headers, URI labels, query parameters and XML text.
pub(crate) fn scalar_text(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    var: &str,
    format: TimestampFormat,
) -> Result<String> {
    let Shape::Scalar(scalar) = cx.types.shape(shape_name)? else {
        return Err(GeneratorError::Generation(format!(
            "Shape {} cannot be written as text",
            shape_name
        )));
    };

    Ok(match scalar.kind {
        ScalarKind::Timestamp => format!(
            "runtime::format_timestamp({}, {})",
            var,
            timestamp_expr(format)
        ),
        ScalarKind::Blob => format!("runtime::base64_encode({})", var),
        _ => format!("{}.to_string()", var),
    })
}

/// Expression producing a header value from the value in `var`
///
/// Lists of scalars are joined with commas.
pub(crate) fn header_text(
    cx: &ServiceContext<'_>,
    shape_name: &str,
    var: &str,
    format: TimestampFormat,
) -> Result<String> {
    match cx.types.shape(shape_name)? {
        Shape::List(list) => {
            let item = scalar_text(cx, &list.member.shape, "item", format)?;
            Ok(format!(
                "{}.iter().map(|item| {}).collect::<Vec<_>>().join(\",\")",
                var, item
            ))
        }
        Shape::Scalar(_) => scalar_text(cx, shape_name, var, format),
        _ => Err(GeneratorError::Generation(format!(
            "Shape {} cannot be bound to a header",
            shape_name
        ))),
    }
}
