//! Page iterators for operations with paginator metadata

use crate::client::{client_name, method_name};
use crate::code::Code;
use crate::context::ServiceContext;
use crate::input::input_type;
use crate::output::output_type;
use crate::templates;
use sdkgen_common::{
    naming, Pagination, PathExpression, PathSegment, Result, ScalarKind, Shape,
};
use tera::Tera;

/// Render `pagination.rs`, or `None` when no paginator applies
///
/// Returns the source and the names of the generated items.
pub(crate) fn render(cx: &ServiceContext<'_>, tera: &Tera) -> Result<Option<(String, Vec<String>)>> {
    let mut code = Code::new(0);
    let mut names = Vec::new();

    for pagination in cx.service.paginators.values() {
        if !cx.usage.is_selected(&pagination.operation) {
            continue;
        }
        match paginator(cx, pagination) {
            Ok(Some(block)) => {
                if !names.is_empty() {
                    code.line("");
                }
                code.extend(block);
                names.push(pagination.operation.clone());
            }
            Ok(None) => {}
            Err(reason) => {
                tracing::warn!(
                    service = %cx.service.name,
                    operation = %pagination.operation,
                    "skipping paginator: {}",
                    reason
                );
            }
        }
    }

    if names.is_empty() {
        return Ok(None);
    }

    let mut context = tera::Context::new();
    context.insert("paginators", &code.finish());
    let source = templates::render(tera, "pagination.rs", &context)?;
    Ok(Some((source, names)))
}

/// Emit the page iterator of one operation
///
/// `Err` carries the reason the paginator cannot be generated.
fn paginator(
    cx: &ServiceContext<'_>,
    pagination: &Pagination,
) -> std::result::Result<Option<Code>, String> {
    let Some(operation) = cx.service.operation(&pagination.operation) else {
        return Ok(None);
    };
    let (Some(input), Some(output_shape)) = (
        cx.service.input_of(operation),
        operation.output.as_deref(),
    ) else {
        return Err("operation has no input or no output".to_string());
    };

    // Token assignments, checked against the input member types
    let mut assignments = Vec::new();
    for (token, path) in pagination.input_tokens.iter().zip(&pagination.output_tokens) {
        let member = input
            .member(token)
            .ok_or_else(|| format!("input has no member {}", token))?;
        let (chain, leaf) = token_chain(cx, output_shape, path)?;
        let expected = cx.types.member_type(input, member).map_err(|e| e.to_string())?;
        let found = cx.types.rust_type(&leaf).map_err(|e| e.to_string())?;
        if expected != found {
            return Err(format!(
                "output token {} is {} but input token {} is {}",
                path, found, token, expected
            ));
        }
        assignments.push((naming::field_ident(token), format!("{}.cloned()", chain)));
    }

    let more_results = match &pagination.more_results {
        Some(path) => {
            let (chain, leaf) = token_chain(cx, output_shape, path)?;
            if !matches!(cx.types.shape(&leaf), Ok(Shape::Scalar(s)) if s.kind == ScalarKind::Boolean) {
                return Err(format!("more_results {} is not a boolean", path));
            }
            Some(format!("{}.copied().unwrap_or(false)", chain))
        }
        None => None,
    };

    let client = client_name(cx.service);
    let method = method_name(operation);
    let bare = method.trim_start_matches("r#").to_string();
    let pages = format!("{}Pages", naming::type_ident(&operation.name));
    let input_path = format!("crate::input::{}", input_type(operation));
    let output_path = format!("crate::output::{}", output_type(operation));

    let mut code = Code::new(0);
    code.line(format!(
        "/// Pages of [`{client}::{bare}`](crate::{client}::{bare})"
    ));
    code.line("///");
    code.line("/// Each item is one response; iteration stops after the last page or the first error.");
    code.open(format!("pub struct {}<'a, T> {{", pages));
    code.line(format!("client: &'a crate::client::{}<T>,", client));
    code.line(format!("input: Option<{}>,", input_path));
    code.close("}");
    code.line("");

    code.open(format!("impl<T: runtime::Transport> Iterator for {}<'_, T> {{", pages));
    code.line(format!("type Item = Result<{}, runtime::Error>;", output_path));
    code.line("");
    code.open("fn next(&mut self) -> Option<Self::Item> {");
    code.line("let input = self.input.take()?;");
    code.open(format!("let output = match self.client.{}(&input) {{", method));
    code.line("Ok(output) => output,");
    code.line("Err(error) => return Some(Err(error)),");
    code.close("};");
    code.line("");
    code.line("let mut next = input.clone();");
    for (field, chain) in &assignments {
        code.line(format!("next.{} = {};", field, chain));
    }

    let mut conditions = Vec::new();
    if let Some(more) = &more_results {
        conditions.push(more.clone());
    }
    let tokens = assignments
        .iter()
        .map(|(field, _)| format!("next.{}.is_some()", field))
        .collect::<Vec<_>>();
    if tokens.len() == 1 {
        conditions.push(tokens[0].clone());
    } else {
        conditions.push(format!("({})", tokens.join(" || ")));
    }
    // A repeated token would fetch the same page forever
    conditions.push("next != input".to_string());

    code.open(format!("if {} {{", conditions.join(" && ")));
    code.line("self.input = Some(next);");
    code.close("}");
    code.line("Some(Ok(output))");
    code.close("}");
    code.close("}");
    code.line("");

    code.open(format!(
        "impl<T: runtime::Transport> crate::client::{}<T> {{",
        client
    ));
    code.line(format!("/// Iterate over every page of `{}`", operation.name));
    if let Some(limit) = pagination.limit_key.as_deref().filter(|l| input.member(l).is_some()) {
        code.line("///");
        code.line(format!(
            "/// The page size is read from `input.{}`.",
            naming::field_ident(limit).trim_start_matches("r#")
        ));
    }
    code.open(format!(
        "pub fn {}_pages(&self, input: {}) -> {}<'_, T> {{",
        bare,
        input_path,
        pages
    ));
    code.open(format!("{} {{", pages));
    code.line("client: self,");
    code.line("input: Some(input),");
    code.close("}");
    code.close("}");

    if let Some((field, item_type)) = result_items(cx, output_shape, pagination) {
        code.line("");
        code.line(format!(
            "/// Iterate over the items of every page of `{}`",
            operation.name
        ));
        code.open(format!(
            "pub fn {}_items(&self, input: {}) -> impl Iterator<Item = Result<{}, runtime::Error>> + '_ {{",
            bare,
            input_path,
            item_type
        ));
        code.open(format!(
            "self.{}_pages(input).flat_map(|page| match page {{",
            bare
        ));
        code.line(format!(
            "Ok(output) => output.{}.unwrap_or_default().into_iter().map(Ok).collect::<Vec<_>>(),",
            field
        ));
        code.line("Err(error) => vec![Err(error)],");
        code.close("})");
        code.close("}");
    }
    code.close("}");

    Ok(Some(code))
}

/// `Option<&T>` expression reading a token path from `output`, with the leaf shape
///
/// Alternatives are tried in order. Projections cannot yield a single token.
fn token_chain(
    cx: &ServiceContext<'_>,
    output_shape: &str,
    path: &PathExpression,
) -> std::result::Result<(String, String), String> {
    let mut chains = Vec::new();
    let mut leaf: Option<String> = None;

    for segments in &path.alternatives {
        let (chain, shape) = alternative_chain(cx, output_shape, segments, path)?;
        if let Some(previous) = &leaf {
            let same = cx.types.rust_type(previous).ok() == cx.types.rust_type(&shape).ok();
            if !same {
                return Err(format!("alternatives of {} have different types", path));
            }
        }
        leaf = Some(shape);
        chains.push(chain);
    }

    let leaf = leaf.ok_or_else(|| format!("empty path {}", path))?;
    let mut expr = chains.remove(0);
    for chain in chains {
        expr = format!("{}.or_else(|| {})", expr, chain);
    }
    Ok((expr, leaf))
}

fn alternative_chain(
    cx: &ServiceContext<'_>,
    output_shape: &str,
    segments: &[PathSegment],
    path: &PathExpression,
) -> std::result::Result<(String, String), String> {
    let mut shape_name = output_shape.to_string();
    let mut expr = String::new();

    for (i, segment) in segments.iter().enumerate() {
        let shape = cx.types.shape(&shape_name).map_err(|e| e.to_string())?;
        match (segment, shape) {
            (PathSegment::Field(name), Shape::Structure(structure)) => {
                let member = structure
                    .member(name)
                    .ok_or_else(|| format!("{} has no member {}", structure.name, name))?;
                if cx.types.is_boxed(structure, member) {
                    return Err(format!("{} crosses a boxed member", path));
                }
                let field = naming::field_ident(&member.name);
                if i == 0 {
                    expr = format!("output.{}.as_ref()", field);
                } else {
                    expr.push_str(&format!(".and_then(|v| v.{}.as_ref())", field));
                }
                shape_name = member.shape.clone();
            }
            (PathSegment::Index(index), Shape::List(list)) if i > 0 => {
                if *index >= 0 {
                    expr.push_str(&format!(".and_then(|v| v.get({}))", index));
                } else {
                    expr.push_str(&format!(
                        ".and_then(|v| v.iter().rev().nth({}))",
                        index.unsigned_abs() - 1
                    ));
                }
                shape_name = list.member.shape.clone();
            }
            (PathSegment::Project, _) => {
                return Err(format!("{} projects a list", path));
            }
            _ => return Err(format!("{} does not match the output shape", path)),
        }
    }

    Ok((expr, shape_name))
}

/// The list field and item type of a single top-level result key
fn result_items(
    cx: &ServiceContext<'_>,
    output_shape: &str,
    pagination: &Pagination,
) -> Option<(String, String)> {
    let [key] = pagination.result_keys.as_slice() else {
        return None;
    };
    let [segments] = key.alternatives.as_slice() else {
        return None;
    };
    let [PathSegment::Field(name)] = segments.as_slice() else {
        return None;
    };

    let output = cx.service.structure(output_shape)?;
    let member = output.member(name)?;
    let Ok(Shape::List(list)) = cx.types.shape(&member.shape) else {
        return None;
    };
    let item_type = cx.types.rust_type(&list.member.shape).ok()?;
    Some((naming::field_ident(&member.name), item_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdkgen_parser::ServiceParser;

    const SERVICE: &str = r#"{
        "metadata": {
            "apiVersion": "2006-03-01",
            "endpointPrefix": "s3",
            "protocol": "rest-xml",
            "serviceId": "S3"
        },
        "operations": {
            "ListObjectsV2": {
                "name": "ListObjectsV2",
                "http": { "method": "GET", "requestUri": "/{Bucket}?list-type=2" },
                "input": { "shape": "ListObjectsV2Request" },
                "output": { "shape": "ListObjectsV2Output" }
            }
        },
        "shapes": {
            "ListObjectsV2Request": {
                "type": "structure",
                "required": ["Bucket"],
                "members": {
                    "Bucket": { "shape": "Name", "location": "uri", "locationName": "Bucket" },
                    "ContinuationToken": { "shape": "Name", "location": "querystring", "locationName": "continuation-token" },
                    "MaxKeys": { "shape": "Count", "location": "querystring", "locationName": "max-keys" }
                }
            },
            "ListObjectsV2Output": {
                "type": "structure",
                "members": {
                    "IsTruncated": { "shape": "Flag" },
                    "Contents": { "shape": "ObjectList", "flattened": true },
                    "NextContinuationToken": { "shape": "Name" },
                    "KeyCount": { "shape": "Count" }
                }
            },
            "ObjectList": { "type": "list", "member": { "shape": "Object" }, "flattened": true },
            "Object": { "type": "structure", "members": { "Key": { "shape": "Name" } } },
            "Name": { "type": "string" },
            "Count": { "type": "integer" },
            "Flag": { "type": "boolean" }
        }
    }"#;

    fn render_with(paginators: &str) -> Option<String> {
        let service = ServiceParser::from_json(SERVICE)
            .unwrap()
            .with_paginators_json(paginators)
            .unwrap()
            .parse()
            .unwrap();
        let cx = ServiceContext::new(&service, &[]).unwrap();
        let tera = templates::load_templates().unwrap();
        render(&cx, &tera).unwrap().map(|(source, _)| source)
    }

    #[test]
    fn test_paginator_with_more_results() {
        let source = render_with(
            r#"{ "pagination": { "ListObjectsV2": {
                "input_token": "ContinuationToken",
                "output_token": "NextContinuationToken",
                "limit_key": "MaxKeys",
                "more_results": "IsTruncated",
                "result_key": "Contents"
            } } }"#,
        )
        .unwrap();

        assert!(source.contains("pub struct ListObjectsV2Pages<'a, T> {"));
        assert!(source.contains("next.continuation_token = output.next_continuation_token.as_ref().cloned();"));
        assert!(source.contains("if output.is_truncated.as_ref().copied().unwrap_or(false) && next.continuation_token.is_some() && next != input {"));
        assert!(source.contains("pub fn list_objects_v2_pages(&self, input: crate::input::ListObjectsV2Input) -> ListObjectsV2Pages<'_, T> {"));
        assert!(source.contains("/// The page size is read from `input.max_keys`."));
        assert!(source.contains("-> impl Iterator<Item = Result<crate::types::Object, runtime::Error>> + '_ {"));
    }

    #[test]
    fn test_token_type_mismatch_is_skipped() {
        let source = render_with(
            r#"{ "pagination": { "ListObjectsV2": {
                "input_token": "ContinuationToken",
                "output_token": "KeyCount"
            } } }"#,
        );
        assert!(source.is_none());
    }

    #[test]
    fn test_without_limit_key_has_no_page_size_note() {
        let source = render_with(
            r#"{ "pagination": { "ListObjectsV2": {
                "input_token": "ContinuationToken",
                "output_token": "NextContinuationToken"
            } } }"#,
        )
        .unwrap();
        assert!(!source.contains("The page size is read from"));
    }

    #[test]
    fn test_projected_token_is_skipped() {
        let source = render_with(
            r#"{ "pagination": { "ListObjectsV2": {
                "input_token": "ContinuationToken",
                "output_token": "Contents[].Key"
            } } }"#,
        );
        assert!(source.is_none());
    }

    #[test]
    fn test_last_item_token() {
        let source = render_with(
            r#"{ "pagination": { "ListObjectsV2": {
                "input_token": "ContinuationToken",
                "output_token": "NextContinuationToken || Contents[-1].Key"
            } } }"#,
        )
        .unwrap();
        assert!(source.contains(
            "next.continuation_token = output.next_continuation_token.as_ref().or_else(|| output.contents.as_ref().and_then(|v| v.iter().rev().nth(0)).and_then(|v| v.key.as_ref())).cloned();"
        ));
    }

    #[test]
    fn test_most_negative_index() {
        let source = render_with(
            r#"{ "pagination": { "ListObjectsV2": {
                "input_token": "ContinuationToken",
                "output_token": "Contents[-9223372036854775808].Key"
            } } }"#,
        )
        .unwrap();
        assert!(source.contains(".and_then(|v| v.iter().rev().nth(9223372036854775807))"));
    }
}
