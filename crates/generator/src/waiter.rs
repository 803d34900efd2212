//! Waiters: poll an operation until an acceptor matches

use crate::client::client_name;
use crate::code::{literal, Code};
use crate::context::ServiceContext;
use crate::input::input_type;
use crate::output::output_type;
use crate::templates;
use sdkgen_common::{
    naming, Acceptor, AcceptorState, Encoding, ExpectedValue, Matcher, Operation, PathExpression,
    PathSegment, Result, ScalarKind, Shape, Waiter,
};
use tera::Tera;

/// Render `waiters.rs`, or `None` when no waiter applies
///
/// Returns the source and the names of the generated items.
pub(crate) fn render(cx: &ServiceContext<'_>, tera: &Tera) -> Result<Option<(String, Vec<String>)>> {
    let mut code = Code::new(1);
    let mut names = Vec::new();

    for waiter in cx.service.waiters.values() {
        if !cx.usage.is_selected(&waiter.operation) {
            tracing::debug!(waiter = %waiter.name, "operation not selected, skipping waiter");
            continue;
        }
        match waiter_methods(cx, waiter) {
            Ok(methods) => {
                if !names.is_empty() {
                    code.line("");
                }
                code.extend(methods);
                names.push(waiter.name.clone());
            }
            Err(reason) => {
                tracing::warn!(
                    service = %cx.service.name,
                    waiter = %waiter.name,
                    "skipping waiter: {}",
                    reason
                );
            }
        }
    }

    if names.is_empty() {
        return Ok(None);
    }

    let mut context = tera::Context::new();
    context.insert("client_name", &client_name(cx.service));
    context.insert("waiters", &code.finish());
    let source = templates::render(tera, "waiters.rs", &context)?;
    Ok(Some((source, names)))
}

fn state_expr(state: AcceptorState) -> &'static str {
    match state {
        AcceptorState::Success => "return Ok(runtime::WaiterState::Success);",
        AcceptorState::Failure => "return Ok(runtime::WaiterState::Failure);",
        AcceptorState::Retry => "return Ok(runtime::WaiterState::Retry);",
    }
}

/// Emit the public waiter methods and the poll function of one waiter
fn waiter_methods(
    cx: &ServiceContext<'_>,
    waiter: &Waiter,
) -> std::result::Result<Code, String> {
    if !waiter.is_supported() {
        let reasons = waiter
            .acceptors
            .iter()
            .filter_map(|a| match &a.matcher {
                Matcher::Unsupported { matcher, reason } => Some(format!("{}: {}", matcher, reason)),
                _ => None,
            })
            .collect::<Vec<_>>();
        return Err(reasons.join("; "));
    }

    let operation = cx
        .service
        .operation(&waiter.operation)
        .ok_or_else(|| format!("unknown operation {}", waiter.operation))?;

    let snake = naming::to_snake_case(&waiter.name);
    let input_path = format!("crate::input::{}", input_type(operation));

    let mut code = Code::new(1);
    match &waiter.description {
        Some(description) => code.line(format!("/// {}", description.trim())),
        None => code.line(format!(
            "/// Wait until `{}` reports the `{}` condition",
            operation.name, waiter.name
        )),
    }
    code.line("///");
    code.line(format!(
        "/// Polls every {} seconds, giving up after {} attempts.",
        waiter.delay, waiter.max_attempts
    ));
    code.open(format!(
        "pub fn wait_until_{}(&self, input: &{}) -> Result<(), runtime::Error> {{",
        snake, input_path
    ));
    code.line(format!(
        "self.wait_until_{}_with(input, std::time::Duration::from_secs({}), {})",
        snake, waiter.delay, waiter.max_attempts
    ));
    code.close("}");
    code.line("");

    code.line(format!(
        "/// [`Self::wait_until_{}`] with a custom delay and attempt limit",
        snake
    ));
    code.open(format!(
        "pub fn wait_until_{}_with(&self, input: &{}, delay: std::time::Duration, max_attempts: u32) -> Result<(), runtime::Error> {{",
        snake, input_path
    ));
    code.line(format!(
        "runtime::wait({}, delay, max_attempts, || self.poll_{}(input))",
        literal(&waiter.name),
        snake
    ));
    code.close("}");
    code.line("");

    code.extend(poll_function(cx, waiter, operation, &snake, &input_path)?);
    Ok(code)
}

fn poll_function(
    cx: &ServiceContext<'_>,
    waiter: &Waiter,
    operation: &Operation,
    snake: &str,
    input_path: &str,
) -> std::result::Result<Code, String> {
    let error_format = match cx.protocol().response_encoding() {
        Encoding::Json => "runtime::ErrorFormat::Json",
        _ => "runtime::ErrorFormat::Xml",
    };

    let mut code = Code::new(1);
    code.open(format!(
        "fn poll_{}(&self, input: &{}) -> Result<runtime::WaiterState, runtime::Error> {{",
        snake, input_path
    ));
    code.line("let response = self.transport.send(input.request()?)?;");
    code.line("");

    // Failed responses
    let mut failure = Vec::new();
    let mut failure_ends = false;
    for acceptor in &waiter.acceptors {
        match acceptor.matcher {
            Matcher::ErrorCode(_) | Matcher::Status(_) => failure.push(acceptor),
            Matcher::AnyError(true) => {
                failure.push(acceptor);
                failure_ends = true;
                break;
            }
            _ => {}
        }
    }
    let uses_error = !failure_ends
        || failure
            .iter()
            .any(|a| matches!(a.matcher, Matcher::ErrorCode(_)));

    code.open("if !response.is_success() {");
    if uses_error {
        code.line(format!(
            "let error = runtime::api_error(&response, {});",
            error_format
        ));
    }
    for acceptor in &failure {
        match &acceptor.matcher {
            Matcher::ErrorCode(error_code) => {
                code.open(format!("if error.code() == Some({}) {{", literal(error_code)));
                code.line(state_expr(acceptor.state));
                code.close("}");
            }
            Matcher::Status(status) => {
                code.open(format!("if response.status == {} {{", status));
                code.line(state_expr(acceptor.state));
                code.close("}");
            }
            _ => code.line(state_expr(acceptor.state)),
        }
    }
    if !failure_ends {
        code.line("return Err(error);");
    }
    code.close("}");
    code.line("");

    // Successful responses
    let has_paths = waiter
        .acceptors
        .iter()
        .take_while(|a| a.matcher != Matcher::AnyError(false))
        .any(is_path);
    if has_paths {
        if operation.output.is_none() {
            return Err(format!("{} has no output to match paths against", operation.name));
        }
        code.line(format!(
            "let output = crate::output::{}::from_response(&response)?;",
            output_type(operation)
        ));
    }

    let mut index = 0;
    for acceptor in &waiter.acceptors {
        match &acceptor.matcher {
            Matcher::Status(status) => {
                code.open(format!("if response.status == {} {{", status));
                code.line(state_expr(acceptor.state));
                code.close("}");
            }
            Matcher::AnyError(false) => {
                code.line(state_expr(acceptor.state));
                return Ok(finish(code));
            }
            Matcher::Path { argument, expected } | Matcher::PathAny { argument, expected } => {
                let values = format!("values{}", index);
                index += 1;
                path_values(cx, operation, argument, &values, &mut code)?;
                code.open(format!(
                    "if {}.iter().any(|v| v == {}) {{",
                    values,
                    expected_literal(expected)
                ));
                code.line(state_expr(acceptor.state));
                code.close("}");
            }
            Matcher::PathAll { argument, expected } => {
                let values = format!("values{}", index);
                index += 1;
                path_values(cx, operation, argument, &values, &mut code)?;
                code.open(format!(
                    "if !{0}.is_empty() && {0}.iter().all(|v| v == {1}) {{",
                    values,
                    expected_literal(expected)
                ));
                code.line(state_expr(acceptor.state));
                code.close("}");
            }
            _ => {}
        }
    }

    code.line("Ok(runtime::WaiterState::Retry)");
    Ok(finish(code))
}

fn finish(mut code: Code) -> Code {
    code.close("}");
    code
}

fn is_path(acceptor: &Acceptor) -> bool {
    matches!(
        acceptor.matcher,
        Matcher::Path { .. } | Matcher::PathAll { .. } | Matcher::PathAny { .. }
    )
}

fn expected_literal(expected: &ExpectedValue) -> String {
    literal(&expected.as_text())
}

/// Collect the stringified values found at `argument` into `values`
fn path_values(
    cx: &ServiceContext<'_>,
    operation: &Operation,
    argument: &PathExpression,
    values: &str,
    code: &mut Code,
) -> std::result::Result<(), String> {
    let [segments] = argument.alternatives.as_slice() else {
        return Err(format!("{} has alternatives", argument));
    };
    let mut shape_name = operation
        .output
        .clone()
        .ok_or_else(|| format!("{} has no output", operation.name))?;

    let mut expr = "std::iter::once(&output)".to_string();
    for segment in segments {
        let shape = cx.types.shape(&shape_name).map_err(|e| e.to_string())?;
        match (segment, shape) {
            (PathSegment::Field(name), Shape::Structure(structure)) => {
                let member = structure
                    .member(name)
                    .ok_or_else(|| format!("{} has no member {}", structure.name, name))?;
                expr.push_str(&format!(
                    ".filter_map(|v| v.{}.as_ref())",
                    naming::field_ident(&member.name)
                ));
                shape_name = member.shape.clone();
            }
            (PathSegment::Project, Shape::List(list)) => {
                expr.push_str(".flat_map(|v| v.iter())");
                shape_name = list.member.shape.clone();
            }
            (PathSegment::Index(i), Shape::List(list)) => {
                if *i >= 0 {
                    expr.push_str(&format!(".filter_map(|v| v.get({}))", i));
                } else {
                    expr.push_str(&format!(
                        ".filter_map(|v| v.iter().rev().nth({}))",
                        i.unsigned_abs() - 1
                    ));
                }
                shape_name = list.member.shape.clone();
            }
            _ => return Err(format!("{} does not match the output shape", argument)),
        }
    }

    match cx.types.shape(&shape_name).map_err(|e| e.to_string())? {
        Shape::Scalar(scalar) if scalar.kind != ScalarKind::Blob => {}
        _ => return Err(format!("{} does not end at a comparable value", argument)),
    }

    code.line(format!(
        "let {}: Vec<String> = {}.map(|v| v.to_string()).collect();",
        values, expr
    ));
    Ok(())
}
