//! Waiter definition (`waiters-2.json`) parsing

use crate::expression::parse_path_expression;
use indexmap::IndexMap;
use sdkgen_common::{
    Acceptor, AcceptorState, ExpectedValue, GeneratorError, Matcher, Result, ServiceDefinition,
    Waiter,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SUPPORTED_VERSION: u32 = 2;

/// Root waiter document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaiterDocument {
    pub version: u32,
    #[serde(default)]
    pub waiters: IndexMap<String, RawWaiter>,
}

/// One waiter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWaiter {
    pub operation: String,
    pub delay: u32,
    pub max_attempts: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub acceptors: Vec<RawAcceptor>,
}

/// One acceptor of a waiter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAcceptor {
    pub state: String,
    pub matcher: String,
    #[serde(default)]
    pub argument: Option<String>,
    #[serde(default)]
    pub expected: serde_json::Value,
}

/// Convert a waiter document, checking it against the service
pub fn convert_waiters(
    document: &WaiterDocument,
    service: &ServiceDefinition,
) -> Result<BTreeMap<String, Waiter>> {
    if document.version != SUPPORTED_VERSION {
        return Err(GeneratorError::Validation(format!(
            "Unsupported waiter document version {} (expected {})",
            document.version, SUPPORTED_VERSION
        )));
    }

    let mut waiters = BTreeMap::new();

    for (name, raw) in &document.waiters {
        if service.operation(&raw.operation).is_none() {
            return Err(GeneratorError::Validation(format!(
                "Waiter {} references unknown operation {}",
                name, raw.operation
            )));
        }

        let acceptors = raw
            .acceptors
            .iter()
            .map(|acceptor| convert_acceptor(name, acceptor))
            .collect::<Result<Vec<_>>>()?;

        waiters.insert(
            name.clone(),
            Waiter {
                name: name.clone(),
                operation: raw.operation.clone(),
                delay: raw.delay,
                max_attempts: raw.max_attempts,
                description: raw.description.clone(),
                acceptors,
            },
        );
    }

    Ok(waiters)
}

fn convert_acceptor(waiter: &str, raw: &RawAcceptor) -> Result<Acceptor> {
    let state = match raw.state.as_str() {
        "success" => AcceptorState::Success,
        "failure" => AcceptorState::Failure,
        "retry" => AcceptorState::Retry,
        other => {
            return Err(GeneratorError::Validation(format!(
                "Waiter {} has acceptor with unknown state {}",
                waiter, other
            )))
        }
    };

    let matcher = match raw.matcher.as_str() {
        "path" | "pathAll" | "pathAny" => convert_path_matcher(waiter, raw)?,
        "status" => {
            let code = raw
                .expected
                .as_u64()
                .and_then(|code| u16::try_from(code).ok())
                .ok_or_else(|| {
                    GeneratorError::Validation(format!(
                        "Waiter {} has status acceptor without a numeric status",
                        waiter
                    ))
                })?;
            Matcher::Status(code)
        }
        "error" => match &raw.expected {
            serde_json::Value::String(code) => Matcher::ErrorCode(code.clone()),
            serde_json::Value::Bool(any) => Matcher::AnyError(*any),
            other => {
                return Err(GeneratorError::Validation(format!(
                    "Waiter {} has error acceptor with unexpected value {}",
                    waiter, other
                )))
            }
        },
        other => Matcher::Unsupported {
            matcher: other.to_string(),
            reason: "unknown matcher".to_string(),
        },
    };

    Ok(Acceptor { state, matcher })
}

fn convert_path_matcher(waiter: &str, raw: &RawAcceptor) -> Result<Matcher> {
    let unsupported = |reason: String| Matcher::Unsupported {
        matcher: raw.matcher.clone(),
        reason,
    };

    let argument = raw.argument.as_deref().ok_or_else(|| {
        GeneratorError::Validation(format!(
            "Waiter {} has {} acceptor without argument",
            waiter, raw.matcher
        ))
    })?;

    let argument = match parse_path_expression(argument) {
        Ok(expression) => expression,
        Err(e) => return Ok(unsupported(format!("{} ({})", e, argument))),
    };

    if argument.alternatives.len() > 1 {
        return Ok(unsupported(format!("alternatives are not supported ({})", argument)));
    }

    let expected = match &raw.expected {
        serde_json::Value::String(s) => ExpectedValue::String(s.clone()),
        serde_json::Value::Bool(b) => ExpectedValue::Boolean(*b),
        serde_json::Value::Number(n) => ExpectedValue::Number(n.to_string()),
        other => return Ok(unsupported(format!("cannot compare against {}", other))),
    };

    Ok(match raw.matcher.as_str() {
        "path" if argument.has_projection() => {
            unsupported(format!("path matcher over a projection ({})", argument))
        }
        "path" => Matcher::Path { argument, expected },
        "pathAll" => Matcher::PathAll { argument, expected },
        _ => Matcher::PathAny { argument, expected },
    })
}
