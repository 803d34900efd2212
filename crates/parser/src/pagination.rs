//! Paginator definition (`paginators-1.json`) parsing

use crate::expression::{parse_path_expression, ExpressionError};
use indexmap::IndexMap;
use sdkgen_common::{GeneratorError, Pagination, PathExpression, Result, ServiceDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root paginator document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatorDocument {
    #[serde(default)]
    pub pagination: IndexMap<String, RawPaginator>,
}

/// Paginator entry of one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPaginator {
    #[serde(default)]
    pub input_token: Option<OneOrMany>,
    #[serde(default)]
    pub output_token: Option<OneOrMany>,
    #[serde(default)]
    pub limit_key: Option<String>,
    #[serde(default)]
    pub result_key: Option<OneOrMany>,
    #[serde(default)]
    pub more_results: Option<String>,
}

/// A value that is either a single string or a list of strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value.clone()],
            OneOrMany::Many(values) => values.clone(),
        }
    }
}

/// Convert a paginator document, checking it against the service
pub fn convert_paginators(
    document: &PaginatorDocument,
    service: &ServiceDefinition,
) -> Result<BTreeMap<String, Pagination>> {
    let mut paginators = BTreeMap::new();

    for (operation_name, raw) in &document.pagination {
        let operation = service.operation(operation_name).ok_or_else(|| {
            GeneratorError::Validation(format!(
                "Paginator references unknown operation {}",
                operation_name
            ))
        })?;

        let (Some(input_token), Some(output_token)) = (&raw.input_token, &raw.output_token) else {
            // Result aggregation without tokens; nothing to iterate
            tracing::debug!(operation = %operation_name, "skipping paginator without tokens");
            continue;
        };

        let input_tokens = input_token.to_vec();
        let result_paths = raw
            .result_key
            .as_ref()
            .map(OneOrMany::to_vec)
            .unwrap_or_default();

        let expressions = (
            parse_all(&output_token.to_vec()),
            parse_all(&result_paths),
            raw.more_results
                .as_deref()
                .map(parse_path_expression)
                .transpose(),
        );
        let (output_tokens, result_keys, more_results) = match expressions {
            (Ok(output_tokens), Ok(result_keys), Ok(more_results)) => {
                (output_tokens, result_keys, more_results)
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                tracing::warn!(operation = %operation_name, "skipping paginator: {}", e);
                continue;
            }
        };

        if input_tokens.len() != output_tokens.len() {
            return Err(GeneratorError::Validation(format!(
                "Paginator {} has {} input tokens but {} output tokens",
                operation_name,
                input_tokens.len(),
                output_tokens.len()
            )));
        }

        let input = service.input_of(operation);
        for token in input_tokens.iter().chain(raw.limit_key.iter()) {
            if !input.is_some_and(|shape| shape.member(token).is_some()) {
                return Err(GeneratorError::Validation(format!(
                    "Paginator {} uses {} which is not a member of the operation input",
                    operation_name, token
                )));
            }
        }

        paginators.insert(
            operation_name.clone(),
            Pagination {
                operation: operation_name.clone(),
                input_tokens,
                output_tokens,
                limit_key: raw.limit_key.clone(),
                result_keys,
                more_results,
            },
        );
    }

    Ok(paginators)
}

fn parse_all(paths: &[String]) -> std::result::Result<Vec<PathExpression>, ExpressionError> {
    paths.iter().map(|path| parse_path_expression(path)).collect()
}
