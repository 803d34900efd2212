//! Path expressions used by paginator tokens and waiter acceptors
//!
//! Only the JMESPath subset that maps directly onto generated field access is
//! accepted: `A.B`, `A[].B`, `A[*].B`, `A[0]`, `A[-1].B` and `X || Y`.
//! Functions, filters, comparisons and literals are rejected.

use sdkgen_common::{PathExpression, PathSegment};
use thiserror::Error;

/// Reasons a path expression cannot be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("empty path expression")]
    Empty,

    #[error("unexpected '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("expression ends with '.'")]
    TrailingDot,

    #[error("unsupported expression: {0}")]
    Unsupported(String),
}

/// Parse a path expression
///
/// # Examples
/// ```
/// use sdkgen_parser::parse_path_expression;
///
/// let expr = parse_path_expression("NextMarker || Contents[-1].Key").unwrap();
/// assert_eq!(expr.alternatives.len(), 2);
/// assert!(parse_path_expression("length(Items) > `0`").is_err());
/// ```
pub fn parse_path_expression(input: &str) -> Result<PathExpression, ExpressionError> {
    let alternatives = input
        .split("||")
        .map(|alternative| parse_alternative(alternative.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PathExpression { alternatives })
}

fn parse_alternative(input: &str) -> Result<Vec<PathSegment>, ExpressionError> {
    if input.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let chars: Vec<char> = input.chars().collect();
    let mut segments = Vec::new();
    let mut expect_field = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_alphanumeric() || c == '_' {
            if !expect_field {
                return Err(ExpressionError::UnexpectedCharacter {
                    character: c,
                    position: i,
                });
            }
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            segments.push(PathSegment::Field(chars[start..i].iter().collect()));
            expect_field = false;
        } else if c == '.' {
            if expect_field {
                return Err(ExpressionError::UnexpectedCharacter {
                    character: c,
                    position: i,
                });
            }
            expect_field = true;
            i += 1;
        } else if c == '[' {
            if expect_field {
                return Err(ExpressionError::UnexpectedCharacter {
                    character: c,
                    position: i,
                });
            }
            let close = chars[i..]
                .iter()
                .position(|&ch| ch == ']')
                .map(|offset| i + offset)
                .ok_or_else(|| ExpressionError::Unsupported(input.to_string()))?;

            let inner: String = chars[i + 1..close].iter().collect();
            let segment = match inner.trim() {
                "" | "*" => PathSegment::Project,
                index => index
                    .parse::<i64>()
                    .map(PathSegment::Index)
                    .map_err(|_| ExpressionError::Unsupported(input.to_string()))?,
            };
            segments.push(segment);
            i = close + 1;
        } else {
            return Err(ExpressionError::Unsupported(input.to_string()));
        }
    }

    if expect_field {
        return Err(ExpressionError::TrailingDot);
    }

    Ok(segments)
}
