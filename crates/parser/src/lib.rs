//! Parsing of AWS service definitions
//!
//! This crate turns the JSON documents describing an AWS service into the
//! intermediate representation (`ServiceDefinition`) consumed by the generator.
//!
//! ## Inputs
//!
//! - `api-2.json`: metadata, operations and shapes
//! - `paginators-1.json`: token metadata of paginated operations
//! - `waiters-2.json`: polling rules built on top of operations
//!
//! Shape references are resolved and checked while converting, so the
//! generator can rely on every referenced shape being present.

pub mod definition;
pub mod expression;
pub mod pagination;
pub mod waiter;

pub use definition::ServiceParser;
pub use expression::{parse_path_expression, ExpressionError};

use sdkgen_common::{Result, ServiceDefinition};
use std::path::Path;

/// Parse a service definition together with its optional paginator and waiter files
pub fn parse_service(
    definition: &Path,
    paginators: Option<&Path>,
    waiters: Option<&Path>,
) -> Result<ServiceDefinition> {
    let mut parser = ServiceParser::from_file(definition)?;
    if let Some(path) = paginators {
        parser = parser.with_paginators_file(path)?;
    }
    if let Some(path) = waiters {
        parser = parser.with_waiters_file(path)?;
    }
    parser.parse()
}
