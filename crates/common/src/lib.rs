//! Common types and utilities for sdkgen
//!
//! This crate contains the service-definition model shared by the parser and
//! the generator, the error type used across the workspace, naming helpers
//! and the YAML manifest describing multi-service generation runs.

pub mod manifest;
pub mod model;
pub mod naming;

pub use manifest::{Manifest, ServiceManifest};
pub use model::*;

use thiserror::Error;

/// Errors that can occur while reading definitions or generating code
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;
