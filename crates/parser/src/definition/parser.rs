//! Service definition file parser

use super::types::ApiDefinition;
use crate::pagination::PaginatorDocument;
use crate::waiter::WaiterDocument;
use sdkgen_common::{naming, GeneratorError, Result, ServiceDefinition};
use std::fs;
use std::path::Path;

/// Service definition parser
///
/// Reads `api-2.json` and, optionally, the paginator and waiter documents of
/// the same service.
pub struct ServiceParser {
    /// Loaded service definition
    definition: ApiDefinition,

    /// Service name override (defaults to the snake_case service id)
    service_name: Option<String>,

    paginators: Option<PaginatorDocument>,

    waiters: Option<WaiterDocument>,
}

impl ServiceParser {
    /// Load a service definition from file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = ServiceParser::from_file("models/sqs/api-2.json")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = read_file(path.as_ref(), "service definition")?;
        Self::from_json(&content)
    }

    /// Parse a service definition from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: ApiDefinition = serde_json::from_str(json).map_err(|e| {
            GeneratorError::Parse(format!("Failed to parse service definition JSON: {}", e))
        })?;

        Ok(Self {
            definition,
            service_name: None,
            paginators: None,
            waiters: None,
        })
    }

    /// Override the service name used for generated module and crate names
    pub fn with_service_name(mut self, name: &str) -> Self {
        self.service_name = Some(naming::to_snake_case(name));
        self
    }

    /// Attach a `paginators-1.json` file
    pub fn with_paginators_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let content = read_file(path.as_ref(), "paginator definition")?;
        self.with_paginators_json(&content)
    }

    /// Attach a paginator document from JSON string
    pub fn with_paginators_json(mut self, json: &str) -> Result<Self> {
        let document: PaginatorDocument = serde_json::from_str(json).map_err(|e| {
            GeneratorError::Parse(format!("Failed to parse paginator JSON: {}", e))
        })?;
        self.paginators = Some(document);
        Ok(self)
    }

    /// Attach a `waiters-2.json` file
    pub fn with_waiters_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let content = read_file(path.as_ref(), "waiter definition")?;
        self.with_waiters_json(&content)
    }

    /// Attach a waiter document from JSON string
    pub fn with_waiters_json(mut self, json: &str) -> Result<Self> {
        let document: WaiterDocument = serde_json::from_str(json)
            .map_err(|e| GeneratorError::Parse(format!("Failed to parse waiter JSON: {}", e)))?;
        self.waiters = Some(document);
        Ok(self)
    }

    /// Service name the definition will be converted under
    pub fn service_name(&self) -> String {
        self.service_name.clone().unwrap_or_else(|| {
            let id = self
                .definition
                .metadata
                .service_id
                .as_deref()
                .or(self.definition.metadata.service_abbreviation.as_deref())
                .unwrap_or(&self.definition.metadata.endpoint_prefix);
            naming::to_snake_case(&id.replace(' ', ""))
        })
    }

    /// Parse the loaded documents into a ServiceDefinition
    pub fn parse(&self) -> Result<ServiceDefinition> {
        let mut service =
            super::converter::convert_definition(&self.definition, &self.service_name())?;

        if let Some(document) = &self.paginators {
            service.paginators = crate::pagination::convert_paginators(document, &service)?;
        }
        if let Some(document) = &self.waiters {
            service.waiters = crate::waiter::convert_waiters(document, &service)?;
        }

        Ok(service)
    }

    /// Get reference to the underlying definition
    pub fn definition(&self) -> &ApiDefinition {
        &self.definition
    }
}

fn read_file(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        GeneratorError::Parse(format!(
            "Failed to read {} {}: {}",
            what,
            path.display(),
            e
        ))
    })
}
