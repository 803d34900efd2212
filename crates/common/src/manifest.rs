//! Generation manifest loading from YAML files
//!
//! A manifest lists the services of a multi-service run, where their
//! definition files live and which operations to generate:
//!
//! ```yaml
//! version: 1
//! crate_prefix: aws-lite
//! output: ./generated
//! services:
//!   DynamoDb:
//!     source: models/dynamodb/api-2.json
//!     pagination: models/dynamodb/paginators-1.json
//!     waiter: models/dynamodb/waiters-2.json
//!     methods: [CreateTable, DescribeTable, ListTables]
//! ```

use crate::{naming, GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const SUPPORTED_VERSION: u32 = 1;

/// Root structure of a manifest file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: u32,
    /// Prefix of generated crate names (`{prefix}-{service}`)
    #[serde(default = "default_crate_prefix")]
    pub crate_prefix: String,
    /// Version written into generated Cargo.toml files
    #[serde(default = "default_crate_version")]
    pub crate_version: String,
    /// Output directory of the generated workspace
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Services keyed by their display name
    pub services: BTreeMap<String, ServiceManifest>,

    /// Directory the manifest was loaded from, used to resolve relative paths
    #[serde(skip)]
    base_dir: PathBuf,
}

/// One service entry of the manifest
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceManifest {
    /// Path to the `api-2.json` service definition
    pub source: PathBuf,
    /// Optional path to `paginators-1.json`
    #[serde(default)]
    pub pagination: Option<PathBuf>,
    /// Optional path to `waiters-2.json`
    #[serde(default)]
    pub waiter: Option<PathBuf>,
    /// Operations to generate; empty means every operation
    #[serde(default)]
    pub methods: Vec<String>,
    /// Overrides the `{prefix}-{service}` crate name
    #[serde(default)]
    pub crate_name: Option<String>,
}

fn default_crate_prefix() -> String {
    "aws-lite".to_string()
}

fn default_crate_version() -> String {
    "0.1.0".to_string()
}

impl Manifest {
    /// Load a manifest from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Parse(format!("Failed to read manifest file {:?}: {}", path, e))
        })?;

        let mut manifest = Self::from_yaml(&content)?;
        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(manifest)
    }

    /// Parse a manifest from YAML text; relative paths resolve against the
    /// current directory
    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content).map_err(|e| {
            GeneratorError::Parse(format!("Failed to parse manifest YAML: {}", e))
        })?;

        if manifest.version != SUPPORTED_VERSION {
            return Err(GeneratorError::Validation(format!(
                "Unsupported manifest version {} (expected {})",
                manifest.version, SUPPORTED_VERSION
            )));
        }

        if manifest.services.is_empty() {
            return Err(GeneratorError::Validation(
                "Manifest does not list any service".to_string(),
            ));
        }

        Ok(manifest)
    }

    /// Resolve a path from the manifest against the manifest's directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Crate name of a service: explicit override or `{prefix}-{service}`
    pub fn crate_name(&self, service_name: &str) -> String {
        self.services
            .get(service_name)
            .and_then(|s| s.crate_name.clone())
            .unwrap_or_else(|| {
                format!(
                    "{}-{}",
                    self.crate_prefix,
                    naming::to_snake_case(service_name).replace('_', "-")
                )
            })
    }

    /// Services whose name contains one of the filter entries (case-insensitive)
    pub fn filtered_services<'a>(
        &'a self,
        filter: Option<&'a [String]>,
    ) -> impl Iterator<Item = (&'a String, &'a ServiceManifest)> + 'a {
        self.services.iter().filter(move |(name, _)| match filter {
            Some(filter) => {
                let lower = name.to_lowercase();
                filter.iter().any(|f| lower.contains(&f.to_lowercase()))
            }
            None => true,
        })
    }
}
