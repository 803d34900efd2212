//! Service definition JSON type definitions
//!
//! These types mirror the structure of `api-2.json` files. Member order is
//! kept so generated fields follow the definition.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Root service definition document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDefinition {
    /// Definition format version (e.g., "2.0")
    #[serde(default)]
    pub version: Option<String>,

    pub metadata: RawMetadata,

    #[serde(default)]
    pub operations: IndexMap<String, RawOperation>,

    #[serde(default)]
    pub shapes: IndexMap<String, RawShape>,

    #[serde(default)]
    pub documentation: Option<String>,
}

/// Service metadata block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    pub api_version: String,
    pub endpoint_prefix: String,

    /// Single protocol (older definitions)
    #[serde(default)]
    pub protocol: Option<String>,

    /// Supported protocols in preference order (newer definitions)
    #[serde(default)]
    pub protocols: Vec<String>,

    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub service_abbreviation: Option<String>,
    #[serde(default)]
    pub service_full_name: Option<String>,
    #[serde(default)]
    pub json_version: Option<String>,
    #[serde(default)]
    pub target_prefix: Option<String>,
    #[serde(default)]
    pub xml_namespace: Option<String>,
    #[serde(default)]
    pub signing_name: Option<String>,
    #[serde(default)]
    pub signature_version: Option<String>,
}

/// Operation definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub http: RawHttp,

    #[serde(default)]
    pub input: Option<RawShapeRef>,

    #[serde(default)]
    pub output: Option<RawOutputRef>,

    #[serde(default)]
    pub errors: Vec<RawShapeRef>,

    #[serde(default)]
    pub documentation: Option<String>,

    #[serde(default)]
    pub deprecated: bool,
}

/// HTTP binding of an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHttp {
    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default = "default_request_uri")]
    pub request_uri: String,

    #[serde(default)]
    pub response_code: Option<u16>,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self {
            method: default_method(),
            request_uri: default_request_uri(),
            response_code: None,
        }
    }
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_request_uri() -> String {
    "/".to_string()
}

/// Reference to a shape (list member, map key/value, operation input, error)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShapeRef {
    pub shape: String,

    #[serde(default)]
    pub location_name: Option<String>,
}

/// Operation output reference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOutputRef {
    pub shape: String,

    /// Element wrapping the output in query responses
    #[serde(default)]
    pub result_wrapper: Option<String>,
}

/// A shape definition
///
/// Fields are the union of what every shape type may carry; `shape_type`
/// decides which of them are meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShape {
    #[serde(rename = "type")]
    pub shape_type: String,

    // Structure
    #[serde(default)]
    pub members: IndexMap<String, RawMember>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub exception: bool,
    #[serde(default)]
    pub error: Option<RawErrorInfo>,
    #[serde(default)]
    pub document: bool,
    #[serde(default)]
    pub union: bool,

    // List
    #[serde(default)]
    pub member: Option<RawShapeRef>,

    // Map
    #[serde(default)]
    pub key: Option<RawShapeRef>,
    #[serde(default)]
    pub value: Option<RawShapeRef>,

    // List and map
    #[serde(default)]
    pub flattened: bool,

    // Scalars
    #[serde(default, rename = "enum")]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub timestamp_format: Option<String>,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub sensitive: bool,

    // XML
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub xml_namespace: Option<RawXmlNamespace>,

    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
}

/// Structure member definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMember {
    pub shape: String,

    /// header, headers, querystring, uri or statusCode; absent means body
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub query_name: Option<String>,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub idempotency_token: bool,
    #[serde(default)]
    pub flattened: bool,
    #[serde(default)]
    pub xml_attribute: bool,
    #[serde(default)]
    pub xml_namespace: Option<RawXmlNamespace>,
    #[serde(default)]
    pub timestamp_format: Option<String>,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
}

/// Error metadata of an exception structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawErrorInfo {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub http_status_code: Option<u16>,
    #[serde(default)]
    pub sender_fault: bool,
}

/// XML namespace declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawXmlNamespace {
    pub uri: String,
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Common shape type names
pub mod shape_types {
    pub const STRUCTURE: &str = "structure";
    pub const LIST: &str = "list";
    pub const MAP: &str = "map";
}
