//! Intermediate representation of an AWS service definition
//!
//! The parser turns `api-2.json`, `paginators-1.json` and `waiters-2.json`
//! documents into a [`ServiceDefinition`]; the generator only ever looks at
//! these types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A complete service: metadata, operations, shapes, paginators and waiters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Service name used for module and crate names (e.g., "dynamodb")
    pub name: String,
    pub metadata: ServiceMetadata,
    pub documentation: Option<String>,
    pub operations: BTreeMap<String, Operation>,
    pub shapes: BTreeMap<String, Shape>,
    #[serde(default)]
    pub paginators: BTreeMap<String, Pagination>,
    #[serde(default)]
    pub waiters: BTreeMap<String, Waiter>,
}

impl ServiceDefinition {
    /// Get a shape by name
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.shapes.get(name)
    }

    /// Get a structure shape by name
    pub fn structure(&self, name: &str) -> Option<&StructureShape> {
        match self.shapes.get(name) {
            Some(Shape::Structure(structure)) => Some(structure),
            _ => None,
        }
    }

    /// Get an operation by name
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    /// Input structure of an operation, if it has one
    pub fn input_of(&self, operation: &Operation) -> Option<&StructureShape> {
        operation
            .input
            .as_deref()
            .and_then(|name| self.structure(name))
    }

    /// Output structure of an operation, if it has one
    pub fn output_of(&self, operation: &Operation) -> Option<&StructureShape> {
        operation
            .output
            .as_deref()
            .and_then(|name| self.structure(name))
    }
}

/// Service-level metadata from the `metadata` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub api_version: String,
    pub endpoint_prefix: String,
    pub service_id: String,
    pub service_full_name: String,
    pub protocol: Protocol,
    pub json_version: Option<String>,
    pub target_prefix: Option<String>,
    pub xml_namespace: Option<String>,
    pub signing_name: Option<String>,
    pub signature_version: Option<String>,
}

/// Wire protocol spoken by a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    Json,
    RestJson,
    RestXml,
    Query,
    Ec2,
}

/// How a request body or response body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Xml,
    Query,
}

impl Protocol {
    /// Parse the `metadata.protocol` string
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(Protocol::Json),
            "rest-json" => Some(Protocol::RestJson),
            "rest-xml" => Some(Protocol::RestXml),
            "query" => Some(Protocol::Query),
            "ec2" => Some(Protocol::Ec2),
            _ => None,
        }
    }

    /// Protocol name as it appears in service definitions
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Json => "json",
            Protocol::RestJson => "rest-json",
            Protocol::RestXml => "rest-xml",
            Protocol::Query => "query",
            Protocol::Ec2 => "ec2",
        }
    }

    /// Whether members can be bound to the URI, headers and query string
    pub fn is_rest(&self) -> bool {
        matches!(self, Protocol::RestJson | Protocol::RestXml)
    }

    pub fn request_encoding(&self) -> Encoding {
        match self {
            Protocol::Json | Protocol::RestJson => Encoding::Json,
            Protocol::RestXml => Encoding::Xml,
            Protocol::Query | Protocol::Ec2 => Encoding::Query,
        }
    }

    pub fn response_encoding(&self) -> Encoding {
        match self {
            Protocol::Json | Protocol::RestJson => Encoding::Json,
            Protocol::RestXml | Protocol::Query | Protocol::Ec2 => Encoding::Xml,
        }
    }

    /// Default timestamp format for values in the request/response body
    pub fn body_timestamp_format(&self) -> TimestampFormat {
        match self {
            Protocol::Json | Protocol::RestJson => TimestampFormat::UnixTimestamp,
            _ => TimestampFormat::Iso8601,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An API action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub http: HttpBinding,
    pub input: Option<String>,
    pub output: Option<String>,
    /// Element wrapping the output members in query/ec2 responses
    pub result_wrapper: Option<String>,
    pub errors: Vec<String>,
    pub documentation: Option<String>,
    pub deprecated: bool,
}

/// HTTP binding of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpBinding {
    pub method: String,
    /// Request URI template, e.g. `/{Bucket}/{Key+}?uploads`
    pub request_uri: String,
    pub response_code: Option<u16>,
}

impl HttpBinding {
    /// Path part of the request URI (before `?`)
    pub fn path(&self) -> &str {
        self.request_uri
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&self.request_uri)
    }

    /// Static query parameters baked into the request URI
    ///
    /// `/{Bucket}?list-type=2&uploads` yields `[("list-type", "2"), ("uploads", "")]`.
    pub fn static_query(&self) -> Vec<(String, String)> {
        let Some((_, query)) = self.request_uri.split_once('?') else {
            return Vec::new();
        };

        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect()
    }

    /// Placeholders of the path as `(member name, greedy)` pairs
    pub fn uri_placeholders(&self) -> Vec<(String, bool)> {
        let mut placeholders = Vec::new();
        let mut rest = self.path();

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let inner = &rest[start + 1..start + len];
            match inner.strip_suffix('+') {
                Some(name) => placeholders.push((name.to_string(), true)),
                None => placeholders.push((inner.to_string(), false)),
            }
            rest = &rest[start + len + 1..];
        }

        placeholders
    }
}

/// A named schema unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Structure(StructureShape),
    List(ListShape),
    Map(MapShape),
    Scalar(ScalarShape),
}

impl Shape {
    pub fn name(&self) -> &str {
        match self {
            Shape::Structure(s) => &s.name,
            Shape::List(s) => &s.name,
            Shape::Map(s) => &s.name,
            Shape::Scalar(s) => &s.name,
        }
    }

    pub fn documentation(&self) -> Option<&str> {
        match self {
            Shape::Structure(s) => s.documentation.as_deref(),
            Shape::List(s) => s.documentation.as_deref(),
            Shape::Map(s) => s.documentation.as_deref(),
            Shape::Scalar(s) => s.documentation.as_deref(),
        }
    }

    /// True for string shapes carrying an `enum` list
    pub fn is_enum(&self) -> bool {
        matches!(self, Shape::Scalar(s) if s.kind == ScalarKind::String && !s.enum_values.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureShape {
    pub name: String,
    /// Members in definition order
    pub members: Vec<Member>,
    /// Member sent as the whole HTTP body
    pub payload: Option<String>,
    pub exception: bool,
    pub error_code: Option<String>,
    pub location_name: Option<String>,
    pub xml_namespace: Option<XmlNamespace>,
    pub union: bool,
    pub documentation: Option<String>,
    pub deprecated: bool,
}

impl StructureShape {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// The member bound to the HTTP body, if any
    pub fn payload_member(&self) -> Option<&Member> {
        self.payload.as_deref().and_then(|name| self.member(name))
    }

    /// Members serialized into the body (no header/uri/query binding)
    pub fn body_members(&self) -> impl Iterator<Item = &Member> {
        self.members
            .iter()
            .filter(|m| m.location == Location::Body)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListShape {
    pub name: String,
    pub member: ShapeRef,
    pub flattened: bool,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapShape {
    pub name: String,
    pub key: ShapeRef,
    pub value: ShapeRef,
    pub flattened: bool,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarShape {
    pub name: String,
    pub kind: ScalarKind,
    #[serde(default)]
    pub enum_values: Vec<String>,
    pub timestamp_format: Option<TimestampFormat>,
    pub streaming: bool,
    pub sensitive: bool,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Timestamp,
    Blob,
    Document,
}

/// Wire format of a timestamp value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimestampFormat {
    Iso8601,
    UnixTimestamp,
    Rfc822,
}

impl TimestampFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "iso8601" => Some(TimestampFormat::Iso8601),
            "unixTimestamp" => Some(TimestampFormat::UnixTimestamp),
            "rfc822" => Some(TimestampFormat::Rfc822),
            _ => None,
        }
    }

    /// Variant name of the generated runtime's `TimestampFormat`
    pub fn runtime_variant(&self) -> &'static str {
        match self {
            TimestampFormat::Iso8601 => "Iso8601",
            TimestampFormat::UnixTimestamp => "UnixTimestamp",
            TimestampFormat::Rfc822 => "Rfc822",
        }
    }
}

/// Reference from a list or map to its element shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRef {
    pub shape: String,
    pub location_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlNamespace {
    pub uri: String,
    pub prefix: Option<String>,
}

impl XmlNamespace {
    /// Attribute declaring the namespace, e.g. `xmlns="…"` or `xmlns:s3="…"`
    pub fn attribute(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("xmlns:{}=\"{}\"", prefix, self.uri),
            None => format!("xmlns=\"{}\"", self.uri),
        }
    }
}

/// Where a member is bound in the HTTP message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Body,
    Header,
    /// Map of headers sharing the prefix given by `location_name`
    Headers,
    Querystring,
    Uri,
    StatusCode,
}

impl Location {
    pub fn from_name(name: Option<&str>) -> Option<Self> {
        match name {
            None => Some(Location::Body),
            Some("header") => Some(Location::Header),
            Some("headers") => Some(Location::Headers),
            Some("querystring") => Some(Location::Querystring),
            Some("uri") => Some(Location::Uri),
            Some("statusCode") => Some(Location::StatusCode),
            Some(_) => None,
        }
    }
}

/// A structure member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub shape: String,
    pub required: bool,
    pub location: Location,
    pub location_name: Option<String>,
    /// Name override for ec2 query serialization
    pub query_name: Option<String>,
    pub streaming: bool,
    pub idempotency_token: bool,
    pub flattened: bool,
    pub xml_attribute: bool,
    pub xml_namespace: Option<XmlNamespace>,
    pub timestamp_format: Option<TimestampFormat>,
    pub documentation: Option<String>,
    pub deprecated: bool,
}

impl Member {
    /// Name used on the wire: `locationName` when present, else the member name
    pub fn wire_name(&self) -> &str {
        self.location_name.as_deref().unwrap_or(&self.name)
    }
}

/// Paginator metadata for one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub operation: String,
    /// Input members receiving the tokens of the previous page
    pub input_tokens: Vec<String>,
    /// Paths into the output producing the next tokens
    pub output_tokens: Vec<PathExpression>,
    pub limit_key: Option<String>,
    pub result_keys: Vec<PathExpression>,
    pub more_results: Option<PathExpression>,
}

/// Waiter metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waiter {
    pub name: String,
    pub operation: String,
    /// Seconds between attempts
    pub delay: u32,
    pub max_attempts: u32,
    pub description: Option<String>,
    pub acceptors: Vec<Acceptor>,
}

impl Waiter {
    /// Whether every acceptor can be turned into code
    pub fn is_supported(&self) -> bool {
        self.acceptors
            .iter()
            .all(|a| !matches!(a.matcher, Matcher::Unsupported { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acceptor {
    pub state: AcceptorState,
    pub matcher: Matcher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptorState {
    Success,
    Failure,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Matcher {
    /// The single value at `argument` equals `expected`
    Path {
        argument: PathExpression,
        expected: ExpectedValue,
    },
    /// Every value of a projection equals `expected` (and there is at least one)
    PathAll {
        argument: PathExpression,
        expected: ExpectedValue,
    },
    /// At least one value of a projection equals `expected`
    PathAny {
        argument: PathExpression,
        expected: ExpectedValue,
    },
    /// The HTTP status code equals the expected code
    Status(u16),
    /// The operation failed with the given error code
    ErrorCode(String),
    /// `true`: the operation failed with any error, `false`: it succeeded
    AnyError(bool),
    /// The acceptor uses an expression outside the supported subset
    Unsupported { matcher: String, reason: String },
}

/// Literal compared against values found by a waiter path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpectedValue {
    String(String),
    Boolean(bool),
    Number(String),
}

impl ExpectedValue {
    /// Textual form compared against the stringified value
    pub fn as_text(&self) -> String {
        match self {
            ExpectedValue::String(s) => s.clone(),
            ExpectedValue::Boolean(b) => b.to_string(),
            ExpectedValue::Number(n) => n.clone(),
        }
    }
}

/// A path into an output structure
///
/// Supports the JMESPath subset used by paginator tokens and waiters:
/// dotted field access, `[]` projections, `[n]`/`[-n]` indexes and
/// `a || b` alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathExpression {
    pub alternatives: Vec<Vec<PathSegment>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathSegment {
    Field(String),
    Project,
    Index(i64),
}

impl PathExpression {
    /// A single-alternative path made of field accesses
    pub fn field_path(fields: &[&str]) -> Self {
        Self {
            alternatives: vec![fields
                .iter()
                .map(|f| PathSegment::Field(f.to_string()))
                .collect()],
        }
    }

    pub fn has_projection(&self) -> bool {
        self.alternatives
            .iter()
            .any(|segments| segments.contains(&PathSegment::Project))
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segments) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(" || ")?;
            }
            for (j, segment) in segments.iter().enumerate() {
                match segment {
                    PathSegment::Field(name) => {
                        if j > 0 {
                            f.write_str(".")?;
                        }
                        f.write_str(name)?;
                    }
                    PathSegment::Project => f.write_str("[]")?,
                    PathSegment::Index(index) => write!(f, "[{}]", index)?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(uri: &str) -> HttpBinding {
        HttpBinding {
            method: "GET".to_string(),
            request_uri: uri.to_string(),
            response_code: None,
        }
    }

    #[test]
    fn test_protocol_round_trip_names() {
        for name in ["json", "rest-json", "rest-xml", "query", "ec2"] {
            let protocol = Protocol::from_name(name).unwrap();
            assert_eq!(protocol.name(), name);
        }
        assert!(Protocol::from_name("smithy-rpc-v2-cbor").is_none());
    }

    #[test]
    fn test_protocol_encodings() {
        assert_eq!(Protocol::Query.request_encoding(), Encoding::Query);
        assert_eq!(Protocol::Query.response_encoding(), Encoding::Xml);
        assert_eq!(Protocol::RestJson.response_encoding(), Encoding::Json);
        assert!(Protocol::RestXml.is_rest());
        assert!(!Protocol::Json.is_rest());
    }

    #[test]
    fn test_static_query() {
        assert_eq!(
            binding("/{Bucket}?list-type=2&uploads").static_query(),
            vec![
                ("list-type".to_string(), "2".to_string()),
                ("uploads".to_string(), String::new())
            ]
        );
        assert!(binding("/").static_query().is_empty());
    }

    #[test]
    fn test_uri_placeholders() {
        let http = binding("/{Bucket}/{Key+}?uploadId={UploadId}");
        assert_eq!(
            http.uri_placeholders(),
            vec![("Bucket".to_string(), false), ("Key".to_string(), true)]
        );
        assert_eq!(http.path(), "/{Bucket}/{Key+}");
    }

    #[test]
    fn test_path_expression_display() {
        let expr = PathExpression {
            alternatives: vec![
                vec![PathSegment::Field("NextMarker".to_string())],
                vec![
                    PathSegment::Field("Contents".to_string()),
                    PathSegment::Index(-1),
                    PathSegment::Field("Key".to_string()),
                ],
            ],
        };
        assert_eq!(expr.to_string(), "NextMarker || Contents[-1].Key");
        assert!(!expr.has_projection());
    }

    #[test]
    fn test_xml_namespace_attribute() {
        let ns = XmlNamespace {
            uri: "http://s3.amazonaws.com/doc/2006-03-01/".to_string(),
            prefix: None,
        };
        assert_eq!(
            ns.attribute(),
            "xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\""
        );
    }
}
