//! Converts a service definition document to ServiceDefinition IR

use super::types::{shape_types, ApiDefinition, RawMember, RawShape, RawXmlNamespace};
use indexmap::IndexMap;
use sdkgen_common::{
    GeneratorError, HttpBinding, ListShape, Location, MapShape, Member, Operation, Protocol,
    Result, ScalarKind, ScalarShape, ServiceDefinition, ServiceMetadata, Shape, ShapeRef,
    StructureShape, TimestampFormat, XmlNamespace,
};
use std::collections::BTreeMap;

/// Convert a parsed definition document to ServiceDefinition
pub fn convert_definition(definition: &ApiDefinition, service_name: &str) -> Result<ServiceDefinition> {
    let metadata = convert_metadata(definition)?;

    let mut shapes = BTreeMap::new();
    for (name, raw) in &definition.shapes {
        let shape = convert_shape(name, raw, &definition.shapes)?;
        shapes.insert(name.clone(), shape);
    }

    let mut operations = BTreeMap::new();
    for (name, raw) in &definition.operations {
        let operation = Operation {
            name: raw.name.clone().unwrap_or_else(|| name.clone()),
            http: HttpBinding {
                method: raw.http.method.to_uppercase(),
                request_uri: raw.http.request_uri.clone(),
                response_code: raw.http.response_code,
            },
            input: raw.input.as_ref().map(|r| r.shape.clone()),
            output: raw.output.as_ref().map(|r| r.shape.clone()),
            result_wrapper: raw.output.as_ref().and_then(|r| r.result_wrapper.clone()),
            errors: raw.errors.iter().map(|r| r.shape.clone()).collect(),
            documentation: raw.documentation.clone(),
            deprecated: raw.deprecated,
        };
        validate_operation(&operation, &shapes)?;
        operations.insert(name.clone(), operation);
    }

    tracing::debug!(
        service = service_name,
        operations = operations.len(),
        shapes = shapes.len(),
        "converted service definition"
    );

    Ok(ServiceDefinition {
        name: service_name.to_string(),
        metadata,
        documentation: definition.documentation.clone(),
        operations,
        shapes,
        paginators: BTreeMap::new(),
        waiters: BTreeMap::new(),
    })
}

/// Resolve protocol and identifiers of the metadata block
fn convert_metadata(definition: &ApiDefinition) -> Result<ServiceMetadata> {
    let raw = &definition.metadata;

    // Older definitions carry `protocol`, newer ones a preference list
    let protocol_name = raw
        .protocol
        .as_deref()
        .or_else(|| {
            raw.protocols
                .iter()
                .map(String::as_str)
                .find(|p| Protocol::from_name(p).is_some())
        })
        .ok_or_else(|| {
            GeneratorError::Validation("Service metadata does not declare a protocol".to_string())
        })?;

    let protocol = Protocol::from_name(protocol_name).ok_or_else(|| {
        GeneratorError::Validation(format!("Unsupported protocol: {}", protocol_name))
    })?;

    let service_id = raw
        .service_id
        .clone()
        .or_else(|| raw.service_abbreviation.clone())
        .unwrap_or_else(|| raw.endpoint_prefix.clone());

    if protocol == Protocol::Json && raw.target_prefix.is_none() {
        return Err(GeneratorError::Validation(format!(
            "Service {} uses the json protocol but has no targetPrefix",
            service_id
        )));
    }

    Ok(ServiceMetadata {
        api_version: raw.api_version.clone(),
        endpoint_prefix: raw.endpoint_prefix.clone(),
        service_full_name: raw
            .service_full_name
            .clone()
            .unwrap_or_else(|| service_id.clone()),
        service_id,
        protocol,
        json_version: raw.json_version.clone(),
        target_prefix: raw.target_prefix.clone(),
        xml_namespace: raw.xml_namespace.clone(),
        signing_name: raw.signing_name.clone(),
        signature_version: raw.signature_version.clone(),
    })
}

/// Convert one raw shape
fn convert_shape(name: &str, raw: &RawShape, all: &IndexMap<String, RawShape>) -> Result<Shape> {
    match raw.shape_type.as_str() {
        shape_types::STRUCTURE if raw.document => Ok(Shape::Scalar(ScalarShape {
            name: name.to_string(),
            kind: ScalarKind::Document,
            enum_values: Vec::new(),
            timestamp_format: None,
            streaming: false,
            sensitive: raw.sensitive,
            documentation: raw.documentation.clone(),
        })),
        shape_types::STRUCTURE => convert_structure(name, raw, all).map(Shape::Structure),
        shape_types::LIST => {
            let member = raw.member.as_ref().ok_or_else(|| {
                GeneratorError::Validation(format!("List shape {} has no member", name))
            })?;
            ensure_shape_exists(all, &member.shape, name)?;

            Ok(Shape::List(ListShape {
                name: name.to_string(),
                member: ShapeRef {
                    shape: member.shape.clone(),
                    location_name: member.location_name.clone(),
                },
                flattened: raw.flattened,
                documentation: raw.documentation.clone(),
            }))
        }
        shape_types::MAP => {
            let (key, value) = match (&raw.key, &raw.value) {
                (Some(key), Some(value)) => (key, value),
                _ => {
                    return Err(GeneratorError::Validation(format!(
                        "Map shape {} needs both key and value",
                        name
                    )))
                }
            };
            ensure_shape_exists(all, &key.shape, name)?;
            ensure_shape_exists(all, &value.shape, name)?;

            Ok(Shape::Map(MapShape {
                name: name.to_string(),
                key: ShapeRef {
                    shape: key.shape.clone(),
                    location_name: key.location_name.clone(),
                },
                value: ShapeRef {
                    shape: value.shape.clone(),
                    location_name: value.location_name.clone(),
                },
                flattened: raw.flattened,
                documentation: raw.documentation.clone(),
            }))
        }
        other => {
            let kind = scalar_kind(other).ok_or_else(|| {
                GeneratorError::Validation(format!(
                    "Shape {} has unsupported type '{}'",
                    name, other
                ))
            })?;

            Ok(Shape::Scalar(ScalarShape {
                name: name.to_string(),
                kind,
                enum_values: raw.enum_values.clone(),
                timestamp_format: parse_timestamp_format(raw.timestamp_format.as_deref(), name)?,
                streaming: raw.streaming,
                sensitive: raw.sensitive,
                documentation: raw.documentation.clone(),
            }))
        }
    }
}

/// Map a scalar type name to ScalarKind
fn scalar_kind(type_name: &str) -> Option<ScalarKind> {
    match type_name {
        "string" => Some(ScalarKind::String),
        "byte" | "short" | "integer" => Some(ScalarKind::Integer),
        "long" => Some(ScalarKind::Long),
        "float" => Some(ScalarKind::Float),
        "double" => Some(ScalarKind::Double),
        "boolean" => Some(ScalarKind::Boolean),
        "timestamp" => Some(ScalarKind::Timestamp),
        "blob" => Some(ScalarKind::Blob),
        _ => None,
    }
}

/// Convert a structure shape, checking members, `required` and `payload`
fn convert_structure(
    name: &str,
    raw: &RawShape,
    all: &IndexMap<String, RawShape>,
) -> Result<StructureShape> {
    for required in &raw.required {
        if !raw.members.contains_key(required) {
            return Err(GeneratorError::Validation(format!(
                "Structure {} requires unknown member {}",
                name, required
            )));
        }
    }

    if let Some(payload) = &raw.payload {
        if !raw.members.contains_key(payload) {
            return Err(GeneratorError::Validation(format!(
                "Structure {} uses unknown member {} as payload",
                name, payload
            )));
        }
    }

    let mut members = Vec::with_capacity(raw.members.len());
    for (member_name, raw_member) in &raw.members {
        let target = all.get(&raw_member.shape).ok_or_else(|| {
            GeneratorError::Validation(format!(
                "Member {}.{} references unknown shape {}",
                name, member_name, raw_member.shape
            ))
        })?;
        members.push(convert_member(
            name,
            member_name,
            raw_member,
            target,
            raw.required.contains(member_name),
        )?);
    }

    Ok(StructureShape {
        name: name.to_string(),
        members,
        payload: raw.payload.clone(),
        exception: raw.exception,
        error_code: raw.error.as_ref().and_then(|e| e.code.clone()),
        location_name: raw.location_name.clone(),
        xml_namespace: raw.xml_namespace.as_ref().map(convert_namespace),
        union: raw.union,
        documentation: raw.documentation.clone(),
        deprecated: raw.deprecated,
    })
}

/// Convert a member; streaming and flattened flags may live on the target shape
fn convert_member(
    structure: &str,
    name: &str,
    raw: &RawMember,
    target: &RawShape,
    required: bool,
) -> Result<Member> {
    let location = Location::from_name(raw.location.as_deref()).ok_or_else(|| {
        GeneratorError::Validation(format!(
            "Member {}.{} has unknown location {:?}",
            structure, name, raw.location
        ))
    })?;

    let qualified = format!("{}.{}", structure, name);

    Ok(Member {
        name: name.to_string(),
        shape: raw.shape.clone(),
        required,
        location,
        location_name: raw.location_name.clone(),
        query_name: raw.query_name.clone(),
        streaming: raw.streaming || target.streaming,
        idempotency_token: raw.idempotency_token,
        flattened: raw.flattened || target.flattened,
        xml_attribute: raw.xml_attribute,
        xml_namespace: raw.xml_namespace.as_ref().map(convert_namespace),
        timestamp_format: parse_timestamp_format(raw.timestamp_format.as_deref(), &qualified)?,
        documentation: raw.documentation.clone(),
        deprecated: raw.deprecated,
    })
}

fn convert_namespace(raw: &RawXmlNamespace) -> XmlNamespace {
    XmlNamespace {
        uri: raw.uri.clone(),
        prefix: raw.prefix.clone(),
    }
}

fn parse_timestamp_format(format: Option<&str>, owner: &str) -> Result<Option<TimestampFormat>> {
    match format {
        None => Ok(None),
        Some(name) => TimestampFormat::from_name(name).map(Some).ok_or_else(|| {
            GeneratorError::Validation(format!(
                "{} uses unknown timestamp format {}",
                owner, name
            ))
        }),
    }
}

fn ensure_shape_exists(all: &IndexMap<String, RawShape>, target: &str, owner: &str) -> Result<()> {
    if all.contains_key(target) {
        Ok(())
    } else {
        Err(GeneratorError::Validation(format!(
            "Shape {} references unknown shape {}",
            owner, target
        )))
    }
}

/// Check the shape references and URI placeholders of an operation
fn validate_operation(operation: &Operation, shapes: &BTreeMap<String, Shape>) -> Result<()> {
    let structure = |shape_name: &str, role: &str| -> Result<Option<StructureShape>> {
        match shapes.get(shape_name) {
            Some(Shape::Structure(s)) => Ok(Some(s.clone())),
            Some(_) => Err(GeneratorError::Validation(format!(
                "Operation {} {} shape {} is not a structure",
                operation.name, role, shape_name
            ))),
            None => Err(GeneratorError::Validation(format!(
                "Operation {} references unknown {} shape {}",
                operation.name, role, shape_name
            ))),
        }
    };

    let input = match &operation.input {
        Some(name) => structure(name, "input")?,
        None => None,
    };
    if let Some(name) = &operation.output {
        structure(name, "output")?;
    }
    for error in &operation.errors {
        if !shapes.contains_key(error) {
            return Err(GeneratorError::Validation(format!(
                "Operation {} references unknown error shape {}",
                operation.name, error
            )));
        }
    }

    for (placeholder, _greedy) in operation.http.uri_placeholders() {
        let bound = input.as_ref().is_some_and(|input| {
            input
                .members
                .iter()
                .any(|m| m.location == Location::Uri && m.wire_name() == placeholder)
        });
        if !bound {
            return Err(GeneratorError::Validation(format!(
                "Operation {} has URI placeholder {{{}}} without a matching uri member",
                operation.name, placeholder
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(shapes: &str, operations: &str) -> ApiDefinition {
        let json = format!(
            r#"{{
                "metadata": {{
                    "apiVersion": "2006-03-01",
                    "endpointPrefix": "s3",
                    "protocol": "rest-xml",
                    "serviceId": "S3"
                }},
                "operations": {},
                "shapes": {}
            }}"#,
            operations, shapes
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_unknown_member_shape() {
        let def = definition(
            r#"{ "Input": { "type": "structure", "members": { "A": { "shape": "Missing" } } } }"#,
            "{}",
        );
        let err = convert_definition(&def, "s3").unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_required_must_be_member() {
        let def = definition(
            r#"{
                "S": { "type": "string" },
                "Input": { "type": "structure", "required": ["B"], "members": { "A": { "shape": "S" } } }
            }"#,
            "{}",
        );
        let err = convert_definition(&def, "s3").unwrap_err();
        assert!(matches!(err, GeneratorError::Validation(_)));
    }

    #[test]
    fn test_member_flags_inherit_from_target() {
        let def = definition(
            r#"{
                "Body": { "type": "blob", "streaming": true },
                "Input": { "type": "structure", "payload": "Body", "members": { "Body": { "shape": "Body" } } }
            }"#,
            "{}",
        );
        let service = convert_definition(&def, "s3").unwrap();
        let input = service.structure("Input").unwrap();
        assert!(input.members[0].streaming);
        assert_eq!(input.payload_member().unwrap().name, "Body");
    }

    #[test]
    fn test_uri_placeholder_needs_uri_member() {
        let def = definition(
            r#"{
                "S": { "type": "string" },
                "Input": { "type": "structure", "members": { "Bucket": { "shape": "S" } } }
            }"#,
            r#"{ "GetBucket": { "name": "GetBucket", "http": { "method": "GET", "requestUri": "/{Bucket}" }, "input": { "shape": "Input" } } }"#,
        );
        let err = convert_definition(&def, "s3").unwrap_err();
        assert!(err.to_string().contains("{Bucket}"));
    }

    #[test]
    fn test_document_structure_becomes_scalar() {
        let def = definition(r#"{ "Doc": { "type": "structure", "document": true } }"#, "{}");
        let service = convert_definition(&def, "s3").unwrap();
        assert!(matches!(
            service.shape("Doc"),
            Some(Shape::Scalar(ScalarShape { kind: ScalarKind::Document, .. }))
        ));
    }

    #[test]
    fn test_unknown_protocol() {
        let json = r#"{
            "metadata": { "apiVersion": "1", "endpointPrefix": "x", "protocol": "smithy-rpc-v2-cbor" }
        }"#;
        let def: ApiDefinition = serde_json::from_str(json).unwrap();
        let err = convert_definition(&def, "x").unwrap_err();
        assert!(err.to_string().contains("Unsupported protocol"));
    }

    #[test]
    fn test_protocol_from_preference_list() {
        let json = r#"{
            "metadata": {
                "apiVersion": "1",
                "endpointPrefix": "x",
                "protocols": ["smithy-rpc-v2-cbor", "json"],
                "targetPrefix": "X_20240101"
            }
        }"#;
        let def: ApiDefinition = serde_json::from_str(json).unwrap();
        let service = convert_definition(&def, "x").unwrap();
        assert_eq!(service.metadata.protocol, Protocol::Json);
    }
}
