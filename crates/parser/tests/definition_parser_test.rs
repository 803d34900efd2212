//! Integration tests for service definition parsing

use sdkgen_common::{
    Location, Matcher, PathExpression, Protocol, ScalarKind, Shape, TimestampFormat,
};
use sdkgen_parser::ServiceParser;
use std::path::PathBuf;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(path)
}

#[test]
fn test_parse_json_protocol_service() {
    let parser = ServiceParser::from_file(fixture("dynamodb/api-2.json")).unwrap();
    assert_eq!(parser.service_name(), "dynamo_db");

    let service = parser.with_service_name("dynamodb").parse().unwrap();

    // Verify service metadata
    assert_eq!(service.name, "dynamodb");
    assert_eq!(service.metadata.protocol, Protocol::Json);
    assert_eq!(service.metadata.json_version.as_deref(), Some("1.0"));
    assert_eq!(
        service.metadata.target_prefix.as_deref(),
        Some("DynamoDB_20120810")
    );
    assert_eq!(service.operations.len(), 5);

    let create = service.operation("CreateTable").unwrap();
    assert_eq!(create.http.method, "POST");
    assert_eq!(create.errors.len(), 2);
    assert!(create
        .documentation
        .as_deref()
        .unwrap()
        .contains("<code>CreateTable</code>"));

    // Required flags come from the structure's `required` list
    let input = service.input_of(create).unwrap();
    let required: Vec<_> = input
        .members
        .iter()
        .filter(|m| m.required)
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(required, vec!["AttributeDefinitions", "TableName", "KeySchema"]);

    // Members keep definition order
    let names: Vec<_> = input.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["AttributeDefinitions", "TableName", "KeySchema", "BillingMode", "Tags"]
    );
}

#[test]
fn test_enum_and_union_shapes() {
    let service = ServiceParser::from_file(fixture("dynamodb/api-2.json"))
        .unwrap()
        .parse()
        .unwrap();

    let status = service.shape("TableStatus").unwrap();
    assert!(status.is_enum());
    match status {
        Shape::Scalar(scalar) => {
            assert_eq!(scalar.enum_values.len(), 5);
            assert_eq!(scalar.enum_values[3], "ACTIVE");
        }
        other => panic!("Expected scalar shape, got {:?}", other),
    }

    let attribute_value = service.structure("AttributeValue").unwrap();
    assert!(attribute_value.union);
    assert_eq!(attribute_value.members.len(), 8);

    let exception = service.structure("ResourceNotFoundException").unwrap();
    assert!(exception.exception);
}

#[test]
fn test_parse_rest_xml_bindings() {
    let service = ServiceParser::from_file(fixture("s3/api-2.json"))
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(service.name, "s3");
    assert_eq!(service.metadata.protocol, Protocol::RestXml);

    let get_object = service.operation("GetObject").unwrap();
    assert_eq!(get_object.http.method, "GET");
    assert_eq!(
        get_object.http.uri_placeholders(),
        vec![("Bucket".to_string(), false), ("Key".to_string(), true)]
    );

    let input = service.input_of(get_object).unwrap();
    assert_eq!(input.member("Bucket").unwrap().location, Location::Uri);
    assert_eq!(input.member("Range").unwrap().location, Location::Header);
    let version = input.member("VersionId").unwrap();
    assert_eq!(version.location, Location::Querystring);
    assert_eq!(version.wire_name(), "versionId");
    assert_eq!(input.body_members().count(), 0);

    let output = service.output_of(get_object).unwrap();
    let body = output.payload_member().unwrap();
    assert_eq!(body.name, "Body");
    assert!(body.streaming);
    let metadata = output.member("Metadata").unwrap();
    assert_eq!(metadata.location, Location::Headers);
    assert_eq!(metadata.wire_name(), "x-amz-meta-");

    let list = service.operation("ListObjectsV2").unwrap();
    assert_eq!(
        list.http.static_query(),
        vec![("list-type".to_string(), "2".to_string())]
    );

    // Flattened lists keep the flag on the list shape
    match service.shape("ObjectList").unwrap() {
        Shape::List(list) => assert!(list.flattened),
        other => panic!("Expected list shape, got {:?}", other),
    }

    let create = service.input_of(service.operation("CreateBucket").unwrap()).unwrap();
    let configuration = create.payload_member().unwrap();
    assert_eq!(
        configuration.xml_namespace.as_ref().unwrap().uri,
        "http://s3.amazonaws.com/doc/2006-03-01/"
    );

    match service.shape("LastModified").unwrap() {
        Shape::Scalar(scalar) => {
            assert_eq!(scalar.kind, ScalarKind::Timestamp);
            assert_eq!(scalar.timestamp_format, None);
        }
        other => panic!("Expected scalar shape, got {:?}", other),
    }
}

#[test]
fn test_parse_query_result_wrapper() {
    let service = ServiceParser::from_file(fixture("sqs/api-2.json"))
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(service.metadata.protocol, Protocol::Query);
    assert_eq!(
        service.metadata.xml_namespace.as_deref(),
        Some("http://queue.amazonaws.com/doc/2012-11-05/")
    );

    let create = service.operation("CreateQueue").unwrap();
    assert_eq!(create.result_wrapper.as_deref(), Some("CreateQueueResult"));

    let delete = service.operation("DeleteQueue").unwrap();
    assert!(delete.output.is_none());

    // The custom error code is carried over
    let exists = service.structure("QueueNameExists").unwrap();
    assert_eq!(exists.error_code.as_deref(), Some("QueueAlreadyExists"));

    // `flattened` on the map shape propagates to the member
    let input = service.input_of(create).unwrap();
    let attributes = input.member("Attributes").unwrap();
    assert!(attributes.flattened);
    assert_eq!(attributes.wire_name(), "Attribute");
}

#[test]
fn test_parse_rest_json_status_code() {
    let service = ServiceParser::from_file(fixture("lambda/api-2.json"))
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(service.metadata.protocol, Protocol::RestJson);
    let invoke = service.operation("Invoke").unwrap();
    let output = service.output_of(invoke).unwrap();
    assert_eq!(
        output.member("StatusCode").unwrap().location,
        Location::StatusCode
    );
    assert_eq!(
        service.operation("GetFunction").unwrap().http.response_code,
        Some(200)
    );
}

#[test]
fn test_explicit_timestamp_format() {
    let json = r#"{
        "metadata": {
            "apiVersion": "2020-01-01",
            "endpointPrefix": "example",
            "protocol": "rest-json",
            "serviceId": "Example"
        },
        "operations": {},
        "shapes": {
            "Stamp": { "type": "timestamp", "timestampFormat": "iso8601" },
            "Holder": {
                "type": "structure",
                "members": {
                    "At": { "shape": "Stamp" },
                    "Since": { "shape": "Stamp", "timestampFormat": "rfc822" }
                }
            }
        }
    }"#;

    let service = ServiceParser::from_json(json).unwrap().parse().unwrap();
    match service.shape("Stamp").unwrap() {
        Shape::Scalar(scalar) => {
            assert_eq!(scalar.timestamp_format, Some(TimestampFormat::Iso8601))
        }
        other => panic!("Expected scalar shape, got {:?}", other),
    }
    let holder = service.structure("Holder").unwrap();
    assert_eq!(
        holder.member("Since").unwrap().timestamp_format,
        Some(TimestampFormat::Rfc822)
    );
    assert_eq!(holder.member("At").unwrap().timestamp_format, None);
}

#[test]
fn test_paginator_with_more_results() {
    let service = ServiceParser::from_file(fixture("s3/api-2.json"))
        .unwrap()
        .with_paginators_file(fixture("s3/paginators-1.json"))
        .unwrap()
        .parse()
        .unwrap();

    let paginator = &service.paginators["ListObjectsV2"];
    assert_eq!(paginator.input_tokens, vec!["ContinuationToken"]);
    assert_eq!(
        paginator.output_tokens,
        vec![PathExpression::field_path(&["NextContinuationToken"])]
    );
    assert_eq!(
        paginator.more_results,
        Some(PathExpression::field_path(&["IsTruncated"]))
    );
    assert_eq!(paginator.limit_key.as_deref(), Some("MaxKeys"));
}

#[test]
fn test_waiters_keep_unsupported_acceptors() {
    let service = ServiceParser::from_file(fixture("lambda/api-2.json"))
        .unwrap()
        .with_waiters_file(fixture("lambda/waiters-2.json"))
        .unwrap()
        .parse()
        .unwrap();

    assert_eq!(service.waiters.len(), 3);

    let active = &service.waiters["FunctionActive"];
    assert_eq!(active.operation, "GetFunction");
    assert_eq!(active.delay, 5);
    assert_eq!(active.max_attempts, 60);
    assert!(active.is_supported());

    let exists = &service.waiters["FunctionExists"];
    assert_eq!(exists.acceptors[0].matcher, Matcher::Status(200));
    assert_eq!(
        exists.acceptors[1].matcher,
        Matcher::ErrorCode("ResourceNotFoundException".to_string())
    );

    // Function expressions are kept but flagged
    assert!(!service.waiters["FunctionsHaveTags"].is_supported());
}

#[test]
fn test_waiter_version_is_checked() {
    let result = ServiceParser::from_file(fixture("dynamodb/api-2.json"))
        .unwrap()
        .with_waiters_json(r#"{ "version": 1, "waiters": {} }"#)
        .unwrap()
        .parse();
    assert!(result.is_err(), "Version 1 waiter documents should be rejected");
}
