//! Reachability analysis over the shape graph
//!
//! Only the shapes reachable from the selected operations are generated, and
//! each structure only gets the serializer or parser its usage requires.

use sdkgen_common::{GeneratorError, Result, ServiceDefinition, Shape};
use std::collections::BTreeSet;

/// Which operations are generated and what their shapes need
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    /// Selected operation names, sorted
    pub operations: Vec<String>,
    /// Structures written into request bodies
    pub serialized: BTreeSet<String>,
    /// Structures read from response bodies
    pub parsed: BTreeSet<String>,
    /// String shapes carrying an `enum` list
    pub enums: BTreeSet<String>,
}

impl Usage {
    /// Analyze the given operation selection (empty selects every operation)
    pub fn analyze(service: &ServiceDefinition, selection: &[String]) -> Result<Self> {
        let operations: Vec<String> = if selection.is_empty() {
            service.operations.keys().cloned().collect()
        } else {
            let mut operations = Vec::with_capacity(selection.len());
            for name in selection {
                if service.operation(name).is_none() {
                    return Err(GeneratorError::Validation(format!(
                        "Service {} has no operation named {}",
                        service.name, name
                    )));
                }
                operations.push(name.clone());
            }
            operations.sort();
            operations.dedup();
            operations
        };

        let mut usage = Self {
            operations,
            ..Self::default()
        };

        for name in &usage.operations.clone() {
            let Some(operation) = service.operation(name) else {
                continue;
            };
            if let Some(input) = service.input_of(operation) {
                let mut found = BTreeSet::new();
                for member in &input.members {
                    visit(service, &member.shape, &mut found, &mut usage.enums);
                }
                usage.serialized.extend(found);
            }
            if let Some(output) = service.output_of(operation) {
                let mut found = BTreeSet::new();
                for member in &output.members {
                    visit(service, &member.shape, &mut found, &mut usage.enums);
                }
                usage.parsed.extend(found);
            }
        }

        tracing::debug!(
            service = %service.name,
            operations = usage.operations.len(),
            serialized = usage.serialized.len(),
            parsed = usage.parsed.len(),
            enums = usage.enums.len(),
            "analyzed shape usage"
        );

        Ok(usage)
    }

    pub fn is_selected(&self, operation: &str) -> bool {
        self.operations.iter().any(|name| name == operation)
    }

    /// Every structure that becomes a value object
    pub fn structures(&self) -> BTreeSet<&str> {
        self.serialized
            .iter()
            .chain(self.parsed.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Collect the structures reachable from `shape_name` (inclusive) into `found`
fn visit(
    service: &ServiceDefinition,
    shape_name: &str,
    found: &mut BTreeSet<String>,
    enums: &mut BTreeSet<String>,
) {
    let Some(shape) = service.shape(shape_name) else {
        return;
    };

    match shape {
        Shape::Structure(structure) => {
            if !found.insert(structure.name.clone()) {
                return;
            }
            for member in &structure.members {
                visit(service, &member.shape, found, enums);
            }
        }
        Shape::List(list) => visit(service, &list.member.shape, found, enums),
        Shape::Map(map) => {
            visit(service, &map.key.shape, found, enums);
            visit(service, &map.value.shape, found, enums);
        }
        Shape::Scalar(_) => {
            if shape.is_enum() {
                enums.insert(shape.name().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdkgen_parser::ServiceParser;

    const SERVICE: &str = r#"{
        "metadata": {
            "apiVersion": "2012-08-10",
            "endpointPrefix": "dynamodb",
            "protocol": "json",
            "jsonVersion": "1.0",
            "targetPrefix": "DynamoDB_20120810",
            "serviceId": "DynamoDB"
        },
        "operations": {
            "PutItem": {
                "name": "PutItem",
                "input": { "shape": "PutItemInput" },
                "output": { "shape": "PutItemOutput" }
            },
            "DescribeTable": {
                "name": "DescribeTable",
                "input": { "shape": "DescribeTableInput" },
                "output": { "shape": "DescribeTableOutput" }
            }
        },
        "shapes": {
            "PutItemInput": {
                "type": "structure",
                "members": { "Item": { "shape": "AttributeMap" } }
            },
            "PutItemOutput": { "type": "structure", "members": {} },
            "AttributeMap": {
                "type": "map",
                "key": { "shape": "Name" },
                "value": { "shape": "AttributeValue" }
            },
            "AttributeValue": {
                "type": "structure",
                "members": {
                    "S": { "shape": "Name" },
                    "L": { "shape": "AttributeList" }
                }
            },
            "AttributeList": { "type": "list", "member": { "shape": "AttributeValue" } },
            "DescribeTableInput": {
                "type": "structure",
                "members": { "TableName": { "shape": "Name" } }
            },
            "DescribeTableOutput": {
                "type": "structure",
                "members": { "Table": { "shape": "TableDescription" } }
            },
            "TableDescription": {
                "type": "structure",
                "members": { "TableStatus": { "shape": "TableStatus" } }
            },
            "TableStatus": { "type": "string", "enum": ["CREATING", "ACTIVE"] },
            "Name": { "type": "string" }
        }
    }"#;

    fn service() -> ServiceDefinition {
        ServiceParser::from_json(SERVICE).unwrap().parse().unwrap()
    }

    #[test]
    fn test_all_operations_selected_by_default() {
        let usage = Usage::analyze(&service(), &[]).unwrap();
        assert_eq!(usage.operations, vec!["DescribeTable", "PutItem"]);
        assert!(usage.serialized.contains("AttributeValue"));
        assert!(usage.parsed.contains("TableDescription"));
        assert!(usage.enums.contains("TableStatus"));
    }

    #[test]
    fn test_selection_limits_shapes() {
        let usage = Usage::analyze(&service(), &["PutItem".to_string()]).unwrap();
        assert_eq!(usage.operations, vec!["PutItem"]);
        assert_eq!(usage.structures(), BTreeSet::from(["AttributeValue"]));
        assert!(usage.enums.is_empty());
        assert!(usage.is_selected("PutItem"));
        assert!(!usage.is_selected("DescribeTable"));
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let err = Usage::analyze(&service(), &["Scan".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Scan"));
    }

    #[test]
    fn test_recursive_shapes_terminate() {
        let usage = Usage::analyze(&service(), &["PutItem".to_string()]).unwrap();
        assert_eq!(usage.serialized.len(), 1);
    }
}
