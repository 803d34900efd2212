//! Shape to Rust type mapping

use sdkgen_common::{
    naming, GeneratorError, Member, Result, ScalarKind, ServiceDefinition, Shape, StructureShape,
};
use std::collections::{BTreeMap, BTreeSet};

/// Names that would shadow prelude items inside the generated type modules
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Box", "Err", "None", "Ok", "Option", "Result", "Self", "Some", "String", "Vec",
];

/// Maps shapes to Rust types and generated item names
#[derive(Debug, Clone)]
pub struct TypeMapper<'a> {
    service: &'a ServiceDefinition,
    /// Shape name → (type name, module name) for structures and enums
    names: BTreeMap<String, (String, String)>,
    /// `(structure, member)` pairs that need a `Box` to break a cycle
    boxed: BTreeSet<(String, String)>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(service: &'a ServiceDefinition) -> Self {
        Self {
            service,
            names: assign_names(service),
            boxed: find_boxed_members(service),
        }
    }

    /// Type name generated for a structure or enum shape
    pub fn type_name(&self, shape_name: &str) -> String {
        self.names
            .get(shape_name)
            .map(|(type_name, _)| type_name.clone())
            .unwrap_or_else(|| naming::type_ident(shape_name))
    }

    /// Module (and file stem) generated for a structure or enum shape
    pub fn module_name(&self, shape_name: &str) -> String {
        self.names
            .get(shape_name)
            .map(|(_, module)| module.clone())
            .unwrap_or_else(|| naming::module_name(shape_name))
    }

    /// Fully qualified path of a generated type, e.g. `crate::types::TableStatus`
    pub fn type_path(&self, shape_name: &str) -> String {
        format!("crate::types::{}", self.type_name(shape_name))
    }

    pub fn shape(&self, shape_name: &str) -> Result<&'a Shape> {
        self.service.shape(shape_name).ok_or_else(|| {
            GeneratorError::Generation(format!("Unknown shape {}", shape_name))
        })
    }

    /// Rust type of a value of the given shape
    pub fn rust_type(&self, shape_name: &str) -> Result<String> {
        let shape = self.shape(shape_name)?;
        Ok(match shape {
            Shape::Structure(_) => self.type_path(shape_name),
            Shape::List(list) => format!("Vec<{}>", self.rust_type(&list.member.shape)?),
            Shape::Map(map) => format!(
                "std::collections::BTreeMap<String, {}>",
                self.rust_type(&map.value.shape)?
            ),
            Shape::Scalar(_) if shape.is_enum() => self.type_path(shape_name),
            Shape::Scalar(scalar) => match scalar.kind {
                ScalarKind::String => "String".to_string(),
                ScalarKind::Integer => "i32".to_string(),
                ScalarKind::Long => "i64".to_string(),
                ScalarKind::Float => "f32".to_string(),
                ScalarKind::Double => "f64".to_string(),
                ScalarKind::Boolean => "bool".to_string(),
                ScalarKind::Timestamp => "chrono::DateTime<chrono::Utc>".to_string(),
                ScalarKind::Blob => "Vec<u8>".to_string(),
                ScalarKind::Document => "serde_json::Value".to_string(),
            },
        })
    }

    /// Field type of a member (without the surrounding `Option`)
    pub fn member_type(&self, structure: &StructureShape, member: &Member) -> Result<String> {
        let inner = self.rust_type(&member.shape)?;
        if self.is_boxed(structure, member) {
            Ok(format!("Box<{}>", inner))
        } else {
            Ok(inner)
        }
    }

    pub fn is_boxed(&self, structure: &StructureShape, member: &Member) -> bool {
        self.boxed
            .contains(&(structure.name.clone(), member.name.clone()))
    }

    pub fn is_enum(&self, shape_name: &str) -> bool {
        self.service
            .shape(shape_name)
            .is_some_and(|shape| shape.is_enum())
    }
}

/// Give every structure and enum a unique type name and module name
fn assign_names(service: &ServiceDefinition) -> BTreeMap<String, (String, String)> {
    let mut names = BTreeMap::new();
    let mut used_types = BTreeSet::new();
    let mut used_modules = BTreeSet::new();

    for (name, shape) in &service.shapes {
        if !matches!(shape, Shape::Structure(_)) && !shape.is_enum() {
            continue;
        }

        let mut type_name = naming::type_ident(name);
        if RESERVED_TYPE_NAMES.contains(&type_name.as_str()) {
            type_name.push_str("Value");
        }
        let type_name = unique(type_name, &mut used_types);
        let module = unique(naming::module_name(name), &mut used_modules);
        names.insert(name.clone(), (type_name, module));
    }

    names
}

fn unique(candidate: String, used: &mut BTreeSet<String>) -> String {
    let mut name = candidate.clone();
    let mut counter = 2;
    while used.contains(&name) {
        name = format!("{}{}", candidate, counter);
        counter += 1;
    }
    used.insert(name.clone());
    name
}

/// Members whose structure can reach itself again through direct structure members
///
/// Lists and maps already allocate, so only chains of plain struct fields
/// need boxing.
fn find_boxed_members(service: &ServiceDefinition) -> BTreeSet<(String, String)> {
    let mut boxed = BTreeSet::new();
    for shape in service.shapes.values() {
        let Shape::Structure(structure) = shape else {
            continue;
        };
        for member in &structure.members {
            if !matches!(service.shape(&member.shape), Some(Shape::Structure(_))) {
                continue;
            }
            if member.shape == structure.name
                || reachable_structures(service, &member.shape).contains(structure.name.as_str())
            {
                boxed.insert((structure.name.clone(), member.name.clone()));
            }
        }
    }

    boxed
}

/// Structures held directly (not through a list or map) by a structure
fn direct_structures<'s>(service: &'s ServiceDefinition, name: &str) -> Vec<&'s str> {
    match service.shape(name) {
        Some(Shape::Structure(s)) => s
            .members
            .iter()
            .filter(|m| matches!(service.shape(&m.shape), Some(Shape::Structure(_))))
            .map(|m| m.shape.as_str())
            .collect(),
        _ => Vec::new(),
    }
}

fn reachable_structures<'s>(service: &'s ServiceDefinition, start: &str) -> BTreeSet<&'s str> {
    let mut seen = BTreeSet::new();
    let mut stack = direct_structures(service, start);
    while let Some(next) = stack.pop() {
        if seen.insert(next) {
            stack.extend(direct_structures(service, next));
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdkgen_parser::ServiceParser;

    fn service(shapes: &str) -> ServiceDefinition {
        let json = format!(
            r#"{{
                "metadata": {{
                    "apiVersion": "2020-01-01",
                    "endpointPrefix": "example",
                    "protocol": "rest-json",
                    "serviceId": "Example"
                }},
                "operations": {{}},
                "shapes": {}
            }}"#,
            shapes
        );
        ServiceParser::from_json(&json).unwrap().parse().unwrap()
    }

    #[test]
    fn test_scalar_and_collection_types() {
        let service = service(
            r#"{
                "S": { "type": "string" },
                "I": { "type": "integer" },
                "L": { "type": "long" },
                "T": { "type": "timestamp" },
                "B": { "type": "blob" },
                "Names": { "type": "list", "member": { "shape": "S" } },
                "Counts": { "type": "map", "key": { "shape": "S" }, "value": { "shape": "I" } },
                "Status": { "type": "string", "enum": ["ON", "OFF"] }
            }"#,
        );
        let types = TypeMapper::new(&service);

        assert_eq!(types.rust_type("S").unwrap(), "String");
        assert_eq!(types.rust_type("I").unwrap(), "i32");
        assert_eq!(types.rust_type("L").unwrap(), "i64");
        assert_eq!(types.rust_type("T").unwrap(), "chrono::DateTime<chrono::Utc>");
        assert_eq!(types.rust_type("B").unwrap(), "Vec<u8>");
        assert_eq!(types.rust_type("Names").unwrap(), "Vec<String>");
        assert_eq!(
            types.rust_type("Counts").unwrap(),
            "std::collections::BTreeMap<String, i32>"
        );
        assert_eq!(types.rust_type("Status").unwrap(), "crate::types::Status");
        assert!(types.rust_type("Missing").is_err());
    }

    #[test]
    fn test_direct_recursion_is_boxed() {
        let service = service(
            r#"{
                "Node": {
                    "type": "structure",
                    "members": {
                        "Parent": { "shape": "Node" },
                        "Children": { "shape": "Nodes" }
                    }
                },
                "Nodes": { "type": "list", "member": { "shape": "Node" } }
            }"#,
        );
        let types = TypeMapper::new(&service);
        let node = service.structure("Node").unwrap();

        let parent = node.member("Parent").unwrap();
        assert_eq!(
            types.member_type(node, parent).unwrap(),
            "Box<crate::types::Node>"
        );
        // Vec already breaks the cycle
        let children = node.member("Children").unwrap();
        assert_eq!(
            types.member_type(node, children).unwrap(),
            "Vec<crate::types::Node>"
        );
    }

    #[test]
    fn test_reserved_and_colliding_names() {
        let service = service(
            r#"{
                "String": { "type": "structure", "members": {} },
                "DynamoDB": { "type": "structure", "members": {} },
                "DynamoDb": { "type": "structure", "members": {} }
            }"#,
        );
        let types = TypeMapper::new(&service);

        assert_eq!(types.type_name("String"), "StringValue");
        assert_eq!(types.module_name("DynamoDB"), "dynamo_db");
        assert_eq!(types.module_name("DynamoDb"), "dynamo_db2");
        assert_eq!(types.type_name("DynamoDb"), "DynamoDb");
    }
}
