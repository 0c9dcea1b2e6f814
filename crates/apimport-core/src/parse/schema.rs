use indexmap::IndexMap;
use serde_json::Value;

use super::dialect::Dialect;

/// Primitive schema types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    /// No usable `type` keyword.
    Unknown,
}

impl ScalarKind {
    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ScalarKind::String),
            "integer" | "int" | "long" => Some(ScalarKind::Integer),
            "number" | "float" | "double" => Some(ScalarKind::Number),
            "boolean" => Some(ScalarKind::Boolean),
            "null" => Some(ScalarKind::Null),
            "file" | "File" | "any" => Some(ScalarKind::Unknown),
            _ => None,
        }
    }
}

/// Dialect-neutral view of a schema. References are kept as pointers until
/// the resolver replaces them.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object {
        properties: IndexMap<String, SchemaNode>,
        additional: Option<Box<SchemaNode>>,
        example: Option<Value>,
    },
    Array {
        items: Box<SchemaNode>,
        example: Option<Value>,
    },
    Scalar {
        kind: ScalarKind,
        example: Option<Value>,
    },
    Enum {
        values: Vec<Value>,
        example: Option<Value>,
    },
    /// A qualified JSON pointer such as `#/components/schemas/Pet`.
    Reference(String),
    AllOf(Vec<SchemaNode>),
    /// `oneOf` / `anyOf`.
    OneOf(Vec<SchemaNode>),
    /// Stand-in for a reference that could not be expanded.
    Opaque,
}

impl SchemaNode {
    /// Build a node from a raw schema object. Never fails: shapes that make
    /// no sense degrade to an unknown scalar.
    pub fn from_value(value: &Value, dialect: Dialect) -> SchemaNode {
        let Some(obj) = value.as_object() else {
            return SchemaNode::Scalar {
                kind: ScalarKind::Unknown,
                example: None,
            };
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            return SchemaNode::Reference(dialect.qualify_ref(reference));
        }

        let example = declared_example(obj);

        if let Some(parts) = non_empty_array(obj.get("allOf")) {
            let mut nodes: Vec<SchemaNode> = parts
                .iter()
                .map(|part| SchemaNode::from_value(part, dialect))
                .collect();
            if obj.contains_key("properties") {
                let mut own = obj.clone();
                own.remove("allOf");
                nodes.push(SchemaNode::from_value(&Value::Object(own), dialect));
            }
            return SchemaNode::AllOf(nodes);
        }

        if let Some(variants) =
            non_empty_array(obj.get("oneOf")).or_else(|| non_empty_array(obj.get("anyOf")))
        {
            return SchemaNode::OneOf(
                variants
                    .iter()
                    .map(|v| SchemaNode::from_value(v, dialect))
                    .collect(),
            );
        }

        if let Some(values) = non_empty_array(obj.get("enum")) {
            return SchemaNode::Enum {
                values: values.clone(),
                example,
            };
        }
        if let Some(constant) = obj.get("const") {
            return SchemaNode::Enum {
                values: vec![constant.clone()],
                example,
            };
        }

        match type_name(obj.get("type")) {
            Some("object") => object_node(obj, dialect, example),
            Some("array") => array_node(obj, dialect, example),
            Some(name) => match ScalarKind::from_type_name(name) {
                Some(kind) => SchemaNode::Scalar {
                    kind,
                    example: example.or_else(|| obj.get("default").cloned()),
                },
                // Swagger 1.x names models directly in `type`.
                None if dialect == Dialect::LegacyV1 => {
                    SchemaNode::Reference(dialect.qualify_ref(name))
                }
                None => SchemaNode::Scalar {
                    kind: ScalarKind::Unknown,
                    example,
                },
            },
            None if obj.contains_key("properties") || obj.contains_key("additionalProperties") => {
                object_node(obj, dialect, example)
            }
            None if obj.contains_key("items") => array_node(obj, dialect, example),
            None => SchemaNode::Scalar {
                kind: ScalarKind::Unknown,
                example: example.or_else(|| obj.get("default").cloned()),
            },
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, SchemaNode::Array { .. })
    }

    /// Whether any `Reference` is left anywhere in this tree.
    pub fn has_references(&self) -> bool {
        match self {
            SchemaNode::Reference(_) => true,
            SchemaNode::Object {
                properties,
                additional,
                ..
            } => {
                properties.values().any(SchemaNode::has_references)
                    || additional.as_deref().is_some_and(SchemaNode::has_references)
            }
            SchemaNode::Array { items, .. } => items.has_references(),
            SchemaNode::AllOf(parts) | SchemaNode::OneOf(parts) => {
                parts.iter().any(SchemaNode::has_references)
            }
            SchemaNode::Scalar { .. } | SchemaNode::Enum { .. } | SchemaNode::Opaque => false,
        }
    }
}

fn object_node(
    obj: &serde_json::Map<String, Value>,
    dialect: Dialect,
    example: Option<Value>,
) -> SchemaNode {
    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| (name.clone(), SchemaNode::from_value(prop, dialect)))
                .collect()
        })
        .unwrap_or_default();
    let additional = obj
        .get("additionalProperties")
        .filter(|v| v.is_object())
        .map(|v| Box::new(SchemaNode::from_value(v, dialect)));
    SchemaNode::Object {
        properties,
        additional,
        example,
    }
}

fn array_node(
    obj: &serde_json::Map<String, Value>,
    dialect: Dialect,
    example: Option<Value>,
) -> SchemaNode {
    let items = match obj.get("items") {
        // Tuple-style `items: [..]` uses the first entry.
        Some(Value::Array(list)) => list
            .first()
            .map(|first| SchemaNode::from_value(first, dialect))
            .unwrap_or(SchemaNode::Scalar {
                kind: ScalarKind::Unknown,
                example: None,
            }),
        Some(items) => SchemaNode::from_value(items, dialect),
        None => SchemaNode::Scalar {
            kind: ScalarKind::Unknown,
            example: None,
        },
    };
    SchemaNode::Array {
        items: Box::new(items),
        example,
    }
}

/// `example`, or the first entry of a JSON Schema `examples` array.
fn declared_example(obj: &serde_json::Map<String, Value>) -> Option<Value> {
    obj.get("example").cloned().or_else(|| {
        obj.get("examples")
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .cloned()
    })
}

/// `type` may be a single name or, in OpenAPI 3.1, a list including `"null"`.
fn type_name(value: Option<&Value>) -> Option<&str> {
    match value? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(list) => {
            let names: Vec<&str> = list.iter().filter_map(Value::as_str).collect();
            names
                .iter()
                .copied()
                .find(|n| *n != "null")
                .or_else(|| names.first().copied())
        }
        _ => None,
    }
}

fn non_empty_array(value: Option<&Value>) -> Option<&Vec<Value>> {
    value.and_then(Value::as_array).filter(|list| !list.is_empty())
}
