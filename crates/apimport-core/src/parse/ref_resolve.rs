use std::borrow::Cow;

use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;

use super::dialect::Dialect;
use super::schema::SchemaNode;
use crate::config::DEFAULT_MAX_RESOLVED_NODES;
use crate::error::ResolveError;

/// Expands `$ref` pointers against the descriptor root.
///
/// Cycles are detected with the stack of pointers being expanded on the
/// current branch, so a schema used by two sibling properties is expanded
/// twice rather than being mistaken for a cycle. Each call to [`resolve`]
/// may produce at most `max_nodes` nodes; schemas that fan out past that
/// are cut off. Anything that cannot be expanded becomes
/// [`SchemaNode::Opaque`]; resolution itself never fails.
///
/// [`resolve`]: RefResolver::resolve
pub struct RefResolver<'a> {
    root: &'a Value,
    dialect: Dialect,
    max_depth: usize,
    max_nodes: usize,
    stack: Vec<String>,
    produced: usize,
    limit_reported: bool,
}

impl<'a> RefResolver<'a> {
    pub fn new(root: &'a Value, dialect: Dialect, max_depth: usize) -> Self {
        Self {
            root,
            dialect,
            max_depth,
            max_nodes: DEFAULT_MAX_RESOLVED_NODES,
            stack: Vec::new(),
            produced: 0,
            limit_reported: false,
        }
    }

    pub fn with_node_limit(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Produce a copy of `node` with every reference replaced by its target.
    pub fn resolve(&mut self, node: &SchemaNode) -> SchemaNode {
        self.produced = 0;
        self.limit_reported = false;
        self.resolve_node(node)
    }

    fn resolve_node(&mut self, node: &SchemaNode) -> SchemaNode {
        self.produced += 1;
        match node {
            SchemaNode::Reference(pointer) => match self.expand(pointer) {
                Ok(resolved) => resolved,
                Err(err @ ResolveError::CircularRef(_)) => {
                    debug!("{err}, using empty placeholder");
                    SchemaNode::Opaque
                }
                Err(err @ ResolveError::NodeLimitExceeded { .. }) if self.limit_reported => {
                    debug!("{err}, using empty placeholder");
                    SchemaNode::Opaque
                }
                Err(err) => {
                    if matches!(err, ResolveError::NodeLimitExceeded { .. }) {
                        self.limit_reported = true;
                    }
                    warn!("{err}, using empty placeholder");
                    SchemaNode::Opaque
                }
            },
            SchemaNode::Object {
                properties,
                additional,
                example,
            } => {
                let mut resolved_props = IndexMap::with_capacity(properties.len());
                for (name, prop) in properties {
                    resolved_props.insert(name.clone(), self.resolve_node(prop));
                }
                SchemaNode::Object {
                    properties: resolved_props,
                    additional: additional.as_ref().map(|a| Box::new(self.resolve_node(a))),
                    example: example.clone(),
                }
            }
            SchemaNode::Array { items, example } => SchemaNode::Array {
                items: Box::new(self.resolve_node(items)),
                example: example.clone(),
            },
            SchemaNode::AllOf(parts) => {
                SchemaNode::AllOf(parts.iter().map(|p| self.resolve_node(p)).collect())
            }
            SchemaNode::OneOf(variants) => {
                SchemaNode::OneOf(variants.iter().map(|v| self.resolve_node(v)).collect())
            }
            SchemaNode::Scalar { .. } | SchemaNode::Enum { .. } | SchemaNode::Opaque => {
                node.clone()
            }
        }
    }

    /// Whether `node` is an array once its top-level reference chain is
    /// followed. Nested references are not expanded.
    pub fn resolves_to_array(&self, node: &SchemaNode) -> bool {
        let mut pointer = match node {
            SchemaNode::Reference(pointer) => pointer.clone(),
            other => return other.is_array(),
        };
        for _ in 0..self.max_depth {
            let Ok(target) = self.lookup(&pointer) else {
                return false;
            };
            match SchemaNode::from_value(target, self.dialect) {
                SchemaNode::Reference(next) => pointer = next,
                resolved => return resolved.is_array(),
            }
        }
        false
    }

    /// Parse a raw schema and resolve it in one go.
    pub fn resolve_value(&mut self, schema: &Value) -> SchemaNode {
        let node = SchemaNode::from_value(schema, self.dialect);
        self.resolve(&node)
    }

    fn expand(&mut self, pointer: &str) -> Result<SchemaNode, ResolveError> {
        if self.stack.iter().any(|p| p == pointer) {
            return Err(ResolveError::CircularRef(pointer.to_string()));
        }
        if self.stack.len() >= self.max_depth {
            return Err(ResolveError::DepthExceeded {
                pointer: pointer.to_string(),
                limit: self.max_depth,
            });
        }
        if self.produced >= self.max_nodes {
            return Err(ResolveError::NodeLimitExceeded {
                pointer: pointer.to_string(),
                limit: self.max_nodes,
            });
        }
        let target = self.lookup(pointer)?;
        let node = SchemaNode::from_value(target, self.dialect);

        self.stack.push(pointer.to_string());
        let resolved = self.resolve_node(&node);
        self.stack.pop();
        Ok(resolved)
    }

    /// Look up a local JSON pointer (`#/a/b`) in the descriptor root.
    pub fn lookup(&self, pointer: &str) -> Result<&'a Value, ResolveError> {
        let Some(path) = pointer.strip_prefix('#') else {
            return Err(ResolveError::ExternalRef(pointer.to_string()));
        };
        // Some tools percent-encode pointers (`~1pets~1%7Bid%7D`).
        let path = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
        self.root
            .pointer(&path)
            .ok_or_else(|| ResolveError::RefTargetNotFound(pointer.to_string()))
    }

    /// Follow a chain of `$ref` objects (responses, path items, examples)
    /// until a concrete object is reached.
    pub fn follow(&self, value: &'a Value) -> Result<&'a Value, ResolveError> {
        let mut current = value;
        let mut seen: Vec<&str> = Vec::new();
        while let Some(pointer) = current.get("$ref").and_then(Value::as_str) {
            if seen.contains(&pointer) {
                return Err(ResolveError::CircularRef(pointer.to_string()));
            }
            if seen.len() >= self.max_depth {
                return Err(ResolveError::DepthExceeded {
                    pointer: pointer.to_string(),
                    limit: self.max_depth,
                });
            }
            seen.push(pointer);
            current = self.lookup(pointer)?;
        }
        Ok(current)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parse::schema::ScalarKind;

    fn root() -> Value {
        json!({
            "components": {
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "integer"},
                            "owner": {"$ref": "#/components/schemas/User"},
                            "previousOwner": {"$ref": "#/components/schemas/User"}
                        }
                    },
                    "User": {
                        "type": "object",
                        "properties": {"name": {"type": "string"}}
                    },
                    "Node": {
                        "type": "object",
                        "properties": {
                            "value": {"type": "string"},
                            "next": {"$ref": "#/components/schemas/Node"}
                        }
                    },
                    "Alias": {"$ref": "#/components/schemas/User"}
                },
                "responses": {
                    "Ok": {"$ref": "#/components/responses/Inner"},
                    "Inner": {"description": "ok"},
                    "Loop": {"$ref": "#/components/responses/Loop"}
                }
            }
        })
    }

    fn property<'n>(node: &'n SchemaNode, name: &str) -> &'n SchemaNode {
        match node {
            SchemaNode::Object { properties, .. } => &properties[name],
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_sibling_references_resolve_independently() {
        let root = root();
        let mut resolver = RefResolver::new(&root, Dialect::V3Family, 32);
        let pet = resolver.resolve(&SchemaNode::Reference("#/components/schemas/Pet".into()));
        assert!(!pet.has_references());
        for field in ["owner", "previousOwner"] {
            let owner = property(&pet, field);
            assert!(matches!(
                property(owner, "name"),
                SchemaNode::Scalar {
                    kind: ScalarKind::String,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_cycle_becomes_opaque() {
        let root = root();
        let mut resolver = RefResolver::new(&root, Dialect::V3Family, 32);
        let node = resolver.resolve(&SchemaNode::Reference("#/components/schemas/Node".into()));
        assert_eq!(property(&node, "next"), &SchemaNode::Opaque);
        assert!(resolver.stack.is_empty());
    }

    #[test]
    fn test_transitive_reference() {
        let root = root();
        let mut resolver = RefResolver::new(&root, Dialect::V3Family, 32);
        let alias = resolver.resolve_value(&json!({"$ref": "Alias"}));
        assert!(matches!(property(&alias, "name"), SchemaNode::Scalar { .. }));
    }

    #[test]
    fn test_missing_and_external_degrade() {
        let root = root();
        let mut resolver = RefResolver::new(&root, Dialect::V3Family, 32);
        assert_eq!(
            resolver.resolve(&SchemaNode::Reference("#/components/schemas/Nope".into())),
            SchemaNode::Opaque
        );
        assert_eq!(
            resolver.resolve(&SchemaNode::Reference("common.yaml#/Pet".into())),
            SchemaNode::Opaque
        );
        assert_eq!(
            resolver.lookup("common.yaml#/Pet"),
            Err(ResolveError::ExternalRef("common.yaml#/Pet".into()))
        );
    }

    #[test]
    fn test_depth_limit() {
        let root = root();
        let mut resolver = RefResolver::new(&root, Dialect::V3Family, 1);
        let pet = resolver.resolve(&SchemaNode::Reference("#/components/schemas/Pet".into()));
        assert!(matches!(property(&pet, "id"), SchemaNode::Scalar { .. }));
        assert_eq!(property(&pet, "owner"), &SchemaNode::Opaque);
    }

    #[test]
    fn test_follow_response_refs() {
        let root = root();
        let resolver = RefResolver::new(&root, Dialect::V3Family, 32);
        let ok = &root["components"]["responses"]["Ok"];
        assert_eq!(resolver.follow(ok).unwrap()["description"], "ok");
        let looping = &root["components"]["responses"]["Loop"];
        assert!(matches!(
            resolver.follow(looping),
            Err(ResolveError::CircularRef(_))
        ));
    }

    #[test]
    fn test_percent_encoded_pointer() {
        let root = json!({"paths": {"/pets/{id}": {"get": {}}}});
        let resolver = RefResolver::new(&root, Dialect::V3Family, 32);
        assert!(resolver.lookup("#/paths/~1pets~1%7Bid%7D").is_ok());
        assert!(resolver.lookup("#/paths/~1pets~1{id}").is_ok());
    }

    fn fan_out(levels: usize) -> Value {
        let mut schemas = serde_json::Map::new();
        for i in 0..levels {
            let next = format!("#/components/schemas/S{}", i + 1);
            schemas.insert(
                format!("S{i}"),
                json!({"type": "object", "properties": {
                    "a": {"$ref": next},
                    "b": {"$ref": next}
                }}),
            );
        }
        schemas.insert(format!("S{levels}"), json!({"type": "string"}));
        json!({"components": {"schemas": schemas}})
    }

    fn node_count(node: &SchemaNode) -> usize {
        1 + match node {
            SchemaNode::Object {
                properties,
                additional,
                ..
            } => {
                properties.values().map(node_count).sum::<usize>()
                    + additional.as_deref().map_or(0, node_count)
            }
            SchemaNode::Array { items, .. } => node_count(items),
            SchemaNode::AllOf(parts) | SchemaNode::OneOf(parts) => {
                parts.iter().map(node_count).sum()
            }
            _ => 0,
        }
    }

    #[test]
    fn test_fan_out_is_cut_at_node_limit() {
        let root = fan_out(32);
        let mut resolver = RefResolver::new(&root, Dialect::V3Family, 64);
        let node = resolver.resolve(&SchemaNode::Reference("#/components/schemas/S0".into()));
        assert!(node_count(&node) <= DEFAULT_MAX_RESOLVED_NODES + 128);
        assert!(!node.has_references());

        // The budget applies per call, not per resolver.
        let again = resolver.resolve(&SchemaNode::Reference("#/components/schemas/S0".into()));
        assert_eq!(again, node);
    }

    #[test]
    fn test_small_fan_out_within_limit() {
        let root = fan_out(3);
        let mut resolver = RefResolver::new(&root, Dialect::V3Family, 32).with_node_limit(100);
        let node = resolver.resolve(&SchemaNode::Reference("#/components/schemas/S0".into()));
        // 1 + 2 + 4 objects and 8 leaves
        assert_eq!(node_count(&node), 15);

        let mut tight = RefResolver::new(&root, Dialect::V3Family, 32).with_node_limit(4);
        let cut = tight.resolve(&SchemaNode::Reference("#/components/schemas/S0".into()));
        assert!(node_count(&cut) < 15);
        assert_eq!(property(&cut, "b"), &SchemaNode::Opaque);
    }

    #[test]
    fn test_resolves_to_array_follows_top_level_chain() {
        let root = json!({"components": {"schemas": {
            "List": {"$ref": "#/components/schemas/Items"},
            "Items": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}},
            "Pet": {"type": "object"}
        }}});
        let resolver = RefResolver::new(&root, Dialect::V3Family, 32);
        let reference = |name: &str| SchemaNode::Reference(format!("#/components/schemas/{name}"));
        assert!(resolver.resolves_to_array(&reference("List")));
        assert!(resolver.resolves_to_array(&reference("Items")));
        assert!(!resolver.resolves_to_array(&reference("Pet")));
        assert!(!resolver.resolves_to_array(&reference("Missing")));
    }
}
