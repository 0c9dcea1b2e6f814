use indexmap::IndexMap;
use indexmap::map::Entry;
use log::debug;
use serde_json::Value;

use crate::config::{ImportConfig, MockConfig, ServerVariablePolicy};
use crate::model::{ApiModel, PathModel, VerbModel};
use crate::parse::ParsedDescriptor;
use crate::parse::dialect::Dialect;
use crate::parse::ref_resolve::RefResolver;

use super::mock::{Synthesizer, response_status, select_response};
use super::paths::{RawOperation, collect_paths, normalize_path};
use super::servers::{context_path, resolve_servers};

/// Options controlling how a parsed descriptor becomes an [`ApiModel`].
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub generate_mocks: bool,
    pub extract_verbs: bool,
    pub max_ref_depth: usize,
    pub max_resolved_nodes: usize,
    pub server_variables: ServerVariablePolicy,
    pub mock: MockConfig,
}

impl ConvertOptions {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            generate_mocks: config.generate_mocks,
            extract_verbs: config.extract_verbs,
            max_ref_depth: config.max_ref_depth,
            max_resolved_nodes: config.max_resolved_nodes,
            server_variables: config.server_variables,
            mock: config.mock.clone(),
        }
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::from_config(&ImportConfig::default())
    }
}

/// Convert a parsed descriptor with default options (verbs, no mocks).
pub fn convert(parsed: &ParsedDescriptor) -> ApiModel {
    convert_with_options(parsed, &ConvertOptions::default())
}

/// Convert a parsed descriptor. Reference problems degrade to empty
/// placeholders, so once the dialect is known this cannot fail.
pub fn convert_with_options(parsed: &ParsedDescriptor, options: &ConvertOptions) -> ApiModel {
    let tree = &parsed.tree;
    let dialect = parsed.dialect;

    // Phase 1: API identity
    let (name, version) = identity(tree, dialect);
    debug!("converting {dialect} descriptor '{name}' version '{version}'");

    // Phase 2: Endpoints and context path
    let servers = resolve_servers(tree, dialect, options.server_variables);
    let context_path = context_path(&servers.prefix, &name);

    // Phase 3: Paths and operations in declaration order
    let mut resolver = RefResolver::new(tree, dialect, options.max_ref_depth)
        .with_node_limit(options.max_resolved_nodes);
    let raw_paths = collect_paths(tree, &resolver);
    debug!("found {} path templates", raw_paths.len());

    // Phase 4: Normalize, merge templates that collapse to the same path
    let synthesizer = Synthesizer::new(&options.mock);
    let mut merged: IndexMap<String, Vec<VerbModel>> = IndexMap::new();
    for raw in &raw_paths {
        let verbs = match merged.entry(normalize_path(&raw.template)) {
            Entry::Occupied(entry) => {
                debug!("path {} merges into {}", raw.template, entry.key());
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(Vec::new()),
        };
        if !options.extract_verbs {
            continue;
        }
        for op in &raw.operations {
            if verbs.iter().any(|v| v.verb == op.method) {
                continue;
            }
            verbs.push(build_verb(op, &mut resolver, &synthesizer, options));
        }
    }

    let paths = merged
        .into_iter()
        .map(|(path, verbs)| PathModel {
            path,
            verbs: options.extract_verbs.then_some(verbs),
        })
        .collect();

    ApiModel {
        version,
        name,
        context_path,
        endpoints: servers.endpoints,
        paths,
    }
}

fn build_verb(
    op: &RawOperation,
    resolver: &mut RefResolver<'_>,
    synthesizer: &Synthesizer<'_>,
    options: &ConvertOptions,
) -> VerbModel {
    let selected = select_response(&op.responses);
    let response_status = response_status(selected.map(|r| r.status.as_str()));

    let schema = selected.and_then(|r| r.schema.as_ref());
    let literal = selected.and_then(|r| r.example.as_ref());

    let is_array = match (schema, literal) {
        (Some(schema), _) => resolver.resolves_to_array(schema),
        (None, Some(example)) => example.is_array(),
        (None, None) => false,
    };

    // Full expansion is only needed to synthesize an example.
    let response_example = if options.generate_mocks {
        literal
            .cloned()
            .or_else(|| schema.map(|s| synthesizer.synthesize(&resolver.resolve(s))))
    } else {
        None
    };

    VerbModel {
        verb: op.method.clone(),
        description: op.description.clone(),
        response_status,
        is_array,
        response_example,
    }
}

/// Title and version, wherever the dialect keeps them.
fn identity(tree: &Value, dialect: Dialect) -> (String, String) {
    let info = tree.get("info");
    let title = info
        .and_then(|i| i.get("title"))
        .and_then(scalar_text)
        .unwrap_or_default();
    let version = match dialect {
        Dialect::LegacyV1 => tree.get("apiVersion"),
        Dialect::V2 | Dialect::V3Family => info.and_then(|i| i.get("version")),
    }
    .and_then(scalar_text)
    .unwrap_or_default();
    (title, version)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parse::parse_descriptor;

    fn parsed(tree: Value) -> ParsedDescriptor {
        parse_descriptor(&tree.to_string()).unwrap()
    }

    fn with_mocks() -> ConvertOptions {
        ConvertOptions {
            generate_mocks: true,
            ..ConvertOptions::default()
        }
    }

    #[test]
    fn test_duplicate_templates_merge() {
        let model = convert(&parsed(json!({
            "openapi": "3.0.0",
            "info": {"title": "Dup", "version": "1"},
            "paths": {
                "/items/{id}": {"get": {"responses": {"200": {"description": "ok"}}}},
                "/items/:id": {
                    "get": {"responses": {"200": {"description": "ok"}}},
                    "delete": {"responses": {"204": {"description": "gone"}}}
                }
            }
        })));
        assert_eq!(model.paths.len(), 1);
        let verbs = model.paths[0].verbs.as_ref().unwrap();
        let names: Vec<&str> = verbs.iter().map(|v| v.verb.as_str()).collect();
        assert_eq!(names, ["GET", "DELETE"]);
        assert_eq!(verbs[1].response_status, "204");
    }

    #[test]
    fn test_verbs_suppressed() {
        let options = ConvertOptions {
            extract_verbs: false,
            ..ConvertOptions::default()
        };
        let model = convert_with_options(
            &parsed(json!({
                "swagger": "2.0",
                "info": {"title": "T", "version": "2"},
                "paths": {"/a": {"get": {}}, "/b/{x}": {"post": {}}}
            })),
            &options,
        );
        assert_eq!(model.paths.len(), 2);
        assert!(model.paths.iter().all(|p| p.verbs.is_none()));
        assert_eq!(model.paths[1].path, "/b/:x");
    }

    #[test]
    fn test_example_omitted_without_mocks() {
        let tree = json!({
            "openapi": "3.0.0",
            "info": {"title": "T", "version": "1"},
            "paths": {"/n": {"get": {"responses": {"200": {
                "description": "ok",
                "content": {"application/json": {"schema": {"type": "array", "items": {"type": "integer"}}}}
            }}}}}
        });
        let plain = convert(&parsed(tree.clone()));
        let verb = plain.paths[0].verb("GET").unwrap();
        assert!(verb.is_array);
        assert!(verb.response_example.is_none());

        let mocked = convert_with_options(&parsed(tree), &with_mocks());
        let verb = mocked.paths[0].verb("GET").unwrap();
        assert_eq!(verb.response_example, Some(json!([1])));
    }

    #[test]
    fn test_operation_without_responses() {
        let model = convert_with_options(
            &parsed(json!({
                "openapi": "3.0.0",
                "info": {"title": "T", "version": "1"},
                "paths": {"/ping": {"head": {"summary": "Ping"}}}
            })),
            &with_mocks(),
        );
        let verb = model.paths[0].verb("HEAD").unwrap();
        assert_eq!(verb.response_status, "200");
        assert_eq!(verb.description, "Ping");
        assert!(!verb.is_array);
        assert!(verb.response_example.is_none());
    }

    #[test]
    fn test_numeric_version_and_missing_title() {
        let model = convert(&parsed(json!({
            "swagger": "2.0",
            "info": {"version": 1.5},
            "paths": {}
        })));
        assert_eq!(model.version, "1.5");
        assert_eq!(model.name, "");
        assert_eq!(model.endpoints, ["/"]);
        assert_eq!(model.context_path, "");
    }
}
