use log::warn;
use serde_json::{Map, Value, json};

use crate::parse::dialect::Dialect;
use crate::parse::ref_resolve::RefResolver;
use crate::parse::schema::SchemaNode;

/// HTTP methods recognised as operations, in canonical order.
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A path template with its operations, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPath {
    pub template: String,
    pub operations: Vec<RawOperation>,
}

/// One operation as declared in the descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOperation {
    /// Upper-case HTTP method.
    pub method: String,
    pub description: String,
    /// Responses in declaration order.
    pub responses: Vec<RawResponse>,
}

/// A declared response: status key, unresolved schema and literal example.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: String,
    pub schema: Option<SchemaNode>,
    pub example: Option<Value>,
}

/// Walk the path table of the descriptor in declaration order.
pub fn collect_paths<'a>(tree: &'a Value, resolver: &RefResolver<'a>) -> Vec<RawPath> {
    match resolver.dialect() {
        Dialect::LegacyV1 => legacy_paths(tree),
        Dialect::V2 | Dialect::V3Family => path_table(tree, resolver),
    }
}

/// Rewrite `{name}` and `<name>` placeholders as `:name`. Already-normalized
/// templates come back unchanged.
pub fn normalize_path(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find(['{', '<']) {
        let close = if rest[start..].starts_with('{') { '}' } else { '>' };
        let Some(len) = rest[start + 1..].find(close) else {
            break;
        };
        let name = &rest[start + 1..start + 1 + len];
        out.push_str(&rest[..start]);
        if name.is_empty() || name.contains('/') {
            out.push_str(&rest[start..start + len + 2]);
        } else {
            out.push(':');
            out.push_str(name);
        }
        rest = &rest[start + len + 2..];
    }
    out.push_str(rest);
    out
}

fn path_table<'a>(tree: &'a Value, resolver: &RefResolver<'a>) -> Vec<RawPath> {
    let Some(paths) = tree.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };
    paths
        .iter()
        .map(|(template, item)| {
            let item = follow_or_warn(resolver, item);
            RawPath {
                template: template.clone(),
                operations: item
                    .and_then(Value::as_object)
                    .map(|item| operations_of(item, resolver))
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn operations_of<'a>(
    item: &'a Map<String, Value>,
    resolver: &RefResolver<'a>,
) -> Vec<RawOperation> {
    item.iter()
        .filter(|(key, _)| is_http_method(key))
        .filter_map(|(key, op)| {
            let op = op.as_object()?;
            Some(RawOperation {
                method: key.to_ascii_uppercase(),
                description: describe(op, "operationId"),
                responses: match resolver.dialect() {
                    Dialect::V3Family => openapi3_responses(op, resolver),
                    _ => swagger2_responses(op, resolver),
                },
            })
        })
        .collect()
}

fn openapi3_responses<'a>(
    op: &'a Map<String, Value>,
    resolver: &RefResolver<'a>,
) -> Vec<RawResponse> {
    responses_of(op, resolver, |response| {
        let Some(media) = response
            .get("content")
            .and_then(Value::as_object)
            .and_then(pick_media_type)
        else {
            return (None, None);
        };
        let schema = media
            .get("schema")
            .map(|s| SchemaNode::from_value(s, resolver.dialect()));
        let example = media.get("example").cloned().or_else(|| {
            media
                .get("examples")
                .and_then(Value::as_object)
                .and_then(|examples| examples.values().next())
                .and_then(|ex| follow_or_warn(resolver, ex))
                .and_then(|ex| ex.get("value"))
                .cloned()
        });
        (schema, example)
    })
}

fn swagger2_responses<'a>(
    op: &'a Map<String, Value>,
    resolver: &RefResolver<'a>,
) -> Vec<RawResponse> {
    responses_of(op, resolver, |response| {
        let schema = response
            .get("schema")
            .map(|s| SchemaNode::from_value(s, resolver.dialect()));
        let example = response
            .get("examples")
            .and_then(Value::as_object)
            .and_then(pick_media_type)
            .cloned();
        (schema, example)
    })
}

fn responses_of<'a, F>(
    op: &'a Map<String, Value>,
    resolver: &RefResolver<'a>,
    read: F,
) -> Vec<RawResponse>
where
    F: Fn(&'a Value) -> (Option<SchemaNode>, Option<Value>),
{
    let Some(responses) = op.get("responses").and_then(Value::as_object) else {
        return Vec::new();
    };
    responses
        .iter()
        .map(|(status, response)| {
            let (schema, example) = follow_or_warn(resolver, response)
                .map(&read)
                .unwrap_or((None, None));
            RawResponse {
                status: status.clone(),
                schema,
                example,
            }
        })
        .collect()
}

/// Swagger 1.x keeps operations under `apis[].operations[]`.
fn legacy_paths(tree: &Value) -> Vec<RawPath> {
    let Some(apis) = tree.get("apis").and_then(Value::as_array) else {
        return Vec::new();
    };
    apis.iter()
        .filter_map(|api| {
            let template = api.get("path")?.as_str()?.to_string();
            let operations = api
                .get("operations")
                .and_then(Value::as_array)
                .map(|ops| {
                    ops.iter()
                        .filter_map(Value::as_object)
                        .filter_map(legacy_operation)
                        .collect()
                })
                .unwrap_or_default();
            Some(RawPath {
                template,
                operations,
            })
        })
        .collect()
}

fn legacy_operation(op: &Map<String, Value>) -> Option<RawOperation> {
    let method = op.get("method")?.as_str()?;
    if !is_http_method(method) {
        return None;
    }

    let declared = match op.get("type").and_then(Value::as_str) {
        Some("void") => None,
        None if !op.contains_key("$ref") => None,
        _ => Some(SchemaNode::from_value(
            &Value::Object(op.clone()),
            Dialect::LegacyV1,
        )),
    };

    let mut responses: Vec<RawResponse> = op
        .get("responseMessages")
        .and_then(Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .filter_map(|msg| {
                    let status = match msg.get("code")? {
                        Value::Number(n) => n.to_string(),
                        Value::String(s) => s.clone(),
                        _ => return None,
                    };
                    let schema = msg
                        .get("responseModel")
                        .and_then(Value::as_str)
                        .map(|model| {
                            SchemaNode::from_value(&json!({ "type": model }), Dialect::LegacyV1)
                        });
                    Some(RawResponse {
                        status,
                        schema,
                        example: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let has_success = responses.iter().any(|r| r.status.starts_with('2'));
    if has_success {
        for response in responses.iter_mut().filter(|r| r.status.starts_with('2')) {
            if response.schema.is_none() {
                response.schema = declared.clone();
            }
        }
    } else {
        responses.insert(
            0,
            RawResponse {
                status: "200".to_string(),
                schema: declared,
                example: None,
            },
        );
    }

    Some(RawOperation {
        method: method.to_ascii_uppercase(),
        description: describe(op, "nickname"),
        responses,
    })
}

/// First non-empty of summary, the operation identifier, and description.
fn describe(op: &Map<String, Value>, id_key: &str) -> String {
    ["summary", id_key, "description"]
        .iter()
        .filter_map(|key| op.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Prefer `application/json`, then any `+json`/`json` type, then the first.
fn pick_media_type(content: &Map<String, Value>) -> Option<&Value> {
    content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(media, _)| media.contains("json"))
                .map(|(_, v)| v)
        })
        .or_else(|| content.values().next())
}

fn is_http_method(key: &str) -> bool {
    HTTP_METHODS.iter().any(|m| m.eq_ignore_ascii_case(key))
}

fn follow_or_warn<'a>(resolver: &RefResolver<'a>, value: &'a Value) -> Option<&'a Value> {
    match resolver.follow(value) {
        Ok(target) => Some(target),
        Err(err) => {
            warn!("{err}, skipping");
            None
        }
    }
}
