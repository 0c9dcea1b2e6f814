use serde_json::{Map, Number, Value};

use super::paths::RawResponse;
use crate::config::MockConfig;
use crate::parse::schema::{ScalarKind, SchemaNode};

/// Pick the response to mock: the lowest numeric 2xx status, then a `2XX`
/// range key, otherwise the first declared response.
pub fn select_response(responses: &[RawResponse]) -> Option<&RawResponse> {
    responses
        .iter()
        .filter_map(|r| success_rank(&r.status).map(|rank| (rank, r)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, r)| r)
        .or_else(|| responses.first())
}

/// The three-digit status reported for a selected response key.
pub fn response_status(key: Option<&str>) -> String {
    let Some(key) = key.map(str::trim) else {
        return "200".to_string();
    };
    if key.len() == 3 && key.bytes().all(|b| b.is_ascii_digit()) {
        return key.to_string();
    }
    // Range keys such as `2XX` report the first code of the range.
    match key.as_bytes() {
        [d @ b'1'..=b'5', x, y] if x.eq_ignore_ascii_case(&b'x') && y.eq_ignore_ascii_case(&b'x') => {
            format!("{}00", *d as char)
        }
        _ => "200".to_string(),
    }
}

/// Concrete 2xx codes sort before the `2XX` range key.
fn success_rank(status: &str) -> Option<(u8, u16)> {
    let status = status.trim();
    if status.eq_ignore_ascii_case("2xx") {
        return Some((1, 0));
    }
    let code: u16 = status.parse().ok()?;
    (200..300).contains(&code).then_some((0, code))
}

/// Builds representative values for resolved schemas.
pub struct Synthesizer<'c> {
    config: &'c MockConfig,
}

impl<'c> Synthesizer<'c> {
    pub fn new(config: &'c MockConfig) -> Self {
        Self { config }
    }

    /// A representative value for `schema`.
    ///
    /// Declared examples are used verbatim. Properties are synthesized one by
    /// one, so an example on a nested field wins over the same key in the
    /// enclosing object's example.
    pub fn synthesize(&self, schema: &SchemaNode) -> Value {
        self.value_for(schema, None)
    }

    fn value_for(&self, schema: &SchemaNode, inherited: Option<&Value>) -> Value {
        match schema {
            SchemaNode::Object {
                properties,
                additional,
                example,
            } => {
                let example = example.as_ref().or(inherited);
                if !properties.is_empty() {
                    let map: Map<String, Value> = properties
                        .iter()
                        .map(|(name, prop)| {
                            let from_parent = example.and_then(|e| e.get(name));
                            (name.clone(), self.value_for(prop, from_parent))
                        })
                        .collect();
                    Value::Object(map)
                } else if let Some(example) = example {
                    example.clone()
                } else if let Some(additional) = additional {
                    let mut map = Map::new();
                    map.insert(
                        "additionalProp1".to_string(),
                        self.value_for(additional, None),
                    );
                    Value::Object(map)
                } else {
                    Value::Object(Map::new())
                }
            }
            SchemaNode::Array { items, example } => match example.as_ref().or(inherited) {
                Some(example) => example.clone(),
                None => Value::Array(vec![self.value_for(items, None)]),
            },
            SchemaNode::Scalar { kind, example } => match example.as_ref().or(inherited) {
                Some(example) => example.clone(),
                None => self.placeholder(*kind),
            },
            SchemaNode::Enum { values, example } => example
                .as_ref()
                .or(inherited)
                .or_else(|| values.first())
                .cloned()
                .unwrap_or_else(|| self.placeholder(ScalarKind::String)),
            SchemaNode::AllOf(parts) => {
                let mut merged = Map::new();
                let mut fallback = None;
                for part in parts {
                    match self.value_for(part, inherited) {
                        Value::Object(fields) => merged.extend(fields),
                        other => {
                            fallback.get_or_insert(other);
                        }
                    }
                }
                match fallback {
                    Some(value) if merged.is_empty() => value,
                    _ => Value::Object(merged),
                }
            }
            SchemaNode::OneOf(variants) => match variants.first() {
                Some(first) => self.value_for(first, inherited),
                None => inherited
                    .cloned()
                    .unwrap_or_else(|| self.placeholder(ScalarKind::Unknown)),
            },
            // An unresolved reference carries no shape; treat it like an
            // expansion failure.
            SchemaNode::Reference(_) | SchemaNode::Opaque => inherited
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    fn placeholder(&self, kind: ScalarKind) -> Value {
        match kind {
            ScalarKind::Integer => Value::Number(self.config.integer.into()),
            ScalarKind::Number => Number::from_f64(self.config.number)
                .map(Value::Number)
                .unwrap_or_else(|| Value::Number(self.config.integer.into())),
            ScalarKind::Boolean => Value::Bool(self.config.boolean),
            ScalarKind::String | ScalarKind::Null | ScalarKind::Unknown => {
                Value::String(self.config.string.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;
    use crate::parse::dialect::Dialect;

    fn response(status: &str) -> RawResponse {
        RawResponse {
            status: status.to_string(),
            schema: None,
            example: None,
        }
    }

    fn synth(schema: Value) -> Value {
        let config = MockConfig::default();
        let node = SchemaNode::from_value(&schema, Dialect::V3Family);
        Synthesizer::new(&config).synthesize(&node)
    }

    #[test]
    fn test_select_lowest_success() {
        let responses = vec![response("default"), response("202"), response("201"), response("400")];
        assert_eq!(select_response(&responses).unwrap().status, "201");
    }

    #[test]
    fn test_select_first_declared_without_success() {
        let responses = vec![response("404"), response("default"), response("302")];
        assert_eq!(select_response(&responses).unwrap().status, "404");
        assert!(select_response(&[]).is_none());
    }

    #[test]
    fn test_select_success_range() {
        let responses = vec![response("404"), response("2XX")];
        let selected = select_response(&responses).unwrap();
        assert_eq!(selected.status, "2XX");
        assert_eq!(response_status(Some(&selected.status)), "200");

        let responses = vec![response("2xx"), response("201"), response("default")];
        assert_eq!(select_response(&responses).unwrap().status, "201");

        let responses = vec![response("4XX"), response("500")];
        assert_eq!(select_response(&responses).unwrap().status, "4XX");
    }

    #[test]
    fn test_response_status() {
        assert_eq!(response_status(Some("201")), "201");
        assert_eq!(response_status(Some("2XX")), "200");
        assert_eq!(response_status(Some("4xx")), "400");
        assert_eq!(response_status(Some("default")), "200");
        assert_eq!(response_status(None), "200");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(synth(json!({"type": "string"})), json!("Mocked string"));
        assert_eq!(synth(json!({"type": "integer"})), json!(1));
        assert_eq!(synth(json!({"type": "number"})), json!(1.5));
        assert_eq!(synth(json!({"type": "boolean"})), json!(true));
        assert_eq!(synth(json!({"type": "integer", "example": 123})), json!(123));
        assert_eq!(synth(json!({})), json!("Mocked string"));
    }

    #[test]
    fn test_enum_uses_first_value() {
        assert_eq!(
            synth(json!({"type": "string", "enum": ["value1", "value2"]})),
            json!("value1")
        );
        assert_eq!(
            synth(json!({"type": "string", "enum": ["a", "b"], "example": "b"})),
            json!("b")
        );
    }

    #[test]
    fn test_array_wraps_single_item() {
        assert_eq!(
            synth(json!({"type": "array", "items": {"type": "string", "example": "itemValue"}})),
            json!(["itemValue"])
        );
        assert_eq!(
            synth(json!({"type": "array", "items": {"type": "integer"}, "example": [4, 5]})),
            json!([4, 5])
        );
    }

    #[test]
    fn test_field_example_beats_object_example() {
        let value = synth(json!({
            "type": "object",
            "example": {"name": "from-object", "id": 9, "ignored": true},
            "properties": {
                "name": {"type": "string", "example": "from-field"},
                "id": {"type": "integer"},
                "tag": {"type": "string"}
            }
        }));
        assert_eq!(
            value,
            json!({"name": "from-field", "id": 9, "tag": "Mocked string"})
        );
    }

    #[test]
    fn test_object_without_properties() {
        assert_eq!(synth(json!({"type": "object"})), json!({}));
        assert_eq!(
            synth(json!({"type": "object", "example": {"free": "form"}})),
            json!({"free": "form"})
        );
        assert_eq!(
            synth(json!({"type": "object", "additionalProperties": {"type": "integer"}})),
            json!({"additionalProp1": 1})
        );
    }

    #[test]
    fn test_compositions() {
        let merged = synth(json!({"allOf": [
            {"type": "object", "properties": {"id": {"type": "integer"}}},
            {"type": "object", "properties": {"name": {"type": "string"}}}
        ]}));
        assert_eq!(merged, json!({"id": 1, "name": "Mocked string"}));

        let first = synth(json!({"oneOf": [{"type": "boolean"}, {"type": "string"}]}));
        assert_eq!(first, json!(true));
    }

    #[test]
    fn test_opaque_is_empty_object() {
        let config = MockConfig::default();
        let mut properties = IndexMap::new();
        properties.insert("next".to_string(), SchemaNode::Opaque);
        let node = SchemaNode::Object {
            properties,
            additional: None,
            example: None,
        };
        assert_eq!(
            Synthesizer::new(&config).synthesize(&node),
            json!({"next": {}})
        );
    }

    #[test]
    fn test_custom_placeholders() {
        let config = MockConfig {
            string: "stub".to_string(),
            integer: 42,
            number: 0.5,
            boolean: false,
        };
        let node = SchemaNode::from_value(
            &json!({"properties": {"s": {"type": "string"}, "i": {"type": "integer"}, "b": {"type": "boolean"}}}),
            Dialect::V3Family,
        );
        assert_eq!(
            Synthesizer::new(&config).synthesize(&node),
            json!({"s": "stub", "i": 42, "b": false})
        );
    }
}
