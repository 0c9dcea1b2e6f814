use serde_json::{Map, Number, Value};
use serde_yaml_ng::Value as YamlValue;

use crate::error::ParseError;

/// Parse descriptor text into a generic, insertion-ordered tree.
///
/// JSON is tried first, then YAML. The root must be a mapping.
pub fn parse_tree(text: &str) -> Result<Value, ParseError> {
    let tree = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(json_err) => match serde_yaml_ng::from_str::<YamlValue>(text) {
            Ok(yaml) => yaml_to_json(yaml),
            Err(yaml_err) => {
                return Err(ParseError::Malformed {
                    json: json_err.to_string(),
                    yaml: yaml_err.to_string(),
                });
            }
        },
    };

    match tree {
        Value::Object(_) => Ok(tree),
        other => Err(ParseError::NotAMapping(kind_name(&other))),
    }
}

/// Convert a YAML node into the JSON data model. Non-string keys are
/// stringified so that unquoted status codes (`200:`) survive as map keys.
pub fn yaml_to_json(value: YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => yaml_number(&n),
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, val) in mapping {
                map.insert(yaml_key(key), yaml_to_json(val));
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml_ng::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn yaml_key(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml_ng::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
