use serde_json::Value;
use url::Url;

use crate::config::ServerVariablePolicy;
use crate::parse::dialect::Dialect;

/// Where the API is reachable, plus the path prefix used for `contextPath`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub endpoints: Vec<String>,
    pub prefix: String,
}

pub fn resolve_servers(tree: &Value, dialect: Dialect, policy: ServerVariablePolicy) -> ServerInfo {
    let endpoints = match dialect {
        Dialect::LegacyV1 => legacy_endpoints(tree),
        Dialect::V2 => swagger2_endpoints(tree),
        Dialect::V3Family => openapi3_endpoints(tree, policy),
    };

    let prefix = match dialect {
        Dialect::V2 => str_field(tree, "basePath").unwrap_or_default().to_string(),
        _ => endpoints
            .first()
            .map(|url| url_path(url))
            .unwrap_or_default(),
    };

    let endpoints = if endpoints.is_empty() {
        vec!["/".to_string()]
    } else {
        endpoints
    };

    ServerInfo { endpoints, prefix }
}

/// `contextPath` is the server path prefix, or the slugified title when the
/// prefix is empty.
pub fn context_path(prefix: &str, title: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        slugify(title)
    } else {
        trimmed.to_string()
    }
}

/// Lower-case and strip all whitespace: `"Simple API overview"` → `"simpleapioverview"`.
pub fn slugify(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn legacy_endpoints(tree: &Value) -> Vec<String> {
    str_field(tree, "basePath")
        .map(str::trim)
        .filter(|base| !base.is_empty())
        .map(|base| vec![base.to_string()])
        .unwrap_or_default()
}

fn swagger2_endpoints(tree: &Value) -> Vec<String> {
    let base_path = str_field(tree, "basePath").unwrap_or_default();
    let Some(host) = str_field(tree, "host").filter(|h| !h.is_empty()) else {
        return if base_path.is_empty() {
            Vec::new()
        } else {
            vec![base_path.to_string()]
        };
    };

    let schemes: Vec<&str> = tree
        .get("schemes")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let scheme = if schemes.contains(&"https") || schemes.is_empty() {
        "https"
    } else {
        schemes[0]
    };

    vec![format!(
        "{scheme}://{}{base_path}",
        host.trim_end_matches('/')
    )]
}

fn openapi3_endpoints(tree: &Value, policy: ServerVariablePolicy) -> Vec<String> {
    let mut endpoints: Vec<String> = Vec::new();
    let servers = tree
        .get("servers")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for server in servers {
        let Some(url) = str_field(server, "url").map(str::trim).filter(|u| !u.is_empty()) else {
            continue;
        };
        for expanded in expand_variables(url, server.get("variables"), policy) {
            if !endpoints.contains(&expanded) {
                endpoints.push(expanded);
            }
        }
    }
    endpoints
}

/// Substitute `{name}` placeholders, producing one URL per combination of
/// values. Variables with no usable value are left untouched.
fn expand_variables(
    url: &str,
    variables: Option<&Value>,
    policy: ServerVariablePolicy,
) -> Vec<String> {
    let mut urls = vec![url.to_string()];
    let Some(variables) = variables.and_then(Value::as_object) else {
        return urls;
    };

    for (name, variable) in variables {
        let placeholder = format!("{{{name}}}");
        if !url.contains(&placeholder) {
            continue;
        }
        let values = variable_values(variable, policy);
        if values.is_empty() {
            continue;
        }
        urls = urls
            .iter()
            .flat_map(|current| values.iter().map(|v| current.replace(&placeholder, v)))
            .collect();
    }
    urls
}

fn variable_values(variable: &Value, policy: ServerVariablePolicy) -> Vec<String> {
    let default = variable.get("default").and_then(scalar_text);
    let allowed: Vec<String> = variable
        .get("enum")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(scalar_text).collect())
        .unwrap_or_default();

    match policy {
        ServerVariablePolicy::Expand if !allowed.is_empty() => allowed,
        ServerVariablePolicy::Expand => default.into_iter().collect(),
        ServerVariablePolicy::DefaultOnly => default
            .or_else(|| allowed.into_iter().next())
            .into_iter()
            .collect(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The path component of an absolute or relative URL, without query or fragment.
/// Relative URLs are resolved against a placeholder origin. Unparseable URLs
/// yield an empty path.
fn url_path(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => Ok(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
            .and_then(|base| Url::options().base_url(Some(&base)).parse(url)),
        Err(e) => Err(e),
    };
    match parsed {
        Ok(parsed) if parsed.cannot_be_a_base() => String::new(),
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => String::new(),
    }
}

fn str_field<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str)
}
