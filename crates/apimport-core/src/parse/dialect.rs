use std::fmt;

use serde_json::Value;

use crate::error::ParseError;

/// The schema dialect a descriptor is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Swagger 1.x resource listing (`swaggerVersion`).
    LegacyV1,
    /// Swagger 2.0 (`swagger`).
    V2,
    /// OpenAPI 3.x (`openapi`).
    V3Family,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::LegacyV1 => "swagger-1",
            Dialect::V2 => "swagger-2",
            Dialect::V3Family => "openapi-3",
        }
    }

    /// JSON pointer prefix under which named schemas live.
    pub fn schema_root(&self) -> &'static str {
        match self {
            Dialect::LegacyV1 => "#/models/",
            Dialect::V2 => "#/definitions/",
            Dialect::V3Family => "#/components/schemas/",
        }
    }

    /// Qualify a reference: local pointers are kept, bare names are placed
    /// under this dialect's schema root.
    pub fn qualify_ref(&self, reference: &str) -> String {
        if reference.starts_with('#') || reference.contains('/') || reference.contains('.') {
            reference.to_string()
        } else {
            format!("{}{}", self.schema_root(), reference)
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select the dialect from the top-level version marker.
pub fn detect(tree: &Value) -> Result<Dialect, ParseError> {
    if let Some(marker) = tree.get("openapi").and_then(marker_text) {
        return if has_major(&marker, "3") && marker.split('.').count() >= 2 {
            Ok(Dialect::V3Family)
        } else {
            Err(ParseError::UnsupportedVersion(format!("openapi {marker}")))
        };
    }
    if let Some(marker) = tree.get("swagger").and_then(marker_text) {
        return if has_major(&marker, "2") {
            Ok(Dialect::V2)
        } else {
            Err(ParseError::UnsupportedVersion(format!("swagger {marker}")))
        };
    }
    if let Some(marker) = tree.get("swaggerVersion").and_then(marker_text) {
        return if has_major(&marker, "1") {
            Ok(Dialect::LegacyV1)
        } else {
            Err(ParseError::UnsupportedVersion(format!("swaggerVersion {marker}")))
        };
    }
    Err(ParseError::UnsupportedVersion("no version marker".to_string()))
}

/// Version markers are usually strings but YAML happily reads `2.0` as a float.
fn marker_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn has_major(marker: &str, major: &str) -> bool {
    marker.split('.').next() == Some(major)
}
