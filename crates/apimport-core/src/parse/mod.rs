pub mod dialect;
pub mod format;
pub mod ref_resolve;
pub mod schema;

use serde_json::Value;

use crate::error::ParseError;
use dialect::Dialect;

pub use format::parse_tree;

/// A parsed descriptor tree together with its detected dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDescriptor {
    pub dialect: Dialect,
    pub tree: Value,
}

/// Parse descriptor text (JSON or YAML) and detect its dialect.
pub fn parse_descriptor(text: &str) -> Result<ParsedDescriptor, ParseError> {
    let tree = parse_tree(text)?;
    let dialect = dialect::detect(&tree)?;
    Ok(ParsedDescriptor { dialect, tree })
}
