use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level import configuration loaded from `.apimport.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Synthesize example responses when the request does not say otherwise.
    pub generate_mocks: bool,
    /// When false, paths are emitted without their verb lists.
    pub extract_verbs: bool,
    /// Maximum number of nested `$ref` expansions on a single branch.
    pub max_ref_depth: usize,
    /// Maximum number of nodes produced when expanding one response schema.
    pub max_resolved_nodes: usize,
    pub server_variables: ServerVariablePolicy,
    pub mock: MockConfig,
    pub fetch: FetchConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            generate_mocks: false,
            extract_verbs: true,
            max_ref_depth: DEFAULT_MAX_REF_DEPTH,
            max_resolved_nodes: DEFAULT_MAX_RESOLVED_NODES,
            server_variables: ServerVariablePolicy::Expand,
            mock: MockConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

pub const DEFAULT_MAX_REF_DEPTH: usize = 32;
pub const DEFAULT_MAX_RESOLVED_NODES: usize = 10_000;

/// How `{variable}` placeholders in OpenAPI 3 server URLs are filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerVariablePolicy {
    /// One endpoint per `enum` value of each variable, `default` otherwise.
    #[default]
    Expand,
    /// Only the `default`, or the first `enum` value when there is none.
    DefaultOnly,
}

/// Placeholder values used when a schema declares no example.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    pub string: String,
    pub integer: i64,
    pub number: f64,
    pub boolean: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            string: "Mocked string".to_string(),
            integer: 1,
            number: 1.5,
            boolean: true,
        }
    }
}

/// Remote descriptor retrieval.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("apimport/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".apimport.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ImportConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: ImportConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# apimport configuration
generate_mocks: false     # synthesize example responses for every verb
extract_verbs: true       # false = emit paths only
max_ref_depth: 32         # nested $ref expansions before giving up on a branch
max_resolved_nodes: 10000 # schema nodes per response before the rest is left empty
server_variables: expand  # expand | default_only

mock:
  string: Mocked string
  integer: 1
  number: 1.5
  boolean: true

fetch:
  timeout_secs: 30
  # user_agent: my-importer/1.0
"#
}
