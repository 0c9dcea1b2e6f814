use serde::{Deserialize, Serialize};

/// The normalized result of importing one descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiModel {
    pub version: String,
    pub name: String,
    pub context_path: String,
    /// Base URLs in server declaration order, never empty.
    pub endpoints: Vec<String>,
    pub paths: Vec<PathModel>,
}

impl ApiModel {
    pub fn path(&self, path: &str) -> Option<&PathModel> {
        self.paths.iter().find(|p| p.path == path)
    }
}

/// One resource path with `:param` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathModel {
    pub path: String,
    /// `None` when verb extraction was disabled for the import.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbs: Option<Vec<VerbModel>>,
}

impl PathModel {
    pub fn verb(&self, verb: &str) -> Option<&VerbModel> {
        self.verbs
            .as_deref()
            .and_then(|verbs| verbs.iter().find(|v| v.verb.eq_ignore_ascii_case(verb)))
    }
}

/// A single HTTP operation on a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbModel {
    pub verb: String,
    pub description: String,
    pub response_status: String,
    pub is_array: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_example: Option<serde_json::Value>,
}

/// Where the descriptor payload comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// The payload is the descriptor text itself.
    Inline,
    /// The payload is an `http(s)://` URL, a `file://` URL or a filesystem path.
    Url,
}

/// A conversion request as handed over by the surrounding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub origin: Origin,
    pub payload: String,
    #[serde(default)]
    pub generate_mocks: bool,
}

impl ImportRequest {
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Inline,
            payload: text.into(),
            generate_mocks: false,
        }
    }

    pub fn url(location: impl Into<String>) -> Self {
        Self {
            origin: Origin::Url,
            payload: location.into(),
            generate_mocks: false,
        }
    }

    pub fn with_mocks(mut self, generate_mocks: bool) -> Self {
        self.generate_mocks = generate_mocks;
        self
    }
}
