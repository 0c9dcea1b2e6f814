use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid descriptor URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("descriptor is neither valid JSON ({json}) nor valid YAML ({yaml})")]
    Malformed { json: String, yaml: String },

    #[error("descriptor root must be a mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("unsupported descriptor version: {0}")]
    UnsupportedVersion(String),
}

/// Reasons a reference could not be expanded. These never abort a conversion;
/// the resolver logs them and substitutes an empty placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("reference target not found: {0}")]
    RefTargetNotFound(String),

    #[error("external reference not supported: {0}")]
    ExternalRef(String),

    #[error("circular reference detected: {0}")]
    CircularRef(String),

    #[error("reference depth limit {limit} exceeded at {pointer}")]
    DepthExceeded { pointer: String, limit: usize },

    #[error("schema size limit of {limit} nodes reached at {pointer}")]
    NodeLimitExceeded { pointer: String, limit: usize },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}
