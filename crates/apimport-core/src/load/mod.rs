pub mod http;

use std::fs;
use std::path::PathBuf;

use log::debug;
use url::Url;

use crate::error::FetchError;
use crate::model::{ImportRequest, Origin};

pub use http::HttpFetcher;

/// Raw descriptor text plus where it came from. Nothing is parsed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub origin: Origin,
    /// The URL or path the text was read from; `None` for inline payloads.
    pub location: Option<String>,
    pub text: String,
}

/// Retrieves descriptor text from a remote `http(s)` location.
pub trait DescriptorFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Resolve a request into raw descriptor text.
///
/// Inline payloads never fail. URL payloads go through `fetcher` when they use
/// an `http`/`https` scheme and are read from disk otherwise (`file://` URLs or
/// plain paths). There is exactly one attempt.
pub fn load(
    request: &ImportRequest,
    fetcher: &dyn DescriptorFetcher,
) -> Result<Descriptor, FetchError> {
    match request.origin {
        Origin::Inline => Ok(Descriptor {
            origin: Origin::Inline,
            location: None,
            text: request.payload.clone(),
        }),
        Origin::Url => {
            let location = request.payload.trim();
            let text = if is_remote(location) {
                debug!("fetching descriptor from {location}");
                fetcher.fetch(location)?
            } else {
                let path = local_path(location)?;
                debug!("reading descriptor from {}", path.display());
                fs::read_to_string(&path).map_err(|source| FetchError::Io {
                    path: path.display().to_string(),
                    source,
                })?
            };
            Ok(Descriptor {
                origin: Origin::Url,
                location: Some(location.to_string()),
                text,
            })
        }
    }
}

fn is_remote(location: &str) -> bool {
    Url::parse(location).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// The filesystem path behind a `file://` URL, or the location itself when it
/// is a plain path.
fn local_path(location: &str) -> Result<PathBuf, FetchError> {
    let is_file_url = location
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("file:"));
    if !is_file_url {
        return Ok(PathBuf::from(location));
    }
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: location.to_string(),
        reason,
    };
    let url = Url::parse(location).map_err(|e| invalid(e.to_string()))?;
    url.to_file_path()
        .map_err(|()| invalid("not a local file path".to_string()))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Write;

    use super::*;

    struct RecordingFetcher {
        calls: RefCell<Vec<String>>,
        reply: Result<String, u16>,
    }

    impl DescriptorFetcher for RecordingFetcher {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            self.reply.clone().map_err(|status| FetchError::Status {
                url: url.to_string(),
                status,
            })
        }
    }

    fn fetcher(reply: Result<String, u16>) -> RecordingFetcher {
        RecordingFetcher {
            calls: RefCell::new(Vec::new()),
            reply,
        }
    }

    #[test]
    fn test_inline_is_passed_through() {
        let f = fetcher(Err(500));
        let d = load(&ImportRequest::inline("openapi: 3.0.0"), &f).unwrap();
        assert_eq!(d.text, "openapi: 3.0.0");
        assert_eq!(d.origin, Origin::Inline);
        assert!(d.location.is_none());
        assert!(f.calls.borrow().is_empty());
    }

    #[test]
    fn test_remote_uses_fetcher_once() {
        let f = fetcher(Ok("{}".to_string()));
        let d = load(&ImportRequest::url("https://example.com/spec.json"), &f).unwrap();
        assert_eq!(d.text, "{}");
        assert_eq!(f.calls.borrow().as_slice(), ["https://example.com/spec.json"]);
    }

    #[test]
    fn test_remote_failure_is_surfaced() {
        let f = fetcher(Err(404));
        let err = load(&ImportRequest::url("http://example.com/missing"), &f).unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(f.calls.borrow().len(), 1);
    }

    #[test]
    fn test_local_path_and_file_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "swagger: '2.0'").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let f = fetcher(Err(500));

        let d = load(&ImportRequest::url(path.clone()), &f).unwrap();
        assert_eq!(d.text, "swagger: '2.0'");

        let d = load(&ImportRequest::url(format!("file://{path}")), &f).unwrap();
        assert_eq!(d.text, "swagger: '2.0'");
        assert!(f.calls.borrow().is_empty());
    }

    #[test]
    fn test_file_url_is_percent_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("pet dir");
        fs::create_dir(&folder).unwrap();
        let path = folder.join("pet store.yaml");
        fs::write(&path, "openapi: 3.0.0").unwrap();
        let f = fetcher(Err(500));

        let url = Url::from_file_path(&path).unwrap();
        assert!(url.as_str().contains("pet%20dir/pet%20store.yaml"));
        let d = load(&ImportRequest::url(url.as_str()), &f).unwrap();
        assert_eq!(d.text, "openapi: 3.0.0");

        let with_host = format!("file://localhost{}", url.path());
        let d = load(&ImportRequest::url(with_host), &f).unwrap();
        assert_eq!(d.text, "openapi: 3.0.0");
        assert!(f.calls.borrow().is_empty());
    }

    #[test]
    fn test_file_url_with_remote_host_is_rejected() {
        let f = fetcher(Err(500));
        let err = load(&ImportRequest::url("file://fileserver/share/api.yaml"), &f).unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
        assert!(f.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let f = fetcher(Err(500));
        let err = load(&ImportRequest::url("/definitely/not/here.yaml"), &f).unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
