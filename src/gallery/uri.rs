//! `file://` URIs and query parameters at the browser boundary.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("missing `param` query parameter")]
    Missing,
    #[error("not a file URI: {0}")]
    NotFileUri(String),
    #[error("malformed URI `{0}`")]
    Invalid(String),
}

/// Base for resolving request targets, which carry no scheme or host.
fn base() -> &'static Url {
    static BASE: OnceLock<Url> = OnceLock::new();
    BASE.get_or_init(|| Url::parse("http://x").expect("static base url"))
}

/// `file://` URI of an absolute path.
pub fn to_file_uri(path: &Path) -> String {
    Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|()| format!("file://{}", path.display()))
}

pub fn from_file_uri(uri: &str) -> Result<PathBuf, UriError> {
    let url = Url::parse(uri).map_err(|_| UriError::Invalid(uri.to_string()))?;
    if url.scheme() != "file" {
        return Err(UriError::NotFileUri(uri.to_string()));
    }
    url.to_file_path()
        .map_err(|()| UriError::Invalid(uri.to_string()))
}

/// Decoded path component of a request target.
pub fn request_path(target: &str) -> String {
    match base().join(target) {
        Ok(url) => percent_decode_str(url.path())
            .decode_utf8()
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| url.path().to_string()),
        Err(_) => target.split(['?', '#']).next().unwrap_or(target).to_string(),
    }
}

/// Decoded value of query parameter `name` in a request target.
pub fn query_param(target: &str, name: &str) -> Option<String> {
    let url = base().join(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// The file referenced by the `param` query parameter.
pub fn file_param(target: &str) -> Result<PathBuf, UriError> {
    let uri = query_param(target, "param").ok_or(UriError::Missing)?;
    from_file_uri(&uri)
}

/// Server-relative URL previewing `path`. `version` changes whenever the
/// file is regenerated so re-rendered images are fetched again.
pub fn thumbnail_url(path: &Path, version: u64) -> String {
    let uri = to_file_uri(path);
    format!(
        "/thumbnail?param={}&v={version}",
        utf8_percent_encode(&uri, NON_ALPHANUMERIC)
    )
}

/// Server-relative URL of an action on `path`.
#[cfg(test)]
pub fn action_url(action: &str, path: &Path) -> String {
    let uri = to_file_uri(path);
    format!("/{action}?param={}", utf8_percent_encode(&uri, NON_ALPHANUMERIC))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_file_uri_roundtrip_with_spaces() {
        let path = Path::new("/home/ana/My Figures/plot 1.svg");
        let uri = to_file_uri(path);
        assert_eq!(uri, "file:///home/ana/My%20Figures/plot%201.svg");
        assert_eq!(from_file_uri(&uri).unwrap(), path);
    }

    #[test]
    fn test_from_file_uri_errors() {
        assert_eq!(
            from_file_uri("http://example.com/a.svg"),
            Err(UriError::NotFileUri("http://example.com/a.svg".into()))
        );
        assert!(matches!(from_file_uri("not a uri"), Err(UriError::Invalid(_))));
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/gallery_data?x=1"), "/gallery_data");
        assert_eq!(request_path("/"), "/");
        assert_eq!(request_path("/a%20b"), "/a b");
    }

    #[test]
    fn test_file_param() {
        let path = Path::new("/w/figs/plot.png");
        let target = action_url("process", path);
        assert!(target.starts_with("/process?param=file%3A%2F%2F"));
        assert_eq!(file_param(&target).unwrap(), path);

        assert_eq!(file_param("/process"), Err(UriError::Missing));
        assert!(matches!(
            file_param("/process?param=%2Fw%2Fplot.svg"),
            Err(UriError::Invalid(_))
        ));
    }

    #[test]
    fn test_thumbnail_url_is_decodable() {
        let path = Path::new("/w/plot+1.svg");
        let url = thumbnail_url(path, 7);
        assert!(url.ends_with("&v=7"));
        assert_eq!(request_path(&url), "/thumbnail");
        assert_eq!(file_param(&url).unwrap(), path);
    }
}
