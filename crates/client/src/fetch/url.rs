//! URL resolution against the application origin.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a page-issued URL (absolute, or a path like `/src/main.tsx`)
/// against `origin`.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative references onto the origin
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
///
/// Any scheme is accepted here; whether a request is intercepted is the
/// classifier's decision.
pub fn resolve(input: &str, origin: &url::Url) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Parse an http(s) origin, reducing it to scheme, host and port.
pub fn parse_origin(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    url::Url::parse(&parsed.origin().ascii_serialization()).map_err(|e| UrlError::InvalidUrl(e.to_string()))
}

/// True when `url` shares scheme, host and port with `origin`.
pub fn is_same_origin(url: &url::Url, origin: &url::Url) -> bool {
    url.origin() == origin.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        parse_origin("https://m360.example").unwrap()
    }

    #[test]
    fn test_resolve_path() {
        let url = resolve("/src/main.tsx", &origin()).unwrap();
        assert_eq!(url.as_str(), "https://m360.example/src/main.tsx");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve("/", &origin()).unwrap();
        assert_eq!(url.as_str(), "https://m360.example/");
    }

    #[test]
    fn test_resolve_absolute_keeps_host() {
        let url = resolve("https://maps.googleapis.com/maps/api/js?key=k", &origin()).unwrap();
        assert_eq!(url.host_str(), Some("maps.googleapis.com"));
        assert_eq!(url.query(), Some("key=k"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve("/tours#rumtek", &origin()).unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/tours");
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve("  /calendar  ", &origin()).unwrap();
        assert_eq!(url.as_str(), "https://m360.example/calendar");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve("   ", &origin()), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_extension_scheme_passes() {
        let url = resolve("chrome-extension://abcdef/content.js", &origin()).unwrap();
        assert_eq!(url.scheme(), "chrome-extension");
    }

    #[test]
    fn test_parse_origin_strips_path() {
        let origin = parse_origin("https://M360.example:8443/app/").unwrap();
        assert_eq!(origin.as_str(), "https://m360.example:8443/");
    }

    #[test]
    fn test_parse_origin_rejects_scheme() {
        assert!(matches!(parse_origin("file:///srv"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_same_origin() {
        let origin = origin();
        assert!(is_same_origin(&resolve("/a", &origin).unwrap(), &origin));
        assert!(!is_same_origin(&resolve("https://cdn.example/a", &origin).unwrap(), &origin));
        assert!(!is_same_origin(&resolve("http://m360.example/a", &origin).unwrap(), &origin));
    }
}
