use url::Url;

/// Extracts the lowercase hostname from a URL
///
/// The port is not part of the hostname, so `http://localhost:8080/` and
/// `http://localhost:9090/` share the host `localhost`.
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the URL has no host (`mailto:`, `data:` and friends)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use bald_stalker::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Returns true if both URLs point at the same host
///
/// URLs without a host never match anything.
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_host(a), extract_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
