use crate::UrlError;
use url::Url;

/// Normalizes a URL into the host+path identity used for page deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if it is not an absolute URL
/// 2. Drop the scheme, port, query string and fragment
/// 3. Lowercase the host
/// 4. Remove a single trailing slash from the path (the root path `/` becomes empty)
/// 5. Concatenate host and path
///
/// Percent-encoding is left untouched, and two URLs that differ only by their query
/// string normalize to the same identity.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(String)` - The normalized identity, e.g. `blog.boot.dev/path`
/// * `Err(UrlError)` - The input is not an absolute URL, or it has no host
///
/// # Examples
///
/// ```
/// use bald_stalker::url::normalize_url;
///
/// assert_eq!(normalize_url("HTTP://BLOG.boot.dev/path/").unwrap(), "blog.boot.dev/path");
/// assert!(normalize_url("/relative/path").is_err());
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| UrlError::MissingDomain(url_str.to_string()))?
        .to_lowercase();

    let path = url.path();
    let path = path.strip_suffix('/').unwrap_or(path);

    Ok(format!("{}{}", host, path))
}
