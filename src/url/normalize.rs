use crate::UrlError;
use url::Url;

/// Normalizes a URL into the key the frontier uses for de-duplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything but http:// and https://
/// 3. Lowercase the scheme and host (the `url` crate also drops default ports
///    and resolves `.` / `..` segments while parsing)
/// 4. Normalize path:
///    - Collapse repeated slashes
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
///
/// The query string is kept untouched since servers may treat its ordering
/// as significant.
///
/// # Examples
///
/// ```
/// use ripple_crawler::url::normalize_url;
///
/// let url = normalize_url("HTTP://EXAMPLE.COM/page/#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {
            let lowered = host.to_lowercase();
            if lowered != host {
                url.set_host(Some(&lowered))
                    .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
            }
        }
        _ => return Err(UrlError::MissingDomain),
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    Ok(url)
}

/// Returns the string key for a URL, or None if it cannot be normalized
pub fn normalized_key(url_str: &str) -> Option<String> {
    normalize_url(url_str).ok().map(String::from)
}

/// Soft scheme check used when seed URLs are declared
///
/// ```
/// use ripple_crawler::url::has_http_scheme;
///
/// assert!(has_http_scheme("https://example.com"));
/// assert!(has_http_scheme("HTTP://example.com"));
/// assert!(!has_http_scheme("ftp://example.com"));
/// ```
pub fn has_http_scheme(url_str: &str) -> bool {
    let lowered = url_str.trim_start().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}
