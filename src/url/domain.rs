use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a host equals a domain or is one of its subdomains
///
/// Both arguments are expected to be lowercase.
///
/// ```
/// use ripple_crawler::url::matches_domain;
///
/// assert!(matches_domain("example.com", "example.com"));
/// assert!(matches_domain("example.com", "api.v2.example.com"));
/// assert!(!matches_domain("example.com", "notexample.com"));
/// ```
pub fn matches_domain(domain: &str, host: &str) -> bool {
    if domain.is_empty() {
        return false;
    }

    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

/// The domain restriction of a crawl
///
/// Admits URLs whose host is the configured domain or any of its subdomains,
/// compared case-insensitively. A leading `*.` and a trailing `.` on the
/// configured domain are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    domain: String,
}

impl DomainScope {
    pub fn new(domain: &str) -> Self {
        let lowered = domain.trim().to_lowercase();
        let bare = lowered.strip_prefix("*.").unwrap_or(&lowered);
        let bare = bare.trim_end_matches('.');
        Self {
            domain: bare.to_string(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn contains(&self, url: &Url) -> bool {
        extract_domain(url)
            .map(|host| self.contains_host(&host))
            .unwrap_or(false)
    }

    pub fn contains_host(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        matches_domain(&self.domain, host.trim_end_matches('.'))
    }
}
