use regex::Regex;
use std::fmt;
use std::sync::Arc;
use url::Url;

type UrlPredicate = dyn Fn(&Url) -> bool + Send + Sync;

/// A pure predicate deciding whether a parser applies to a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_crawler::url::UrlMatcher;
///
/// let url = Url::parse("https://example.com/blog/post-1").unwrap();
///
/// assert!(UrlMatcher::any().matches(&url));
/// assert!(UrlMatcher::path_prefix("/blog").matches(&url));
/// assert!(UrlMatcher::regex(r"/post-\d+$").unwrap().matches(&url));
/// assert!(!UrlMatcher::host("other.com").matches(&url));
/// ```
#[derive(Clone)]
pub enum UrlMatcher {
    /// Matches every URL
    Any,
    /// Regular expression searched in the full URL string
    Pattern(Regex),
    /// Path starts with the given prefix
    PathPrefix(String),
    /// Host equals the given host (case-insensitive)
    Host(String),
    /// Arbitrary predicate
    Custom(Arc<UrlPredicate>),
}

impl UrlMatcher {
    pub fn any() -> Self {
        Self::Any
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    pub fn path_prefix(prefix: impl Into<String>) -> Self {
        Self::PathPrefix(prefix.into())
    }

    pub fn host(host: &str) -> Self {
        Self::Host(host.to_lowercase())
    }

    pub fn from_fn<F>(predicate: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    pub fn matches(&self, url: &Url) -> bool {
        match self {
            Self::Any => true,
            Self::Pattern(regex) => regex.is_match(url.as_str()),
            Self::PathPrefix(prefix) => url.path().starts_with(prefix.as_str()),
            Self::Host(host) => url
                .host_str()
                .map(|h| h.eq_ignore_ascii_case(host))
                .unwrap_or(false),
            Self::Custom(predicate) => predicate(url),
        }
    }
}

impl Default for UrlMatcher {
    fn default() -> Self {
        Self::Any
    }
}

impl fmt::Debug for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::Pattern(regex) => write!(f, "Pattern({:?})", regex.as_str()),
            Self::PathPrefix(prefix) => write!(f, "PathPrefix({:?})", prefix),
            Self::Host(host) => write!(f, "Host({:?})", host),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_any() {
        assert!(UrlMatcher::default().matches(&url("https://example.com/")));
    }

    #[test]
    fn test_regex_searches_full_url() {
        let matcher = UrlMatcher::regex(r"\.pdf$").unwrap();
        assert!(matcher.matches(&url("https://example.com/docs/a.pdf")));
        assert!(!matcher.matches(&url("https://example.com/docs/a.html")));

        let matcher = UrlMatcher::regex(r"^https://docs\.").unwrap();
        assert!(matcher.matches(&url("https://docs.example.com/")));
        assert!(!matcher.matches(&url("https://example.com/docs")));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(UrlMatcher::regex("(unclosed").is_err());
    }

    #[test]
    fn test_path_prefix() {
        let matcher = UrlMatcher::path_prefix("/products/");
        assert!(matcher.matches(&url("https://example.com/products/42")));
        assert!(!matcher.matches(&url("https://example.com/about")));
        assert!(!matcher.matches(&url("https://example.com/products")));
    }

    #[test]
    fn test_host_is_case_insensitive() {
        let matcher = UrlMatcher::host("Shop.Example.com");
        assert!(matcher.matches(&url("https://shop.example.com/cart")));
        assert!(!matcher.matches(&url("https://example.com/cart")));
    }

    #[test]
    fn test_custom_predicate() {
        let matcher = UrlMatcher::from_fn(|u| u.query().is_some());
        assert!(matcher.matches(&url("https://example.com/?q=1")));
        assert!(!matcher.matches(&url("https://example.com/")));
        assert_eq!(format!("{:?}", matcher), "Custom(..)");
    }
}
