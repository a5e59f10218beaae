//! URL handling module for Ripple
//!
//! This module provides URL normalization, the domain restriction used by the
//! frontier, and the matchers parsers are selected with.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, matches_domain, DomainScope};
pub use matcher::UrlMatcher;
pub use normalize::{has_http_scheme, normalize_url, normalized_key};

use url::Url;

/// Resolves a possibly relative link against a base URL, keeping only http(s) results
///
/// ```
/// use url::Url;
/// use ripple_crawler::url::resolve_link;
///
/// let base = Url::parse("https://example.com/docs/intro").unwrap();
/// assert_eq!(
///     resolve_link(&base, "../about").unwrap().as_str(),
///     "https://example.com/about"
/// );
/// assert!(resolve_link(&base, "mailto:team@example.com").is_none());
/// ```
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match base.join(href) {
        Ok(resolved) if resolved.scheme() == "http" || resolved.scheme() == "https" => {
            Some(resolved)
        }
        _ => None,
    }
}
