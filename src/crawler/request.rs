//! Request and response values exchanged between the frontier, the fetcher
//! and parsers

use bytes::Bytes;
use std::borrow::Cow;
use url::Url;

/// A URL scheduled for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Absolute URL to fetch
    pub url: Url,

    /// Link distance from the seed URLs (seeds are depth 0)
    pub depth: u32,

    /// Number of retried attempts made so far
    pub retry_count: u32,
}

impl CrawlRequest {
    pub fn new(url: Url, depth: u32) -> Self {
        Self {
            url,
            depth,
            retry_count: 0,
        }
    }
}

/// Response headers with case-insensitive lookup
///
/// Iteration follows first-seen order. A repeated header name is folded into
/// the first entry, values joined with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: &str, value: &str) {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Converts a reqwest header map; non-UTF-8 values are decoded lossily
    pub fn from_header_map(map: &reqwest::header::HeaderMap) -> Self {
        let mut headers = Self::new();
        for (name, value) in map {
            headers.append(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }
        headers
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value.as_ref());
        }
        headers
    }
}

/// A fetched page, as handed to parsers
#[derive(Debug, Clone)]
pub struct CrawlResponse {
    /// Final URL, after any redirects
    pub uri: Url,

    pub body: Bytes,

    pub status: u16,

    pub headers: Headers,
}

impl CrawlResponse {
    pub fn new(uri: Url, status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            uri,
            body: body.into(),
            status,
            headers,
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    pub fn is_html(&self) -> bool {
        self.content_type()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml+xml")
            })
            .unwrap_or(false)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether this is a redirect the fetcher can follow (3xx except 304, with a Location)
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.status != 304 && self.location().is_some()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get("location")
    }
}
