//! HTML helpers for parser handlers
//!
//! Extracts the page title and followable links, and provides `page_record`,
//! a ready-made handler used by the CLI.

use crate::crawler::{CrawlResponse, ParseOutput};
use crate::url::resolve_link;
use crate::ParseError;
use scraper::{Html, Selector};
use serde_json::json;
use std::collections::HashSet;
use url::Url;

/// Title and links of an HTML document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    pub title: Option<String>,

    /// Absolute http(s) links, de-duplicated, in document order
    pub links: Vec<Url>,
}

/// Parses an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">`
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links
///
/// `rel="nofollow"` links are kept.
///
/// ```
/// use ripple_crawler::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<title>Test</title><a href="/page">Link</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base);
/// assert_eq!(parsed.title.as_deref(), Some("Test"));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base: &Url) -> ParsedPage {
    let document = Html::parse_document(html);
    ParsedPage {
        title: extract_title(&document),
        links: collect_links(&document, base),
    }
}

/// Links of an HTML response, resolved against its final URL
///
/// Non-HTML responses yield no links.
pub fn extract_links(response: &CrawlResponse) -> Vec<Url> {
    if !response.is_html() {
        return Vec::new();
    }
    parse_html(&response.text(), &response.uri).links
}

/// Handler emitting one record per page and following all its links
///
/// The record holds `url`, `status`, `title` and `content_type`.
pub fn page_record(response: &CrawlResponse) -> Result<ParseOutput, ParseError> {
    let page = if response.is_html() {
        parse_html(&response.text(), &response.uri)
    } else {
        ParsedPage::default()
    };

    let mut output = ParseOutput::new();
    output.add_item(&json!({
        "url": response.uri.as_str(),
        "status": response.status,
        "title": page.title,
        "content_type": response.content_type(),
    }))?;

    for link in page.links {
        output.follow(link);
    }
    Ok(output)
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn collect_links(document: &Html, base: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let hrefs = anchor_hrefs(document).chain(canonical_hrefs(document));
    for href in hrefs {
        if !is_followable(&href) {
            continue;
        }
        if let Some(url) = resolve_link(base, &href) {
            if seen.insert(url.to_string()) {
                links.push(url);
            }
        }
    }

    links
}

fn anchor_hrefs(document: &Html) -> impl Iterator<Item = String> + '_ {
    select_hrefs(document, "a[href]", |element| {
        element.value().attr("download").is_none()
    })
}

fn canonical_hrefs(document: &Html) -> impl Iterator<Item = String> + '_ {
    select_hrefs(document, "link[rel='canonical'][href]", |_| true)
}

fn select_hrefs<'a>(
    document: &'a Html,
    selector: &str,
    keep: fn(&scraper::ElementRef<'a>) -> bool,
) -> impl Iterator<Item = String> + 'a {
    let hrefs: Vec<String> = match Selector::parse(selector) {
        Ok(selector) => document
            .select(&selector)
            .filter(|element| keep(element))
            .filter_map(|element| element.value().attr("href").map(str::to_string))
            .collect(),
        Err(_) => Vec::new(),
    };
    hrefs.into_iter()
}

fn is_followable(href: &str) -> bool {
    let href = href.trim();
    let lowered = href.to_ascii_lowercase();

    !(href.is_empty()
        || href.starts_with('#')
        || lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:"))
}
