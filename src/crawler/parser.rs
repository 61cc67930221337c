//! HTML parser for extracting page records
//!
//! This module turns raw HTML into a `PageRecord`:
//! - The first `<h1>` (heading)
//! - The first paragraph, preferring one inside `<main>`
//! - Every `<a href>` resolved against the page URL
//! - Every `<img src>` resolved against the page URL
//!
//! Extraction never fails. A selector that cannot be built, or a page URL that cannot be
//! parsed, degrades the affected field to an empty value.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Structured content extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// The page URL as first encountered (not normalized)
    pub url: String,

    /// Trimmed text of the first `<h1>`, or empty
    #[serde(rename = "h1")]
    pub heading: String,

    /// Trimmed text of the first paragraph, or empty
    pub first_paragraph: String,

    /// Absolute link targets in document order, duplicates preserved
    pub outgoing_links: Vec<String>,

    /// Absolute image URLs in document order, duplicates preserved
    pub image_urls: Vec<String>,
}

/// Extracts a page record from HTML
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - The URL the HTML was fetched from, used to resolve relative links
///
/// # Example
///
/// ```
/// use bald_stalker::crawler::extract_page;
///
/// let html = r#"<html><body><h1>Hi</h1><p>First</p><a href="/next">Next</a></body></html>"#;
/// let record = extract_page(html, "https://example.com/start");
/// assert_eq!(record.heading, "Hi");
/// assert_eq!(record.first_paragraph, "First");
/// assert_eq!(record.outgoing_links, vec!["https://example.com/next".to_string()]);
/// ```
pub fn extract_page(html: &str, page_url: &str) -> PageRecord {
    let document = Html::parse_document(html);

    let base_url = match Url::parse(page_url) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!("Cannot resolve links against page URL {}: {}", page_url, e);
            None
        }
    };

    let (outgoing_links, image_urls) = match &base_url {
        Some(base) => (
            collect_resolved(&document, "a", "href", base),
            collect_resolved(&document, "img", "src", base),
        ),
        None => (Vec::new(), Vec::new()),
    };

    PageRecord {
        url: page_url.to_string(),
        heading: extract_heading(&document),
        first_paragraph: extract_first_paragraph(&document),
        outgoing_links,
        image_urls,
    }
}

/// Returns the trimmed text of the first `<h1>` in the HTML, or an empty string
pub fn heading_from_html(html: &str) -> String {
    extract_heading(&Html::parse_document(html))
}

/// Returns the trimmed text of the first paragraph in the HTML, or an empty string
///
/// A paragraph inside `<main>` wins over any earlier paragraph outside it.
pub fn first_paragraph_from_html(html: &str) -> String {
    extract_first_paragraph(&Html::parse_document(html))
}

/// Returns every `<a href>` target resolved against `base_url`, in document order
pub fn urls_from_html(html: &str, base_url: &Url) -> Vec<String> {
    collect_resolved(&Html::parse_document(html), "a", "href", base_url)
}

/// Returns every `<img src>` resolved against `base_url`, in document order
pub fn images_from_html(html: &str, base_url: &Url) -> Vec<String> {
    collect_resolved(&Html::parse_document(html), "img", "src", base_url)
}

fn extract_heading(document: &Html) -> String {
    let Ok(h1_selector) = Selector::parse("h1") else {
        return String::new();
    };

    document
        .select(&h1_selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn extract_first_paragraph(document: &Html) -> String {
    let Ok(p_selector) = Selector::parse("p") else {
        return String::new();
    };

    // <main> without a <p> falls through to the whole document
    let in_main = Selector::parse("main").ok().and_then(|main_selector| {
        document
            .select(&main_selector)
            .next()
            .and_then(|main| main.select(&p_selector).next())
    });

    in_main
        .or_else(|| document.select(&p_selector).next())
        .map(element_text)
        .unwrap_or_default()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolves `attr` of every `tag` element against `base_url`
///
/// Elements without the attribute, or with an empty value, are skipped. Values that do
/// not resolve to a valid URL are logged and skipped.
fn collect_resolved(document: &Html, tag: &str, attr: &str, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse(&format!("{}[{}]", tag, attr)) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .filter(|value| !value.is_empty())
        .filter_map(|value| match base_url.join(value) {
            Ok(resolved) => Some(resolved.to_string()),
            Err(e) => {
                tracing::warn!("Invalid {} '{}' on {}: {}", attr, value, base_url, e);
                None
            }
        })
        .collect()
}
