//! HTML parser for watch pages
//!
//! This module extracts from a watch page:
//! - Title, description, channel and duration
//! - Related-content links with the title and channel shown next to them

use crate::models::{PageMetadata, RelatedCandidate};
use crate::url::resolve_candidate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.\d+)?S)?)?$")
        .expect("duration pattern is valid")
});

/// Parses a watch page into page metadata
///
/// # Extraction Rules
///
/// - Title: `meta[property=og:title]`, falling back to `<title>`
/// - Description: `meta[name=description]`
/// - Channel: `link[itemprop=name]` (`content` attribute)
/// - Duration: `meta[itemprop=duration]` as ISO-8601 (`PT#H#M#S`)
/// - Related: every `<a href>` whose target carries a content id other than
///   the page's own; the first occurrence of each id wins
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - The page locator, for resolving relative links
/// * `id` - The content id of the page
///
/// # Example
///
/// ```
/// use vidcollector::crawler::parse_watch_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>ویدیو</title></head>
///     <body><a href="/watch?v=bbbbbbbbbbb" title="بعدی">next</a></body></html>"#;
/// let page_url = Url::parse("https://www.youtube.com/watch?v=aaaaaaaaaaa").unwrap();
/// let page = parse_watch_page(html, &page_url, "aaaaaaaaaaa");
/// assert_eq!(page.title, "ویدیو");
/// assert_eq!(page.related[0].id, "bbbbbbbbbbb");
/// ```
pub fn parse_watch_page(html: &str, page_url: &Url, id: &str) -> PageMetadata {
    let document = Html::parse_document(html);

    let title = meta_content(&document, "meta[property='og:title']")
        .or_else(|| extract_title(&document))
        .unwrap_or_default();
    let description = meta_content(&document, "meta[name='description']").unwrap_or_default();
    let channel = meta_content(&document, "link[itemprop='name']").unwrap_or_default();
    let duration = meta_content(&document, "meta[itemprop='duration']")
        .and_then(|value| parse_iso8601_duration(&value));

    PageMetadata {
        id: id.to_string(),
        url: page_url.to_string(),
        title,
        description,
        channel,
        duration,
        related: extract_related(&document, page_url, id),
    }
}

/// Parses an ISO-8601 duration such as `PT1H2M3S` into seconds
///
/// Returns `None` for anything that is not a day/time duration, and for
/// durations that do not fit in `u64` seconds.
pub fn parse_iso8601_duration(value: &str) -> Option<u64> {
    let caps = ISO_DURATION.captures(value.trim())?;

    if (1..=4).all(|index| caps.get(index).is_none()) {
        return None;
    }

    let mut total: u64 = 0;
    for (index, unit) in [(1, 86_400u64), (2, 3_600), (3, 60), (4, 1)] {
        if let Some(m) = caps.get(index) {
            let count = m.as_str().parse::<u64>().ok()?;
            total = total.checked_add(count.checked_mul(unit)?)?;
        }
    }

    Some(total)
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_related(document: &Html, page_url: &Url, own_id: &str) -> Vec<RelatedCandidate> {
    let mut related = Vec::new();
    let mut seen = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return related;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some((id, locator)) = resolve_candidate(page_url, href) else {
            continue;
        };
        if id == own_id || !seen.insert(id.clone()) {
            continue;
        }

        related.push(RelatedCandidate {
            id,
            locator,
            title: anchor_title(&element),
            channel: element
                .value()
                .attr("data-channel")
                .map(|c| c.trim().to_string())
                .unwrap_or_default(),
        });
    }

    related
}

fn anchor_title(element: &ElementRef<'_>) -> String {
    if let Some(title) = element.value().attr("title") {
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }

    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
