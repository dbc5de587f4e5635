//! Locator handling for VidCollector
//!
//! This module extracts content ids from page locators and rebuilds the
//! canonical watch locator for an id. Extraction is host-agnostic so the same
//! rules apply to the platform and to any mirror or test server.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Content ids are 11 characters from the URL-safe base64 alphabet
static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern is valid")
});

/// Path prefixes that carry the id as the following segment
const ID_PATH_PREFIXES: &[&str] = &["embed", "v", "shorts", "live"];

/// Returns true if `candidate` looks like a content id
pub fn is_video_id(candidate: &str) -> bool {
    VIDEO_ID.is_match(candidate)
}

/// Extracts the content id from a locator
///
/// Recognized forms:
/// - `/watch?v=<id>` on any host
/// - `/embed/<id>`, `/v/<id>`, `/shorts/<id>`, `/live/<id>`
/// - `https://youtu.be/<id>`
///
/// # Examples
///
/// ```
/// use vidcollector::url::extract_video_id;
///
/// assert_eq!(
///     extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
///     Some("dQw4w9WgXcQ".to_string())
/// );
/// assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
/// assert_eq!(extract_video_id("https://www.youtube.com/feed/trending"), None);
/// ```
pub fn extract_video_id(locator: &str) -> Option<String> {
    let url = Url::parse(locator).ok()?;
    extract_from_url(&url)
}

fn extract_from_url(url: &Url) -> Option<String> {
    if url.path() == "/watch" {
        return url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|id| is_video_id(id));
    }

    let mut segments = url.path_segments()?;
    let first = segments.next()?;

    if url.host_str() == Some("youtu.be") {
        return Some(first.to_string()).filter(|id| is_video_id(id));
    }

    if ID_PATH_PREFIXES.contains(&first) {
        return segments
            .next()
            .map(str::to_string)
            .filter(|id| is_video_id(id));
    }

    None
}

/// Builds the canonical watch locator for `id` on the host of `base`
///
/// All other query parameters (playlists, timestamps, tracking) are dropped.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use vidcollector::url::canonical_watch_url;
///
/// let base = Url::parse("https://www.youtube.com/").unwrap();
/// assert_eq!(
///     canonical_watch_url(&base, "dQw4w9WgXcQ"),
///     "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
/// );
/// ```
pub fn canonical_watch_url(base: &Url, id: &str) -> String {
    let mut url = base.clone();
    url.set_path("/watch");
    url.set_fragment(None);
    url.set_query(Some(&format!("v={}", id)));
    url.to_string()
}

/// Resolves a (possibly relative) link found on `page` and returns its id and
/// canonical locator
///
/// `youtu.be` short links are canonicalized onto the page's host.
pub fn resolve_candidate(page: &Url, href: &str) -> Option<(String, String)> {
    let resolved = page.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    let id = extract_from_url(&resolved)?;

    let base = if resolved.host_str() == Some("youtu.be") {
        page
    } else {
        &resolved
    };
    let locator = canonical_watch_url(base, &id);
    Some((id, locator))
}

/// Canonicalizes a seed locator, returning its id and canonical form
pub fn canonicalize_locator(locator: &str) -> Option<(String, String)> {
    let url = Url::parse(locator).ok()?;
    resolve_candidate(&url, locator)
}
